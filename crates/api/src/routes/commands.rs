//! Handlers for the command surface the chat adapter calls.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::commands::{self, ChatPermission, Command, Invocation};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub permission: Option<ChatPermission>,
}

/// GET /api/v1/commands
///
/// Every command with the chat permission the adapter must check first.
pub async fn list_commands() -> impl IntoResponse {
    let data: Vec<CommandInfo> = Command::ALL
        .iter()
        .map(|c| CommandInfo {
            name: c.name(),
            description: c.description(),
            permission: c.permission(),
        })
        .collect();
    Json(DataResponse { data })
}

/// POST /api/v1/commands
///
/// Run one invocation. User-facing failures come back as a normal reply;
/// only unknown commands and internal failures are HTTP errors.
pub async fn invoke_command(
    State(state): State<AppState>,
    Json(invocation): Json<Invocation>,
) -> AppResult<impl IntoResponse> {
    let reply = match commands::dispatch(&state, &invocation).await {
        Ok(reply) => reply,
        Err(err) => match err.reply() {
            Some(reply) => {
                tracing::debug!(
                    command = %invocation.command,
                    user_id = invocation.user_id,
                    error = %err,
                    "Command failed with user-facing reply",
                );
                reply
            }
            None => return Err(err.into()),
        },
    };
    Ok(Json(DataResponse { data: reply }))
}
