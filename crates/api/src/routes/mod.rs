pub mod commands;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /commands        GET: declared command catalogue
///                  POST: invoke a command
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().route(
        "/commands",
        get(commands::list_commands).post(commands::invoke_command),
    )
}
