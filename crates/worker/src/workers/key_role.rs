//! Grants a configured role to members who stored an API key.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tyria_core::membership::{key_role_edit, RoleEdit};
use tyria_core::types::Snowflake;
use tyria_db::repositories::ServerRepo;

use super::{log_chat_failure, members_with_keys};
use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::Synchronizer;

pub struct KeyRoleSync {
    ctx: WorkerContext,
}

impl KeyRoleSync {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    async fn sync_server(&self, server_id: Snowflake, role: Snowflake) -> Result<(), WorkerError> {
        let (members, rings) = members_with_keys(&self.ctx, server_id).await?;
        for member in &members {
            let has_credential = rings.get(&member.user_id).is_some_and(|r| !r.is_empty());
            let result = match key_role_edit(&member.roles, role, has_credential) {
                Some(RoleEdit::Grant(role)) => self.ctx.chat.add_role(server_id, member.user_id, role).await,
                Some(RoleEdit::Revoke(role)) => {
                    self.ctx.chat.remove_role(server_id, member.user_id, role).await
                }
                None => continue,
            };
            if let Err(e) = result {
                log_chat_failure(self.name(), server_id, member.user_id, &e);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Synchronizer for KeyRoleSync {
    fn name(&self) -> &'static str {
        "key_role"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(300)
    }

    async fn run_once(&self, cancel: &CancellationToken) -> Result<(), WorkerError> {
        for (server_id, role) in ServerRepo::with_key_role(&self.ctx.pool).await? {
            if cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.sync_server(server_id, role).await {
                tracing::warn!(server_id, error = %e, "Key role sync failed");
            }
        }
        Ok(())
    }
}
