//! Keeps members' nicknames showing their account name.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tyria_core::membership::forced_nickname;
use tyria_core::types::Snowflake;
use tyria_db::repositories::ServerRepo;

use super::{log_chat_failure, members_with_keys};
use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::Synchronizer;

pub struct ForcedNicknames {
    ctx: WorkerContext,
}

impl ForcedNicknames {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    async fn sync_server(&self, server_id: Snowflake) -> Result<usize, WorkerError> {
        let (members, rings) = members_with_keys(&self.ctx, server_id).await?;
        let mut renamed = 0;
        for member in &members {
            let Some(account) = rings.get(&member.user_id).and_then(|r| r.active()) else {
                continue;
            };
            let Some(nickname) = forced_nickname(&member.display_name, &account.account_name) else {
                continue;
            };
            match self.ctx.chat.set_nickname(server_id, member.user_id, &nickname).await {
                Ok(()) => renamed += 1,
                Err(e) => log_chat_failure(self.name(), server_id, member.user_id, &e),
            }
        }
        Ok(renamed)
    }
}

#[async_trait]
impl Synchronizer for ForcedNicknames {
    fn name(&self) -> &'static str {
        "forced_nicknames"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(300)
    }

    async fn run_once(&self, cancel: &CancellationToken) -> Result<(), WorkerError> {
        for server_id in ServerRepo::with_forced_names(&self.ctx.pool).await? {
            if cancel.is_cancelled() {
                break;
            }
            match self.sync_server(server_id).await {
                Ok(0) => {}
                Ok(renamed) => tracing::info!(server_id, renamed, "Forced account nicknames"),
                Err(e) => tracing::warn!(server_id, error = %e, "Nickname sync failed"),
            }
        }
        Ok(())
    }
}
