//! Maintains one self-updating boss timer message per server.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tyria_core::bosses;
use tyria_db::models::server::BossBoard;
use tyria_db::repositories::ServerRepo;
use tyria_events::{ChatError, OutgoingMessage};

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::Synchronizer;

/// Bosses listed on each board.
const BOARD_LENGTH: usize = 8;

pub struct BossNotifier {
    ctx: WorkerContext,
}

impl BossNotifier {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    async fn refresh(&self, board: &BossBoard, message: &OutgoingMessage) -> Result<(), WorkerError> {
        if let Some(message_id) = board.message_id {
            match self
                .ctx
                .chat
                .edit_message(board.channel_id, message_id, message)
                .await
            {
                Ok(()) => return Ok(()),
                // Deleted by someone; post a fresh one below.
                Err(ChatError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }
        }
        let posted = self.ctx.chat.send_message(board.channel_id, message).await?;
        ServerRepo::set_boss_message(&self.ctx.pool, board.server_id, Some(posted)).await?;
        tracing::info!(server_id = board.server_id, message_id = posted, "Posted boss board");
        Ok(())
    }
}

#[async_trait]
impl Synchronizer for BossNotifier {
    fn name(&self) -> &'static str {
        "boss_notifier"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(300)
    }

    async fn run_once(&self, cancel: &CancellationToken) -> Result<(), WorkerError> {
        let now = Utc::now();
        for board in ServerRepo::boss_boards(&self.ctx.pool).await? {
            if cancel.is_cancelled() {
                break;
            }
            let tz = i32::from(board.timezone_offset);
            let card = bosses::card(&bosses::upcoming(now, tz, BOARD_LENGTH), tz).timestamp(now);
            let message = OutgoingMessage::card(card);
            if let Err(e) = self.refresh(&board, &message).await {
                tracing::warn!(server_id = board.server_id, error = %e, "Boss board refresh failed");
            }
        }
        Ok(())
    }
}
