//! Failure of one synchronizer pass.

use tyria_core::error::ApiError;
use tyria_events::ChatError;

/// Logged by the periodic runner; never stops the loop.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("upstream API: {0}")]
    Api(#[from] ApiError),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("chat platform: {0}")]
    Chat(#[from] ChatError),
}
