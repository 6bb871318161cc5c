//! Dependencies shared by every worker.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tyria_events::{ChatPlatform, Notifier};
use tyria_gateway::Gateway;
use tyria_pipeline::Rebuilder;

/// Tunables of the fleet.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Wait between noticing a new UTC day and fetching the dailies, so the
    /// publisher has rotated them.
    pub daily_reset_delay: Duration,
    /// Pause between servers during a guild sync pass.
    pub guildsync_server_pause: Duration,
    /// Pause after each member whose roles were edited.
    pub guildsync_member_pause: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            daily_reset_delay: Duration::from_secs(300),
            guildsync_server_pause: Duration::from_secs(60),
            guildsync_member_pause: Duration::from_secs(5),
        }
    }
}

/// Handle bundle cloned into each worker.
#[derive(Clone)]
pub struct WorkerContext {
    pub pool: PgPool,
    pub gateway: Gateway,
    pub chat: Arc<dyn ChatPlatform>,
    pub notifier: Notifier,
    pub rebuilder: Arc<Rebuilder>,
    pub config: WorkerConfig,
}

impl WorkerContext {
    pub fn new(
        pool: PgPool,
        gateway: Gateway,
        chat: Arc<dyn ChatPlatform>,
        rebuilder: Arc<Rebuilder>,
        config: WorkerConfig,
    ) -> Self {
        let notifier = Notifier::new(pool.clone(), chat.clone());
        Self {
            pool,
            gateway,
            chat,
            notifier,
            rebuilder,
            config,
        }
    }
}
