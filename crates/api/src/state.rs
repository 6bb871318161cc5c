use std::sync::Arc;

use tyria_events::ChatPlatform;
use tyria_gateway::Gateway;
use tyria_pipeline::{Rebuilder, ServiceStatus};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; every field is a handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: tyria_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub gateway: Gateway,
    pub chat: Arc<dyn ChatPlatform>,
    /// Also owns the availability status commands consult.
    pub rebuilder: Arc<Rebuilder>,
}

impl AppState {
    pub fn status(&self) -> &ServiceStatus {
        self.rebuilder.status()
    }
}
