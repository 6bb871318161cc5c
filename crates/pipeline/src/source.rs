//! Where catalog documents come from.

use async_trait::async_trait;
use serde_json::Value;
use tyria_core::error::ApiError;
use tyria_core::types::GameId;
use tyria_gateway::Gateway;

/// Read side of the pipeline.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Every document of a catalog that supports `ids=all`.
    async fn fetch_all(&self, endpoint: &str) -> Result<Vec<Value>, ApiError>;

    /// The id index of a paged catalog.
    async fn fetch_index(&self, endpoint: &str) -> Result<Vec<GameId>, ApiError>;

    /// One block of documents by id.
    async fn fetch_block(&self, endpoint: &str, ids: &[GameId]) -> Result<Vec<Value>, ApiError>;

    /// Raid ids.
    async fn fetch_raid_index(&self) -> Result<Vec<String>, ApiError>;

    /// One raid with its nested wings.
    async fn fetch_raid(&self, id: &str) -> Result<Value, ApiError>;
}

#[async_trait]
impl CatalogSource for Gateway {
    async fn fetch_all(&self, endpoint: &str) -> Result<Vec<Value>, ApiError> {
        self.get(&format!("{endpoint}?ids=all")).await
    }

    async fn fetch_index(&self, endpoint: &str) -> Result<Vec<GameId>, ApiError> {
        self.get(endpoint).await
    }

    async fn fetch_block(&self, endpoint: &str, ids: &[GameId]) -> Result<Vec<Value>, ApiError> {
        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.get(&format!("{endpoint}?ids={joined}")).await
    }

    async fn fetch_raid_index(&self) -> Result<Vec<String>, ApiError> {
        self.get("raids").await
    }

    async fn fetch_raid(&self, id: &str) -> Result<Value, ApiError> {
        self.get(&format!("raids/{id}")).await
    }
}
