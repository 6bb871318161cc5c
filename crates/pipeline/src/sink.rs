//! Where catalog documents go.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tyria_core::catalog::Catalog;
use tyria_db::models::reference::NewReferenceEntry;
use tyria_db::repositories::ReferenceRepo;

/// Write side of the pipeline.
#[async_trait]
pub trait CatalogSink: Send + Sync {
    /// Drop the catalog and recreate it empty.
    async fn reset(&self, catalog: Catalog) -> Result<(), sqlx::Error>;

    /// Store one block. Returns the number of rows written.
    async fn insert(&self, catalog: Catalog, entries: &[NewReferenceEntry]) -> Result<u64, sqlx::Error>;

    /// Build lookup indexes once the catalog is loaded.
    async fn finalize(&self, catalog: Catalog) -> Result<(), sqlx::Error>;

    /// Replace all raids.
    async fn replace_raids(&self, raids: &[(String, Value)]) -> Result<(), sqlx::Error>;
}

/// Postgres-backed sink.
#[derive(Debug, Clone)]
pub struct PgCatalogSink {
    pool: PgPool,
}

impl PgCatalogSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSink for PgCatalogSink {
    async fn reset(&self, catalog: Catalog) -> Result<(), sqlx::Error> {
        ReferenceRepo::reset_catalog(&self.pool, catalog).await
    }

    async fn insert(&self, catalog: Catalog, entries: &[NewReferenceEntry]) -> Result<u64, sqlx::Error> {
        ReferenceRepo::insert_block(&self.pool, catalog, entries).await
    }

    async fn finalize(&self, catalog: Catalog) -> Result<(), sqlx::Error> {
        ReferenceRepo::create_index(&self.pool, catalog).await
    }

    async fn replace_raids(&self, raids: &[(String, Value)]) -> Result<(), sqlx::Error> {
        ReferenceRepo::replace_raids(&self.pool, raids).await
    }
}
