//! The rebuild pass.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tyria_core::catalog::{Catalog, FetchMode};
use tyria_core::error::ApiError;
use tyria_db::models::reference::NewReferenceEntry;

use crate::sink::CatalogSink;
use crate::source::CatalogSource;
use crate::status::ServiceStatus;

/// Ids requested per page of a paged catalog.
pub const BLOCK_SIZE: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    #[error("a rebuild is already running")]
    AlreadyRunning,
}

/// Result of loading one catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogOutcome {
    pub catalog: Option<Catalog>,
    pub inserted: u64,
    pub failed_blocks: usize,
    /// Set when the catalog could not be loaded at all.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildReport {
    pub catalogs: Vec<CatalogOutcome>,
    pub raids: usize,
}

impl RebuildReport {
    pub fn total_inserted(&self) -> u64 {
        self.catalogs.iter().map(|c| c.inserted).sum()
    }

    pub fn failed_catalogs(&self) -> usize {
        self.catalogs.iter().filter(|c| c.error.is_some()).count()
    }
}

/// Runs rebuild passes, one at a time.
pub struct Rebuilder {
    source: Arc<dyn CatalogSource>,
    sink: Arc<dyn CatalogSink>,
    status: ServiceStatus,
    running: Mutex<()>,
}

impl Rebuilder {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        sink: Arc<dyn CatalogSink>,
        status: ServiceStatus,
    ) -> Self {
        Self {
            source,
            sink,
            status,
            running: Mutex::new(()),
        }
    }

    pub fn status(&self) -> &ServiceStatus {
        &self.status
    }

    /// Reload every catalog and the raids.
    ///
    /// The service is unavailable for the whole pass, whether catalogs
    /// fail or not. A second caller while a pass runs gets
    /// [`RebuildError::AlreadyRunning`].
    pub async fn rebuild(&self) -> Result<RebuildReport, RebuildError> {
        let _running = self
            .running
            .try_lock()
            .map_err(|_| RebuildError::AlreadyRunning)?;
        let _unavailable = self.status.begin_rebuild();
        tracing::info!("Reference cache rebuild started");

        let mut report = RebuildReport::default();
        for catalog in Catalog::ALL {
            let outcome = self.rebuild_catalog(catalog).await;
            if let Some(error) = &outcome.error {
                tracing::error!(catalog = catalog.endpoint(), error = %error, "Catalog rebuild failed");
            } else {
                tracing::info!(
                    catalog = catalog.endpoint(),
                    inserted = outcome.inserted,
                    failed_blocks = outcome.failed_blocks,
                    "Catalog rebuilt"
                );
            }
            report.catalogs.push(outcome);
        }
        report.raids = self.rebuild_raids().await;

        tracing::info!(
            inserted = report.total_inserted(),
            failed_catalogs = report.failed_catalogs(),
            raids = report.raids,
            "Reference cache rebuild finished"
        );
        Ok(report)
    }

    async fn rebuild_catalog(&self, catalog: Catalog) -> CatalogOutcome {
        let mut outcome = CatalogOutcome {
            catalog: Some(catalog),
            ..Default::default()
        };

        if let Err(e) = self.sink.reset(catalog).await {
            outcome.error = Some(e.to_string());
            return outcome;
        }

        let endpoint = catalog.endpoint();
        match catalog.mode() {
            FetchMode::All => match self.source.fetch_all(endpoint).await {
                Ok(docs) => match self.store(catalog, docs).await {
                    Ok(n) => outcome.inserted = n,
                    Err(e) => outcome.error = Some(e),
                },
                Err(e) => outcome.error = Some(e.to_string()),
            },
            FetchMode::Paged => {
                let ids = match self.source.fetch_index(endpoint).await {
                    Ok(ids) => ids,
                    Err(e) => {
                        outcome.error = Some(e.to_string());
                        return outcome;
                    }
                };
                for (n, block) in ids.chunks(BLOCK_SIZE).enumerate() {
                    let stored = match self.source.fetch_block(endpoint, block).await {
                        Ok(docs) => self.store(catalog, docs).await,
                        Err(e) => Err(e.to_string()),
                    };
                    match stored {
                        Ok(inserted) => outcome.inserted += inserted,
                        Err(e) => {
                            tracing::warn!(catalog = endpoint, block = n, error = %e, "Skipping failed block");
                            outcome.failed_blocks += 1;
                        }
                    }
                }
            }
        }

        if let Err(e) = self.sink.finalize(catalog).await {
            outcome.error = Some(format!("index creation failed: {e}"));
        }
        outcome
    }

    async fn store(&self, catalog: Catalog, docs: Vec<Value>) -> Result<u64, String> {
        let total = docs.len();
        let entries: Vec<NewReferenceEntry> = docs
            .into_iter()
            .filter_map(NewReferenceEntry::from_document)
            .collect();
        if entries.len() < total {
            tracing::debug!(
                catalog = catalog.endpoint(),
                dropped = total - entries.len(),
                "Dropped documents without an integer id"
            );
        }
        self.sink
            .insert(catalog, &entries)
            .await
            .map_err(|e| e.to_string())
    }

    async fn rebuild_raids(&self) -> usize {
        let ids = match self.source.fetch_raid_index().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Could not fetch raid list");
                return 0;
            }
        };

        let mut raids = Vec::with_capacity(ids.len());
        for id in ids {
            match self.source.fetch_raid(&id).await {
                Ok(mut doc) => {
                    if let Some(obj) = doc.as_object_mut() {
                        obj.remove("id");
                    }
                    raids.push((id, doc));
                }
                Err(e) => warn_raid(&id, &e),
            }
        }

        match self.sink.replace_raids(&raids).await {
            Ok(()) => raids.len(),
            Err(e) => {
                tracing::error!(error = %e, "Could not store raids");
                0
            }
        }
    }
}

fn warn_raid(id: &str, e: &ApiError) {
    tracing::warn!(raid = id, error = %e, "Skipping raid");
}
