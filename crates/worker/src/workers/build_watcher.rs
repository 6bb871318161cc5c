//! Watches the game build and triggers cache rebuilds.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tyria_core::card::MessageCard;
use tyria_core::markers::BuildChange;
use tyria_db::models::server::NotifierKind;
use tyria_db::repositories::StateRepo;
use tyria_pipeline::RebuildError;

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::Synchronizer;

#[derive(Debug, Deserialize)]
struct Build {
    id: i64,
}

pub struct BuildWatcher {
    ctx: WorkerContext,
}

impl BuildWatcher {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }
}

/// Card announcing a new game build.
pub fn update_card(previous: i64, current: i64) -> MessageCard {
    MessageCard::new("Guild Wars 2 has just updated")
        .description(format!("New build: `{current}` (previously `{previous}`)"))
        .url("https://en-forum.guildwars2.com/forum/6-game-release-notes/")
}

#[async_trait]
impl Synchronizer for BuildWatcher {
    fn name(&self) -> &'static str {
        "build_watcher"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn run_once(&self, _cancel: &CancellationToken) -> Result<(), WorkerError> {
        let pool = &self.ctx.pool;
        let build: Build = self.ctx.gateway.get("build").await?;
        let change = BuildChange::detect(StateRepo::last_build(pool).await?, build.id);

        // Persisted first: one build change triggers at most one rebuild.
        if let Some(id) = change.persist() {
            StateRepo::set_last_build(pool, id).await?;
        }

        if let BuildChange::Changed { previous, current } = change {
            tracing::info!(previous, current, "Game build changed");
            if let Err(e) = self
                .ctx
                .notifier
                .broadcast(NotifierKind::Updates, update_card(previous, current))
                .await
            {
                tracing::error!(error = %e, "Could not load update subscribers");
            }
        }

        if change.needs_rebuild() {
            match self.ctx.rebuilder.rebuild().await {
                Ok(report) => tracing::info!(
                    build = build.id,
                    inserted = report.total_inserted(),
                    failed_catalogs = report.failed_catalogs(),
                    "Rebuild after build change finished"
                ),
                Err(RebuildError::AlreadyRunning) => {
                    tracing::warn!(build = build.id, "Rebuild already running")
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_card_names_both_builds() {
        let card = update_card(100, 101);
        let text = card.description.unwrap();
        assert!(text.contains("101") && text.contains("100"));
    }
}
