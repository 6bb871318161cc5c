//! Lifecycle of the whole fleet.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::context::WorkerContext;
use crate::periodic::{run_periodic, Synchronizer};
use crate::presence::mirror_presence;
use crate::workers;

/// Every worker in start order.
pub fn all_workers(ctx: &WorkerContext) -> Vec<Arc<dyn Synchronizer>> {
    vec![
        Arc::new(workers::build_watcher::BuildWatcher::new(ctx.clone())),
        Arc::new(workers::daily_reset::DailyReset::new(ctx.clone())),
        Arc::new(workers::news::NewsChecker::new(ctx.clone())),
        Arc::new(workers::gem_tracker::GemTracker::new(ctx.clone())),
        Arc::new(workers::population::PopulationTracker::new(ctx.clone())),
        Arc::new(workers::guildsync::GuildSync::new(ctx.clone())),
        Arc::new(workers::worldsync::WorldSync::new(ctx.clone())),
        Arc::new(workers::nicknames::ForcedNicknames::new(ctx.clone())),
        Arc::new(workers::key_role::KeyRoleSync::new(ctx.clone())),
        Arc::new(workers::boss_notifier::BossNotifier::new(ctx.clone())),
    ]
}

/// Running workers plus the token that stops them.
pub struct Fleet {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl Fleet {
    /// Spawn every worker and the presence mirror.
    pub fn start(ctx: &WorkerContext, cancel: CancellationToken) -> Self {
        Self::start_with(ctx, all_workers(ctx), cancel)
    }

    pub fn start_with(
        ctx: &WorkerContext,
        workers: Vec<Arc<dyn Synchronizer>>,
        cancel: CancellationToken,
    ) -> Self {
        let mut tasks = JoinSet::new();
        tasks.spawn(mirror_presence(
            ctx.rebuilder.status().subscribe(),
            ctx.chat.clone(),
            cancel.clone(),
        ));
        for worker in workers {
            tasks.spawn(run_periodic(worker, cancel.clone()));
        }
        tracing::info!(tasks = tasks.len(), "Synchronizer fleet started");
        Self { cancel, tasks }
    }

    /// Cancel every worker and wait up to `grace` for them to stop.
    /// Stragglers are aborted.
    pub async fn shutdown(mut self, grace: Duration) {
        self.cancel.cancel();
        let drained = tokio::time::timeout(grace, async {
            while let Some(result) = self.tasks.join_next().await {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Synchronizer task ended abnormally");
                }
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!(remaining = self.tasks.len(), "Aborting synchronizers after grace period");
            self.tasks.abort_all();
        }
        tracing::info!("Synchronizer fleet stopped");
    }
}
