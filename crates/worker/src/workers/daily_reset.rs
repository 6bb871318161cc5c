//! Compiles and announces the dailies once per UTC day.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tyria_core::catalog::Catalog;
use tyria_core::dailies::{self, DailiesSnapshot, DailyResponse};
use tyria_core::markers::DayChange;
use tyria_core::pact_supply;
use tyria_core::types::{GameId, Timestamp};
use tyria_db::models::server::NotifierKind;
use tyria_db::repositories::{ReferenceRepo, StateRepo};
use tyria_gateway::Auth;

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::{sleep_or_cancel, Synchronizer};

pub struct DailyReset {
    ctx: WorkerContext,
}

impl DailyReset {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    /// Fetch today's and tomorrow's dailies and name them from the cache.
    pub async fn compile(&self, now: Timestamp) -> Result<DailiesSnapshot, WorkerError> {
        let mut responses: Vec<DailyResponse> = self
            .ctx
            .gateway
            .get_many(
                &["achievements/daily", "achievements/daily/tomorrow"],
                Auth::Anonymous,
                &[],
            )
            .await?;
        let tomorrow = responses.pop().unwrap_or_default();
        let today = responses.pop().unwrap_or_default();

        let mut ids = today.all_ids();
        ids.extend(tomorrow.all_ids());
        let names: HashMap<GameId, String> =
            ReferenceRepo::get_by_ids(&self.ctx.pool, Catalog::Achievements, &ids)
                .await?
                .into_iter()
                .filter_map(|e| Some((e.id, e.name?)))
                .collect();

        Ok(DailiesSnapshot {
            date: now.date_naive(),
            today: dailies::compile(&today, &names),
            tomorrow: dailies::compile(&tomorrow, &names),
            psna_today: pact_supply::locations(now, 0),
            psna_tomorrow: pact_supply::locations(now, 1),
        })
    }
}

#[async_trait]
impl Synchronizer for DailyReset {
    fn name(&self) -> &'static str {
        "daily_reset"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn run_once(&self, cancel: &CancellationToken) -> Result<(), WorkerError> {
        let pool = &self.ctx.pool;
        let change = DayChange::detect(StateRepo::day_marker(pool).await?, Utc::now());
        if let Some(weekday) = change.persist() {
            StateRepo::set_day_marker(pool, weekday).await?;
        }
        if !change.fires() {
            return Ok(());
        }

        tracing::info!(
            delay_secs = self.ctx.config.daily_reset_delay.as_secs(),
            "Daily reset detected"
        );
        if !sleep_or_cancel(self.ctx.config.daily_reset_delay, cancel).await {
            return Ok(());
        }

        let snapshot = self.compile(Utc::now()).await?;
        StateRepo::set_dailies(pool, &snapshot).await?;
        self.ctx
            .notifier
            .broadcast(NotifierKind::Daily, snapshot.card(false))
            .await?;
        Ok(())
    }
}
