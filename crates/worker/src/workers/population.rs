//! Samples world populations and tells users when a full world opens.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tyria_core::card::MessageCard;
use tyria_core::population::{should_sample, World};
use tyria_core::types::GameId;
use tyria_db::repositories::{PopulationRepo, UserRepo};
use tyria_events::OutgoingMessage;

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::Synchronizer;

pub struct PopulationTracker {
    ctx: WorkerContext,
}

impl PopulationTracker {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    async fn sample(&self, worlds: &[World]) -> Result<usize, WorkerError> {
        let mut written = 0;
        for world in worlds {
            let latest = PopulationRepo::latest(&self.ctx.pool, world.id).await?;
            if should_sample(latest, world.population) {
                PopulationRepo::record(&self.ctx.pool, world.id, world.population).await?;
                written += 1;
            }
        }
        Ok(written)
    }
}

pub fn opened_card(world: &World) -> MessageCard {
    MessageCard::new("World population alert").description(format!(
        "**{}** is no longer full (now {}). You can transfer to it now.",
        world.name,
        world.population.label()
    ))
}

#[async_trait]
impl Synchronizer for PopulationTracker {
    fn name(&self) -> &'static str {
        "population"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(300)
    }

    async fn run_once(&self, _cancel: &CancellationToken) -> Result<(), WorkerError> {
        let worlds: Vec<World> = self.ctx.gateway.get("worlds?ids=all").await?;
        let written = self.sample(&worlds).await?;
        if written > 0 {
            tracing::debug!(written, "Population samples recorded");
        }

        let by_id: HashMap<GameId, &World> = worlds.iter().map(|w| (w.id, w)).collect();
        for tracker in UserRepo::population_trackers(&self.ctx.pool).await? {
            for world_id in &tracker.population_track {
                let Some(world) = by_id.get(world_id) else {
                    continue;
                };
                if world.population.is_full() {
                    continue;
                }
                let message = OutgoingMessage::card(opened_card(world));
                if let Err(e) = self.ctx.chat.send_direct(tracker.user_id, &message).await {
                    tracing::warn!(user_id = tracker.user_id, world_id, error = %e, "Population alert delivery failed");
                }
                UserRepo::untrack_world(&self.ctx.pool, tracker.user_id, *world_id).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tyria_core::population::PopulationLevel;

    use super::*;

    #[test]
    fn card_names_world_and_level() {
        let card = opened_card(&World {
            id: 2012,
            name: "Piken Square".into(),
            population: PopulationLevel::VeryHigh,
        });
        let text = card.description.unwrap();
        assert!(text.contains("Piken Square"));
        assert!(text.contains("Very High"));
    }
}
