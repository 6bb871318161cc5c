//! World population samples.

use serde::Serialize;
use sqlx::FromRow;
use tyria_core::types::{GameId, Timestamp};

/// A row from the `world_population` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PopulationSample {
    pub id: i64,
    pub world_id: GameId,
    pub date: Timestamp,
    pub population: i16,
}
