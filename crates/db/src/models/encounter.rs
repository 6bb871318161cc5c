//! Processed combat-log encounters.

use serde::Serialize;
use sqlx::FromRow;
use tyria_core::types::{GameId, Timestamp};

/// A row from the `encounters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Encounter {
    pub id: i64,
    pub boss_id: GameId,
    pub start_date: Timestamp,
    pub date: Timestamp,
    pub players: Vec<String>,
    pub permalink: String,
    pub success: bool,
    pub duration_seconds: i32,
}
