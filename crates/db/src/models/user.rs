//! User record: credentials and tracking preferences.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use tyria_core::credentials::{Credential, KeyRing};
use tyria_core::types::{GameId, Snowflake, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRecord {
    pub user_id: Snowflake,
    pub keys: Json<Vec<Credential>>,
    pub active_key: Option<String>,
    pub gem_track_threshold: Option<i64>,
    pub dpsreport_token: Option<String>,
    pub population_track: Vec<GameId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserRecord {
    pub fn key_ring(&self) -> KeyRing {
        KeyRing::from_parts(self.keys.0.clone(), self.active_key.clone())
    }
}

/// A user id with their credential ring, used by the member synchronizers.
#[derive(Debug, Clone)]
pub struct UserKeys {
    pub user_id: Snowflake,
    pub ring: KeyRing,
}

/// Minimal projection for the gem-price tracker.
#[derive(Debug, Clone, FromRow)]
pub struct GemTracker {
    pub user_id: Snowflake,
    pub gem_track_threshold: i64,
}

/// Minimal projection for the population tracker.
#[derive(Debug, Clone, FromRow)]
pub struct PopulationTracker {
    pub user_id: Snowflake,
    pub population_track: Vec<GameId>,
}
