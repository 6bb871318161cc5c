//! Repository for the `users` table.

use sqlx::types::Json;
use sqlx::PgPool;
use tyria_core::credentials::KeyRing;
use tyria_core::types::{GameId, Snowflake};

use crate::models::user::{GemTracker, PopulationTracker, UserKeys, UserRecord};

/// Column list for `users` queries.
const COLUMNS: &str = "user_id, keys, active_key, gem_track_threshold, dpsreport_token, \
    population_track, created_at, updated_at";

/// Reads and writes per-user state.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by chat-platform id.
    pub async fn find(pool: &PgPool, user_id: Snowflake) -> Result<Option<UserRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE user_id = $1");
        sqlx::query_as::<_, UserRecord>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Load a user's key ring. Unknown users have an empty ring.
    pub async fn key_ring(pool: &PgPool, user_id: Snowflake) -> Result<KeyRing, sqlx::Error> {
        Ok(Self::find(pool, user_id)
            .await?
            .map(|u| u.key_ring())
            .unwrap_or_default())
    }

    /// Persist a key ring, creating the user row if needed.
    pub async fn save_key_ring(
        pool: &PgPool,
        user_id: Snowflake,
        ring: KeyRing,
    ) -> Result<(), sqlx::Error> {
        let (keys, active) = ring.into_parts();
        sqlx::query(
            "INSERT INTO users (user_id, keys, active_key) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                keys = EXCLUDED.keys, \
                active_key = EXCLUDED.active_key, \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(Json(keys))
        .bind(active)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Key rings of the given users, skipping users without keys.
    pub async fn key_rings_for(
        pool: &PgPool,
        user_ids: &[Snowflake],
    ) -> Result<Vec<UserKeys>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE user_id = ANY($1) AND jsonb_array_length(keys) > 0"
        );
        let rows = sqlx::query_as::<_, UserRecord>(&query)
            .bind(user_ids)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|u| UserKeys {
                user_id: u.user_id,
                ring: u.key_ring(),
            })
            .collect())
    }

    /// Set or clear the gem-price alert threshold (in copper).
    pub async fn set_gem_threshold(
        pool: &PgPool,
        user_id: Snowflake,
        threshold: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (user_id, gem_track_threshold) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
                gem_track_threshold = EXCLUDED.gem_track_threshold, \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(threshold)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Users with a pending gem-price alert.
    pub async fn gem_trackers(pool: &PgPool) -> Result<Vec<GemTracker>, sqlx::Error> {
        sqlx::query_as::<_, GemTracker>(
            "SELECT user_id, gem_track_threshold FROM users \
             WHERE gem_track_threshold IS NOT NULL",
        )
        .fetch_all(pool)
        .await
    }

    /// Add a world to a user's population watch list.
    pub async fn track_world(
        pool: &PgPool,
        user_id: Snowflake,
        world_id: GameId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (user_id, population_track) VALUES ($1, ARRAY[$2]::bigint[]) \
             ON CONFLICT (user_id) DO UPDATE SET \
                population_track = array_append(users.population_track, $2), \
                updated_at = NOW() \
             WHERE NOT ($2 = ANY(users.population_track))",
        )
        .bind(user_id)
        .bind(world_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a world from a user's watch list.
    pub async fn untrack_world(
        pool: &PgPool,
        user_id: Snowflake,
        world_id: GameId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET population_track = array_remove(population_track, $2), \
                updated_at = NOW() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(world_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Users watching at least one world.
    pub async fn population_trackers(pool: &PgPool) -> Result<Vec<PopulationTracker>, sqlx::Error> {
        sqlx::query_as::<_, PopulationTracker>(
            "SELECT user_id, population_track FROM users \
             WHERE cardinality(population_track) > 0",
        )
        .fetch_all(pool)
        .await
    }
}
