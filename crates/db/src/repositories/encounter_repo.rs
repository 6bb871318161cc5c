//! Repository for the `encounters` table.

use sqlx::PgPool;
use tyria_core::types::Timestamp;

use crate::models::encounter::Encounter;

const COLUMNS: &str =
    "id, boss_id, start_date, date, players, permalink, success, duration_seconds";

pub struct EncounterRepo;

impl EncounterRepo {
    /// Encounters involving any of `accounts` started at or after `since`.
    pub async fn for_accounts_since(
        pool: &PgPool,
        accounts: &[String],
        since: Timestamp,
    ) -> Result<Vec<Encounter>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM encounters \
             WHERE players && $1 AND start_date >= $2 \
             ORDER BY start_date DESC"
        );
        sqlx::query_as::<_, Encounter>(&query)
            .bind(accounts)
            .bind(since)
            .fetch_all(pool)
            .await
    }
}
