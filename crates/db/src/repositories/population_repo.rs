//! Repository for the `world_population` time series.

use sqlx::PgPool;
use tyria_core::population::PopulationLevel;
use tyria_core::types::GameId;

pub struct PopulationRepo;

impl PopulationRepo {
    /// Most recent recorded level for a world.
    pub async fn latest(pool: &PgPool, world_id: GameId) -> Result<Option<i16>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT population FROM world_population \
             WHERE world_id = $1 ORDER BY date DESC LIMIT 1",
        )
        .bind(world_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn record(
        pool: &PgPool,
        world_id: GameId,
        level: PopulationLevel,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO world_population (world_id, population) VALUES ($1, $2)")
            .bind(world_id)
            .bind(level.as_level())
            .execute(pool)
            .await?;
        Ok(())
    }
}
