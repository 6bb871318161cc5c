//! Repository for the `bot_state` key/value table.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tyria_core::dailies::DailiesSnapshot;

use crate::models::state::{DAILIES, DAY_MARKER, LAST_BUILD, MAX_NEWS_TITLES, NEWS_TITLES};

/// Process-global singletons. Last writer wins.
pub struct StateRepo;

impl StateRepo {
    /// Read a value. A stored value that no longer decodes reads as absent.
    pub async fn get<T: DeserializeOwned>(pool: &PgPool, key: &str) -> Result<Option<T>, sqlx::Error> {
        let raw: Option<Json<serde_json::Value>> =
            sqlx::query_scalar("SELECT value FROM bot_state WHERE key = $1")
                .bind(key)
                .fetch_optional(pool)
                .await?;
        Ok(raw.and_then(|Json(v)| match serde_json::from_value(v) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable state value");
                None
            }
        }))
    }

    pub async fn set<T: Serialize + Sync>(
        pool: &PgPool,
        key: &str,
        value: &T,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO bot_state (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(Json(value))
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn last_build(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
        Self::get(pool, LAST_BUILD).await
    }

    pub async fn set_last_build(pool: &PgPool, build: i64) -> Result<(), sqlx::Error> {
        Self::set(pool, LAST_BUILD, &build).await
    }

    pub async fn news_titles(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        Ok(Self::get(pool, NEWS_TITLES).await?.unwrap_or_default())
    }

    /// Store the latest feed titles, newest first, capped.
    pub async fn set_news_titles(pool: &PgPool, titles: &[String]) -> Result<(), sqlx::Error> {
        let capped = &titles[..titles.len().min(MAX_NEWS_TITLES)];
        Self::set(pool, NEWS_TITLES, &capped).await
    }

    pub async fn day_marker(pool: &PgPool) -> Result<Option<u32>, sqlx::Error> {
        Self::get(pool, DAY_MARKER).await
    }

    pub async fn set_day_marker(pool: &PgPool, weekday: u32) -> Result<(), sqlx::Error> {
        Self::set(pool, DAY_MARKER, &weekday).await
    }

    pub async fn dailies(pool: &PgPool) -> Result<Option<DailiesSnapshot>, sqlx::Error> {
        Self::get(pool, DAILIES).await
    }

    pub async fn set_dailies(pool: &PgPool, snapshot: &DailiesSnapshot) -> Result<(), sqlx::Error> {
        Self::set(pool, DAILIES, snapshot).await
    }
}
