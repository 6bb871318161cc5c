//! Repository for the `servers` table.
//!
//! Settings are written one column at a time; the row is created on first
//! write with every other column at its default.

use sqlx::types::Json;
use sqlx::PgPool;
use tyria_core::guildsync::RankRoles;
use tyria_core::types::{GameId, Snowflake};
use tyria_core::worldsync::WorldRoles;

use crate::models::server::{BossBoard, NotifierKind, NotifierTarget, ServerRecord};

/// Column list for `servers` queries.
const COLUMNS: &str = "server_id, default_guild_id, link_preview_disabled, timezone_offset, \
    updates_enabled, updates_channel, daily_enabled, daily_channel, \
    news_enabled, news_channel, boss_notifier_enabled, boss_notifier_channel, \
    boss_notifier_message, evtc_channels, force_account_names, \
    key_role_enabled, key_role_id, \
    guildsync_enabled, guildsync_guild_id, guildsync_leader, guildsync_ranks, guildsync_status, \
    worldsync_enabled, worldsync_world_id, worldsync_world_role, worldsync_ally_role, \
    created_at, updated_at";

/// Reads and writes per-server configuration.
pub struct ServerRepo;

impl ServerRepo {
    pub async fn find(
        pool: &PgPool,
        server_id: Snowflake,
    ) -> Result<Option<ServerRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM servers WHERE server_id = $1");
        sqlx::query_as::<_, ServerRecord>(&query)
            .bind(server_id)
            .fetch_optional(pool)
            .await
    }

    async fn ensure(pool: &PgPool, server_id: Snowflake) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO servers (server_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(server_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Enable a broadcast notifier on a channel.
    pub async fn enable_notifier(
        pool: &PgPool,
        server_id: Snowflake,
        kind: NotifierKind,
        channel_id: Snowflake,
    ) -> Result<(), sqlx::Error> {
        Self::ensure(pool, server_id).await?;
        let (enabled, channel) = kind.columns();
        let query = format!(
            "UPDATE servers SET {enabled} = TRUE, {channel} = $2, updated_at = NOW() \
             WHERE server_id = $1"
        );
        sqlx::query(&query)
            .bind(server_id)
            .bind(channel_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Disable a broadcast notifier. The channel binding is kept.
    pub async fn disable_notifier(
        pool: &PgPool,
        server_id: Snowflake,
        kind: NotifierKind,
    ) -> Result<(), sqlx::Error> {
        Self::ensure(pool, server_id).await?;
        let (enabled, _) = kind.columns();
        let query = format!(
            "UPDATE servers SET {enabled} = FALSE, updated_at = NOW() WHERE server_id = $1"
        );
        sqlx::query(&query).bind(server_id).execute(pool).await?;
        Ok(())
    }

    /// Servers with `kind` enabled and a channel bound.
    pub async fn notifier_targets(
        pool: &PgPool,
        kind: NotifierKind,
    ) -> Result<Vec<NotifierTarget>, sqlx::Error> {
        let (enabled, channel) = kind.columns();
        let query = format!(
            "SELECT server_id, {channel} AS channel_id FROM servers \
             WHERE {enabled} AND {channel} IS NOT NULL \
             ORDER BY server_id"
        );
        sqlx::query_as::<_, NotifierTarget>(&query)
            .fetch_all(pool)
            .await
    }

    /// Servers with the boss timer enabled.
    pub async fn boss_boards(pool: &PgPool) -> Result<Vec<BossBoard>, sqlx::Error> {
        sqlx::query_as::<_, BossBoard>(
            "SELECT server_id, boss_notifier_channel AS channel_id, \
                boss_notifier_message AS message_id, timezone_offset \
             FROM servers \
             WHERE boss_notifier_enabled AND boss_notifier_channel IS NOT NULL",
        )
        .fetch_all(pool)
        .await
    }

    /// Remember (or forget) the boss-timer message so it is edited in place.
    pub async fn set_boss_message(
        pool: &PgPool,
        server_id: Snowflake,
        message_id: Option<Snowflake>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE servers SET boss_notifier_message = $2, updated_at = NOW() \
             WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(message_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_timezone(
        pool: &PgPool,
        server_id: Snowflake,
        offset_hours: i16,
    ) -> Result<(), sqlx::Error> {
        Self::ensure(pool, server_id).await?;
        sqlx::query(
            "UPDATE servers SET timezone_offset = $2, updated_at = NOW() WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(offset_hours)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_link_preview_disabled(
        pool: &PgPool,
        server_id: Snowflake,
        disabled: bool,
    ) -> Result<(), sqlx::Error> {
        Self::ensure(pool, server_id).await?;
        sqlx::query(
            "UPDATE servers SET link_preview_disabled = $2, updated_at = NOW() \
             WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(disabled)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_default_guild(
        pool: &PgPool,
        server_id: Snowflake,
        guild_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        Self::ensure(pool, server_id).await?;
        sqlx::query(
            "UPDATE servers SET default_guild_id = $2, updated_at = NOW() WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(guild_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_force_account_names(
        pool: &PgPool,
        server_id: Snowflake,
        enabled: bool,
    ) -> Result<(), sqlx::Error> {
        Self::ensure(pool, server_id).await?;
        sqlx::query(
            "UPDATE servers SET force_account_names = $2, updated_at = NOW() \
             WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(enabled)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Servers that force account names as nicknames.
    pub async fn with_forced_names(pool: &PgPool) -> Result<Vec<Snowflake>, sqlx::Error> {
        sqlx::query_scalar("SELECT server_id FROM servers WHERE force_account_names")
            .fetch_all(pool)
            .await
    }

    pub async fn set_key_role(
        pool: &PgPool,
        server_id: Snowflake,
        role_id: Option<Snowflake>,
    ) -> Result<(), sqlx::Error> {
        Self::ensure(pool, server_id).await?;
        sqlx::query(
            "UPDATE servers SET key_role_enabled = $2, key_role_id = $3, updated_at = NOW() \
             WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(role_id.is_some())
        .bind(role_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// `(server, role)` for every server with the key role enabled.
    pub async fn with_key_role(pool: &PgPool) -> Result<Vec<(Snowflake, Snowflake)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT server_id, key_role_id FROM servers \
             WHERE key_role_enabled AND key_role_id IS NOT NULL",
        )
        .fetch_all(pool)
        .await
    }

    /// Configure guild-roster sync. Existing rank mappings are reset.
    pub async fn set_guildsync(
        pool: &PgPool,
        server_id: Snowflake,
        guild_id: &str,
        leader_user_id: Snowflake,
    ) -> Result<(), sqlx::Error> {
        Self::ensure(pool, server_id).await?;
        sqlx::query(
            "UPDATE servers SET guildsync_enabled = TRUE, guildsync_guild_id = $2, \
                guildsync_leader = $3, guildsync_ranks = '{}'::jsonb, guildsync_status = NULL, \
                updated_at = NOW() \
             WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(guild_id)
        .bind(leader_user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Disable guild-roster sync and return the rank mapping that was stored.
    pub async fn clear_guildsync(
        pool: &PgPool,
        server_id: Snowflake,
    ) -> Result<RankRoles, sqlx::Error> {
        let previous: Option<Json<RankRoles>> = sqlx::query_scalar(
            "WITH old AS ( \
                SELECT server_id, guildsync_ranks FROM servers WHERE server_id = $1 FOR UPDATE \
             ) \
             UPDATE servers s SET guildsync_enabled = FALSE, guildsync_ranks = '{}'::jsonb, \
                guildsync_status = NULL, updated_at = NOW() \
             FROM old WHERE s.server_id = old.server_id \
             RETURNING old.guildsync_ranks",
        )
        .bind(server_id)
        .fetch_optional(pool)
        .await?;
        Ok(previous.map(|j| j.0).unwrap_or_default())
    }

    /// Servers with guild-roster sync enabled.
    pub async fn with_guildsync(pool: &PgPool) -> Result<Vec<ServerRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM servers WHERE guildsync_enabled ORDER BY server_id"
        );
        sqlx::query_as::<_, ServerRecord>(&query).fetch_all(pool).await
    }

    pub async fn set_guildsync_ranks(
        pool: &PgPool,
        server_id: Snowflake,
        ranks: &RankRoles,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE servers SET guildsync_ranks = $2, updated_at = NOW() WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(Json(ranks))
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record the outcome of the last guild sync pass for `guildsync status`.
    pub async fn set_guildsync_status(
        pool: &PgPool,
        server_id: Snowflake,
        status: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE servers SET guildsync_status = $2, updated_at = NOW() WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_worldsync(
        pool: &PgPool,
        server_id: Snowflake,
        world_id: GameId,
        roles: WorldRoles,
    ) -> Result<(), sqlx::Error> {
        Self::ensure(pool, server_id).await?;
        sqlx::query(
            "UPDATE servers SET worldsync_enabled = TRUE, worldsync_world_id = $2, \
                worldsync_world_role = $3, worldsync_ally_role = $4, updated_at = NOW() \
             WHERE server_id = $1",
        )
        .bind(server_id)
        .bind(world_id)
        .bind(roles.world_role)
        .bind(roles.ally_role)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn clear_worldsync(pool: &PgPool, server_id: Snowflake) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE servers SET worldsync_enabled = FALSE, updated_at = NOW() \
             WHERE server_id = $1",
        )
        .bind(server_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Servers with world sync enabled.
    pub async fn with_worldsync(pool: &PgPool) -> Result<Vec<ServerRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM servers WHERE worldsync_enabled ORDER BY server_id"
        );
        sqlx::query_as::<_, ServerRecord>(&query).fetch_all(pool).await
    }
}
