//! Server record: feature toggles, channel bindings and sync settings.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use tyria_core::guildsync::RankRoles;
use tyria_core::types::{GameId, Snowflake, Timestamp};
use tyria_core::worldsync::WorldRoles;

/// A row from the `servers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ServerRecord {
    pub server_id: Snowflake,
    pub default_guild_id: Option<String>,
    pub link_preview_disabled: bool,
    pub timezone_offset: i16,

    pub updates_enabled: bool,
    pub updates_channel: Option<Snowflake>,
    pub daily_enabled: bool,
    pub daily_channel: Option<Snowflake>,
    pub news_enabled: bool,
    pub news_channel: Option<Snowflake>,
    pub boss_notifier_enabled: bool,
    pub boss_notifier_channel: Option<Snowflake>,
    pub boss_notifier_message: Option<Snowflake>,

    pub evtc_channels: Vec<Snowflake>,
    pub force_account_names: bool,

    pub key_role_enabled: bool,
    pub key_role_id: Option<Snowflake>,

    pub guildsync_enabled: bool,
    pub guildsync_guild_id: Option<String>,
    pub guildsync_leader: Option<Snowflake>,
    pub guildsync_ranks: Json<RankRoles>,
    pub guildsync_status: Option<String>,

    pub worldsync_enabled: bool,
    pub worldsync_world_id: Option<GameId>,
    pub worldsync_world_role: Option<Snowflake>,
    pub worldsync_ally_role: Option<Snowflake>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Channel-bound broadcast features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotifierKind {
    Updates,
    Daily,
    News,
    Bosses,
}

impl NotifierKind {
    /// `(enabled column, channel column)` for this notifier.
    pub(crate) fn columns(self) -> (&'static str, &'static str) {
        match self {
            NotifierKind::Updates => ("updates_enabled", "updates_channel"),
            NotifierKind::Daily => ("daily_enabled", "daily_channel"),
            NotifierKind::News => ("news_enabled", "news_channel"),
            NotifierKind::Bosses => ("boss_notifier_enabled", "boss_notifier_channel"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NotifierKind::Updates => "game update notifications",
            NotifierKind::Daily => "daily notifications",
            NotifierKind::News => "news notifications",
            NotifierKind::Bosses => "boss timer",
        }
    }
}

/// A server with a notifier enabled and a channel bound.
#[derive(Debug, Clone, FromRow)]
pub struct NotifierTarget {
    pub server_id: Snowflake,
    pub channel_id: Snowflake,
}

/// Guild-roster sync settings of a server.
#[derive(Debug, Clone)]
pub struct GuildSyncSettings {
    pub server_id: Snowflake,
    pub guild_id: String,
    pub leader_user_id: Snowflake,
    pub ranks: RankRoles,
}

/// World sync settings of a server.
#[derive(Debug, Clone, Copy)]
pub struct WorldSyncSettings {
    pub server_id: Snowflake,
    pub world_id: GameId,
    pub roles: WorldRoles,
}

/// Boss-timer board of a server.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct BossBoard {
    pub server_id: Snowflake,
    pub channel_id: Snowflake,
    pub message_id: Option<Snowflake>,
    pub timezone_offset: i16,
}

impl ServerRecord {
    pub fn guildsync(&self) -> Option<GuildSyncSettings> {
        if !self.guildsync_enabled {
            return None;
        }
        Some(GuildSyncSettings {
            server_id: self.server_id,
            guild_id: self.guildsync_guild_id.clone()?,
            leader_user_id: self.guildsync_leader?,
            ranks: self.guildsync_ranks.0.clone(),
        })
    }

    pub fn worldsync(&self) -> Option<WorldSyncSettings> {
        if !self.worldsync_enabled {
            return None;
        }
        Some(WorldSyncSettings {
            server_id: self.server_id,
            world_id: self.worldsync_world_id?,
            roles: WorldRoles {
                world_role: self.worldsync_world_role?,
                ally_role: self.worldsync_ally_role?,
            },
        })
    }

    pub fn key_role(&self) -> Option<Snowflake> {
        self.key_role_id.filter(|_| self.key_role_enabled)
    }
}
