//! The command surface.
//!
//! The chat adapter posts an [`Invocation`]; [`dispatch`] checks the
//! declared permission and the service availability, then runs the
//! handler. Upstream failures become one-line replies through
//! [`CommandError::reply`].

pub mod account;
pub mod admin;
pub mod character;
pub mod dailies;
pub mod keys;
pub mod lookup;
pub mod server;
pub mod sync;
pub mod timers;
pub mod tracking;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tyria_core::card::Reply;
use tyria_core::catalog::Catalog;
use tyria_core::credentials::KeyRingError;
use tyria_core::error::ApiError;
use tyria_core::types::Snowflake;
use tyria_db::models::reference::ReferenceEntry;
use tyria_db::repositories::ReferenceRepo;
use tyria_events::ChatError;
use validator::Validate;

use crate::state::AppState;

/// Shown for every command while the reference cache is rebuilding.
pub const UNAVAILABLE: &str =
    "The bot is currently rebuilding its cache. Try again in a few minutes.";

/// Chat-side authority a command requires of the invoking user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPermission {
    ManageServer,
    ManageRoles,
    ManageNicknames,
    /// The configured bot owner. Checked here, not by the adapter.
    Operator,
}

impl ChatPermission {
    pub fn label(self) -> &'static str {
        match self {
            ChatPermission::ManageServer => "Manage Server",
            ChatPermission::ManageRoles => "Manage Roles",
            ChatPermission::ManageNicknames => "Manage Nicknames",
            ChatPermission::Operator => "bot owner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    KeyAdd,
    KeyRemove,
    KeySwitch,
    KeyList,
    KeyInfo,
    Account,
    Raids,
    Wallet,
    Character,
    ItemSearch,
    TpPrice,
    Dailies,
    Bosses,
    LwMaps,
    Strikes,
    Cotm,
    Fractals,
    GemTrack,
    PopTrack,
    RaidLogs,
    ServerUpdates,
    ServerDaily,
    ServerNews,
    ServerBosses,
    ServerTimezone,
    ServerLinkPreview,
    ServerDefaultGuild,
    ServerForceNames,
    ServerKeyRole,
    GuildSyncSet,
    GuildSyncClear,
    GuildSyncStatus,
    WorldSyncSet,
    WorldSyncClear,
    CacheRebuild,
}

impl Command {
    pub const ALL: [Command; 35] = [
        Command::KeyAdd,
        Command::KeyRemove,
        Command::KeySwitch,
        Command::KeyList,
        Command::KeyInfo,
        Command::Account,
        Command::Raids,
        Command::Wallet,
        Command::Character,
        Command::ItemSearch,
        Command::TpPrice,
        Command::Dailies,
        Command::Bosses,
        Command::LwMaps,
        Command::Strikes,
        Command::Cotm,
        Command::Fractals,
        Command::GemTrack,
        Command::PopTrack,
        Command::RaidLogs,
        Command::ServerUpdates,
        Command::ServerDaily,
        Command::ServerNews,
        Command::ServerBosses,
        Command::ServerTimezone,
        Command::ServerLinkPreview,
        Command::ServerDefaultGuild,
        Command::ServerForceNames,
        Command::ServerKeyRole,
        Command::GuildSyncSet,
        Command::GuildSyncClear,
        Command::GuildSyncStatus,
        Command::WorldSyncSet,
        Command::WorldSyncClear,
        Command::CacheRebuild,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::KeyAdd => "key add",
            Command::KeyRemove => "key remove",
            Command::KeySwitch => "key switch",
            Command::KeyList => "key list",
            Command::KeyInfo => "key info",
            Command::Account => "account",
            Command::Raids => "raids",
            Command::Wallet => "wallet",
            Command::Character => "character",
            Command::ItemSearch => "item search",
            Command::TpPrice => "tp price",
            Command::Dailies => "dailies",
            Command::Bosses => "bosses",
            Command::LwMaps => "lwmaps",
            Command::Strikes => "strikes",
            Command::Cotm => "cotm",
            Command::Fractals => "fractals",
            Command::GemTrack => "gemtrack",
            Command::PopTrack => "poptrack",
            Command::RaidLogs => "raidlogs",
            Command::ServerUpdates => "server updates",
            Command::ServerDaily => "server daily",
            Command::ServerNews => "server news",
            Command::ServerBosses => "server bosses",
            Command::ServerTimezone => "server timezone",
            Command::ServerLinkPreview => "server linkpreview",
            Command::ServerDefaultGuild => "server defaultguild",
            Command::ServerForceNames => "server forcenames",
            Command::ServerKeyRole => "server keyrole",
            Command::GuildSyncSet => "guildsync set",
            Command::GuildSyncClear => "guildsync clear",
            Command::GuildSyncStatus => "guildsync status",
            Command::WorldSyncSet => "worldsync set",
            Command::WorldSyncClear => "worldsync clear",
            Command::CacheRebuild => "cache rebuild",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::KeyAdd => "Store an API key and make it active",
            Command::KeyRemove => "Remove a stored API key",
            Command::KeySwitch => "Make another stored key the active one",
            Command::KeyList => "List stored API keys",
            Command::KeyInfo => "Show the active key and its permissions",
            Command::Account => "Account overview",
            Command::Raids => "Raid bosses cleared this week",
            Command::Wallet => "Wallet contents by currency group",
            Command::Character => "Profession, level and equipped gear of a character",
            Command::ItemSearch => "Find items by name",
            Command::TpPrice => "Trading post prices of an item",
            Command::Dailies => "Today's or tomorrow's dailies",
            Command::Bosses => "Upcoming world bosses",
            Command::LwMaps => "Living world daily maps",
            Command::Strikes => "Today's priority strike mission",
            Command::Cotm => "Raid wing under Call of the Mists",
            Command::Fractals => "Instabilities of top-scale fractals",
            Command::GemTrack => "Get a message when gems get cheaper than a price",
            Command::PopTrack => "Get a message when a world stops being full",
            Command::RaidLogs => "Raid encounters logged this week",
            Command::ServerUpdates => "Game update notifications",
            Command::ServerDaily => "Daily notifications",
            Command::ServerNews => "News notifications",
            Command::ServerBosses => "Self-updating world boss timer",
            Command::ServerTimezone => "Timezone used for boss times",
            Command::ServerLinkPreview => "Toggle wiki link previews",
            Command::ServerDefaultGuild => "Guild used when none is given",
            Command::ServerForceNames => "Force nicknames to show account names",
            Command::ServerKeyRole => "Role given to members with an API key",
            Command::GuildSyncSet => "Mirror an ingame guild's ranks to roles",
            Command::GuildSyncClear => "Stop guild sync and delete its roles",
            Command::GuildSyncStatus => "Guild sync configuration and health",
            Command::WorldSyncSet => "Roles for members on a world and its links",
            Command::WorldSyncClear => "Stop world sync",
            Command::CacheRebuild => "Reload the reference cache",
        }
    }

    pub fn permission(self) -> Option<ChatPermission> {
        match self {
            Command::ServerUpdates
            | Command::ServerDaily
            | Command::ServerNews
            | Command::ServerBosses
            | Command::ServerTimezone
            | Command::ServerLinkPreview
            | Command::ServerDefaultGuild => Some(ChatPermission::ManageServer),
            Command::ServerForceNames => Some(ChatPermission::ManageNicknames),
            Command::ServerKeyRole
            | Command::GuildSyncSet
            | Command::GuildSyncClear
            | Command::GuildSyncStatus
            | Command::WorldSyncSet
            | Command::WorldSyncClear => Some(ChatPermission::ManageRoles),
            Command::CacheRebuild => Some(ChatPermission::Operator),
            _ => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == normalized)
    }
}

/// One command invocation as sent by the chat adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct Invocation {
    pub command: String,
    pub user_id: Snowflake,
    #[serde(default)]
    pub server_id: Option<Snowflake>,
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    /// Chat permissions the adapter verified the user holds.
    #[serde(default)]
    pub granted: Vec<ChatPermission>,
    #[serde(default)]
    pub args: Value,
}

impl Invocation {
    /// Decode and validate the arguments. Missing arguments decode as an
    /// empty object so all-optional argument structs need none.
    pub fn args<T: DeserializeOwned + Validate>(&self) -> Result<T, CommandError> {
        let value = match &self.args {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        let args: T = serde_json::from_value(value)
            .map_err(|e| CommandError::Usage(format!("Invalid arguments: {e}")))?;
        args.validate()
            .map_err(|e| CommandError::Usage(format!("Invalid arguments: {e}")))?;
        Ok(args)
    }

    pub fn server(&self) -> Result<Snowflake, CommandError> {
        self.server_id
            .ok_or_else(|| CommandError::Usage("This command can only be used in a server.".into()))
    }
}

/// Arguments of commands that take none.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct NoArgs {}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    KeyRing(#[from] KeyRingError),

    /// Wrong or missing arguments, or a command used in the wrong place.
    #[error("{0}")]
    Usage(String),

    #[error("missing chat permission: {}", .0.label())]
    Forbidden(ChatPermission),

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl CommandError {
    /// The reply shown to the invoking user, or `None` for failures that
    /// are the service's own.
    pub fn reply(&self) -> Option<Reply> {
        match self {
            CommandError::Api(e) => Some(Reply::text(e.user_message())),
            CommandError::KeyRing(e) => Some(Reply::text(e.to_string())),
            CommandError::Usage(msg) => Some(Reply::text(msg.clone())),
            CommandError::Forbidden(p) => Some(Reply::text(format!(
                "You need the {} permission to use this command.",
                p.label()
            ))),
            CommandError::Chat(e) if e.is_expected() => Some(Reply::text(
                "I don't have the permissions to do that on this server.",
            )),
            CommandError::Unknown(_) | CommandError::Chat(_) | CommandError::Database(_) => None,
        }
    }
}

fn authorize(state: &AppState, command: Command, inv: &Invocation) -> Result<(), CommandError> {
    match command.permission() {
        None => Ok(()),
        Some(ChatPermission::Operator) if state.config.is_owner(inv.user_id) => Ok(()),
        Some(p) if p != ChatPermission::Operator && inv.granted.contains(&p) => Ok(()),
        Some(p) => Err(CommandError::Forbidden(p)),
    }
}

/// Run one invocation.
pub async fn dispatch(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let command =
        Command::parse(&inv.command).ok_or_else(|| CommandError::Unknown(inv.command.clone()))?;
    authorize(state, command, inv)?;
    if !state.status().is_available() {
        return Ok(Reply::text(UNAVAILABLE));
    }

    match command {
        Command::KeyAdd => keys::add(state, inv).await,
        Command::KeyRemove => keys::remove(state, inv).await,
        Command::KeySwitch => keys::switch(state, inv).await,
        Command::KeyList => keys::list(state, inv).await,
        Command::KeyInfo => keys::info(state, inv).await,
        Command::Account => account::account(state, inv).await,
        Command::Raids => account::raids(state, inv).await,
        Command::Wallet => account::wallet(state, inv).await,
        Command::Character => character::character(state, inv).await,
        Command::ItemSearch => lookup::item_search(state, inv).await,
        Command::TpPrice => lookup::tp_price(state, inv).await,
        Command::Dailies => dailies::dailies(state, inv).await,
        Command::Bosses => timers::bosses(state, inv).await,
        Command::LwMaps => dailies::lw_maps(inv),
        Command::Strikes => dailies::strikes(inv),
        Command::Cotm => dailies::cotm(state, inv).await,
        Command::Fractals => dailies::fractals(inv),
        Command::GemTrack => tracking::gemtrack(state, inv).await,
        Command::PopTrack => tracking::poptrack(state, inv).await,
        Command::RaidLogs => tracking::raidlogs(state, inv).await,
        Command::ServerUpdates
        | Command::ServerDaily
        | Command::ServerNews
        | Command::ServerBosses => server::notifier(state, inv, command).await,
        Command::ServerTimezone => server::timezone(state, inv).await,
        Command::ServerLinkPreview => server::link_preview(state, inv).await,
        Command::ServerDefaultGuild => server::default_guild(state, inv).await,
        Command::ServerForceNames => server::force_names(state, inv).await,
        Command::ServerKeyRole => server::key_role(state, inv).await,
        Command::GuildSyncSet => sync::guildsync_set(state, inv).await,
        Command::GuildSyncClear => sync::guildsync_clear(state, inv).await,
        Command::GuildSyncStatus => sync::guildsync_status(state, inv).await,
        Command::WorldSyncSet => sync::worldsync_set(state, inv).await,
        Command::WorldSyncClear => sync::worldsync_clear(state, inv).await,
        Command::CacheRebuild => admin::cache_rebuild(state, inv),
    }
}

/// Closest cached entry for a user-typed name: an exact (case-insensitive)
/// match wins over the first prefix match.
pub(crate) async fn find_cached(
    state: &AppState,
    catalog: Catalog,
    name: &str,
) -> Result<Option<ReferenceEntry>, CommandError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    let matches = ReferenceRepo::search_by_name(&state.pool, catalog, name, 25).await?;
    Ok(best_match(matches, name))
}

fn best_match(entries: Vec<ReferenceEntry>, name: &str) -> Option<ReferenceEntry> {
    let wanted = name.to_lowercase();
    let exact = entries
        .iter()
        .position(|e| e.name.as_deref().is_some_and(|n| n.to_lowercase() == wanted));
    match exact {
        Some(i) => entries.into_iter().nth(i),
        None => entries.into_iter().next(),
    }
}

/// Resolve an ingame guild name to its id.
pub(crate) async fn guild_id_by_name(state: &AppState, name: &str) -> Result<String, CommandError> {
    let endpoint = tyria_gateway::endpoint(&["guild", "search"], &[("name", name.trim())]);
    let ids: Vec<String> = state.gateway.get(&endpoint).await?;
    ids.into_iter()
        .next()
        .ok_or_else(|| CommandError::Usage(format!("No guild named \"{}\" was found.", name.trim())))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use sqlx::types::Json;

    use super::*;

    fn entry(id: i64, name: &str) -> ReferenceEntry {
        ReferenceEntry {
            id,
            name: Some(name.to_string()),
            data: Json(json!({})),
        }
    }

    #[test]
    fn every_command_parses_from_its_name() {
        for command in Command::ALL {
            assert_eq!(Command::parse(command.name()), Some(command));
        }
        assert_eq!(Command::parse("  Key   ADD "), Some(Command::KeyAdd));
        assert_eq!(Command::parse("key"), None);
    }

    #[test]
    fn server_commands_declare_permissions() {
        assert_eq!(Command::ServerTimezone.permission(), Some(ChatPermission::ManageServer));
        assert_eq!(Command::ServerForceNames.permission(), Some(ChatPermission::ManageNicknames));
        assert_eq!(Command::GuildSyncSet.permission(), Some(ChatPermission::ManageRoles));
        assert_eq!(Command::Account.permission(), None);
    }

    #[test]
    fn api_errors_become_user_messages() {
        let reply = CommandError::Api(ApiError::Inactive).reply().unwrap();
        assert_eq!(reply.as_text(), Some("The API is currently down. Try again later."));

        let reply = CommandError::Api(ApiError::RateLimited).reply().unwrap();
        assert_eq!(
            reply.as_text(),
            Some("API has responded with the following error: RateLimited")
        );
    }

    #[test]
    fn internal_failures_have_no_reply() {
        assert_matches!(CommandError::Database(sqlx::Error::PoolTimedOut).reply(), None);
        assert_matches!(CommandError::Unknown("x".into()).reply(), None);
        assert_matches!(CommandError::Chat(ChatError::Forbidden).reply(), Some(_));
    }

    #[test]
    fn missing_args_decode_as_empty_object() {
        let inv: Invocation = serde_json::from_value(json!({
            "command": "dailies",
            "user_id": 1
        }))
        .unwrap();
        let _: NoArgs = inv.args().unwrap();
        assert_matches!(inv.server(), Err(CommandError::Usage(_)));
    }

    #[test]
    fn exact_name_beats_prefix_match() {
        let entries = vec![entry(1, "Mithril Ore"), entry(2, "Mithril")];
        assert_eq!(best_match(entries, "mithril").unwrap().id, 2);
        let entries = vec![entry(1, "Mithril Ore"), entry(2, "Mithril Ingot")];
        assert_eq!(best_match(entries, "mithril").unwrap().id, 1);
    }
}
