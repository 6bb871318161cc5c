//! `guildsync` and `worldsync` configuration.

use serde::Deserialize;
use tyria_core::card::{MessageCard, Reply};
use tyria_core::catalog::Catalog;
use tyria_core::error::ApiError;
use tyria_core::guildsync::GuildMember;
use tyria_core::permissions::Permission;
use tyria_core::types::Snowflake;
use tyria_core::worldsync::WorldRoles;
use tyria_db::models::server::ServerRecord;
use tyria_db::repositories::{ServerRepo, UserRepo};
use tyria_events::ChatError;
use tyria_gateway::Auth;
use validator::Validate;

use super::{find_cached, guild_id_by_name, CommandError, Invocation, NoArgs};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct GuildSyncArgs {
    #[validate(length(min = 3, max = 60))]
    pub guild: String,
}

/// Bind the server to an ingame guild, with the invoking user as the
/// leader whose key reads the roster.
pub async fn guildsync_set(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let args: GuildSyncArgs = inv.args()?;
    let ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    let required = [Permission::Guilds];
    let credential = ring.resolve(&required)?;

    let guild_id = guild_id_by_name(state, &args.guild).await?;
    // Only a guild leader's key may read the roster.
    let roster = state
        .gateway
        .call::<Vec<GuildMember>>(
            &format!("guild/{guild_id}/members"),
            Auth::Bound(credential),
            &required,
            None,
        )
        .await;
    match roster {
        Ok(_) => {}
        Err(ApiError::Forbidden(_)) => {
            return Ok(Reply::text(
                "Your active key must belong to the leader of that guild.",
            ))
        }
        Err(e) => return Err(e.into()),
    }

    ServerRepo::set_guildsync(&state.pool, server_id, &guild_id, inv.user_id).await?;
    tracing::info!(server_id, guild_id = %guild_id, leader = inv.user_id, "Guild sync enabled");
    Ok(Reply::text(format!(
        "Guild sync enabled for {}. Rank roles will appear within ten minutes.",
        args.guild.trim()
    )))
}

/// Stop syncing and delete the roles the sync created.
pub async fn guildsync_clear(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let _: NoArgs = inv.args()?;
    let ranks = ServerRepo::clear_guildsync(&state.pool, server_id).await?;
    let mut deleted = 0;
    for (rank, role) in &ranks {
        match state.chat.delete_role(server_id, *role).await {
            Ok(()) => deleted += 1,
            Err(ChatError::NotFound) => {}
            Err(e) => tracing::warn!(server_id, rank = %rank, role, error = %e, "Could not delete rank role"),
        }
    }
    Ok(Reply::text(format!(
        "Guild sync disabled. Deleted {deleted} rank roles."
    )))
}

pub fn status_card(server: &ServerRecord) -> Option<MessageCard> {
    let settings = server.guildsync()?;
    let mut ranks: Vec<String> = settings
        .ranks
        .iter()
        .map(|(rank, role)| format!("{rank}: <@&{role}>"))
        .collect();
    if ranks.is_empty() {
        ranks.push("none yet".to_string());
    }
    let health = server
        .guildsync_status
        .clone()
        .unwrap_or_else(|| "Working".to_string());
    Some(
        MessageCard::new("Guild sync")
            .field("Guild", settings.guild_id, false)
            .field("Leader", format!("<@{}>", settings.leader_user_id), true)
            .field("Status", health, false)
            .field("Ranks", ranks.join("\n"), false),
    )
}

pub async fn guildsync_status(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let _: NoArgs = inv.args()?;
    let card = ServerRepo::find(&state.pool, server_id)
        .await?
        .as_ref()
        .and_then(status_card);
    match card {
        Some(card) => Ok(card.into()),
        None => Ok(Reply::text("Guild sync is not enabled on this server.")),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct WorldSyncArgs {
    #[validate(length(min = 1, max = 60))]
    pub world: String,
    pub world_role: Snowflake,
    /// May equal `world_role`.
    pub ally_role: Snowflake,
}

pub async fn worldsync_set(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let args: WorldSyncArgs = inv.args()?;
    let Some(world) = find_cached(state, Catalog::Worlds, &args.world).await? else {
        return Ok(Reply::text(format!("No world named \"{}\" was found.", args.world.trim())));
    };
    let roles = WorldRoles {
        world_role: args.world_role,
        ally_role: args.ally_role,
    };
    ServerRepo::set_worldsync(&state.pool, server_id, world.id, roles).await?;
    let name = world.name.unwrap_or_else(|| world.id.to_string());
    tracing::info!(server_id, world_id = world.id, "World sync enabled");
    Ok(Reply::text(format!(
        "World sync enabled for {name}: <@&{}> for its members, <@&{}> for linked worlds.",
        args.world_role, args.ally_role
    )))
}

pub async fn worldsync_clear(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let _: NoArgs = inv.args()?;
    ServerRepo::clear_worldsync(&state.pool, server_id).await?;
    Ok(Reply::text("World sync disabled."))
}
