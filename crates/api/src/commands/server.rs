//! Server settings: notifier bindings, timezone, link previews, default
//! guild, forced nicknames and the API-key role.

use serde::Deserialize;
use tyria_core::card::Reply;
use tyria_core::types::Snowflake;
use tyria_db::models::server::NotifierKind;
use tyria_db::repositories::ServerRepo;
use validator::Validate;

use super::{guild_id_by_name, Command, CommandError, Invocation};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct NotifierArgs {
    pub enabled: bool,
    /// Defaults to the channel the command was used in.
    pub channel_id: Option<Snowflake>,
}

fn notifier_kind(command: Command) -> Option<NotifierKind> {
    match command {
        Command::ServerUpdates => Some(NotifierKind::Updates),
        Command::ServerDaily => Some(NotifierKind::Daily),
        Command::ServerNews => Some(NotifierKind::News),
        Command::ServerBosses => Some(NotifierKind::Bosses),
        _ => None,
    }
}

pub async fn notifier(
    state: &AppState,
    inv: &Invocation,
    command: Command,
) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let args: NotifierArgs = inv.args()?;
    let kind = notifier_kind(command)
        .ok_or_else(|| CommandError::Unknown(command.name().to_string()))?;

    if !args.enabled {
        ServerRepo::disable_notifier(&state.pool, server_id, kind).await?;
        return Ok(Reply::text(format!("Disabled {}.", kind.label())));
    }

    let channel_id = args
        .channel_id
        .or(inv.channel_id)
        .ok_or_else(|| CommandError::Usage("Pick a channel to post in.".into()))?;
    ServerRepo::enable_notifier(&state.pool, server_id, kind, channel_id).await?;
    if kind == NotifierKind::Bosses {
        // A board in another channel can't be edited; start a fresh one.
        ServerRepo::set_boss_message(&state.pool, server_id, None).await?;
    }
    tracing::info!(server_id, channel_id, notifier = kind.label(), "Notifier enabled");
    Ok(Reply::text(format!("Enabled {} in <#{channel_id}>.", kind.label())))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TimezoneArgs {
    /// Whole hours from UTC.
    #[validate(range(min = -12, max = 14))]
    pub offset: i16,
}

pub async fn timezone(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let args: TimezoneArgs = inv.args()?;
    ServerRepo::set_timezone(&state.pool, server_id, args.offset).await?;
    Ok(Reply::text(format!("Server timezone set to UTC{:+}.", args.offset)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ToggleArgs {
    pub enabled: bool,
}

pub async fn link_preview(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let args: ToggleArgs = inv.args()?;
    ServerRepo::set_link_preview_disabled(&state.pool, server_id, !args.enabled).await?;
    let state_word = if args.enabled { "enabled" } else { "disabled" };
    Ok(Reply::text(format!("Link previews {state_word}.")))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DefaultGuildArgs {
    /// Ingame guild name; absent clears the default.
    #[validate(length(min = 3, max = 60))]
    pub guild: Option<String>,
}

pub async fn default_guild(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let args: DefaultGuildArgs = inv.args()?;
    let Some(name) = args.guild else {
        ServerRepo::set_default_guild(&state.pool, server_id, None).await?;
        return Ok(Reply::text("Default guild cleared."));
    };
    let guild_id = guild_id_by_name(state, &name).await?;
    ServerRepo::set_default_guild(&state.pool, server_id, Some(&guild_id)).await?;
    Ok(Reply::text(format!("Default guild set to {}.", name.trim())))
}

pub async fn force_names(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let args: ToggleArgs = inv.args()?;
    ServerRepo::set_force_account_names(&state.pool, server_id, args.enabled).await?;
    let text = if args.enabled {
        "Members with a stored key will have their account name as nickname."
    } else {
        "Account names are no longer forced."
    };
    Ok(Reply::text(text))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct KeyRoleArgs {
    /// Absent disables the role.
    pub role_id: Option<Snowflake>,
}

pub async fn key_role(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let server_id = inv.server()?;
    let args: KeyRoleArgs = inv.args()?;
    ServerRepo::set_key_role(&state.pool, server_id, args.role_id).await?;
    let text = match args.role_id {
        Some(role) => format!("Members with an API key will get <@&{role}>."),
        None => "API key role disabled.".to_string(),
    };
    Ok(Reply::text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_server_notifier_command_maps_to_a_kind() {
        assert_eq!(notifier_kind(Command::ServerUpdates), Some(NotifierKind::Updates));
        assert_eq!(notifier_kind(Command::ServerBosses), Some(NotifierKind::Bosses));
        assert_eq!(notifier_kind(Command::ServerTimezone), None);
    }

    #[test]
    fn timezone_range_is_enforced() {
        assert!(TimezoneArgs { offset: 14 }.validate().is_ok());
        assert!(TimezoneArgs { offset: -12 }.validate().is_ok());
        assert!(TimezoneArgs { offset: 15 }.validate().is_err());
        assert!(TimezoneArgs { offset: -13 }.validate().is_err());
    }
}
