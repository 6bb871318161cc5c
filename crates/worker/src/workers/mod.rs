//! One module per synchronizer.

use std::collections::HashMap;

use tyria_core::credentials::KeyRing;
use tyria_core::types::Snowflake;
use tyria_db::repositories::UserRepo;
use tyria_events::{ChatError, Member};

use crate::context::WorkerContext;
use crate::error::WorkerError;

pub mod boss_notifier;
pub mod build_watcher;
pub mod daily_reset;
pub mod gem_tracker;
pub mod guildsync;
pub mod key_role;
pub mod news;
pub mod nicknames;
pub mod population;
pub mod worldsync;

/// Human members of a server together with the key rings of those who
/// stored at least one credential.
pub(crate) async fn members_with_keys(
    ctx: &WorkerContext,
    server_id: Snowflake,
) -> Result<(Vec<Member>, HashMap<Snowflake, KeyRing>), WorkerError> {
    let members: Vec<Member> = ctx
        .chat
        .list_members(server_id)
        .await?
        .into_iter()
        .filter(|m| !m.bot)
        .collect();
    let ids: Vec<Snowflake> = members.iter().map(|m| m.user_id).collect();
    let rings = UserRepo::key_rings_for(&ctx.pool, &ids)
        .await?
        .into_iter()
        .map(|u| (u.user_id, u.ring))
        .collect();
    Ok((members, rings))
}

/// Log a failed chat edit. Permission and missing-resource failures are
/// routine and only logged at debug.
pub(crate) fn log_chat_failure(
    worker: &'static str,
    server_id: Snowflake,
    user_id: Snowflake,
    error: &ChatError,
) {
    if error.is_expected() {
        tracing::debug!(worker, server_id, user_id, error = %error, "Chat edit skipped");
    } else {
        tracing::warn!(worker, server_id, user_id, error = %error, "Chat edit failed");
    }
}
