//! Grants world and ally roles from each member's home world.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tyria_core::account::Account;
use tyria_core::credentials::KeyRing;
use tyria_core::error::ApiError;
use tyria_core::permissions::Permission;
use tyria_core::types::GameId;
use tyria_core::worldsync::{plan, Matchup, Placement};
use tyria_db::models::server::WorldSyncSettings;
use tyria_db::repositories::ServerRepo;
use tyria_gateway::{Auth, Gateway};

use super::{log_chat_failure, members_with_keys};
use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::Synchronizer;

/// Home worlds of every account on the ring, with `cache` keyed by token
/// and shared across servers.
///
/// Only definite answers are cached. A credential that is rejected or
/// lacks the account permission contributes no world; any other failure
/// is returned so the caller leaves the member's roles alone.
async fn worlds_of(
    gateway: &Gateway,
    ring: &KeyRing,
    cache: &mut HashMap<String, Option<GameId>>,
) -> Result<Vec<GameId>, ApiError> {
    let mut worlds = Vec::new();
    for credential in ring.keys() {
        let world = match cache.get(&credential.token) {
            Some(cached) => *cached,
            None => {
                let fetched = gateway
                    .call::<Account>("account", Auth::Bound(credential), &[Permission::Account], None)
                    .await;
                let world = match fetched {
                    Ok(account) => Some(account.world),
                    Err(e @ (ApiError::InvalidKey | ApiError::MissingPermissions(_) | ApiError::NoCredential)) => {
                        tracing::debug!(account = %credential.account_name, error = %e, "Credential has no world");
                        None
                    }
                    Err(e) => return Err(e),
                };
                cache.insert(credential.token.clone(), world);
                world
            }
        };
        if let Some(world) = world {
            worlds.push(world);
        }
    }
    Ok(worlds)
}

pub struct WorldSync {
    ctx: WorkerContext,
}

impl WorldSync {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    async fn sync_server(
        &self,
        settings: &WorldSyncSettings,
        cache: &mut HashMap<String, Option<GameId>>,
    ) -> Result<(), WorkerError> {
        let server_id = settings.server_id;
        let home = settings.world_id;
        let matchup: Matchup = self.ctx.gateway.get(&format!("wvw/matches?world={home}")).await?;
        let linked = matchup.linked_worlds(home);

        let (members, rings) = members_with_keys(&self.ctx, server_id).await?;
        let mut edited = 0usize;
        for member in &members {
            let placement = match rings.get(&member.user_id) {
                Some(ring) => match worlds_of(&self.ctx.gateway, ring, cache).await {
                    Ok(worlds) => Placement::from_worlds(&worlds, home, &linked),
                    Err(e @ (ApiError::Inactive | ApiError::RateLimited)) => return Err(e.into()),
                    Err(e) => {
                        tracing::warn!(server_id, user_id = member.user_id, error = %e, "World lookup failed, member skipped");
                        continue;
                    }
                },
                None => Placement::default(),
            };
            let edits = plan(&member.roles, settings.roles, placement);
            if edits.is_noop() {
                continue;
            }
            for role in &edits.remove {
                if let Err(e) = self.ctx.chat.remove_role(server_id, member.user_id, *role).await {
                    log_chat_failure(self.name(), server_id, member.user_id, &e);
                }
            }
            for role in &edits.add {
                if let Err(e) = self.ctx.chat.add_role(server_id, member.user_id, *role).await {
                    log_chat_failure(self.name(), server_id, member.user_id, &e);
                }
            }
            edited += 1;
        }
        tracing::info!(server_id, world = home, linked = linked.len(), edited, "World sync complete");
        Ok(())
    }
}

#[async_trait]
impl Synchronizer for WorldSync {
    fn name(&self) -> &'static str {
        "worldsync"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(300)
    }

    async fn run_once(&self, cancel: &CancellationToken) -> Result<(), WorkerError> {
        let servers = ServerRepo::with_worldsync(&self.ctx.pool).await?;
        let mut cache = HashMap::new();
        for settings in servers.iter().filter_map(|s| s.worldsync()) {
            if cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.sync_server(&settings, &mut cache).await {
                tracing::warn!(server_id = settings.server_id, error = %e, "World sync failed");
            }
        }
        Ok(())
    }
}
