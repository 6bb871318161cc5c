//! Mirrors an ingame guild's ranks onto chat roles.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tyria_core::card::ACCENT_COLOR;
use tyria_core::error::ApiError;
use tyria_core::guildsync::{plan_member, plan_ranks, roster_entry, GuildMember, GuildRank, RankRoles};
use tyria_core::permissions::Permission;
use tyria_db::models::server::GuildSyncSettings;
use tyria_db::repositories::{ServerRepo, UserRepo};
use tyria_events::ChatError;
use tyria_gateway::Auth;

use super::{log_chat_failure, members_with_keys};
use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::{sleep_or_cancel, Synchronizer};

/// Status recorded when the leader's credential cannot read the guild.
pub const LEADER_KEY_UNUSABLE: &str = "The guild leader's API key is missing, invalid, \
     or lacks the guilds permission. Guild sync is paused until it is replaced.";

pub struct GuildSync {
    ctx: WorkerContext,
}

impl GuildSync {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    /// Reconcile one server. Returns `false` if cancelled midway.
    async fn sync_server(
        &self,
        settings: &GuildSyncSettings,
        cancel: &CancellationToken,
    ) -> Result<bool, WorkerError> {
        let pool = &self.ctx.pool;
        let server_id = settings.server_id;

        let Some((ranks, roster)) = self.fetch_guild(settings).await? else {
            return Ok(true);
        };

        let mapping = self.reconcile_ranks(settings, &ranks).await?;
        ServerRepo::set_guildsync_status(pool, server_id, None).await?;

        let (members, rings) = members_with_keys(&self.ctx, server_id).await?;
        let mut edited = 0usize;
        for member in &members {
            let Some(ring) = rings.get(&member.user_id) else {
                continue;
            };
            let accounts = ring.account_names();
            let desired = roster_entry(&accounts, &roster).map(|m| m.rank.as_str());
            let plan = plan_member(&member.roles, &mapping, desired);
            if plan.is_noop() {
                continue;
            }

            for role in &plan.remove {
                if let Err(e) = self.ctx.chat.remove_role(server_id, member.user_id, *role).await {
                    log_chat_failure(self.name(), server_id, member.user_id, &e);
                }
            }
            if let Some(role) = plan.add {
                if let Err(e) = self.ctx.chat.add_role(server_id, member.user_id, role).await {
                    log_chat_failure(self.name(), server_id, member.user_id, &e);
                }
            }
            edited += 1;
            if !sleep_or_cancel(self.ctx.config.guildsync_member_pause, cancel).await {
                return Ok(false);
            }
        }
        tracing::info!(server_id, members = members.len(), edited, "Guild sync complete");
        Ok(true)
    }

    /// Ranks and roster of the guild, read with the leader's credential.
    ///
    /// `None` when the credential is unusable; that is recorded on the
    /// server so admins can see why sync stopped.
    async fn fetch_guild(
        &self,
        settings: &GuildSyncSettings,
    ) -> Result<Option<(Vec<GuildRank>, Vec<GuildMember>)>, WorkerError> {
        let pool = &self.ctx.pool;
        let ring = UserRepo::key_ring(pool, settings.leader_user_id).await?;
        let required = [Permission::Guilds];
        let guild = &settings.guild_id;

        let fetched = async {
            let credential = ring.resolve(&required)?;
            let auth = Auth::Bound(credential);
            let ranks_endpoint = format!("guild/{guild}/ranks");
            let members_endpoint = format!("guild/{guild}/members");
            tokio::try_join!(
                self.ctx.gateway.call::<Vec<GuildRank>>(&ranks_endpoint, auth, &required, None),
                self.ctx.gateway.call::<Vec<GuildMember>>(&members_endpoint, auth, &required, None),
            )
        }
        .await;

        match fetched {
            Ok(pair) => Ok(Some(pair)),
            Err(
                e @ (ApiError::NoCredential
                | ApiError::MissingPermissions(_)
                | ApiError::InvalidKey
                | ApiError::Forbidden(_)),
            ) => {
                tracing::warn!(
                    server_id = settings.server_id,
                    leader = settings.leader_user_id,
                    error = %e,
                    "Guild leader credential unusable"
                );
                ServerRepo::set_guildsync_status(pool, settings.server_id, Some(LEADER_KEY_UNUSABLE))
                    .await?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create and delete roles so every upstream rank has one. Returns the
    /// mapping now in effect.
    async fn reconcile_ranks(
        &self,
        settings: &GuildSyncSettings,
        ranks: &[GuildRank],
    ) -> Result<RankRoles, WorkerError> {
        let server_id = settings.server_id;
        let plan = plan_ranks(ranks, &settings.ranks);
        if plan.is_noop() {
            return Ok(settings.ranks.clone());
        }

        for (rank, role) in &plan.delete {
            match self.ctx.chat.delete_role(server_id, *role).await {
                Ok(()) | Err(ChatError::NotFound) => {
                    tracing::info!(server_id, rank = %rank, role, "Deleted role of removed rank")
                }
                Err(e) => tracing::warn!(server_id, rank = %rank, role, error = %e, "Could not delete rank role"),
            }
        }

        let mut created = Vec::with_capacity(plan.create.len());
        for rank in &plan.create {
            match self.ctx.chat.create_role(server_id, rank, ACCENT_COLOR).await {
                Ok(role) => created.push((rank.clone(), role)),
                Err(e) => tracing::warn!(server_id, rank = %rank, error = %e, "Could not create rank role"),
            }
        }

        let mapping = plan.into_mapping(created);
        ServerRepo::set_guildsync_ranks(&self.ctx.pool, server_id, &mapping).await?;
        Ok(mapping)
    }
}

#[async_trait]
impl Synchronizer for GuildSync {
    fn name(&self) -> &'static str {
        "guildsync"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(600)
    }

    async fn run_once(&self, cancel: &CancellationToken) -> Result<(), WorkerError> {
        let servers = ServerRepo::with_guildsync(&self.ctx.pool).await?;
        for (i, server) in servers.iter().enumerate() {
            let Some(settings) = server.guildsync() else {
                continue;
            };
            if i > 0 && !sleep_or_cancel(self.ctx.config.guildsync_server_pause, cancel).await {
                return Ok(());
            }
            match self.sync_server(&settings, cancel).await {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(e) => tracing::warn!(server_id = settings.server_id, error = %e, "Guild sync failed"),
            }
        }
        Ok(())
    }
}
