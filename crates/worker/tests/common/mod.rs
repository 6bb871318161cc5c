use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use sqlx::PgPool;
use tyria_core::catalog::Catalog;
use tyria_core::credentials::Credential;
use tyria_core::error::ApiError;
use tyria_core::permissions::Permission;
use tyria_core::types::{GameId, Snowflake};
use tyria_db::models::reference::NewReferenceEntry;
use tyria_db::repositories::UserRepo;
use tyria_events::{ChatError, ChatPlatform, Member, OutgoingMessage};
use tyria_gateway::{Gateway, GatewayConfig, RetryPolicy};
use tyria_pipeline::{CatalogSink, CatalogSource, Rebuilder, ServiceStatus};
use tyria_worker::{WorkerConfig, WorkerContext};

/// Serve `router` on an ephemeral port and return a gateway pointed at it.
/// The publisher API lives under `/v2/` and the news feed at `/feed`.
pub async fn spawn_upstream(router: Router) -> Gateway {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Gateway::new(GatewayConfig {
        base_url: format!("http://{addr}/v2/"),
        news_feed_url: format!("http://{addr}/feed"),
        retry: RetryPolicy::none(),
        ..GatewayConfig::default()
    })
    .unwrap()
}

/// One call made against [`FakeChat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    Send { channel_id: Snowflake },
    CreateRole { name: String, role_id: Snowflake },
    DeleteRole { role_id: Snowflake },
    AddRole { user_id: Snowflake, role_id: Snowflake },
    RemoveRole { user_id: Snowflake, role_id: Snowflake },
}

/// In-memory chat server. Role edits are applied to the member list so a
/// second pass sees the outcome of the first.
#[derive(Default)]
pub struct FakeChat {
    members: Mutex<Vec<Member>>,
    calls: Mutex<Vec<ChatCall>>,
    next_role: AtomicUsize,
}

impl FakeChat {
    pub fn with_members(members: Vec<Member>) -> Self {
        Self {
            members: Mutex::new(members),
            calls: Mutex::new(Vec::new()),
            next_role: AtomicUsize::new(1000),
        }
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<ChatCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub fn roles_of(&self, user_id: Snowflake) -> Vec<Snowflake> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.roles.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: ChatCall) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn member(user_id: Snowflake, roles: &[Snowflake]) -> Member {
    Member {
        user_id,
        display_name: format!("user{user_id}"),
        roles: roles.to_vec(),
        bot: false,
    }
}

#[async_trait]
impl ChatPlatform for FakeChat {
    async fn send_message(&self, channel_id: Snowflake, _message: &OutgoingMessage) -> Result<Snowflake, ChatError> {
        self.record(ChatCall::Send { channel_id });
        Ok(1)
    }

    async fn edit_message(&self, _: Snowflake, _: Snowflake, _: &OutgoingMessage) -> Result<(), ChatError> {
        Ok(())
    }

    async fn send_direct(&self, _: Snowflake, _: &OutgoingMessage) -> Result<(), ChatError> {
        Ok(())
    }

    async fn list_members(&self, _server_id: Snowflake) -> Result<Vec<Member>, ChatError> {
        Ok(self.members.lock().unwrap().clone())
    }

    async fn create_role(&self, _server_id: Snowflake, name: &str, _color: u32) -> Result<Snowflake, ChatError> {
        let role_id = self.next_role.fetch_add(1, Ordering::SeqCst) as Snowflake;
        self.record(ChatCall::CreateRole {
            name: name.to_string(),
            role_id,
        });
        Ok(role_id)
    }

    async fn delete_role(&self, _server_id: Snowflake, role_id: Snowflake) -> Result<(), ChatError> {
        self.record(ChatCall::DeleteRole { role_id });
        Ok(())
    }

    async fn add_role(&self, _server_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> Result<(), ChatError> {
        self.record(ChatCall::AddRole { user_id, role_id });
        let mut members = self.members.lock().unwrap();
        if let Some(m) = members.iter_mut().find(|m| m.user_id == user_id) {
            m.roles.push(role_id);
        }
        Ok(())
    }

    async fn remove_role(&self, _server_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> Result<(), ChatError> {
        self.record(ChatCall::RemoveRole { user_id, role_id });
        let mut members = self.members.lock().unwrap();
        if let Some(m) = members.iter_mut().find(|m| m.user_id == user_id) {
            m.roles.retain(|r| *r != role_id);
        }
        Ok(())
    }

    async fn set_nickname(&self, _: Snowflake, _: Snowflake, _: &str) -> Result<(), ChatError> {
        Ok(())
    }

    async fn set_presence(&self, _: &str) -> Result<(), ChatError> {
        Ok(())
    }
}

/// Empty catalogs; counts how many rebuild passes ran.
#[derive(Default)]
pub struct CountingSource {
    passes: AtomicUsize,
}

impl CountingSource {
    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for CountingSource {
    async fn fetch_all(&self, _endpoint: &str) -> Result<Vec<Value>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_index(&self, _endpoint: &str) -> Result<Vec<GameId>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_block(&self, _endpoint: &str, _ids: &[GameId]) -> Result<Vec<Value>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_raid_index(&self) -> Result<Vec<String>, ApiError> {
        self.passes.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn fetch_raid(&self, _id: &str) -> Result<Value, ApiError> {
        Ok(Value::Null)
    }
}

pub struct NullSink;

#[async_trait]
impl CatalogSink for NullSink {
    async fn reset(&self, _catalog: Catalog) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn insert(&self, _catalog: Catalog, entries: &[NewReferenceEntry]) -> Result<u64, sqlx::Error> {
        Ok(entries.len() as u64)
    }

    async fn finalize(&self, _catalog: Catalog) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn replace_raids(&self, _raids: &[(String, Value)]) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

/// Worker context over a real pool, a fake chat and a counting rebuilder.
pub fn context(pool: PgPool, gateway: Gateway, chat: Arc<FakeChat>, source: Arc<CountingSource>) -> WorkerContext {
    let rebuilder = Arc::new(Rebuilder::new(source, Arc::new(NullSink), ServiceStatus::new()));
    let config = WorkerConfig {
        daily_reset_delay: Duration::ZERO,
        guildsync_server_pause: Duration::ZERO,
        guildsync_member_pause: Duration::ZERO,
    };
    WorkerContext::new(pool, gateway, chat, rebuilder, config)
}

pub async fn store_key(pool: &PgPool, user_id: Snowflake, token: &str, account_name: &str) {
    let mut ring = UserRepo::key_ring(pool, user_id).await.unwrap();
    ring.add(Credential {
        token: token.to_string(),
        account_name: account_name.to_string(),
        label: String::new(),
        permissions: vec![Permission::Account, Permission::Guilds],
    })
    .unwrap();
    UserRepo::save_key_ring(pool, user_id, ring).await.unwrap();
}

