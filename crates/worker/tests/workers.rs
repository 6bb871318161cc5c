//! Synchronizer passes against Postgres, an in-process publisher API and
//! an in-memory chat server.

mod common;

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tyria_core::guildsync::RankRoles;
use tyria_core::worldsync::WorldRoles;
use tyria_db::models::server::NotifierKind;
use tyria_db::repositories::{ServerRepo, StateRepo};
use tyria_worker::workers::build_watcher::BuildWatcher;
use tyria_worker::workers::guildsync::{GuildSync, LEADER_KEY_UNUSABLE};
use tyria_worker::workers::news::NewsChecker;
use tyria_worker::workers::worldsync::WorldSync;
use tyria_worker::Synchronizer;

use common::{context, member, spawn_upstream, store_key, ChatCall, CountingSource, FakeChat};

// ---------------------------------------------------------------------------
// Build watcher
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn build_change_rebuilds_once_and_is_persisted(pool: PgPool) {
    StateRepo::set_last_build(&pool, 100).await.unwrap();
    ServerRepo::enable_notifier(&pool, 5, NotifierKind::Updates, 55)
        .await
        .unwrap();
    let gateway = spawn_upstream(Router::new().route(
        "/v2/build",
        get(|| async { Json(json!({ "id": 101 })) }),
    ))
    .await;
    let chat = Arc::new(FakeChat::with_members(Vec::new()));
    let source = Arc::new(CountingSource::default());
    let watcher = BuildWatcher::new(context(pool.clone(), gateway, chat.clone(), source.clone()));
    let cancel = CancellationToken::new();

    watcher.run_once(&cancel).await.unwrap();
    watcher.run_once(&cancel).await.unwrap();

    assert_eq!(source.passes(), 1);
    assert_eq!(StateRepo::last_build(&pool).await.unwrap(), Some(101));
    assert_eq!(chat.calls(), vec![ChatCall::Send { channel_id: 55 }]);
}

// ---------------------------------------------------------------------------
// Guild sync
// ---------------------------------------------------------------------------

const SERVER: i64 = 1;
const LEADER: i64 = 10;
const OFFICER: i64 = 11;

fn guild_upstream() -> Router {
    Router::new()
        .route(
            "/v2/guild/G1/ranks",
            get(|| async {
                Json(json!([
                    { "id": "Officer", "order": 2 },
                    { "id": "Leader", "order": 1 },
                ]))
            }),
        )
        .route(
            "/v2/guild/G1/members",
            get(|| async {
                Json(json!([
                    { "name": "Leader.1234", "rank": "Leader" },
                    { "name": "Officer.5678", "rank": "Officer" },
                ]))
            }),
        )
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn guildsync_converges_and_second_pass_changes_nothing(pool: PgPool) {
    ServerRepo::set_guildsync(&pool, SERVER, "G1", LEADER).await.unwrap();
    store_key(&pool, LEADER, "LEADER-KEY", "Leader.1234").await;
    store_key(&pool, OFFICER, "OFFICER-KEY", "Officer.5678").await;
    let gateway = spawn_upstream(guild_upstream()).await;
    let chat = Arc::new(FakeChat::with_members(vec![member(LEADER, &[]), member(OFFICER, &[])]));
    let sync = GuildSync::new(context(pool.clone(), gateway, chat.clone(), Arc::default()));
    let cancel = CancellationToken::new();

    sync.run_once(&cancel).await.unwrap();

    assert_eq!(
        chat.take_calls(),
        vec![
            ChatCall::CreateRole { name: "Leader".into(), role_id: 1000 },
            ChatCall::CreateRole { name: "Officer".into(), role_id: 1001 },
            ChatCall::AddRole { user_id: LEADER, role_id: 1000 },
            ChatCall::AddRole { user_id: OFFICER, role_id: 1001 },
        ]
    );
    let record = ServerRepo::find(&pool, SERVER).await.unwrap().unwrap();
    let expected: RankRoles = [("Leader".to_string(), 1000), ("Officer".to_string(), 1001)]
        .into_iter()
        .collect();
    assert_eq!(record.guildsync_ranks.0, expected);
    assert_eq!(record.guildsync_status, None);

    sync.run_once(&cancel).await.unwrap();

    assert!(chat.calls().is_empty());
    assert_eq!(chat.roles_of(OFFICER), vec![1001]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn guildsync_without_leader_key_records_status(pool: PgPool) {
    ServerRepo::set_guildsync(&pool, SERVER, "G1", LEADER).await.unwrap();
    let gateway = spawn_upstream(guild_upstream()).await;
    let chat = Arc::new(FakeChat::with_members(vec![member(OFFICER, &[])]));
    let sync = GuildSync::new(context(pool.clone(), gateway, chat.clone(), Arc::default()));

    sync.run_once(&CancellationToken::new()).await.unwrap();

    let record = ServerRepo::find(&pool, SERVER).await.unwrap().unwrap();
    assert_eq!(record.guildsync_status.as_deref(), Some(LEADER_KEY_UNUSABLE));
    assert!(chat.calls().is_empty());
}

// ---------------------------------------------------------------------------
// World sync
// ---------------------------------------------------------------------------

const WORLD_SERVER: i64 = 2;
const WORLD_ROLE: i64 = 7;
const ALLY_ROLE: i64 = 8;

async fn account(headers: HeaderMap) -> Response {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if bearer.ends_with("OUTAGE-KEY") {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "text": "API not active" }))).into_response();
    }
    Json(json!({ "id": "acct", "name": "Linked.1234", "world": 1002 })).into_response()
}

fn world_upstream() -> Router {
    Router::new()
        .route(
            "/v2/wvw/matches",
            get(|| async {
                Json(json!({
                    "all_worlds": { "red": [1001, 1002], "blue": [2001], "green": [3001] }
                }))
            }),
        )
        .route("/v2/account", get(account))
}

async fn configure_worldsync(pool: &PgPool) {
    let roles = WorldRoles {
        world_role: WORLD_ROLE,
        ally_role: ALLY_ROLE,
    };
    ServerRepo::set_worldsync(pool, WORLD_SERVER, 1001, roles).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn worldsync_keeps_roles_while_the_api_is_down(pool: PgPool) {
    configure_worldsync(&pool).await;
    store_key(&pool, 21, "OUTAGE-KEY", "Home.1234").await;
    let gateway = spawn_upstream(world_upstream()).await;
    let chat = Arc::new(FakeChat::with_members(vec![member(21, &[WORLD_ROLE])]));
    let sync = WorldSync::new(context(pool, gateway, chat.clone(), Arc::default()));

    sync.run_once(&CancellationToken::new()).await.unwrap();

    assert!(chat.calls().is_empty());
    assert_eq!(chat.roles_of(21), vec![WORLD_ROLE]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn worldsync_moves_linked_member_to_ally_role(pool: PgPool) {
    configure_worldsync(&pool).await;
    store_key(&pool, 22, "LINKED-KEY", "Linked.1234").await;
    let gateway = spawn_upstream(world_upstream()).await;
    let chat = Arc::new(FakeChat::with_members(vec![member(22, &[WORLD_ROLE])]));
    let sync = WorldSync::new(context(pool, gateway, chat.clone(), Arc::default()));

    sync.run_once(&CancellationToken::new()).await.unwrap();

    assert_eq!(chat.roles_of(22), vec![ALLY_ROLE]);
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <item><title>Fresh news</title><link>https://example.invalid/fresh</link></item>
  <item><title>Old news</title><link>https://example.invalid/old</link></item>
</channel></rss>"#;

#[sqlx::test(migrations = "../../db/migrations")]
async fn news_items_are_sent_once(pool: PgPool) {
    StateRepo::set_news_titles(&pool, &["Old news".to_string()]).await.unwrap();
    ServerRepo::enable_notifier(&pool, 3, NotifierKind::News, 33).await.unwrap();
    let gateway = spawn_upstream(Router::new().route("/feed", get(|| async { FEED }))).await;
    let chat = Arc::new(FakeChat::with_members(Vec::new()));
    let checker = NewsChecker::new(context(pool.clone(), gateway, chat.clone(), Arc::default()));
    let cancel = CancellationToken::new();

    checker.run_once(&cancel).await.unwrap();
    checker.run_once(&cancel).await.unwrap();

    assert_eq!(chat.calls(), vec![ChatCall::Send { channel_id: 33 }]);
    let remembered = StateRepo::news_titles(&pool).await.unwrap();
    assert!(remembered.contains(&"Fresh news".to_string()));
}
