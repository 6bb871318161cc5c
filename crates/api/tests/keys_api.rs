//! `key add` against Postgres and an in-process publisher API.

mod common;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use common::{body_json, build_test_app, post_json, spawn_upstream, state_with};
use serde_json::json;
use sqlx::PgPool;
use tyria_db::repositories::UserRepo;

const COMMANDS: &str = "/api/v1/commands";
const GOOD_KEY: &str = "01234567-89AB-CDEF-0123-456789ABCDEF01234567-89AB-CDEF-0123-456789ABCDEF";
const REVOKED_KEY: &str = "FEDCBA98-7654-3210-FEDC-BA9876543210FEDCBA98-7654-3210-FEDC-BA9876543210";

fn revoked(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.ends_with(REVOKED_KEY))
}

fn invalid_key() -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "text": "invalid key" }))).into_response()
}

async fn tokeninfo(headers: HeaderMap) -> Response {
    if revoked(&headers) {
        return invalid_key();
    }
    Json(json!({
        "id": "01234567-89AB-CDEF-0123-456789ABCDEF",
        "name": "raid key",
        "permissions": ["account", "characters", "progression"]
    }))
    .into_response()
}

async fn account(headers: HeaderMap) -> Response {
    if revoked(&headers) {
        return invalid_key();
    }
    Json(json!({ "id": "acct-1", "name": "Someone.1234", "world": 1001 })).into_response()
}

fn upstream() -> Router {
    Router::new()
        .route("/v2/tokeninfo", get(tokeninfo))
        .route("/v2/account", get(account))
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn adding_a_key_lists_missing_permissions(pool: PgPool) {
    let gateway = spawn_upstream(upstream()).await;
    let app = build_test_app(state_with(pool.clone(), gateway));

    let response = post_json(
        app,
        COMMANDS,
        json!({"command": "key add", "user_id": 7, "args": {"token": GOOD_KEY}}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let card = &json["data"]["card"];
    assert_eq!(card["title"], "Key added");
    let fields = card["fields"].as_array().unwrap();
    let missing = fields
        .iter()
        .find(|f| f["name"] == "Missing permissions")
        .expect("missing permissions field");
    let missing = missing["value"].as_str().unwrap();
    assert!(missing.contains("wallet") && missing.contains("guilds"), "{missing}");
    assert!(!missing.contains("characters"), "{missing}");

    let ring = UserRepo::key_ring(&pool, 7).await.unwrap();
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.active().unwrap().account_name, "Someone.1234");
    assert_eq!(ring.active().unwrap().label, "raid key");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn key_rejected_upstream_leaves_the_ring_unchanged(pool: PgPool) {
    let gateway = spawn_upstream(upstream()).await;
    let app = build_test_app(state_with(pool.clone(), gateway));

    let response = post_json(
        app,
        COMMANDS,
        json!({"command": "key add", "user_id": 8, "args": {"token": REVOKED_KEY}}),
    )
    .await;

    assert_eq!(body_json(response).await["data"]["text"], "The key is invalid.");
    assert!(UserRepo::key_ring(&pool, 8).await.unwrap().is_empty());
}
