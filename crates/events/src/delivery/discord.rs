//! Chat-platform REST client.
//!
//! [`DiscordRest`] implements [`ChatPlatform`] over the platform's HTTP
//! API. Presence belongs to the realtime session, which the chat adapter
//! owns; this client only records the requested presence.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tyria_core::card::MessageCard;
use tyria_core::types::Snowflake;

use crate::chat::{ChatError, ChatPlatform, Member, OutgoingMessage};

/// HTTP request timeout for a single call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Members fetched per page.
const MEMBER_PAGE: usize = 1000;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub api_base: String,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Deserialize)]
struct WireMember {
    user: WireUser,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

fn parse_id(raw: &str) -> Result<Snowflake, ChatError> {
    raw.parse()
        .map_err(|_| ChatError::Decode(format!("invalid snowflake {raw:?}")))
}

impl WireMember {
    fn into_member(self) -> Result<Member, ChatError> {
        let display_name = self
            .nick
            .or(self.user.global_name)
            .unwrap_or_else(|| self.user.username.clone());
        Ok(Member {
            user_id: parse_id(&self.user.id)?,
            display_name,
            roles: self
                .roles
                .iter()
                .map(|r| parse_id(r))
                .collect::<Result<_, _>>()?,
            bot: self.user.bot,
        })
    }
}

/// Platform embed for a card.
pub fn embed(card: &MessageCard) -> Value {
    let mut embed = json!({
        "title": card.title,
        "color": card.color,
    });
    if let Some(description) = &card.description {
        embed["description"] = json!(description);
    }
    if let Some(url) = &card.url {
        embed["url"] = json!(url);
    }
    if let Some(thumbnail) = &card.thumbnail {
        embed["thumbnail"] = json!({ "url": thumbnail });
    }
    if let Some(author) = &card.author {
        embed["author"] = json!({ "name": author.name, "icon_url": author.icon_url });
    }
    if let Some(footer) = &card.footer {
        embed["footer"] = json!({ "text": footer });
    }
    if let Some(ts) = &card.timestamp {
        embed["timestamp"] = json!(ts.to_rfc3339());
    }
    if !card.fields.is_empty() {
        embed["fields"] = card
            .fields
            .iter()
            .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.inline }))
            .collect();
    }
    embed
}

/// Request body for posting or editing a message.
pub fn message_body(message: &OutgoingMessage) -> Value {
    let parse: Vec<&str> = if message.mention_here {
        vec!["everyone"]
    } else {
        Vec::new()
    };
    json!({
        "content": message.content.clone().unwrap_or_default(),
        "embeds": message.card.iter().map(embed).collect::<Vec<_>>(),
        "allowed_mentions": { "parse": parse },
    })
}

// ---------------------------------------------------------------------------
// DiscordRest
// ---------------------------------------------------------------------------

pub struct DiscordRest {
    client: reqwest::Client,
    config: DiscordConfig,
    presence: Mutex<Option<String>>,
}

impl DiscordRest {
    pub fn new(config: DiscordConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            config,
            presence: Mutex::new(None),
        })
    }

    /// The presence most recently requested.
    pub fn presence(&self) -> Option<String> {
        self.presence.lock().ok().and_then(|p| p.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Execute one request and return the JSON body (`Null` for 204).
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ChatError> {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bot {}", self.config.token));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        match status {
            StatusCode::NO_CONTENT => Ok(Value::Null),
            StatusCode::FORBIDDEN => Err(ChatError::Forbidden),
            StatusCode::NOT_FOUND => Err(ChatError::NotFound),
            s if s.is_success() => {
                let text = response.text().await?;
                if text.is_empty() {
                    Ok(Value::Null)
                } else {
                    serde_json::from_str(&text).map_err(|e| ChatError::Decode(e.to_string()))
                }
            }
            s => Err(ChatError::HttpStatus {
                status: s.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ChatError> {
        serde_json::from_value(value).map_err(|e| ChatError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatPlatform for DiscordRest {
    async fn send_message(
        &self,
        channel_id: Snowflake,
        message: &OutgoingMessage,
    ) -> Result<Snowflake, ChatError> {
        let body = message_body(message);
        let created: IdOnly = Self::decode(
            self.request(Method::POST, &format!("channels/{channel_id}/messages"), Some(&body))
                .await?,
        )?;
        parse_id(&created.id)
    }

    async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        message: &OutgoingMessage,
    ) -> Result<(), ChatError> {
        let body = message_body(message);
        self.request(
            Method::PATCH,
            &format!("channels/{channel_id}/messages/{message_id}"),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn send_direct(&self, user_id: Snowflake, message: &OutgoingMessage) -> Result<(), ChatError> {
        let dm: IdOnly = Self::decode(
            self.request(
                Method::POST,
                "users/@me/channels",
                Some(&json!({ "recipient_id": user_id.to_string() })),
            )
            .await?,
        )?;
        self.send_message(parse_id(&dm.id)?, message).await?;
        Ok(())
    }

    async fn list_members(&self, server_id: Snowflake) -> Result<Vec<Member>, ChatError> {
        let mut members = Vec::new();
        let mut after: Snowflake = 0;
        loop {
            let page: Vec<WireMember> = Self::decode(
                self.request(
                    Method::GET,
                    &format!("guilds/{server_id}/members?limit={MEMBER_PAGE}&after={after}"),
                    None,
                )
                .await?,
            )?;
            let full = page.len() == MEMBER_PAGE;
            for wire in page {
                let member = wire.into_member()?;
                after = after.max(member.user_id);
                members.push(member);
            }
            if !full {
                return Ok(members);
            }
        }
    }

    async fn create_role(&self, server_id: Snowflake, name: &str, color: u32) -> Result<Snowflake, ChatError> {
        let role: IdOnly = Self::decode(
            self.request(
                Method::POST,
                &format!("guilds/{server_id}/roles"),
                Some(&json!({ "name": name, "color": color, "mentionable": false })),
            )
            .await?,
        )?;
        parse_id(&role.id)
    }

    async fn delete_role(&self, server_id: Snowflake, role_id: Snowflake) -> Result<(), ChatError> {
        self.request(Method::DELETE, &format!("guilds/{server_id}/roles/{role_id}"), None)
            .await?;
        Ok(())
    }

    async fn add_role(&self, server_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> Result<(), ChatError> {
        self.request(
            Method::PUT,
            &format!("guilds/{server_id}/members/{user_id}/roles/{role_id}"),
            None,
        )
        .await?;
        Ok(())
    }

    async fn remove_role(&self, server_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> Result<(), ChatError> {
        self.request(
            Method::DELETE,
            &format!("guilds/{server_id}/members/{user_id}/roles/{role_id}"),
            None,
        )
        .await?;
        Ok(())
    }

    async fn set_nickname(&self, server_id: Snowflake, user_id: Snowflake, nickname: &str) -> Result<(), ChatError> {
        self.request(
            Method::PATCH,
            &format!("guilds/{server_id}/members/{user_id}"),
            Some(&json!({ "nick": nickname })),
        )
        .await?;
        Ok(())
    }

    async fn set_presence(&self, status: &str) -> Result<(), ChatError> {
        tracing::debug!(status, "Presence requested");
        if let Ok(mut presence) = self.presence.lock() {
            *presence = Some(status.to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use tyria_core::card::ACCENT_COLOR;

    use super::*;

    #[test]
    fn embed_carries_card_fields() {
        let card = MessageCard::new("Dailies")
            .description("Today")
            .footer("Resets at 00:00 UTC")
            .field("PvE", "Daily Forger", false);
        let e = embed(&card);
        assert_eq!(e["title"], "Dailies");
        assert_eq!(e["color"], ACCENT_COLOR);
        assert_eq!(e["footer"]["text"], "Resets at 00:00 UTC");
        assert_eq!(e["fields"][0]["name"], "PvE");
        assert!(e.get("thumbnail").is_none());
    }

    #[test]
    fn here_mention_allows_everyone_parse() {
        let body = message_body(&OutgoingMessage::text("x").with_here_mention());
        assert_eq!(body["allowed_mentions"]["parse"][0], "everyone");
        let body = message_body(&OutgoingMessage::text("x"));
        assert!(body["allowed_mentions"]["parse"].as_array().unwrap().is_empty());
    }

    #[test]
    fn member_display_name_prefers_nick() {
        let wire: WireMember = serde_json::from_value(json!({
            "user": { "id": "42", "username": "raw", "global_name": "Global" },
            "nick": "Nick",
            "roles": ["7", "8"]
        }))
        .unwrap();
        let member = wire.into_member().unwrap();
        assert_eq!(member.display_name, "Nick");
        assert_eq!(member.roles, vec![7, 8]);
        assert!(!member.bot);
    }

    async fn spawn_platform() -> DiscordRest {
        let app = Router::new()
            .route(
                "/channels/{id}/messages",
                post(|Path(id): Path<String>| async move {
                    if id == "403" {
                        (AxumStatus::FORBIDDEN, Json(json!({ "message": "Missing Access" })))
                    } else {
                        (AxumStatus::OK, Json(json!({ "id": "9001" })))
                    }
                }),
            )
            .route(
                "/guilds/{id}/members",
                get(|| async {
                    Json(json!([
                        { "user": { "id": "1", "username": "a" }, "roles": [] },
                        { "user": { "id": "2", "username": "b", "bot": true }, "roles": ["5"] }
                    ]))
                }),
            )
            .route(
                "/guilds/{g}/roles/{r}",
                delete(|| async { AxumStatus::NO_CONTENT }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        DiscordRest::new(DiscordConfig {
            api_base: format!("http://{addr}"),
            token: "t".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn send_returns_message_id() {
        let chat = spawn_platform().await;
        let id = chat
            .send_message(10, &OutgoingMessage::text("hello"))
            .await
            .unwrap();
        assert_eq!(id, 9001);
    }

    #[tokio::test]
    async fn forbidden_is_classified() {
        let chat = spawn_platform().await;
        assert_matches!(
            chat.send_message(403, &OutgoingMessage::text("x")).await,
            Err(ChatError::Forbidden)
        );
    }

    #[tokio::test]
    async fn lists_members_single_page() {
        let chat = spawn_platform().await;
        let members = chat.list_members(1).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members[1].bot);
    }

    #[tokio::test]
    async fn no_content_is_success() {
        let chat = spawn_platform().await;
        chat.delete_role(1, 2).await.unwrap();
    }

    #[tokio::test]
    async fn presence_is_recorded() {
        let chat = spawn_platform().await;
        chat.set_presence("Rebuilding").await.unwrap();
        assert_eq!(chat.presence().as_deref(), Some("Rebuilding"));
    }
}
