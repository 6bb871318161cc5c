//! The chat-platform port.

use async_trait::async_trait;
use serde::Serialize;
use tyria_core::card::MessageCard;
use tyria_core::types::Snowflake;

/// Failure of a chat-platform side effect.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The bot lacks the permission for this action (HTTP 403).
    #[error("missing chat permission")]
    Forbidden,

    /// The channel, message, member or role no longer exists.
    #[error("chat resource not found")]
    NotFound,

    #[error("chat platform returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected chat response: {0}")]
    Decode(String),
}

impl ChatError {
    /// Permission and missing-resource failures are expected in the field
    /// and are skipped quietly by synchronizers.
    pub fn is_expected(&self) -> bool {
        matches!(self, ChatError::Forbidden | ChatError::NotFound)
    }
}

/// A message to post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub card: Option<MessageCard>,
    /// Ping everyone currently online in the channel.
    pub mention_here: bool,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            card: None,
            mention_here: false,
        }
    }

    pub fn card(card: MessageCard) -> Self {
        Self {
            content: None,
            card: Some(card),
            mention_here: false,
        }
    }

    pub fn with_here_mention(mut self) -> Self {
        self.mention_here = true;
        let content = self.content.take().unwrap_or_default();
        self.content = Some(format!("@here {content}").trim_end().to_string());
        self
    }
}

/// A server member as seen by the synchronizers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: Snowflake,
    /// Nickname if set, otherwise the user's display name.
    pub display_name: String,
    pub roles: Vec<Snowflake>,
    pub bot: bool,
}

impl Member {
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.roles.contains(&role_id)
    }
}

/// Everything the service does to the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Post a message and return its id.
    async fn send_message(
        &self,
        channel_id: Snowflake,
        message: &OutgoingMessage,
    ) -> Result<Snowflake, ChatError>;

    async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        message: &OutgoingMessage,
    ) -> Result<(), ChatError>;

    async fn send_direct(&self, user_id: Snowflake, message: &OutgoingMessage) -> Result<(), ChatError>;

    async fn list_members(&self, server_id: Snowflake) -> Result<Vec<Member>, ChatError>;

    async fn create_role(&self, server_id: Snowflake, name: &str, color: u32) -> Result<Snowflake, ChatError>;

    async fn delete_role(&self, server_id: Snowflake, role_id: Snowflake) -> Result<(), ChatError>;

    async fn add_role(&self, server_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> Result<(), ChatError>;

    async fn remove_role(&self, server_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> Result<(), ChatError>;

    async fn set_nickname(&self, server_id: Snowflake, user_id: Snowflake, nickname: &str) -> Result<(), ChatError>;

    /// Update the bot's presence text.
    async fn set_presence(&self, status: &str) -> Result<(), ChatError>;
}
