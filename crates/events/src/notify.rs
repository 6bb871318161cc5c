//! Broadcast of notifier cards to subscribed servers.
//!
//! Delivery failures (missing permissions, deleted channels) are logged and
//! swallowed per server so one broken server never blocks the others.

use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tyria_core::card::MessageCard;
use tyria_db::models::server::{NotifierKind, NotifierTarget};
use tyria_db::repositories::ServerRepo;

use crate::chat::{ChatPlatform, OutgoingMessage};

/// How a broadcast went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Compose the message a notifier kind sends. Only game updates ping.
pub fn compose(kind: NotifierKind, card: MessageCard) -> OutgoingMessage {
    let message = OutgoingMessage::card(card);
    match kind {
        NotifierKind::Updates => message.with_here_mention(),
        _ => message,
    }
}

/// Send `message` to every target.
pub async fn dispatch(
    chat: &dyn ChatPlatform,
    kind: NotifierKind,
    targets: &[NotifierTarget],
    message: &OutgoingMessage,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    for target in targets {
        match chat.send_message(target.channel_id, message).await {
            Ok(_) => summary.delivered += 1,
            Err(e) => {
                tracing::warn!(
                    server_id = target.server_id,
                    channel_id = target.channel_id,
                    notifier = kind.label(),
                    error = %e,
                    "Notification delivery failed"
                );
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Looks up subscribers and dispatches to them.
#[derive(Clone)]
pub struct Notifier {
    pool: PgPool,
    chat: Arc<dyn ChatPlatform>,
}

impl Notifier {
    pub fn new(pool: PgPool, chat: Arc<dyn ChatPlatform>) -> Self {
        Self { pool, chat }
    }

    pub fn chat(&self) -> &Arc<dyn ChatPlatform> {
        &self.chat
    }

    /// Broadcast a card to every server with `kind` enabled.
    pub async fn broadcast(
        &self,
        kind: NotifierKind,
        card: MessageCard,
    ) -> Result<DispatchSummary, sqlx::Error> {
        let targets = ServerRepo::notifier_targets(&self.pool, kind).await?;
        let message = compose(kind, card);
        let summary = dispatch(self.chat.as_ref(), kind, &targets, &message).await;
        tracing::info!(
            notifier = kind.label(),
            delivered = summary.delivered,
            failed = summary.failed,
            "Notification broadcast"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tyria_core::types::Snowflake;

    use super::*;
    use crate::chat::{ChatError, Member};

    /// Records posts; channel 13 always refuses.
    #[derive(Default)]
    struct RecordingChat {
        posts: Mutex<Vec<(Snowflake, OutgoingMessage)>>,
    }

    #[async_trait]
    impl ChatPlatform for RecordingChat {
        async fn send_message(&self, channel_id: Snowflake, message: &OutgoingMessage) -> Result<Snowflake, ChatError> {
            if channel_id == 13 {
                return Err(ChatError::Forbidden);
            }
            self.posts.lock().unwrap().push((channel_id, message.clone()));
            Ok(1)
        }
        async fn edit_message(&self, _: Snowflake, _: Snowflake, _: &OutgoingMessage) -> Result<(), ChatError> {
            Ok(())
        }
        async fn send_direct(&self, _: Snowflake, _: &OutgoingMessage) -> Result<(), ChatError> {
            Ok(())
        }
        async fn list_members(&self, _: Snowflake) -> Result<Vec<Member>, ChatError> {
            Ok(Vec::new())
        }
        async fn create_role(&self, _: Snowflake, _: &str, _: u32) -> Result<Snowflake, ChatError> {
            Ok(1)
        }
        async fn delete_role(&self, _: Snowflake, _: Snowflake) -> Result<(), ChatError> {
            Ok(())
        }
        async fn add_role(&self, _: Snowflake, _: Snowflake, _: Snowflake) -> Result<(), ChatError> {
            Ok(())
        }
        async fn remove_role(&self, _: Snowflake, _: Snowflake, _: Snowflake) -> Result<(), ChatError> {
            Ok(())
        }
        async fn set_nickname(&self, _: Snowflake, _: Snowflake, _: &str) -> Result<(), ChatError> {
            Ok(())
        }
        async fn set_presence(&self, _: &str) -> Result<(), ChatError> {
            Ok(())
        }
    }

    fn targets(channels: &[Snowflake]) -> Vec<NotifierTarget> {
        channels
            .iter()
            .enumerate()
            .map(|(i, &channel_id)| NotifierTarget {
                server_id: i as Snowflake,
                channel_id,
            })
            .collect()
    }

    #[tokio::test]
    async fn failure_on_one_server_does_not_stop_others() {
        let chat = RecordingChat::default();
        let message = compose(NotifierKind::News, MessageCard::new("News"));
        let summary = dispatch(&chat, NotifierKind::News, &targets(&[11, 13, 12]), &message).await;

        assert_eq!(summary, DispatchSummary { delivered: 2, failed: 1 });
        let posts = chat.posts.lock().unwrap();
        assert_eq!(posts.iter().map(|(c, _)| *c).collect::<Vec<_>>(), vec![11, 12]);
    }

    #[test]
    fn only_updates_mention_here() {
        assert!(compose(NotifierKind::Updates, MessageCard::new("b")).mention_here);
        assert!(!compose(NotifierKind::Daily, MessageCard::new("d")).mention_here);
        assert!(!compose(NotifierKind::News, MessageCard::new("n")).mention_here);
    }
}
