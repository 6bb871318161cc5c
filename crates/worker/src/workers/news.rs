//! Posts new items of the publisher's news feed.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tyria_core::card::MessageCard;
use tyria_db::models::server::NotifierKind;
use tyria_db::repositories::StateRepo;
use tyria_gateway::FeedItem;

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::Synchronizer;

pub struct NewsChecker {
    ctx: WorkerContext,
}

impl NewsChecker {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }
}

/// Feed items whose titles are not remembered, oldest first.
pub fn novel_items<'a>(items: &'a [FeedItem], remembered: &[String]) -> Vec<&'a FeedItem> {
    items
        .iter()
        .rev()
        .filter(|item| !remembered.contains(&item.title))
        .collect()
}

pub fn news_card(item: &FeedItem) -> MessageCard {
    let mut card = MessageCard::new(&item.title).url(&item.link);
    if !item.description.is_empty() {
        card = card.description(&item.description);
    }
    if let Some(published) = &item.published {
        card = card.footer(published);
    }
    card
}

#[async_trait]
impl Synchronizer for NewsChecker {
    fn name(&self) -> &'static str {
        "news"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(300)
    }

    async fn run_once(&self, _cancel: &CancellationToken) -> Result<(), WorkerError> {
        let pool = &self.ctx.pool;
        let items = self.ctx.gateway.news_feed().await?;
        if items.is_empty() {
            return Ok(());
        }
        let remembered = StateRepo::news_titles(pool).await?;
        let titles: Vec<String> = items.iter().map(|i| i.title.clone()).collect();

        // First run only seeds the remembered set.
        if remembered.is_empty() {
            StateRepo::set_news_titles(pool, &titles).await?;
            return Ok(());
        }

        let novel = novel_items(&items, &remembered);
        if novel.is_empty() {
            return Ok(());
        }
        tracing::info!(count = novel.len(), "New news items");
        // Remember before sending so a failed broadcast is never repeated.
        StateRepo::set_news_titles(pool, &titles).await?;
        for item in novel {
            if let Err(e) = self.ctx.notifier.broadcast(NotifierKind::News, news_card(item)).await {
                tracing::warn!(title = %item.title, error = %e, "News broadcast failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> FeedItem {
        FeedItem {
            title: title.into(),
            link: format!("https://example.invalid/{title}"),
            description: String::new(),
            published: None,
        }
    }

    #[test]
    fn novel_items_are_oldest_first() {
        let items = vec![item("c"), item("b"), item("a")];
        let remembered = vec!["a".to_string()];
        let novel: Vec<&str> = novel_items(&items, &remembered)
            .into_iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(novel, vec!["b", "c"]);
    }

    #[test]
    fn nothing_new_when_all_remembered() {
        let items = vec![item("a")];
        assert!(novel_items(&items, &["a".to_string()]).is_empty());
    }

    #[test]
    fn card_links_to_the_item() {
        let card = news_card(&item("Patch"));
        assert_eq!(card.url.as_deref(), Some("https://example.invalid/Patch"));
        assert!(card.description.is_none());
    }
}
