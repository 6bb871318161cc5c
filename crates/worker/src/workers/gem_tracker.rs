//! Direct-messages users when gems get cheaper than their threshold.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tyria_core::account::{CoinExchange, GEM_BUNDLE};
use tyria_core::card::MessageCard;
use tyria_core::currencies::format_coins;
use tyria_db::repositories::UserRepo;
use tyria_events::OutgoingMessage;

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::periodic::Synchronizer;

/// Coins offered when quoting the exchange; large enough to average out
/// the order book.
const QUOTE_COINS: i64 = 10_000_000;

pub struct GemTracker {
    ctx: WorkerContext,
}

impl GemTracker {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }
}

pub fn alert_due(bundle_price: i64, threshold: i64) -> bool {
    bundle_price < threshold
}

pub fn alert_card(bundle_price: i64, threshold: i64) -> MessageCard {
    MessageCard::new("Gem price alert").description(format!(
        "{GEM_BUNDLE} gems now cost {}, below your threshold of {}. \
         The alert has been cleared; set a new one with `/gemtrack`.",
        format_coins(bundle_price),
        format_coins(threshold)
    ))
}

#[async_trait]
impl Synchronizer for GemTracker {
    fn name(&self) -> &'static str {
        "gem_tracker"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(150)
    }

    async fn run_once(&self, _cancel: &CancellationToken) -> Result<(), WorkerError> {
        let pool = &self.ctx.pool;
        let trackers = UserRepo::gem_trackers(pool).await?;
        if trackers.is_empty() {
            return Ok(());
        }

        let exchange: CoinExchange = self
            .ctx
            .gateway
            .get(&format!("commerce/exchange/coins?quantity={QUOTE_COINS}"))
            .await?;
        let price = exchange.bundle_price();

        for tracker in trackers {
            let threshold = tracker.gem_track_threshold;
            if !alert_due(price, threshold) {
                continue;
            }
            let message = OutgoingMessage::card(alert_card(price, threshold));
            if let Err(e) = self.ctx.chat.send_direct(tracker.user_id, &message).await {
                tracing::warn!(user_id = tracker.user_id, error = %e, "Gem alert delivery failed");
            }
            UserRepo::set_gem_threshold(pool, tracker.user_id, None).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_only_strictly_below_threshold() {
        assert!(alert_due(999_999, 1_000_000));
        assert!(!alert_due(1_000_000, 1_000_000));
        assert!(!alert_due(1_200_000, 1_000_000));
    }

    #[test]
    fn card_shows_formatted_prices() {
        let card = alert_card(1_234_567, 1_500_000);
        let text = card.description.unwrap();
        assert!(text.contains("123g 45s 67c"));
        assert!(text.contains("150g"));
    }
}
