//! Mirrors service availability onto the bot's chat presence.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tyria_events::ChatPlatform;
use tyria_pipeline::Availability;

/// Push every availability change to the chat platform until cancelled.
pub async fn mirror_presence(
    mut status: watch::Receiver<Availability>,
    chat: Arc<dyn ChatPlatform>,
    cancel: CancellationToken,
) {
    loop {
        let current = *status.borrow_and_update();
        if let Err(e) = chat.set_presence(current.label()).await {
            tracing::warn!(error = %e, presence = current.label(), "Could not update presence");
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
