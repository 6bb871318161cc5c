//! Whether the service is accepting user commands.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Rebuilding,
}

impl Availability {
    /// Text shown as the bot's presence and in refusal replies.
    pub fn label(self) -> &'static str {
        match self {
            Availability::Available => "Guild Wars 2",
            Availability::Rebuilding => "Rebuilding",
        }
    }
}

/// Shared availability flag. Clones observe the same value.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    tx: Arc<watch::Sender<Availability>>,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceStatus {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Availability::Available);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Availability {
        *self.tx.borrow()
    }

    pub fn is_available(&self) -> bool {
        self.current() == Availability::Available
    }

    pub fn subscribe(&self) -> watch::Receiver<Availability> {
        self.tx.subscribe()
    }

    /// Mark the service unavailable until the returned guard is dropped.
    pub fn begin_rebuild(&self) -> RebuildGuard {
        self.tx.send_replace(Availability::Rebuilding);
        RebuildGuard { tx: self.tx.clone() }
    }
}

/// Restores availability on drop, including when a rebuild panics or is
/// cancelled.
#[derive(Debug)]
pub struct RebuildGuard {
    tx: Arc<watch::Sender<Availability>>,
}

impl Drop for RebuildGuard {
    fn drop(&mut self) {
        self.tx.send_replace(Availability::Available);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_availability() {
        let status = ServiceStatus::new();
        assert!(status.is_available());
        {
            let _guard = status.begin_rebuild();
            assert_eq!(status.current(), Availability::Rebuilding);
            assert!(!status.clone().is_available());
        }
        assert!(status.is_available());
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let status = ServiceStatus::new();
        let mut rx = status.subscribe();
        let guard = status.begin_rebuild();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Availability::Rebuilding);
        drop(guard);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Availability::Available);
    }
}
