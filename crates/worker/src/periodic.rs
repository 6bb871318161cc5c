//! The periodic loop shared by every worker.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;

/// One concern of the fleet.
#[async_trait]
pub trait Synchronizer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Pause between the end of one pass and the start of the next.
    fn period(&self) -> Duration;

    /// One reconciliation pass. Long passes check `cancel` between steps.
    async fn run_once(&self, cancel: &CancellationToken) -> Result<(), WorkerError>;
}

/// Sleep for `duration` unless cancelled first. Returns `false` on
/// cancellation.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Run `worker` until `cancel` fires.
///
/// A pass that fails or panics is logged and the loop carries on after the
/// usual period. Cancellation interrupts both the pass and the sleep.
pub async fn run_periodic(worker: Arc<dyn Synchronizer>, cancel: CancellationToken) {
    let name = worker.name();
    tracing::info!(
        worker = name,
        period_secs = worker.period().as_secs(),
        "Synchronizer started"
    );

    loop {
        let pass = AssertUnwindSafe(worker.run_once(&cancel)).catch_unwind();
        tokio::select! {
            _ = cancel.cancelled() => break,
            outcome = pass => match outcome {
                Ok(Ok(())) => tracing::debug!(worker = name, "Synchronizer pass complete"),
                Ok(Err(e)) => tracing::error!(worker = name, error = %e, "Synchronizer pass failed"),
                Err(_) => tracing::error!(worker = name, "Synchronizer pass panicked"),
            },
        }

        if !sleep_or_cancel(worker.period(), &cancel).await {
            break;
        }
    }

    tracing::info!(worker = name, "Synchronizer stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tyria_core::error::ApiError;

    use super::*;

    /// Fails every other pass and panics on the third.
    struct Flaky {
        passes: AtomicUsize,
    }

    #[async_trait]
    impl Synchronizer for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn period(&self) -> Duration {
            Duration::from_millis(5)
        }

        async fn run_once(&self, _cancel: &CancellationToken) -> Result<(), WorkerError> {
            let n = self.passes.fetch_add(1, Ordering::SeqCst);
            if n == 2 {
                panic!("boom");
            }
            if n % 2 == 1 {
                return Err(ApiError::RateLimited.into());
            }
            Ok(())
        }
    }

    /// Never finishes a pass on its own.
    struct Stuck;

    #[async_trait]
    impl Synchronizer for Stuck {
        fn name(&self) -> &'static str {
            "stuck"
        }

        fn period(&self) -> Duration {
            Duration::from_secs(3600)
        }

        async fn run_once(&self, _cancel: &CancellationToken) -> Result<(), WorkerError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn errors_and_panics_do_not_stop_the_loop() {
        let worker = Arc::new(Flaky {
            passes: AtomicUsize::new(0),
        });
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_periodic(worker.clone(), cancel.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(worker.passes.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_running_pass() {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_periodic(Arc::new(Stuck), cancel.clone()));

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop promptly")
            .unwrap();
    }

    #[tokio::test]
    async fn sleep_reports_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!sleep_or_cancel(Duration::from_secs(60), &cancel).await);
        assert!(sleep_or_cancel(Duration::ZERO, &CancellationToken::new()).await);
    }
}
