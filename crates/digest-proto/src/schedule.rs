//! Periodic background jobs with explicit cancellation.
//!
//! A `PeriodicTask` owns a `CancellationToken` and the join handle of its
//! tokio task. Stopping is deterministic: `shutdown().await` cancels and waits,
//! and dropping the task cancels it.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::client::BackendClient;

/// When the first run happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    /// Run as soon as the task starts.
    Immediate,
    /// Wait one full period first.
    AfterPeriod,
}

pub struct PeriodicTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, first: FirstTick, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let start = match first {
                FirstTick::Immediate => Instant::now(),
                FirstTick::AfterPeriod => Instant::now() + period,
            };
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!("[schedule] {} started, every {:?}", name, period);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                trace!("[schedule] {} tick", name);
                // A job still running at shutdown is abandoned, not awaited.
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = job() => {}
                }
            }
            debug!("[schedule] {} stopped", name);
        });

        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Ping the backend root on a fixed period so it does not go cold.
/// Each ping runs detached and is abandoned after one period, so a stalled
/// request never holds up the next tick. Failures are logged and otherwise
/// ignored; the next tick is the retry.
pub fn keep_warm(client: BackendClient, period: Duration) -> PeriodicTask {
    PeriodicTask::spawn("keep-warm", period, FirstTick::AfterPeriod, move || {
        let client = client.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(period, client.ping()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("[keep-warm] warm-up request failed: {}", e),
                Err(_) => debug!("[keep-warm] warm-up request still pending after {:?}", period),
            }
        });
        async {}
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(
        first: FirstTick,
        period: Duration,
    ) -> (PeriodicTask, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let task = PeriodicTask::spawn("test", period, first, move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_first_tick() {
        let (task, count) = counting(FirstTick::Immediate, Duration::from_secs(300));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        task.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_period_waits_first() {
        let (task, count) = counting(FirstTick::AfterPeriod, Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        task.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let (task, count) = counting(FirstTick::Immediate, Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let before = count.load(Ordering::SeqCst);
        assert!(before >= 2);

        task.shutdown().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (task, count) = counting(FirstTick::AfterPeriod, Duration::from_secs(1));
        drop(task);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
