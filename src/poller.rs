//! Recurring task execution bound to a widget's lifetime.
//!
//! `start` runs the task immediately and then on every tick until `stop`.
//! Each invocation is spawned and not awaited by the loop, so a slow fetch
//! never delays or swallows the next tick. Overlapping completions are the
//! widget state machine's concern.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// How often a widget refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollInterval {
    Every(Duration),
    /// Infinite interval: run once on start.
    Once,
}

impl PollInterval {
    /// `None` and `0` both mean "fetch once".
    pub fn from_millis(millis: Option<u64>) -> Self {
        match millis {
            Some(ms) if ms > 0 => PollInterval::Every(Duration::from_millis(ms)),
            _ => PollInterval::Once,
        }
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns one scheduling loop. Dropping the poller stops it.
#[derive(Default)]
pub struct Poller {
    running: Mutex<Option<Running>>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the loop. Must be called inside a tokio runtime.
    pub fn start<F, Fut>(&self, interval: PollInterval, task: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut running = self.running.lock();
        if let Some(previous) = running.take() {
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            match interval {
                PollInterval::Every(period) if !period.is_zero() => {
                    let mut ticker = tokio::time::interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => break,
                            _ = ticker.tick() => {
                                tokio::spawn(task());
                            }
                        }
                    }
                }
                _ => {
                    if !token.is_cancelled() {
                        tokio::spawn(task());
                    }
                }
            }
            tracing::trace!("Poller loop finished");
        });

        *running = Some(Running { cancel, handle });
    }

    /// Prevent any further invocation. Idempotent. Invocations already
    /// spawned keep running.
    pub fn stop(&self) {
        if let Some(running) = self.running.lock().take() {
            running.cancel.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .map(|r| !r.cancel.is_cancelled() && !r.handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl Fn() -> futures::future::Ready<()> {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[test]
    fn test_from_millis() {
        assert_eq!(PollInterval::from_millis(None), PollInterval::Once);
        assert_eq!(PollInterval::from_millis(Some(0)), PollInterval::Once);
        assert_eq!(
            PollInterval::from_millis(Some(30_000)),
            PollInterval::Every(Duration::from_secs(30))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let poller = Poller::new();
        poller.start(
            PollInterval::Every(Duration::from_secs(30)),
            counting_task(&counter),
        );

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert!(poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_ticks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let poller = Poller::new();
        poller.start(
            PollInterval::Every(Duration::from_secs(30)),
            counting_task(&counter),
        );

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        poller.stop();
        poller.stop();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_tick() {
        let counter = Arc::new(AtomicUsize::new(0));
        let poller = Poller::new();
        poller.start(
            PollInterval::Every(Duration::from_secs(30)),
            counting_task(&counter),
        );
        poller.stop();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_runs_exactly_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let poller = Poller::new();
        poller.start(PollInterval::Once, counting_task(&counter));

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_task_does_not_delay_ticks() {
        let started = Arc::new(AtomicUsize::new(0));
        let poller = Poller::new();
        let counter = started.clone();
        poller.start(PollInterval::Every(Duration::from_secs(10)), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            // Each invocation outlives several ticks
            tokio::time::sleep(Duration::from_secs(45))
        });

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(started.load(Ordering::SeqCst), 4);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_loop() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let poller = Poller::new();

        poller.start(PollInterval::Every(Duration::from_secs(10)), counting_task(&first));
        tokio::time::sleep(Duration::from_millis(1)).await;
        poller.start(PollInterval::Every(Duration::from_secs(10)), counting_task(&second));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 3);
    }
}
