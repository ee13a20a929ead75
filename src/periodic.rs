//! Cancellable periodic task.
//!
//! Each tick runs to completion before the next one is scheduled, so ticks
//! never overlap; missed ticks are skipped. `shutdown` stops future ticks and
//! waits for an in-flight tick to finish.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Zero periods are clamped to this instead of panicking inside the task.
const MIN_PERIOD: Duration = Duration::from_millis(1);

pub struct PeriodicHandle {
    name: &'static str,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
    ticks: Arc<AtomicU64>,
}

pub fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> PeriodicHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    if period.is_zero() {
        tracing::warn!("{} period is zero, using {:?}", name, MIN_PERIOD);
    }
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
    let ticks = Arc::new(AtomicU64::new(0));
    let counter = ticks.clone();
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period.max(MIN_PERIOD));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::debug!("{} loop shutting down", name);
                    break;
                }
                _ = interval.tick() => {
                    tick().await;
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
    });
    PeriodicHandle {
        name,
        shutdown_tx,
        task,
        ticks,
    }
}

impl PeriodicHandle {
    /// Completed ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            tracing::error!("{} loop terminated abnormally: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_shutdown() {
        let seen = Arc::new(AtomicU64::new(0));
        let counter = seen.clone();
        let handle = spawn_periodic("test", Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        tokio::time::sleep(Duration::from_millis(350)).await;
        let before = handle.ticks();
        assert!(before >= 3);
        handle.shutdown().await;
        let after = seen.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(seen.load(Ordering::SeqCst), after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_in_flight_tick() {
        let finished = Arc::new(AtomicU64::new(0));
        let counter = finished.clone();
        let handle = spawn_periodic("slow", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        // First tick fires immediately and is now sleeping inside the tick body.
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_keeps_ticking() {
        let handle = spawn_periodic("zero", Duration::ZERO, || async {});
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        assert!(handle.ticks() >= 2);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_loop() {
        let handle = spawn_periodic("dropped", Duration::from_millis(5), || async {});
        let PeriodicHandle { shutdown_tx, task, .. } = handle;
        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }
}
