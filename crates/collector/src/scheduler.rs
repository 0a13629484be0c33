use std::{
    fmt::Debug,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub enum SupervisionStrategy {
    Restart,
    Resume,
    Stop,
}

/// One server's worth of work for a single collector kind, run to
/// completion before the scheduler sleeps for the collector's period.
/// Servers within a tick are processed sequentially (§4.4) so mutations to
/// the same server's state never race within one collector.
#[async_trait::async_trait]
pub trait Collector: Send + 'static {
    type Error: Debug + Send;

    fn unique_id(&self) -> &'static str;

    fn period(&self) -> Duration;

    async fn tick(&mut self) -> Result<(), Self::Error>;

    fn on_error(&self, _error: &Self::Error) -> SupervisionStrategy {
        SupervisionStrategy::Resume
    }
}

/// Tracks whether a collector has completed at least one tick without
/// crashing, for an external readiness probe to consult.
#[derive(Clone, Default)]
pub struct Health(Arc<AtomicBool>);

impl Health {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn mark_ready(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Runs `collector` on a fixed-delay loop (§4.4: "a new tick never starts
/// before the previous tick completes") until `shutdown` is cancelled.
/// Panics inside `tick` are caught and treated like an ordinary error with
/// `SupervisionStrategy::Restart`-equivalent backoff; `Stop` ends the loop.
pub fn spawn<C: Collector>(mut collector: C, shutdown: CancellationToken) -> (Health, tokio::task::JoinHandle<()>) {
    let health = Health::new();
    let reported_health = health.clone();
    let id = collector.unique_id();

    let handle = tokio::spawn(async move {
        let mut backoff = Duration::from_secs(1);
        loop {
            let period = collector.period();
            let outcome = AssertUnwindSafe(collector.tick()).catch_unwind().await;

            let strategy = match outcome {
                Ok(Ok(())) => {
                    reported_health.mark_ready();
                    backoff = Duration::from_secs(1);
                    None
                }
                Ok(Err(error)) => {
                    tracing::warn!(collector = id, error = ?error, "collector tick failed");
                    Some(collector.on_error(&error))
                }
                Err(panic) => {
                    tracing::error!(collector = id, ?panic, "collector tick panicked");
                    Some(SupervisionStrategy::Resume)
                }
            };

            match strategy {
                None | Some(SupervisionStrategy::Resume) => {}
                Some(SupervisionStrategy::Restart) => {
                    backoff = (backoff * 2).min(Duration::from_secs(60));
                }
                Some(SupervisionStrategy::Stop) => break,
            }

            let sleep = if strategy.is_some() { backoff } else { period };
            tokio::select! {
                _ = tokio::time::sleep(sleep) => {}
                _ = shutdown.cancelled() => break,
            }
        }
        tracing::info!(collector = id, "collector stopped");
    });

    (health, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct CountingCollector {
        ticks: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl Collector for CountingCollector {
        type Error = ();

        fn unique_id(&self) -> &'static str {
            "counting"
        }

        fn period(&self) -> Duration {
            Duration::from_millis(5)
        }

        async fn tick(&mut self) -> Result<(), Self::Error> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn reports_ready_after_first_successful_tick() {
        let ticks = Arc::new(AtomicU32::new(0));
        let shutdown = CancellationToken::new();
        let (health, handle) = spawn(CountingCollector { ticks: ticks.clone() }, shutdown.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(health.is_ready());
        assert!(ticks.load(Ordering::SeqCst) > 0);

        shutdown.cancel();
        let _ = handle.await;
    }
}
