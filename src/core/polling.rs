use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// What a poll job wants the loop to do after applying a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollControl {
    Continue,
    Stop,
}

/// One unit of periodic work, split so that a result arriving after `stop()`
/// can be dropped before it touches any state.
#[async_trait]
pub trait PollJob: Send + Sync + 'static {
    type Output: Send;

    async fn fetch(&self) -> Self::Output;

    async fn apply(&self, output: Self::Output) -> PollControl;
}

/// A spawned fixed-interval loop with an explicit start/stop lifecycle.
///
/// The first tick fires immediately. Stopping never aborts a request that is
/// already in flight; its result is discarded instead.
pub struct PollingTask {
    name: &'static str,
    is_running: Arc<RwLock<bool>>,
    stop_signal: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl PollingTask {
    pub fn spawn<J: PollJob>(name: &'static str, period: Duration, job: J) -> Self {
        let is_running = Arc::new(RwLock::new(true));
        let stop_signal = Arc::new(Notify::new());

        let running = Arc::clone(&is_running);
        let signal = Arc::clone(&stop_signal);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = signal.notified() => break,
                }

                if !*running.read().await {
                    break;
                }

                let output = job.fetch().await;

                if !*running.read().await {
                    tracing::debug!("{} stopped while a request was in flight, discarding result", name);
                    break;
                }

                if job.apply(output).await == PollControl::Stop {
                    break;
                }
            }

            *running.write().await = false;
            tracing::debug!("{} polling stopped", name);
        });

        tracing::debug!("{} polling started every {:?}", name, period);
        Self {
            name,
            is_running,
            stop_signal,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Ends the loop at its next suspension point. Idempotent.
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.stop_signal.notify_one();
    }

    /// Waits for the loop to exit, either on its own or after `stop()`.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("{} polling task ended abnormally: {}", self.name, e);
            }
        }
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        if let Ok(mut running) = self.is_running.try_write() {
            *running = false;
        }
        self.stop_signal.notify_one();
    }
}
