use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::api::CdcBackend;
use crate::core::polling::{PollControl, PollJob, PollingTask};
use crate::models::{ConnectionStatus, DbRole, SyncRule, SyncStatus};
use crate::utils::CdcResult;

/// Last known state of the legacy single-pair pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncDashboard {
    pub connection_status: Option<ConnectionStatus>,
    pub sync_status: Option<SyncStatus>,
    pub rules: Option<Vec<SyncRule>>,
    pub last_refreshed: Option<DateTime<Utc>>,
    /// Set when the most recent refresh failed; the data above is then stale.
    pub last_error: Option<String>,
}

impl SyncDashboard {
    pub fn both_connected(&self) -> bool {
        self.connection_status
            .as_ref()
            .map(|s| s.is_connected(DbRole::Source) && s.is_connected(DbRole::Destination))
            .unwrap_or(false)
    }
}

/// Periodically refreshes connection and sync status.
pub struct SyncStatusPoller {
    backend: Arc<dyn CdcBackend>,
    state: Arc<RwLock<SyncDashboard>>,
    interval: Duration,
    poller: Mutex<Option<PollingTask>>,
}

impl SyncStatusPoller {
    pub fn new(backend: Arc<dyn CdcBackend>, interval: Duration) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(SyncDashboard::default())),
            interval,
            poller: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn snapshot(&self) -> SyncDashboard {
        self.state.read().await.clone()
    }

    /// Fetches connection and sync status together. On failure the previous
    /// state is kept and the error is returned.
    pub async fn refresh(&self) -> CdcResult<SyncDashboard> {
        let result = fetch_status(self.backend.as_ref()).await;
        store_status(&self.state, result).await
    }

    /// Like [`refresh`](Self::refresh) but also reloads sync rules; all three
    /// are applied or none is.
    pub async fn refresh_all(&self) -> CdcResult<SyncDashboard> {
        let result = tokio::try_join!(
            self.backend.fetch_connection_status(),
            self.backend.fetch_sync_status(),
            self.backend.fetch_sync_rules(),
        );

        let mut state = self.state.write().await;
        match result {
            Ok((connection, sync, rules)) => {
                state.connection_status = Some(connection);
                state.sync_status = Some(sync);
                state.rules = Some(rules);
                state.last_refreshed = Some(Utc::now());
                state.last_error = None;
                Ok(state.clone())
            }
            Err(e) => {
                warn!("Initial status load failed: {}", e);
                state.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn refresh_rules(&self) -> CdcResult<Vec<SyncRule>> {
        let rules = self.backend.fetch_sync_rules().await?;
        self.state.write().await.rules = Some(rules.clone());
        Ok(rules)
    }

    pub async fn start(&self) {
        let job = StatusJob {
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
        };
        let task = PollingTask::spawn("sync status", self.interval, job);
        if let Some(previous) = self.poller.lock().await.replace(task) {
            previous.stop().await;
        }
        info!("Sync status polling every {}s", self.interval.as_secs());
    }

    pub async fn stop(&self) {
        if let Some(task) = self.poller.lock().await.take() {
            task.stop().await;
            info!("Sync status polling stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        match self.poller.lock().await.as_ref() {
            Some(task) => task.is_running().await,
            None => false,
        }
    }
}

async fn fetch_status(backend: &dyn CdcBackend) -> CdcResult<(ConnectionStatus, SyncStatus)> {
    tokio::try_join!(backend.fetch_connection_status(), backend.fetch_sync_status())
}

async fn store_status(
    state: &RwLock<SyncDashboard>,
    result: CdcResult<(ConnectionStatus, SyncStatus)>,
) -> CdcResult<SyncDashboard> {
    let mut state = state.write().await;
    match result {
        Ok((connection, sync)) => {
            debug!(
                "Status refreshed: sync_running={}, records_synced={}",
                sync.sync_running, sync.total_records_synced
            );
            state.connection_status = Some(connection);
            state.sync_status = Some(sync);
            state.last_refreshed = Some(Utc::now());
            state.last_error = None;
            Ok(state.clone())
        }
        Err(e) => {
            warn!("Status refresh failed, keeping previous state: {}", e);
            state.last_error = Some(e.user_message());
            Err(e)
        }
    }
}

struct StatusJob {
    backend: Arc<dyn CdcBackend>,
    state: Arc<RwLock<SyncDashboard>>,
}

#[async_trait]
impl PollJob for StatusJob {
    type Output = CdcResult<(ConnectionStatus, SyncStatus)>;

    async fn fetch(&self) -> Self::Output {
        fetch_status(self.backend.as_ref()).await
    }

    async fn apply(&self, result: Self::Output) -> PollControl {
        // failures are already logged and never end the loop
        let _ = store_status(&self.state, result).await;
        PollControl::Continue
    }
}
