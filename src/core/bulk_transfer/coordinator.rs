use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::api::CdcBackend;
use crate::core::polling::{PollControl, PollJob, PollingTask};
use crate::models::{
    BulkTransferOptions, BulkTransferProgress, BulkTransferRequest, DestinationTableStatus,
    SourceTableInfo, TransferStatus,
};
use crate::utils::{CdcResult, ValidationError};

pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    NotStarted,
    Pending,
    Running,
    Completed,
    Failed,
}

impl From<TransferStatus> for TransferPhase {
    fn from(status: TransferStatus) -> Self {
        match status {
            TransferStatus::Pending => TransferPhase::Pending,
            TransferStatus::Running => TransferPhase::Running,
            TransferStatus::Completed => TransferPhase::Completed,
            TransferStatus::Failed => TransferPhase::Failed,
        }
    }
}

#[derive(Debug, Default)]
struct TransferState {
    transfer_id: Option<String>,
    progress: Option<BulkTransferProgress>,
    last_poll_error: Option<String>,
}

enum SnapshotOutcome {
    Untracked,
    Applied(TransferStatus),
}

/// Starts bulk transfers and observes them until the backend reports a
/// terminal status.
pub struct BulkTransferCoordinator {
    backend: Arc<dyn CdcBackend>,
    state: Arc<RwLock<TransferState>>,
    poller: Mutex<Option<PollingTask>>,
    poll_interval: Duration,
}

impl BulkTransferCoordinator {
    pub fn new(backend: Arc<dyn CdcBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(TransferState::default())),
            poller: Mutex::new(None),
            poll_interval: PROGRESS_POLL_INTERVAL,
        }
    }

    pub async fn load_source_tables(&self) -> CdcResult<Vec<SourceTableInfo>> {
        let tables = self.backend.bulk_source_tables().await?;
        debug!("Loaded {} bulk transfer candidate tables", tables.len());
        Ok(tables)
    }

    /// Reports which of `tables` already exist on the destination. No request
    /// is made for an empty selection.
    pub async fn check_destination(&self, tables: &[String]) -> CdcResult<Vec<DestinationTableStatus>> {
        if tables.is_empty() {
            return Ok(Vec::new());
        }
        self.backend.check_destination_tables(tables).await
    }

    pub async fn start(&self, tables: Vec<String>, options: BulkTransferOptions) -> CdcResult<String> {
        if tables.is_empty() {
            return Err(ValidationError::for_field("tables", "Select at least one table to transfer").into());
        }

        // a rejected start leaves the tracked transfer and its poller alone
        let request = BulkTransferRequest { tables, options };
        let transfer_id = self.backend.start_bulk_transfer(&request).await.map_err(|e| {
            error!("Failed to start bulk transfer for {} tables: {}", request.tables.len(), e);
            e
        })?;
        info!(
            "Started bulk transfer {} for {} tables (create_tables={}, transfer_data={}, overwrite_existing={})",
            transfer_id,
            request.tables.len(),
            request.options.create_tables,
            request.options.transfer_data,
            request.options.overwrite_existing
        );

        {
            let mut state = self.state.write().await;
            *state = TransferState {
                transfer_id: Some(transfer_id.clone()),
                ..Default::default()
            };
        }

        self.start_polling(&transfer_id).await;
        Ok(transfer_id)
    }

    /// Fetches one snapshot for `transfer_id` and records it if that transfer
    /// is the one being tracked.
    pub async fn poll(&self, transfer_id: &str) -> CdcResult<BulkTransferProgress> {
        let snapshot = self.backend.bulk_transfer_progress(transfer_id).await?;
        let (snapshot, _) = record_snapshot(&self.state, transfer_id, snapshot).await;
        Ok(snapshot)
    }

    pub async fn start_polling(&self, transfer_id: &str) {
        let job = ProgressJob {
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
            transfer_id: transfer_id.to_string(),
        };
        let task = PollingTask::spawn("bulk transfer progress", self.poll_interval, job);
        if let Some(previous) = self.poller.lock().await.replace(task) {
            previous.stop().await;
        }
    }

    pub async fn stop_polling(&self) {
        if let Some(task) = self.poller.lock().await.as_ref() {
            task.stop().await;
        }
    }

    pub async fn is_polling(&self) -> bool {
        match self.poller.lock().await.as_ref() {
            Some(task) => task.is_running().await,
            None => false,
        }
    }

    /// Resolves once the polling loop has exited.
    pub async fn wait_for_terminal(&self) -> Option<BulkTransferProgress> {
        let task = self.poller.lock().await.take();
        if let Some(mut task) = task {
            task.join().await;
        }
        self.progress().await
    }

    pub async fn transfer_id(&self) -> Option<String> {
        self.state.read().await.transfer_id.clone()
    }

    pub async fn progress(&self) -> Option<BulkTransferProgress> {
        self.state.read().await.progress.clone()
    }

    /// The most recent transient poll failure, cleared by the next good snapshot.
    pub async fn last_poll_error(&self) -> Option<String> {
        self.state.read().await.last_poll_error.clone()
    }

    pub async fn phase(&self) -> TransferPhase {
        let state = self.state.read().await;
        match (&state.transfer_id, &state.progress) {
            (None, _) => TransferPhase::NotStarted,
            (Some(_), None) => TransferPhase::Pending,
            (Some(_), Some(progress)) => progress.status.into(),
        }
    }

    pub async fn percent_complete(&self) -> u32 {
        self.progress().await.map(|p| p.percent_complete()).unwrap_or(0)
    }

    pub async fn record_percent_complete(&self) -> u32 {
        self.progress().await.map(|p| p.record_percent_complete()).unwrap_or(0)
    }

    pub async fn duration(&self) -> Option<String> {
        self.progress().await.map(|p| p.duration())
    }

    /// Stops polling and forgets the transfer.
    pub async fn dismiss(&self) {
        self.stop_polling().await;
        self.poller.lock().await.take();
        let mut state = self.state.write().await;
        if let Some(id) = state.transfer_id.take() {
            debug!("Dismissed bulk transfer {}", id);
        }
        *state = TransferState::default();
    }
}

struct ProgressJob {
    backend: Arc<dyn CdcBackend>,
    state: Arc<RwLock<TransferState>>,
    transfer_id: String,
}

#[async_trait]
impl PollJob for ProgressJob {
    type Output = CdcResult<BulkTransferProgress>;

    async fn fetch(&self) -> Self::Output {
        self.backend.bulk_transfer_progress(&self.transfer_id).await
    }

    async fn apply(&self, result: Self::Output) -> PollControl {
        match result {
            Ok(snapshot) => match record_snapshot(&self.state, &self.transfer_id, snapshot).await.1 {
                SnapshotOutcome::Untracked => PollControl::Stop,
                SnapshotOutcome::Applied(status) if status.is_terminal() => PollControl::Stop,
                SnapshotOutcome::Applied(_) => PollControl::Continue,
            },
            Err(e) => {
                let mut state = self.state.write().await;
                if state.transfer_id.as_deref() != Some(self.transfer_id.as_str()) {
                    return PollControl::Stop;
                }
                warn!("Polling bulk transfer {} failed, will retry: {}", self.transfer_id, e);
                state.last_poll_error = Some(e.user_message());
                PollControl::Continue
            }
        }
    }
}

async fn record_snapshot(
    state: &RwLock<TransferState>,
    transfer_id: &str,
    mut snapshot: BulkTransferProgress,
) -> (BulkTransferProgress, SnapshotOutcome) {
    let mut state = state.write().await;
    if state.transfer_id.as_deref() != Some(transfer_id) {
        debug!("Discarding progress for untracked transfer {}", transfer_id);
        return (snapshot, SnapshotOutcome::Untracked);
    }
    if snapshot.transfer_id != transfer_id {
        warn!(
            "Backend answered for transfer {} while {} was requested, ignoring",
            snapshot.transfer_id, transfer_id
        );
        let status = state
            .progress
            .as_ref()
            .map(|p| p.status)
            .unwrap_or(TransferStatus::Pending);
        return (snapshot, SnapshotOutcome::Applied(status));
    }

    if snapshot.completed_tables > snapshot.total_tables {
        warn!(
            "Transfer {} reported {} of {} tables completed, clamping",
            transfer_id, snapshot.completed_tables, snapshot.total_tables
        );
        snapshot.completed_tables = snapshot.total_tables;
    }

    let previous = state.progress.as_ref().map(|p| p.status);
    if previous != Some(snapshot.status) {
        match snapshot.status {
            TransferStatus::Completed => info!(
                "Bulk transfer {} completed: {}/{} tables in {}",
                transfer_id,
                snapshot.completed_tables,
                snapshot.total_tables,
                snapshot.duration()
            ),
            TransferStatus::Failed => warn!(
                "Bulk transfer {} failed after {}/{} tables: {}",
                transfer_id,
                snapshot.completed_tables,
                snapshot.total_tables,
                snapshot.errors.join("; ")
            ),
            status => info!("Bulk transfer {} is {:?}", transfer_id, status),
        }
    } else {
        debug!(
            "Bulk transfer {}: {}/{} tables, current {:?}",
            transfer_id,
            snapshot.completed_tables,
            snapshot.total_tables,
            snapshot.current_table
        );
    }

    let status = snapshot.status;
    state.progress = Some(snapshot.clone());
    state.last_poll_error = None;
    (snapshot, SnapshotOutcome::Applied(status))
}
