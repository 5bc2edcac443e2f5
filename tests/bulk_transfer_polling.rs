mod common;

use cdc_control_plane::core::bulk_transfer::{BulkTransferCoordinator, TransferPhase};
use cdc_control_plane::models::{BulkTransferOptions, TransferStatus};
use cdc_control_plane::CdcError;
use common::{progress, MockBackend};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

fn tables(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_polling_stops_on_completion() {
    let backend = Arc::new(MockBackend::default());
    backend.script_progress(vec![
        Ok(progress("transfer-1", TransferStatus::Running, 1, 2)),
        Ok(progress("transfer-1", TransferStatus::Completed, 2, 2)),
    ]);
    let coordinator = BulkTransferCoordinator::new(backend.clone());
    assert_eq!(coordinator.phase().await, TransferPhase::NotStarted);

    let id = coordinator
        .start(tables(&["a", "b"]), BulkTransferOptions::default())
        .await
        .unwrap();
    assert_eq!(id, "transfer-1");

    sleep(Duration::from_millis(500)).await;
    assert_eq!(coordinator.phase().await, TransferPhase::Running);
    assert_eq!(coordinator.percent_complete().await, 50);

    let done = coordinator.wait_for_terminal().await.unwrap();
    assert_eq!(done.status, TransferStatus::Completed);
    assert_eq!(coordinator.percent_complete().await, 100);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.calls("bulk_transfer_progress"), 2);
}

#[tokio::test]
async fn test_empty_selection_is_rejected_before_any_request() {
    let backend = Arc::new(MockBackend::default());
    let coordinator = BulkTransferCoordinator::new(backend.clone());

    let err = coordinator
        .start(Vec::new(), BulkTransferOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(backend.calls("start_bulk_transfer"), 0);

    assert!(coordinator.check_destination(&[]).await.unwrap().is_empty());
    assert_eq!(backend.calls("check_destination_tables"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_is_transient() {
    let backend = Arc::new(MockBackend::default());
    backend.script_progress(vec![
        Err(CdcError::Transport("timed out".into())),
        Ok(progress("transfer-1", TransferStatus::Running, 0, 3)),
        Ok(progress("transfer-1", TransferStatus::Failed, 1, 3)),
    ]);
    let coordinator = BulkTransferCoordinator::new(backend.clone());
    coordinator
        .start(tables(&["a", "b", "c"]), BulkTransferOptions::default())
        .await
        .unwrap();

    sleep(Duration::from_millis(100)).await;
    assert_eq!(coordinator.phase().await, TransferPhase::Pending);
    assert!(coordinator.last_poll_error().await.is_some());

    let done = coordinator.wait_for_terminal().await.unwrap();
    assert_eq!(done.status, TransferStatus::Failed);
    assert_eq!(coordinator.phase().await, TransferPhase::Failed);
    assert_eq!(coordinator.last_poll_error().await, None);
    assert_eq!(backend.calls("bulk_transfer_progress"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_completed_count_is_clamped() {
    let backend = Arc::new(MockBackend::default());
    backend.script_progress(vec![Ok(progress("transfer-1", TransferStatus::Completed, 5, 2))]);
    let coordinator = BulkTransferCoordinator::new(backend.clone());
    coordinator
        .start(tables(&["a", "b"]), BulkTransferOptions::default())
        .await
        .unwrap();

    let done = coordinator.wait_for_terminal().await.unwrap();
    assert_eq!(done.completed_tables, 2);
    assert_eq!(coordinator.percent_complete().await, 100);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_discards_progress_and_stops_polling() {
    let backend = Arc::new(MockBackend::default());
    backend.script_progress(vec![Ok(progress("transfer-1", TransferStatus::Running, 0, 4))]);
    let coordinator = BulkTransferCoordinator::new(backend.clone());
    coordinator
        .start(tables(&["a", "b", "c", "d"]), BulkTransferOptions::default())
        .await
        .unwrap();

    sleep(Duration::from_millis(2500)).await;
    let polls = backend.calls("bulk_transfer_progress");
    assert_eq!(polls, 3);

    coordinator.dismiss().await;
    assert_eq!(coordinator.phase().await, TransferPhase::NotStarted);
    assert_eq!(coordinator.progress().await, None);
    assert_eq!(coordinator.percent_complete().await, 0);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(backend.calls("bulk_transfer_progress"), polls);
}

#[tokio::test]
async fn test_source_and_destination_checks() {
    let backend = Arc::new(MockBackend::with_schema(
        vec![cdc_control_plane::models::TableInfo::new("users", Vec::new())],
        vec![cdc_control_plane::models::TableInfo::new("users", Vec::new())],
    ));
    let coordinator = BulkTransferCoordinator::new(backend.clone());

    let source = coordinator.load_source_tables().await.unwrap();
    assert_eq!(source[0].table_name, "users");

    let status = coordinator
        .check_destination(&tables(&["users", "orders"]))
        .await
        .unwrap();
    assert!(status[0].exists);
    assert!(!status[1].exists);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_restart_keeps_tracking_running_transfer() {
    let backend = Arc::new(MockBackend::default());
    backend.script_progress(vec![Ok(progress("transfer-1", TransferStatus::Running, 1, 4))]);
    let coordinator = BulkTransferCoordinator::new(backend.clone());
    coordinator
        .start(tables(&["a", "b", "c", "d"]), BulkTransferOptions::default())
        .await
        .unwrap();
    sleep(Duration::from_millis(1500)).await;
    let polls_before = backend.calls("bulk_transfer_progress");
    assert_eq!(polls_before, 2);

    *backend.reject_start.lock().unwrap() = Some("engine busy".into());
    let err = coordinator
        .start(tables(&["e"]), BulkTransferOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "engine busy");

    assert_eq!(coordinator.transfer_id().await.as_deref(), Some("transfer-1"));
    assert_eq!(coordinator.phase().await, TransferPhase::Running);
    assert!(coordinator.is_polling().await);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(backend.calls("bulk_transfer_progress"), polls_before + 5);
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_for_another_transfer_is_ignored() {
    let backend = Arc::new(MockBackend::default());
    let first = progress("transfer-1", TransferStatus::Running, 1, 3);
    backend.script_progress(vec![
        Ok(first.clone()),
        Ok(progress("transfer-other", TransferStatus::Completed, 3, 3)),
        Ok(progress("transfer-1", TransferStatus::Running, 2, 3)),
        Ok(progress("transfer-1", TransferStatus::Completed, 3, 3)),
    ]);
    let coordinator = BulkTransferCoordinator::new(backend.clone());
    coordinator
        .start(tables(&["a", "b", "c"]), BulkTransferOptions::default())
        .await
        .unwrap();

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(backend.calls("bulk_transfer_progress"), 2);
    assert_eq!(coordinator.phase().await, TransferPhase::Running);
    assert_eq!(coordinator.progress().await, Some(first));
    assert!(coordinator.is_polling().await);

    let done = coordinator.wait_for_terminal().await.unwrap();
    assert_eq!(done.transfer_id, "transfer-1");
    assert_eq!(done.status, TransferStatus::Completed);
    assert_eq!(backend.calls("bulk_transfer_progress"), 4);
}
