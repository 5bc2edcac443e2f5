use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOperation {
    CreatingTable,
    TransferringData,
    Completed,
}

/// Per-table status: pending -> creating_table -> transferring_data ->
/// completed, or failed from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableTransferStatus {
    Pending,
    CreatingTable,
    TransferringData,
    Completed,
    Failed,
}

impl TableTransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TableTransferStatus::Completed | TableTransferStatus::Failed)
    }

    pub fn can_transition_to(&self, next: TableTransferStatus) -> bool {
        use TableTransferStatus::*;
        match (self, next) {
            (a, b) if *a == b => true,
            (Pending, CreatingTable) | (CreatingTable, TransferringData) | (TransferringData, Completed) => true,
            // tables that already exist skip straight to the data copy
            (Pending, TransferringData) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTransferProgress {
    pub table_name: String,
    pub status: TableTransferStatus,
    #[serde(default)]
    pub total_records: Option<u64>,
    #[serde(default)]
    pub transferred_records: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTransferProgress {
    pub transfer_id: String,
    pub status: TransferStatus,
    pub total_tables: u32,
    pub completed_tables: u32,
    #[serde(default)]
    pub current_table: Option<String>,
    #[serde(default)]
    pub current_operation: Option<TransferOperation>,
    #[serde(default)]
    pub total_records: Option<u64>,
    #[serde(default)]
    pub transferred_records: Option<u64>,
    #[serde(deserialize_with = "crate::models::timestamp::deserialize_timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "crate::models::timestamp::deserialize_optional_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub table_progress: Vec<TableTransferProgress>,
}

impl BulkTransferProgress {
    pub fn percent_complete(&self) -> u32 {
        percent(self.completed_tables as u64, self.total_tables as u64)
    }

    pub fn record_percent_complete(&self) -> u32 {
        match (self.transferred_records, self.total_records) {
            (Some(done), Some(total)) => percent(done, total),
            _ => 0,
        }
    }

    pub fn failed_tables(&self) -> impl Iterator<Item = &TableTransferProgress> {
        self.table_progress
            .iter()
            .filter(|t| t.status == TableTransferStatus::Failed)
    }

    /// Elapsed time formatted for display, measured against `now` while the
    /// transfer has no end time.
    pub fn duration_at(&self, now: DateTime<Utc>) -> String {
        let end = self.end_time.unwrap_or(now);
        let millis = (end - self.start_time).num_milliseconds().max(0);
        format_elapsed((millis as f64 / 1000.0).round() as u64)
    }

    pub fn duration(&self) -> String {
        self.duration_at(Utc::now())
    }
}

fn percent(done: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round() as u32
}

/// `59s`, `1m 0s`, `59m 59s`, `1h 0m`.
pub fn format_elapsed(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTransferOptions {
    pub create_tables: bool,
    pub transfer_data: bool,
    pub overwrite_existing: bool,
}

impl Default for BulkTransferOptions {
    fn default() -> Self {
        Self {
            create_tables: true,
            transfer_data: true,
            overwrite_existing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTransferRequest {
    pub tables: Vec<String>,
    #[serde(flatten)]
    pub options: BulkTransferOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn progress(completed: u32, total: u32) -> BulkTransferProgress {
        BulkTransferProgress {
            transfer_id: "t-1".into(),
            status: TransferStatus::Running,
            total_tables: total,
            completed_tables: completed,
            current_table: None,
            current_operation: None,
            total_records: None,
            transferred_records: None,
            start_time: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
            end_time: None,
            errors: Vec::new(),
            table_progress: Vec::new(),
        }
    }

    #[test]
    fn test_percent_complete() {
        assert_eq!(progress(0, 0).percent_complete(), 0);
        assert_eq!(progress(1, 2).percent_complete(), 50);
        assert_eq!(progress(1, 3).percent_complete(), 33);
        assert_eq!(progress(2, 3).percent_complete(), 67);
        assert_eq!(progress(3, 3).percent_complete(), 100);
    }

    #[test]
    fn test_record_percent_complete_guards_missing_totals() {
        let mut p = progress(0, 2);
        assert_eq!(p.record_percent_complete(), 0);
        p.total_records = Some(0);
        p.transferred_records = Some(10);
        assert_eq!(p.record_percent_complete(), 0);
        p.total_records = Some(400);
        p.transferred_records = Some(100);
        assert_eq!(p.record_percent_complete(), 25);
    }

    #[test]
    fn test_format_elapsed_boundaries() {
        assert_eq!(format_elapsed(0), "0s");
        assert_eq!(format_elapsed(59), "59s");
        assert_eq!(format_elapsed(60), "1m 0s");
        assert_eq!(format_elapsed(3599), "59m 59s");
        assert_eq!(format_elapsed(3600), "1h 0m");
        assert_eq!(format_elapsed(7322), "2h 2m");
    }

    #[test]
    fn test_duration_uses_end_time_when_present() {
        let mut p = progress(2, 2);
        p.end_time = Some(p.start_time + Duration::seconds(61));
        assert_eq!(p.duration(), "1m 1s");

        p.end_time = None;
        let now = p.start_time + Duration::milliseconds(59_400);
        assert_eq!(p.duration_at(now), "59s");
    }

    #[test]
    fn test_table_status_transitions() {
        use TableTransferStatus::*;
        assert!(Pending.can_transition_to(CreatingTable));
        assert!(CreatingTable.can_transition_to(TransferringData));
        assert!(TransferringData.can_transition_to(Completed));
        assert!(CreatingTable.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!TransferringData.can_transition_to(CreatingTable));
    }

    #[test]
    fn test_request_flattens_options() {
        let request = BulkTransferRequest {
            tables: vec!["a".into(), "b".into()],
            options: BulkTransferOptions::default(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "tables": ["a", "b"],
                "create_tables": true,
                "transfer_data": true,
                "overwrite_existing": false
            })
        );
    }

    #[test]
    fn test_progress_accepts_naive_start_time() {
        let snapshot: BulkTransferProgress = serde_json::from_value(serde_json::json!({
            "transfer_id": "t-1",
            "status": "running",
            "total_tables": 2,
            "completed_tables": 1,
            "start_time": "2026-01-01T12:00:00.250",
            "end_time": ""
        }))
        .unwrap();

        assert_eq!(
            snapshot.start_time,
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::milliseconds(250)
        );
        assert_eq!(snapshot.end_time, None);
    }
}
