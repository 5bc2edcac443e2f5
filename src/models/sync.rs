use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::data_source::DataSourceType;
use super::mapping::SyncType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMethod {
    Polling,
    Realtime,
    Trigger,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(default)]
    pub records_per_second: Option<f64>,
    #[serde(default)]
    pub avg_latency_ms: Option<f64>,
    #[serde(default)]
    pub last_sync_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub sync_running: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub connection_ready: Option<bool>,
    #[serde(default)]
    pub total_records_synced: u64,
    #[serde(default, deserialize_with = "crate::models::timestamp::deserialize_optional_timestamp")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_type: Option<DataSourceType>,
    #[serde(default)]
    pub destination_type: Option<DataSourceType>,
    #[serde(default)]
    pub sync_method: Option<SyncMethod>,
    #[serde(default)]
    pub performance_metrics: Option<PerformanceMetrics>,
}

/// Single-table, single-key rule from the pre-mapping sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRule {
    pub table_name: String,
    pub primary_key: String,
    #[serde(default)]
    pub sync_type: SyncType,
    #[serde(default, deserialize_with = "crate::models::timestamp::deserialize_optional_timestamp")]
    pub last_sync: Option<DateTime<Utc>>,
}

impl SyncRule {
    pub fn new(table_name: impl Into<String>, primary_key: impl Into<String>, sync_type: SyncType) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key: primary_key.into(),
            sync_type,
            last_sync: None,
        }
    }
}
