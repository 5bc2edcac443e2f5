#![allow(dead_code)]

use async_trait::async_trait;
use cdc_control_plane::models::*;
use cdc_control_plane::{CdcBackend, CdcError, CdcResult};
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory backend that records every call it receives.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<HashMap<&'static str, usize>>,
    next_id: AtomicUsize,
    pub mappings: Mutex<Vec<TableMapping>>,
    pub source_tables: Vec<TableInfo>,
    pub destination_tables: Vec<TableInfo>,
    pub progress_script: Mutex<VecDeque<CdcResult<BulkTransferProgress>>>,
    pub last_progress: Mutex<Option<BulkTransferProgress>>,
    pub connection_status: Mutex<ConnectionStatus>,
    pub sync_status: Mutex<SyncStatus>,
    pub rules: Mutex<Vec<SyncRule>>,
    pub fail_status: AtomicBool,
    pub reject_create: Mutex<Option<String>>,
    pub reject_start: Mutex<Option<String>>,
    pub fail_rules: AtomicBool,
}

impl MockBackend {
    pub fn with_schema(source_tables: Vec<TableInfo>, destination_tables: Vec<TableInfo>) -> Self {
        Self {
            source_tables,
            destination_tables,
            ..Default::default()
        }
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn script_progress(&self, responses: Vec<CdcResult<BulkTransferProgress>>) {
        self.progress_script.lock().unwrap().extend(responses);
    }

    fn record(&self, name: &'static str) {
        *self.calls.lock().unwrap().entry(name).or_insert(0) += 1;
    }

    fn status_failure(&self) -> CdcResult<()> {
        if self.fail_status.load(Ordering::SeqCst) {
            Err(CdcError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

pub fn progress(id: &str, status: TransferStatus, completed: u32, total: u32) -> BulkTransferProgress {
    BulkTransferProgress {
        transfer_id: id.to_string(),
        status,
        total_tables: total,
        completed_tables: completed,
        current_table: None,
        current_operation: None,
        total_records: None,
        transferred_records: None,
        start_time: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        end_time: None,
        errors: Vec::new(),
        table_progress: Vec::new(),
    }
}

pub fn connected() -> ConnectionStatus {
    let side = SingleConnectionStatus {
        connected: true,
        ..Default::default()
    };
    ConnectionStatus {
        source: Some(side.clone()),
        destination: Some(side),
        ..Default::default()
    }
}

fn not_found(what: &str) -> CdcError {
    CdcError::request(Some(404), format!("{} not found", what))
}

#[async_trait]
impl CdcBackend for MockBackend {
    async fn fetch_connection_status(&self) -> CdcResult<ConnectionStatus> {
        self.record("fetch_connection_status");
        self.status_failure()?;
        Ok(self.connection_status.lock().unwrap().clone())
    }

    async fn test_connection(&self, _config: &LegacyConnectionConfig) -> CdcResult<TestResult> {
        self.record("test_connection");
        Ok(TestResult {
            success: true,
            message: "Connection successful".into(),
            metadata: None,
        })
    }

    async fn save_connection(&self, _config: &LegacyConnectionConfig, _role: DbRole) -> CdcResult<()> {
        self.record("save_connection");
        Ok(())
    }

    async fn test_connection_config(&self, _config: &ConnectionConfig) -> CdcResult<TestResult> {
        self.record("test_connection_config");
        Ok(TestResult {
            success: true,
            message: "Connection successful".into(),
            metadata: None,
        })
    }

    async fn save_connection_config(&self, _config: &ConnectionConfig, _role: DbRole) -> CdcResult<()> {
        self.record("save_connection_config");
        Ok(())
    }

    async fn fetch_supported_types(&self) -> CdcResult<Vec<DataSourceType>> {
        self.record("fetch_supported_types");
        Ok(DataSourceType::ALL.to_vec())
    }

    async fn fetch_configuration_schema(&self, _source_type: DataSourceType) -> CdcResult<ConfigurationSchema> {
        self.record("fetch_configuration_schema");
        Ok(ConfigurationSchema {
            required: vec!["host".into()],
            optional: Vec::new(),
            properties: Default::default(),
        })
    }

    async fn fetch_tables(&self, role: DbRole) -> CdcResult<TablesMap> {
        self.record("fetch_tables");
        let tables = match role {
            DbRole::Source => &self.source_tables,
            DbRole::Destination => &self.destination_tables,
        };
        Ok(tables
            .iter()
            .map(|t| (t.table_name.clone(), t.columns.clone()))
            .collect())
    }

    async fn fetch_sync_status(&self) -> CdcResult<SyncStatus> {
        self.record("fetch_sync_status");
        self.status_failure()?;
        Ok(self.sync_status.lock().unwrap().clone())
    }

    async fn start_sync(&self) -> CdcResult<Option<String>> {
        self.record("start_sync");
        self.sync_status.lock().unwrap().sync_running = true;
        Ok(Some("Sync started".into()))
    }

    async fn fetch_sync_rules(&self) -> CdcResult<Vec<SyncRule>> {
        self.record("fetch_sync_rules");
        if self.fail_rules.load(Ordering::SeqCst) {
            return Err(CdcError::Transport("connection reset".into()));
        }
        Ok(self.rules.lock().unwrap().clone())
    }

    async fn add_sync_rule(&self, rule: &SyncRule) -> CdcResult<()> {
        self.record("add_sync_rule");
        self.rules.lock().unwrap().push(rule.clone());
        Ok(())
    }

    async fn delete_sync_rule(&self, table_name: &str) -> CdcResult<()> {
        self.record("delete_sync_rule");
        let mut rules = self.rules.lock().unwrap();
        let before = rules.len();
        rules.retain(|r| r.table_name != table_name);
        if rules.len() == before {
            return Err(not_found("Sync rule"));
        }
        Ok(())
    }

    async fn list_mappings(&self) -> CdcResult<Vec<TableMapping>> {
        self.record("list_mappings");
        Ok(self.mappings.lock().unwrap().clone())
    }

    async fn create_mapping(&self, mapping: &TableMapping) -> CdcResult<Option<TableMapping>> {
        self.record("create_mapping");
        if let Some(message) = self.reject_create.lock().unwrap().clone() {
            return Err(CdcError::request(Some(400), message));
        }
        let mut created = mapping.clone();
        created.id = Some(format!("m-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1));
        self.mappings.lock().unwrap().push(created.clone());
        Ok(Some(created))
    }

    async fn update_mapping(&self, mapping_id: &str, mapping: &TableMapping) -> CdcResult<()> {
        self.record("update_mapping");
        let mut mappings = self.mappings.lock().unwrap();
        let existing = mappings
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(mapping_id))
            .ok_or_else(|| not_found("Mapping"))?;
        *existing = TableMapping {
            id: existing.id.clone(),
            ..mapping.clone()
        };
        Ok(())
    }

    async fn set_mapping_enabled(&self, mapping_id: &str, enabled: bool) -> CdcResult<()> {
        self.record("set_mapping_enabled");
        let mut mappings = self.mappings.lock().unwrap();
        let existing = mappings
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(mapping_id))
            .ok_or_else(|| not_found("Mapping"))?;
        existing.enabled = enabled;
        Ok(())
    }

    async fn delete_mapping(&self, mapping_id: &str) -> CdcResult<()> {
        self.record("delete_mapping");
        let mut mappings = self.mappings.lock().unwrap();
        let before = mappings.len();
        mappings.retain(|m| m.id.as_deref() != Some(mapping_id));
        if mappings.len() == before {
            return Err(not_found("Mapping"));
        }
        Ok(())
    }

    async fn execute_mapping(&self, mapping_id: &str) -> CdcResult<ExecuteMappingResult> {
        self.record("execute_mapping");
        let mut mappings = self.mappings.lock().unwrap();
        let existing = mappings
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(mapping_id))
            .ok_or_else(|| not_found("Mapping"))?;
        existing.last_sync = Some(Utc::now());
        Ok(ExecuteMappingResult {
            synced_records: 42,
            message: None,
        })
    }

    async fn execute_all_mappings(&self) -> CdcResult<ExecuteAllResult> {
        self.record("execute_all_mappings");
        let mappings = self.mappings.lock().unwrap();
        let enabled: Vec<_> = mappings.iter().filter(|m| m.enabled).collect();
        Ok(ExecuteAllResult {
            total_mappings: enabled.len() as u64,
            synced_records: 42 * enabled.len() as u64,
            results: enabled
                .iter()
                .map(|m| MappingRunOutcome {
                    mapping_id: m.id.clone(),
                    mapping_name: Some(m.name.clone()),
                    success: true,
                    synced_records: 42,
                    message: None,
                })
                .collect(),
        })
    }

    async fn mapping_tables(&self, role: DbRole) -> CdcResult<Vec<TableInfo>> {
        self.record("mapping_tables");
        Ok(match role {
            DbRole::Source => self.source_tables.clone(),
            DbRole::Destination => self.destination_tables.clone(),
        })
    }

    async fn bulk_source_tables(&self) -> CdcResult<Vec<SourceTableInfo>> {
        self.record("bulk_source_tables");
        Ok(self
            .source_tables
            .iter()
            .map(|t| SourceTableInfo {
                table_name: t.table_name.clone(),
                column_count: t.columns.len() as u32,
                row_count: 100,
            })
            .collect())
    }

    async fn check_destination_tables(&self, tables: &[String]) -> CdcResult<Vec<DestinationTableStatus>> {
        self.record("check_destination_tables");
        Ok(tables
            .iter()
            .map(|name| DestinationTableStatus {
                table_name: name.clone(),
                exists: self.destination_tables.iter().any(|t| &t.table_name == name),
                row_count: None,
            })
            .collect())
    }

    async fn start_bulk_transfer(&self, _request: &BulkTransferRequest) -> CdcResult<String> {
        self.record("start_bulk_transfer");
        if let Some(message) = self.reject_start.lock().unwrap().clone() {
            return Err(CdcError::request(Some(503), message));
        }
        Ok("transfer-1".into())
    }

    async fn bulk_transfer_progress(&self, _transfer_id: &str) -> CdcResult<BulkTransferProgress> {
        self.record("bulk_transfer_progress");
        let next = self.progress_script.lock().unwrap().pop_front();
        match next {
            Some(Ok(snapshot)) => {
                *self.last_progress.lock().unwrap() = Some(snapshot.clone());
                Ok(snapshot)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last_progress
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| not_found("Transfer")),
        }
    }
}
