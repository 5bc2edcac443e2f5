use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::poller::SyncStatusPoller;
use crate::api::CdcBackend;
use crate::models::{SyncRule, TablesMap};
use crate::utils::{CdcResult, ValidationError};

const FALLBACK_KEY_CANDIDATES: [&str; 4] = ["id", "user_id", "pk", "primary_key"];

/// Legacy sync engine actions: starting a sync and managing per-table rules.
pub struct SyncRuleService {
    backend: Arc<dyn CdcBackend>,
    status: Arc<SyncStatusPoller>,
}

impl SyncRuleService {
    pub fn new(backend: Arc<dyn CdcBackend>, status: Arc<SyncStatusPoller>) -> Self {
        Self { backend, status }
    }

    /// Starts the legacy sync once both sides are connected. Returns the
    /// backend's message, if any.
    pub async fn start_sync(&self) -> CdcResult<Option<String>> {
        let mut dashboard = self.status.snapshot().await;
        if dashboard.connection_status.is_none() {
            dashboard = self.status.refresh().await?;
        }
        if !dashboard.both_connected() {
            return Err(ValidationError::new(
                "Both source and destination connections must be established before syncing.",
            )
            .into());
        }

        let result = self.backend.start_sync().await;
        if let Err(e) = self.status.refresh().await {
            debug!("Status refresh after starting sync failed: {}", e);
        }

        match result {
            Ok(message) => {
                info!("Sync started{}", message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default());
                Ok(message)
            }
            Err(e) => {
                error!("Failed to start sync: {}", e);
                Err(e)
            }
        }
    }

    pub async fn add_rule(&self, rule: &SyncRule) -> CdcResult<Vec<SyncRule>> {
        let mut missing = Vec::new();
        if rule.table_name.trim().is_empty() {
            missing.push("table_name".to_string());
        }
        if rule.primary_key.trim().is_empty() {
            missing.push("primary_key".to_string());
        }
        if !missing.is_empty() {
            return Err(ValidationError::missing_fields(missing).into());
        }

        self.backend.add_sync_rule(rule).await?;
        info!("Added sync rule for {} keyed on {}", rule.table_name, rule.primary_key);
        Ok(self.rules_after("add").await)
    }

    /// Removing a rule that is already gone counts as success.
    pub async fn delete_rule(&self, table_name: &str) -> CdcResult<Vec<SyncRule>> {
        match self.backend.delete_sync_rule(table_name).await {
            Ok(()) => info!("Deleted sync rule for {}", table_name),
            Err(e) if e.is_not_found() => warn!("Sync rule for {} was already deleted", table_name),
            Err(e) => return Err(e),
        }
        Ok(self.rules_after("delete").await)
    }

    /// Reloads rules once the backend accepted a change. A failed reload keeps
    /// the previously known rules.
    async fn rules_after(&self, action: &str) -> Vec<SyncRule> {
        match self.status.refresh_rules().await {
            Ok(rules) => rules,
            Err(e) => {
                warn!("Could not reload sync rules after {}: {}", action, e);
                self.status.snapshot().await.rules.unwrap_or_default()
            }
        }
    }

    /// Columns worth offering as the key of a rule for `table`.
    pub fn primary_key_candidates(tables: &TablesMap, table: &str) -> Vec<String> {
        let Some(columns) = tables.get(table) else {
            return FALLBACK_KEY_CANDIDATES.iter().map(|c| c.to_string()).collect();
        };

        let likely: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary_key || c.column_name.to_lowercase().contains("id"))
            .map(|c| c.column_name.clone())
            .collect();
        if likely.is_empty() {
            columns.iter().map(|c| c.column_name.clone()).collect()
        } else {
            likely
        }
    }
}
