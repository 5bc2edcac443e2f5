use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::draft::{validate_mapping, MappingDraft, SchemaSnapshot};
use crate::api::CdcBackend;
use crate::models::{DbRole, ExecuteAllResult, ExecuteMappingResult, TableMapping};
use crate::utils::CdcResult;

/// Submits mapping changes and executions, and keeps the last mapping list
/// and schema snapshot the backend reported.
pub struct MappingCoordinator {
    backend: Arc<dyn CdcBackend>,
    mappings: RwLock<Vec<TableMapping>>,
    schema: RwLock<SchemaSnapshot>,
}

impl MappingCoordinator {
    pub fn new(backend: Arc<dyn CdcBackend>) -> Self {
        Self {
            backend,
            mappings: RwLock::new(Vec::new()),
            schema: RwLock::new(SchemaSnapshot::default()),
        }
    }

    pub async fn mappings(&self) -> Vec<TableMapping> {
        self.mappings.read().await.clone()
    }

    pub async fn mapping(&self, mapping_id: &str) -> Option<TableMapping> {
        self.mappings
            .read()
            .await
            .iter()
            .find(|m| m.id.as_deref() == Some(mapping_id))
            .cloned()
    }

    pub async fn schema(&self) -> SchemaSnapshot {
        self.schema.read().await.clone()
    }

    /// Replaces the local list with the backend's. On failure the previous list stays.
    pub async fn refresh(&self) -> CdcResult<Vec<TableMapping>> {
        let mappings = self.backend.list_mappings().await?;
        debug!("Loaded {} mappings", mappings.len());
        *self.mappings.write().await = mappings.clone();
        Ok(mappings)
    }

    pub async fn load_schemas(&self) -> CdcResult<SchemaSnapshot> {
        let (source, destination) = tokio::try_join!(
            self.backend.mapping_tables(DbRole::Source),
            self.backend.mapping_tables(DbRole::Destination),
        )?;
        info!(
            "Loaded schema snapshot: {} source tables, {} destination tables",
            source.len(),
            destination.len()
        );
        let snapshot = SchemaSnapshot::new(source, destination);
        *self.schema.write().await = snapshot.clone();
        Ok(snapshot)
    }

    /// An empty draft over the most recently loaded schema snapshot.
    pub async fn new_draft(&self) -> MappingDraft {
        MappingDraft::new(self.schema().await)
    }

    pub async fn create(&self, mapping: &TableMapping) -> CdcResult<TableMapping> {
        validate_mapping(mapping)?;

        let created = self.backend.create_mapping(mapping).await.map_err(|e| {
            error!("Failed to create mapping {}: {}", mapping.name, e);
            e
        })?;
        let created = created.unwrap_or_else(|| mapping.clone());
        info!(
            "Created mapping {} ({} -> {})",
            created.name, created.source_table, created.destination_table
        );

        self.refresh_after("create").await;
        Ok(created)
    }

    /// Validates the draft against its schema snapshot, submits it and
    /// resets it on success.
    pub async fn create_from_draft(&self, draft: &mut MappingDraft) -> CdcResult<TableMapping> {
        let mapping = draft.to_mapping()?;
        let created = self.create(&mapping).await?;
        draft.reset();
        Ok(created)
    }

    pub async fn update(&self, mapping_id: &str, mapping: &TableMapping) -> CdcResult<()> {
        validate_mapping(mapping)?;
        self.backend.update_mapping(mapping_id, mapping).await.map_err(|e| {
            error!("Failed to update mapping {}: {}", mapping_id, e);
            e
        })?;
        info!("Updated mapping {}", mapping_id);
        self.refresh_after("update").await;
        Ok(())
    }

    pub async fn execute(&self, mapping_id: &str) -> CdcResult<ExecuteMappingResult> {
        let result = self.backend.execute_mapping(mapping_id).await.map_err(|e| {
            error!("Failed to execute mapping {}: {}", mapping_id, e);
            e
        })?;
        info!("Mapping {} synced {} records", mapping_id, result.synced_records);
        self.refresh_after("execute").await;
        Ok(result)
    }

    /// Runs every enabled mapping. Per-mapping failures stay inside the result.
    pub async fn execute_all(&self) -> CdcResult<ExecuteAllResult> {
        let result = self.backend.execute_all_mappings().await.map_err(|e| {
            error!("Failed to execute mappings: {}", e);
            e
        })?;
        info!(
            "Executed {} mappings, {} records synced",
            result.total_mappings, result.synced_records
        );
        for failed in result.failed() {
            warn!(
                "Mapping {} failed during execute-all: {}",
                failed
                    .mapping_name
                    .as_deref()
                    .or(failed.mapping_id.as_deref())
                    .unwrap_or("<unknown>"),
                failed.message.as_deref().unwrap_or("no message")
            );
        }
        self.refresh_after("execute-all").await;
        Ok(result)
    }

    /// Always issues the request; repeating it after success is harmless.
    pub async fn toggle_enabled(&self, mapping_id: &str, enabled: bool) -> CdcResult<()> {
        self.backend.set_mapping_enabled(mapping_id, enabled).await.map_err(|e| {
            error!("Failed to toggle mapping {}: {}", mapping_id, e);
            e
        })?;

        {
            let mut mappings = self.mappings.write().await;
            if let Some(local) = mappings.iter_mut().find(|m| m.id.as_deref() == Some(mapping_id)) {
                local.enabled = enabled;
            }
        }
        info!(
            "Mapping {} {}",
            mapping_id,
            if enabled { "enabled" } else { "disabled" }
        );
        self.refresh_after("toggle").await;
        Ok(())
    }

    /// Deleting a mapping the backend no longer knows is not an error.
    pub async fn delete(&self, mapping_id: &str) -> CdcResult<()> {
        match self.backend.delete_mapping(mapping_id).await {
            Ok(()) => info!("Deleted mapping {}", mapping_id),
            Err(e) if e.is_not_found() => debug!("Mapping {} was already deleted", mapping_id),
            Err(e) => {
                error!("Failed to delete mapping {}: {}", mapping_id, e);
                return Err(e);
            }
        }

        self.mappings
            .write()
            .await
            .retain(|m| m.id.as_deref() != Some(mapping_id));
        self.refresh_after("delete").await;
        Ok(())
    }

    async fn refresh_after(&self, action: &str) {
        if let Err(e) = self.refresh().await {
            warn!("Could not reload mappings after {}: {}", action, e);
        }
    }
}
