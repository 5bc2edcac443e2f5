use std::sync::Arc;
use tracing::{error, info};

use super::builder::ConnectionConfigBuilder;
use super::typed::TypedConnectionConfig;
use crate::api::CdcBackend;
use crate::models::{
    ConfigurationSchema, ConnectionConfig, ConnectionStatus, DataSourceType, DbRole,
    LegacyConnectionConfig, TablesMap, TestResult,
};
use crate::utils::{CdcResult, ValidationError};

/// Validates connection configs locally, then tests or saves them against the backend.
pub struct ConnectionService {
    backend: Arc<dyn CdcBackend>,
}

impl ConnectionService {
    pub fn new(backend: Arc<dyn CdcBackend>) -> Self {
        Self { backend }
    }

    /// Runs every client-side check a config must pass before it is sent.
    pub fn prepare(config: &ConnectionConfig) -> Result<TypedConnectionConfig, ValidationError> {
        ConnectionConfigBuilder::validate_for_submit(config)?;
        TypedConnectionConfig::try_from(config)
    }

    pub async fn test(&self, config: &ConnectionConfig) -> CdcResult<TestResult> {
        let typed = Self::prepare(config)?;
        info!("Testing {} connection to {}", typed.source_type(), typed.redacted_target());

        let result = self.backend.test_connection_config(config).await.map_err(|e| {
            error!("Connection test for {} failed: {}", typed.redacted_target(), e);
            e
        })?;
        info!("Connection test for {} succeeded: {}", typed.redacted_target(), result.message);
        Ok(result)
    }

    pub async fn save(&self, config: &ConnectionConfig, role: DbRole) -> CdcResult<()> {
        let typed = Self::prepare(config)?;
        self.backend
            .save_connection_config(config, role)
            .await
            .map_err(|e| {
                error!("Saving {} connection {} failed: {}", role.as_str(), typed.name(), e);
                e
            })?;
        info!(
            "Saved {} connection {} ({})",
            role.as_str(),
            typed.name(),
            typed.redacted_target()
        );
        Ok(())
    }

    pub async fn test_legacy(&self, config: &LegacyConnectionConfig) -> CdcResult<TestResult> {
        validate_legacy(config)?;
        info!("Testing connection to {}:{}/{}", config.host, config.port, config.database);
        self.backend.test_connection(config).await
    }

    pub async fn save_legacy(&self, config: &LegacyConnectionConfig, role: DbRole) -> CdcResult<()> {
        validate_legacy(config)?;
        self.backend.save_connection(config, role).await?;
        info!("Saved {} connection {}", role.as_str(), config.name);
        Ok(())
    }

    pub async fn status(&self) -> CdcResult<ConnectionStatus> {
        self.backend.fetch_connection_status().await
    }

    pub async fn supported_types(&self) -> CdcResult<Vec<DataSourceType>> {
        self.backend.fetch_supported_types().await
    }

    pub async fn configuration_schema(&self, source_type: DataSourceType) -> CdcResult<ConfigurationSchema> {
        self.backend.fetch_configuration_schema(source_type).await
    }

    pub async fn tables(&self, role: DbRole) -> CdcResult<TablesMap> {
        self.backend.fetch_tables(role).await
    }
}

fn validate_legacy(config: &LegacyConnectionConfig) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    for (name, value) in [
        ("name", &config.name),
        ("host", &config.host),
        ("database", &config.database),
        ("user", &config.user),
    ] {
        if value.trim().is_empty() {
            missing.push(name.to_string());
        }
    }
    if config.port == 0 {
        missing.push("port".to_string());
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::missing_fields(missing))
    }
}
