use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::envelope;
use crate::models::{
    BulkTransferProgress, BulkTransferRequest, ConfigurationSchema, ConnectionConfig,
    ConnectionStatus, DataSourceType, DbRole, DestinationTableStatus, ExecuteAllResult,
    ExecuteMappingResult, LegacyConnectionConfig, SourceTableInfo, SyncRule, SyncStatus,
    TableInfo, TableMapping, TablesMap, TestResult,
};
use crate::utils::CdcResult;

/// Every call the control plane makes against the pipeline backend.
#[async_trait]
pub trait CdcBackend: Send + Sync {
    // Connections
    async fn fetch_connection_status(&self) -> CdcResult<ConnectionStatus>;
    async fn test_connection(&self, config: &LegacyConnectionConfig) -> CdcResult<TestResult>;
    async fn save_connection(&self, config: &LegacyConnectionConfig, role: DbRole) -> CdcResult<()>;
    async fn test_connection_config(&self, config: &ConnectionConfig) -> CdcResult<TestResult>;
    async fn save_connection_config(&self, config: &ConnectionConfig, role: DbRole) -> CdcResult<()>;
    async fn fetch_supported_types(&self) -> CdcResult<Vec<DataSourceType>>;
    async fn fetch_configuration_schema(&self, source_type: DataSourceType) -> CdcResult<ConfigurationSchema>;
    async fn fetch_tables(&self, role: DbRole) -> CdcResult<TablesMap>;

    // Legacy sync engine
    async fn fetch_sync_status(&self) -> CdcResult<SyncStatus>;
    async fn start_sync(&self) -> CdcResult<Option<String>>;
    async fn fetch_sync_rules(&self) -> CdcResult<Vec<SyncRule>>;
    async fn add_sync_rule(&self, rule: &SyncRule) -> CdcResult<()>;
    async fn delete_sync_rule(&self, table_name: &str) -> CdcResult<()>;

    // Mappings
    async fn list_mappings(&self) -> CdcResult<Vec<TableMapping>>;
    async fn create_mapping(&self, mapping: &TableMapping) -> CdcResult<Option<TableMapping>>;
    async fn update_mapping(&self, mapping_id: &str, mapping: &TableMapping) -> CdcResult<()>;
    async fn set_mapping_enabled(&self, mapping_id: &str, enabled: bool) -> CdcResult<()>;
    async fn delete_mapping(&self, mapping_id: &str) -> CdcResult<()>;
    async fn execute_mapping(&self, mapping_id: &str) -> CdcResult<ExecuteMappingResult>;
    async fn execute_all_mappings(&self) -> CdcResult<ExecuteAllResult>;
    async fn mapping_tables(&self, role: DbRole) -> CdcResult<Vec<TableInfo>>;

    // Bulk transfer
    async fn bulk_source_tables(&self) -> CdcResult<Vec<SourceTableInfo>>;
    async fn check_destination_tables(&self, tables: &[String]) -> CdcResult<Vec<DestinationTableStatus>>;
    async fn start_bulk_transfer(&self, request: &BulkTransferRequest) -> CdcResult<String>;
    async fn bulk_transfer_progress(&self, transfer_id: &str) -> CdcResult<BulkTransferProgress>;
}

/// [`CdcBackend`] over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &Url) -> Self {
        Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    async fn send(&self, request: RequestBuilder, fallback: &str) -> CdcResult<Value> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Backend responded with HTTP {} ({} bytes)", status, body.len());
        envelope::interpret(status, &body, fallback)
    }
}

fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[async_trait]
impl CdcBackend for HttpBackend {
    async fn fetch_connection_status(&self) -> CdcResult<ConnectionStatus> {
        let body = self
            .send(self.request(Method::GET, "connections/status"), "Failed to fetch connection status")
            .await?;
        envelope::whole(body)
    }

    async fn test_connection(&self, config: &LegacyConnectionConfig) -> CdcResult<TestResult> {
        let body = self
            .send(
                self.request(Method::POST, "connections/test").json(config),
                "Connection test failed",
            )
            .await?;
        envelope::whole(body)
    }

    async fn save_connection(&self, config: &LegacyConnectionConfig, role: DbRole) -> CdcResult<()> {
        self.send(
            self.request(Method::POST, &format!("connections/{}", role.as_str())).json(config),
            "Failed to save connection",
        )
        .await?;
        Ok(())
    }

    async fn test_connection_config(&self, config: &ConnectionConfig) -> CdcResult<TestResult> {
        let body = self
            .send(
                self.request(Method::POST, "connections/test-config").json(config),
                "Connection test failed",
            )
            .await?;
        envelope::whole(body)
    }

    async fn save_connection_config(&self, config: &ConnectionConfig, role: DbRole) -> CdcResult<()> {
        self.send(
            self.request(Method::POST, &format!("connections/{}", role.config_endpoint()))
                .json(config),
            "Failed to save connection",
        )
        .await?;
        Ok(())
    }

    async fn fetch_supported_types(&self) -> CdcResult<Vec<DataSourceType>> {
        let body = self
            .send(
                self.request(Method::GET, "connections/supported-types"),
                "Failed to fetch supported data sources",
            )
            .await?;
        envelope::field(&body, "supported_types")
    }

    async fn fetch_configuration_schema(&self, source_type: DataSourceType) -> CdcResult<ConfigurationSchema> {
        let body = self
            .send(
                self.request(Method::GET, &format!("connections/schema/{}", source_type.as_str())),
                "Failed to fetch configuration schema",
            )
            .await?;
        envelope::field(&body, "schema")
    }

    async fn fetch_tables(&self, role: DbRole) -> CdcResult<TablesMap> {
        let body = self
            .send(
                self.request(Method::GET, "tables").query(&[("type", role.as_str())]),
                "Failed to fetch tables",
            )
            .await?;
        envelope::whole(body)
    }

    async fn fetch_sync_status(&self) -> CdcResult<SyncStatus> {
        let body = self
            .send(self.request(Method::GET, "sync/status"), "Failed to fetch sync status")
            .await?;
        envelope::whole(body)
    }

    async fn start_sync(&self) -> CdcResult<Option<String>> {
        let body = self
            .send(self.request(Method::POST, "sync/start"), "Failed to start sync")
            .await?;
        Ok(envelope::backend_message(&body))
    }

    async fn fetch_sync_rules(&self) -> CdcResult<Vec<SyncRule>> {
        let body = self
            .send(self.request(Method::GET, "sync/rules"), "Failed to fetch sync rules")
            .await?;
        envelope::whole(body)
    }

    async fn add_sync_rule(&self, rule: &SyncRule) -> CdcResult<()> {
        self.send(
            self.request(Method::POST, "sync/rules").json(rule),
            "Failed to add sync rule",
        )
        .await?;
        Ok(())
    }

    async fn delete_sync_rule(&self, table_name: &str) -> CdcResult<()> {
        self.send(
            self.request(Method::DELETE, &format!("sync/rules/{}", segment(table_name))),
            "Failed to delete rule",
        )
        .await?;
        Ok(())
    }

    async fn list_mappings(&self) -> CdcResult<Vec<TableMapping>> {
        let body = self
            .send(self.request(Method::GET, "mappings"), "Failed to load mappings")
            .await?;
        envelope::field(&body, "mappings")
    }

    async fn create_mapping(&self, mapping: &TableMapping) -> CdcResult<Option<TableMapping>> {
        let body = self
            .send(
                self.request(Method::POST, "mappings").json(mapping),
                "Failed to create mapping",
            )
            .await?;
        envelope::optional_field(&body, "mapping")
    }

    async fn update_mapping(&self, mapping_id: &str, mapping: &TableMapping) -> CdcResult<()> {
        self.send(
            self.request(Method::PUT, &format!("mappings/{}", segment(mapping_id))).json(mapping),
            "Failed to update mapping",
        )
        .await?;
        Ok(())
    }

    async fn set_mapping_enabled(&self, mapping_id: &str, enabled: bool) -> CdcResult<()> {
        self.send(
            self.request(Method::PUT, &format!("mappings/{}", segment(mapping_id)))
                .json(&json!({ "enabled": enabled })),
            "Failed to update mapping",
        )
        .await?;
        Ok(())
    }

    async fn delete_mapping(&self, mapping_id: &str) -> CdcResult<()> {
        self.send(
            self.request(Method::DELETE, &format!("mappings/{}", segment(mapping_id))),
            "Failed to delete mapping",
        )
        .await?;
        Ok(())
    }

    async fn execute_mapping(&self, mapping_id: &str) -> CdcResult<ExecuteMappingResult> {
        let body = self
            .send(
                self.request(Method::POST, &format!("mappings/{}/execute", segment(mapping_id))),
                "Failed to execute mapping",
            )
            .await?;
        envelope::whole(body)
    }

    async fn execute_all_mappings(&self) -> CdcResult<ExecuteAllResult> {
        let body = self
            .send(
                self.request(Method::POST, "mappings/execute-all"),
                "Failed to execute mappings",
            )
            .await?;
        envelope::whole(body)
    }

    async fn mapping_tables(&self, role: DbRole) -> CdcResult<Vec<TableInfo>> {
        let fallback = match role {
            DbRole::Source => "Failed to load source tables",
            DbRole::Destination => "Failed to load destination tables",
        };
        let body = self
            .send(
                self.request(Method::GET, &format!("mappings/{}/tables", role.as_str())),
                fallback,
            )
            .await?;
        envelope::field(&body, "tables")
    }

    async fn bulk_source_tables(&self) -> CdcResult<Vec<SourceTableInfo>> {
        let body = self
            .send(
                self.request(Method::GET, "bulk-transfer/source-tables"),
                "Failed to load source tables",
            )
            .await?;
        envelope::field(&body, "tables")
    }

    async fn check_destination_tables(&self, tables: &[String]) -> CdcResult<Vec<DestinationTableStatus>> {
        let body = self
            .send(
                self.request(Method::POST, "bulk-transfer/check-destination")
                    .json(&json!({ "tables": tables })),
                "Failed to check destination tables",
            )
            .await?;
        envelope::field(&body, "table_status")
    }

    async fn start_bulk_transfer(&self, request: &BulkTransferRequest) -> CdcResult<String> {
        let body = self
            .send(
                self.request(Method::POST, "bulk-transfer/start").json(request),
                "Failed to start bulk transfer",
            )
            .await?;
        envelope::field(&body, "transfer_id")
    }

    async fn bulk_transfer_progress(&self, transfer_id: &str) -> CdcResult<BulkTransferProgress> {
        let body = self
            .send(
                self.request(
                    Method::GET,
                    &format!("bulk-transfer/progress/{}", segment(transfer_id)),
                ),
                "Failed to fetch transfer progress",
            )
            .await?;
        envelope::field(&body, "progress")
    }
}
