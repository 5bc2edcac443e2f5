use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::data_source::{DataSourceCapabilities, DataSourceType, FieldValue};

/// Which side of the pipeline a connection or table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbRole {
    Source,
    Destination,
}

impl DbRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbRole::Source => "source",
            DbRole::Destination => "destination",
        }
    }

    /// Path segment used when saving a typed connection config.
    pub fn config_endpoint(&self) -> &'static str {
        match self {
            DbRole::Source => "source-config",
            DbRole::Destination => "destination-config",
        }
    }
}

/// SSH tunnel settings. Every field is optional so a partially filled form
/// round-trips without invented values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_port: Option<u16>,
}

impl TunnelConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelField {
    Enabled,
    SshHost,
    SshPort,
    SshUser,
    SshPrivateKey,
    SshPassword,
    LocalPort,
    RemoteHost,
    RemotePort,
}

impl TunnelField {
    pub fn from_key(key: &str) -> Option<Self> {
        let field = match key {
            "enabled" => TunnelField::Enabled,
            "sshHost" => TunnelField::SshHost,
            "sshPort" => TunnelField::SshPort,
            "sshUser" => TunnelField::SshUser,
            "sshPrivateKey" => TunnelField::SshPrivateKey,
            "sshPassword" => TunnelField::SshPassword,
            "localPort" => TunnelField::LocalPort,
            "remoteHost" => TunnelField::RemoteHost,
            "remotePort" => TunnelField::RemotePort,
            _ => return None,
        };
        Some(field)
    }
}

/// A connection configuration as edited in the form.
///
/// `type` and `name` are always present; the remaining top-level keys are the
/// ones declared by the registry entry for `source_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<TunnelConfig>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl ConnectionConfig {
    pub fn new(source_type: DataSourceType, name: impl Into<String>) -> Self {
        Self {
            source_type,
            name: name.into(),
            tunnel: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(|v| v.as_bool())
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(|v| v.as_i64())
    }
}

/// Single-pair connection settings from the simple PostgreSQL form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyConnectionConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerMetadata {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub server_info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleConnectionStatus {
    pub connected: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "crate::models::timestamp::deserialize_optional_timestamp")]
    pub last_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub adapter_type: Option<DataSourceType>,
    #[serde(default)]
    pub capabilities: Option<DataSourceCapabilities>,
    #[serde(default)]
    pub metadata: Option<ServerMetadata>,
}

/// Connection config as echoed back by the backend, password masked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicConnectionConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub source_type: Option<DataSourceType>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    #[serde(default)]
    pub source: Option<SingleConnectionStatus>,
    #[serde(default)]
    pub destination: Option<SingleConnectionStatus>,
    #[serde(default)]
    pub source_config: Option<PublicConnectionConfig>,
    #[serde(default)]
    pub dest_config: Option<PublicConnectionConfig>,
}

impl ConnectionStatus {
    pub fn is_connected(&self, role: DbRole) -> bool {
        let side = match role {
            DbRole::Source => &self.source,
            DbRole::Destination => &self.destination,
        };
        side.as_ref().map(|s| s.connected).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestMetadata {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub server_info: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub metadata: Option<TestMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(rename = "enum", default)]
    pub allowed: Option<Vec<String>>,
}

/// Server-side description of what a data source type expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSchema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_config_wire_shape() {
        let mut config = ConnectionConfig::new(DataSourceType::AwsRdsPostgres, "Warehouse");
        config.fields.insert("host".into(), FieldValue::from("db.example.com"));
        config.fields.insert("port".into(), FieldValue::Integer(5432));
        config.tunnel = Some(TunnelConfig {
            ssh_port: Some(2222),
            ..Default::default()
        });

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "aws_rds_postgres",
                "name": "Warehouse",
                "host": "db.example.com",
                "port": 5432,
                "tunnel": { "sshPort": 2222 }
            })
        );

        let back: ConnectionConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_connection_status_tolerates_missing_sides() {
        let status: ConnectionStatus = serde_json::from_value(json!({
            "source": { "connected": true, "adapter_type": "postgresql" }
        }))
        .unwrap();
        assert!(status.is_connected(DbRole::Source));
        assert!(!status.is_connected(DbRole::Destination));
    }
}
