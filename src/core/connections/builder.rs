use crate::core::datasources::DataSourceRegistry;
use crate::models::{
    ConnectionConfig, DataSourceType, FieldValue, FormField, TunnelConfig, TunnelField,
};
use crate::utils::{CdcResult, ValidationError};

/// A form field name resolved against the shape of [`ConnectionConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    Name,
    Root(String),
    Tunnel(TunnelField),
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.split_once('.') {
            Some(("tunnel", key)) => TunnelField::from_key(key)
                .map(FieldPath::Tunnel)
                .ok_or_else(|| ValidationError::for_field(raw, format!("Unknown tunnel setting: {}", key))),
            Some((group, _)) => Err(ValidationError::for_field(
                raw,
                format!("Unknown field group: {}", group),
            )),
            None => match raw {
                "" => Err(ValidationError::new("Field name cannot be empty")),
                "type" => Err(ValidationError::for_field(
                    "type",
                    "The data source type cannot be changed on an existing config",
                )),
                "name" => Ok(FieldPath::Name),
                other => Ok(FieldPath::Root(other.to_string())),
            },
        }
    }
}

/// Builds and validates connection configs from registry field definitions.
pub struct ConnectionConfigBuilder;

impl ConnectionConfigBuilder {
    /// A config named after the type with every declared default applied.
    pub fn create_default(source_type: DataSourceType) -> ConnectionConfig {
        let info = DataSourceRegistry::get(source_type);
        let mut config = ConnectionConfig::new(source_type, format!("{} Connection", info.name));

        for field in &info.config_fields {
            let Some(default) = &field.default_value else {
                continue;
            };
            if let Err(e) = FieldPath::parse(field.name)
                .and_then(|path| assign(&mut config, &path, default.clone()))
            {
                tracing::warn!("Skipping default for {}.{}: {}", source_type, field.name, e);
            }
        }

        config
    }

    /// Returns a new config with one leaf overwritten; `config` is left as it was.
    pub fn set_field(
        config: &ConnectionConfig,
        field_name: &str,
        value: impl Into<FieldValue>,
    ) -> CdcResult<ConnectionConfig> {
        let path = FieldPath::parse(field_name)?;
        let mut next = config.clone();
        assign(&mut next, &path, value.into())?;
        Ok(next)
    }

    /// Reads a field, yielding [`FieldValue::empty`] for anything not set.
    pub fn get_field(config: &ConnectionConfig, field_name: &str) -> FieldValue {
        let resolved = match FieldPath::parse(field_name) {
            Ok(FieldPath::Name) => Some(FieldValue::Text(config.name.clone())),
            Ok(FieldPath::Root(key)) => config.fields.get(&key).cloned(),
            Ok(FieldPath::Tunnel(field)) => config.tunnel.as_ref().and_then(|t| read_tunnel(t, field)),
            Err(_) if field_name == "type" => Some(FieldValue::from(config.source_type.as_str())),
            Err(_) => None,
        };
        resolved.unwrap_or_else(FieldValue::empty)
    }

    pub fn should_show(field: &FormField, config: &ConnectionConfig) -> bool {
        match field.depends_on {
            None => true,
            Some(governing) => Self::get_field(config, governing).is_truthy(),
        }
    }

    /// Fields of the config's type that are currently visible.
    pub fn visible_fields(config: &ConnectionConfig) -> Vec<&'static FormField> {
        DataSourceRegistry::get(config.source_type)
            .config_fields
            .iter()
            .filter(|field| Self::should_show(field, config))
            .collect()
    }

    pub fn validate_for_submit(config: &ConnectionConfig) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if config.name.trim().is_empty() {
            missing.push("name".to_string());
        }
        missing.extend(
            Self::visible_fields(config)
                .into_iter()
                .filter(|field| field.required && Self::get_field(config, field.name).is_blank())
                .map(|field| field.name.to_string()),
        );

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::missing_fields(missing))
        }
    }
}

fn assign(config: &mut ConnectionConfig, path: &FieldPath, value: FieldValue) -> Result<(), ValidationError> {
    match path {
        FieldPath::Name => match value {
            FieldValue::Text(name) => config.name = name,
            _ => return Err(ValidationError::for_field("name", "Connection name must be text")),
        },
        FieldPath::Root(key) => {
            config.fields.insert(key.clone(), value);
        }
        FieldPath::Tunnel(field) => {
            let tunnel = config.tunnel.get_or_insert_with(TunnelConfig::default);
            write_tunnel(tunnel, *field, value)?;
        }
    }
    Ok(())
}

fn read_tunnel(tunnel: &TunnelConfig, field: TunnelField) -> Option<FieldValue> {
    match field {
        TunnelField::Enabled => tunnel.enabled.map(FieldValue::Bool),
        TunnelField::SshHost => tunnel.ssh_host.clone().map(FieldValue::Text),
        TunnelField::SshPort => tunnel.ssh_port.map(FieldValue::from),
        TunnelField::SshUser => tunnel.ssh_user.clone().map(FieldValue::Text),
        TunnelField::SshPrivateKey => tunnel.ssh_private_key.clone().map(FieldValue::Text),
        TunnelField::SshPassword => tunnel.ssh_password.clone().map(FieldValue::Text),
        TunnelField::LocalPort => tunnel.local_port.map(FieldValue::from),
        TunnelField::RemoteHost => tunnel.remote_host.clone().map(FieldValue::Text),
        TunnelField::RemotePort => tunnel.remote_port.map(FieldValue::from),
    }
}

fn write_tunnel(tunnel: &mut TunnelConfig, field: TunnelField, value: FieldValue) -> Result<(), ValidationError> {
    match field {
        TunnelField::Enabled => tunnel.enabled = as_flag(value, "tunnel.enabled")?,
        TunnelField::SshHost => tunnel.ssh_host = as_text(value),
        TunnelField::SshPort => tunnel.ssh_port = as_port(value, "tunnel.sshPort")?,
        TunnelField::SshUser => tunnel.ssh_user = as_text(value),
        TunnelField::SshPrivateKey => tunnel.ssh_private_key = as_text(value),
        TunnelField::SshPassword => tunnel.ssh_password = as_text(value),
        TunnelField::LocalPort => tunnel.local_port = as_port(value, "tunnel.localPort")?,
        TunnelField::RemoteHost => tunnel.remote_host = as_text(value),
        TunnelField::RemotePort => tunnel.remote_port = as_port(value, "tunnel.remotePort")?,
    }
    Ok(())
}

fn as_text(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        FieldValue::Text(s) => Some(s),
        FieldValue::Bool(b) => Some(b.to_string()),
        FieldValue::Integer(n) => Some(n.to_string()),
        FieldValue::Float(n) => Some(n.to_string()),
    }
}

fn as_flag(value: FieldValue, name: &str) -> Result<Option<bool>, ValidationError> {
    if value == FieldValue::Null {
        return Ok(None);
    }
    value
        .as_bool()
        .map(Some)
        .ok_or_else(|| ValidationError::for_field(name, format!("{} must be true or false", name)))
}

fn as_port(value: FieldValue, name: &str) -> Result<Option<u16>, ValidationError> {
    if value == FieldValue::Null || value.is_blank() {
        return Ok(None);
    }
    value
        .as_i64()
        .and_then(|n| u16::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| ValidationError::for_field(name, format!("{} must be a port number", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_tunnel_port_on_empty_config() {
        let empty = ConnectionConfig::new(DataSourceType::AwsRdsPostgres, "");
        let updated = ConnectionConfigBuilder::set_field(&empty, "tunnel.sshPort", 2222).unwrap();

        let tunnel = updated.tunnel.as_ref().unwrap();
        assert_eq!(tunnel.ssh_port, Some(2222));
        assert_eq!(tunnel.enabled, None);
        assert!(empty.tunnel.is_none());
    }

    #[test]
    fn test_get_field_missing_path_is_empty_sentinel() {
        let config = ConnectionConfig::new(DataSourceType::PostgreSql, "pg");
        assert_eq!(ConnectionConfigBuilder::get_field(&config, "tunnel.sshHost"), FieldValue::empty());
        assert_eq!(ConnectionConfigBuilder::get_field(&config, "host"), FieldValue::empty());
        assert_eq!(ConnectionConfigBuilder::get_field(&config, "bogus.path"), FieldValue::empty());
        assert_eq!(ConnectionConfigBuilder::get_field(&config, "name"), FieldValue::from("pg"));
    }

    #[test]
    fn test_create_default_applies_every_default() {
        let config = ConnectionConfigBuilder::create_default(DataSourceType::AwsRdsMysql);
        assert_eq!(config.name, "AWS RDS MySQL Connection");
        assert_eq!(config.integer("port"), Some(3306));
        assert_eq!(config.flag("ssl"), Some(true));

        let tunnel = config.tunnel.as_ref().unwrap();
        assert_eq!(tunnel.enabled, Some(false));
        assert_eq!(tunnel.ssh_port, Some(22));
        assert!(config.fields.get("host").is_none());
    }

    #[test]
    fn test_unknown_paths_are_rejected() {
        let config = ConnectionConfig::new(DataSourceType::PostgreSql, "pg");
        assert!(ConnectionConfigBuilder::set_field(&config, "proxy.host", "x").is_err());
        assert!(ConnectionConfigBuilder::set_field(&config, "tunnel.sshHots", "x").is_err());
        assert!(ConnectionConfigBuilder::set_field(&config, "type", "mysql").is_err());
        assert!(ConnectionConfigBuilder::set_field(&config, "tunnel.sshPort", 70000).is_err());
    }

    #[test]
    fn test_tunnel_fields_follow_enabled_flag() {
        let mut config = ConnectionConfigBuilder::create_default(DataSourceType::AwsRdsPostgres);
        for (key, value) in [
            ("host", "db.rds.amazonaws.com"),
            ("database", "app"),
            ("user", "admin"),
            ("password", "secret"),
            ("region", "us-east-1"),
        ] {
            config = ConnectionConfigBuilder::set_field(&config, key, value).unwrap();
        }
        assert!(ConnectionConfigBuilder::validate_for_submit(&config).is_ok());

        let ssh_host = DataSourceRegistry::get(DataSourceType::AwsRdsPostgres)
            .field("tunnel.sshHost")
            .unwrap();
        assert!(!ConnectionConfigBuilder::should_show(ssh_host, &config));

        let enabled = ConnectionConfigBuilder::set_field(&config, "tunnel.enabled", true).unwrap();
        assert!(ConnectionConfigBuilder::should_show(ssh_host, &enabled));
    }

    #[test]
    fn test_validate_lists_every_missing_field() {
        let config = ConnectionConfigBuilder::create_default(DataSourceType::PostgreSql);
        let err = ConnectionConfigBuilder::validate_for_submit(&config).unwrap_err();
        assert_eq!(err.fields, vec!["host", "database", "user", "password"]);
        assert_eq!(err.message, "Missing required fields: host, database, user, password");
    }
}
