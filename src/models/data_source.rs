use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every kind of data source the backend can adapt to.
///
/// Declaration order is registration order in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceType {
    #[serde(rename = "postgresql")]
    PostgreSql,
    Mssql,
    #[serde(rename = "mysql")]
    MySql,
    GoogleSheets,
    Supabase,
    AwsRdsPostgres,
    AwsRdsMysql,
    AwsRdsMssql,
    #[serde(rename = "mongodb")]
    MongoDb,
    Sqlite,
}

impl DataSourceType {
    pub const ALL: [DataSourceType; 10] = [
        DataSourceType::PostgreSql,
        DataSourceType::Mssql,
        DataSourceType::MySql,
        DataSourceType::GoogleSheets,
        DataSourceType::Supabase,
        DataSourceType::AwsRdsPostgres,
        DataSourceType::AwsRdsMysql,
        DataSourceType::AwsRdsMssql,
        DataSourceType::MongoDb,
        DataSourceType::Sqlite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceType::PostgreSql => "postgresql",
            DataSourceType::Mssql => "mssql",
            DataSourceType::MySql => "mysql",
            DataSourceType::GoogleSheets => "google_sheets",
            DataSourceType::Supabase => "supabase",
            DataSourceType::AwsRdsPostgres => "aws_rds_postgres",
            DataSourceType::AwsRdsMysql => "aws_rds_mysql",
            DataSourceType::AwsRdsMssql => "aws_rds_mssql",
            DataSourceType::MongoDb => "mongodb",
            DataSourceType::Sqlite => "sqlite",
        }
    }

    /// Position in [`DataSourceType::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_aws_rds(&self) -> bool {
        matches!(
            self,
            DataSourceType::AwsRdsPostgres | DataSourceType::AwsRdsMysql | DataSourceType::AwsRdsMssql
        )
    }
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataSourceType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("unknown data source type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceCategory {
    Database,
    Cloud,
    File,
    Api,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceCapabilities {
    pub supports_transactions: bool,
    #[serde(rename = "supportsRealTimeCDC")]
    pub supports_real_time_cdc: bool,
    #[serde(rename = "supportsPollingCDC")]
    pub supports_polling_cdc: bool,
    pub supports_schema_introspection: bool,
    pub supports_bulk_operations: bool,
    pub supports_custom_queries: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    pub supported_data_types: Vec<String>,
}

/// A scalar configuration value as it travels in a connection config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// The value handed back for a field that is not set at all.
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Integer(n) => *n != 0,
            FieldValue::Float(n) => *n != 0.0 && !n.is_nan(),
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Null => false,
        }
    }

    /// Blank for the purpose of required-field checks.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Text(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Float(n) if n.fract() == 0.0 => Some(*n as i64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        FieldValue::Integer(value as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Password,
    Boolean,
    Select,
    Textarea,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// One entry in a data source's configuration form.
///
/// Dotted names (`tunnel.sshHost`) address the nested tunnel group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<&'static str>,
}

impl FormField {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            description: None,
            default_value: None,
            options: Vec::new(),
            placeholder: None,
            depends_on: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn option(mut self, value: &'static str, label: &'static str) -> Self {
        self.options.push(SelectOption { value, label });
        self
    }

    pub fn depends_on(mut self, field: &'static str) -> Self {
        self.depends_on = Some(field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceTypeInfo {
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: Option<&'static str>,
    pub category: DataSourceCategory,
    pub capabilities: DataSourceCapabilities,
    pub config_fields: Vec<FormField>,
}

impl DataSourceTypeInfo {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.config_fields.iter().find(|f| f.name == name)
    }
}
