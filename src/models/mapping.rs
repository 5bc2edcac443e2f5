use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    #[default]
    Full,
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    Lowercase,
    Uppercase,
    Trim,
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source_column: String,
    pub destination_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    /// Substituted by the backend when the source value is null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ColumnMapping {
    pub fn new(source_column: impl Into<String>, destination_column: impl Into<String>) -> Self {
        Self {
            source_column: source_column.into(),
            destination_column: destination_column.into(),
            transform: None,
            default_value: None,
        }
    }
}

/// A single field edit on a [`ColumnMapping`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMappingField {
    SourceColumn(String),
    DestinationColumn(String),
    Transform(Option<Transform>),
    DefaultValue(Option<String>),
}

impl ColumnMapping {
    pub fn apply(&mut self, field: ColumnMappingField) {
        match field {
            ColumnMappingField::SourceColumn(v) => self.source_column = v,
            ColumnMappingField::DestinationColumn(v) => self.destination_column = v,
            ColumnMappingField::Transform(v) => self.transform = v,
            ColumnMappingField::DefaultValue(v) => self.default_value = v,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinConfig {
    pub table: String,
    #[serde(rename = "type", default)]
    pub join_type: JoinType,
    /// `"<source_table>"."<source_column>" = "<table>"."<join_column>"`
    #[serde(default)]
    pub on: String,
    #[serde(default)]
    pub source_column: String,
    #[serde(default)]
    pub join_column: String,
    #[serde(default)]
    pub columns: Vec<ColumnMapping>,
}

/// A single field edit on a [`JoinConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinField {
    Table(String),
    JoinType(JoinType),
    SourceColumn(String),
    JoinColumn(String),
    On(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapping {
    /// Assigned by the backend; absent on drafts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub source_table: String,
    pub destination_table: String,
    pub primary_key: String,
    #[serde(default)]
    pub sync_type: SyncType,
    #[serde(default)]
    pub column_mappings: Vec<ColumnMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<JoinConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "crate::models::timestamp::deserialize_optional_timestamp")]
    pub last_sync: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

impl Default for TableMapping {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            source_table: String::new(),
            destination_table: String::new(),
            primary_key: "id".to_string(),
            sync_type: SyncType::Full,
            column_mappings: Vec::new(),
            joins: Vec::new(),
            where_clause: None,
            enabled: true,
            last_sync: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteMappingResult {
    #[serde(default)]
    pub synced_records: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Per-mapping outcome inside an execute-all run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRunOutcome {
    #[serde(default)]
    pub mapping_id: Option<String>,
    #[serde(default)]
    pub mapping_name: Option<String>,
    #[serde(default = "default_enabled")]
    pub success: bool,
    #[serde(default)]
    pub synced_records: u64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteAllResult {
    #[serde(default)]
    pub total_mappings: u64,
    #[serde(default)]
    pub synced_records: u64,
    #[serde(default)]
    pub results: Vec<MappingRunOutcome>,
}

impl ExecuteAllResult {
    pub fn failed(&self) -> impl Iterator<Item = &MappingRunOutcome> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}
