use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    #[serde(default)]
    pub data_type: Option<String>,
    /// Backends report this either as a boolean or as `"YES"`/`"NO"`.
    #[serde(default, deserialize_with = "deserialize_nullable_flag")]
    pub is_nullable: Option<bool>,
    #[serde(default)]
    pub is_primary_key: bool,
}

impl ColumnInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            column_name: name.into(),
            ..Default::default()
        }
    }

    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            column_name: name.into(),
            is_primary_key: true,
            ..Default::default()
        }
    }
}

fn deserialize_nullable_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => Some(b),
        Some(Flag::Text(s)) => match s.to_ascii_lowercase().as_str() {
            "yes" | "true" | "y" => Some(true),
            "no" | "false" | "n" => Some(false),
            _ => None,
        },
        None => None,
    })
}

/// Introspected table as returned by `/mappings/{source|destination}/tables`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.column_name == name)
    }
}

/// `GET /tables?type=...` returns table name to column list.
pub type TablesMap = BTreeMap<String, Vec<ColumnInfo>>;

/// Bulk-transfer candidate table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTableInfo {
    pub table_name: String,
    #[serde(default)]
    pub column_count: u32,
    #[serde(default)]
    pub row_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationTableStatus {
    pub table_name: String,
    pub exists: bool,
    #[serde(default)]
    pub row_count: Option<u64>,
}
