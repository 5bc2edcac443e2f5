use crate::models::{
    ColumnInfo, ColumnMapping, ColumnMappingField, SyncType, TableInfo, TableMapping,
};
use crate::utils::ValidationError;

/// Introspected source and destination tables a draft may draw from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    pub source: Vec<TableInfo>,
    pub destination: Vec<TableInfo>,
}

impl SchemaSnapshot {
    pub fn new(source: Vec<TableInfo>, destination: Vec<TableInfo>) -> Self {
        Self { source, destination }
    }

    pub fn source_table(&self, name: &str) -> Option<&TableInfo> {
        self.source.iter().find(|t| t.table_name == name)
    }

    pub fn destination_table(&self, name: &str) -> Option<&TableInfo> {
        self.destination.iter().find(|t| t.table_name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingStage {
    Empty,
    TablesSelected,
    ColumnsConfigured,
    JoinsConfigured,
    Submittable,
}

/// Checks that do not need a schema snapshot: the minimum the backend accepts.
pub fn validate_mapping(mapping: &TableMapping) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    if mapping.name.trim().is_empty() {
        missing.push("name".to_string());
    }
    if mapping.source_table.is_empty() {
        missing.push("source_table".to_string());
    }
    if mapping.destination_table.is_empty() {
        missing.push("destination_table".to_string());
    }
    if mapping.column_mappings.is_empty() {
        missing.push("column_mappings".to_string());
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::missing_fields(missing))
    }
}

/// The in-progress mapping, owned by one editing session.
#[derive(Debug, Clone, Default)]
pub struct MappingDraft {
    pub(super) mapping: TableMapping,
    pub(super) schema: SchemaSnapshot,
}

impl MappingDraft {
    pub fn new(schema: SchemaSnapshot) -> Self {
        Self {
            mapping: TableMapping::default(),
            schema,
        }
    }

    /// Starts editing an existing server-side mapping.
    pub fn from_mapping(mapping: TableMapping, schema: SchemaSnapshot) -> Self {
        Self { mapping, schema }
    }

    pub fn mapping(&self) -> &TableMapping {
        &self.mapping
    }

    pub fn schema(&self) -> &SchemaSnapshot {
        &self.schema
    }

    /// Swaps in a fresh snapshot without touching the draft's selections.
    pub fn replace_schema(&mut self, schema: SchemaSnapshot) {
        self.schema = schema;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.mapping.name = name.into();
    }

    pub fn set_sync_type(&mut self, sync_type: SyncType) {
        self.mapping.sync_type = sync_type;
    }

    pub fn set_where_clause(&mut self, clause: Option<String>) {
        self.mapping.where_clause = clause.filter(|c| !c.trim().is_empty());
    }

    pub fn stage(&self) -> MappingStage {
        if self.mapping.source_table.is_empty() || self.mapping.destination_table.is_empty() {
            MappingStage::Empty
        } else if self.is_submittable() {
            MappingStage::Submittable
        } else if !self.mapping.joins.is_empty() {
            MappingStage::JoinsConfigured
        } else if !self.mapping.column_mappings.is_empty() {
            MappingStage::ColumnsConfigured
        } else {
            MappingStage::TablesSelected
        }
    }

    /// Selects the main source table. A change clears the column mappings,
    /// resets the primary key and drops every join predicate built on the
    /// old table.
    pub fn set_source_table(&mut self, table: &str) -> Result<(), ValidationError> {
        if !table.is_empty() && self.schema.source_table(table).is_none() {
            return Err(ValidationError::for_field(
                "source_table",
                format!("Source table {} does not exist", table),
            ));
        }
        if self.mapping.source_table == table {
            return Ok(());
        }

        self.mapping.source_table = table.to_string();
        self.mapping.column_mappings.clear();
        self.mapping.primary_key = self
            .primary_key_candidates()
            .into_iter()
            .next()
            .unwrap_or_else(|| "id".to_string());
        for join in &mut self.mapping.joins {
            join.source_column.clear();
            join.on.clear();
        }
        Ok(())
    }

    pub fn set_destination_table(&mut self, table: &str) -> Result<(), ValidationError> {
        if !table.is_empty() && self.schema.destination_table(table).is_none() {
            return Err(ValidationError::for_field(
                "destination_table",
                format!("Destination table {} does not exist", table),
            ));
        }
        if self.mapping.destination_table == table {
            return Ok(());
        }

        self.mapping.destination_table = table.to_string();
        self.mapping.column_mappings.clear();
        Ok(())
    }

    pub fn source_columns(&self) -> &[ColumnInfo] {
        self.schema
            .source_table(&self.mapping.source_table)
            .map(|t| t.columns.as_slice())
            .unwrap_or(&[])
    }

    pub fn destination_columns(&self) -> &[ColumnInfo] {
        self.schema
            .destination_table(&self.mapping.destination_table)
            .map(|t| t.columns.as_slice())
            .unwrap_or(&[])
    }

    /// PK-flagged columns of the source table, or `["id"]` when none are flagged.
    pub fn primary_key_candidates(&self) -> Vec<String> {
        let flagged: Vec<String> = self
            .source_columns()
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.column_name.clone())
            .collect();
        if flagged.is_empty() {
            vec!["id".to_string()]
        } else {
            flagged
        }
    }

    pub fn set_primary_key(&mut self, column: &str) -> Result<(), ValidationError> {
        let known = self.primary_key_candidates().iter().any(|c| c == column)
            || self.source_columns().iter().any(|c| c.column_name == column);
        if !known {
            return Err(ValidationError::for_field(
                "primary_key",
                format!("{} is not a column of {}", column, self.mapping.source_table),
            ));
        }
        self.mapping.primary_key = column.to_string();
        Ok(())
    }

    /// Appends an empty column mapping and returns its index.
    pub fn add_column_mapping(&mut self) -> usize {
        self.mapping.column_mappings.push(ColumnMapping::default());
        self.mapping.column_mappings.len() - 1
    }

    pub fn update_column_mapping(
        &mut self,
        index: usize,
        field: ColumnMappingField,
    ) -> Result<(), ValidationError> {
        let mapping = self
            .mapping
            .column_mappings
            .get_mut(index)
            .ok_or_else(|| out_of_range("column_mappings", index))?;
        mapping.apply(field);
        Ok(())
    }

    pub fn remove_column_mapping(&mut self, index: usize) -> Result<ColumnMapping, ValidationError> {
        if index >= self.mapping.column_mappings.len() {
            return Err(out_of_range("column_mappings", index));
        }
        Ok(self.mapping.column_mappings.remove(index))
    }

    pub fn is_submittable(&self) -> bool {
        validate_mapping(&self.mapping).is_ok()
    }

    /// Everything [`validate_mapping`] checks plus consistency with the schema snapshot.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_mapping(&self.mapping)?;

        let mut invalid = Vec::new();
        let mut problems = Vec::new();

        if self.schema.source_table(&self.mapping.source_table).is_none() {
            invalid.push("source_table".to_string());
            problems.push(format!("unknown source table {}", self.mapping.source_table));
        } else if !self.primary_key_candidates().contains(&self.mapping.primary_key)
            && !self
                .source_columns()
                .iter()
                .any(|c| c.column_name == self.mapping.primary_key)
        {
            invalid.push("primary_key".to_string());
            problems.push(format!("primary key {} is not a source column", self.mapping.primary_key));
        }
        if self.schema.destination_table(&self.mapping.destination_table).is_none() {
            invalid.push("destination_table".to_string());
            problems.push(format!("unknown destination table {}", self.mapping.destination_table));
        }

        for (i, column) in self.mapping.column_mappings.iter().enumerate() {
            if column.source_column.is_empty() || column.destination_column.is_empty() {
                invalid.push(format!("column_mappings[{}]", i));
                problems.push(format!("column mapping {} needs both a source and a destination column", i + 1));
            }
        }

        for (i, join) in self.mapping.joins.iter().enumerate() {
            if join.table.is_empty() {
                invalid.push(format!("joins[{}].table", i));
                problems.push(format!("join {} has no table", i + 1));
            } else if join.table == self.mapping.source_table {
                invalid.push(format!("joins[{}].table", i));
                problems.push(format!("join {} cannot join {} to itself", i + 1, join.table));
            }
            if join.on.is_empty() {
                invalid.push(format!("joins[{}].on", i));
                problems.push(format!("join {} has no join condition", i + 1));
            }
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                message: format!("Invalid mapping: {}", problems.join("; ")),
                fields: invalid,
            })
        }
    }

    pub fn to_mapping(&self) -> Result<TableMapping, ValidationError> {
        self.validate()?;
        Ok(self.mapping.clone())
    }

    /// Back to an empty draft, keeping the schema snapshot.
    pub fn reset(&mut self) {
        self.mapping = TableMapping::default();
    }
}

pub(super) fn out_of_range(list: &str, index: usize) -> ValidationError {
    ValidationError::for_field(
        format!("{}[{}]", list, index),
        format!("No entry at position {} in {}", index, list),
    )
}
