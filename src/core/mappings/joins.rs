use super::draft::{out_of_range, MappingDraft};
use crate::models::{ColumnInfo, ColumnMapping, ColumnMappingField, JoinConfig, JoinField, JoinType};
use crate::utils::ValidationError;

/// `"<source_table>"."<source_column>" = "<join_table>"."<join_column>"`, or
/// `None` when any of the four parts is empty.
pub fn derive_on_condition(
    source_table: &str,
    source_column: &str,
    join_table: &str,
    join_column: &str,
) -> Option<String> {
    if [source_table, source_column, join_table, join_column]
        .iter()
        .any(|part| part.is_empty())
    {
        return None;
    }
    Some(format!(
        "\"{}\".\"{}\" = \"{}\".\"{}\"",
        source_table, source_column, join_table, join_column
    ))
}

impl MappingDraft {
    pub fn joins(&self) -> &[JoinConfig] {
        &self.mapping.joins
    }

    /// Appends an empty LEFT join and returns its index.
    pub fn add_join(&mut self) -> usize {
        self.mapping.joins.push(JoinConfig::default());
        self.mapping.joins.len() - 1
    }

    pub fn update_join(&mut self, index: usize, field: JoinField) -> Result<(), ValidationError> {
        if let JoinField::Table(table) = &field {
            self.check_join_table(index, table)?;
        }

        let source_table = self.mapping.source_table.clone();
        let join = self
            .mapping
            .joins
            .get_mut(index)
            .ok_or_else(|| out_of_range("joins", index))?;

        match field {
            JoinField::Table(table) => {
                join.table = table;
                join.join_column.clear();
                join.on.clear();
            }
            JoinField::JoinType(join_type) => join.join_type = join_type,
            JoinField::SourceColumn(column) => {
                join.source_column = column;
                join.on = derive_on_condition(&source_table, &join.source_column, &join.table, &join.join_column)
                    .unwrap_or_default();
            }
            JoinField::JoinColumn(column) => {
                join.join_column = column;
                join.on = derive_on_condition(&source_table, &join.source_column, &join.table, &join.join_column)
                    .unwrap_or_default();
            }
            JoinField::On(condition) => join.on = condition,
        }
        Ok(())
    }

    fn check_join_table(&self, index: usize, table: &str) -> Result<(), ValidationError> {
        if table.is_empty() {
            return Ok(());
        }
        let field = format!("joins[{}].table", index);
        if table == self.mapping.source_table {
            return Err(ValidationError::for_field(
                field,
                format!("{} is already the main source table", table),
            ));
        }
        if self.schema.source_table(table).is_none() {
            return Err(ValidationError::for_field(
                field,
                format!("Source table {} does not exist", table),
            ));
        }
        Ok(())
    }

    pub fn remove_join(&mut self, index: usize) -> Result<JoinConfig, ValidationError> {
        if index >= self.mapping.joins.len() {
            return Err(out_of_range("joins", index));
        }
        Ok(self.mapping.joins.remove(index))
    }

    pub fn add_join_column(&mut self, join_index: usize) -> Result<usize, ValidationError> {
        let join = self
            .mapping
            .joins
            .get_mut(join_index)
            .ok_or_else(|| out_of_range("joins", join_index))?;
        join.columns.push(ColumnMapping::default());
        Ok(join.columns.len() - 1)
    }

    pub fn update_join_column(
        &mut self,
        join_index: usize,
        column_index: usize,
        field: ColumnMappingField,
    ) -> Result<(), ValidationError> {
        let join = self
            .mapping
            .joins
            .get_mut(join_index)
            .ok_or_else(|| out_of_range("joins", join_index))?;
        let column = join
            .columns
            .get_mut(column_index)
            .ok_or_else(|| out_of_range(&format!("joins[{}].columns", join_index), column_index))?;
        column.apply(field);
        Ok(())
    }

    pub fn remove_join_column(
        &mut self,
        join_index: usize,
        column_index: usize,
    ) -> Result<ColumnMapping, ValidationError> {
        let join = self
            .mapping
            .joins
            .get_mut(join_index)
            .ok_or_else(|| out_of_range("joins", join_index))?;
        if column_index >= join.columns.len() {
            return Err(out_of_range(&format!("joins[{}].columns", join_index), column_index));
        }
        Ok(join.columns.remove(column_index))
    }

    /// Columns of the joined table itself, offered for `join_column`.
    pub fn join_table_columns(&self, join_table: &str) -> &[ColumnInfo] {
        self.schema
            .source_table(join_table)
            .map(|t| t.columns.as_slice())
            .unwrap_or(&[])
    }

    /// Columns offered on the main side of a join.
    ///
    /// INNER offers nothing, LEFT the main source table's columns, RIGHT the
    /// joined table's own columns. Both the join table and the main source
    /// table must be present in the snapshot.
    pub fn available_columns(&self, join_table: &str, join_type: JoinType) -> &[ColumnInfo] {
        if join_table.is_empty() || self.schema.source_table(join_table).is_none() {
            return &[];
        }
        if self.schema.source_table(&self.mapping.source_table).is_none() {
            return &[];
        }
        match join_type {
            JoinType::Inner => &[],
            JoinType::Left => self.source_columns(),
            JoinType::Right => self.join_table_columns(join_table),
        }
    }
}
