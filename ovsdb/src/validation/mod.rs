use crate::error::{OvsdbError, Result};
use crate::schema::{Column, Schema, Table};
use std::collections::HashSet;

/// Result of checking a schema
#[derive(Debug)]
pub struct ValidationResult {
    pub errors: Vec<OvsdbError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// First error, in table and column order.
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Re-check everything generation depends on: cardinality, operator family
/// availability, reference targets and index columns.
pub fn check_schema(schema: &Schema) -> ValidationResult {
    let mut result = ValidationResult {
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let mut referenced: HashSet<&str> = HashSet::new();

    for table in schema.ordered_tables() {
        for column in table.ordered_columns() {
            if let Err(err) = column.family(table) {
                result.errors.push(err);
            }
            for ref_table in [column.key_ref_table(), column.value_ref_table()]
                .into_iter()
                .flatten()
            {
                check_ref(schema, table, column, ref_table, &mut result);
                referenced.insert(ref_table);
            }
        }
        check_indexes(table, &mut result);
    }

    for table in schema.ordered_tables() {
        if !table.is_root && !referenced.contains(table.name.as_str()) {
            result.warnings.push(format!(
                "Table {} is not a root table and is never referenced; its rows are garbage collected",
                table.name
            ));
        }
    }

    result
}

/// Fail-fast variant of [`check_schema`] used before generation.
pub fn validate_schema(schema: &Schema) -> Result<()> {
    let result = check_schema(schema);
    for warning in &result.warnings {
        log::warn!("{warning}");
    }
    result.into_result()
}

fn check_ref(
    schema: &Schema,
    table: &Table,
    column: &Column,
    ref_table: &str,
    result: &mut ValidationResult,
) {
    if schema.table(ref_table).is_none() {
        result.errors.push(OvsdbError::UnresolvedRef {
            table: table.name.clone(),
            column: column.name.clone(),
            ref_table: ref_table.to_string(),
        });
    }
}

fn check_indexes(table: &Table, result: &mut ValidationResult) {
    let mut seen: HashSet<&[String]> = HashSet::new();
    for index in &table.indexes {
        if index.is_empty() {
            result
                .warnings
                .push(format!("Table {} declares an empty index", table.name));
            continue;
        }
        for column in index {
            if table.column(column).is_none() {
                result.errors.push(OvsdbError::IndexColumn {
                    table: table.name.clone(),
                    column: column.clone(),
                });
            }
        }
        if !seen.insert(index.as_slice()) {
            result.warnings.push(format!(
                "Table {} declares index [{}] more than once",
                table.name,
                index.join(", ")
            ));
        }
    }
}
