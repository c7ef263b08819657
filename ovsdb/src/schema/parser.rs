use super::types::{
    AtomicType, BaseType, Column, ColumnType, RefType, Schema, Table, UUID_COLUMN, VERSION_COLUMN,
};
use crate::error::{OvsdbError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Parse an `.ovsschema` file into a [`Schema`]
pub fn parse_schema(path: &Path) -> Result<Schema> {
    let content = std::fs::read_to_string(path)?;
    parse_schema_str(&content)
}

/// Parse an `.ovsschema` JSON string into a [`Schema`]
pub fn parse_schema_str(content: &str) -> Result<Schema> {
    let raw: RawSchema = serde_json::from_str(content)?;
    raw.into_schema()
}

#[derive(Deserialize)]
struct RawSchema {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    tables: HashMap<String, RawTable>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTable {
    #[serde(default)]
    columns: HashMap<String, RawColumn>,
    #[serde(default)]
    is_root: bool,
    #[serde(default)]
    indexes: Vec<Vec<String>>,
    #[serde(default)]
    max_rows: Option<u64>,
}

#[derive(Deserialize)]
struct RawColumn {
    #[serde(rename = "type")]
    ty: RawColumnType,
    #[serde(default)]
    mutable: Option<bool>,
    #[serde(default)]
    ephemeral: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawColumnType {
    Atomic(String),
    Complex {
        key: RawBaseType,
        #[serde(default)]
        value: Option<RawBaseType>,
        #[serde(default)]
        min: Option<u64>,
        #[serde(default)]
        max: Option<RawMax>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBaseType {
    Atomic(String),
    // Constraints such as enum, minInteger or maxLength are accepted and ignored.
    Complex {
        #[serde(rename = "type")]
        ty: String,
        #[serde(rename = "refTable", default)]
        ref_table: Option<String>,
        #[serde(rename = "refType", default)]
        ref_type: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMax {
    Bounded(u64),
    Keyword(String),
}

impl RawSchema {
    fn into_schema(self) -> Result<Schema> {
        let mut schema = Schema::new(self.name);
        schema.version = self.version;

        for (table_name, raw_table) in self.tables {
            let mut table = Table::new(table_name.clone());
            table.is_root = raw_table.is_root;
            table.indexes = raw_table.indexes;
            table.max_rows = raw_table.max_rows;

            for (column_name, raw_column) in raw_table.columns {
                if column_name == UUID_COLUMN || column_name == VERSION_COLUMN {
                    return Err(OvsdbError::Schema(format!(
                        "table {table_name}: column {column_name} is reserved"
                    )));
                }
                let ty = raw_column.ty.into_column_type(&table_name, &column_name)?;
                table.add_column(Column {
                    name: column_name,
                    ty,
                    mutable: raw_column.mutable.unwrap_or(true),
                    ephemeral: raw_column.ephemeral,
                });
            }

            schema.add_table(table);
        }

        log::debug!(
            "parsed schema {} with {} tables",
            schema.name,
            schema.tables.len()
        );
        Ok(schema)
    }
}

impl RawColumnType {
    fn into_column_type(self, table: &str, column: &str) -> Result<ColumnType> {
        match self {
            RawColumnType::Atomic(name) => {
                Ok(ColumnType::atom(parse_atomic(&name, table, column)?))
            }
            RawColumnType::Complex {
                key,
                value,
                min,
                max,
            } => {
                let key = key.into_base_type(table, column)?;
                let value = value
                    .map(|v| v.into_base_type(table, column))
                    .transpose()?;
                let (max, max_unlimited) = match max {
                    None => (1, false),
                    Some(RawMax::Bounded(n)) => (n, false),
                    Some(RawMax::Keyword(k)) if k == "unlimited" => (0, true),
                    Some(RawMax::Keyword(k)) => {
                        return Err(OvsdbError::Schema(format!(
                            "table {table} column {column}: invalid max {k:?}"
                        )))
                    }
                };
                Ok(ColumnType {
                    key,
                    value,
                    min: min.unwrap_or(1),
                    max,
                    max_unlimited,
                })
            }
        }
    }
}

impl RawBaseType {
    fn into_base_type(self, table: &str, column: &str) -> Result<BaseType> {
        match self {
            RawBaseType::Atomic(name) => Ok(BaseType::new(parse_atomic(&name, table, column)?)),
            RawBaseType::Complex {
                ty,
                ref_table,
                ref_type,
            } => {
                let ref_type = match ref_type.as_deref() {
                    None | Some("strong") => RefType::Strong,
                    Some("weak") => RefType::Weak,
                    Some(other) => {
                        return Err(OvsdbError::Schema(format!(
                            "table {table} column {column}: invalid refType {other:?}"
                        )))
                    }
                };
                Ok(BaseType {
                    atomic: parse_atomic(&ty, table, column)?,
                    ref_table,
                    ref_type,
                })
            }
        }
    }
}

fn parse_atomic(name: &str, table: &str, column: &str) -> Result<AtomicType> {
    AtomicType::parse(name).ok_or_else(|| {
        OvsdbError::Schema(format!(
            "table {table} column {column}: unknown atomic type {name:?}"
        ))
    })
}
