//! Deterministic, collision-checked mapping from schema identifiers to Rust
//! identifiers.
//!
//! Resolution runs in two phases: every table and column name is derived
//! first, then the schema's own type name is derived and checked against the
//! complete set. Any duplicate left after the `Ovsdb` prefix rule is a
//! [`OvsdbError::NameCollision`].

use heck::{ToPascalCase, ToSnakeCase};
use ovsdb::error::{OvsdbError, Result};
use ovsdb::schema::{Column, Schema, Table, UUID_COLUMN, VERSION_COLUMN};
use proc_macro2::Ident;
use quote::format_ident;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Prefix applied to the schema type name when it equals a row type name.
pub const SCHEMA_PREFIX: &str = "Ovsdb";

/// Row type name, e.g. "Logical_Switch" -> "LogicalSwitch"
pub fn row_type_name(table_name: &str) -> String {
    table_name.to_pascal_case()
}

/// Table aggregate type name, e.g. "Logical_Switch" -> "LogicalSwitchTable"
pub fn table_type_name(table_name: &str) -> String {
    format!("{}Table", row_type_name(table_name))
}

/// Field holding the table on the database type, e.g. "Logical_Switch" -> "logical_switch"
pub fn table_field_name(table_name: &str) -> String {
    legalize(table_name.to_snake_case())
}

/// Schema type name before collision handling, e.g. "Open_vSwitch" -> "OpenVSwitch"
pub fn schema_type_name(schema_name: &str) -> String {
    schema_name.to_pascal_case()
}

/// Field name for a column. The reserved `_uuid`/`_version` lose their
/// leading underscore; keywords become raw identifiers.
pub fn column_field_name(column_name: &str) -> String {
    let name = match column_name {
        UUID_COLUMN | VERSION_COLUMN => &column_name[1..],
        other => other,
    };
    legalize(name.to_snake_case())
}

/// Name of the tagged union over all row types of a database.
pub fn row_ref_type_name(db_type: &str) -> String {
    format!("{db_type}RowRef")
}

fn legalize(name: String) -> String {
    match name.as_str() {
        // These cannot be raw identifiers.
        "self" | "super" | "crate" | "Self" => format!("{name}_"),
        "type" | "struct" | "enum" | "fn" | "let" | "mut" | "ref" | "mod" | "use" | "pub"
        | "impl" | "trait" | "for" | "loop" | "while" | "if" | "else" | "match" | "return"
        | "break" | "continue" | "as" | "in" | "where" | "async" | "await" | "dyn" | "move"
        | "static" | "const" | "unsafe" | "extern" | "true" | "false" | "abstract"
        | "become" | "box" | "do" | "final" | "macro" | "override" | "priv" | "typeof"
        | "unsized" | "virtual" | "yield" | "try" | "gen" => format!("r#{name}"),
        _ => name,
    }
}

/// Identifier for a (possibly raw) name.
pub fn ident(name: &str) -> Ident {
    format_ident!("{}", name)
}

/// A name without its raw-identifier prefix, for use inside longer names.
fn bare(name: &str) -> &str {
    name.strip_prefix("r#").unwrap_or(name)
}

/// Reject names Rust will not accept as an identifier, such as `Self` or `_`.
fn check_ident(name: &str, source: &str) -> Result<()> {
    syn::parse_str::<syn::Ident>(name)
        .map(|_| ())
        .map_err(|_| {
            OvsdbError::Schema(format!(
                "cannot derive an identifier from {source:?} (got {name:?})"
            ))
        })
}

/// Tracks which schema item claimed each derived name.
#[derive(Default)]
struct Registry {
    owners: HashMap<String, String>,
}

impl Registry {
    fn claim(&mut self, name: &str, owner: String) -> Result<()> {
        match self.owners.get(name) {
            Some(first) => Err(OvsdbError::NameCollision {
                name: name.to_string(),
                first: first.clone(),
                second: owner,
            }),
            None => {
                self.owners.insert(name.to_string(), owner);
                Ok(())
            }
        }
    }
}

/// All names for one generated database.
#[derive(Debug, Clone)]
pub struct SchemaNames {
    pub db_type: String,
    pub row_ref_type: String,
    tables: BTreeMap<String, TableNames>,
}

/// Names for one table, its row type and its generated methods.
#[derive(Debug, Clone)]
pub struct TableNames {
    /// Table name as written in the schema.
    pub source: String,
    pub row_type: String,
    pub table_type: String,
    pub field: String,
    columns: BTreeMap<String, String>,
    pub indexes: Vec<IndexNames>,
    pub referrers: Vec<ReferrerNames>,
}

/// A declared index and the suffix of its `match_by_*`/`get_by_*` methods.
#[derive(Debug, Clone)]
pub struct IndexNames {
    pub columns: Vec<String>,
    pub suffix: String,
}

/// A referrer finder for one foreign-key column.
#[derive(Debug, Clone)]
pub struct ReferrerNames {
    pub column: String,
    pub ref_table: String,
    /// The reference is carried by the values of a map column.
    pub by_value: bool,
    pub method: String,
}

/// Methods every generated row type defines.
const ROW_METHODS: &[&str] = &["match_non_zeros"];

/// Methods every generated table type defines.
const TABLE_METHODS: &[&str] = &["get_by_any_index", "find_one_match_non_zeros", "push", "iter"];

impl SchemaNames {
    pub fn resolve(schema: &Schema) -> Result<Self> {
        let mut tables = BTreeMap::new();
        for table in schema.ordered_tables() {
            tables.insert(table.name.clone(), resolve_table_types(table)?);
        }

        // The schema name can only be decided once every row type is known.
        let row_types: BTreeSet<&str> = tables.values().map(|t| t.row_type.as_str()).collect();
        let mut db_type = schema_type_name(&schema.name);
        if row_types.contains(db_type.as_str()) {
            db_type = format!("{SCHEMA_PREFIX}{db_type}");
        }
        check_ident(&db_type, &schema.name)?;
        let row_ref_type = row_ref_type_name(&db_type);

        let mut types = Registry::default();
        let mut fields = Registry::default();
        for t in tables.values() {
            let owner = format!("table {}", t.source);
            types.claim(&t.row_type, owner.clone())?;
            types.claim(&t.table_type, owner.clone())?;
            fields.claim(&t.field, owner)?;
        }
        types.claim(&db_type, format!("schema {}", schema.name))?;
        types.claim(&row_ref_type, format!("schema {}", schema.name))?;

        let mut names = SchemaNames {
            db_type,
            row_ref_type,
            tables,
        };

        for table in schema.ordered_tables() {
            let (indexes, referrers) = names.resolve_methods(schema, table)?;
            if let Some(t) = names.tables.get_mut(&table.name) {
                t.indexes = indexes;
                t.referrers = referrers;
            }
        }

        Ok(names)
    }

    pub fn table(&self, name: &str) -> Result<&TableNames> {
        self.tables
            .get(name)
            .ok_or_else(|| OvsdbError::Schema(format!("table {name} has no resolved names")))
    }

    fn resolve_methods(
        &self,
        schema: &Schema,
        table: &Table,
    ) -> Result<(Vec<IndexNames>, Vec<ReferrerNames>)> {
        let names = self.table(&table.name)?;
        let mut row_methods = Registry::default();
        let mut table_methods = Registry::default();
        for method in ROW_METHODS {
            row_methods.claim(method, "generated row".to_string())?;
        }
        for method in TABLE_METHODS {
            table_methods.claim(method, "generated table".to_string())?;
        }

        let mut indexes: Vec<IndexNames> = Vec::new();
        for index in &table.indexes {
            if index.is_empty() {
                continue;
            }
            if indexes.iter().any(|known| &known.columns == index) {
                log::warn!(
                    "table {}: skipping repeated index [{}]",
                    table.name,
                    index.join(", ")
                );
                continue;
            }
            let mut fields = Vec::with_capacity(index.len());
            for column in index {
                if table.column(column).is_none() {
                    return Err(OvsdbError::IndexColumn {
                        table: table.name.clone(),
                        column: column.clone(),
                    });
                }
                fields.push(bare(names.column(column)?).to_string());
            }
            let suffix = fields.join("_");
            let owner = format!("table {} index [{}]", table.name, index.join(", "));
            row_methods.claim(&format!("match_by_{suffix}"), owner.clone())?;
            table_methods.claim(&format!("get_by_{suffix}"), owner)?;
            indexes.push(IndexNames {
                columns: index.clone(),
                suffix,
            });
        }

        let mut referrers = Vec::new();
        for column in table.ordered_columns() {
            let refs = [
                (column.key_ref_table(), false),
                (column.value_ref_table(), true),
            ];
            for (ref_table, by_value) in refs {
                let Some(ref_table) = ref_table else { continue };
                let target = resolve_ref(schema, table, column, ref_table)?;
                let method = referrer_method_name(
                    &target.name,
                    names.column(&column.name)?,
                    by_value,
                );
                table_methods.claim(
                    &method,
                    format!("table {} column {}", table.name, column.name),
                )?;
                referrers.push(ReferrerNames {
                    column: column.name.clone(),
                    ref_table: ref_table.to_string(),
                    by_value,
                    method,
                });
            }
        }

        Ok((indexes, referrers))
    }

    /// Resolved tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &TableNames> {
        self.tables.values()
    }
}

impl TableNames {
    pub fn column(&self, name: &str) -> Result<&str> {
        self.columns
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| OvsdbError::Schema(format!("column {name} has no resolved name")))
    }
}

/// `find_port_referrer_ports` for a key reference, `find_port_value_referrer_ports`
/// for a map-value reference.
pub fn referrer_method_name(ref_table: &str, column_field: &str, by_value: bool) -> String {
    // Lowercase the table name as written: "QoS" -> "qos", not "qo_s".
    let target: String = ref_table
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase();
    let column = bare(column_field);
    if by_value {
        format!("find_{target}_value_referrer_{column}")
    } else {
        format!("find_{target}_referrer_{column}")
    }
}

fn resolve_table_types(table: &Table) -> Result<TableNames> {
    let row_type = row_type_name(&table.name);
    check_ident(&row_type, &table.name)?;
    let field = table_field_name(&table.name);

    let mut registry = Registry::default();
    let mut columns = BTreeMap::new();
    for column in table.ordered_columns() {
        let field = column_field_name(&column.name);
        check_ident(&field, &column.name)?;
        registry.claim(
            &field,
            format!("table {} column {}", table.name, column.name),
        )?;
        columns.insert(column.name.clone(), field);
    }

    Ok(TableNames {
        source: table.name.clone(),
        table_type: table_type_name(&table.name),
        row_type,
        field,
        columns,
        indexes: Vec::new(),
        referrers: Vec::new(),
    })
}

fn resolve_ref<'s>(
    schema: &'s Schema,
    table: &Table,
    column: &Column,
    ref_table: &str,
) -> Result<&'s Table> {
    schema
        .table(ref_table)
        .ok_or_else(|| OvsdbError::UnresolvedRef {
            table: table.name.clone(),
            column: column.name.clone(),
            ref_table: ref_table.to_string(),
        })
}
