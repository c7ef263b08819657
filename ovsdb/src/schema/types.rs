use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Column name carrying the row identity.
pub const UUID_COLUMN: &str = "_uuid";
/// Column name carrying the row version.
pub const VERSION_COLUMN: &str = "_version";
/// Mapping column that enables the external-id helpers.
pub const EXTERNAL_IDS_COLUMN: &str = "external_ids";

/// A whole database schema, as described by an OVSDB `.ovsschema` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tables: HashMap<String, Table>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Schema {
            name: name.into(),
            version: None,
            tables: HashMap::new(),
        }
    }

    /// Table names in ascending order, independent of map iteration order.
    pub fn ordered_table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Tables in the same order as [`Schema::ordered_table_names`].
    pub fn ordered_tables(&self) -> Vec<&Table> {
        self.ordered_table_names()
            .into_iter()
            .filter_map(|name| self.tables.get(name))
            .collect()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }
}

/// Definition of a single table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub columns: HashMap<String, Column>,
    #[serde(default)]
    pub indexes: Vec<Vec<String>>,
    #[serde(default)]
    pub max_rows: Option<u64>,
}

impl Table {
    /// An empty table carrying only the reserved `_uuid` and `_version` columns.
    pub fn new(name: impl Into<String>) -> Self {
        let mut table = Table {
            name: name.into(),
            is_root: false,
            columns: HashMap::new(),
            indexes: Vec::new(),
            max_rows: None,
        };
        table.add_column(Column::new(UUID_COLUMN, ColumnType::atom(AtomicType::Uuid)));
        table.add_column(Column::new(VERSION_COLUMN, ColumnType::atom(AtomicType::Uuid)));
        table
    }

    /// Column names in ascending order, independent of map iteration order.
    pub fn ordered_column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Columns in the same order as [`Table::ordered_column_names`].
    pub fn ordered_columns(&self) -> Vec<&Column> {
        self.ordered_column_names()
            .into_iter()
            .filter_map(|name| self.columns.get(name))
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.insert(column.name.clone(), column);
    }

    pub fn has_index(&self) -> bool {
        !self.indexes.is_empty()
    }

    /// Whether rows of this table get the external-id helpers.
    pub fn has_external_ids(&self) -> bool {
        self.columns.contains_key(EXTERNAL_IDS_COLUMN)
    }
}

/// Definition of a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    #[serde(default = "default_true")]
    pub mutable: bool,
    #[serde(default)]
    pub ephemeral: bool,
}

fn default_true() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Column {
            name: name.into(),
            ty,
            mutable: true,
            ephemeral: false,
        }
    }

    /// `_uuid` and `_version` are maintained by the server and never written.
    pub fn is_read_only(&self) -> bool {
        self.name == UUID_COLUMN || self.name == VERSION_COLUMN
    }

    /// Key-side foreign-key target, if the key is a uuid reference.
    pub fn key_ref_table(&self) -> Option<&str> {
        self.ty.key.ref_table()
    }

    /// Value-side foreign-key target, if the column is a map whose values are uuid references.
    pub fn value_ref_table(&self) -> Option<&str> {
        self.ty.value.as_ref().and_then(BaseType::ref_table)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnType {
    pub key: BaseType,
    #[serde(default)]
    pub value: Option<BaseType>,
    pub min: u64,
    pub max: u64,
    #[serde(default)]
    pub max_unlimited: bool,
}

impl ColumnType {
    /// Exactly one value (`min = 1, max = 1`).
    pub fn atom(atomic: AtomicType) -> Self {
        ColumnType {
            key: BaseType::new(atomic),
            value: None,
            min: 1,
            max: 1,
            max_unlimited: false,
        }
    }

    /// Zero or one value (`min = 0, max = 1`).
    pub fn optional(atomic: AtomicType) -> Self {
        ColumnType {
            min: 0,
            ..ColumnType::atom(atomic)
        }
    }

    /// Unbounded set of keys (`min = 0, max = unlimited`).
    pub fn set(key: BaseType) -> Self {
        ColumnType {
            key,
            value: None,
            min: 0,
            max: 0,
            max_unlimited: true,
        }
    }

    /// Unbounded key to value map.
    pub fn map(key: BaseType, value: BaseType) -> Self {
        ColumnType {
            key,
            value: Some(value),
            min: 0,
            max: 0,
            max_unlimited: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseType {
    pub atomic: AtomicType,
    #[serde(default)]
    pub ref_table: Option<String>,
    #[serde(default)]
    pub ref_type: RefType,
}

impl BaseType {
    pub fn new(atomic: AtomicType) -> Self {
        BaseType {
            atomic,
            ref_table: None,
            ref_type: RefType::Strong,
        }
    }

    pub fn reference(ref_table: impl Into<String>) -> Self {
        BaseType {
            atomic: AtomicType::Uuid,
            ref_table: Some(ref_table.into()),
            ref_type: RefType::Strong,
        }
    }

    /// Referenced table, only when the atomic type is `uuid`.
    pub fn ref_table(&self) -> Option<&str> {
        match self.atomic {
            AtomicType::Uuid => self.ref_table.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomicType {
    Integer,
    Real,
    Boolean,
    String,
    Uuid,
}

impl AtomicType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "integer" => Some(AtomicType::Integer),
            "real" => Some(AtomicType::Real),
            "boolean" => Some(AtomicType::Boolean),
            "string" => Some(AtomicType::String),
            "uuid" => Some(AtomicType::Uuid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AtomicType::Integer => "integer",
            AtomicType::Real => "real",
            AtomicType::Boolean => "boolean",
            AtomicType::String => "string",
            AtomicType::Uuid => "uuid",
        }
    }

    /// Name of the runtime marker type implementing this atom, e.g. `StringAtom`.
    pub fn export_name(&self) -> &'static str {
        match self {
            AtomicType::Integer => "IntegerAtom",
            AtomicType::Real => "RealAtom",
            AtomicType::Boolean => "BooleanAtom",
            AtomicType::String => "StringAtom",
            AtomicType::Uuid => "UuidAtom",
        }
    }

    /// Whether values of this type have a total order and can key a map.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, AtomicType::Real)
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    #[default]
    Strong,
    Weak,
}
