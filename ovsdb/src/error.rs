use thiserror::Error;

#[derive(Error, Debug)]
pub enum OvsdbError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Table {table} column {column}: malformed cardinality, min and max both 0")]
    Cardinality { table: String, column: String },

    #[error("Table {table} column {column}: reference to unknown table {ref_table}")]
    UnresolvedRef {
        table: String,
        column: String,
        ref_table: String,
    },

    #[error("Table {table}: index names unknown column {column}")]
    IndexColumn { table: String, column: String },

    #[error("Table {table} column {column}: no runtime operator family {family}")]
    UnsupportedShape {
        table: String,
        column: String,
        family: String,
    },

    #[error("Name collision: {name} is derived from both {first} and {second}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Expected {expected}, got {value}")]
    Coerce { expected: &'static str, value: String },

    #[error("{column}: {value}: {source}")]
    SetColumn {
        column: String,
        value: String,
        #[source]
        source: Box<OvsdbError>,
    },

    #[error("Bad row type: {0}")]
    BadType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OvsdbError>;
