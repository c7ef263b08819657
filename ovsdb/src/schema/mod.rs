mod parser;
mod shape;
mod types;

pub use parser::{parse_schema, parse_schema_str};
pub use shape::{classify, MalformedCardinality, OperatorFamily, Shape};
pub use types::*;
