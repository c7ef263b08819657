pub mod schema;
pub mod types;
pub mod validation;
pub mod error;

pub use error::{OvsdbError, Result};
pub use schema::Schema;
