//! Runtime support for generated data-access code.
//!
//! Generated row, table and database types implement [`Row`], [`Table`] and
//! [`Database`], and route every per-column operation through a [`Family`]
//! selected by the column's shape and atomic types.

mod atom;
mod family;

pub use atom::{AtomKind, BooleanAtom, IntegerAtom, RealAtom, StringAtom, UuidAtom};
pub use family::{Atom, Family, Map, Multiples, Optional};
pub use crate::error::{OvsdbError, Result};
pub use serde_json::Value;

use crate::schema::EXTERNAL_IDS_COLUMN;
use std::any::Any;
use std::fmt;

/// A row of some generated table.
pub trait Row: Any + fmt::Debug {
    fn table_name(&self) -> &'static str;

    fn is_root(&self) -> bool;

    /// Value of the `_uuid` column.
    fn uuid(&self) -> &str;

    /// ovs-vsctl style `column=value` arguments for every writable, non-zero column.
    fn cmd_args(&self) -> Vec<String>;

    /// Set a column from its OVSDB JSON value.
    fn set_column(&mut self, name: &str, val: &Value) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// `Some` only for rows whose table has an `external_ids` column.
    fn external_ids(&self) -> Option<&dyn ExternalIds> {
        None
    }

    fn external_ids_mut(&mut self) -> Option<&mut dyn ExternalIds> {
        None
    }

    fn has_external_ids(&self) -> bool {
        self.external_ids().is_some()
    }

    fn try_set_external_id(&mut self, key: &str, value: &str) -> Result<()> {
        let ids = self.external_ids_mut().ok_or_else(missing_external_ids)?;
        ids.set_external_id(key, value);
        Ok(())
    }

    fn try_get_external_id(&self, key: &str) -> Result<Option<&str>> {
        let ids = self.external_ids().ok_or_else(missing_external_ids)?;
        Ok(ids.get_external_id(key))
    }

    fn try_remove_external_id(&mut self, key: &str) -> Result<Option<String>> {
        let ids = self.external_ids_mut().ok_or_else(missing_external_ids)?;
        Ok(ids.remove_external_id(key))
    }
}

/// Rows carrying an `external_ids` string map.
pub trait ExternalIds {
    fn set_external_id(&mut self, key: &str, value: &str);

    fn get_external_id(&self, key: &str) -> Option<&str>;

    fn remove_external_id(&mut self, key: &str) -> Option<String>;
}

fn missing_external_ids() -> OvsdbError {
    OvsdbError::UnknownColumn(EXTERNAL_IDS_COLUMN.to_string())
}

/// A generated table aggregate: an ordered list of rows of one type.
pub trait Table: fmt::Debug {
    fn table_name(&self) -> &'static str;

    fn is_root(&self) -> bool;

    fn rows(&self) -> Vec<&dyn Row>;

    /// An empty row of this table's type.
    fn new_row(&self) -> Box<dyn Row>;

    /// Append a row; panics with [`OvsdbError::BadType`] if it belongs to another table.
    fn append_row(&mut self, row: Box<dyn Row>);

    fn has_index(&self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dyn-level counterpart of the generated `get_by_any_index`.
    fn get_row_by_any_index(&self, row: &dyn Row) -> Option<&dyn Row>;

    /// Dyn-level counterpart of the generated `find_one_match_non_zeros`.
    fn find_row_match_non_zeros(&self, row: &dyn Row) -> Option<&dyn Row>;
}

/// A generated database: one table per schema table.
pub trait Database {
    fn tables(&self) -> Vec<&dyn Table>;

    /// Table by its schema name.
    fn table(&self, name: &str) -> Option<&dyn Table>;

    fn table_mut(&mut self, name: &str) -> Option<&mut dyn Table>;

    /// Route `row` to its table's non-zero match. Panics with
    /// [`OvsdbError::BadType`] when no table of this database owns the row type.
    fn find_row_match_non_zeros(&self, row: &dyn Row) -> Option<&dyn Row>;

    /// Route `row` to its table's any-index lookup, under the same panic policy.
    fn find_row_match_by_any_index(&self, row: &dyn Row) -> Option<&dyn Row>;
}

/// Borrow `row` as a concrete row type.
pub fn row_ref<R: Row>(row: &dyn Row) -> Option<&R> {
    row.as_any().downcast_ref::<R>()
}

/// Take ownership of `row` as a concrete row type, panicking on a mismatch.
pub fn downcast_row<R: Row>(row: Box<dyn Row>) -> R {
    let table = row.table_name();
    match row.into_any().downcast::<R>() {
        Ok(row) => *row,
        Err(_) => bad_type(table),
    }
}

/// A row of a type no generated table owns reached a typed boundary.
pub fn bad_type(table: &str) -> ! {
    panic!("{}", OvsdbError::BadType(table.to_string()))
}

/// Wrap a coercion failure with the column and a debug rendering of the value.
pub fn column_error(column: &str, val: &Value, err: OvsdbError) -> OvsdbError {
    OvsdbError::SetColumn {
        column: column.to_string(),
        value: format!("{val:?}"),
        source: Box::new(err),
    }
}
