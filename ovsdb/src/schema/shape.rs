//! Cardinality classification of columns and the runtime operator family each
//! classification selects.

use super::types::{AtomicType, Column, ColumnType, Table};
use crate::error::{OvsdbError, Result};
use std::fmt;

/// Structural shape of a column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Exactly one value.
    Atom,
    /// Zero or one value.
    Optional,
    /// Ordered sequence of values.
    Multiples,
    /// Key to value mapping.
    Map,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Atom => "Atom",
            Shape::Optional => "Optional",
            Shape::Multiples => "Multiples",
            Shape::Map => "Map",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a column type. First match wins:
/// value present, then unlimited max, then the `(min, max)` pair.
///
/// `min > 1, max = 1` is accepted as [`Shape::Atom`].
pub fn classify(ty: &ColumnType) -> std::result::Result<Shape, MalformedCardinality> {
    if ty.value.is_some() {
        return Ok(Shape::Map);
    }
    if ty.max_unlimited {
        return Ok(Shape::Multiples);
    }
    match (ty.min, ty.max) {
        (0, 0) => Err(MalformedCardinality),
        (0, 1) => Ok(Shape::Optional),
        (0, _) => Ok(Shape::Multiples),
        (_, 1) => Ok(Shape::Atom),
        _ => Ok(Shape::Multiples),
    }
}

/// `min = 0, max = 0` on a bounded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedCardinality;

/// The runtime operator family selected by a column's shape and atomic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorFamily {
    pub shape: Shape,
    pub key: AtomicType,
    pub value: Option<AtomicType>,
}

impl OperatorFamily {
    /// Whether `ovsdb::types` implements `Family` for this combination.
    pub fn is_supported(&self) -> bool {
        match (self.shape, self.value) {
            (Shape::Map, Some(_)) => self.key.is_orderable(),
            (Shape::Map, None) => false,
            (_, None) => true,
            (_, Some(_)) => false,
        }
    }
}

impl fmt::Display for OperatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(
                f,
                "{}<{}, {}>",
                self.shape,
                self.key.export_name(),
                value.export_name()
            ),
            None => write!(f, "{}<{}>", self.shape, self.key.export_name()),
        }
    }
}

impl Column {
    /// Shape of this column, with table/column context on failure.
    pub fn shape(&self, table: &Table) -> Result<Shape> {
        classify(&self.ty).map_err(|MalformedCardinality| OvsdbError::Cardinality {
            table: table.name.clone(),
            column: self.name.clone(),
        })
    }

    /// Operator family used for every generated call site touching this column.
    pub fn family(&self, table: &Table) -> Result<OperatorFamily> {
        let family = OperatorFamily {
            shape: self.shape(table)?,
            key: self.ty.key.atomic,
            value: self.ty.value.as_ref().map(|v| v.atomic),
        };
        if !family.is_supported() {
            return Err(OvsdbError::UnsupportedShape {
                table: table.name.clone(),
                column: self.name.clone(),
                family: family.to_string(),
            });
        }
        Ok(family)
    }
}
