use super::Value;
use crate::error::{OvsdbError, Result};
use std::fmt;

/// An OVSDB atomic type as seen by generated code: its Rust representation,
/// zero value, wire coercion and command-line rendering.
pub trait AtomKind {
    type Native: Clone + PartialEq + Default + fmt::Debug;

    /// Schema spelling of the type, used in error messages.
    const NAME: &'static str;

    fn is_zero(v: &Self::Native) -> bool {
        *v == Self::Native::default()
    }

    /// Convert a JSON atom into the native value.
    fn coerce(v: &Value) -> Result<Self::Native>;

    /// Render the value in ovs-vsctl argument syntax.
    fn render(v: &Self::Native) -> String;
}

pub enum IntegerAtom {}
pub enum RealAtom {}
pub enum BooleanAtom {}
pub enum StringAtom {}
pub enum UuidAtom {}

pub(crate) fn mismatch(expected: &'static str, v: &Value) -> OvsdbError {
    OvsdbError::Coerce {
        expected,
        value: v.to_string(),
    }
}

impl AtomKind for IntegerAtom {
    type Native = i64;
    const NAME: &'static str = "integer";

    fn coerce(v: &Value) -> Result<i64> {
        v.as_i64().ok_or_else(|| mismatch(Self::NAME, v))
    }

    fn render(v: &i64) -> String {
        v.to_string()
    }
}

impl AtomKind for RealAtom {
    type Native = f64;
    const NAME: &'static str = "real";

    fn coerce(v: &Value) -> Result<f64> {
        v.as_f64().ok_or_else(|| mismatch(Self::NAME, v))
    }

    fn render(v: &f64) -> String {
        v.to_string()
    }
}

impl AtomKind for BooleanAtom {
    type Native = bool;
    const NAME: &'static str = "boolean";

    fn coerce(v: &Value) -> Result<bool> {
        v.as_bool().ok_or_else(|| mismatch(Self::NAME, v))
    }

    fn render(v: &bool) -> String {
        v.to_string()
    }
}

impl AtomKind for StringAtom {
    type Native = String;
    const NAME: &'static str = "string";

    fn coerce(v: &Value) -> Result<String> {
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(Self::NAME, v))
    }

    fn render(v: &String) -> String {
        Value::String(v.clone()).to_string()
    }
}

impl AtomKind for UuidAtom {
    type Native = String;
    const NAME: &'static str = "uuid";

    /// Accepts `["uuid", "<uuid>"]`, `["named-uuid", "<name>"]` and a bare uuid string.
    fn coerce(v: &Value) -> Result<String> {
        let (tag, id) = match v {
            Value::Array(pair) if pair.len() == 2 => match (pair[0].as_str(), pair[1].as_str()) {
                (Some(tag), Some(id)) => (tag, id),
                _ => return Err(mismatch(Self::NAME, v)),
            },
            Value::String(id) => ("uuid", id.as_str()),
            _ => return Err(mismatch(Self::NAME, v)),
        };
        match tag {
            "uuid" => uuid::Uuid::parse_str(id)
                .map(|_| id.to_string())
                .map_err(|_| mismatch(Self::NAME, v)),
            "named-uuid" => Ok(id.to_string()),
            _ => Err(mismatch(Self::NAME, v)),
        }
    }

    fn render(v: &String) -> String {
        v.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &str = "36d0cc37-2c8d-4b36-9a3c-6e0d6a5e0b5c";

    #[test]
    fn test_coerce_scalars() {
        assert_eq!(IntegerAtom::coerce(&json!(42)).unwrap(), 42);
        assert_eq!(RealAtom::coerce(&json!(1.5)).unwrap(), 1.5);
        assert_eq!(RealAtom::coerce(&json!(2)).unwrap(), 2.0);
        assert!(BooleanAtom::coerce(&json!(true)).unwrap());
        assert_eq!(StringAtom::coerce(&json!("br0")).unwrap(), "br0");
    }

    #[test]
    fn test_coerce_mismatch() {
        let err = IntegerAtom::coerce(&json!("42")).unwrap_err();
        assert_eq!(err.to_string(), "Expected integer, got \"42\"");
        assert!(BooleanAtom::coerce(&json!(1)).is_err());
    }

    #[test]
    fn test_coerce_uuid_forms() {
        assert_eq!(UuidAtom::coerce(&json!(["uuid", ID])).unwrap(), ID);
        assert_eq!(UuidAtom::coerce(&json!(ID)).unwrap(), ID);
        assert_eq!(UuidAtom::coerce(&json!(["named-uuid", "row0"])).unwrap(), "row0");
        assert!(UuidAtom::coerce(&json!(["uuid", "not-a-uuid"])).is_err());
        assert!(UuidAtom::coerce(&json!(["set", []])).is_err());
    }

    #[test]
    fn test_zero_values() {
        assert!(IntegerAtom::is_zero(&0));
        assert!(!IntegerAtom::is_zero(&7));
        assert!(StringAtom::is_zero(&String::new()));
        assert!(!BooleanAtom::is_zero(&true));
    }

    #[test]
    fn test_render() {
        assert_eq!(StringAtom::render(&"a \"b\"".to_string()), r#""a \"b\"""#);
        assert_eq!(UuidAtom::render(&ID.to_string()), ID);
        assert_eq!(IntegerAtom::render(&-3), "-3");
    }
}
