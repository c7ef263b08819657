use super::atom::{mismatch, AtomKind};
use super::Value;
use crate::error::{OvsdbError, Result};
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Operators generated code needs for one (shape, atomic type) combination.
///
/// `Multiples<StringAtom>` is shared by every column holding an unbounded set
/// of strings, so generated call sites differ only in the field they touch.
pub trait Family {
    type Repr;

    fn matches(a: &Self::Repr, b: &Self::Repr) -> bool;

    fn is_zero(v: &Self::Repr) -> bool;

    /// True when `probe` is zero or equals `candidate`.
    fn matches_if_non_zero(candidate: &Self::Repr, probe: &Self::Repr) -> bool {
        Self::is_zero(probe) || Self::matches(candidate, probe)
    }

    /// `column=value` arguments for ovs-vsctl style commands; empty when there
    /// is nothing to write.
    fn cmd_args(column: &str, v: &Self::Repr) -> Vec<String>;

    /// Coerce an OVSDB JSON value into the field representation.
    fn ensure(v: &Value) -> Result<Self::Repr>;
}

pub struct Atom<K>(PhantomData<K>);
pub struct Optional<K>(PhantomData<K>);
pub struct Multiples<K>(PhantomData<K>);
pub struct Map<K, V>(PhantomData<(K, V)>);

/// Elements of `["set", [...]]`, or `None` when `v` is not a set.
fn set_elements(v: &Value) -> Option<&Vec<Value>> {
    match v {
        Value::Array(pair) if pair.len() == 2 && pair[0] == "set" => pair[1].as_array(),
        _ => None,
    }
}

impl<K: AtomKind> Family for Atom<K> {
    type Repr = K::Native;

    fn matches(a: &K::Native, b: &K::Native) -> bool {
        a == b
    }

    fn is_zero(v: &K::Native) -> bool {
        K::is_zero(v)
    }

    fn cmd_args(column: &str, v: &K::Native) -> Vec<String> {
        vec![format!("{column}={}", K::render(v))]
    }

    fn ensure(v: &Value) -> Result<K::Native> {
        match set_elements(v) {
            Some(items) if items.len() == 1 => K::coerce(&items[0]),
            Some(_) => Err(mismatch(K::NAME, v)),
            None => K::coerce(v),
        }
    }
}

impl<K: AtomKind> Family for Optional<K> {
    type Repr = Option<K::Native>;

    fn matches(a: &Option<K::Native>, b: &Option<K::Native>) -> bool {
        a == b
    }

    fn is_zero(v: &Option<K::Native>) -> bool {
        v.is_none()
    }

    fn cmd_args(column: &str, v: &Option<K::Native>) -> Vec<String> {
        match v {
            Some(v) => vec![format!("{column}={}", K::render(v))],
            None => Vec::new(),
        }
    }

    fn ensure(v: &Value) -> Result<Option<K::Native>> {
        match set_elements(v) {
            Some(items) => match items.as_slice() {
                [] => Ok(None),
                [item] => K::coerce(item).map(Some),
                _ => Err(mismatch(K::NAME, v)),
            },
            None if v.is_null() => Ok(None),
            None => K::coerce(v).map(Some),
        }
    }
}

impl<K: AtomKind> Family for Multiples<K> {
    type Repr = Vec<K::Native>;

    /// Multiset equality: element order is not significant, repeats are.
    fn matches(a: &Vec<K::Native>, b: &Vec<K::Native>) -> bool {
        if a.len() != b.len() {
            return false;
        }
        // Natives are only `PartialEq`.
        let mut taken = vec![false; b.len()];
        a.iter().all(|x| match (0..b.len()).find(|&i| !taken[i] && b[i] == *x) {
            Some(i) => {
                taken[i] = true;
                true
            }
            None => false,
        })
    }

    fn is_zero(v: &Vec<K::Native>) -> bool {
        v.is_empty()
    }

    fn cmd_args(column: &str, v: &Vec<K::Native>) -> Vec<String> {
        if v.is_empty() {
            return Vec::new();
        }
        let items: Vec<String> = v.iter().map(K::render).collect();
        vec![format!("{column}=[{}]", items.join(","))]
    }

    fn ensure(v: &Value) -> Result<Vec<K::Native>> {
        match set_elements(v) {
            Some(items) => items.iter().map(K::coerce).collect(),
            None if v.is_null() => Ok(Vec::new()),
            None => K::coerce(v).map(|item| vec![item]),
        }
    }
}

impl<K, V> Family for Map<K, V>
where
    K: AtomKind,
    K::Native: Ord,
    V: AtomKind,
{
    type Repr = BTreeMap<K::Native, V::Native>;

    fn matches(a: &Self::Repr, b: &Self::Repr) -> bool {
        a == b
    }

    fn is_zero(v: &Self::Repr) -> bool {
        v.is_empty()
    }

    fn cmd_args(column: &str, v: &Self::Repr) -> Vec<String> {
        if v.is_empty() {
            return Vec::new();
        }
        let pairs: Vec<String> = v
            .iter()
            .map(|(k, v)| format!("{}={}", K::render(k), V::render(v)))
            .collect();
        vec![format!("{column}={{{}}}", pairs.join(","))]
    }

    /// Accepts `["map", [[k, v], ...]]`, a JSON object with string keys, or null.
    fn ensure(v: &Value) -> Result<Self::Repr> {
        let expected = "map";
        match v {
            Value::Null => Ok(BTreeMap::new()),
            Value::Object(object) => object
                .iter()
                .map(|(k, val)| -> Result<(K::Native, V::Native)> {
                    Ok((K::coerce(&Value::String(k.clone()))?, V::coerce(val)?))
                })
                .collect(),
            Value::Array(pair) if pair.len() == 2 && pair[0] == "map" => {
                let entries = pair[1].as_array().ok_or_else(|| mismatch(expected, v))?;
                entries
                    .iter()
                    .map(|entry| -> Result<(K::Native, V::Native)> {
                        match entry.as_array().map(Vec::as_slice) {
                            Some([k, val]) => Ok((K::coerce(k)?, V::coerce(val)?)),
                            _ => Err(OvsdbError::Coerce {
                                expected,
                                value: entry.to_string(),
                            }),
                        }
                    })
                    .collect()
            }
            _ => Err(mismatch(expected, v)),
        }
    }
}
