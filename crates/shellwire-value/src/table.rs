//! Script tables in canonical form.
//!
//! A table has a positional part (keys `1..=N`, no holes, no nils) and an
//! associative part holding every other key. Integer keys that would extend
//! the positional part are always migrated into it, so two tables with the
//! same contents compare equal no matter how they were built.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::{CodecError, Result};
use crate::value::{integral, Value};

/// A value usable as a table key.
#[derive(Debug, Clone)]
pub enum TableKey {
    Boolean(bool),
    Integer(i64),
    /// Never NaN and never integral; integral numbers become `Integer`.
    Number(f64),
    String(Bytes),
}

impl TableKey {
    /// Normalize a value into a key, or say why it cannot be one.
    pub fn from_value(value: &Value) -> std::result::Result<Self, &'static str> {
        match value {
            Value::Nil => Err("nil key"),
            Value::Boolean(b) => Ok(TableKey::Boolean(*b)),
            Value::Integer(i) => Ok(TableKey::Integer(*i)),
            Value::Number(n) if n.is_nan() => Err("NaN key"),
            Value::Number(n) => Ok(integral(*n).map_or(TableKey::Number(*n), TableKey::Integer)),
            Value::String(s) => Ok(TableKey::String(s.clone())),
            Value::Table(_) => Err("table key"),
            Value::Ref(_) => Err("reference key"),
            Value::Function(_) => Err("function key"),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            TableKey::Boolean(b) => Value::Boolean(*b),
            TableKey::Integer(i) => Value::Integer(*i),
            TableKey::Number(n) => Value::Number(*n),
            TableKey::String(s) => Value::String(s.clone()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            TableKey::Boolean(_) => 0,
            TableKey::Integer(_) => 1,
            TableKey::Number(_) => 2,
            TableKey::String(_) => 3,
        }
    }
}

impl Ord for TableKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (TableKey::Boolean(a), TableKey::Boolean(b)) => a.cmp(b),
            (TableKey::Integer(a), TableKey::Integer(b)) => a.cmp(b),
            (TableKey::Number(a), TableKey::Number(b)) => a.total_cmp(b),
            (TableKey::String(a), TableKey::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for TableKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TableKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TableKey {}

/// A script table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    array: Vec<Value>,
    fields: BTreeMap<TableKey, Value>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from positional values. A nil ends the positional
    /// part; later values keep their index as an associative key.
    pub fn from_array(values: Vec<Value>) -> Self {
        let mut table = Self::new();
        for (i, value) in values.into_iter().enumerate() {
            table.set_key(TableKey::Integer(i as i64 + 1), value);
        }
        table
    }

    /// Append to the positional part.
    pub fn push(&mut self, value: impl Into<Value>) {
        let next = self.array.len() as i64 + 1;
        self.set_key(TableKey::Integer(next), value.into());
    }

    /// Set `key` to `value`; a nil value removes the key.
    pub fn set(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        let key = TableKey::from_value(&key.into()).map_err(CodecError::BadKey)?;
        self.set_key(key, value.into());
        Ok(())
    }

    pub fn get(&self, key: impl Into<Value>) -> Option<&Value> {
        let key = TableKey::from_value(&key.into()).ok()?;
        self.get_key(&key)
    }

    pub fn get_key(&self, key: &TableKey) -> Option<&Value> {
        match key {
            TableKey::Integer(i) if *i >= 1 && ((*i - 1) as u64) < self.array.len() as u64 => {
                self.array.get((*i - 1) as usize)
            }
            _ => self.fields.get(key),
        }
    }

    pub(crate) fn set_key(&mut self, key: TableKey, value: Value) {
        let len = self.array.len() as u64;
        match key {
            TableKey::Integer(i) if i >= 1 && ((i - 1) as u64) <= len => {
                let idx = (i - 1) as usize;
                if value.is_nil() {
                    if idx < self.array.len() {
                        // Everything after the hole leaves the positional part.
                        let tail = self.array.split_off(idx);
                        for (offset, moved) in tail.into_iter().enumerate().skip(1) {
                            self.fields.insert(TableKey::Integer(i + offset as i64), moved);
                        }
                    }
                } else if idx < self.array.len() {
                    self.array[idx] = value;
                } else {
                    self.array.push(value);
                    self.migrate_tail();
                }
            }
            key => {
                if value.is_nil() {
                    self.fields.remove(&key);
                } else {
                    self.fields.insert(key, value);
                }
            }
        }
    }

    fn migrate_tail(&mut self) {
        loop {
            let next = TableKey::Integer(self.array.len() as i64 + 1);
            match self.fields.remove(&next) {
                Some(value) => self.array.push(value),
                None => break,
            }
        }
    }

    /// The positional part, index 0 holding key 1.
    pub fn array(&self) -> &[Value] {
        &self.array
    }

    /// The associative part, in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&TableKey, &Value)> {
        self.fields.iter()
    }

    /// Every key/value pair: positional entries first, then the rest.
    pub fn pairs(&self) -> impl Iterator<Item = (TableKey, &Value)> {
        self.array
            .iter()
            .enumerate()
            .map(|(i, v)| (TableKey::Integer(i as i64 + 1), v))
            .chain(self.fields.iter().map(|(k, v)| (k.clone(), v)))
    }

    /// Number of key/value pairs.
    pub fn len(&self) -> usize {
        self.array.len() + self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty() && self.fields.is_empty()
    }
}

impl FromIterator<Value> for Table {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_array(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_keys_migrate_into_array() {
        let mut t = Table::new();
        t.set(3, "c").unwrap();
        t.set(2, "b").unwrap();
        assert!(t.array().is_empty());
        assert_eq!(t.fields().count(), 2);

        t.set(1, "a").unwrap();
        assert_eq!(
            t.array(),
            &[Value::from("a"), Value::from("b"), Value::from("c")]
        );
        assert_eq!(t.fields().count(), 0);
    }

    #[test]
    fn build_order_does_not_matter() {
        let mut forward = Table::new();
        forward.push("x");
        forward.push("y");
        forward.set("k", true).unwrap();

        let mut backward = Table::new();
        backward.set("k", true).unwrap();
        backward.set(2, "y").unwrap();
        backward.set(1.0, "x").unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn nil_punches_hole_and_moves_tail() {
        let mut t = Table::from_array(vec![1.into(), 2.into(), 3.into(), 4.into()]);
        t.set(2, Value::Nil).unwrap();

        assert_eq!(t.array(), &[Value::from(1)]);
        assert_eq!(t.get(3), Some(&Value::from(3)));
        assert_eq!(t.get(4), Some(&Value::from(4)));
        assert_eq!(t.get(2), None);
        assert_eq!(t.len(), 3);

        t.set(2, "back").unwrap();
        assert_eq!(t.array().len(), 4);
        assert_eq!(t.fields().count(), 0);
    }

    #[test]
    fn from_array_with_nil_gap() {
        let t = Table::from_array(vec![1.into(), Value::Nil, 3.into()]);
        assert_eq!(t.array(), &[Value::from(1)]);
        assert_eq!(t.get(3), Some(&Value::from(3)));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn float_keys_normalize() {
        let mut t = Table::new();
        t.set(1.5, "half").unwrap();
        t.set(1.0, "one").unwrap();
        assert_eq!(t.get(1), Some(&Value::from("one")));
        assert_eq!(t.get(1.5), Some(&Value::from("half")));
    }

    #[test]
    fn invalid_keys_rejected() {
        let mut t = Table::new();
        assert_eq!(t.set(Value::Nil, 1), Err(CodecError::BadKey("nil key")));
        assert_eq!(t.set(f64::NAN, 1), Err(CodecError::BadKey("NaN key")));
        assert_eq!(
            t.set(Table::new(), 1),
            Err(CodecError::BadKey("table key"))
        );
        assert!(t.is_empty());
    }

    #[test]
    fn setting_nil_removes_field() {
        let mut t = Table::new();
        t.set("a", 1).unwrap();
        t.set("a", Value::Nil).unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn pairs_list_positional_first() {
        let mut t = Table::from_array(vec!["x".into()]);
        t.set("k", 2).unwrap();
        let keys: Vec<_> = t.pairs().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![TableKey::Integer(1), TableKey::String(Bytes::from_static(b"k"))]
        );
    }
}
