//! Caller-supplied attribute values for inserts and updates.

use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::{DateTime, NaiveDate, Utc};
use sea_query::{SimpleExpr, Value};

use crate::types::{Record, json_to_value};

/// A value to be written to an attribute.
///
/// Plain values are bound as parameters; expressions (e.g. a prepared geometry
/// constructor) are written into the statement as-is.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A plain value.
    Json(serde_json::Value),
    /// A prepared SQL expression.
    Expr(SimpleExpr),
}

impl FieldValue {
    /// Returns the value as text when it is a plain string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Json(serde_json::Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Converts the value into the expression written to the statement.
    #[must_use]
    pub fn into_expr(self) -> SimpleExpr {
        match self {
            Self::Json(value) => SimpleExpr::Value(json_to_value(value)),
            Self::Expr(expr) => expr,
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<SimpleExpr> for FieldValue {
    fn from(expr: SimpleExpr) -> Self {
        Self::Expr(expr)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Json(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Json(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Json(value.into())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Json(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Json(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Json(value.into())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Expr(SimpleExpr::Value(Value::from(value)))
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Expr(SimpleExpr::Value(Value::from(value)))
    }
}

/// Attribute values keyed by attribute name.
///
/// Keys are kept sorted so generated statements list their columns in a
/// stable order.
#[derive(Debug, Clone, Default)]
pub struct Values(BTreeMap<String, FieldValue>);

impl Values {
    /// Creates an empty set of values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute value.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets an attribute value in place, returning the previous one.
    pub fn insert(
        &mut self, name: impl Into<String>, value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Removes an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    /// Keeps only the attributes for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|name, _| keep(name));
    }

    /// Number of attributes set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates attributes in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.0.iter()
    }
}

impl From<Record> for Values {
    fn from(record: Record) -> Self {
        Self(record.into_iter().map(|(name, value)| (name, FieldValue::Json(value))).collect())
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
    }
}

impl IntoIterator for Values {
    type IntoIter = btree_map::IntoIter<String, FieldValue>;
    type Item = (String, FieldValue);

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Values {
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;
    type Item = (&'a String, &'a FieldValue);

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn values_are_sorted_by_name() {
        let values = Values::new().set("title", "a").set("content", "b").set("likes", 1);
        let names: Vec<&str> = values.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["content", "likes", "title"]);
    }

    #[test]
    fn from_record_keeps_json() {
        let mut record = Record::new();
        record.insert("name".to_string(), json!("p1"));
        let values = Values::from(record);
        assert_eq!(values.get("name").and_then(FieldValue::as_str), Some("p1"));
    }

    #[test]
    fn plain_values_bind_as_parameters() {
        let expr = FieldValue::from(7).into_expr();
        assert!(matches!(expr, SimpleExpr::Value(Value::BigInt(Some(7)))));
    }
}
