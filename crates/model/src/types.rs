//! Transport types exchanged with a [`Connection`](crate::Connection).

use anyhow::{Result, bail};
use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use sea_query::{Value, Values};
use serde_json::{Map, Number};

/// A record: one row keyed by column name, as returned to callers and held by instances.
pub type Record = Map<String, serde_json::Value>;

/// A nullable SQL value as bound to a placeholder or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// Boolean value.
    Boolean(Option<bool>),
    /// 32-bit signed integer.
    Int32(Option<i32>),
    /// 64-bit signed integer.
    Int64(Option<i64>),
    /// 32-bit unsigned integer.
    Uint32(Option<u32>),
    /// 64-bit unsigned integer.
    Uint64(Option<u64>),
    /// 32-bit float.
    Float(Option<f32>),
    /// 64-bit float.
    Double(Option<f64>),
    /// Text.
    Str(Option<String>),
    /// Raw bytes.
    Binary(Option<Vec<u8>>),
    /// Date as `YYYY-MM-DD`.
    Date(Option<String>),
    /// Time of day.
    Time(Option<String>),
    /// Timestamp, RFC 3339 when zoned.
    Timestamp(Option<String>),
}

/// A named column value within a [`Row`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Column name (or alias).
    pub name: String,
    /// Column value.
    pub value: DataType,
}

/// A result row as produced by a connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Columns in result order.
    pub fields: Vec<Field>,
}

impl Row {
    /// Creates a row from `(name, value)` pairs.
    #[must_use]
    pub fn new(fields: impl IntoIterator<Item = (impl Into<String>, DataType)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| Field {
                    name: name.into(),
                    value,
                })
                .collect(),
        }
    }
}

// Outbound conversion (internal use only)
pub(crate) fn values_to_datatypes(values: Values) -> Result<Vec<DataType>> {
    values.into_iter().map(value_to_datatype).collect()
}

fn value_to_datatype(value: Value) -> Result<DataType> {
    let data_type = match value {
        Value::Bool(v) => DataType::Boolean(v),
        Value::TinyInt(v) => DataType::Int32(v.map(i32::from)),
        Value::SmallInt(v) => DataType::Int32(v.map(i32::from)),
        Value::Int(v) => DataType::Int32(v),
        Value::BigInt(v) => DataType::Int64(v),
        Value::TinyUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::SmallUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::Unsigned(v) => DataType::Uint32(v),
        Value::BigUnsigned(v) => DataType::Uint64(v),
        Value::Float(v) => DataType::Float(v),
        Value::Double(v) => DataType::Double(v),
        Value::String(v) => DataType::Str(v.map(|value| *value)),
        Value::ChronoDate(v) => DataType::Date(v.map(|value| value.to_string())),
        Value::ChronoTime(v) => DataType::Time(v.map(|value| value.to_string())),
        Value::ChronoDateTime(v) => DataType::Timestamp(v.map(|value| value.to_string())),
        Value::ChronoDateTimeUtc(v) => DataType::Timestamp(v.map(|value| {
            let dt: DateTime<Utc> = *value;
            dt.to_rfc3339()
        })),
        Value::Char(v) => DataType::Str(v.map(|ch| ch.to_string())),
        Value::Bytes(v) => DataType::Binary(v.map(|bytes| *bytes)),
        _ => {
            bail!("unsupported values require explicit conversion before building the query")
        }
    };
    Ok(data_type)
}

// Inbound conversion
pub(crate) fn row_to_record(row: Row) -> Record {
    let mut record = Map::new();
    for field in row.fields {
        let value = match field.value {
            DataType::Int32(Some(v)) => serde_json::Value::Number(v.into()),
            DataType::Int64(Some(v)) => serde_json::Value::Number(v.into()),
            DataType::Uint32(Some(v)) => serde_json::Value::Number(v.into()),
            DataType::Uint64(Some(v)) => serde_json::Value::Number(v.into()),
            DataType::Float(Some(v)) => {
                Number::from_f64(f64::from(v)).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            DataType::Double(Some(v)) => {
                Number::from_f64(v).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            DataType::Boolean(Some(v)) => serde_json::Value::Bool(v),
            DataType::Str(Some(v))
            | DataType::Date(Some(v))
            | DataType::Time(Some(v))
            | DataType::Timestamp(Some(v)) => serde_json::Value::String(v),
            DataType::Binary(Some(v)) => serde_json::Value::String(Base64::encode_string(&v)),
            DataType::Boolean(None)
            | DataType::Int32(None)
            | DataType::Int64(None)
            | DataType::Uint32(None)
            | DataType::Uint64(None)
            | DataType::Float(None)
            | DataType::Double(None)
            | DataType::Str(None)
            | DataType::Binary(None)
            | DataType::Date(None)
            | DataType::Time(None)
            | DataType::Timestamp(None) => serde_json::Value::Null,
        };
        record.insert(field.name, value);
    }
    record
}

/// Converts a JSON value into a bindable SQL value.
///
/// Arrays and objects are bound as their JSON text.
pub(crate) fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::String(None),
        serde_json::Value::Bool(v) => Value::Bool(Some(v)),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::BigInt(Some(v))
            } else if let Some(v) = n.as_u64() {
                Value::BigUnsigned(Some(v))
            } else {
                Value::Double(n.as_f64())
            }
        }
        serde_json::Value::String(v) => Value::String(Some(Box::new(v))),
        other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
            Value::String(Some(Box::new(other.to_string())))
        }
    }
}
