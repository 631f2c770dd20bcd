//! Record and value model for the table view engine

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A field value on a record
///
/// Records come from an external data source with loosely-typed fields,
/// so the engine works against a small dynamic value model rather than
/// concrete row structs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent / NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Date (calendar day)
    Date(NaiveDate),
    /// DateTime with timezone (UTC)
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64
    ///
    /// Coerces across the numeric variants; non-numeric values return
    /// `None` so range filters can treat them as out of bounds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as a calendar day
    ///
    /// Date comparisons in the engine are by calendar day, so a
    /// `DateTime` collapses to its UTC date here.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date_naive()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

/// A record from the external data source
///
/// Owned by the data source; the engine only reads field values named
/// in column and filter definitions and never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable unique identifier
    pub id: String,
    /// Field values keyed by field name
    pub fields: IndexMap<String, Value>,
}

impl Record {
    /// Create a record with no fields
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field value (builder style)
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Get a field value by key
    ///
    /// Unresolved keys read as absent - columns over them render empty,
    /// never an error.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_numeric_coercion() {
        assert_eq!(Value::Int(5).as_f64(), Some(5.0));
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::String("5".to_string()).as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_value_as_date_collapses_datetime() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let dt = day.and_hms_opt(13, 45, 0).unwrap().and_utc();
        assert_eq!(Value::Date(day).as_date(), Some(day));
        assert_eq!(Value::DateTime(dt).as_date(), Some(day));
        assert_eq!(Value::Int(3).as_date(), None);
    }

    #[test]
    fn test_record_missing_field_is_absent() {
        let record = Record::new("r1").field("name", "Alice");
        assert_eq!(record.get("name"), Some(&Value::String("Alice".into())));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_null_displays_empty() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Int(7).to_string(), "7");
    }
}
