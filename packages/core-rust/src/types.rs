use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Stable identity of a dataset row. Selection is tracked by key, never by index.
pub type RowKey = String;

/// A single dataset row: column name to cell value.
pub type Row = BTreeMap<String, Value>;

/// Generic runtime value type for dataset cells.
///
/// Supports all JSON-compatible types plus an explicit timestamp variant for
/// rows built in Rust. Serializes untagged, so a snapshot of a row is plain
/// JSON. Date-typed columns also accept RFC 3339 / `YYYY-MM-DD` strings and
/// epoch milliseconds; see [`Value::as_datetime`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON integer (signed 64-bit).
    Int(i64),
    /// JSON floating-point (64-bit IEEE 754).
    Float(f64),
    /// JSON string (UTF-8).
    String(String),
    /// JSON array (ordered sequence of values).
    Array(Vec<Value>),
    /// JSON object. Uses `BTreeMap` for deterministic serialization order.
    Map(BTreeMap<String, Value>),
    /// UTC timestamp. Serializes as an RFC 3339 string and therefore comes
    /// back as [`Value::String`] after a JSON round trip.
    Date(DateTime<Utc>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value. Strings are parsed leniently so that
    /// numbers typed into a filter box still compare numerically.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Boolean view of the value (`"true"`/`"false"` strings included).
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Self::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Chronological view of the value.
    ///
    /// Accepts [`Value::Date`], integers as epoch milliseconds, and strings in
    /// RFC 3339, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD` form.
    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Int(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::String(s) => parse_datetime(s),
            _ => None,
        }
    }

    /// Plain-text rendering used for substring matching and lexical ordering.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Converts into a `serde_json::Value` for handing to schema validators.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::Date(d) => serde_json::Value::String(d.to_rfc3339()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Map(_) => write!(f, "{}", self.to_json()),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

/// Parses the date formats accepted for `date` columns.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Builds a [`Row`] from `(column, value)` pairs.
///
/// ```
/// use schemaview_core::types::{row, Value};
///
/// let r = row([("name", Value::from("Acme")), ("amount", Value::from(12))]);
/// assert_eq!(r.get("amount"), Some(&Value::Int(12)));
/// ```
pub fn row<I, K>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_view_parses_strings() {
        assert_eq!(Value::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Bool(true).as_f64(), None);
    }

    #[test]
    fn datetime_view_accepts_all_supported_forms() {
        let rfc = Value::from("2024-03-01T10:00:00Z").as_datetime().expect("rfc3339");
        let naive = Value::from("2024-03-01T10:00:00").as_datetime().expect("naive");
        let day = Value::from("2024-03-01").as_datetime().expect("date only");
        assert_eq!(rfc, naive);
        assert!(day < rfc);
        let millis = Value::Int(rfc.timestamp_millis()).as_datetime().expect("millis");
        assert_eq!(millis, rfc);
        assert_eq!(Value::from("not a date").as_datetime(), None);
    }

    #[test]
    fn display_text_of_null_is_empty() {
        assert_eq!(Value::Null.display_text(), "");
        assert_eq!(Value::Array(vec![Value::from("a"), Value::Int(2)]).display_text(), "a, 2");
    }

    #[test]
    fn json_conversion_keeps_shape() {
        let json = serde_json::json!({"a": [1, 2.5, "x", null, true]});
        let value = Value::from(json.clone());
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn untagged_serde_is_plain_json() {
        let r = row([("k", Value::Int(1)), ("n", Value::Null)]);
        let text = serde_json::to_string(&r).expect("serialize");
        assert_eq!(text, r#"{"k":1,"n":null}"#);
        let back: Row = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, r);
    }
}
