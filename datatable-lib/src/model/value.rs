//! CellValue enum for dynamic cell values

use std::cmp::Ordering;
use std::fmt;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// A dynamic value resolved from a row for one column.
///
/// Accessors produce a `CellValue` for every cell; the filter engine, the sort
/// engine and the exporters only ever look at rows through this type.
///
/// # Type Mapping
///
/// | JSON / source value | Rust Variant |
/// |---------------------|--------------|
/// | null, missing       | `Null` |
/// | true / false        | `Bool` |
/// | integer             | `Int` |
/// | fractional number   | `Float` |
/// | string              | `String` (kept verbatim, dates included) |
/// | array, object       | `Json` |
///
/// # Example
///
/// ```ignore
/// use datatable_lib::model::CellValue;
///
/// let name = CellValue::from("Alice");
/// let age = CellValue::from(30);
/// let empty = CellValue::Null;
/// assert_eq!(age.to_string(), "30");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    /// Null/missing value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value. Listed before `DateTime` so deserialized text stays
    /// verbatim.
    String(String),
    /// Date and time.
    DateTime(DateTime<Utc>),
    /// Fallback for structured JSON values.
    Json(serde_json::Value),
}

impl CellValue {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "bool",
            CellValue::Int(_) => "int",
            CellValue::Float(_) => "float",
            CellValue::DateTime(_) => "datetime",
            CellValue::String(_) => "string",
            CellValue::Json(_) => "json",
        }
    }

    /// Returns the numeric value for `Int` and `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(n) => Some(*n as f64),
            CellValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice for `String` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Value equality where integers and floats compare numerically.
    ///
    /// Used by the `in` operator; nothing is stringified.
    pub fn loose_eq(&self, other: &CellValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Native ordering between two values of comparable types.
    ///
    /// Numbers compare numerically, strings lexicographically, dates by
    /// instant and booleans `false < true`. Two strings that both parse as
    /// dates compare by instant, and a date compares with a string that
    /// parses as a date. Any other pairing (including `Null` on either
    /// side) is incomparable and returns `None`.
    pub fn compare(&self, other: &CellValue) -> Option<Ordering> {
        match (self, other) {
            (CellValue::Int(a), CellValue::Int(b)) => Some(a.cmp(b)),
            (CellValue::String(a), CellValue::String(b)) => match (parse_date(a), parse_date(b)) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => Some(a.cmp(b)),
            },
            (CellValue::DateTime(a), CellValue::DateTime(b)) => Some(a.cmp(b)),
            (CellValue::DateTime(a), CellValue::String(b)) => parse_date(b).map(|b| a.cmp(&b)),
            (CellValue::String(a), CellValue::DateTime(b)) => parse_date(a).map(|a| a.cmp(b)),
            (CellValue::Bool(a), CellValue::Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Int(n) => write!(f, "{}", n),
            CellValue::Float(n) if n.is_infinite() => {
                if n.is_sign_positive() {
                    f.write_str("Infinity")
                } else {
                    f.write_str("-Infinity")
                }
            }
            CellValue::Float(n) => write!(f, "{}", n),
            CellValue::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            CellValue::String(s) => f.write_str(s),
            CellValue::Json(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Int(v as i64)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}

impl From<u32> for CellValue {
    fn from(v: u32) -> Self {
        CellValue::Int(v as i64)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::String(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(v: DateTime<Utc>) -> Self {
        CellValue::DateTime(v)
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Null),
            },
            serde_json::Value::String(s) => CellValue::String(s),
            other => CellValue::Json(other),
        }
    }
}

impl From<&CellValue> for serde_json::Value {
    fn from(v: &CellValue) -> Self {
        match v {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Int(n) => serde_json::Value::from(*n),
            CellValue::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::DateTime(_) => serde_json::Value::String(v.to_string()),
            CellValue::String(s) => serde_json::Value::String(s.clone()),
            CellValue::Json(j) => j.clone(),
        }
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => CellValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_plain_stringification() {
        assert_eq!(CellValue::from(30).to_string(), "30");
        assert_eq!(CellValue::from(30.0).to_string(), "30");
        assert_eq!(CellValue::from(1.5).to_string(), "1.5");
        assert_eq!(CellValue::from(true).to_string(), "true");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn test_compare_numbers_across_int_and_float() {
        let a = CellValue::from(30);
        let b = CellValue::from(30.5);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert!(CellValue::from(2).loose_eq(&CellValue::from(2.0)));
    }

    #[test]
    fn test_compare_mismatched_types_is_none() {
        assert_eq!(CellValue::from("30").compare(&CellValue::from(30)), None);
        assert_eq!(CellValue::Null.compare(&CellValue::Null), None);
    }

    #[test]
    fn test_date_compares_with_plain_date_string() {
        let cell = CellValue::from(parse_date("2024-03-01T10:00:00Z").unwrap());
        assert_eq!(cell.compare(&CellValue::from("2024-03-01")), Some(Ordering::Greater));
        assert_eq!(cell.compare(&CellValue::from("not a date")), None);
    }

    #[test]
    fn test_from_json_keeps_timestamp_text() {
        let raw = "2024-03-01T10:00:00.000+02:00";
        let value = CellValue::from(serde_json::json!(raw));
        assert_eq!(value, CellValue::from(raw));
        assert_eq!(value.to_string(), raw);
        assert_eq!(serde_json::Value::from(&value), serde_json::json!(raw));
    }

    #[test]
    fn test_deserialized_timestamp_stays_a_string() {
        let value: CellValue = serde_json::from_str("\"2024-03-01T10:00:00+00:00\"").unwrap();
        assert_eq!(value, CellValue::from("2024-03-01T10:00:00+00:00"));
    }

    #[test]
    fn test_date_strings_compare_by_instant() {
        let a = CellValue::from("2024-03-01T10:00:00+02:00");
        let b = CellValue::from("2024-03-01T09:00:00Z");
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(CellValue::from("b").compare(&CellValue::from("a")), Some(Ordering::Greater));
    }
}
