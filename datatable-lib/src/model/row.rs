//! Row identity and the TableRow trait

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::CellValue;

/// Stable identity of a row.
///
/// Selection and expansion are keyed by this value, so it must stay the same
/// for a row across reloads, filtering and sorting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    /// Numeric identity.
    Int(i64),
    /// String identity.
    Str(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(n) => write!(f, "{}", n),
            RowId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowId {
    fn from(v: i64) -> Self {
        RowId::Int(v)
    }
}

impl From<i32> for RowId {
    fn from(v: i32) -> Self {
        RowId::Int(v as i64)
    }
}

impl From<u32> for RowId {
    fn from(v: u32) -> Self {
        RowId::Int(v as i64)
    }
}

impl From<String> for RowId {
    fn from(v: String) -> Self {
        RowId::Str(v)
    }
}

impl From<&str> for RowId {
    fn from(v: &str) -> Self {
        RowId::Str(v.to_string())
    }
}

/// Trait for items that can be displayed as rows in a DataTable.
///
/// Rows are never mutated by the table. `field` backs key-based column
/// accessors; types that only use accessor functions can keep the default.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone)]
/// struct User { id: u32, name: String }
///
/// impl TableRow for User {
///     fn id(&self) -> RowId { self.id.into() }
///
///     fn field(&self, key: &str) -> CellValue {
///         match key {
///             "name" => self.name.as_str().into(),
///             _ => CellValue::Null,
///         }
///     }
/// }
/// ```
pub trait TableRow: Clone + Send + Sync + 'static {
    /// Unique identifier for this row.
    fn id(&self) -> RowId;

    /// Raw value stored under `key`, or `Null` when absent.
    fn field(&self, key: &str) -> CellValue {
        let _ = key;
        CellValue::Null
    }
}
