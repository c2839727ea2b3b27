//! Column filters, global search and filter state.
//!
//! Filters are typed: each operator carries the value shape it needs, so a
//! `between` filter always holds exactly two bounds and an `in` filter always
//! holds a list. On the wire a filter keeps the familiar
//! `{"columnId", "operator", "value"}` object form; a value whose shape does
//! not fit its operator is rejected while deserializing.

mod draft;
mod engine;
mod location;
mod staging;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::model::CellValue;

pub use draft::*;
pub use engine::*;
pub use location::*;
pub use staging::*;

/// Comparison operator of a column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    Between,
    In,
}

impl FilterOperator {
    /// Returns the wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Between => "between",
            FilterOperator::In => "in",
        }
    }
}

/// A filter predicate together with its value.
///
/// Text operators compare against the stringified cell value; `Between` and
/// `In` compare native values.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Stringified equality (case-sensitive).
    Equals(String),
    /// Case-insensitive substring.
    Contains(String),
    /// Case-insensitive prefix.
    StartsWith(String),
    /// Case-insensitive suffix.
    EndsWith(String),
    /// Inclusive range `[min, max]`.
    Between(CellValue, CellValue),
    /// Membership in a list of allowed values.
    In(Vec<CellValue>),
}

impl FilterCondition {
    /// Returns the operator of this condition.
    pub fn operator(&self) -> FilterOperator {
        match self {
            FilterCondition::Equals(_) => FilterOperator::Equals,
            FilterCondition::Contains(_) => FilterOperator::Contains,
            FilterCondition::StartsWith(_) => FilterOperator::StartsWith,
            FilterCondition::EndsWith(_) => FilterOperator::EndsWith,
            FilterCondition::Between(_, _) => FilterOperator::Between,
            FilterCondition::In(_) => FilterOperator::In,
        }
    }

    /// Tests a cell value against this condition.
    ///
    /// Null cells never match. A `Between` whose bounds cannot be compared
    /// with the cell excludes it.
    pub fn matches(&self, cell: &CellValue) -> bool {
        if cell.is_null() {
            return false;
        }
        match self {
            FilterCondition::Equals(expected) => cell.to_string() == *expected,
            FilterCondition::Contains(term) => lower(cell).contains(&term.to_lowercase()),
            FilterCondition::StartsWith(term) => lower(cell).starts_with(&term.to_lowercase()),
            FilterCondition::EndsWith(term) => lower(cell).ends_with(&term.to_lowercase()),
            FilterCondition::Between(min, max) => {
                use std::cmp::Ordering;
                matches!(
                    (cell.compare(min), cell.compare(max)),
                    (Some(Ordering::Greater | Ordering::Equal), Some(Ordering::Less | Ordering::Equal))
                )
            }
            FilterCondition::In(values) => values.iter().any(|v| cell.loose_eq(v)),
        }
    }

    /// Number of values carried, as shown on filter chips.
    pub fn value_count(&self) -> usize {
        match self {
            FilterCondition::Between(_, _) => 2,
            FilterCondition::In(values) => values.len(),
            _ => 1,
        }
    }

    /// Returns `true` when the condition carries no usable value.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterCondition::Equals(s)
            | FilterCondition::Contains(s)
            | FilterCondition::StartsWith(s)
            | FilterCondition::EndsWith(s) => s.is_empty(),
            FilterCondition::Between(min, max) => min.is_null() && max.is_null(),
            FilterCondition::In(values) => values.is_empty(),
        }
    }

    /// The value as a JSON value (string for text operators, array otherwise).
    pub fn value_json(&self) -> serde_json::Value {
        match self {
            FilterCondition::Equals(s)
            | FilterCondition::Contains(s)
            | FilterCondition::StartsWith(s)
            | FilterCondition::EndsWith(s) => serde_json::Value::String(s.clone()),
            FilterCondition::Between(min, max) => serde_json::Value::Array(vec![min.into(), max.into()]),
            FilterCondition::In(values) => serde_json::Value::Array(values.iter().map(Into::into).collect()),
        }
    }

    /// Builds a condition from an operator and a JSON value.
    pub fn from_json(operator: FilterOperator, value: serde_json::Value) -> Result<Self, String> {
        match operator {
            FilterOperator::Equals => text_value(operator, value).map(FilterCondition::Equals),
            FilterOperator::Contains => text_value(operator, value).map(FilterCondition::Contains),
            FilterOperator::StartsWith => text_value(operator, value).map(FilterCondition::StartsWith),
            FilterOperator::EndsWith => text_value(operator, value).map(FilterCondition::EndsWith),
            FilterOperator::Between => match value {
                serde_json::Value::Array(bounds) if bounds.len() == 2 => {
                    let mut bounds = bounds.into_iter().map(CellValue::from);
                    let min = bounds.next().unwrap_or_default();
                    let max = bounds.next().unwrap_or_default();
                    Ok(FilterCondition::Between(min, max))
                }
                other => Err(format!("'between' expects a two-element array, got {}", other)),
            },
            FilterOperator::In => match value {
                serde_json::Value::Array(values) => {
                    Ok(FilterCondition::In(values.into_iter().map(CellValue::from).collect()))
                }
                other => Err(format!("'in' expects an array, got {}", other)),
            },
        }
    }
}

fn lower(cell: &CellValue) -> String {
    cell.to_string().to_lowercase()
}

fn text_value(operator: FilterOperator, value: serde_json::Value) -> Result<String, String> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(CellValue::from(serde_json::Value::Number(n)).to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("'{}' expects a scalar value, got {}", operator.as_str(), other)),
    }
}

/// A filter applied to one column.
///
/// # Example
///
/// ```ignore
/// use datatable_lib::filter::ColumnFilter;
///
/// let age = ColumnFilter::between("age", 26, 40);
/// let status = ColumnFilter::one_of("status", ["active", "pending"]);
/// let name = ColumnFilter::contains("name", "ali");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireFilter", into = "WireFilter")]
pub struct ColumnFilter {
    pub column_id: String,
    pub condition: FilterCondition,
}

impl ColumnFilter {
    /// Creates a filter from a column id and condition.
    pub fn new(column_id: impl Into<String>, condition: FilterCondition) -> Self {
        Self {
            column_id: column_id.into(),
            condition,
        }
    }

    /// Creates an equality filter.
    pub fn equals(column_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column_id, FilterCondition::Equals(value.into()))
    }

    /// Creates a substring filter.
    pub fn contains(column_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column_id, FilterCondition::Contains(value.into()))
    }

    /// Creates a prefix filter.
    pub fn starts_with(column_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column_id, FilterCondition::StartsWith(value.into()))
    }

    /// Creates a suffix filter.
    pub fn ends_with(column_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column_id, FilterCondition::EndsWith(value.into()))
    }

    /// Creates an inclusive range filter.
    pub fn between(column_id: impl Into<String>, min: impl Into<CellValue>, max: impl Into<CellValue>) -> Self {
        Self::new(column_id, FilterCondition::Between(min.into(), max.into()))
    }

    /// Creates a membership filter.
    pub fn one_of<I, V>(column_id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        Self::new(column_id, FilterCondition::In(values.into_iter().map(Into::into).collect()))
    }

    /// Returns the operator of the filter.
    pub fn operator(&self) -> FilterOperator {
        self.condition.operator()
    }
}

/// Serialized form of a [`ColumnFilter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFilter {
    column_id: String,
    #[serde(default)]
    operator: FilterOperator,
    value: serde_json::Value,
}

impl TryFrom<WireFilter> for ColumnFilter {
    type Error = String;

    fn try_from(wire: WireFilter) -> Result<Self, Self::Error> {
        let condition = FilterCondition::from_json(wire.operator, wire.value)
            .map_err(|e| format!("invalid filter for column '{}': {}", wire.column_id, e))?;
        Ok(ColumnFilter {
            column_id: wire.column_id,
            condition,
        })
    }
}

impl From<ColumnFilter> for WireFilter {
    fn from(filter: ColumnFilter) -> Self {
        WireFilter {
            operator: filter.condition.operator(),
            value: filter.condition.value_json(),
            column_id: filter.column_id,
        }
    }
}

/// Applied and pending column filters plus the global search term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    /// Filters currently narrowing the rows, keyed by column id.
    pub applied_filters: BTreeMap<String, ColumnFilter>,
    /// Filters being edited but not yet applied, keyed by column id.
    pub pending_filters: BTreeMap<String, ColumnFilter>,
    /// Substring searched across every column.
    pub global_search: String,
}

impl FilterState {
    /// Creates an empty filter state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an applied filter (builder pattern).
    pub fn with_filter(mut self, filter: ColumnFilter) -> Self {
        self.applied_filters.insert(filter.column_id.clone(), filter);
        self
    }

    /// Sets the global search term (builder pattern).
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.global_search = term.into();
        self
    }

    /// Returns `true` if any filter is applied or the search is non-empty.
    pub fn has_applied(&self) -> bool {
        !self.applied_filters.is_empty() || !self.global_search.is_empty()
    }

    /// Returns `true` if any filter is staged.
    pub fn has_pending(&self) -> bool {
        !self.pending_filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_is_inclusive() {
        let condition = FilterCondition::Between(26.into(), 40.into());
        assert!(condition.matches(&CellValue::from(26)));
        assert!(condition.matches(&CellValue::from(40)));
        assert!(!condition.matches(&CellValue::from(25)));
        assert!(!condition.matches(&CellValue::from(41)));
    }

    #[test]
    fn test_between_excludes_incomparable_bounds() {
        let condition = FilterCondition::Between("a".into(), CellValue::Null);
        assert!(!condition.matches(&CellValue::from(30)));
        assert!(!condition.matches(&CellValue::from("b")));
    }

    #[test]
    fn test_text_operators_ignore_case() {
        let cell = CellValue::from("Alice Smith");
        assert!(FilterCondition::Contains("SMI".into()).matches(&cell));
        assert!(FilterCondition::StartsWith("ali".into()).matches(&cell));
        assert!(FilterCondition::EndsWith("SMITH".into()).matches(&cell));
        assert!(!FilterCondition::Equals("alice smith".into()).matches(&cell));
        assert!(FilterCondition::Equals("30".into()).matches(&CellValue::from(30)));
    }

    #[test]
    fn test_null_cell_never_matches() {
        assert!(!FilterCondition::Contains(String::new()).matches(&CellValue::Null));
        assert!(!FilterCondition::In(vec![CellValue::Null]).matches(&CellValue::Null));
    }

    #[test]
    fn test_in_uses_value_equality() {
        let condition = FilterCondition::In(vec!["active".into(), 2.into()]);
        assert!(condition.matches(&CellValue::from("active")));
        assert!(condition.matches(&CellValue::from(2.0)));
        assert!(!condition.matches(&CellValue::from("2")));
    }

    #[test]
    fn test_wire_format() {
        let filter: ColumnFilter =
            serde_json::from_str(r#"{"columnId":"age","operator":"between","value":[26,40]}"#).unwrap();
        assert_eq!(filter, ColumnFilter::between("age", 26, 40));

        let json = serde_json::to_value(ColumnFilter::contains("name", "ali")).unwrap();
        assert_eq!(json, serde_json::json!({"columnId": "name", "operator": "contains", "value": "ali"}));
    }

    #[test]
    fn test_wire_operator_defaults_to_contains() {
        let filter: ColumnFilter = serde_json::from_str(r#"{"columnId":"name","value":"bo"}"#).unwrap();
        assert_eq!(filter.operator(), FilterOperator::Contains);
    }

    #[test]
    fn test_wire_rejects_mismatched_shape() {
        let result: Result<ColumnFilter, _> =
            serde_json::from_str(r#"{"columnId":"age","operator":"between","value":[26]}"#);
        assert!(result.is_err());
        let result: Result<ColumnFilter, _> =
            serde_json::from_str(r#"{"columnId":"status","operator":"in","value":"active"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_state_serde() {
        let state = FilterState::new()
            .with_filter(ColumnFilter::one_of("status", ["active"]))
            .with_search("bob");
        let json = serde_json::to_string(&state).unwrap();
        let back: FilterState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert!(back.has_applied());
        assert!(!back.has_pending());
    }
}
