//! Row filtering: global search then applied column filters.

use std::collections::BTreeMap;

use super::ColumnFilter;
use super::FilterState;
use crate::model::ColumnDef;
use crate::model::TableRow;
use crate::model::find_column;

/// Returns the rows passing the global search and every applied filter.
///
/// Search runs first; a non-empty term keeps a row when any column's
/// stringified value contains it, ignoring case. Filters on unknown columns
/// are skipped. Pending filters are never consulted.
pub fn filter_rows<T: TableRow>(rows: &[T], state: &FilterState, columns: &[ColumnDef<T>]) -> Vec<T> {
    let term = state.global_search.to_lowercase();
    rows.iter()
        .filter(|row| term.is_empty() || matches_search(*row, &term, columns))
        .filter(|row| matches_filters(*row, &state.applied_filters, columns))
        .cloned()
        .collect()
}

/// Returns `true` if any column of `row` contains `term`.
///
/// `term` must already be lower-cased. Null cells never match.
pub fn matches_search<T: TableRow>(row: &T, term: &str, columns: &[ColumnDef<T>]) -> bool {
    columns.iter().any(|column| {
        let value = column.value(row);
        !value.is_null() && value.to_string().to_lowercase().contains(term)
    })
}

/// Returns `true` if `row` satisfies every filter.
pub fn matches_filters<T: TableRow>(
    row: &T,
    filters: &BTreeMap<String, ColumnFilter>,
    columns: &[ColumnDef<T>],
) -> bool {
    filters.values().all(|filter| match find_column(columns, &filter.column_id) {
        Some(column) => filter.condition.matches(&column.value(row)),
        None => {
            log::trace!("Skipping filter on unknown column '{}'", filter.column_id);
            true
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use crate::model::DataType;
    use crate::model::Record;

    fn people() -> Vec<Record> {
        vec![
            Record::new(1).set("name", "Alice").set("age", 30).set("status", "active"),
            Record::new(2).set("name", "Bob").set("age", 25).set("status", "inactive"),
            Record::new(3).set("name", "Carol").set("age", CellValue::Null).set("status", "active"),
        ]
    }

    fn columns() -> Vec<ColumnDef<Record>> {
        vec![
            ColumnDef::new("name", "Name").accessor_key("name"),
            ColumnDef::new("age", "Age").accessor_key("age").data_type(DataType::Number),
            ColumnDef::new("status", "Status").accessor_key("status").data_type(DataType::Enum),
        ]
    }

    fn names(rows: &[Record]) -> Vec<String> {
        rows.iter().map(|r| r.get("name").to_string()).collect()
    }

    #[test]
    fn test_between_keeps_rows_in_range() {
        let state = FilterState::new().with_filter(ColumnFilter::between("age", 26, 40));
        assert_eq!(names(&filter_rows(&people(), &state, &columns())), ["Alice"]);
    }

    #[test]
    fn test_global_search_is_case_insensitive() {
        let state = FilterState::new().with_search("bob");
        assert_eq!(names(&filter_rows(&people(), &state, &columns())), ["Bob"]);
    }

    #[test]
    fn test_search_and_filters_combine() {
        let state = FilterState::new()
            .with_search("a")
            .with_filter(ColumnFilter::one_of("status", ["active"]));
        assert_eq!(names(&filter_rows(&people(), &state, &columns())), ["Alice", "Carol"]);
    }

    #[test]
    fn test_unknown_column_is_skipped() {
        let state = FilterState::new().with_filter(ColumnFilter::equals("missing", "x"));
        assert_eq!(filter_rows(&people(), &state, &columns()).len(), 3);
    }

    #[test]
    fn test_pending_filters_are_ignored() {
        let mut state = FilterState::new();
        state
            .pending_filters
            .insert("name".into(), ColumnFilter::equals("name", "Bob"));
        assert_eq!(filter_rows(&people(), &state, &columns()).len(), 3);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let state = FilterState::new().with_filter(ColumnFilter::contains("name", "o"));
        let once = filter_rows(&people(), &state, &columns());
        let twice = filter_rows(&once, &state, &columns());
        assert_eq!(once, twice);
    }
}
