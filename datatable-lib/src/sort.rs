//! Sort state, the sort cycle and the row comparator.

use std::cmp::Ordering;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::model::CellValue;
use crate::model::ColumnDef;
use crate::model::TableRow;
use crate::model::find_column;
use crate::model::parse_date;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

/// Current sort column and direction.
///
/// Both are `None` when the table is unsorted.
///
/// # Example
///
/// ```ignore
/// let state = SortState::default().toggled("age");
/// assert_eq!(state, SortState::asc("age"));
/// assert_eq!(state.toggled("age"), SortState::desc("age"));
/// assert_eq!(state.toggled("age").toggled("age"), SortState::default());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub column_id: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    /// Creates an ascending sort on a column.
    pub fn asc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: Some(column_id.into()),
            direction: Some(SortDirection::Asc),
        }
    }

    /// Creates a descending sort on a column.
    pub fn desc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: Some(column_id.into()),
            direction: Some(SortDirection::Desc),
        }
    }

    /// Returns `true` if a column and direction are set.
    pub fn is_active(&self) -> bool {
        self.column_id.is_some() && self.direction.is_some()
    }

    /// Direction for `column_id`, if it is the sorted column.
    pub fn direction_for(&self, column_id: &str) -> Option<SortDirection> {
        match &self.column_id {
            Some(id) if id == column_id => self.direction,
            _ => None,
        }
    }

    /// Next state after clicking `column_id`.
    ///
    /// The same column cycles asc, desc, unsorted. A different column always
    /// starts at asc.
    pub fn toggled(&self, column_id: &str) -> Self {
        if self.column_id.as_deref() != Some(column_id) {
            return Self::asc(column_id);
        }
        match self.direction {
            None => Self::asc(column_id),
            Some(SortDirection::Asc) => Self::desc(column_id),
            Some(SortDirection::Desc) => Self::default(),
        }
    }
}

/// Callback invoked with the sort state after every change.
pub type SortChangeCallback = Box<dyn Fn(&SortState) + Send + Sync>;

/// Owns the sort state and notifies on every transition.
pub struct Sorting {
    state: SortState,
    on_change: Option<SortChangeCallback>,
}

impl Sorting {
    pub fn new(initial: SortState) -> Self {
        Self {
            state: initial,
            on_change: None,
        }
    }

    /// Sets the change callback.
    pub fn with_callback(mut self, callback: impl Fn(&SortState) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> &SortState {
        &self.state
    }

    /// Advances the sort cycle for a column.
    pub fn toggle(&mut self, column_id: &str) -> &SortState {
        self.state = self.state.toggled(column_id);
        log::debug!("Sort is now {:?} {:?}", self.state.column_id, self.state.direction);
        self.notify();
        &self.state
    }

    /// Replaces the sort state.
    pub fn set(&mut self, state: SortState) {
        self.state = state;
        self.notify();
    }

    /// Removes sorting.
    pub fn clear(&mut self) {
        self.set(SortState::default());
    }

    fn notify(&self) {
        if let Some(callback) = &self.on_change {
            callback(&self.state);
        }
    }
}

impl std::fmt::Debug for Sorting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sorting").field("state", &self.state).finish_non_exhaustive()
    }
}

// =============================================================================
// Sort engine
// =============================================================================

/// Returns the rows ordered by `state`. The input is never mutated.
///
/// Unsorted, directionless or unknown-column states return the rows in input
/// order. The sort is stable; nulls go last in both directions.
pub fn sort_rows<T: TableRow>(rows: &[T], state: &SortState, columns: &[ColumnDef<T>]) -> Vec<T> {
    let (Some(column_id), Some(direction)) = (&state.column_id, state.direction) else {
        return rows.to_vec();
    };
    let Some(column) = find_column(columns, column_id) else {
        log::trace!("Not sorting by unknown column '{}'", column_id);
        return rows.to_vec();
    };

    let mut keyed: Vec<(CellValue, &T)> = rows.iter().map(|row| (column.value(row), row)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_cells(a, b, direction));
    keyed.into_iter().map(|(_, row)| row.clone()).collect()
}

/// Compares two cells for sorting in `direction`. Nulls are always last.
pub fn compare_cells(a: &CellValue, b: &CellValue, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = compare_values(a, b);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Sort class of a non-null cell. Cells of different classes order by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SortClass {
    Number,
    Date,
    Text,
    Other,
}

fn sort_class(value: &CellValue) -> SortClass {
    match value {
        CellValue::Int(_) | CellValue::Float(_) => SortClass::Number,
        CellValue::DateTime(_) => SortClass::Date,
        CellValue::String(s) if parse_date(s).is_some() => SortClass::Date,
        CellValue::String(_) => SortClass::Text,
        _ => SortClass::Other,
    }
}

/// Total order over non-null cells.
///
/// Numbers use `f64::total_cmp` (NaN after every other number), dates compare
/// by instant, strings locale-style and everything else by its stringified
/// form.
fn compare_values(a: &CellValue, b: &CellValue) -> Ordering {
    let class = sort_class(a);
    class.cmp(&sort_class(b)).then_with(|| match class {
        SortClass::Number => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
        SortClass::Date => match (instant(a), instant(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        },
        SortClass::Text | SortClass::Other => locale_compare(&a.to_string(), &b.to_string()),
    })
}

fn instant(value: &CellValue) -> Option<DateTime<Utc>> {
    match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::String(s) => parse_date(s),
        _ => None,
    }
}

/// Case-insensitive ordering with lowercase before uppercase on ties.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
