//! Pending versus applied column filters.

use super::ColumnFilter;
use super::FilterState;

/// Callback invoked with the full filter state after every change.
pub type FilterChangeCallback = Box<dyn Fn(&FilterState) + Send + Sync>;

/// Holds staged and applied filters and notifies on every change.
///
/// Column filters are staged first and only affect rows once applied. The
/// global search applies immediately. Every apply, clear and search update
/// calls the change callback synchronously; staging and cancelling do not.
///
/// # Example
///
/// ```ignore
/// let mut staging = FilterStaging::new(FilterState::default())
///     .with_callback(|state| println!("{} filters", state.applied_filters.len()));
///
/// staging.stage(ColumnFilter::between("age", 26, 40));
/// staging.apply("age");
/// assert!(staging.has_applied_filters());
/// ```
pub struct FilterStaging {
    state: FilterState,
    on_change: Option<FilterChangeCallback>,
}

impl FilterStaging {
    /// Creates staging from an initial state.
    ///
    /// Initial applied filters and search are kept; staged edits are not.
    pub fn new(initial: FilterState) -> Self {
        Self {
            state: FilterState {
                pending_filters: Default::default(),
                ..initial
            },
            on_change: None,
        }
    }

    /// Sets the change callback.
    pub fn with_callback(mut self, callback: impl Fn(&FilterState) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Returns the current state.
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Returns the global search term.
    pub fn global_search(&self) -> &str {
        &self.state.global_search
    }

    /// Returns the applied filter for a column.
    pub fn applied(&self, column_id: &str) -> Option<&ColumnFilter> {
        self.state.applied_filters.get(column_id)
    }

    /// Returns the staged filter for a column.
    pub fn pending(&self, column_id: &str) -> Option<&ColumnFilter> {
        self.state.pending_filters.get(column_id)
    }

    /// Stages a filter without applying it.
    pub fn stage(&mut self, filter: ColumnFilter) {
        log::trace!("Staging filter on '{}'", filter.column_id);
        self.state.pending_filters.insert(filter.column_id.clone(), filter);
    }

    /// Applies the staged filter for a column.
    ///
    /// Replaces any filter already applied to the column. Returns `false`
    /// when nothing was staged.
    pub fn apply(&mut self, column_id: &str) -> bool {
        let Some(filter) = self.state.pending_filters.remove(column_id) else {
            return false;
        };
        self.state.applied_filters.insert(column_id.to_string(), filter);
        log::debug!("Applied filter on '{}'", column_id);
        self.notify();
        true
    }

    /// Applies a filter directly, skipping the staging step.
    pub fn apply_filter(&mut self, filter: ColumnFilter) {
        let column_id = filter.column_id.clone();
        self.state.pending_filters.remove(&column_id);
        self.state.applied_filters.insert(column_id.clone(), filter);
        log::debug!("Applied filter on '{}'", column_id);
        self.notify();
    }

    /// Applies every staged filter at once. Notifies once if anything moved.
    pub fn apply_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.state.pending_filters);
        let count = pending.len();
        if count == 0 {
            return 0;
        }
        self.state.applied_filters.extend(pending);
        log::debug!("Applied {} pending filters", count);
        self.notify();
        count
    }

    /// Removes the column's staged and applied filters.
    pub fn clear(&mut self, column_id: &str) {
        self.state.pending_filters.remove(column_id);
        self.state.applied_filters.remove(column_id);
        log::debug!("Cleared filter on '{}'", column_id);
        self.notify();
    }

    /// Drops the column's staged edit. Applied state is untouched.
    pub fn cancel(&mut self, column_id: &str) {
        self.state.pending_filters.remove(column_id);
    }

    /// Removes every filter and the search term, notifying once.
    pub fn clear_all(&mut self) {
        self.state = FilterState::default();
        log::debug!("Cleared all filters");
        self.notify();
    }

    /// Sets the global search term. Applies immediately.
    pub fn set_global_search(&mut self, term: impl Into<String>) {
        self.state.global_search = term.into();
        self.notify();
    }

    /// Returns `true` if any filter is staged.
    pub fn has_pending_filters(&self) -> bool {
        self.state.has_pending()
    }

    /// Returns `true` if any filter is applied or the search is non-empty.
    pub fn has_applied_filters(&self) -> bool {
        self.state.has_applied()
    }

    fn notify(&self) {
        if let Some(callback) = &self.on_change {
            callback(&self.state);
        }
    }
}

impl std::fmt::Debug for FilterStaging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStaging")
            .field("state", &self.state)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}
