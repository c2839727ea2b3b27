//! Table configuration

use serde::Deserialize;
use serde::Serialize;

use crate::filter::FilterState;
use crate::model::RowId;
use crate::sort::SortState;

pub const DEFAULT_EMPTY_MESSAGE: &str = "No data available";
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred while loading data";
pub const DEFAULT_NO_RESULTS_MESSAGE: &str = "No results found";
pub const DEFAULT_LOADING_MORE_MESSAGE: &str = "Loading more...";

/// Feature flags and initial state for a [`DataTable`](crate::DataTable).
///
/// Deserializable from camelCase JSON with every field optional.
///
/// # Example
///
/// ```ignore
/// use datatable_lib::options::DataTableOptions;
///
/// let options = DataTableOptions::default()
///     .with_selection(true)
///     .with_export(true)
///     .with_primary_column("name");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataTableOptions {
    /// Column sorted ascending on first render when no initial sort is given.
    pub primary_column_id: Option<String>,

    /// Default: true
    pub enable_global_search: bool,

    /// Default: true
    pub enable_column_filters: bool,

    /// Applied filters and search on first render.
    pub initial_filters: FilterState,

    /// Default: true
    pub enable_sorting: bool,

    pub initial_sort: Option<SortState>,

    /// Default: false
    pub enable_selection: bool,

    /// Enables the bulk action panel. Default: false
    pub enable_bulk_selection: bool,

    /// Ids selected on first render.
    pub selected_row_ids: Vec<RowId>,

    /// Default: false
    pub enable_row_expansion: bool,

    /// Default: true
    pub enable_column_visibility: bool,

    /// Explicit default visible columns. Default: first 5 eligible columns
    pub default_visible_columns: Option<Vec<String>>,

    /// Default: false
    pub enable_export: bool,

    /// Mirror filters into the page URL. Default: false
    pub persist_filters: bool,

    /// Save column visibility through the attached store. Default: false
    pub persist_column_visibility: bool,

    pub empty_state_message: String,
    pub error_state_message: String,
    pub no_results_message: String,
    pub loading_more_message: String,
}

impl Default for DataTableOptions {
    fn default() -> Self {
        Self {
            primary_column_id: None,
            enable_global_search: true,
            enable_column_filters: true,
            initial_filters: FilterState::default(),
            enable_sorting: true,
            initial_sort: None,
            enable_selection: false,
            enable_bulk_selection: false,
            selected_row_ids: Vec::new(),
            enable_row_expansion: false,
            enable_column_visibility: true,
            default_visible_columns: None,
            enable_export: false,
            persist_filters: false,
            persist_column_visibility: false,
            empty_state_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            error_state_message: DEFAULT_ERROR_MESSAGE.to_string(),
            no_results_message: DEFAULT_NO_RESULTS_MESSAGE.to_string(),
            loading_more_message: DEFAULT_LOADING_MORE_MESSAGE.to_string(),
        }
    }
}

impl DataTableOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary_column(mut self, column_id: impl Into<String>) -> Self {
        self.primary_column_id = Some(column_id.into());
        self
    }

    pub fn with_global_search(mut self, enabled: bool) -> Self {
        self.enable_global_search = enabled;
        self
    }

    pub fn with_column_filters(mut self, enabled: bool) -> Self {
        self.enable_column_filters = enabled;
        self
    }

    pub fn with_initial_filters(mut self, filters: FilterState) -> Self {
        self.initial_filters = filters;
        self
    }

    pub fn with_sorting(mut self, enabled: bool) -> Self {
        self.enable_sorting = enabled;
        self
    }

    pub fn with_initial_sort(mut self, sort: SortState) -> Self {
        self.initial_sort = Some(sort);
        self
    }

    pub fn with_selection(mut self, enabled: bool) -> Self {
        self.enable_selection = enabled;
        self
    }

    pub fn with_bulk_selection(mut self, enabled: bool) -> Self {
        self.enable_bulk_selection = enabled;
        self
    }

    pub fn with_selected_rows(mut self, ids: impl IntoIterator<Item = RowId>) -> Self {
        self.selected_row_ids = ids.into_iter().collect();
        self
    }

    pub fn with_row_expansion(mut self, enabled: bool) -> Self {
        self.enable_row_expansion = enabled;
        self
    }

    pub fn with_column_visibility(mut self, enabled: bool) -> Self {
        self.enable_column_visibility = enabled;
        self
    }

    pub fn with_default_visible_columns<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_visible_columns = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_export(mut self, enabled: bool) -> Self {
        self.enable_export = enabled;
        self
    }

    pub fn with_persist_filters(mut self, enabled: bool) -> Self {
        self.persist_filters = enabled;
        self
    }

    pub fn with_persist_column_visibility(mut self, enabled: bool) -> Self {
        self.persist_column_visibility = enabled;
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_state_message = message.into();
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_state_message = message.into();
        self
    }

    /// Sort applied on first render: the explicit initial sort, else the
    /// primary column ascending, else none.
    pub fn resolved_initial_sort(&self) -> SortState {
        match (&self.initial_sort, &self.primary_column_id) {
            (Some(sort), _) => sort.clone(),
            (None, Some(primary)) => SortState::asc(primary.clone()),
            (None, None) => SortState::default(),
        }
    }
}
