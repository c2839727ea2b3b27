//! The DataTable state engine

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use url::Url;

use crate::actions::BulkAction;
use crate::actions::BulkPanel;
use crate::actions::BulkTrigger;
use crate::actions::RowAction;
use crate::builder::DataTableBuilder;
use crate::builder::ExpandCallback;
use crate::builder::RowCallback;
use crate::error::DataTableError;
use crate::error::ExportError;
use crate::expansion::RowExpansion;
use crate::export::ExportArtifact;
use crate::export::ExportColumn;
use crate::export::ExportOptions;
use crate::export::ExportSink;
use crate::export::Exporter;
use crate::export::build_artifact;
use crate::filter::ColumnFilter;
use crate::filter::FilterDraft;
use crate::filter::FilterStaging;
use crate::filter::FilterState;
use crate::filter::UrlFilterSync;
use crate::filter::filter_rows;
use crate::keyboard::KeyEvents;
use crate::keyboard::KeyboardNav;
use crate::keyboard::KeyboardSubscription;
use crate::keyboard::NavKey;
use crate::keyboard::NavOutcome;
use crate::model::ColumnDef;
use crate::model::RowId;
use crate::model::TableRow;
use crate::model::find_column;
use crate::options::DataTableOptions;
use crate::scroll::InfiniteScroll;
use crate::scroll::LoadOutcome;
use crate::scroll::Sentinel;
use crate::scroll::SkipReason;
use crate::selection::InternalSelectionStore;
use crate::selection::Selection;
use crate::selection::SelectionSummary;
use crate::sort::SortState;
use crate::sort::Sorting;
use crate::sort::sort_rows;
use crate::visibility::ColumnVisibility;

/// What the table body should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    /// The caller reported an error. Carries the configured error message.
    Error(String),
    /// The caller reported an empty data set.
    Empty(String),
    Loading,
    /// Rows exist but none pass the filters and search.
    NoResults(String),
    Ready,
}

/// An active filter shown as a removable chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    /// Column id, or `None` for the global search chip.
    pub column_id: Option<String>,
    pub label: String,
    /// Number of values the filter holds.
    pub count: usize,
}

/// Headless data table.
///
/// Owns the rows and every piece of interactive state: filters, sort,
/// selection, column visibility, expansion, keyboard focus, the bulk action
/// panel and infinite scroll. The derived [`view`](Self::view) is recomputed
/// after every change that affects it.
///
/// # Example
///
/// ```ignore
/// use datatable_lib::DataTable;
/// use datatable_lib::filter::ColumnFilter;
/// use datatable_lib::model::ColumnDef;
///
/// let mut table = DataTable::builder(vec![
///     ColumnDef::new("name", "Name").accessor_key("name"),
///     ColumnDef::new("age", "Age").accessor_key("age"),
/// ])
/// .rows(records)
/// .build()?;
///
/// table.stage_filter(ColumnFilter::between("age", 26, 40))?;
/// table.apply_filter("age")?;
/// table.toggle_sort("age")?;
/// for row in table.view() {
///     println!("{:?}", row);
/// }
/// ```
pub struct DataTable<T> {
    columns: Vec<ColumnDef<T>>,
    rows: Vec<T>,
    view: Vec<T>,
    options: DataTableOptions,
    filters: FilterStaging,
    sorting: Sorting,
    selection: Selection<T>,
    visibility: ColumnVisibility,
    expansion: RowExpansion,
    keyboard: KeyboardNav,
    subscription: Option<KeyboardSubscription>,
    scroll: Option<InfiniteScroll<T>>,
    row_actions: Vec<RowAction<T>>,
    bulk_actions: Vec<BulkAction<T>>,
    bulk_panel: BulkPanel,
    on_row_click: Option<RowCallback<T>>,
    on_row_expand: Option<ExpandCallback<T>>,
    export_sink: Option<Arc<dyn ExportSink>>,
    exporter: Option<Arc<dyn Exporter>>,
    url_sync: UrlFilterSync,
    location: Option<Url>,
    is_loading: bool,
    is_empty: bool,
    error: Option<String>,
}

impl<T: TableRow> DataTable<T> {
    /// Starts building a table over `columns`.
    pub fn builder(columns: Vec<ColumnDef<T>>) -> DataTableBuilder<T> {
        DataTableBuilder::new(columns)
    }

    pub(crate) fn from_builder(builder: DataTableBuilder<T>) -> Self {
        let DataTableBuilder {
            columns,
            rows,
            options,
            on_filter_change,
            on_sort_change,
            on_selection_change,
            on_visibility_change,
            on_row_click,
            on_row_expand,
            selection_store,
            visibility_store,
            page_loader,
            row_actions,
            bulk_actions,
            export_sink,
            exporter,
            reporter,
            location,
        } = builder;

        let mut filters = FilterStaging::new(options.initial_filters.clone());
        if let Some(callback) = on_filter_change {
            filters = filters.with_callback(callback);
        }

        let mut sorting = Sorting::new(options.resolved_initial_sort());
        if let Some(callback) = on_sort_change {
            sorting = sorting.with_callback(callback);
        }

        let store = selection_store.unwrap_or_else(|| {
            Box::new(InternalSelectionStore::with_selected(
                options.selected_row_ids.iter().cloned(),
            ))
        });
        let mut selection = Selection::boxed(store);
        if let Some(callback) = on_selection_change {
            selection = selection.with_callback(callback);
        }

        let mut visibility = ColumnVisibility::new(&columns, options.default_visible_columns.as_deref())
            .with_reporter(reporter.clone());
        if let Some(callback) = on_visibility_change {
            visibility = visibility.with_callback(callback);
        }
        if options.persist_column_visibility {
            match visibility_store {
                Some(store) => visibility = visibility.with_store(store),
                None => log::warn!("Column visibility persistence enabled without a store"),
            }
        }

        let scroll = page_loader.map(|loader| InfiniteScroll::with_reporter(loader, reporter));

        let url_sync = if options.persist_filters {
            UrlFilterSync::new()
        } else {
            UrlFilterSync::disabled()
        };

        let mut table = Self {
            columns,
            rows,
            view: Vec::new(),
            options,
            filters,
            sorting,
            selection,
            visibility,
            expansion: RowExpansion::new(),
            keyboard: KeyboardNav::new(),
            subscription: None,
            scroll,
            row_actions,
            bulk_actions,
            bulk_panel: BulkPanel::Closed,
            on_row_click,
            on_row_expand,
            export_sink,
            exporter,
            url_sync,
            location,
            is_loading: false,
            is_empty: false,
            error: None,
        };
        table.refresh();
        table.sync_location();
        log::debug!(
            "Built table with {} columns and {} rows",
            table.columns.len(),
            table.rows.len()
        );
        table
    }

    // =========================================================================
    // Data
    // =========================================================================

    pub fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    pub fn column(&self, column_id: &str) -> Option<&ColumnDef<T>> {
        find_column(&self.columns, column_id)
    }

    pub fn options(&self) -> &DataTableOptions {
        &self.options
    }

    /// All loaded rows, unfiltered and unsorted.
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Rows after search, column filters and sort. Empty while loading.
    pub fn view(&self) -> &[T] {
        &self.view
    }

    /// Replaces the data set.
    pub fn set_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.refresh();
    }

    /// Adds rows, typically a page from infinite scroll.
    pub fn append_rows(&mut self, rows: impl IntoIterator<Item = T>) {
        self.rows.extend(rows);
        self.refresh();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        if let Some(scroll) = &self.scroll {
            scroll.set_loading(loading);
        }
        self.refresh();
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Marks the data set as empty at the source.
    pub fn set_empty(&mut self, empty: bool) {
        self.is_empty = empty;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        if let Some(message) = &error {
            log::warn!("Table error: {}", message);
        }
        self.error = error;
    }

    /// The error reported through [`set_error`](Self::set_error).
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Resolves what the body shows. Error wins, then empty, then loading.
    pub fn status(&self) -> TableStatus {
        if self.error.is_some() {
            TableStatus::Error(self.options.error_state_message.clone())
        } else if self.is_empty && !self.is_loading {
            TableStatus::Empty(self.options.empty_state_message.clone())
        } else if self.is_loading {
            TableStatus::Loading
        } else if self.view.is_empty() {
            TableStatus::NoResults(self.options.no_results_message.clone())
        } else {
            TableStatus::Ready
        }
    }

    fn refresh(&mut self) {
        self.view = if self.is_loading {
            Vec::new()
        } else {
            let filtered = filter_rows(&self.rows, self.filters.state(), &self.columns);
            sort_rows(&filtered, self.sorting.state(), &self.columns)
        };
        self.keyboard.reconcile(self.view.len());
        log::trace!("View has {} of {} rows", self.view.len(), self.rows.len());
    }

    fn require(&self, enabled: bool, feature: &'static str) -> Result<(), DataTableError> {
        if enabled {
            Ok(())
        } else {
            Err(DataTableError::FeatureDisabled(feature))
        }
    }

    // =========================================================================
    // Filters
    // =========================================================================

    fn filterable_column(&self, column_id: &str) -> Result<&ColumnDef<T>, DataTableError> {
        self.require(self.options.enable_column_filters, "column filters")?;
        let column = self
            .column(column_id)
            .ok_or_else(|| DataTableError::UnknownColumn(column_id.to_string()))?;
        if !column.filterable {
            return Err(DataTableError::ColumnNotFilterable(column_id.to_string()));
        }
        Ok(column)
    }

    fn filters_changed(&mut self) {
        self.refresh();
        self.sync_location();
    }

    fn sync_location(&mut self) {
        if let Some(url) = &mut self.location {
            self.url_sync.sync(url, self.filters.state());
        }
    }

    pub fn filter_state(&self) -> &FilterState {
        self.filters.state()
    }

    /// Stages a filter. Rows are unaffected until it is applied.
    pub fn stage_filter(&mut self, filter: ColumnFilter) -> Result<(), DataTableError> {
        self.filterable_column(&filter.column_id)?;
        self.filters.stage(filter);
        Ok(())
    }

    /// Applies the staged filter for a column. Returns `false` if none was staged.
    pub fn apply_filter(&mut self, column_id: &str) -> Result<bool, DataTableError> {
        self.filterable_column(column_id)?;
        let applied = self.filters.apply(column_id);
        if applied {
            self.filters_changed();
        }
        Ok(applied)
    }

    /// Applies a filter directly, replacing any filter on the same column.
    pub fn apply_column_filter(&mut self, filter: ColumnFilter) -> Result<(), DataTableError> {
        self.filterable_column(&filter.column_id)?;
        self.filters.apply_filter(filter);
        self.filters_changed();
        Ok(())
    }

    /// Applies every staged filter at once.
    pub fn apply_pending_filters(&mut self) -> usize {
        let applied = self.filters.apply_pending();
        if applied > 0 {
            self.filters_changed();
        }
        applied
    }

    pub fn clear_filter(&mut self, column_id: &str) {
        self.filters.clear(column_id);
        self.filters_changed();
    }

    /// Drops the staged edit for a column, keeping its applied filter.
    pub fn cancel_filter(&mut self, column_id: &str) {
        self.filters.cancel(column_id);
    }

    /// Clears every filter and the global search.
    pub fn clear_all_filters(&mut self) {
        self.filters.clear_all();
        self.filters_changed();
    }

    pub fn set_global_search(&mut self, term: impl Into<String>) -> Result<(), DataTableError> {
        self.require(self.options.enable_global_search, "global search")?;
        self.filters.set_global_search(term);
        self.filters_changed();
        Ok(())
    }

    pub fn global_search(&self) -> &str {
        self.filters.global_search()
    }

    pub fn has_pending_filters(&self) -> bool {
        self.filters.has_pending_filters()
    }

    pub fn has_applied_filters(&self) -> bool {
        self.filters.has_applied_filters()
    }

    /// Opens an editor for a column's filter, seeded from its applied filter.
    pub fn open_filter_draft(&self, column_id: &str) -> Result<FilterDraft, DataTableError> {
        let column = self.filterable_column(column_id)?;
        Ok(FilterDraft::open(column, self.filters.applied(column_id)))
    }

    /// Applies an edited draft. An empty draft clears the column.
    pub fn commit_filter_draft(&mut self, draft: &mut FilterDraft) -> Result<(), DataTableError> {
        self.filterable_column(draft.column_id())?;
        draft.commit(&mut self.filters);
        self.filters_changed();
        Ok(())
    }

    /// Chips for the active search and applied filters.
    pub fn filter_chips(&self) -> Vec<FilterChip> {
        let state = self.filters.state();
        let mut chips = Vec::with_capacity(state.applied_filters.len() + 1);
        if !state.global_search.is_empty() {
            chips.push(FilterChip {
                column_id: None,
                label: format!("Search: {}", state.global_search),
                count: 1,
            });
        }
        for (column_id, filter) in &state.applied_filters {
            let label = self
                .column(column_id)
                .map(ColumnDef::export_header)
                .unwrap_or_else(|| column_id.clone());
            chips.push(FilterChip {
                column_id: Some(column_id.clone()),
                label,
                count: filter.condition.value_count(),
            });
        }
        chips
    }

    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    /// Replaces the page URL and writes the current filters into it.
    pub fn set_location(&mut self, url: Url) {
        self.location = Some(url);
        self.sync_location();
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    pub fn sort_state(&self) -> &SortState {
        self.sorting.state()
    }

    /// Cycles a column's sort: ascending, descending, unsorted.
    ///
    /// Returns `false` when sorting is disabled or the column is not sortable.
    pub fn toggle_sort(&mut self, column_id: &str) -> Result<bool, DataTableError> {
        let column = self
            .column(column_id)
            .ok_or_else(|| DataTableError::UnknownColumn(column_id.to_string()))?;
        if !self.options.enable_sorting || !column.sortable {
            log::trace!("Ignoring sort on '{}'", column_id);
            return Ok(false);
        }
        self.sorting.toggle(column_id);
        self.refresh();
        Ok(true)
    }

    pub fn set_sort(&mut self, state: SortState) -> Result<(), DataTableError> {
        if let Some(column_id) = &state.column_id
            && self.column(column_id).is_none()
        {
            return Err(DataTableError::UnknownColumn(column_id.clone()));
        }
        self.sorting.set(state);
        self.refresh();
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        self.sorting.clear();
        self.refresh();
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn toggle_row_selection(&mut self, id: &RowId) -> Result<BTreeSet<RowId>, DataTableError> {
        self.require(self.options.enable_selection, "selection")?;
        Ok(self.selection.toggle_row(id, &self.view))
    }

    /// Selects every shown row, or deselects them if all are selected.
    pub fn toggle_all_selection(&mut self) -> Result<BTreeSet<RowId>, DataTableError> {
        self.require(self.options.enable_selection, "selection")?;
        Ok(self.selection.toggle_all(&self.view))
    }

    pub fn clear_selection(&mut self) -> Result<BTreeSet<RowId>, DataTableError> {
        self.require(self.options.enable_selection, "selection")?;
        Ok(self.selection.clear(&self.view))
    }

    pub fn is_row_selected(&self, id: &RowId) -> bool {
        self.selection.is_row_selected(id)
    }

    pub fn selected_ids(&self) -> BTreeSet<RowId> {
        self.selection.selected_ids()
    }

    pub fn selection_summary(&self) -> SelectionSummary {
        self.selection.summary(&self.view)
    }

    /// Shown rows that are selected, in view order.
    pub fn selected_rows(&self) -> Vec<T> {
        self.selection.selected_rows(&self.view)
    }

    // =========================================================================
    // Column visibility
    // =========================================================================

    pub fn toggle_column(&mut self, column_id: &str) -> Result<Option<JoinHandle<()>>, DataTableError> {
        self.require(self.options.enable_column_visibility, "column visibility")?;
        if self.column(column_id).is_none() {
            return Err(DataTableError::UnknownColumn(column_id.to_string()));
        }
        Ok(self.visibility.toggle_column(column_id))
    }

    pub fn reset_columns(&mut self) -> Result<Option<JoinHandle<()>>, DataTableError> {
        self.require(self.options.enable_column_visibility, "column visibility")?;
        Ok(self.visibility.reset_to_default())
    }

    pub fn visible_column_ids(&self) -> Vec<String> {
        self.visible_columns().into_iter().map(|c| c.id.clone()).collect()
    }

    /// Columns to render, in definition order.
    ///
    /// Every column is visible when column visibility is disabled.
    pub fn visible_columns(&self) -> Vec<&ColumnDef<T>> {
        self.columns
            .iter()
            .filter(|c| !self.options.enable_column_visibility || self.visibility.is_visible(&c.id))
            .collect()
    }

    pub fn default_columns(&self) -> Vec<String> {
        self.visibility.default_columns()
    }

    // =========================================================================
    // Row expansion
    // =========================================================================

    /// Toggles a row open or closed. Returns the new state.
    pub fn toggle_row_expansion(&mut self, id: &RowId) -> Result<bool, DataTableError> {
        self.require(self.options.enable_row_expansion, "row expansion")?;
        Ok(self.toggle_expanded(id))
    }

    fn toggle_expanded(&mut self, id: &RowId) -> bool {
        let expanded = self.expansion.toggle(id);
        if let Some(callback) = &self.on_row_expand
            && let Some(row) = self.view.iter().find(|r| r.id() == *id)
        {
            callback(row, expanded);
        }
        expanded
    }

    pub fn is_row_expanded(&self, id: &RowId) -> bool {
        self.expansion.is_expanded(id)
    }

    /// Expands every shown row.
    pub fn expand_all_rows(&mut self) {
        let ids: Vec<RowId> = self.view.iter().map(|r| r.id()).collect();
        self.expansion.expand_all(ids);
    }

    pub fn collapse_all_rows(&mut self) {
        self.expansion.collapse_all();
    }

    // =========================================================================
    // Keyboard
    // =========================================================================

    /// Starts receiving keys from `events`.
    pub fn mount(&mut self, events: &KeyEvents) {
        self.subscription = Some(events.subscribe());
    }

    /// Stops receiving keys and drops focus.
    pub fn unmount(&mut self) {
        self.subscription = None;
        self.keyboard.clear();
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Handles every key dispatched since the last call.
    pub fn process_pending_keys(&mut self) -> Vec<NavOutcome> {
        let mut keys = Vec::new();
        if let Some(subscription) = &mut self.subscription {
            while let Some(key) = subscription.try_next() {
                keys.push(key);
            }
        }
        keys.into_iter().map(|key| self.handle_key(key)).collect()
    }

    /// Moves focus, or activates the focused row on Enter.
    ///
    /// Activation toggles expansion when enabled, otherwise it is a row click.
    pub fn handle_key(&mut self, key: NavKey) -> NavOutcome {
        let outcome = self.keyboard.handle(key, self.view.len());
        if let NavOutcome::Activate(index) = outcome {
            self.activate_row(index);
        }
        outcome
    }

    fn activate_row(&mut self, index: usize) {
        let Some(row) = self.view.get(index) else {
            return;
        };
        if self.options.enable_row_expansion {
            let id = row.id();
            self.toggle_expanded(&id);
        } else if let Some(callback) = &self.on_row_click {
            callback(row);
        }
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.keyboard.focused()
    }

    pub fn focused_row(&self) -> Option<&T> {
        self.keyboard.focused().and_then(|i| self.view.get(i))
    }

    /// Fires the row click callback. Returns `false` if the row is not shown.
    pub fn click_row(&self, id: &RowId) -> bool {
        let Some(row) = self.view.iter().find(|r| r.id() == *id) else {
            return false;
        };
        if let Some(callback) = &self.on_row_click {
            callback(row);
        }
        true
    }

    // =========================================================================
    // Infinite scroll
    // =========================================================================

    pub fn set_has_more(&self, has_more: bool) {
        if let Some(scroll) = &self.scroll {
            scroll.set_has_more(has_more);
        }
    }

    pub fn has_more(&self) -> bool {
        self.scroll.as_ref().is_some_and(InfiniteScroll::has_more)
    }

    pub fn is_loading_more(&self) -> bool {
        self.scroll.as_ref().is_some_and(InfiniteScroll::is_loading_more)
    }

    /// Message shown below the rows while a page loads.
    pub fn loading_more_message(&self) -> Option<&str> {
        self.is_loading_more()
            .then_some(self.options.loading_more_message.as_str())
    }

    /// Visibility handle for the host's observer. `None` without a page loader.
    pub fn sentinel(&self) -> Option<Sentinel<T>> {
        self.scroll.as_ref().map(InfiniteScroll::sentinel)
    }

    /// Loads the next page as if the sentinel came into view and appends it.
    pub async fn load_more(&mut self) -> LoadOutcome<T> {
        let Some(scroll) = self.scroll.clone() else {
            return LoadOutcome::Skipped(SkipReason::Disabled);
        };
        let outcome = scroll.on_sentinel_visible().await;
        if let LoadOutcome::Loaded(rows) = &outcome {
            self.append_rows(rows.iter().cloned());
        }
        outcome
    }

    // =========================================================================
    // Row actions
    // =========================================================================

    /// Row actions visible for `row`.
    pub fn row_actions_for(&self, row: &T) -> Vec<&RowAction<T>> {
        self.row_actions.iter().filter(|a| a.is_visible(row)).collect()
    }

    /// Runs a row action. Returns `false` if it is hidden or disabled for the row.
    pub async fn run_row_action(&self, action_id: &str, row_id: &RowId) -> Result<bool, DataTableError> {
        let action = self
            .row_actions
            .iter()
            .find(|a| a.id == action_id)
            .ok_or_else(|| DataTableError::UnknownAction(action_id.to_string()))?;
        let row = self
            .rows
            .iter()
            .find(|r| r.id() == *row_id)
            .cloned()
            .ok_or_else(|| DataTableError::UnknownRow(row_id.to_string()))?;
        if !action.is_visible(&row) || action.is_disabled(&row) {
            log::debug!("Row action '{}' unavailable for row {}", action_id, row_id);
            return Ok(false);
        }
        action.run(row).await;
        Ok(true)
    }

    // =========================================================================
    // Bulk actions
    // =========================================================================

    pub fn bulk_panel(&self) -> &BulkPanel {
        &self.bulk_panel
    }

    /// Opens the bulk panel. Requires bulk selection and a non-empty selection.
    pub fn open_bulk_panel(&mut self) -> bool {
        if !self.options.enable_bulk_selection || self.selected_rows().is_empty() {
            return false;
        }
        self.bulk_panel = BulkPanel::Open;
        true
    }

    pub fn close_bulk_panel(&mut self) {
        self.bulk_panel = BulkPanel::Closed;
    }

    /// Bulk actions visible for the current selection.
    pub fn available_bulk_actions(&self) -> Vec<&BulkAction<T>> {
        let rows = self.selected_rows();
        self.bulk_actions.iter().filter(|a| a.is_visible(&rows)).collect()
    }

    /// Triggers a bulk action on the selected shown rows.
    ///
    /// Actions that require confirmation move the panel to
    /// [`BulkPanel::Confirming`] instead of running.
    pub async fn trigger_bulk_action(&mut self, action_id: &str) -> Result<BulkTrigger, DataTableError> {
        self.require(self.options.enable_bulk_selection, "bulk selection")?;
        let rows = self.selected_rows();
        let action = self
            .bulk_actions
            .iter()
            .find(|a| a.id == action_id)
            .ok_or_else(|| DataTableError::UnknownAction(action_id.to_string()))?;
        if action.is_disabled(&rows) {
            return Ok(BulkTrigger::Disabled);
        }
        if action.requires_confirmation {
            let message = action.confirmation_text(&rows);
            self.bulk_panel = BulkPanel::Confirming {
                action_id: action_id.to_string(),
                message: message.clone(),
            };
            return Ok(BulkTrigger::NeedsConfirmation(message));
        }
        log::info!("Running bulk action '{}' on {} rows", action_id, rows.len());
        action.run(rows).await;
        self.bulk_panel = BulkPanel::Closed;
        Ok(BulkTrigger::Ran)
    }

    /// Runs the action awaiting confirmation. Returns `false` if none is.
    pub async fn confirm_bulk_action(&mut self) -> Result<bool, DataTableError> {
        let BulkPanel::Confirming { action_id, .. } = &self.bulk_panel else {
            return Ok(false);
        };
        let action_id = action_id.clone();
        let rows = self.selected_rows();
        let action = self
            .bulk_actions
            .iter()
            .find(|a| a.id == action_id)
            .ok_or(DataTableError::UnknownAction(action_id.clone()))?;
        log::info!("Running confirmed bulk action '{}' on {} rows", action_id, rows.len());
        action.run(rows).await;
        self.bulk_panel = BulkPanel::Closed;
        Ok(true)
    }

    /// Returns from the confirmation prompt to the open panel.
    pub fn cancel_bulk_confirmation(&mut self) {
        if matches!(self.bulk_panel, BulkPanel::Confirming { .. }) {
            self.bulk_panel = BulkPanel::Open;
        }
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Rows an export with `options` covers: the selected shown rows when
    /// requested and any exist, otherwise the whole view.
    pub fn export_rows(&self, options: &ExportOptions) -> Vec<T> {
        if options.include_selected_only {
            let selected = self.selected_rows();
            if !selected.is_empty() {
                return selected;
            }
        }
        self.view.clone()
    }

    /// Visible columns, in definition order.
    pub fn export_columns(&self) -> Vec<ExportColumn<T>> {
        self.visible_columns().into_iter().map(ExportColumn::from_def).collect()
    }

    pub fn build_export(&self, options: &ExportOptions) -> Result<ExportArtifact, DataTableError>
    where
        T: Serialize,
    {
        if !self.options.enable_export {
            return Err(ExportError::Disabled.into());
        }
        let rows = self.export_rows(options);
        let columns = self.export_columns();
        Ok(build_artifact(&rows, &columns, options)?)
    }

    /// Exports through the custom exporter if set, else delivers the built
    /// artifact to the export sink.
    pub async fn export(&self, options: ExportOptions) -> Result<(), DataTableError>
    where
        T: Serialize,
    {
        if !self.options.enable_export {
            return Err(ExportError::Disabled.into());
        }
        if let Some(exporter) = &self.exporter {
            exporter.export(options).await?;
            return Ok(());
        }
        let sink = self.export_sink.as_ref().ok_or(ExportError::NoSink)?;
        let artifact = self.build_export(&options)?;
        sink.deliver(artifact).await?;
        Ok(())
    }
}

impl<T> std::fmt::Debug for DataTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTable")
            .field("columns", &self.columns.len())
            .field("rows", &self.rows.len())
            .field("view", &self.view.len())
            .field("filters", self.filters.state())
            .field("sort", self.sorting.state())
            .field("bulk_panel", &self.bulk_panel)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::Record;

    fn columns() -> Vec<ColumnDef<Record>> {
        vec![
            ColumnDef::new("name", "Name").accessor_key("name"),
            ColumnDef::new("age", "Age").accessor_key("age"),
            ColumnDef::new("notes", "Notes")
                .accessor_key("notes")
                .filterable(false)
                .sortable(false),
        ]
    }

    fn people() -> Vec<Record> {
        vec![
            Record::new(1).set("name", "Alice").set("age", 30),
            Record::new(2).set("name", "Bob").set("age", 25),
            Record::new(3).set("name", "Carol").set("age", 41),
        ]
    }

    fn table(options: DataTableOptions) -> DataTable<Record> {
        DataTable::builder(columns())
            .rows(people())
            .options(options)
            .build()
            .unwrap()
    }

    fn names(table: &DataTable<Record>) -> Vec<String> {
        table
            .view()
            .iter()
            .map(|r| r.get("name").to_string())
            .collect()
    }

    #[test]
    fn test_primary_column_sorts_initial_view() {
        let table = table(DataTableOptions::new().with_primary_column("name"));
        assert_eq!(names(&table), vec!["Alice", "Bob", "Carol"]);
        assert_eq!(table.sort_state(), &SortState::asc("name"));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = DataTable::<Record>::builder(vec![ColumnDef::new("a", "A"), ColumnDef::new("a", "B")]).build();
        assert!(matches!(result, Err(DataTableError::DuplicateColumn(id)) if id == "a"));
    }

    #[test]
    fn test_staged_filter_only_applies_on_apply() {
        let mut table = table(DataTableOptions::default());
        table.stage_filter(ColumnFilter::between("age", 26, 40)).unwrap();
        assert_eq!(table.view().len(), 3);
        assert!(table.has_pending_filters());

        assert!(table.apply_filter("age").unwrap());
        assert_eq!(names(&table), vec!["Alice"]);
        assert!(!table.has_pending_filters());
    }

    #[test]
    fn test_filter_errors() {
        let mut table = table(DataTableOptions::default());
        assert!(matches!(
            table.stage_filter(ColumnFilter::contains("notes", "x")),
            Err(DataTableError::ColumnNotFilterable(_))
        ));
        assert!(matches!(table.apply_filter("missing"), Err(DataTableError::UnknownColumn(_))));

        let mut table = self::table(DataTableOptions::default().with_global_search(false));
        assert!(matches!(
            table.set_global_search("bob"),
            Err(DataTableError::FeatureDisabled(_))
        ));
    }

    #[test]
    fn test_filter_chips() {
        let mut table = table(DataTableOptions::default());
        table.set_global_search("a").unwrap();
        table
            .apply_column_filter(ColumnFilter::one_of("name", ["Alice", "Carol"]))
            .unwrap();
        let chips = table.filter_chips();
        assert_eq!(chips.len(), 2);
        assert_eq!(chips[0].column_id, None);
        assert_eq!(chips[1].label, "Name");
        assert_eq!(chips[1].count, 2);
    }

    #[test]
    fn test_sort_ignores_unsortable_column() {
        let mut table = table(DataTableOptions::default());
        assert!(!table.toggle_sort("notes").unwrap());
        assert!(table.toggle_sort("age").unwrap());
        assert_eq!(names(&table), vec!["Bob", "Alice", "Carol"]);
    }

    #[test]
    fn test_status_precedence() {
        let mut table = table(DataTableOptions::default());
        assert_eq!(table.status(), TableStatus::Ready);

        table.set_loading(true);
        assert_eq!(table.status(), TableStatus::Loading);
        assert!(table.view().is_empty());

        table.set_empty(true);
        assert_eq!(table.status(), TableStatus::Loading);

        table.set_loading(false);
        assert!(matches!(table.status(), TableStatus::Empty(_)));

        table.set_error(Some("boom".into()));
        assert_eq!(
            table.status(),
            TableStatus::Error(crate::options::DEFAULT_ERROR_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_no_results_status() {
        let mut table = table(DataTableOptions::default());
        table.set_global_search("zzz").unwrap();
        assert!(matches!(table.status(), TableStatus::NoResults(_)));
    }

    #[test]
    fn test_selection_requires_feature() {
        let mut table = table(DataTableOptions::default());
        assert!(table.toggle_all_selection().is_err());

        let mut table = self::table(DataTableOptions::default().with_selection(true));
        let selected = table.toggle_all_selection().unwrap();
        assert_eq!(selected.len(), 3);
        assert!(table.selection_summary().is_all_selected);
    }

    #[test]
    fn test_enter_toggles_expansion_when_enabled() {
        let expanded = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&expanded);
        let mut table = DataTable::builder(columns())
            .rows(people())
            .options(DataTableOptions::default().with_row_expansion(true))
            .on_row_expand(move |row: &Record, open| {
                if let Ok(mut log) = sink.lock() {
                    log.push((row.id(), open));
                }
            })
            .build()
            .unwrap();

        table.handle_key(NavKey::ArrowDown);
        assert_eq!(table.handle_key(NavKey::Enter), NavOutcome::Activate(0));
        assert!(table.is_row_expanded(&RowId::from(1)));
        assert_eq!(*expanded.lock().unwrap(), vec![(RowId::from(1), true)]);
    }

    #[test]
    fn test_enter_clicks_row_without_expansion() {
        let clicked = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&clicked);
        let mut table = DataTable::builder(columns())
            .rows(people())
            .on_row_click(move |row: &Record| {
                if let Ok(mut last) = sink.lock() {
                    *last = Some(row.id());
                }
            })
            .build()
            .unwrap();

        let events = KeyEvents::new();
        table.mount(&events);
        events.dispatch(NavKey::ArrowDown);
        events.dispatch(NavKey::ArrowDown);
        events.dispatch(NavKey::Enter);
        let outcomes = table.process_pending_keys();
        assert_eq!(outcomes.last(), Some(&NavOutcome::Activate(1)));
        assert_eq!(*clicked.lock().unwrap(), Some(RowId::from(2)));

        table.unmount();
        assert_eq!(events.subscriber_count(), 0);
        assert_eq!(table.focused_index(), None);
    }

    #[test]
    fn test_focus_clamps_when_view_shrinks() {
        let mut table = table(DataTableOptions::default());
        table.handle_key(NavKey::ArrowDown);
        table.handle_key(NavKey::ArrowDown);
        table.handle_key(NavKey::ArrowDown);
        assert_eq!(table.focused_index(), Some(2));

        table.set_global_search("bob").unwrap();
        assert_eq!(table.focused_index(), Some(0));
    }

    #[test]
    fn test_location_tracks_filters() {
        let url = Url::parse("https://app.test/users?page=2").unwrap();
        let mut table = DataTable::builder(columns())
            .rows(people())
            .options(DataTableOptions::default().with_persist_filters(true))
            .location(url)
            .build()
            .unwrap();

        table.set_global_search("bob").unwrap();
        assert_eq!(
            table.location().map(Url::as_str),
            Some("https://app.test/users?page=2&search=bob")
        );

        table.clear_all_filters();
        assert_eq!(table.location().map(Url::as_str), Some("https://app.test/users?page=2"));
    }

    #[test]
    fn test_export_requires_feature() {
        let table = table(DataTableOptions::default());
        assert!(matches!(
            table.build_export(&ExportOptions::default()),
            Err(DataTableError::Export(ExportError::Disabled))
        ));
    }
}
