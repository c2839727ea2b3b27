//! DataTable builder

use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use crate::actions::BulkAction;
use crate::actions::RowAction;
use crate::error::DataTableError;
use crate::error::ErrorReporter;
use crate::export::ExportSink;
use crate::export::Exporter;
use crate::filter::FilterState;
use crate::model::ColumnDef;
use crate::model::TableRow;
use crate::options::DataTableOptions;
use crate::scroll::PageLoader;
use crate::selection::SelectionStore;
use crate::sort::SortState;
use crate::table::DataTable;
use crate::visibility::ColumnVisibilityStore;

pub(crate) type RowCallback<T> = Box<dyn Fn(&T) + Send + Sync>;
pub(crate) type ExpandCallback<T> = Box<dyn Fn(&T, bool) + Send + Sync>;

/// Builder for [`DataTable`].
///
/// # Example
///
/// ```ignore
/// let table = DataTable::builder(columns)
///     .rows(users)
///     .options(DataTableOptions::default().with_selection(true))
///     .on_filter_change(|state| log::info!("{} filters", state.applied_filters.len()))
///     .page_loader(Arc::new(UsersPager::new(api)))
///     .build()?;
/// ```
pub struct DataTableBuilder<T> {
    pub(crate) columns: Vec<ColumnDef<T>>,
    pub(crate) rows: Vec<T>,
    pub(crate) options: DataTableOptions,
    pub(crate) on_filter_change: Option<Box<dyn Fn(&FilterState) + Send + Sync>>,
    pub(crate) on_sort_change: Option<Box<dyn Fn(&SortState) + Send + Sync>>,
    pub(crate) on_selection_change: Option<Box<dyn Fn(&[T]) + Send + Sync>>,
    pub(crate) on_visibility_change: Option<Box<dyn Fn(&[String]) + Send + Sync>>,
    pub(crate) on_row_click: Option<RowCallback<T>>,
    pub(crate) on_row_expand: Option<ExpandCallback<T>>,
    pub(crate) selection_store: Option<Box<dyn SelectionStore>>,
    pub(crate) visibility_store: Option<Arc<dyn ColumnVisibilityStore>>,
    pub(crate) page_loader: Option<Arc<dyn PageLoader<T>>>,
    pub(crate) row_actions: Vec<RowAction<T>>,
    pub(crate) bulk_actions: Vec<BulkAction<T>>,
    pub(crate) export_sink: Option<Arc<dyn ExportSink>>,
    pub(crate) exporter: Option<Arc<dyn Exporter>>,
    pub(crate) reporter: ErrorReporter,
    pub(crate) location: Option<Url>,
}

impl<T: TableRow> DataTableBuilder<T> {
    pub(crate) fn new(columns: Vec<ColumnDef<T>>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            options: DataTableOptions::default(),
            on_filter_change: None,
            on_sort_change: None,
            on_selection_change: None,
            on_visibility_change: None,
            on_row_click: None,
            on_row_expand: None,
            selection_store: None,
            visibility_store: None,
            page_loader: None,
            row_actions: Vec::new(),
            bulk_actions: Vec::new(),
            export_sink: None,
            exporter: None,
            reporter: ErrorReporter::default(),
            location: None,
        }
    }

    /// Sets the initial rows.
    pub fn rows(mut self, rows: Vec<T>) -> Self {
        self.rows = rows;
        self
    }

    pub fn options(mut self, options: DataTableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn on_filter_change(mut self, f: impl Fn(&FilterState) + Send + Sync + 'static) -> Self {
        self.on_filter_change = Some(Box::new(f));
        self
    }

    pub fn on_sort_change(mut self, f: impl Fn(&SortState) + Send + Sync + 'static) -> Self {
        self.on_sort_change = Some(Box::new(f));
        self
    }

    /// Called with the shown rows that are selected after each selection change.
    pub fn on_selection_change(mut self, f: impl Fn(&[T]) + Send + Sync + 'static) -> Self {
        self.on_selection_change = Some(Box::new(f));
        self
    }

    pub fn on_column_visibility_change(mut self, f: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        self.on_visibility_change = Some(Box::new(f));
        self
    }

    pub fn on_row_click(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_row_click = Some(Box::new(f));
        self
    }

    pub fn on_row_expand(mut self, f: impl Fn(&T, bool) + Send + Sync + 'static) -> Self {
        self.on_row_expand = Some(Box::new(f));
        self
    }

    /// Hands selection ownership to the caller.
    pub fn selection_store(mut self, store: impl SelectionStore + 'static) -> Self {
        self.selection_store = Some(Box::new(store));
        self
    }

    /// Store used when `persist_column_visibility` is enabled.
    pub fn column_visibility_store(mut self, store: Arc<dyn ColumnVisibilityStore>) -> Self {
        self.visibility_store = Some(store);
        self
    }

    /// Enables infinite scroll.
    pub fn page_loader(mut self, loader: Arc<dyn PageLoader<T>>) -> Self {
        self.page_loader = Some(loader);
        self
    }

    pub fn row_action(mut self, action: RowAction<T>) -> Self {
        self.row_actions.push(action);
        self
    }

    pub fn bulk_action(mut self, action: BulkAction<T>) -> Self {
        self.bulk_actions.push(action);
        self
    }

    pub fn export_sink(mut self, sink: Arc<dyn ExportSink>) -> Self {
        self.export_sink = Some(sink);
        self
    }

    /// Replaces the built-in export.
    pub fn exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Sets where load and persistence failures are reported.
    pub fn error_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Page URL kept in sync with the filters when `persist_filters` is set.
    pub fn location(mut self, url: Url) -> Self {
        self.location = Some(url);
        self
    }

    /// Validates the columns and builds the table.
    pub fn build(self) -> Result<DataTable<T>, DataTableError> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.id.as_str()) {
                return Err(DataTableError::DuplicateColumn(column.id.clone()));
            }
        }
        if let Some(primary) = &self.options.primary_column_id
            && !seen.contains(primary.as_str())
        {
            return Err(DataTableError::UnknownColumn(primary.clone()));
        }
        Ok(DataTable::from_builder(self))
    }
}

impl<T> std::fmt::Debug for DataTableBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTableBuilder")
            .field("columns", &self.columns.len())
            .field("rows", &self.rows.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
