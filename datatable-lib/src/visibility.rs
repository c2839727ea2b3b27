//! Column visibility with best-effort persistence.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::ErrorReporter;
use crate::error::PersistError;
use crate::model::ColumnDef;

/// Number of columns shown by default when no explicit list is given.
pub const MAX_DEFAULT_COLUMNS: usize = 5;

/// Saves the visible column ids somewhere outside the table.
#[async_trait]
pub trait ColumnVisibilityStore: Send + Sync {
    /// Persists the visible column ids, in column order.
    async fn save(&self, visible: Vec<String>) -> Result<(), PersistError>;
}

/// Callback receiving the visible column ids after every change.
pub type VisibilityChangeCallback = Box<dyn Fn(&[String]) + Send + Sync>;

/// Tracks which columns are shown.
///
/// The default set is fixed at construction: the explicit list when given,
/// otherwise the first [`MAX_DEFAULT_COLUMNS`] columns whose
/// `default_visible` flag is set. Visible ids are always reported in column
/// definition order.
///
/// With a store attached, every toggle or reset spawns a save on the current
/// tokio runtime. Save failures are reported and the visible set is kept.
pub struct ColumnVisibility {
    column_order: Vec<String>,
    defaults: BTreeSet<String>,
    visible: BTreeSet<String>,
    store: Option<Arc<dyn ColumnVisibilityStore>>,
    reporter: ErrorReporter,
    on_change: Option<VisibilityChangeCallback>,
}

impl ColumnVisibility {
    /// Creates visibility state for `columns`.
    pub fn new<T>(columns: &[ColumnDef<T>], defaults: Option<&[String]>) -> Self {
        let defaults: BTreeSet<String> = match defaults {
            Some(ids) => ids.iter().cloned().collect(),
            None => columns
                .iter()
                .filter(|c| c.default_visible)
                .take(MAX_DEFAULT_COLUMNS)
                .map(|c| c.id.clone())
                .collect(),
        };
        Self {
            column_order: columns.iter().map(|c| c.id.clone()).collect(),
            visible: defaults.clone(),
            defaults,
            store: None,
            reporter: ErrorReporter::default(),
            on_change: None,
        }
    }

    /// Attaches a persistence store.
    pub fn with_store(mut self, store: Arc<dyn ColumnVisibilityStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets where save failures are reported.
    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Sets the change callback.
    pub fn with_callback(mut self, callback: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn is_visible(&self, column_id: &str) -> bool {
        self.visible.contains(column_id)
    }

    /// Visible ids in column order. Ids without a column come last, sorted.
    pub fn visible_columns(&self) -> Vec<String> {
        ordered(&self.column_order, &self.visible)
    }

    /// The default visible ids in column order.
    pub fn default_columns(&self) -> Vec<String> {
        ordered(&self.column_order, &self.defaults)
    }

    /// Shows or hides a column.
    pub fn toggle_column(&mut self, column_id: &str) -> Option<JoinHandle<()>> {
        if !self.visible.remove(column_id) {
            self.visible.insert(column_id.to_string());
        }
        log::debug!("Toggled column '{}'", column_id);
        self.changed()
    }

    /// Restores the default visible set.
    pub fn reset_to_default(&mut self) -> Option<JoinHandle<()>> {
        self.visible = self.defaults.clone();
        log::debug!("Reset column visibility to defaults");
        self.changed()
    }

    fn changed(&self) -> Option<JoinHandle<()>> {
        let visible = self.visible_columns();
        if let Some(callback) = &self.on_change {
            callback(&visible);
        }
        let store = self.store.clone()?;

        let Ok(runtime) = Handle::try_current() else {
            self.reporter.report("Column visibility save skipped", &PersistError::NoRuntime);
            return None;
        };
        let reporter = self.reporter.clone();
        Some(runtime.spawn(async move {
            if let Err(e) = store.save(visible).await {
                reporter.report("Column visibility save failed", &e);
            }
        }))
    }
}

impl std::fmt::Debug for ColumnVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnVisibility")
            .field("visible", &self.visible_columns())
            .field("defaults", &self.default_columns())
            .field("store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

fn ordered(column_order: &[String], ids: &BTreeSet<String>) -> Vec<String> {
    let mut out: Vec<String> = column_order.iter().filter(|id| ids.contains(*id)).cloned().collect();
    out.extend(ids.iter().filter(|id| !column_order.contains(*id)).cloned());
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::Record;

    fn columns(n: usize) -> Vec<ColumnDef<Record>> {
        (0..n).map(|i| ColumnDef::new(format!("c{}", i), format!("C{}", i))).collect()
    }

    struct Recorder {
        saves: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl ColumnVisibilityStore for Recorder {
        async fn save(&self, visible: Vec<String>) -> Result<(), PersistError> {
            self.saves.lock().unwrap().push(visible);
            if self.fail {
                Err(PersistError::store("disk full"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_first_five_are_default_visible() {
        let mut visibility = ColumnVisibility::new(&columns(8), None);
        assert_eq!(visibility.visible_columns(), ["c0", "c1", "c2", "c3", "c4"]);

        visibility.toggle_column("c6");
        visibility.toggle_column("c1");
        assert_eq!(visibility.visible_columns(), ["c0", "c2", "c3", "c4", "c6"]);

        visibility.reset_to_default();
        assert_eq!(visibility.visible_columns(), ["c0", "c1", "c2", "c3", "c4"]);
    }

    #[test]
    fn test_default_visible_flag_is_respected() {
        let mut cols = columns(7);
        cols[1].default_visible = false;
        let visibility = ColumnVisibility::new(&cols, None);
        assert_eq!(visibility.visible_columns(), ["c0", "c2", "c3", "c4", "c5"]);
    }

    #[test]
    fn test_explicit_defaults() {
        let defaults = vec!["c3".to_string(), "c0".to_string()];
        let visibility = ColumnVisibility::new(&columns(4), Some(&defaults));
        assert_eq!(visibility.visible_columns(), ["c0", "c3"]);
    }

    #[test]
    fn test_no_runtime_skips_save() {
        let store = Arc::new(Recorder {
            saves: Mutex::new(Vec::new()),
            fail: false,
        });
        let mut visibility = ColumnVisibility::new(&columns(3), None).with_store(store.clone());
        assert!(visibility.toggle_column("c0").is_none());
        assert!(!visibility.is_visible("c0"));
        assert!(store.saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_keeps_state() {
        let store = Arc::new(Recorder {
            saves: Mutex::new(Vec::new()),
            fail: true,
        });
        let errors = Arc::new(Mutex::new(0));
        let counter = errors.clone();
        let reporter = ErrorReporter::new().with_hook(move |_| *counter.lock().unwrap() += 1);
        let mut visibility = ColumnVisibility::new(&columns(3), None)
            .with_store(store.clone())
            .with_reporter(reporter);

        let handle = visibility.toggle_column("c1").unwrap();
        handle.await.unwrap();

        assert_eq!(visibility.visible_columns(), ["c0", "c2"]);
        assert_eq!(*store.saves.lock().unwrap(), vec![vec!["c0".to_string(), "c2".to_string()]]);
        assert_eq!(*errors.lock().unwrap(), 1);
    }
}
