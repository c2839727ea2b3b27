//! Row selection with internal or caller-owned storage.
//!
//! Selection is keyed by [`RowId`] so it stays stable while rows are
//! filtered, sorted or reloaded. Rows hidden by a filter keep their selected
//! state. Aggregate flags are computed against the rows currently shown.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::model::RowId;
use crate::model::TableRow;

/// Where the selected ids live.
///
/// Chosen once when the table is built.
pub trait SelectionStore: Send + Sync {
    /// Currently selected ids.
    fn selected(&self) -> BTreeSet<RowId>;

    /// Records the next selection.
    fn commit(&mut self, next: BTreeSet<RowId>);

    /// Returns `true` when the caller owns the selection.
    fn is_controlled(&self) -> bool;

    /// Returns `true` if `id` is selected.
    fn contains(&self, id: &RowId) -> bool {
        self.selected().contains(id)
    }
}

/// Selection owned by the table.
#[derive(Debug, Clone, Default)]
pub struct InternalSelectionStore {
    selected: BTreeSet<RowId>,
}

impl InternalSelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with ids preselected.
    pub fn with_selected(ids: impl IntoIterator<Item = RowId>) -> Self {
        Self {
            selected: ids.into_iter().collect(),
        }
    }
}

impl SelectionStore for InternalSelectionStore {
    fn selected(&self) -> BTreeSet<RowId> {
        self.selected.clone()
    }

    fn commit(&mut self, next: BTreeSet<RowId>) {
        self.selected = next;
    }

    fn is_controlled(&self) -> bool {
        false
    }

    fn contains(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }
}

/// Reads the caller's selected ids.
pub type SelectionReader = Arc<dyn Fn() -> Vec<RowId> + Send + Sync>;

/// Receives the selection the table computed.
pub type SelectionWriter = Arc<dyn Fn(&[RowId]) + Send + Sync>;

/// Selection owned by the caller.
///
/// Reads always go through the caller; the table never keeps its own copy.
/// Computed selections are handed to the writer, and only show up once the
/// caller's reader returns them.
#[derive(Clone)]
pub struct ExternalSelectionStore {
    read: SelectionReader,
    write: Option<SelectionWriter>,
}

impl ExternalSelectionStore {
    /// Creates a store from read and write callbacks.
    pub fn new(
        read: impl Fn() -> Vec<RowId> + Send + Sync + 'static,
        write: impl Fn(&[RowId]) + Send + Sync + 'static,
    ) -> Self {
        Self {
            read: Arc::new(read),
            write: Some(Arc::new(write)),
        }
    }

    /// Creates a store over a fixed id list. Writes are dropped.
    pub fn fixed(ids: Vec<RowId>) -> Self {
        Self {
            read: Arc::new(move || ids.clone()),
            write: None,
        }
    }
}

impl SelectionStore for ExternalSelectionStore {
    fn selected(&self) -> BTreeSet<RowId> {
        (self.read)().into_iter().collect()
    }

    fn commit(&mut self, next: BTreeSet<RowId>) {
        if let Some(write) = &self.write {
            let ids: Vec<RowId> = next.into_iter().collect();
            write(&ids);
        }
    }

    fn is_controlled(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for ExternalSelectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalSelectionStore")
            .field("write", &self.write.is_some())
            .finish_non_exhaustive()
    }
}

/// Aggregate selection flags for the header checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionSummary {
    /// Total selected ids, including rows hidden by filters.
    pub selected_count: usize,
    /// Selected rows among those shown.
    pub visible_selected: usize,
    /// Every shown row is selected (and at least one is shown).
    pub is_all_selected: bool,
    /// Some but not all shown rows are selected.
    pub is_indeterminate: bool,
}

/// Callback receiving the shown rows that are selected.
pub type SelectionChangeCallback<T> = Box<dyn Fn(&[T]) + Send + Sync>;

/// Selection state over the rows currently shown.
pub struct Selection<T> {
    store: Box<dyn SelectionStore>,
    on_change: Option<SelectionChangeCallback<T>>,
}

impl<T: TableRow> Selection<T> {
    /// Creates a selection backed by `store`.
    pub fn new(store: impl SelectionStore + 'static) -> Self {
        Self::boxed(Box::new(store))
    }

    /// Creates a selection from an already boxed store.
    pub fn boxed(store: Box<dyn SelectionStore>) -> Self {
        Self { store, on_change: None }
    }

    /// Sets the change callback.
    pub fn with_callback(mut self, callback: impl Fn(&[T]) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Returns `true` when the caller owns the selection.
    pub fn is_controlled(&self) -> bool {
        self.store.is_controlled()
    }

    /// Currently selected ids.
    pub fn selected_ids(&self) -> BTreeSet<RowId> {
        self.store.selected()
    }

    pub fn is_row_selected(&self, id: &RowId) -> bool {
        self.store.contains(id)
    }

    /// Flips one row. Returns the computed selection.
    pub fn toggle_row(&mut self, id: &RowId, visible: &[T]) -> BTreeSet<RowId> {
        let mut next = self.store.selected();
        if !next.remove(id) {
            next.insert(id.clone());
        }
        self.update(next, visible)
    }

    /// Selects every shown row, or deselects them all if already selected.
    ///
    /// Selecting is additive: ids outside `visible` are kept. Deselecting
    /// removes exactly the shown ids.
    pub fn toggle_all(&mut self, visible: &[T]) -> BTreeSet<RowId> {
        let mut next = self.store.selected();
        let all_selected = !visible.is_empty() && visible.iter().all(|row| next.contains(&row.id()));
        if all_selected {
            for row in visible {
                next.remove(&row.id());
            }
        } else {
            next.extend(visible.iter().map(|row| row.id()));
        }
        self.update(next, visible)
    }

    /// Deselects everything.
    pub fn clear(&mut self, visible: &[T]) -> BTreeSet<RowId> {
        self.update(BTreeSet::new(), visible)
    }

    /// Shown rows that are selected, in display order.
    pub fn selected_rows(&self, visible: &[T]) -> Vec<T> {
        let selected = self.store.selected();
        visible
            .iter()
            .filter(|row| selected.contains(&row.id()))
            .cloned()
            .collect()
    }

    /// Header checkbox flags against the shown rows.
    pub fn summary(&self, visible: &[T]) -> SelectionSummary {
        let selected = self.store.selected();
        let visible_selected = visible.iter().filter(|row| selected.contains(&row.id())).count();
        SelectionSummary {
            selected_count: selected.len(),
            visible_selected,
            is_all_selected: !visible.is_empty() && visible_selected == visible.len(),
            is_indeterminate: visible_selected > 0 && visible_selected < visible.len(),
        }
    }

    fn update(&mut self, next: BTreeSet<RowId>, visible: &[T]) -> BTreeSet<RowId> {
        log::trace!("Selection now has {} ids", next.len());
        if let Some(callback) = &self.on_change {
            let rows: Vec<T> = visible
                .iter()
                .filter(|row| next.contains(&row.id()))
                .cloned()
                .collect();
            callback(&rows);
        }
        self.store.commit(next.clone());
        next
    }
}

impl<T> std::fmt::Debug for Selection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("controlled", &self.store.is_controlled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::Record;

    fn rows(ids: &[i64]) -> Vec<Record> {
        ids.iter().map(|id| Record::new(*id)).collect()
    }

    fn id(n: i64) -> RowId {
        RowId::Int(n)
    }

    #[test]
    fn test_toggle_row() {
        let visible = rows(&[1, 2, 3]);
        let mut selection: Selection<Record> = Selection::new(InternalSelectionStore::new());
        selection.toggle_row(&id(2), &visible);
        assert!(selection.is_row_selected(&id(2)));
        selection.toggle_row(&id(2), &visible);
        assert!(!selection.is_row_selected(&id(2)));
    }

    #[test]
    fn test_toggle_all_is_additive_and_self_inverse() {
        let visible = rows(&[1, 2]);
        let mut selection: Selection<Record> =
            Selection::new(InternalSelectionStore::with_selected([id(9)]));

        selection.toggle_all(&visible);
        assert_eq!(selection.selected_ids(), BTreeSet::from([id(1), id(2), id(9)]));

        selection.toggle_all(&visible);
        assert_eq!(selection.selected_ids(), BTreeSet::from([id(9)]));
    }

    #[test]
    fn test_summary_flags() {
        let visible = rows(&[1, 2, 3]);
        let selection: Selection<Record> =
            Selection::new(InternalSelectionStore::with_selected([id(1), id(7)]));
        let summary = selection.summary(&visible);
        assert_eq!(summary.selected_count, 2);
        assert_eq!(summary.visible_selected, 1);
        assert!(summary.is_indeterminate);
        assert!(!summary.is_all_selected);

        let empty = selection.summary(&[]);
        assert!(!empty.is_all_selected && !empty.is_indeterminate);
    }

    #[test]
    fn test_callback_receives_selected_visible_rows() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let visible = rows(&[1, 2, 3]);
        let mut selection = Selection::new(InternalSelectionStore::with_selected([id(8)]))
            .with_callback(move |rows: &[Record]| sink.lock().unwrap().push(rows.len()));

        selection.toggle_row(&id(1), &visible);
        selection.toggle_all(&visible);
        selection.clear(&visible);

        assert_eq!(*seen.lock().unwrap(), vec![1, 3, 0]);
    }

    #[test]
    fn test_controlled_store_is_source_of_truth() {
        let owned = Arc::new(Mutex::new(vec![id(1)]));
        let (reader, writer) = (owned.clone(), owned.clone());
        let store = ExternalSelectionStore::new(
            move || reader.lock().unwrap().clone(),
            move |ids| *writer.lock().unwrap() = ids.to_vec(),
        );
        let visible = rows(&[1, 2]);
        let mut selection: Selection<Record> = Selection::new(store);
        assert!(selection.is_controlled());

        selection.toggle_row(&id(2), &visible);
        assert_eq!(*owned.lock().unwrap(), vec![id(1), id(2)]);
        assert!(selection.is_row_selected(&id(2)));
    }

    #[test]
    fn test_fixed_store_ignores_writes() {
        let visible = rows(&[1, 2]);
        let mut selection: Selection<Record> = Selection::new(ExternalSelectionStore::fixed(vec![id(1)]));
        let next = selection.toggle_row(&id(2), &visible);
        assert_eq!(next, BTreeSet::from([id(1), id(2)]));
        assert!(!selection.is_row_selected(&id(2)));
    }
}
