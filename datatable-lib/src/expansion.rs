//! Expanded rows.

use std::collections::BTreeSet;

use crate::model::RowId;

/// Set of expanded row ids.
#[derive(Debug, Clone, Default)]
pub struct RowExpansion {
    expanded: BTreeSet<RowId>,
}

impl RowExpansion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips a row. Returns `true` if it is now expanded.
    pub fn toggle(&mut self, id: &RowId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    pub fn is_expanded(&self, id: &RowId) -> bool {
        self.expanded.contains(id)
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Expands every given row, keeping rows already expanded.
    pub fn expand_all(&mut self, ids: impl IntoIterator<Item = RowId>) {
        self.expanded.extend(ids);
    }

    pub fn expanded(&self) -> &BTreeSet<RowId> {
        &self.expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_bulk_operations() {
        let mut expansion = RowExpansion::new();
        assert!(expansion.toggle(&RowId::Int(1)));
        assert!(expansion.is_expanded(&RowId::Int(1)));
        assert!(!expansion.toggle(&RowId::Int(1)));

        expansion.expand_all([RowId::Int(1), RowId::from("b")]);
        assert_eq!(expansion.expanded().len(), 2);

        expansion.collapse_all();
        assert!(!expansion.is_expanded(&RowId::from("b")));
    }
}
