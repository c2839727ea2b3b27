//! Editing state for a single column's filter.

use super::ColumnFilter;
use super::FilterCondition;
use super::FilterOperator;
use super::FilterStaging;
use crate::model::CellValue;
use crate::model::ColumnDef;
use crate::model::TableRow;

/// Value being edited, shaped by the draft's operator.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftValue {
    /// Free text for `equals`, `contains`, `startsWith` and `endsWith`.
    Text(String),
    /// Lower and upper bound for `between`. `Null` means unset.
    Range(CellValue, CellValue),
    /// Checked options for `in`.
    Options(Vec<CellValue>),
}

impl DraftValue {
    fn empty(operator: FilterOperator) -> Self {
        match operator {
            FilterOperator::Between => DraftValue::Range(CellValue::Null, CellValue::Null),
            FilterOperator::In => DraftValue::Options(Vec::new()),
            _ => DraftValue::Text(String::new()),
        }
    }

    fn from_condition(condition: &FilterCondition) -> Self {
        match condition {
            FilterCondition::Equals(s)
            | FilterCondition::Contains(s)
            | FilterCondition::StartsWith(s)
            | FilterCondition::EndsWith(s) => DraftValue::Text(s.clone()),
            FilterCondition::Between(min, max) => DraftValue::Range(min.clone(), max.clone()),
            FilterCondition::In(values) => DraftValue::Options(values.clone()),
        }
    }
}

/// Filter editor state for one column.
///
/// A draft is opened from a column and its currently applied filter. Edits
/// stay local until committed; committing an empty value clears the column.
/// Cancelling restores the value the draft was opened with.
///
/// # Example
///
/// ```ignore
/// let mut draft = FilterDraft::open(&age_column, staging.applied("age"));
/// draft.set_range(26, 40);
/// assert!(draft.has_changes());
/// draft.commit(&mut staging);
/// ```
#[derive(Debug, Clone)]
pub struct FilterDraft {
    column_id: String,
    operator: FilterOperator,
    value: DraftValue,
    initial: Option<FilterCondition>,
    options: Vec<String>,
    option_search: bool,
    search_term: String,
}

impl FilterDraft {
    /// Opens a draft for `column`, seeded from its applied filter.
    ///
    /// The operator is the applied filter's, or the column's default.
    pub fn open<T: TableRow>(column: &ColumnDef<T>, current: Option<&ColumnFilter>) -> Self {
        let initial = current.map(|f| f.condition.clone());
        let operator = initial
            .as_ref()
            .map(FilterCondition::operator)
            .unwrap_or_else(|| column.default_operator());
        let value = initial
            .as_ref()
            .map(DraftValue::from_condition)
            .unwrap_or_else(|| DraftValue::empty(operator));
        Self {
            column_id: column.id.clone(),
            operator,
            value,
            initial,
            options: column.filter_options.clone(),
            option_search: column.option_search_enabled(),
            search_term: String::new(),
        }
    }

    /// Returns the column being edited.
    pub fn column_id(&self) -> &str {
        &self.column_id
    }

    /// Returns the operator the draft will apply.
    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Returns the value being edited.
    pub fn value(&self) -> &DraftValue {
        &self.value
    }

    /// Switches operator, resetting the value when its shape changes.
    pub fn set_operator(&mut self, operator: FilterOperator) {
        if operator == self.operator {
            return;
        }
        let reshape = std::mem::discriminant(&DraftValue::empty(operator)) != std::mem::discriminant(&self.value);
        self.operator = operator;
        if reshape {
            self.value = DraftValue::empty(operator);
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.value = DraftValue::Text(text.into());
    }

    pub fn set_range(&mut self, min: impl Into<CellValue>, max: impl Into<CellValue>) {
        self.value = DraftValue::Range(min.into(), max.into());
    }

    pub fn set_options<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.value = DraftValue::Options(values.into_iter().map(Into::into).collect());
    }

    /// Checks or unchecks one option.
    pub fn toggle_option(&mut self, option: impl Into<CellValue>) {
        let option = option.into();
        let DraftValue::Options(values) = &mut self.value else {
            self.value = DraftValue::Options(vec![option]);
            return;
        };
        match values.iter().position(|v| *v == option) {
            Some(index) => {
                values.remove(index);
            }
            None => values.push(option),
        }
    }

    /// Sets the option search term.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Options to display, narrowed by the search term when searchable.
    pub fn visible_options(&self) -> Vec<&str> {
        if !self.option_search || self.search_term.is_empty() {
            return self.options.iter().map(String::as_str).collect();
        }
        let term = self.search_term.to_lowercase();
        self.options
            .iter()
            .filter(|o| o.to_lowercase().contains(&term))
            .map(String::as_str)
            .collect()
    }

    /// Whether the option list shows a search box.
    pub fn option_search_enabled(&self) -> bool {
        self.option_search
    }

    /// The condition this draft would apply, or `None` when empty.
    pub fn condition(&self) -> Option<FilterCondition> {
        let condition = match (&self.value, self.operator) {
            (DraftValue::Text(s), FilterOperator::Equals) => FilterCondition::Equals(s.clone()),
            (DraftValue::Text(s), FilterOperator::StartsWith) => FilterCondition::StartsWith(s.clone()),
            (DraftValue::Text(s), FilterOperator::EndsWith) => FilterCondition::EndsWith(s.clone()),
            (DraftValue::Text(s), _) => FilterCondition::Contains(s.clone()),
            (DraftValue::Range(min, max), _) => FilterCondition::Between(min.clone(), max.clone()),
            (DraftValue::Options(values), _) => FilterCondition::In(values.clone()),
        };
        (!condition.is_empty()).then_some(condition)
    }

    /// Returns `true` if the draft differs from the value it opened with.
    pub fn has_changes(&self) -> bool {
        self.condition() != self.initial
    }

    /// Applies the draft. An empty value clears the column instead.
    pub fn commit(&mut self, staging: &mut FilterStaging) {
        match self.condition() {
            Some(condition) => staging.apply_filter(ColumnFilter::new(self.column_id.clone(), condition)),
            None => staging.clear(&self.column_id),
        }
        self.initial = self.condition();
        self.search_term.clear();
    }

    /// Stages the draft without applying it. An empty value drops the staged edit.
    pub fn stage(&self, staging: &mut FilterStaging) {
        match self.condition() {
            Some(condition) => staging.stage(ColumnFilter::new(self.column_id.clone(), condition)),
            None => staging.cancel(&self.column_id),
        }
    }

    /// Restores the value the draft was opened with.
    pub fn cancel(&mut self) {
        self.value = self
            .initial
            .as_ref()
            .map(DraftValue::from_condition)
            .unwrap_or_else(|| DraftValue::empty(self.operator));
        self.search_term.clear();
    }

    /// Empties the draft and clears the column's filter.
    pub fn clear(&mut self, staging: &mut FilterStaging) {
        self.value = DraftValue::empty(self.operator);
        self.initial = None;
        self.search_term.clear();
        staging.clear(&self.column_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterState;
    use crate::model::DataType;
    use crate::model::Record;

    fn status_column() -> ColumnDef<Record> {
        ColumnDef::new("status", "Status")
            .accessor_key("status")
            .data_type(DataType::Enum)
            .filter_options(["active", "inactive", "pending"])
    }

    #[test]
    fn test_open_uses_default_operator() {
        let draft = FilterDraft::open(&status_column(), None);
        assert_eq!(draft.operator(), FilterOperator::In);
        assert!(!draft.has_changes());
        assert!(draft.condition().is_none());
    }

    #[test]
    fn test_commit_applies_filter() {
        let mut staging = FilterStaging::new(FilterState::default());
        let mut draft = FilterDraft::open(&status_column(), None);
        draft.toggle_option("active");
        draft.toggle_option("pending");
        assert!(draft.has_changes());

        draft.commit(&mut staging);

        assert_eq!(
            staging.applied("status"),
            Some(&ColumnFilter::one_of("status", ["active", "pending"]))
        );
        assert!(!draft.has_changes());
    }

    #[test]
    fn test_commit_empty_clears_column() {
        let mut staging =
            FilterStaging::new(FilterState::new().with_filter(ColumnFilter::one_of("status", ["active"])));
        let mut draft = FilterDraft::open(&status_column(), staging.applied("status"));
        draft.toggle_option("active");
        draft.commit(&mut staging);
        assert!(staging.applied("status").is_none());
    }

    #[test]
    fn test_cancel_restores_opened_value() {
        let current = ColumnFilter::one_of("status", ["active"]);
        let mut draft = FilterDraft::open(&status_column(), Some(&current));
        draft.set_options(["inactive"]);
        draft.cancel();
        assert_eq!(draft.condition(), Some(current.condition));
    }

    #[test]
    fn test_short_option_list_is_not_searchable() {
        let mut draft = FilterDraft::open(&status_column(), None);
        draft.set_search_term("act");
        assert!(!draft.option_search_enabled());
        assert_eq!(draft.visible_options().len(), 3);
    }
}
