//! Column definitions and the row value accessor

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::CellValue;
use super::TableRow;
use crate::filter::FilterOperator;

/// Function resolving a cell value from a row.
pub type Accessor<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

/// Function turning a cell value into display text.
pub type CellFormatter = Arc<dyn Fn(&CellValue) -> String + Send + Sync>;

/// Function producing a header label from the column id.
pub type HeaderRenderer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Option lists between these sizes get a search box in the filter editor.
const OPTION_SEARCH_MIN: usize = 7;
const OPTION_SEARCH_MAX: usize = 20;

/// Kind of data held by a column.
///
/// Determines the default filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Number,
    Date,
    Boolean,
    Enum,
    Custom,
}

/// Side a column sticks to while scrolling horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sticky {
    #[default]
    None,
    Left,
    Right,
}

/// Column width, either in pixels or as a CSS length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnWidth {
    Px(u32),
    Css(String),
}

/// Column header content.
#[derive(Clone)]
pub enum Header {
    /// Plain text label.
    Text(String),
    /// Label computed by the host from the column id.
    Custom(HeaderRenderer),
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Header::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Header::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Column definition.
///
/// Columns define how a cell value is resolved from a row, how it is
/// displayed, and which table features apply to it.
///
/// # Example
///
/// ```ignore
/// let columns = vec![
///     ColumnDef::new("name", "Name").accessor_key("name"),
///     ColumnDef::new("age", "Age")
///         .accessor_fn(|u: &User| u.age.into())
///         .data_type(DataType::Number),
///     ColumnDef::new("status", "Status")
///         .data_type(DataType::Enum)
///         .filter_options(["active", "inactive"]),
/// ];
/// ```
pub struct ColumnDef<T> {
    /// Unique column id
    pub id: String,
    /// Header content
    pub header: Header,
    /// Field looked up through [`TableRow::field`]
    pub accessor_key: Option<String>,
    /// Accessor function, takes precedence over the key
    pub accessor_fn: Option<Accessor<T>>,
    /// Display formatter for cells
    pub formatter: Option<CellFormatter>,
    pub sortable: bool,
    pub filterable: bool,
    pub data_type: DataType,
    /// Allowed values for enum columns, in display order
    pub filter_options: Vec<String>,
    pub width: Option<ColumnWidth>,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
    /// Whether the column counts towards the default visible set
    pub default_visible: bool,
    pub sticky: Sticky,
}

impl<T: TableRow> ColumnDef<T> {
    /// Creates a column with a text header and no accessor.
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: Header::Text(header.into()),
            accessor_key: None,
            accessor_fn: None,
            formatter: None,
            sortable: true,
            filterable: true,
            data_type: DataType::String,
            filter_options: Vec::new(),
            width: None,
            min_width: None,
            max_width: None,
            default_visible: true,
            sticky: Sticky::None,
        }
    }

    /// Replaces the header with a custom renderer.
    pub fn custom_header(mut self, render: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.header = Header::Custom(Arc::new(render));
        self
    }

    /// Reads the cell from the row field named `key`.
    pub fn accessor_key(mut self, key: impl Into<String>) -> Self {
        self.accessor_key = Some(key.into());
        self
    }

    /// Computes the cell with a function.
    pub fn accessor_fn(mut self, f: impl Fn(&T) -> CellValue + Send + Sync + 'static) -> Self {
        self.accessor_fn = Some(Arc::new(f));
        self
    }

    /// Sets the display formatter.
    pub fn formatter(mut self, f: impl Fn(&CellValue) -> String + Send + Sync + 'static) -> Self {
        self.formatter = Some(Arc::new(f));
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn filter_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn width(mut self, width: ColumnWidth) -> Self {
        self.width = Some(width);
        self
    }

    pub fn min_width(mut self, px: u32) -> Self {
        self.min_width = Some(px);
        self
    }

    pub fn max_width(mut self, px: u32) -> Self {
        self.max_width = Some(px);
        self
    }

    pub fn default_visible(mut self, visible: bool) -> Self {
        self.default_visible = visible;
        self
    }

    pub fn sticky(mut self, sticky: Sticky) -> Self {
        self.sticky = sticky;
        self
    }

    /// Resolves the raw cell value for `row`.
    ///
    /// The accessor function wins over the key; with neither the value is
    /// `Null`.
    pub fn value(&self, row: &T) -> CellValue {
        if let Some(f) = &self.accessor_fn {
            return f(row);
        }
        match &self.accessor_key {
            Some(key) => row.field(key),
            None => CellValue::Null,
        }
    }

    /// Display text for the cell of `row`.
    pub fn render(&self, row: &T) -> String {
        let value = self.value(row);
        match &self.formatter {
            Some(format) => format(&value),
            None => value.to_string(),
        }
    }

    /// Header label as shown to the user.
    pub fn label(&self) -> String {
        match &self.header {
            Header::Text(text) => text.clone(),
            Header::Custom(render) => render(&self.id),
        }
    }

    /// Header used in exports: the text header, or the id for custom headers.
    pub fn export_header(&self) -> String {
        match &self.header {
            Header::Text(text) => text.clone(),
            Header::Custom(_) => self.id.clone(),
        }
    }

    /// Operator a new filter on this column starts with.
    pub fn default_operator(&self) -> FilterOperator {
        match self.data_type {
            DataType::Date | DataType::Number => FilterOperator::Between,
            DataType::Enum => FilterOperator::In,
            _ => FilterOperator::Contains,
        }
    }

    /// Whether the option list is long enough to be searchable.
    pub fn option_search_enabled(&self) -> bool {
        self.data_type == DataType::Enum
            && (OPTION_SEARCH_MIN..=OPTION_SEARCH_MAX).contains(&self.filter_options.len())
    }

    /// Options containing `term`, case-insensitively, in definition order.
    pub fn matching_options(&self, term: &str) -> Vec<&str> {
        let term = term.to_lowercase();
        self.filter_options
            .iter()
            .filter(|option| option.to_lowercase().contains(&term))
            .map(String::as_str)
            .collect()
    }
}

impl<T> Clone for ColumnDef<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            header: self.header.clone(),
            accessor_key: self.accessor_key.clone(),
            accessor_fn: self.accessor_fn.clone(),
            formatter: self.formatter.clone(),
            sortable: self.sortable,
            filterable: self.filterable,
            data_type: self.data_type,
            filter_options: self.filter_options.clone(),
            width: self.width.clone(),
            min_width: self.min_width,
            max_width: self.max_width,
            default_visible: self.default_visible,
            sticky: self.sticky,
        }
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("accessor_key", &self.accessor_key)
            .field("accessor_fn", &self.accessor_fn.is_some())
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("data_type", &self.data_type)
            .field("default_visible", &self.default_visible)
            .finish_non_exhaustive()
    }
}

/// Resolves the raw value of `column` for `row`.
pub fn cell_value<T: TableRow>(row: &T, column: &ColumnDef<T>) -> CellValue {
    column.value(row)
}

/// Looks up a column by id.
pub fn find_column<'a, T>(columns: &'a [ColumnDef<T>], id: &str) -> Option<&'a ColumnDef<T>> {
    columns.iter().find(|c| c.id == id)
}

// =============================================================================
// Serializable column description
// =============================================================================

/// Serializable column description for dynamically shaped rows.
///
/// Builds a key-accessor [`ColumnDef`]; the accessor key defaults to the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub id: String,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub accessor_key: Option<String>,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub filterable: bool,
    #[serde(default)]
    pub filter_options: Vec<String>,
    #[serde(default = "default_true")]
    pub default_visible: bool,
    #[serde(default)]
    pub width: Option<ColumnWidth>,
    #[serde(default)]
    pub min_width: Option<u32>,
    #[serde(default)]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub sticky: Sticky,
}

fn default_true() -> bool {
    true
}

impl ColumnSpec {
    /// Builds the column definition.
    pub fn into_column<T: TableRow>(self) -> ColumnDef<T> {
        let header = self.header.unwrap_or_else(|| self.id.clone());
        let key = self.accessor_key.unwrap_or_else(|| self.id.clone());
        let mut column = ColumnDef::new(self.id, header)
            .accessor_key(key)
            .data_type(self.data_type)
            .sortable(self.sortable)
            .filterable(self.filterable)
            .filter_options(self.filter_options)
            .default_visible(self.default_visible)
            .sticky(self.sticky);
        column.width = self.width;
        column.min_width = self.min_width;
        column.max_width = self.max_width;
        column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    #[test]
    fn test_accessor_fn_takes_precedence() {
        let row = Record::new(1).set("age", 30);
        let column: ColumnDef<Record> = ColumnDef::new("age", "Age")
            .accessor_key("age")
            .accessor_fn(|_| CellValue::from(99));
        assert_eq!(column.value(&row), CellValue::from(99));
    }

    #[test]
    fn test_missing_accessor_is_null() {
        let row = Record::new(1).set("age", 30);
        let column: ColumnDef<Record> = ColumnDef::new("age", "Age");
        assert!(cell_value(&row, &column).is_null());
    }

    #[test]
    fn test_default_operator_by_data_type() {
        let col = |t| ColumnDef::<Record>::new("c", "C").data_type(t).default_operator();
        assert_eq!(col(DataType::Number), FilterOperator::Between);
        assert_eq!(col(DataType::Date), FilterOperator::Between);
        assert_eq!(col(DataType::Enum), FilterOperator::In);
        assert_eq!(col(DataType::String), FilterOperator::Contains);
        assert_eq!(col(DataType::Boolean), FilterOperator::Contains);
    }

    #[test]
    fn test_option_search_threshold() {
        let options: Vec<String> = (0..7).map(|i| format!("Option {}", i)).collect();
        let column = ColumnDef::<Record>::new("c", "C")
            .data_type(DataType::Enum)
            .filter_options(options.clone());
        assert!(column.option_search_enabled());
        assert_eq!(column.matching_options("option 3"), vec!["Option 3"]);

        let short = ColumnDef::<Record>::new("c", "C")
            .data_type(DataType::Enum)
            .filter_options(options[..6].to_vec());
        assert!(!short.option_search_enabled());
    }

    #[test]
    fn test_custom_header_exports_id() {
        let column = ColumnDef::<Record>::new("status", "Status").custom_header(|id| id.to_uppercase());
        assert_eq!(column.label(), "STATUS");
        assert_eq!(column.export_header(), "status");
    }

    #[test]
    fn test_column_spec_defaults() {
        let spec: ColumnSpec = serde_json::from_value(serde_json::json!({"id": "name"})).unwrap();
        let column: ColumnDef<Record> = spec.into_column();
        assert_eq!(column.label(), "name");
        assert!(column.sortable && column.filterable && column.default_visible);
        assert_eq!(column.value(&Record::new(1).set("name", "A")), CellValue::from("A"));
    }
}
