//! DataTable error types

use super::ExportError;
use super::LoadError;
use super::PersistError;

/// Top-level error type for the DataTable engine.
#[derive(Debug, thiserror::Error)]
pub enum DataTableError {
    /// Two column definitions share the same id.
    #[error("Duplicate column id '{0}'")]
    DuplicateColumn(String),

    /// A column id does not match any column definition.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// A filter was targeted at a column that cannot be filtered.
    #[error("Column '{0}' is not filterable")]
    ColumnNotFilterable(String),

    /// A row id does not match any loaded row.
    #[error("Unknown row '{0}'")]
    UnknownRow(String),

    /// An action id does not match any configured action.
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    /// A row could not be built from input data.
    #[error("Invalid record at index {index}: {message}")]
    InvalidRecord {
        /// Position of the record in its input.
        index: usize,
        /// What was wrong with it.
        message: String,
    },

    /// A feature was used while disabled in the table options.
    #[error("Feature '{0}' is disabled")]
    FeatureDisabled(&'static str),

    /// Page load error.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Persistence error.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// Export error.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataTableError {
    /// Creates a new invalid record error.
    pub fn invalid_record(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            message: message.into(),
        }
    }
}
