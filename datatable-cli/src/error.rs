use thiserror::Error;

use datatable_lib::error::DataTableError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Table(#[from] DataTableError),

    #[error("Logger setup failed: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("{0}")]
    InvalidArgument(String),
}
