//! Export error types

/// Errors that can occur while building or delivering an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Export was requested on a table without export enabled.
    #[error("Export is not enabled for this table")]
    Disabled,

    /// No sink or custom exporter was configured.
    #[error("No export sink configured")]
    NoSink,

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The produced bytes were not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Writing the artifact failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A caller supplied sink or exporter failed.
    #[error("Export failed: {0}")]
    Sink(String),
}

impl ExportError {
    /// Creates a new sink error.
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink(message.into())
    }
}
