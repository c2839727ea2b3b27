//! Page loading error types

/// Errors produced by a [`PageLoader`](crate::scroll::PageLoader).
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// The data source failed to produce the next page.
    #[error("Failed to load more rows: {0}")]
    Source(String),

    /// The load was abandoned before it produced a result.
    #[error("Load aborted")]
    Aborted,
}

impl LoadError {
    /// Creates a new source failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }
}
