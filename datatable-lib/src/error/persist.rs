//! Persistence error types

/// Errors produced while saving column visibility.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistError {
    /// The backing store rejected or failed the save.
    #[error("Failed to persist column visibility: {0}")]
    Store(String),

    /// No async runtime was available to run the save.
    #[error("No async runtime available for persistence")]
    NoRuntime,
}

impl PersistError {
    /// Creates a new store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }
}
