//! Error channel for failures that never abort the table

use std::fmt;
use std::sync::Arc;

/// Hook invoked with every reported failure.
pub type ErrorHook = Arc<dyn Fn(&dyn std::error::Error) + Send + Sync>;

/// Reports non-fatal failures (load-more, persistence saves).
///
/// Every report is logged with `log::error!`. An optional hook lets the
/// embedding surface show its own notification.
#[derive(Clone, Default)]
pub struct ErrorReporter {
    hook: Option<ErrorHook>,
}

impl ErrorReporter {
    /// Creates a reporter that only logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook called after logging.
    pub fn with_hook(mut self, hook: impl Fn(&dyn std::error::Error) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Logs the error with context and forwards it to the hook.
    pub fn report(&self, context: &str, error: &dyn std::error::Error) {
        log::error!("{}: {}", context, error);
        if let Some(hook) = &self.hook {
            hook(error);
        }
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
