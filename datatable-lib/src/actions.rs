//! Row and bulk actions.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use serde::Serialize;

/// Visual emphasis of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionVariant {
    #[default]
    Default,
    Danger,
    Warning,
}

/// Async handler for one row.
pub type RowHandler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// Async handler for the selected rows.
pub type BulkHandler<T> = Arc<dyn Fn(Vec<T>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Predicate over one row.
pub type RowPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Predicate over the selected rows.
pub type RowsPredicate<T> = Arc<dyn Fn(&[T]) -> bool + Send + Sync>;

/// An action shown in a row's menu.
///
/// # Example
///
/// ```ignore
/// let archive = RowAction::new("archive", "Archive", |user: User| async move {
///     api.archive(user.id).await;
/// })
/// .variant(ActionVariant::Warning)
/// .visible_when(|user| !user.archived);
/// ```
pub struct RowAction<T> {
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
    pub variant: ActionVariant,
    handler: RowHandler<T>,
    visible: Option<RowPredicate<T>>,
    disabled: Option<RowPredicate<T>>,
}

impl<T: Send + 'static> RowAction<T> {
    /// Creates an action. The handler owns its error reporting.
    pub fn new<F, Fut>(id: impl Into<String>, label: impl Into<String>, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            variant: ActionVariant::Default,
            handler: Arc::new(move |row| handler(row).boxed()),
            visible: None,
            disabled: None,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn variant(mut self, variant: ActionVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Shows the action only for rows matching `predicate`.
    pub fn visible_when(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.visible = Some(Arc::new(predicate));
        self
    }

    /// Disables the action for rows matching `predicate`.
    pub fn disabled_when(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.disabled = Some(Arc::new(predicate));
        self
    }

    pub fn is_visible(&self, row: &T) -> bool {
        self.visible.as_ref().is_none_or(|f| f(row))
    }

    pub fn is_disabled(&self, row: &T) -> bool {
        self.disabled.as_ref().is_some_and(|f| f(row))
    }

    /// Runs the handler to completion.
    pub async fn run(&self, row: T) {
        log::debug!("Running row action '{}'", self.id);
        (self.handler)(row).await;
    }
}

impl<T> fmt::Debug for RowAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("variant", &self.variant)
            .finish_non_exhaustive()
    }
}

/// Text of a bulk action's confirmation prompt.
pub enum ConfirmationMessage<T> {
    Text(String),
    Dynamic(Arc<dyn Fn(&[T]) -> String + Send + Sync>),
}

/// Prompt used when a confirming action has no message of its own.
pub fn default_confirmation(count: usize) -> String {
    format!("Are you sure you want to perform this action on {} item(s)?", count)
}

/// An action applied to every selected row.
pub struct BulkAction<T> {
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
    pub variant: ActionVariant,
    pub requires_confirmation: bool,
    confirmation_message: Option<ConfirmationMessage<T>>,
    handler: BulkHandler<T>,
    visible: Option<RowsPredicate<T>>,
    disabled: Option<RowsPredicate<T>>,
}

impl<T: Send + 'static> BulkAction<T> {
    pub fn new<F, Fut>(id: impl Into<String>, label: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            variant: ActionVariant::Default,
            requires_confirmation: false,
            confirmation_message: None,
            handler: Arc::new(move |rows| handler(rows).boxed()),
            visible: None,
            disabled: None,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn variant(mut self, variant: ActionVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Asks for confirmation before running.
    pub fn confirm(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    /// Asks for confirmation with a fixed message.
    pub fn confirm_with(mut self, message: impl Into<String>) -> Self {
        self.requires_confirmation = true;
        self.confirmation_message = Some(ConfirmationMessage::Text(message.into()));
        self
    }

    /// Asks for confirmation with a message built from the selected rows.
    pub fn confirm_with_fn(mut self, message: impl Fn(&[T]) -> String + Send + Sync + 'static) -> Self {
        self.requires_confirmation = true;
        self.confirmation_message = Some(ConfirmationMessage::Dynamic(Arc::new(message)));
        self
    }

    pub fn visible_when(mut self, predicate: impl Fn(&[T]) -> bool + Send + Sync + 'static) -> Self {
        self.visible = Some(Arc::new(predicate));
        self
    }

    pub fn disabled_when(mut self, predicate: impl Fn(&[T]) -> bool + Send + Sync + 'static) -> Self {
        self.disabled = Some(Arc::new(predicate));
        self
    }

    pub fn is_visible(&self, rows: &[T]) -> bool {
        self.visible.as_ref().is_none_or(|f| f(rows))
    }

    pub fn is_disabled(&self, rows: &[T]) -> bool {
        self.disabled.as_ref().is_some_and(|f| f(rows))
    }

    /// Confirmation prompt for `rows`.
    pub fn confirmation_text(&self, rows: &[T]) -> String {
        match &self.confirmation_message {
            Some(ConfirmationMessage::Text(text)) => text.clone(),
            Some(ConfirmationMessage::Dynamic(f)) => f(rows),
            None => default_confirmation(rows.len()),
        }
    }

    /// Runs the handler to completion.
    pub async fn run(&self, rows: Vec<T>) {
        log::debug!("Running bulk action '{}' on {} rows", self.id, rows.len());
        (self.handler)(rows).await;
    }
}

impl<T> fmt::Debug for BulkAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("requires_confirmation", &self.requires_confirmation)
            .finish_non_exhaustive()
    }
}

/// State of the bulk action panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BulkPanel {
    #[default]
    Closed,
    Open,
    /// Waiting for the user to confirm an action.
    Confirming { action_id: String, message: String },
}

/// Result of triggering a bulk action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkTrigger {
    /// The action ran and the panel closed.
    Ran,
    /// The action waits for confirmation with this prompt.
    NeedsConfirmation(String),
    /// The action is disabled for the current selection.
    Disabled,
}
