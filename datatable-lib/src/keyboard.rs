//! Keyboard navigation over the rendered rows.
//!
//! Key events come from a host-owned [`KeyEvents`] hub. A table subscribes
//! while mounted and the subscription unregisters itself when dropped, so no
//! listener outlives the table.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc;

/// Keys the table reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavKey {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Focus moved to this row index.
    Focused(usize),
    /// Enter on the focused row at this index.
    Activate(usize),
    /// Focus was cleared.
    Cleared,
    /// Nothing happened.
    Ignored,
}

/// Focused-row index over the rendered rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardNav {
    focused: Option<usize>,
}

impl KeyboardNav {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Applies a key press against `row_count` rendered rows.
    ///
    /// Arrows clamp to `[0, row_count - 1]` and start at 0 when nothing is
    /// focused. Enter on an out-of-range index is ignored.
    pub fn handle(&mut self, key: NavKey, row_count: usize) -> NavOutcome {
        match key {
            NavKey::ArrowDown | NavKey::ArrowUp if row_count == 0 => NavOutcome::Ignored,
            NavKey::ArrowDown => {
                let next = self.focused.map(|i| (i + 1).min(row_count - 1)).unwrap_or(0);
                self.focused = Some(next);
                NavOutcome::Focused(next)
            }
            NavKey::ArrowUp => {
                let next = self.focused.map(|i| i.saturating_sub(1).min(row_count - 1)).unwrap_or(0);
                self.focused = Some(next);
                NavOutcome::Focused(next)
            }
            NavKey::Enter => match self.focused {
                Some(index) if index < row_count => NavOutcome::Activate(index),
                _ => NavOutcome::Ignored,
            },
            NavKey::Escape => {
                self.focused = None;
                NavOutcome::Cleared
            }
        }
    }

    /// Clamps focus after the rendered rows changed.
    pub fn reconcile(&mut self, row_count: usize) {
        if let Some(index) = self.focused
            && index >= row_count
        {
            self.focused = row_count.checked_sub(1);
        }
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }
}

// =============================================================================
// Event hub
// =============================================================================

#[derive(Default)]
struct Hub {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::UnboundedSender<NavKey>>,
}

/// Host-owned source of key events.
///
/// Cloning shares the same hub.
#[derive(Clone, Default)]
pub struct KeyEvents {
    hub: Arc<Mutex<Hub>>,
}

impl KeyEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. It stays registered until the subscription drops.
    pub fn subscribe(&self) -> KeyboardSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut id = 0;
        if let Ok(mut hub) = self.hub.lock() {
            id = hub.next_id;
            hub.next_id += 1;
            hub.subscribers.insert(id, tx);
        }
        log::trace!("Keyboard subscriber {} registered", id);
        KeyboardSubscription {
            id,
            rx,
            hub: Arc::downgrade(&self.hub),
        }
    }

    /// Sends a key to every listener. Returns how many received it.
    pub fn dispatch(&self, key: NavKey) -> usize {
        let Ok(mut hub) = self.hub.lock() else {
            return 0;
        };
        hub.subscribers.retain(|_, tx| tx.send(key).is_ok());
        hub.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.lock().map(|hub| hub.subscribers.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for KeyEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEvents")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// A registered key listener. Unregisters on drop.
#[derive(Debug)]
pub struct KeyboardSubscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<NavKey>,
    hub: Weak<Mutex<Hub>>,
}

impl KeyboardSubscription {
    /// Returns the next queued key without waiting.
    pub fn try_next(&mut self) -> Option<NavKey> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next key. `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<NavKey> {
        self.rx.recv().await
    }
}

impl Drop for KeyboardSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade()
            && let Ok(mut hub) = hub.lock()
        {
            hub.subscribers.remove(&self.id);
            log::trace!("Keyboard subscriber {} released", self.id);
        }
    }
}
