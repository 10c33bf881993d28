//! Listener registry
//!
//! Lets UI code react to audio focus changes. Listeners are notified
//! synchronously after each state-mutating call updates its fields, never after
//! the asynchronous player effects resolve.

use crate::types::AudioFocusSnapshot;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::error;

/// Listener callback
pub type ListenerFn = Arc<dyn Fn(&AudioFocusSnapshot) + Send + Sync>;

#[derive(Default)]
struct Slots {
    next_id: u64,
    listeners: BTreeMap<u64, ListenerFn>,
}

/// Set of subscribed listeners, in subscription order
#[derive(Default)]
pub(crate) struct ListenerSet {
    slots: Arc<Mutex<Slots>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: ListenerFn) -> ListenerHandle {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let id = slots.next_id;
        slots.next_id += 1;
        slots.listeners.insert(id, listener);

        ListenerHandle {
            id,
            slots: Arc::downgrade(&self.slots),
        }
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    /// Invoke every listener with `snapshot`
    ///
    /// The set is copied first so listeners may subscribe, unsubscribe or call
    /// back into the coordinator. A panicking listener is logged and skipped.
    pub fn notify(&self, snapshot: &AudioFocusSnapshot) {
        let listeners: Vec<ListenerFn> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            invoke(&listener, snapshot);
        }
    }
}

pub(crate) fn invoke(listener: &ListenerFn, snapshot: &AudioFocusSnapshot) {
    if panic::catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
        error!("Audio focus listener panicked; continuing with remaining listeners");
    }
}

/// Subscription returned by `add_listener`
///
/// Dropping the handle keeps the listener subscribed; call
/// [`ListenerHandle::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct ListenerHandle {
    id: u64,
    slots: Weak<Mutex<Slots>>,
}

impl ListenerHandle {
    /// Remove the listener. Safe to call after the coordinator is gone.
    pub fn unsubscribe(&self) {
        if let Some(slots) = self.slots.upgrade() {
            slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&self.id);
        }
    }
}
