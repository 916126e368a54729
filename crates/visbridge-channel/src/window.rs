//! The message endpoint a channel is bound to.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

/// Handle returned by [`Window::add_message_listener`].
pub type ListenerId = u64;

/// A raw message listener.
pub type Listener = Box<dyn FnMut(&Value)>;

/// A message endpoint: listeners for inbound messages and a designated peer
/// to post to.
///
/// Implementations deliver inbound messages to every attached listener in
/// attachment order, one message at a time. Posting never blocks and never
/// reports failure.
pub trait Window {
    fn add_message_listener(&self, listener: Listener) -> ListenerId;

    /// Detach a listener. Returns false if `id` was not attached.
    fn remove_message_listener(&self, id: ListenerId) -> bool;

    /// Post to the peer. Without a reachable peer this does nothing.
    fn post_message(&self, message: &Value);
}

/// Listener bookkeeping shared by the window implementations.
#[derive(Default)]
pub struct ListenerTable {
    next_id: Cell<ListenerId>,
    entries: RefCell<Vec<(ListenerId, Rc<RefCell<Listener>>)>>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Listener) -> ListenerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.entries
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(entry_id, _)| *entry_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Deliver `message` to every listener, returning how many ran.
    ///
    /// Listeners may add or remove listeners while running. A listener
    /// removed earlier in the same turn is skipped; one added during the turn
    /// first sees the next message.
    pub fn dispatch(&self, message: &Value) -> usize {
        let snapshot: Vec<(ListenerId, Rc<RefCell<Listener>>)> = self.entries.borrow().clone();

        let mut delivered = 0;
        for (id, listener) in snapshot {
            if !self.contains(id) {
                continue;
            }
            let Ok(mut listener) = listener.try_borrow_mut() else {
                trace!(id, "listener is already running; skipping nested delivery");
                continue;
            };
            (*listener)(message);
            delivered += 1;
        }
        delivered
    }
}
