//! In-process window pair.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace};

use crate::window::{Listener, ListenerId, ListenerTable, Window};

/// An in-process window.
///
/// Posting enqueues the message in the peer's inbox; nothing is delivered
/// until the peer calls [`dispatch_pending`](Self::dispatch_pending). This
/// mirrors a browser event loop, where a posted message is handled on a later
/// turn.
pub struct LocalWindow {
    name: String,
    listeners: ListenerTable,
    inbox: RefCell<VecDeque<Value>>,
    peer: RefCell<Weak<LocalWindow>>,
}

impl LocalWindow {
    /// A window with no peer. Posts from it go nowhere.
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            listeners: ListenerTable::new(),
            inbox: RefCell::new(VecDeque::new()),
            peer: RefCell::new(Weak::new()),
        })
    }

    /// A `(plugin, host)` pair, each the other's peer.
    pub fn pair() -> (Rc<Self>, Rc<Self>) {
        let plugin = Self::new("plugin");
        let host = Self::new("host");
        Self::link(&plugin, &host);
        (plugin, host)
    }

    /// Make `a` and `b` each other's peer.
    pub fn link(a: &Rc<Self>, b: &Rc<Self>) {
        *a.peer.borrow_mut() = Rc::downgrade(b);
        *b.peer.borrow_mut() = Rc::downgrade(a);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_peer(&self) -> bool {
        self.peer.borrow().strong_count() > 0
    }

    /// Deliver queued messages to the attached listeners, oldest first,
    /// including messages queued while dispatching. Returns how many messages
    /// were delivered.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(message) = next else {
                break;
            };
            self.listeners.dispatch(&message);
            delivered += 1;
        }
        delivered
    }

    /// Deliver `message` to this window's listeners immediately, as if the
    /// peer had posted it.
    pub fn dispatch(&self, message: &Value) -> usize {
        self.listeners.dispatch(message)
    }

    /// Drain the inbox without delivering anything.
    pub fn take_inbox(&self) -> Vec<Value> {
        self.inbox.borrow_mut().drain(..).collect()
    }

    /// Number of queued, undelivered messages.
    pub fn pending(&self) -> usize {
        self.inbox.borrow().len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Window for LocalWindow {
    fn add_message_listener(&self, listener: Listener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_message_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn post_message(&self, message: &Value) {
        let Some(peer) = self.peer.borrow().upgrade() else {
            debug!(window = %self.name, "no peer window; message dropped");
            return;
        };
        trace!(from = %self.name, to = %peer.name, "message queued");
        peer.inbox.borrow_mut().push_back(message.clone());
    }
}

impl std::fmt::Debug for LocalWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWindow")
            .field("name", &self.name)
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending())
            .field("has_peer", &self.has_peer())
            .finish()
    }
}
