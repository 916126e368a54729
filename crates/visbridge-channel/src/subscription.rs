//! Handles that tie a callback to a window listener.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::window::{ListenerId, Window};

/// Lifecycle of a subscription. `Unbound` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Bound,
    Unbound,
}

/// A live binding of one callback to one window listener.
///
/// Dropping a `Subscription` leaves the listener attached; release it with
/// [`unsubscribe`](Self::unsubscribe) or hand it to a
/// [`SubscriptionGuard`] via [`into_guard`](Self::into_guard).
#[must_use = "the listener stays attached until `unsubscribe` is called"]
pub struct Subscription {
    window: Rc<dyn Window>,
    id: ListenerId,
    discriminant: String,
    active: Rc<Cell<bool>>,
}

impl Subscription {
    pub(crate) fn new(
        window: Rc<dyn Window>,
        id: ListenerId,
        discriminant: String,
        active: Rc<Cell<bool>>,
    ) -> Self {
        Self {
            window,
            id,
            discriminant,
            active,
        }
    }

    /// Detach the listener. Only the first call has an effect; it returns
    /// true.
    ///
    /// No callback runs after this returns, including for messages the window
    /// has already queued.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.replace(false) {
            return false;
        }
        let removed = self.window.remove_message_listener(self.id);
        debug!(discriminant = %self.discriminant, listener = self.id, removed, "unsubscribed");
        true
    }

    pub fn state(&self) -> SubscriptionState {
        if self.active.get() {
            SubscriptionState::Bound
        } else {
            SubscriptionState::Unbound
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// The discriminant this subscription filters on.
    pub fn discriminant(&self) -> &str {
        &self.discriminant
    }

    pub fn listener_id(&self) -> ListenerId {
        self.id
    }

    /// Release automatically when the returned guard is dropped.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("discriminant", &self.discriminant)
            .field("listener", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Unsubscribes on drop.
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    pub fn subscription(&self) -> &Subscription {
        &self.0
    }

    pub fn unsubscribe(&self) -> bool {
        self.0.unsubscribe()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}
