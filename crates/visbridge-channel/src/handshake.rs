//! Host-side bookkeeping of the readiness handshake.
//!
//! A plugin announces `<Kind>Ready` once it has a listener for `Kind`.
//! Anything the host posts before that is lost, so the host either waits for
//! the announcement ([`ReadinessTracker`]) or stages data until it arrives
//! ([`ReadyGate`]).

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::debug;
use visbridge_message::{Envelope, Kind};

use crate::channel::Channel;
use crate::subscription::Subscription;

/// Records which kinds the peer has announced.
pub struct ReadinessTracker {
    ready: Rc<RefCell<BTreeSet<Kind>>>,
    subscription: Subscription,
}

impl ReadinessTracker {
    pub fn attach(channel: &Channel) -> Self {
        let ready = Rc::new(RefCell::new(BTreeSet::new()));
        let sink = Rc::clone(&ready);
        let subscription = channel.on_ready(move |kind| {
            sink.borrow_mut().insert(kind);
        });
        Self {
            ready,
            subscription,
        }
    }

    pub fn is_ready(&self, kind: Kind) -> bool {
        self.ready.borrow().contains(&kind)
    }

    /// Announced kinds, in wire-table order.
    pub fn ready_kinds(&self) -> Vec<Kind> {
        self.ready.borrow().iter().copied().collect()
    }

    pub fn detach(&self) {
        self.subscription.unsubscribe();
    }
}

impl Drop for ReadinessTracker {
    fn drop(&mut self) {
        self.detach();
    }
}

#[derive(Default)]
struct GateState {
    ready: BTreeSet<Kind>,
    latest: BTreeMap<Kind, Envelope>,
    delivered: u64,
}

/// Delivers the latest envelope of each kind once the peer is ready for it.
///
/// [`publish`](Self::publish) sends immediately when the kind has been
/// announced and stages the envelope otherwise. Each announcement, including a
/// repeated one after the plugin remounts, delivers the latest envelope of
/// that kind.
pub struct ReadyGate {
    channel: Channel,
    state: Rc<RefCell<GateState>>,
    subscription: Subscription,
}

impl ReadyGate {
    pub fn attach(channel: &Channel) -> Self {
        let channel = channel.quiet();
        let state = Rc::new(RefCell::new(GateState::default()));

        let gate_state = Rc::clone(&state);
        let sender = channel.downgrade();
        let subscription = channel.on_ready(move |kind| {
            let staged = {
                let mut state = gate_state.borrow_mut();
                state.ready.insert(kind);
                let staged = state.latest.get(&kind).cloned();
                if staged.is_some() {
                    state.delivered += 1;
                }
                staged
            };
            match (staged, sender.upgrade()) {
                (Some(envelope), Some(channel)) => {
                    debug!(%kind, "peer ready; delivering latest envelope");
                    channel.send(&envelope);
                }
                (None, _) => debug!(%kind, "peer ready; nothing staged"),
                (Some(_), None) => {}
            }
        });

        Self {
            channel,
            state,
            subscription,
        }
    }

    /// Send `envelope` now if its kind is ready, otherwise stage it.
    ///
    /// Returns true if the envelope was sent. Readiness signals cannot be
    /// published through a gate.
    pub fn publish(&self, envelope: Envelope) -> bool {
        let Some(kind) = envelope.kind() else {
            debug!("readiness signals are not gated; dropping");
            return false;
        };

        let send_now = {
            let mut state = self.state.borrow_mut();
            state.latest.insert(kind, envelope.clone());
            let ready = state.ready.contains(&kind);
            if ready {
                state.delivered += 1;
            }
            ready
        };

        if send_now {
            self.channel.send(&envelope);
        } else {
            debug!(%kind, "peer not ready; envelope staged");
        }
        send_now
    }

    pub fn is_ready(&self, kind: Kind) -> bool {
        self.state.borrow().ready.contains(&kind)
    }

    pub fn ready_kinds(&self) -> Vec<Kind> {
        self.state.borrow().ready.iter().copied().collect()
    }

    /// Kinds with a staged envelope the peer has not announced yet.
    pub fn staged(&self) -> Vec<Kind> {
        let state = self.state.borrow();
        state
            .latest
            .keys()
            .filter(|kind| !state.ready.contains(kind))
            .copied()
            .collect()
    }

    /// Envelopes sent through the gate so far.
    pub fn delivered(&self) -> u64 {
        self.state.borrow().delivered
    }

    pub fn detach(&self) {
        self.subscription.unsubscribe();
    }
}

impl Drop for ReadyGate {
    fn drop(&mut self) {
        self.detach();
    }
}
