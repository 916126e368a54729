//! Last-value views over one payload kind.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use visbridge_message::Payload;

use crate::channel::Channel;
use crate::subscription::SubscriptionGuard;

/// Callbacks run after a new value has been stored.
pub(crate) type UpdateCallbacks<T> = Rc<RefCell<Vec<Box<dyn FnMut(&T)>>>>;

/// Run every callback in `callbacks` with `value`.
///
/// The list is taken out while the callbacks run, so a callback may register
/// another one; those are kept for the next update.
pub(crate) fn notify<T>(callbacks: &UpdateCallbacks<T>, value: &T) {
    let mut running = std::mem::take(&mut *callbacks.borrow_mut());
    for callback in &mut running {
        callback(value);
    }
    let mut registered = callbacks.borrow_mut();
    running.append(&mut registered);
    *registered = running;
}

/// The last payload received for one kind.
///
/// Each inbound payload overwrites the previous one. The mirror subscribes on
/// construction and releases its listener on drop.
pub struct Mirror<P> {
    value: Rc<RefCell<Option<P>>>,
    updates: Rc<Cell<u64>>,
    on_update: UpdateCallbacks<P>,
    subscription: SubscriptionGuard,
}

impl<P: Payload + Clone + 'static> Mirror<P> {
    /// Start empty.
    pub fn new(channel: &Channel) -> Self {
        Self::observe(channel, None)
    }

    /// Start from `default` until the first payload arrives.
    pub fn with_default(channel: &Channel, default: P) -> Self {
        Self::observe(channel, Some(default))
    }

    fn observe(channel: &Channel, initial: Option<P>) -> Self {
        let value = Rc::new(RefCell::new(initial));
        let updates = Rc::new(Cell::new(0));
        let on_update: UpdateCallbacks<P> = Rc::default();

        let slot = Rc::clone(&value);
        let counter = Rc::clone(&updates);
        let listeners = Rc::clone(&on_update);
        let subscription = channel
            .subscribe::<P, _>(move |payload| {
                *slot.borrow_mut() = Some(payload.clone());
                counter.set(counter.get() + 1);
                notify(&listeners, &payload);
            })
            .into_guard();

        Self {
            value,
            updates,
            on_update,
            subscription,
        }
    }

    /// Run `callback` with each payload after it has been stored.
    pub fn on_update(&self, callback: impl FnMut(&P) + 'static) {
        self.on_update.borrow_mut().push(Box::new(callback));
    }

    /// A copy of the current value.
    pub fn get(&self) -> Option<P> {
        self.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(Option<&P>) -> R) -> R {
        f(self.value.borrow().as_ref())
    }

    /// Payloads received so far.
    pub fn updates(&self) -> u64 {
        self.updates.get()
    }

    pub fn is_bound(&self) -> bool {
        self.subscription.subscription().is_active()
    }

    /// Stop observing. The last value stays readable.
    pub fn unsubscribe(&self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use visbridge_message::{GraphQueryResult, MLResults, SchemaGraph, Settings};

    use super::*;
    use crate::local::LocalWindow;

    #[test]
    fn graph_mirror_tracks_latest() {
        let (plugin, host) = LocalWindow::pair();
        let channel = Channel::new(plugin.clone());
        let graph = Mirror::<GraphQueryResult>::new(&channel);
        assert_eq!(host.take_inbox(), vec![json!({"type": "GraphDataReady"})]);
        assert!(graph.get().is_none());

        for id in ["a", "b"] {
            plugin.dispatch(&json!({
                "type": "GraphData",
                "data": {"nodes": [{"id": id}], "edges": [], "queryingBackend": false}
            }));
        }

        assert_eq!(graph.updates(), 2);
        assert_eq!(graph.with(|g| g.map(|g| g.nodes[0].id.clone())), Some("b".to_string()));
    }

    #[test]
    fn default_is_visible_before_first_payload() {
        let (plugin, _host) = LocalWindow::pair();
        let channel = Channel::new(plugin.clone());
        let settings = Mirror::with_default(&channel, Settings::new().with("theme", json!("dark")));

        assert_eq!(settings.get().unwrap().get("theme"), Some(&json!("dark")));

        plugin.dispatch(&json!({"type": "Settings", "data": {"theme": "light"}}));
        assert_eq!(settings.get().unwrap().to_value(), json!({"theme": "light"}));
    }

    #[test]
    fn mirrors_of_different_kinds_are_independent() {
        let (plugin, _host) = LocalWindow::pair();
        let channel = Channel::new(plugin.clone());
        let ml = Mirror::<MLResults>::new(&channel);
        let schema = Mirror::<SchemaGraph>::new(&channel);

        plugin.dispatch(&json!({"type": "MLData", "data": {"centrality": {"enabled": true, "result": {}}}}));
        assert_eq!(ml.updates(), 1);
        assert_eq!(schema.updates(), 0);
    }

    #[test]
    fn update_callback_sees_the_stored_value() {
        let (plugin, _host) = LocalWindow::pair();
        let channel = Channel::new(plugin.clone());
        let mirror = Rc::new(Mirror::<Settings>::new(&channel));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let reader = Rc::downgrade(&mirror);
        let sink = Rc::clone(&seen);
        mirror.on_update(move |settings| {
            let mirror = reader.upgrade().unwrap();
            assert_eq!(mirror.get().as_ref(), Some(settings));
            sink.borrow_mut().push(settings.to_value());
        });

        plugin.dispatch(&json!({"type": "Settings", "data": {"a": 1}}));
        plugin.dispatch(&json!({"type": "Settings", "data": {"a": 2}}));
        mirror.unsubscribe();
        plugin.dispatch(&json!({"type": "Settings", "data": {"a": 3}}));

        assert_eq!(*seen.borrow(), vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[test]
    fn drop_releases_listener_and_unsubscribe_keeps_value() {
        let (plugin, _host) = LocalWindow::pair();
        let channel = Channel::new(plugin.clone());

        let settings = Mirror::<Settings>::new(&channel);
        plugin.dispatch(&json!({"type": "Settings", "data": {"a": 1}}));
        settings.unsubscribe();
        plugin.dispatch(&json!({"type": "Settings", "data": {"a": 2}}));
        assert!(!settings.is_bound());
        assert_eq!(settings.get().unwrap().to_value(), json!({"a": 1}));

        let other = Mirror::<Settings>::new(&channel);
        assert_eq!(plugin.listener_count(), 1);
        drop(other);
        assert_eq!(plugin.listener_count(), 0);
    }
}
