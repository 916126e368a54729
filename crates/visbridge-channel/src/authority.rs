//! Host-side authoritative settings.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};
use visbridge_message::{Kind, MergePolicy, Settings};

use crate::channel::Channel;
use crate::error::Result;
use crate::subscription::Subscription;

#[cfg(feature = "schema")]
pub type SchemaRegistryHandle = std::sync::Arc<visbridge_schema::SchemaRegistry>;

type ChangeCallback = Box<dyn FnMut(&Settings)>;

/// How a [`SettingsAuthority`] applies updates.
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    /// How inbound partial updates combine with the held value.
    pub policy: MergePolicy,
    /// Send the merged value back to the plugin after every accepted update.
    pub echo: bool,
    /// Send `SettingsRequest` when the plugin announces `SettingsRequestReady`.
    pub request_on_ready: bool,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            policy: MergePolicy::Merge,
            echo: true,
            request_on_ready: true,
        }
    }
}

struct AuthorityState {
    current: Settings,
    config: AuthorityConfig,
    revision: u64,
    rejected: u64,
    on_change: Vec<ChangeCallback>,
    #[cfg(feature = "schema")]
    registry: Option<SchemaRegistryHandle>,
}

/// The host's copy of a plugin's settings.
///
/// Inbound `Settings` envelopes are applied with the configured
/// [`MergePolicy`]. With a schema registry attached, an update whose merged
/// result fails validation is rejected and the held value is left unchanged.
pub struct SettingsAuthority {
    channel: Channel,
    state: Rc<RefCell<AuthorityState>>,
    subscriptions: Vec<Subscription>,
}

impl SettingsAuthority {
    pub fn attach(channel: &Channel, initial: Settings) -> Self {
        Self::attach_with_config(channel, initial, AuthorityConfig::default())
    }

    pub fn attach_with_config(
        channel: &Channel,
        initial: Settings,
        config: AuthorityConfig,
    ) -> Self {
        let channel = channel.quiet();
        let state = Rc::new(RefCell::new(AuthorityState {
            current: initial,
            config,
            revision: 0,
            rejected: 0,
            on_change: Vec::new(),
            #[cfg(feature = "schema")]
            registry: None,
        }));

        let inbound_state = Rc::clone(&state);
        let inbound_channel = channel.downgrade();
        let updates = channel.subscribe::<Settings, _>(move |patch| {
            let Some(channel) = inbound_channel.upgrade() else {
                return;
            };
            if let Err(err) = apply(&inbound_state, &channel, patch) {
                warn!(error = %err, "settings update rejected");
            }
        });

        let ready_state = Rc::clone(&state);
        let ready_channel = channel.downgrade();
        let readiness = channel.on_ready(move |kind| {
            if kind != Kind::SettingsRequest || !ready_state.borrow().config.request_on_ready {
                return;
            }
            if let Some(channel) = ready_channel.upgrade() {
                debug!("plugin can answer settings requests; asking for its settings");
                channel.request_settings();
            }
        });

        Self {
            channel,
            state,
            subscriptions: vec![updates, readiness],
        }
    }

    /// Validate merged results against the `Settings` schema in `registry`.
    #[cfg(feature = "schema")]
    pub fn with_registry(self, registry: SchemaRegistryHandle) -> Self {
        self.state.borrow_mut().registry = Some(registry);
        self
    }

    /// Apply an update originating on the host side.
    pub fn apply(&self, patch: Settings) -> Result<Settings> {
        apply(&self.state, &self.channel, patch)
    }

    /// Ask the plugin to resend its settings.
    pub fn request_resend(&self) {
        self.channel.request_settings();
    }

    /// Push the held value to the plugin.
    pub fn push(&self) {
        let current = self.current();
        self.channel.send_settings(current);
    }

    pub fn current(&self) -> Settings {
        self.state.borrow().current.clone()
    }

    /// Accepted updates so far.
    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    /// Rejected updates so far.
    pub fn rejected(&self) -> u64 {
        self.state.borrow().rejected
    }

    /// Run `callback` with the merged value after every accepted update.
    pub fn on_change(&self, callback: impl FnMut(&Settings) + 'static) {
        self.state.borrow_mut().on_change.push(Box::new(callback));
    }

    /// Stop listening to the plugin. Idempotent.
    pub fn detach(&self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscriptions.iter().any(Subscription::is_active)
    }
}

impl Drop for SettingsAuthority {
    fn drop(&mut self) {
        self.detach();
    }
}

fn apply(
    state: &Rc<RefCell<AuthorityState>>,
    channel: &Channel,
    patch: Settings,
) -> Result<Settings> {
    let (merged, echo) = {
        let mut state = state.borrow_mut();
        let candidate = state.current.merged(patch, state.config.policy);

        #[cfg(feature = "schema")]
        {
            let registry = state.registry.clone();
            if let Some(registry) = registry {
                if let Err(err) = registry.validate(Kind::Settings, &candidate.to_value()) {
                    state.rejected += 1;
                    return Err(err.into());
                }
            }
        }

        state.current = candidate.clone();
        state.revision += 1;
        debug!(revision = state.revision, keys = candidate.len(), "settings updated");
        (candidate, state.config.echo)
    };

    // Callbacks run without the state borrowed so they may read the authority.
    let mut callbacks = std::mem::take(&mut state.borrow_mut().on_change);
    for callback in &mut callbacks {
        callback(&merged);
    }
    let mut state_ref = state.borrow_mut();
    callbacks.append(&mut state_ref.on_change);
    state_ref.on_change = callbacks;
    drop(state_ref);

    if echo {
        channel.send_settings(merged.clone());
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::local::LocalWindow;

    fn host_side() -> (SettingsAuthority, Rc<LocalWindow>, Rc<LocalWindow>) {
        let (plugin, host) = LocalWindow::pair();
        let authority = SettingsAuthority::attach(
            &Channel::new(host.clone()),
            Settings::new().with("theme", json!("dark")).with("zoom", json!(1)),
        );
        (authority, plugin, host)
    }

    #[test]
    fn attaching_does_not_announce_readiness() {
        let (_authority, plugin, _host) = host_side();
        assert_eq!(plugin.pending(), 0);
    }

    #[test]
    fn inbound_partials_merge_and_echo() {
        let (authority, plugin, host) = host_side();

        host.dispatch(&json!({"type": "Settings", "data": {"zoom": 2}}));
        host.dispatch(&json!({"type": "Settings", "data": {"layout": "grid"}}));

        assert_eq!(
            authority.current().to_value(),
            json!({"theme": "dark", "zoom": 2, "layout": "grid"})
        );
        assert_eq!(authority.revision(), 2);
        assert_eq!(
            plugin.take_inbox().last(),
            Some(&json!({"type": "Settings", "data": {"theme": "dark", "zoom": 2, "layout": "grid"}}))
        );
    }

    #[test]
    fn replace_policy_without_echo() {
        let (plugin, host) = LocalWindow::pair();
        let config = AuthorityConfig {
            policy: MergePolicy::Replace,
            echo: false,
            ..AuthorityConfig::default()
        };
        let authority = SettingsAuthority::attach_with_config(
            &Channel::new(host.clone()),
            Settings::new().with("theme", json!("dark")),
            config,
        );

        host.dispatch(&json!({"type": "Settings", "data": {"zoom": 2}}));
        assert_eq!(authority.current().to_value(), json!({"zoom": 2}));
        assert_eq!(plugin.pending(), 0);
    }

    #[test]
    fn settings_request_ready_triggers_request() {
        let (_authority, plugin, host) = host_side();
        host.dispatch(&json!({"type": "SettingsReady"}));
        assert_eq!(plugin.pending(), 0);

        host.dispatch(&json!({"type": "SettingsRequestReady"}));
        assert_eq!(plugin.take_inbox(), vec![json!({"type": "SettingsRequest"})]);
    }

    #[test]
    fn change_callbacks_can_read_the_authority() {
        let (authority, _plugin, host) = host_side();
        let authority = Rc::new(authority);
        let seen = Rc::new(Cell::new(0));

        let reader = Rc::downgrade(&authority);
        let counter = Rc::clone(&seen);
        authority.on_change(move |merged| {
            let authority = reader.upgrade().unwrap();
            assert_eq!(&authority.current(), merged);
            counter.set(counter.get() + 1);
        });

        host.dispatch(&json!({"type": "Settings", "data": {"zoom": 5}}));
        authority.apply(Settings::new().with("zoom", json!(6))).unwrap();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn detach_stops_updates() {
        let (authority, _plugin, host) = host_side();
        authority.detach();
        assert!(!authority.is_attached());
        host.dispatch(&json!({"type": "Settings", "data": {"zoom": 9}}));
        assert_eq!(authority.current().get("zoom"), Some(&json!(1)));
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn end_to_end_with_plugin_hook() {
        use crate::settings::SettingsHook;

        let (plugin, host) = LocalWindow::pair();
        let authority = SettingsAuthority::attach(&Channel::new(host.clone()), Settings::new());
        let hook = SettingsHook::mount(
            &Channel::new(plugin.clone()),
            Settings::new().with("theme", json!("dark")),
        );

        // Readiness reaches the host, which asks for settings; the plugin answers.
        while host.dispatch_pending() + plugin.dispatch_pending() > 0 {}
        assert_eq!(authority.current().to_value(), json!({"theme": "dark"}));

        hook.update(Settings::new().with("zoom", json!(2)));
        while host.dispatch_pending() + plugin.dispatch_pending() > 0 {}

        assert_eq!(
            authority.current().to_value(),
            json!({"theme": "dark", "zoom": 2})
        );
        assert_eq!(hook.value(), authority.current());
    }

    #[cfg(feature = "schema")]
    #[test]
    fn schema_rejects_invalid_merge() {
        use visbridge_schema::SchemaRegistry;

        let (authority, plugin, host) = host_side();
        let registry = SchemaRegistry::from_embedded(&[(
            Kind::Settings,
            r#"{"type":"object","properties":{"zoom":{"type":"integer","minimum":1}}}"#,
        )])
        .unwrap();
        let authority = authority.with_registry(std::sync::Arc::new(registry));

        host.dispatch(&json!({"type": "Settings", "data": {"zoom": 0}}));
        assert_eq!(authority.rejected(), 1);
        assert_eq!(authority.revision(), 0);
        assert_eq!(authority.current().get("zoom"), Some(&json!(1)));
        assert_eq!(plugin.pending(), 0);

        assert!(authority.apply(Settings::new().with("zoom", json!("big"))).is_err());
        assert!(authority.apply(Settings::new().with("zoom", json!(3))).is_ok());
    }
}
