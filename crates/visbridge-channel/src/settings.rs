//! Plugin-side settings state.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;
use visbridge_message::{MergePolicy, Settings, SettingsRequest};

use crate::channel::Channel;
use crate::mirror::{notify, UpdateCallbacks};
use crate::subscription::Subscription;

/// How a [`SettingsHook`] behaves.
#[derive(Debug, Clone)]
pub struct SettingsHookConfig {
    /// Send the default value to the host once at mount.
    pub push_defaults_on_mount: bool,
    /// How inbound `Settings` envelopes are applied to the observed value.
    pub mirror_policy: MergePolicy,
}

impl Default for SettingsHookConfig {
    fn default() -> Self {
        Self {
            push_defaults_on_mount: false,
            mirror_policy: MergePolicy::Replace,
        }
    }
}

/// A plugin's view of its own settings.
///
/// Mounting subscribes to `Settings` and `SettingsRequest` (announcing both).
/// Inbound settings overwrite the observed value; each `SettingsRequest` is
/// answered with the last-known value. [`update`](Self::update) only sends:
/// the observed value changes when the host echoes settings back.
/// [`on_update`](Self::on_update) callbacks run after each inbound value is
/// applied.
pub struct SettingsHook {
    channel: Channel,
    value: Rc<RefCell<Settings>>,
    on_update: UpdateCallbacks<Settings>,
    settings_subscription: Subscription,
    request_subscription: Subscription,
}

impl SettingsHook {
    pub fn mount(channel: &Channel, default: Settings) -> Self {
        Self::mount_with_config(channel, default, SettingsHookConfig::default())
    }

    pub fn mount_with_config(
        channel: &Channel,
        default: Settings,
        config: SettingsHookConfig,
    ) -> Self {
        let value = Rc::new(RefCell::new(default));
        let on_update: UpdateCallbacks<Settings> = Rc::default();

        let observed = Rc::clone(&value);
        let listeners = Rc::clone(&on_update);
        let policy = config.mirror_policy;
        let settings_subscription = channel.subscribe::<Settings, _>(move |incoming| {
            let applied = {
                let mut value = observed.borrow_mut();
                value.merge(incoming, policy);
                value.clone()
            };
            notify(&listeners, &applied);
        });

        let last_known = Rc::clone(&value);
        let responder = channel.downgrade();
        let request_subscription = channel.subscribe::<SettingsRequest, _>(move |_| {
            let Some(channel) = responder.upgrade() else {
                return;
            };
            let current = last_known.borrow().clone();
            debug!(keys = current.len(), "answering settings request");
            channel.send_settings(current);
        });

        if config.push_defaults_on_mount {
            channel.send_settings(value.borrow().clone());
        }

        Self {
            channel: channel.clone(),
            value,
            on_update,
            settings_subscription,
            request_subscription,
        }
    }

    /// The observed settings.
    pub fn value(&self) -> Settings {
        self.value.borrow().clone()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.value.borrow().get(key).cloned()
    }

    /// Run `callback` with the observed value after each inbound `Settings`
    /// has been applied.
    pub fn on_update(&self, callback: impl FnMut(&Settings) + 'static) {
        self.on_update.borrow_mut().push(Box::new(callback));
    }

    /// Send a partial update to the host.
    pub fn update(&self, partial: Settings) {
        self.channel.send_settings(partial);
    }

    /// Release both subscriptions. Idempotent.
    pub fn unmount(&self) {
        self.settings_subscription.unsubscribe();
        self.request_subscription.unsubscribe();
    }

    pub fn is_mounted(&self) -> bool {
        self.settings_subscription.is_active()
    }
}

impl Drop for SettingsHook {
    fn drop(&mut self) {
        self.unmount();
    }
}
