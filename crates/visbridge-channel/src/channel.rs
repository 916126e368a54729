//! Typed publish/subscribe on top of a window.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace};
use visbridge_message::{matches_value, Envelope, Kind, Payload, Settings};

use crate::subscription::Subscription;
use crate::window::Window;

/// Channel behavior.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Post `<Kind>Ready` when subscribing to a kind. Hosts turn this off.
    pub announce_readiness: bool,
    /// Name used in log output.
    pub label: Option<String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            announce_readiness: true,
            label: None,
        }
    }
}

impl ChannelConfig {
    /// Host-side defaults: subscribing does not announce readiness.
    pub fn host() -> Self {
        Self {
            announce_readiness: false,
            label: Some("host".to_string()),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Typed publish/subscribe over a [`Window`].
///
/// Cloning is cheap; clones share the window.
#[derive(Clone)]
pub struct Channel {
    window: Rc<dyn Window>,
    config: ChannelConfig,
}

impl Channel {
    pub fn new(window: Rc<dyn Window>) -> Self {
        Self::with_config(window, ChannelConfig::default())
    }

    pub fn with_config(window: Rc<dyn Window>, config: ChannelConfig) -> Self {
        Self { window, config }
    }

    /// A clone of this channel that does not announce readiness.
    pub fn quiet(&self) -> Self {
        let mut quiet = self.clone();
        quiet.config.announce_readiness = false;
        quiet
    }

    pub fn window(&self) -> &Rc<dyn Window> {
        &self.window
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Invoke `callback` with every payload of type `P`, in delivery order.
    ///
    /// Announces `<P::KIND>Ready` before returning unless readiness
    /// announcements are turned off. Envelopes of `P::KIND` whose data does
    /// not have the shape of `P` are skipped; use
    /// [`subscribe_kind`](Self::subscribe_kind) to see those too.
    pub fn subscribe<P, F>(&self, mut callback: F) -> Subscription
    where
        P: Payload + 'static,
        F: FnMut(P) + 'static,
    {
        self.subscribe_kind(P::KIND, move |envelope| match P::narrow(envelope) {
            Some(payload) => callback(payload),
            None => debug!(kind = %P::KIND, "payload does not have the typed shape; skipped"),
        })
    }

    /// Invoke `callback` with every envelope of `kind`, typed or
    /// [unshaped](Envelope::Unshaped).
    pub fn subscribe_kind<F>(&self, kind: Kind, callback: F) -> Subscription
    where
        F: FnMut(Envelope) + 'static,
    {
        let subscription = self.bind(kind.as_str().to_string(), callback);
        if self.config.announce_readiness {
            self.announce_ready(kind);
        }
        subscription
    }

    /// Subscribe by discriminant string.
    ///
    /// A payload discriminant behaves like [`subscribe_kind`](Self::subscribe_kind).
    /// A readiness discriminant (`SchemaReady`) observes that announcement
    /// without announcing anything. Any other string yields a subscription
    /// that never fires.
    pub fn subscribe_raw<F>(&self, discriminant: &str, callback: F) -> Subscription
    where
        F: FnMut(Envelope) + 'static,
    {
        if let Some(kind) = Kind::parse(discriminant) {
            return self.subscribe_kind(kind, callback);
        }
        if Kind::parse_ready(discriminant).is_none() {
            debug!(discriminant, "subscribing to unknown discriminant; it will never fire");
        }
        self.bind(discriminant.to_string(), callback)
    }

    /// Observe `<Kind>Ready` announcements from the peer.
    pub fn on_ready<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(Kind) + 'static,
    {
        let active = Rc::new(Cell::new(true));
        let listening = Rc::clone(&active);
        let id = self.window.add_message_listener(Box::new(move |message: &Value| {
            if !listening.get() {
                return;
            }
            if let Some(Envelope::Ready(kind)) = Envelope::from_value(message) {
                callback(kind);
            }
        }));
        Subscription::new(Rc::clone(&self.window), id, "<Kind>Ready".to_string(), active)
    }

    /// Post `envelope` to the peer. Fire-and-forget.
    pub fn send(&self, envelope: &Envelope) {
        match envelope.to_value() {
            Ok(message) => {
                trace!(
                    channel = self.label(),
                    discriminant = %envelope.discriminant(),
                    "posting envelope"
                );
                self.window.post_message(&message);
            }
            Err(err) => {
                debug!(discriminant = %envelope.discriminant(), error = %err, "envelope not encodable");
            }
        }
    }

    /// Send a settings object, full or partial. Nothing is merged here.
    pub fn send_settings(&self, settings: Settings) {
        self.send(&Envelope::Settings(settings));
    }

    /// Ask the peer to resend its settings.
    pub fn request_settings(&self) {
        self.send(&Envelope::SettingsRequest);
    }

    /// Post `<kind>Ready`.
    pub fn announce_ready(&self, kind: Kind) {
        self.send(&Envelope::Ready(kind));
    }

    pub(crate) fn downgrade(&self) -> WeakChannel {
        WeakChannel {
            window: Rc::downgrade(&self.window),
            config: self.config.clone(),
        }
    }

    fn label(&self) -> &str {
        self.config.label.as_deref().unwrap_or("channel")
    }

    /// Attach one listener that decodes, filters on `discriminant`, and
    /// forwards matching envelopes while the subscription is active.
    fn bind<F>(&self, discriminant: String, mut callback: F) -> Subscription
    where
        F: FnMut(Envelope) + 'static,
    {
        let active = Rc::new(Cell::new(true));
        let listening = Rc::clone(&active);
        let filter = discriminant.clone();
        let id = self.window.add_message_listener(Box::new(move |message: &Value| {
            if !listening.get() || !matches_value(message, &filter) {
                return;
            }
            match Envelope::from_value(message) {
                Some(envelope) => callback(envelope),
                None => trace!(discriminant = %filter, "no envelope for discriminant"),
            }
        }));
        debug!(channel = self.label(), %discriminant, listener = id, "subscribed");
        Subscription::new(Rc::clone(&self.window), id, discriminant, active)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A channel handle that does not keep the window alive.
///
/// Callbacks stored in a window's listener table hold this instead of a
/// [`Channel`] so that the window and its listeners do not form a cycle.
#[derive(Clone)]
pub(crate) struct WeakChannel {
    window: Weak<dyn Window>,
    config: ChannelConfig,
}

impl WeakChannel {
    pub(crate) fn upgrade(&self) -> Option<Channel> {
        self.window.upgrade().map(|window| Channel {
            window,
            config: self.config.clone(),
        })
    }
}
