//! Typed publish/subscribe between a visualization host and its plugins.
//!
//! A [`Window`] is anything that can post JSON messages to a peer and deliver
//! the peer's messages to listeners: an in-process [`LocalWindow`] pair or a
//! framed byte stream ([`StreamWindow`]). A [`Channel`] sits on a window and
//! speaks the envelope protocol: typed subscriptions, readiness announcements
//! and settings requests.
//!
//! On top of that sit the stateful helpers: [`Mirror`] keeps the latest
//! payload of one kind, [`SettingsHook`] is a plugin's view of its settings,
//! [`SettingsAuthority`] is the host's, and [`ReadyGate`] holds host data until
//! the plugin says it is listening.
//!
//! Everything here is single-threaded. Listeners run synchronously on the
//! thread that drives the window.

pub mod authority;
pub mod channel;
#[cfg(unix)]
pub mod connector;
pub mod error;
pub mod handshake;
#[cfg(unix)]
pub mod listener;
pub mod local;
pub mod mirror;
pub mod settings;
pub mod stream;
pub mod subscription;
pub mod window;

#[cfg(feature = "schema")]
pub use authority::SchemaRegistryHandle;
pub use authority::{AuthorityConfig, SettingsAuthority};
pub use channel::{Channel, ChannelConfig};
#[cfg(unix)]
pub use connector::{connect, connect_with_config};
pub use error::{ChannelError, Result};
pub use handshake::{ReadinessTracker, ReadyGate};
#[cfg(unix)]
pub use listener::HostListener;
pub use local::LocalWindow;
pub use mirror::Mirror;
pub use settings::{SettingsHook, SettingsHookConfig};
#[cfg(unix)]
pub use stream::SocketWindow;
pub use stream::StreamWindow;
pub use subscription::{Subscription, SubscriptionGuard, SubscriptionState};
pub use window::{Listener, ListenerId, ListenerTable, Window};
