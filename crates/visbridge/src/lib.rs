//! Typed messaging between a visualization host and its plugins.
//!
//! A plugin runs in a sandboxed frame (or, here, a separate process) and
//! exchanges tagged JSON envelopes with its host: graph data, ML results and
//! the schema flow down, settings flow both ways, and `<Kind>Ready` signals
//! tell the host a plugin is listening.
//!
//! # Crate Structure
//!
//! - [`message`]: envelope kinds, payload types and settings merging
//! - [`channel`]: windows, typed subscriptions, settings hook and authority
//! - [`frame`]: length-prefixed framing for byte-stream windows
//! - [`transport`]: the Unix domain socket between host and plugin
//! - [`schema`]: optional JSON Schema validation (behind `schema` feature)

/// Re-export transport types.
pub mod transport {
    pub use visbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use visbridge_frame::*;
}

/// Re-export message types.
pub mod message {
    pub use visbridge_message::*;
}

/// Re-export channel types.
pub mod channel {
    pub use visbridge_channel::*;
}

/// Re-export schema types (requires `schema` feature).
#[cfg(feature = "schema")]
pub mod schema {
    pub use visbridge_schema::*;
}

pub use visbridge_channel::{Channel, Mirror, SettingsAuthority, SettingsHook, Subscription};
pub use visbridge_message::{Envelope, Kind, Settings};
