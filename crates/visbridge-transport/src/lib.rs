//! Byte-stream transport between a visualization host and a plugin process.
//!
//! The host owns a Unix domain socket ([`HostSocket`]); each plugin process
//! connects to it and both sides talk over an [`IpcStream`]. Message framing
//! and envelope semantics live in the crates layered on top of this one.

pub mod error;

#[cfg(unix)]
pub mod socket;
#[cfg(unix)]
pub mod stream;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use socket::HostSocket;
#[cfg(unix)]
pub use stream::{IpcStream, PeerCredentials};
