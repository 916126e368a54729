//! JSON Schema validation of visbridge payloads.
//!
//! The message protocol never checks payload shapes beyond decoding. Hosts
//! that want stronger contracts (for example on the settings a plugin sends
//! back) register one schema per [`Kind`](visbridge_message::Kind) and
//! validate payloads explicitly.

pub mod config;
pub mod error;
mod loader;
pub mod registry;
mod validator;

pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use registry::{SchemaRegistry, SCHEMA_FILE_SUFFIX};
