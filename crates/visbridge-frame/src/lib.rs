//! Length-prefixed framing for visbridge envelopes.
//!
//! A browser frame gets whole messages from `postMessage`; a byte stream does
//! not. Each serialized envelope is therefore wrapped as:
//! - a 2-byte magic number ("VB") for stream synchronization
//! - a 4-byte little-endian payload length
//! - the payload (one UTF-8 JSON envelope)

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, DEFAULT_WRITE_TIMEOUT,
    HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
