/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header does not start with the "VB" magic.
    #[error("invalid frame magic (expected 0x5642 \"VB\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Reading or writing the underlying stream failed.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write timed out or would block with the frame partly written.
    ///
    /// The stream is left mid-frame and cannot carry further frames.
    #[error("write stalled after {written} of {total} bytes")]
    WriteStalled { written: usize, total: usize },

    /// The stream ended before a complete frame arrived.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
