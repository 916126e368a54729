/// Errors from the stream plumbing and host-side helpers.
///
/// The publish/subscribe surface itself never fails: sends without a peer
/// and undecodable messages are dropped.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("transport error: {0}")]
    Transport(#[from] visbridge_transport::TransportError),

    #[error("frame error: {0}")]
    Frame(#[from] visbridge_frame::FrameError),

    /// The peer closed the stream.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A settings update was rejected by the registered schema.
    #[cfg(feature = "schema")]
    #[error("settings rejected: {0}")]
    Schema(#[from] visbridge_schema::SchemaError),
}

impl ChannelError {
    /// True when a read timed out with no complete frame.
    pub fn is_timeout(&self) -> bool {
        match self {
            ChannelError::Frame(visbridge_frame::FrameError::Io(err)) => matches!(
                err.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
