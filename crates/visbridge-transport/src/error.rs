use std::path::PathBuf;

/// Errors raised while opening or using a host/plugin socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The host could not bind its socket path.
    #[error("failed to bind {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The plugin could not reach the host socket.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Accepting a plugin connection failed.
    #[error("failed to accept plugin connection: {0}")]
    Accept(std::io::Error),

    /// I/O on an established stream failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path does not fit in `sockaddr_un`.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;
