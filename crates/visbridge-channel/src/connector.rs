use std::path::Path;

use visbridge_frame::FrameConfig;

use crate::error::Result;
use crate::stream::SocketWindow;

/// Connect a plugin process to the host socket at `path`.
pub fn connect(path: impl AsRef<Path>) -> Result<SocketWindow> {
    connect_with_config(path, FrameConfig::default())
}

/// Connect with explicit frame limits and timeouts.
pub fn connect_with_config(path: impl AsRef<Path>, config: FrameConfig) -> Result<SocketWindow> {
    let stream = visbridge_transport::HostSocket::connect(path.as_ref())?;
    tracing::debug!(path = %path.as_ref().display(), "connected to host");
    SocketWindow::from_ipc(stream, config)
}
