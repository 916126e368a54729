use std::path::Path;

use tracing::{debug, info};
use visbridge_frame::FrameConfig;
use visbridge_transport::HostSocket;

use crate::error::Result;
use crate::stream::SocketWindow;

/// The host end of a socket: each accepted plugin becomes a window.
pub struct HostListener {
    socket: HostSocket,
    frame_config: FrameConfig,
}

impl HostListener {
    /// Bind to a Unix domain socket path.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let socket = HostSocket::bind(path)?;
        info!(path = %socket.path().display(), "host socket bound");
        Ok(Self {
            socket,
            frame_config: FrameConfig::default(),
        })
    }

    /// Override frame limits and timeouts for accepted windows.
    pub fn with_frame_config(mut self, config: FrameConfig) -> Self {
        self.frame_config = config;
        self
    }

    /// Block until the next plugin connects.
    pub fn accept(&self) -> Result<SocketWindow> {
        let stream = self.socket.accept()?;
        match stream.peer_credentials() {
            Some(creds) => debug!(pid = creds.pid, uid = creds.uid, "plugin connected"),
            None => debug!("plugin connected; credentials unavailable"),
        }
        SocketWindow::from_ipc(stream, self.frame_config.clone())
    }

    pub fn path(&self) -> &Path {
        self.socket.path()
    }
}
