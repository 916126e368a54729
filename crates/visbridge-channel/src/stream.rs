//! A window over framed JSON messages on a byte stream.

use std::cell::{Cell, RefCell};
use std::io::{Read, Write};

use serde_json::Value;
use tracing::{debug, trace};
use visbridge_frame::{FrameError, FrameReader, FrameWriter};
use visbridge_message::Envelope;

use crate::error::{ChannelError, Result};
use crate::window::{Listener, ListenerId, ListenerTable, Window};

/// A window whose peer sits at the other end of a byte stream.
///
/// Inbound messages are read one frame at a time by [`pump`](Self::pump),
/// which dispatches synchronously. Posting writes one frame. A broken stream,
/// or a write that stalls past the configured write timeout because the peer
/// stopped reading, closes the window and turns later posts into no-ops.
pub struct StreamWindow<R, W> {
    reader: RefCell<FrameReader<R>>,
    writer: RefCell<FrameWriter<W>>,
    listeners: ListenerTable,
    closed: Cell<bool>,
}

impl<R: Read, W: Write> StreamWindow<R, W> {
    pub fn new(reader: FrameReader<R>, writer: FrameWriter<W>) -> Self {
        Self {
            reader: RefCell::new(reader),
            writer: RefCell::new(writer),
            listeners: ListenerTable::new(),
            closed: Cell::new(false),
        }
    }

    /// Read the next frame and deliver it to the attached listeners.
    ///
    /// Frames that are not JSON are dropped and count as handled. Returns
    /// [`ChannelError::Disconnected`] once the peer has closed the stream.
    pub fn pump(&self) -> Result<()> {
        if self.closed.get() {
            return Err(ChannelError::Disconnected("stream already closed".to_string()));
        }

        let frame = {
            let mut reader = self.reader.borrow_mut();
            match reader.read_frame() {
                Ok(frame) => frame,
                Err(FrameError::ConnectionClosed) => {
                    self.closed.set(true);
                    return Err(ChannelError::Disconnected("peer closed the stream".to_string()));
                }
                Err(err) => return Err(err.into()),
            }
        };

        let message: Value = match serde_json::from_slice(&frame.payload) {
            Ok(message) => message,
            Err(err) => {
                debug!(error = %err, size = frame.payload.len(), "dropping non-JSON frame");
                return Ok(());
            }
        };

        let delivered = self.listeners.dispatch(&message);
        trace!(delivered, "frame dispatched");
        Ok(())
    }

    /// Pump until the peer disconnects. Any other error is returned.
    pub fn pump_until_closed(&self) -> Result<()> {
        loop {
            match self.pump() {
                Ok(()) => {}
                Err(ChannelError::Disconnected(_)) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Bytes read but not yet dispatched.
    pub fn buffered(&self) -> usize {
        self.reader.borrow().buffered()
    }

    /// Write one envelope, reporting failures that `post_message` swallows.
    pub fn try_send(&self, envelope: &Envelope) -> Result<()> {
        if self.closed.get() {
            return Err(ChannelError::Disconnected("stream already closed".to_string()));
        }
        let message = envelope.to_value()?;
        self.write_message(&message).map_err(|err| {
            if is_disconnect(&err) {
                self.closed.set(true);
            }
            ChannelError::from(err)
        })
    }

    fn write_message(&self, message: &Value) -> std::result::Result<(), FrameError> {
        let payload = serde_json::to_vec(message)
            .map_err(|err| FrameError::Io(std::io::Error::other(err)))?;
        let Ok(mut writer) = self.writer.try_borrow_mut() else {
            return Err(FrameError::Io(std::io::Error::other("stream writer is busy")));
        };
        writer.send(&payload)
    }
}

#[cfg(unix)]
impl StreamWindow<visbridge_transport::IpcStream, visbridge_transport::IpcStream> {
    /// Split a socket stream into a reader and a writer and wrap both.
    pub fn from_ipc(
        stream: visbridge_transport::IpcStream,
        config: visbridge_frame::FrameConfig,
    ) -> Result<Self> {
        let read_half = stream.try_clone()?;
        let reader = FrameReader::with_config_ipc(read_half, config.clone())?;
        let writer = FrameWriter::with_config_ipc(stream, config)?;
        Ok(Self::new(reader, writer))
    }
}

/// A stream window over a Unix domain socket.
#[cfg(unix)]
pub type SocketWindow =
    StreamWindow<visbridge_transport::IpcStream, visbridge_transport::IpcStream>;

impl<R: Read, W: Write> Window for StreamWindow<R, W> {
    fn add_message_listener(&self, listener: Listener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_message_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn post_message(&self, message: &Value) {
        if self.closed.get() {
            debug!("stream closed; message dropped");
            return;
        }
        match self.write_message(message) {
            Ok(()) => trace!("message written"),
            Err(err) if is_disconnect(&err) => {
                self.closed.set(true);
                debug!(error = %err, "peer gone; message dropped");
            }
            Err(err) => debug!(error = %err, "message dropped"),
        }
    }
}

fn is_disconnect(err: &FrameError) -> bool {
    match err {
        FrameError::ConnectionClosed | FrameError::WriteStalled { .. } => true,
        FrameError::Io(err) => err.kind() == std::io::ErrorKind::BrokenPipe,
        _ => false,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use serde_json::json;
    use visbridge_frame::FrameConfig;
    use visbridge_transport::IpcStream;

    use super::*;

    fn socket_pair() -> (SocketWindow, SocketWindow) {
        let (a, b) = IpcStream::pair().unwrap();
        (
            StreamWindow::from_ipc(a, FrameConfig::default()).unwrap(),
            StreamWindow::from_ipc(b, FrameConfig::default()).unwrap(),
        )
    }

    #[test]
    fn posted_message_is_pumped_on_the_other_end() {
        let (plugin, host) = socket_pair();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        host.add_message_listener(Box::new(move |message| {
            sink.borrow_mut().push(message.clone());
        }));

        plugin.post_message(&json!({"type": "SettingsReady"}));
        plugin.post_message(&json!({"type": "Settings", "data": {"a": 1}}));
        host.pump().unwrap();
        host.pump().unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                json!({"type": "SettingsReady"}),
                json!({"type": "Settings", "data": {"a": 1}})
            ]
        );
    }

    #[test]
    fn non_json_frames_are_skipped() {
        let (raw, window_end) = IpcStream::pair().unwrap();
        let host = StreamWindow::from_ipc(window_end, FrameConfig::default()).unwrap();
        let calls = Rc::new(Cell::new(0));
        let counted = Rc::clone(&calls);
        host.add_message_listener(Box::new(move |_| counted.set(counted.get() + 1)));

        let mut writer = FrameWriter::new(raw);
        writer.send(b"\xff\xfe not json").unwrap();
        writer.send(br#"{"type":"SchemaReady"}"#).unwrap();

        host.pump().unwrap();
        assert_eq!(calls.get(), 0);
        host.pump().unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn disconnect_is_reported_and_sticky() {
        let (plugin, host) = socket_pair();
        drop(plugin);

        assert!(matches!(host.pump(), Err(ChannelError::Disconnected(_))));
        assert!(host.is_closed());
        assert!(matches!(host.pump(), Err(ChannelError::Disconnected(_))));
        host.post_message(&json!({"type": "SettingsRequest"}));
    }

    #[test]
    fn pump_until_closed_drains_everything() {
        let (plugin, host) = socket_pair();
        let calls = Rc::new(Cell::new(0));
        let counted = Rc::clone(&calls);
        host.add_message_listener(Box::new(move |_| counted.set(counted.get() + 1)));

        for _ in 0..5 {
            plugin.post_message(&json!({"type": "GraphDataReady"}));
        }
        drop(plugin);

        host.pump_until_closed().unwrap();
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn read_timeout_is_distinguishable() {
        let (_plugin_end, host_end) = IpcStream::pair().unwrap();
        let config = FrameConfig {
            read_timeout: Some(std::time::Duration::from_millis(20)),
            ..FrameConfig::default()
        };
        let host = StreamWindow::from_ipc(host_end, config).unwrap();

        let err = host.pump().unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err}");
        assert!(!host.is_closed());
    }

    #[test]
    fn posting_to_a_closed_peer_is_silent() {
        let (plugin, host) = socket_pair();
        drop(host);
        for _ in 0..3 {
            plugin.post_message(&json!({"type": "Settings", "data": {"a": 1}}));
        }
        assert!(plugin.is_closed());
    }

    #[test]
    fn peer_that_stops_reading_closes_the_window() {
        let (host_end, plugin_end) = IpcStream::pair().unwrap();
        let config = FrameConfig {
            write_timeout: Some(Duration::from_millis(50)),
            ..FrameConfig::default()
        };
        let host = StreamWindow::from_ipc(host_end, config).unwrap();
        let _idle_plugin = StreamWindow::from_ipc(plugin_end, FrameConfig::default()).unwrap();

        let chunk = "x".repeat(64 * 1024);
        let started = Instant::now();
        for n in 0..64 {
            host.post_message(&json!({"type": "Settings", "data": {"n": n, "chunk": chunk}}));
        }

        assert!(host.is_closed());
        assert!(started.elapsed() < Duration::from_secs(5));
        let err = host
            .try_send(&Envelope::Ready(visbridge_message::Kind::Settings))
            .unwrap_err();
        assert!(matches!(err, ChannelError::Disconnected(_)));
    }

    #[test]
    fn try_send_reports_a_gone_peer() {
        let (plugin, host) = socket_pair();
        let envelope = Envelope::Ready(visbridge_message::Kind::Settings);
        plugin.try_send(&envelope).unwrap();
        host.pump().unwrap();

        drop(host);
        let mut failed = false;
        for _ in 0..3 {
            failed |= plugin.try_send(&envelope).is_err();
        }
        assert!(failed);
        assert!(plugin.is_closed());
    }
}
