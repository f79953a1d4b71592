//! WebSocket socket ownership and read loop.
//!
//! [`Socket`] owns the one WebSocket of the session. It serializes
//! concurrent writers onto the single sink, runs exactly one background
//! read loop, and reports a single terminal [`CloseStatus`] when that
//! loop exits.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──connect()──► Connecting ──► Open ──► Closing ──► Closed
//! ```
//!
//! Transitions only ever move forward; a closed socket cannot be revived.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// The connected WebSocket stream type.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the socket.
type WsSink = SplitSink<WsStream, Message>;

/// Read half of the socket.
type WsSource = SplitStream<WsStream>;

/// Callback invoked with each fully reassembled inbound frame.
pub type FrameHandler = Box<dyn Fn(String) + Send + Sync>;

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of the session.
///
/// States are ordered; the session only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// No connection has been attempted.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// The socket is open and frames flow in both directions.
    Open,
    /// A disconnect is in progress.
    Closing,
    /// The session has ended; terminal.
    Closed,
}

// ============================================================================
// CloseStatus
// ============================================================================

/// Terminal status reported when the read loop exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStatus {
    /// The socket closed cleanly: a Close frame, the end of the stream,
    /// or a local disconnect.
    Normal,

    /// The socket failed: a transport error ended the session.
    Error,
}

// ============================================================================
// FrameAssembler
// ============================================================================

/// Reassembles partial text chunks into complete frames.
///
/// Chunks accumulate until one arrives with the end-of-message marker,
/// at which point the buffered text is emitted as a single frame and the
/// buffer resets.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: String,
}

impl FrameAssembler {
    /// Creates an empty assembler.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk; returns the completed frame when `end_of_message`
    /// is set.
    pub fn push(&mut self, chunk: &str, end_of_message: bool) -> Option<String> {
        self.buffer.push_str(chunk);
        if end_of_message {
            Some(std::mem::take(&mut self.buffer))
        } else {
            None
        }
    }

    /// Returns `true` if a partial frame is buffered.
    #[inline]
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.buffer.is_empty()
    }
}

// ============================================================================
// Socket
// ============================================================================

/// The session's WebSocket.
///
/// # Thread Safety
///
/// `Socket` is shared behind an [`Arc`]; every operation takes `&self`
/// and is safe to call concurrently with the read loop. Writes are
/// mutually exclusive: the async write lock guarantees two concurrent
/// senders never interleave bytes on the wire.
pub struct Socket {
    /// Lifecycle state; forward-only.
    state: Mutex<SessionState>,

    /// Write half, present while the socket is open.
    writer: AsyncMutex<Option<WsSink>>,

    /// Resolved exactly once with the terminal close status.
    close_tx: watch::Sender<Option<CloseStatus>>,

    /// Receiver template cloned by [`Socket::wait_for_close`].
    close_rx: watch::Receiver<Option<CloseStatus>>,
}

impl Default for Socket {
    fn default() -> Self {
        Self::new()
    }
}

impl Socket {
    /// Creates a disconnected socket.
    #[must_use]
    pub fn new() -> Self {
        let (close_tx, close_rx) = watch::channel(None);
        Self {
            state: Mutex::new(SessionState::Disconnected),
            writer: AsyncMutex::new(None),
            close_tx,
            close_rx,
        }
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Returns `true` while frames can be sent.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Opens the socket and starts the background read loop.
    ///
    /// Takes an [`Arc`] so the read-loop task can keep the socket alive.
    /// Every fully reassembled inbound frame is handed to `on_frame` from
    /// that task, strictly in arrival order.
    ///
    /// # Errors
    ///
    /// - [`Error::Operation`] if the socket is not in its initial state
    /// - [`Error::Connection`] if the endpoint is unreachable; the socket
    ///   is closed and never retried
    pub async fn connect(self: Arc<Self>, url: Url, on_frame: FrameHandler) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != SessionState::Disconnected {
                return Err(Error::operation(format!(
                    "cannot connect a socket in the {state:?} state"
                )));
            }
            *state = SessionState::Connecting;
        }

        let (stream, _response) = match connect_async(url.as_str()).await {
            Ok(connected) => connected,
            Err(e) => {
                self.finish(CloseStatus::Error);
                return Err(Error::connection(format!("failed to connect to {url}: {e}")));
            }
        };

        debug!(%url, "socket connected");

        let (sink, source) = stream.split();
        *self.writer.lock().await = Some(sink);
        *self.state.lock() = SessionState::Open;

        tokio::spawn(Self::read_loop(self, source, on_frame));

        Ok(())
    }

    /// Sends one complete text frame.
    ///
    /// Concurrent callers serialize on the write lock; each call puts
    /// exactly one contiguous frame on the wire.
    ///
    /// # Errors
    ///
    /// - [`Error::Operation`] if the socket is not open
    /// - [`Error::WebSocket`] if the transport write fails
    pub async fn send(&self, text: String) -> Result<()> {
        if !self.is_open() {
            return Err(Error::operation("the web socket is not connected"));
        }

        let mut writer = self.writer.lock().await;
        let sink = writer
            .as_mut()
            .ok_or_else(|| Error::operation("the web socket is not connected"))?;

        trace!(len = text.len(), "sending frame");
        sink.send(Message::Text(text.into())).await?;

        Ok(())
    }

    /// Closes the socket.
    ///
    /// Idempotent. If the socket is open a Close frame is sent, the state
    /// advances to [`SessionState::Closed`], and every
    /// [`Socket::wait_for_close`] future resolves with
    /// [`CloseStatus::Normal`].
    pub async fn disconnect(&self) {
        {
            let mut state = self.state.lock();
            if *state >= SessionState::Closing {
                return;
            }
            *state = SessionState::Closing;
        }

        if let Some(mut sink) = self.writer.lock().await.take() {
            // Emits a Close frame before dropping the sink.
            let _ = sink.close().await;
        }

        self.finish(CloseStatus::Normal);
    }

    /// Waits until the read loop reports a terminal status.
    ///
    /// Resolves immediately if the session has already ended. Dropping
    /// the returned future stops waiting without touching the socket.
    pub async fn wait_for_close(&self) -> CloseStatus {
        let mut close_rx = self.close_rx.clone();
        match close_rx.wait_for(Option::is_some).await {
            Ok(status) => status.unwrap_or(CloseStatus::Error),
            // The sender lives in self, so this only fires mid-teardown.
            Err(_) => CloseStatus::Error,
        }
    }

    /// Records the terminal status; first caller wins.
    fn finish(&self, status: CloseStatus) {
        *self.state.lock() = SessionState::Closed;
        let resolved = self.close_tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(status);
                true
            } else {
                false
            }
        });

        if resolved {
            debug!(?status, "session ended");
        }
    }

    /// Receives until the socket closes, reassembling partial chunks.
    ///
    /// On exit the socket always carries exactly one terminal status;
    /// a half-open session is impossible.
    async fn read_loop(socket: Arc<Self>, mut source: WsSource, on_frame: FrameHandler) {
        let mut assembler = FrameAssembler::new();

        let status = loop {
            match source.next().await {
                Some(Ok(Message::Text(text))) => {
                    if let Some(frame) = assembler.push(text.as_str(), true) {
                        trace!(len = frame.len(), "frame reassembled");
                        on_frame(frame);
                    }
                }

                Some(Ok(Message::Close(_))) => {
                    debug!("socket closed by host");
                    break CloseStatus::Normal;
                }

                // Binary, Ping, Pong and raw frames carry no events.
                Some(Ok(_)) => {}

                Some(Err(e)) => {
                    error!(error = %e, "socket failed");
                    break CloseStatus::Error;
                }

                None => {
                    debug!("socket stream ended");
                    break CloseStatus::Normal;
                }
            }
        };

        socket.finish(status);
    }
}

// ============================================================================
// Tests
// ============================================================================
