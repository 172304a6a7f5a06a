//! WebSocket transport over the browser's debugger endpoint.
//!
//! A [`Transport`] owns one physical bidirectional channel. It is split
//! into a write half and a read half that share a closed flag, so the
//! dispatcher's event loop can send on one half while awaiting frames on
//! the other.
//!
//! # Contract
//!
//! - [`TransportWriter::send`] fails with `ConnectionClosed` once the
//!   channel is no longer open.
//! - [`TransportReader::receive`] yields inbound text frames in arrival
//!   order, returns `None` on normal closure, and `Some(Err(_))` on
//!   abnormal failure. Binary, ping and pong frames are skipped.
//! - [`TransportWriter::close`] is idempotent; closing terminates the
//!   inbound sequence for the reader.

// ============================================================================
// Imports
// ============================================================================

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for the WebSocket handshake when dialing.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

/// Boxed write half of a WebSocket stream.
type BoxedSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Boxed read half of a WebSocket stream.
type BoxedStream = Pin<Box<dyn Stream<Item = std::result::Result<Message, WsError>> + Send>>;

// ============================================================================
// Transport
// ============================================================================

/// One physical channel to a debugger endpoint.
///
/// Built by dialing a `ws://`/`wss://` URL, or from any established
/// WebSocket stream (tests run over an in-memory duplex pipe).
pub struct Transport {
    /// Write half.
    writer: TransportWriter,
    /// Read half.
    reader: TransportReader,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

impl Transport {
    /// Dials the debugger WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the URL does not parse or is not `ws`/`wss`
    /// - [`Error::ConnectionTimeout`] if the handshake exceeds 30s
    /// - [`Error::Connection`] if the endpoint refuses the handshake
    pub async fn connect(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e.to_string()))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(Error::invalid_url(url, "expected ws:// or wss:// scheme"));
        }

        let handshake = timeout(CONNECT_TIMEOUT, connect_async(parsed.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(CONNECT_TIMEOUT.as_millis() as u64))?;

        let (ws_stream, _) = handshake
            .map_err(|e| Error::connection(format!("WebSocket handshake failed: {e}")))?;

        debug!(url, "WebSocket connection established");

        Ok(Self::from_stream(ws_stream))
    }

    /// Wraps an established WebSocket stream.
    ///
    /// Used by [`connect`](Self::connect) and by tests that drive the
    /// browser side of the protocol over an in-memory pipe.
    #[must_use]
    pub fn from_stream<S>(ws_stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = ws_stream.split();
        let closed = Arc::new(AtomicBool::new(false));

        Self {
            writer: TransportWriter {
                sink: Box::pin(sink),
                closed: Arc::clone(&closed),
            },
            reader: TransportReader {
                stream: Box::pin(stream),
                closed,
            },
        }
    }

    /// Splits the transport into its write and read halves.
    #[must_use]
    pub(crate) fn split(self) -> (TransportWriter, TransportReader) {
        (self.writer, self.reader)
    }
}

// ============================================================================
// TransportWriter
// ============================================================================

/// Write half of a [`Transport`].
pub struct TransportWriter {
    /// Underlying WebSocket sink.
    sink: BoxedSink,
    /// Shared closed flag.
    closed: Arc<AtomicBool>,
}

impl TransportWriter {
    /// Sends one outbound text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the channel is no longer open
    /// - [`Error::WebSocket`] on other channel failures
    pub async fn send(&mut self, text: String) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::ConnectionClosed);
        }

        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| match e {
                WsError::ConnectionClosed | WsError::AlreadyClosed => {
                    self.closed.store(true, Ordering::Release);
                    Error::ConnectionClosed
                }
                e => Error::WebSocket(e),
            })
    }

    /// Closes the channel.
    ///
    /// Idempotent: closing an already-closed transport is a no-op. Any
    /// close-frame delivery failure is logged, not surfaced, since the
    /// channel is going away either way.
    pub async fn close(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Err(e) = self.sink.close().await {
            debug!(error = %e, "WebSocket close failed");
        }
    }

    /// Returns `true` once the channel is closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

// ============================================================================
// TransportReader
// ============================================================================

/// Read half of a [`Transport`].
pub struct TransportReader {
    /// Underlying WebSocket stream.
    stream: BoxedStream,
    /// Shared closed flag.
    closed: Arc<AtomicBool>,
}

impl TransportReader {
    /// Receives the next inbound text frame.
    ///
    /// Returns `None` when the channel closes normally, and
    /// `Some(Err(ConnectionError))` when it fails abnormally. Non-text
    /// frames are skipped.
    pub async fn receive(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text.to_string())),

                Some(Ok(Message::Close(_))) => {
                    debug!("WebSocket closed by remote");
                    self.closed.store(true, Ordering::Release);
                    return None;
                }

                // Ignore Binary, Ping, Pong, raw frames
                Some(Ok(_)) => {}

                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    self.closed.store(true, Ordering::Release);
                    return None;
                }

                Some(Err(e)) => {
                    self.closed.store(true, Ordering::Release);
                    return Some(Err(Error::connection_error(e.to_string())));
                }

                None => {
                    self.closed.store(true, Ordering::Release);
                    return None;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
