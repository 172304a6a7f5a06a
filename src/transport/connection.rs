//! Connection dispatcher and event loop.
//!
//! This module is the concurrency core of the crate: a single read loop
//! per connection, multiplexing correlated command calls and event
//! subscriptions for every session sharing the channel.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming frames from the browser (responses, events)
//! - Outgoing command envelopes from callers
//! - Request/response correlation by monotonically increasing ID
//! - Event fan-out to per-subscriber bounded queues
//!
//! The loop processes inbound frames strictly in arrival order, so the
//! relative order of all inbound messages is preserved end-to-end.

// ============================================================================
// Imports
// ============================================================================

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, SessionId, SubscriptionId};
use crate::protocol::{Envelope, InboundMessage, decode};

use super::websocket::{Transport, TransportReader, TransportWriter};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for command execution.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-subscriber event queue capacity.
const DEFAULT_EVENT_BUFFER: usize = 64;

// ============================================================================
// Types
// ============================================================================

/// A one-shot slot for a command awaiting its response.
///
/// Exactly one resolution ever occurs per ID; the slot is removed from
/// the pending map the moment it resolves.
struct PendingCall {
    /// Session the command was sent on, checked against the response.
    session_id: Option<SessionId>,
    /// Channel resolving the caller.
    response_tx: oneshot::Sender<Result<Value>>,
}

/// Map of command IDs to pending calls.
type PendingMap = FxHashMap<CommandId, PendingCall>;

/// Subscription key: session plus event method.
type EventKey = (Option<SessionId>, String);

/// A registered event consumer.
struct Subscriber {
    /// Identity for removal on drop.
    id: SubscriptionId,
    /// Bounded queue of decoded event payloads.
    event_tx: mpsc::Sender<Value>,
}

/// Map of event keys to their subscribers.
type SubscriberMap = FxHashMap<EventKey, Vec<Subscriber>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send an envelope and register its pending call.
    Send {
        envelope: Envelope,
        response_tx: oneshot::Sender<Result<Value>>,
    },
    /// Remove a cancelled or timed-out pending entry.
    RemovePending(CommandId),
    /// Close the connection.
    Close,
}

// ============================================================================
// Connection
// ============================================================================

/// A multiplexed connection to a debugger endpoint.
///
/// Owns the single read-loop task; shared by the root session and every
/// attached target session. Cloning is cheap and all clones address the
/// same physical channel.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`. The pending map and subscriber registry
/// are mutated by the event loop and by caller-initiated register and
/// unregister operations, under a mutex; the ID counter is atomic.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Pending calls (shared with event loop).
    pending: Arc<Mutex<PendingMap>>,
    /// Event subscribers (shared with event loop).
    subscribers: Arc<Mutex<SubscriberMap>>,
    /// Next command ID, starting at 1, monotonic, never reused.
    next_id: Arc<AtomicU64>,
    /// Set once the event loop terminates or close is requested.
    closed: Arc<AtomicBool>,
    /// Default timeout applied by [`send_command`](Self::send_command).
    command_timeout: Duration,
    /// Per-subscriber event queue capacity.
    event_buffer: usize,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            pending: Arc::clone(&self.pending),
            subscribers: Arc::clone(&self.subscribers),
            next_id: Arc::clone(&self.next_id),
            closed: Arc::clone(&self.closed),
            command_timeout: self.command_timeout,
            event_buffer: self.event_buffer,
        }
    }
}

// ============================================================================
// Connection - Constructors
// ============================================================================

impl Connection {
    /// Creates a connection over a transport with default configuration.
    ///
    /// Spawns the event loop task internally.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::with_config(transport, DEFAULT_COMMAND_TIMEOUT, DEFAULT_EVENT_BUFFER)
    }

    /// Creates a connection with explicit timeout and event buffer sizing.
    #[must_use]
    pub fn with_config(
        transport: Transport,
        command_timeout: Duration,
        event_buffer: usize,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Mutex::new(PendingMap::default()));
        let subscribers = Arc::new(Mutex::new(SubscriberMap::default()));
        let closed = Arc::new(AtomicBool::new(false));

        let (writer, reader) = transport.split();

        tokio::spawn(Self::run_event_loop(
            writer,
            reader,
            command_rx,
            Arc::clone(&pending),
            Arc::clone(&subscribers),
            Arc::clone(&closed),
        ));

        Self {
            command_tx,
            pending,
            subscribers,
            next_id: Arc::new(AtomicU64::new(1)),
            closed,
            command_timeout,
            event_buffer,
        }
    }
}

// ============================================================================
// Connection - Commands
// ============================================================================

impl Connection {
    /// Sends a command and waits for its response with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is closed
    /// - [`Error::Protocol`] if the browser answers with an error payload
    /// - [`Error::CommandTimeout`] if no response arrives within the timeout
    pub async fn send_command(
        &self,
        session_id: Option<SessionId>,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Result<Value> {
        self.send_command_with_timeout(session_id, method, params, self.command_timeout)
            .await
    }

    /// Sends a command and waits for its response with a custom timeout.
    ///
    /// The command ID is allocated here, at send time. Cancelling the
    /// returned future (or timing out) removes the pending entry but does
    /// not unsend the request; a late response is dropped as unknown.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is closed
    /// - [`Error::Protocol`] if the browser answers with an error payload
    /// - [`Error::CommandTimeout`] if no response arrives within the timeout
    pub async fn send_command_with_timeout(
        &self,
        session_id: Option<SessionId>,
        method: impl Into<String>,
        params: Option<Value>,
        command_timeout: Duration,
    ) -> Result<Value> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let id = CommandId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let envelope = Envelope::new(id, session_id, method, params);

        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send {
                envelope,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(command_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            // Event loop died without resolving the slot.
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self.command_tx.send(ConnectionCommand::RemovePending(id));
                Err(Error::command_timeout(
                    id,
                    command_timeout.as_millis() as u64,
                ))
            }
        }
    }
}

// ============================================================================
// Connection - Subscriptions
// ============================================================================

impl Connection {
    /// Subscribes to events for a session and method.
    ///
    /// Returns a stream of decoded event payloads, ordered by arrival on
    /// the wire. Dropping the stream removes the registration and has no
    /// effect on in-flight commands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the connection is closed.
    pub fn subscribe(
        &self,
        session_id: Option<SessionId>,
        method: impl Into<String>,
    ) -> Result<EventStream> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let key: EventKey = (session_id, method.into());
        let id = SubscriptionId::generate();
        let (event_tx, event_rx) = mpsc::channel(self.event_buffer);

        self.subscribers
            .lock()
            .entry(key.clone())
            .or_default()
            .push(Subscriber { id, event_tx });

        // The event loop may have terminated between the closed check and
        // the registration; its final sweep only clears entries present
        // at that moment.
        if self.is_closed() {
            self.subscribers.lock().remove(&key);
            return Err(Error::ConnectionClosed);
        }

        trace!(subscription = %id, method = %key.1, "Subscriber registered");

        Ok(EventStream {
            event_rx,
            _guard: SubscriptionGuard {
                key,
                id,
                subscribers: Arc::clone(&self.subscribers),
            },
        })
    }

    /// Removes every subscriber registered for a session.
    ///
    /// Called when a session closes: the browser may reuse a session ID
    /// after close, so stale registrations must not survive to see the
    /// successor's events.
    pub(crate) fn remove_session_subscribers(&self, session_id: &SessionId) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|(key_session, _), _| key_session.as_ref() != Some(session_id));
    }
}

// ============================================================================
// Connection - Lifecycle
// ============================================================================

impl Connection {
    /// Closes the connection.
    ///
    /// Idempotent. Every pending call fails with `ConnectionClosed` and
    /// every event stream terminates; no session survives.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.command_tx.send(ConnectionCommand::Close);
    }

    /// Returns `true` once the connection is closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns the number of commands awaiting responses.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

// ============================================================================
// Connection - Event Loop
// ============================================================================

impl Connection {
    /// Event loop owning the transport halves.
    async fn run_event_loop(
        mut writer: TransportWriter,
        mut reader: TransportReader,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        pending: Arc<Mutex<PendingMap>>,
        subscribers: Arc<Mutex<SubscriberMap>>,
        closed: Arc<AtomicBool>,
    ) {
        // Abnormal-failure cause, preserved for pending calls.
        let mut failure: Option<String> = None;

        loop {
            tokio::select! {
                // Inbound frames from the browser
                frame = reader.receive() => {
                    match frame {
                        Some(Ok(text)) => {
                            Self::handle_frame(&text, &pending, &subscribers);
                        }

                        Some(Err(e)) => {
                            warn!(error = %e, "Transport failed");
                            failure = Some(e.to_string());
                            break;
                        }

                        None => {
                            debug!("Transport stream ended");
                            break;
                        }
                    }
                }

                // Commands from callers
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { envelope, response_tx }) => {
                            Self::handle_send(envelope, response_tx, &mut writer, &pending).await;
                        }

                        Some(ConnectionCommand::RemovePending(id)) => {
                            pending.lock().remove(&id);
                            debug!(command = %id, "Removed cancelled pending call");
                        }

                        Some(ConnectionCommand::Close) => {
                            debug!("Close requested");
                            break;
                        }

                        None => {
                            debug!("All connection handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        closed.store(true, Ordering::Release);
        writer.close().await;

        Self::fail_pending(&pending, failure.as_deref());

        // Dropping the senders terminates every event stream.
        subscribers.lock().clear();

        debug!("Event loop terminated");
    }

    /// Decodes one inbound frame and routes it.
    ///
    /// Malformed frames are logged and skipped; a single bad frame must
    /// never take down the loop.
    fn handle_frame(
        text: &str,
        pending: &Arc<Mutex<PendingMap>>,
        subscribers: &Arc<Mutex<SubscriberMap>>,
    ) {
        match decode(text) {
            Ok(InboundMessage::Response(response)) => {
                let call = pending.lock().remove(&response.id);

                match call {
                    Some(call) => {
                        if call.session_id != response.session_id {
                            warn!(
                                command = %response.id,
                                expected = ?call.session_id,
                                received = ?response.session_id,
                                "Response session mismatch"
                            );
                        }
                        let _ = call.response_tx.send(response.into_result());
                    }
                    // Cancelled calls and browser resends land here.
                    None => {
                        warn!(command = %response.id, "Response for unknown or cancelled command");
                    }
                }
            }

            Ok(InboundMessage::Event(event)) => {
                let key: EventKey = (event.session_id.clone(), event.method.clone());
                let subscribers = subscribers.lock();

                if let Some(list) = subscribers.get(&key) {
                    for subscriber in list {
                        match subscriber.event_tx.try_send(event.params.clone()) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                warn!(
                                    subscription = %subscriber.id,
                                    method = %event.method,
                                    "Event queue full, dropping event for slow subscriber"
                                );
                            }
                            // Stream dropped; guard will unregister it.
                            Err(TrySendError::Closed(_)) => {}
                        }
                    }
                }
            }

            Err(e) => {
                warn!(error = %e, "Malformed frame dropped");
            }
        }
    }

    /// Registers a pending call and writes its envelope.
    async fn handle_send(
        envelope: Envelope,
        response_tx: oneshot::Sender<Result<Value>>,
        writer: &mut TransportWriter,
        pending: &Arc<Mutex<PendingMap>>,
    ) {
        let id = envelope.id;

        let text = match envelope.encode() {
            Ok(text) => text,
            Err(e) => {
                let _ = response_tx.send(Err(e));
                return;
            }
        };

        // Register before writing: the response can arrive between the
        // write completing and any post-write bookkeeping.
        pending.lock().insert(
            id,
            PendingCall {
                session_id: envelope.session_id,
                response_tx,
            },
        );

        if let Err(e) = writer.send(text).await
            && let Some(call) = pending.lock().remove(&id)
        {
            let _ = call.response_tx.send(Err(e));
            return;
        }

        trace!(command = %id, "Command sent");
    }

    /// Fails every pending call when the loop terminates.
    fn fail_pending(pending: &Arc<Mutex<PendingMap>>, failure: Option<&str>) {
        let drained: Vec<_> = pending.lock().drain().collect();
        let count = drained.len();

        for (_, call) in drained {
            let err = match failure {
                Some(message) => Error::connection_error(message),
                None => Error::ConnectionClosed,
            };
            let _ = call.response_tx.send(Err(err));
        }

        if count > 0 {
            debug!(count, "Failed pending calls on termination");
        }
    }
}

// ============================================================================
// EventStream
// ============================================================================

/// A stream of decoded event payloads for one subscription.
///
/// Yields params of matching events in wire-arrival order. Ends when the
/// subscription's session closes or the connection terminates. Dropping
/// the stream unregisters the subscription.
pub struct EventStream {
    /// Queue fed by the event loop.
    event_rx: mpsc::Receiver<Value>,
    /// Removes the registration on drop.
    _guard: SubscriptionGuard,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

impl EventStream {
    /// Receives the next event payload.
    ///
    /// Returns `None` once the subscription has ended.
    pub async fn next_event(&mut self) -> Option<Value> {
        self.event_rx.recv().await
    }
}

impl Stream for EventStream {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        self.event_rx.poll_recv(cx)
    }
}

/// Unregisters a subscriber when its stream is dropped.
struct SubscriptionGuard {
    /// Key the subscriber is filed under.
    key: EventKey,
    /// Identity within the key's subscriber list.
    id: SubscriptionId,
    /// Registry shared with the connection.
    subscribers: Arc<Mutex<SubscriberMap>>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.lock();
        if let Some(list) = subscribers.get_mut(&self.key) {
            list.retain(|s| s.id != self.id);
            if list.is_empty() {
                subscribers.remove(&self.key);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
