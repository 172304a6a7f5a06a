//! Root browser session.
//!
//! A [`Browser`] owns the connection to one debugger endpoint and is the
//! root of that connection's session tree. Commands sent here carry no
//! session ID; attached target sessions are created from it and share its
//! connection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;
use crate::identifiers::TargetId;
use crate::protocol::{CreateTargetResult, GetTargetsResult, TargetCommand, TargetInfo};
use crate::transport::{Connection, EventStream, Transport};

use super::options::ConnectOptions;
use super::registry::SessionRegistry;
use super::session::{Session, attach};

// ============================================================================
// Browser
// ============================================================================

/// Internal shared state for a browser handle.
struct BrowserInner {
    /// Connection dispatcher shared with every session.
    connection: Connection,
    /// Session tree for this connection.
    registry: Arc<SessionRegistry>,
}

/// A handle to the root browser session.
///
/// Cloning is cheap; all clones address the same connection. Closing the
/// browser closes the connection and with it every attached session.
///
/// # Example
///
/// ```no_run
/// use chromium_cdp::Browser;
///
/// #[tokio::main]
/// async fn main() -> chromium_cdp::Result<()> {
///     let browser = Browser::connect("ws://127.0.0.1:9222/devtools/browser/abc").await?;
///
///     let targets = browser.targets().await?;
///     let session = browser.attach_to_target(&targets[0].target_id).await?;
///
///     session.send_command("Page.enable", None).await?;
///
///     browser.close();
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Browser {
    /// Shared inner state.
    inner: Arc<BrowserInner>,
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser")
            .field("open_sessions", &self.inner.registry.open_count())
            .field("closed", &self.inner.connection.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Browser - Constructors
// ============================================================================

impl Browser {
    /// Dials the browser's WebSocket debugger URL.
    ///
    /// The URL comes from `GET /json/version` on the debugging port (see
    /// [`HttpClient`](crate::HttpClient)).
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidUrl`] if the URL is not `ws://`/`wss://`
    /// - [`crate::Error::Connection`] if the handshake fails
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, ConnectOptions::default()).await
    }

    /// Dials the debugger URL with explicit options.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect).
    pub async fn connect_with(url: &str, options: ConnectOptions) -> Result<Self> {
        let transport = Transport::connect(url).await?;
        info!(url, "Browser connected");
        Ok(Self::from_transport_with(transport, options))
    }

    /// Wraps an established transport.
    ///
    /// Used by tests that drive the browser side of the protocol over an
    /// in-memory pipe.
    #[must_use]
    pub fn from_transport(transport: Transport) -> Self {
        Self::from_transport_with(transport, ConnectOptions::default())
    }

    /// Wraps an established transport with explicit options.
    #[must_use]
    pub fn from_transport_with(transport: Transport, options: ConnectOptions) -> Self {
        let connection =
            Connection::with_config(transport, options.command_timeout, options.event_buffer);

        Self {
            inner: Arc::new(BrowserInner {
                connection,
                registry: Arc::new(SessionRegistry::new()),
            }),
        }
    }
}

// ============================================================================
// Browser - Commands
// ============================================================================

impl Browser {
    /// Sends a raw command on the root session and waits for its result.
    ///
    /// This is the untyped entry point that generated domain bindings
    /// wrap; calling it directly bypasses typed safety for protocol
    /// surface the bindings do not cover yet.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::ConnectionClosed`] if the connection is closed
    /// - [`crate::Error::Protocol`] if the browser answers with an error
    pub async fn send_command(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.inner.connection.send_command(None, method, params).await
    }

    /// Sends a raw command with a custom response timeout.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command), plus
    /// [`crate::Error::CommandTimeout`] when the timeout elapses.
    pub async fn send_command_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        self.inner
            .connection
            .send_command_with_timeout(None, method, params, timeout)
            .await
    }

    /// Subscribes to events with the given method on the root session.
    ///
    /// Events tagged with a session ID go to that session's subscribers,
    /// never here.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConnectionClosed`] if the connection is
    /// closed.
    pub fn subscribe(&self, method: &str) -> Result<EventStream> {
        self.inner.connection.subscribe(None, method)
    }
}

// ============================================================================
// Browser - Targets
// ============================================================================

impl Browser {
    /// Enumerates attachable targets.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Protocol`] if the browser rejects the call.
    pub async fn targets(&self) -> Result<Vec<TargetInfo>> {
        let command = TargetCommand::GetTargets;
        let result = self.send_command(command.method(), command.params()).await?;
        let targets: GetTargetsResult = serde_json::from_value(result)?;
        Ok(targets.target_infos)
    }

    /// Creates a new page target.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Protocol`] if the browser rejects the call.
    pub async fn create_target(&self, url: &str) -> Result<TargetId> {
        let command = TargetCommand::CreateTarget { url: url.into() };
        let result = self.send_command(command.method(), command.params()).await?;
        let created: CreateTargetResult = serde_json::from_value(result)?;

        debug!(target_id = %created.target_id, "Target created");
        Ok(created.target_id)
    }

    /// Attaches to a target, creating a new session on this connection.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::AttachFailed`] if the target does not exist or
    ///   the browser refuses attachment
    /// - [`crate::Error::ConnectionClosed`] if the connection is closed
    pub async fn attach_to_target(&self, target_id: &TargetId) -> Result<Session> {
        attach(
            &self.inner.connection,
            &self.inner.registry,
            None,
            target_id,
            None,
        )
        .await
    }

    /// Attaches to an enumerated target, recording its type.
    ///
    /// # Errors
    ///
    /// Same as [`attach_to_target`](Self::attach_to_target).
    pub async fn attach_to(&self, info: &TargetInfo) -> Result<Session> {
        attach(
            &self.inner.connection,
            &self.inner.registry,
            None,
            &info.target_id,
            Some(info.target_type.clone()),
        )
        .await
    }
}

// ============================================================================
// Browser - Lifecycle
// ============================================================================

impl Browser {
    /// Closes the connection.
    ///
    /// Idempotent. Every session in the registry transitions to closed
    /// atomically, every pending command fails with `ConnectionClosed`,
    /// and every event stream terminates.
    pub fn close(&self) {
        self.inner.connection.close();
        self.inner.registry.close_all();
        info!("Browser closed");
    }

    /// Returns `true` once the connection is closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.connection.is_closed()
    }

    /// Returns the number of open attached sessions.
    #[inline]
    #[must_use]
    pub fn open_session_count(&self) -> usize {
        self.inner.registry.open_count()
    }
}

// ============================================================================
// Tests
// ============================================================================
