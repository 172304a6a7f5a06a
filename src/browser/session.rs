//! Attached target sessions.
//!
//! A [`Session`] is the caller-facing handle for one logical attachment
//! to a target, multiplexed over the connection it shares with the root
//! browser session and every sibling. Commands and subscriptions carry
//! the session's ID automatically; callers never supply session IDs.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{SessionId, TargetId};
use crate::protocol::{AttachToTargetResult, TargetCommand};
use crate::transport::{Connection, EventStream};

use super::registry::SessionRegistry;

// ============================================================================
// Attach
// ============================================================================

/// Sends `Target.attachToTarget` and registers the resulting session.
///
/// `parent` is the session the attach command is sent on (`None` for the
/// root) and becomes the new session's parent in the registry. The
/// session is `Open` only once the attach response carries its ID.
pub(crate) async fn attach(
    connection: &Connection,
    registry: &Arc<SessionRegistry>,
    parent: Option<SessionId>,
    target_id: &TargetId,
    target_type: Option<String>,
) -> Result<Session> {
    let command = TargetCommand::AttachToTarget {
        target_id: target_id.clone(),
    };

    let result = connection
        .send_command(parent.clone(), command.method(), command.params())
        .await
        .map_err(|e| match e {
            Error::Protocol { message, .. } => Error::attach_failed(target_id.clone(), message),
            Error::CommandTimeout { timeout_ms, .. } => Error::attach_failed(
                target_id.clone(),
                format!("attach timed out after {timeout_ms}ms"),
            ),
            e => e,
        })?;

    let attached: AttachToTargetResult = serde_json::from_value(result).map_err(|e| {
        Error::attach_failed(target_id.clone(), format!("invalid attach response: {e}"))
    })?;

    debug!(
        session = %attached.session_id,
        target_id = %target_id,
        parent = ?parent,
        "Attached to target"
    );

    registry.register(
        attached.session_id.clone(),
        parent,
        target_id.clone(),
        target_type,
    );

    Ok(Session {
        inner: Arc::new(SessionInner {
            session_id: attached.session_id,
            target_id: target_id.clone(),
            connection: connection.clone(),
            registry: Arc::clone(registry),
        }),
    })
}

// ============================================================================
// Session
// ============================================================================

/// Internal shared state for a session handle.
struct SessionInner {
    /// Browser-assigned session ID.
    session_id: SessionId,
    /// Target the session is attached to.
    target_id: TargetId,
    /// Shared connection dispatcher.
    connection: Connection,
    /// Shared session tree.
    registry: Arc<SessionRegistry>,
}

/// A handle to one attached target session.
///
/// Cloning is cheap; all clones address the same session. Detaching or
/// closing through any clone closes them all.
///
/// # Example
///
/// ```no_run
/// # use chromium_cdp::Browser;
/// # async fn example(browser: &Browser, target_id: &chromium_cdp::TargetId) -> chromium_cdp::Result<()> {
/// let session = browser.attach_to_target(target_id).await?;
///
/// session
///     .send_command("Page.enable", None)
///     .await?;
///
/// session.detach().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    /// Shared inner state.
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.inner.session_id)
            .field("target_id", &self.inner.target_id)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns the browser-assigned session ID.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Returns the target this session is attached to.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> &TargetId {
        &self.inner.target_id
    }

    /// Returns the target type, when it was known at attach time.
    #[must_use]
    pub fn target_type(&self) -> Option<String> {
        self.inner.registry.target_type(&self.inner.session_id)
    }

    /// Returns `true` while the session is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.registry.is_open(&self.inner.session_id)
    }

    /// Fails with [`Error::SessionClosed`] once the session has closed.
    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::session_closed(self.inner.session_id.clone()))
        }
    }
}

// ============================================================================
// Session - Commands
// ============================================================================

impl Session {
    /// Sends a raw command on this session and waits for its result.
    ///
    /// The session ID is injected automatically. This is the untyped
    /// entry point that generated domain bindings wrap; calling it
    /// directly bypasses typed safety for protocol surface the bindings
    /// do not cover yet.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] if the session has closed
    /// - [`Error::Protocol`] if the browser answers with an error payload
    /// - [`Error::ConnectionClosed`] if the connection terminates
    pub async fn send_command(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.ensure_open()?;
        self.inner
            .connection
            .send_command(Some(self.inner.session_id.clone()), method, params)
            .await
    }

    /// Sends a raw command with a custom response timeout.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command), plus
    /// [`Error::CommandTimeout`] when the timeout elapses.
    pub async fn send_command_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        self.ensure_open()?;
        self.inner
            .connection
            .send_command_with_timeout(
                Some(self.inner.session_id.clone()),
                method,
                params,
                timeout,
            )
            .await
    }

    /// Subscribes to events with the given method on this session.
    ///
    /// Events published for other sessions are never delivered here.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] if the session has closed
    /// - [`Error::ConnectionClosed`] if the connection terminates
    pub fn subscribe(&self, method: &str) -> Result<EventStream> {
        self.ensure_open()?;
        self.inner
            .connection
            .subscribe(Some(self.inner.session_id.clone()), method)
    }
}

// ============================================================================
// Session - Hierarchy
// ============================================================================

impl Session {
    /// Attaches to another target, parented to this session.
    ///
    /// The child shares this session's connection; closing this session
    /// closes the child too.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] if this session has closed
    /// - [`Error::AttachFailed`] if the browser refuses the attachment
    pub async fn attach_to_target(&self, target_id: &TargetId) -> Result<Session> {
        self.ensure_open()?;
        attach(
            &self.inner.connection,
            &self.inner.registry,
            Some(self.inner.session_id.clone()),
            target_id,
            None,
        )
        .await
    }
}

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Detaches this session from its target.
    ///
    /// The session and all its descendants transition to closed; the
    /// debugged target stays open, and the connection stays usable for
    /// sibling sessions. Detaching an already-closed session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the browser rejects the detach.
    pub async fn detach(&self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }

        let command = TargetCommand::DetachFromTarget {
            session_id: self.inner.session_id.clone(),
        };
        self.inner
            .connection
            .send_command(None, command.method(), command.params())
            .await?;

        self.close_locally();
        debug!(session = %self.inner.session_id, "Session detached");
        Ok(())
    }

    /// Closes the underlying target itself.
    ///
    /// Unlike [`detach`](Self::detach) this closes the tab or worker, and
    /// with it this session and every descendant. The connection stays
    /// open. Closing an already-closed session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the browser rejects the close.
    pub async fn close_target(&self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }

        let command = TargetCommand::CloseTarget {
            target_id: self.inner.target_id.clone(),
        };
        self.inner
            .connection
            .send_command(None, command.method(), command.params())
            .await?;

        self.close_locally();
        debug!(target_id = %self.inner.target_id, "Target closed");
        Ok(())
    }

    /// Removes this session's subtree from the registry and drops the
    /// stale event subscriptions of every closed session.
    fn close_locally(&self) {
        for closed in self.inner.registry.close_subtree(&self.inner.session_id) {
            self.inner.connection.remove_session_subscribers(&closed);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
