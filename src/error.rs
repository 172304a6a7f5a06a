//! Error types for the CDP client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chromium_cdp::{Result, Error};
//!
//! async fn example(browser: &Browser) -> Result<()> {
//!     let session = browser.attach_to_target(&target_id).await?;
//!     session.detach().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::ConnectionError`] |
//! | Session | [`Error::SessionClosed`], [`Error::AttachFailed`] |
//! | Protocol | [`Error::Protocol`], [`Error::MalformedMessage`] |
//! | Execution | [`Error::CommandTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`], [`Error::InvalidUrl`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{CommandId, SessionId, TargetId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection could not be established.
    ///
    /// Returned when the debugger endpoint refuses the handshake.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout.
    ///
    /// Returned when the debugger endpoint does not respond within
    /// the timeout period.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection closed.
    ///
    /// Returned when an operation is attempted after the connection was
    /// closed, and delivered to every pending command when it terminates.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Connection failed abnormally.
    ///
    /// Like [`Error::ConnectionClosed`] but preserves the underlying cause
    /// (network drop, protocol-level WebSocket failure).
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Description of the underlying failure.
        message: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Operation on a detached or closed session.
    #[error("Session closed: {session_id}")]
    SessionClosed {
        /// The closed session's ID.
        session_id: SessionId,
    },

    /// `Target.attachToTarget` failed.
    ///
    /// Returned when the target does not exist, the browser refuses
    /// attachment, or the attach command times out.
    #[error("Attach to target {target_id} failed: {message}")]
    AttachFailed {
        /// The target that could not be attached.
        target_id: TargetId,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The browser answered a command with an error payload.
    ///
    /// Carries the browser's error code and message, surfaced to exactly
    /// the calling task.
    #[error("Protocol error {code}: {message}")]
    Protocol {
        /// Browser error code.
        code: i64,
        /// Browser error message.
        message: String,
    },

    /// An inbound frame could not be decoded.
    ///
    /// The dispatcher logs and drops such frames; this variant surfaces
    /// only from direct codec use.
    #[error("Malformed message: {message}")]
    MalformedMessage {
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Command response not received within timeout.
    #[error("Command {command_id} timed out after {timeout_ms}ms")]
    CommandTimeout {
        /// The command ID that timed out.
        command_id: CommandId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP metadata endpoint error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid debugger endpoint URL.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Description of the parse failure.
        message: String,
    },

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates an abnormal connection failure error.
    #[inline]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Creates a session closed error.
    #[inline]
    pub fn session_closed(session_id: SessionId) -> Self {
        Self::SessionClosed { session_id }
    }

    /// Creates an attach failed error.
    #[inline]
    pub fn attach_failed(target_id: TargetId, message: impl Into<String>) -> Self {
        Self::AttachFailed {
            target_id,
            message: message.into(),
        }
    }

    /// Creates a protocol error from a browser error payload.
    #[inline]
    pub fn protocol(code: i64, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Creates a malformed message error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
        }
    }

    /// Creates a command timeout error.
    #[inline]
    pub fn command_timeout(command_id: CommandId, timeout_ms: u64) -> Self {
        Self::CommandTimeout {
            command_id,
            timeout_ms,
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::CommandTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::ConnectionError { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a browser-reported command failure.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry; retry policy belongs to
    /// the caller, never to this layer.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::CommandTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
