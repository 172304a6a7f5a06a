//! Inbound message decoding.
//!
//! Every frame the browser sends is either a response, correlated to a
//! pending command by `id`, or an event, identified by `method`. Decoding
//! discriminates on which of the two keys is present.
//!
//! # Wire Shapes
//!
//! | Message | Shape |
//! |---------|-------|
//! | Success | `{"id": 1, "sessionId"?: "...", "result": {...}}` |
//! | Failure | `{"id": 1, "sessionId"?: "...", "error": {"code": -1, "message": "..."}}` |
//! | Event | `{"method": "Domain.event", "sessionId"?: "...", "params": {...}}` |
//!
//! Unknown extra fields are ignored for forward compatibility with
//! protocol evolution.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, SessionId};

// ============================================================================
// CdpError
// ============================================================================

/// Error payload of a failed command response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdpError {
    /// Browser error code.
    pub code: i64,

    /// Browser error message.
    pub message: String,

    /// Optional additional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ============================================================================
// Response
// ============================================================================

/// A decoded command response.
///
/// Correlates to exactly one pending envelope by `id`. The `session_id`
/// is a consistency check against the request's session, never used for
/// routing.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Matches the command envelope's `id`.
    pub id: CommandId,

    /// Session the response belongs to, if any.
    pub session_id: Option<SessionId>,

    /// Success or failure payload.
    pub payload: ResponsePayload,
}

impl Response {
    /// Extracts the result value, mapping a failure payload to
    /// [`Error::Protocol`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] carrying the browser's code and message
    /// if the response was an error.
    pub fn into_result(self) -> Result<Value> {
        match self.payload {
            ResponsePayload::Success(result) => Ok(result),
            ResponsePayload::Failure(err) => Err(Error::protocol(err.code, err.message)),
        }
    }

    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.payload, ResponsePayload::Success(_))
    }
}

// ============================================================================
// ResponsePayload
// ============================================================================

/// Success or failure payload of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// Command succeeded; carries the `result` object.
    Success(Value),
    /// Command failed; carries the browser's error payload.
    Failure(CdpError),
}

// ============================================================================
// Event
// ============================================================================

/// A decoded event notification.
///
/// Uncorrelated to any command; dispatched to all subscribers registered
/// for the event's session and method.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name in `Domain.event` format.
    pub method: String,

    /// Session the event belongs to; `None` means the root session.
    pub session_id: Option<SessionId>,

    /// Event-specific payload.
    pub params: Value,
}

impl Event {
    /// Returns the domain name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Event { method: "Target.targetCreated".into(), .. };
    /// assert_eq!(event.domain(), "Target");
    /// ```
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }
}

// ============================================================================
// InboundMessage
// ============================================================================

/// A decoded inbound frame: response or event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Response to a pending command.
    Response(Response),
    /// Uncorrelated event notification.
    Event(Event),
}

// ============================================================================
// Decoding
// ============================================================================

/// Raw frame shape before discrimination.
#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<u64>,

    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,

    #[serde(default)]
    method: Option<String>,

    #[serde(default)]
    params: Option<Value>,

    #[serde(default)]
    result: Option<Value>,

    #[serde(default)]
    error: Option<CdpError>,
}

/// Decodes an inbound text frame.
///
/// # Errors
///
/// Returns [`Error::MalformedMessage`] if the text is not valid JSON, a
/// required field has the wrong shape, or neither `id` nor `method` is
/// present.
pub fn decode(text: &str) -> Result<InboundMessage> {
    let raw: RawMessage =
        serde_json::from_str(text).map_err(|e| Error::malformed(e.to_string()))?;

    // An empty sessionId string is treated as absent.
    let session_id = raw.session_id.and_then(SessionId::new);

    if let Some(id) = raw.id {
        let payload = match raw.error {
            Some(err) => ResponsePayload::Failure(err),
            None => ResponsePayload::Success(raw.result.unwrap_or(Value::Null)),
        };

        return Ok(InboundMessage::Response(Response {
            id: CommandId::new(id),
            session_id,
            payload,
        }));
    }

    if let Some(method) = raw.method {
        return Ok(InboundMessage::Event(Event {
            method,
            session_id,
            params: raw.params.unwrap_or_else(|| Value::Object(Default::default())),
        }));
    }

    Err(Error::malformed("frame has neither `id` nor `method`"))
}

// ============================================================================
// Tests
// ============================================================================
