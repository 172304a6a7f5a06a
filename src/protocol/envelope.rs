//! Outbound command envelope.
//!
//! Defines the message format for command invocations from client to
//! browser and its serialization to wire text.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{CommandId, SessionId};

// ============================================================================
// Envelope
// ============================================================================

/// A command envelope from client to browser.
///
/// # Format
///
/// ```json
/// {
///   "id": 1,
///   "sessionId": "8E8F...",
///   "method": "Domain.command",
///   "params": { ... }
/// }
/// ```
///
/// `sessionId` and `params` are omitted entirely when absent, never
/// serialized as `null`. The `id` is unique per connection, assigned by
/// the dispatcher at send time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlation ID, unique per connection.
    pub id: CommandId,

    /// Target session; `None` addresses the root browser session.
    #[serde(
        rename = "sessionId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<SessionId>,

    /// Command name in `Domain.command` format.
    pub method: String,

    /// Command parameters; omitted when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Envelope {
    /// Creates a new envelope.
    ///
    /// An empty params object is normalized to no params, matching
    /// protocol expectations.
    #[must_use]
    pub fn new(
        id: CommandId,
        session_id: Option<SessionId>,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Self {
        let params = params.filter(|p| !p.as_object().is_some_and(serde_json::Map::is_empty));
        Self {
            id,
            session_id,
            method: method.into(),
            params,
        }
    }

    /// Serializes the envelope to wire text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the params cannot be serialized.
    #[inline]
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_root_command() {
        let envelope = Envelope::new(CommandId::new(1), None, "Browser.getVersion", None);
        let text = envelope.encode().expect("encode");

        assert_eq!(text, r#"{"id":1,"method":"Browser.getVersion"}"#);
    }

    #[test]
    fn test_encode_session_command() {
        let session_id = SessionId::new("8E8F").expect("valid session id");
        let envelope = Envelope::new(
            CommandId::new(2),
            Some(session_id),
            "Page.navigate",
            Some(json!({"url": "https://example.com"})),
        );
        let text = envelope.encode().expect("encode");

        assert_eq!(
            text,
            r#"{"id":2,"sessionId":"8E8F","method":"Page.navigate","params":{"url":"https://example.com"}}"#
        );
    }

    #[test]
    fn test_empty_params_omitted() {
        let envelope = Envelope::new(CommandId::new(3), None, "Target.getTargets", Some(json!({})));
        let text = envelope.encode().expect("encode");

        assert!(envelope.params.is_none());
        assert!(!text.contains("params"));
        assert!(!text.contains("null"));
    }

    #[test]
    fn test_absent_session_id_omitted() {
        let envelope = Envelope::new(CommandId::new(4), None, "Target.getTargets", None);
        let text = envelope.encode().expect("encode");

        assert!(!text.contains("sessionId"));
    }

    #[test]
    fn test_round_trip() {
        let session_id = SessionId::new("CAFE01").expect("valid session id");
        let envelope = Envelope::new(
            CommandId::new(99),
            Some(session_id),
            "Runtime.evaluate",
            Some(json!({"expression": "1 + 1"})),
        );

        let text = envelope.encode().expect("encode");
        let back: Envelope = serde_json::from_str(&text).expect("decode");
        assert_eq!(back, envelope);
    }

    mod round_trip_props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encode_decode_round_trips(
                id in 1u64..=u64::MAX,
                session in proptest::option::of("[A-F0-9]{8}"),
                method in "[A-Z][a-z]{2,8}\\.[a-z]{3,12}",
                value in 0i64..1000,
            ) {
                let envelope = Envelope::new(
                    CommandId::new(id),
                    session.and_then(SessionId::new),
                    method,
                    Some(json!({"value": value})),
                );

                let text = envelope.encode().unwrap();
                let back: Envelope = serde_json::from_str(&text).unwrap();
                prop_assert_eq!(back, envelope);
            }
        }
    }
}
