//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! # Identifier Types
//!
//! | Type | Backing | Assigned by |
//! |------|---------|-------------|
//! | [`CommandId`] | `u64` | Dispatcher, monotonic per connection |
//! | [`SessionId`] | `String` | Browser, in `Target.attachToTarget` response |
//! | [`TargetId`] | `String` | Browser |
//! | [`SubscriptionId`] | UUID v4 | Client, per event subscription |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// CommandId
// ============================================================================

/// Correlation ID for a command envelope.
///
/// Assigned by the dispatcher at send time. Unique per connection,
/// monotonically increasing, starting at 1. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Creates a command ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SessionId
// ============================================================================

/// Browser-assigned identifier for an attached target session.
///
/// Returned by `Target.attachToTarget`. Unique among currently-open sessions
/// on one connection; the browser may reuse an ID after the original session
/// closes, so stale state must be dropped on close.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from a browser-provided string.
    ///
    /// Returns `None` if the string is empty.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() { None } else { Some(Self(value)) }
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TargetId
// ============================================================================

/// Browser-assigned identifier for a debuggable target.
///
/// A target is a page, worker, extension, or the browser itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a target ID from a browser-provided string.
    ///
    /// Returns `None` if the string is empty.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() { None } else { Some(Self(value)) }
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Client-side identifier for an event subscription.
///
/// Used to remove the matching registry entry when a stream is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generates a fresh random subscription ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_id_ordering() {
        assert!(CommandId::new(1) < CommandId::new(2));
        assert_eq!(CommandId::new(7).value(), 7);
    }

    #[test]
    fn test_command_id_serde_transparent() {
        let id = CommandId::new(42);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "42");

        let back: CommandId = serde_json::from_str("42").expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_session_id_rejects_empty() {
        assert!(SessionId::new("").is_none());
        let id = SessionId::new("8E8F4A0C").expect("valid session id");
        assert_eq!(id.as_str(), "8E8F4A0C");
    }

    #[test]
    fn test_target_id_rejects_empty() {
        assert!(TargetId::new("").is_none());
        let id = TargetId::new("page-1").expect("valid target id");
        assert_eq!(id.to_string(), "page-1");
    }

    #[test]
    fn test_subscription_ids_unique() {
        let a = SubscriptionId::generate();
        let b = SubscriptionId::generate();
        assert_ne!(a, b);
    }
}
