//! Target domain commands and payloads.
//!
//! The Target domain drives the session lifecycle itself: attaching to
//! targets, detaching sessions, and closing targets. These are the only
//! typed commands this crate ships; everything else goes through the raw
//! entry point or generated bindings layered on top.
//!
//! # Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `Target.attachToTarget` | Open a flattened session on a target |
//! | `Target.detachFromTarget` | Detach a session, target stays alive |
//! | `Target.closeTarget` | Close the target itself |
//! | `Target.createTarget` | Open a new page target |
//! | `Target.getTargets` | Enumerate attachable targets |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::identifiers::{SessionId, TargetId};

// ============================================================================
// TargetCommand
// ============================================================================

/// Target domain commands used by the session lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetCommand {
    /// Attach to a target, creating a flattened session.
    AttachToTarget {
        /// Target to attach to.
        target_id: TargetId,
    },

    /// Detach a session from its target.
    DetachFromTarget {
        /// Session to detach.
        session_id: SessionId,
    },

    /// Close a target (the tab/worker itself, not just the session).
    CloseTarget {
        /// Target to close.
        target_id: TargetId,
    },

    /// Create a new page target.
    CreateTarget {
        /// Initial URL for the new target.
        url: String,
    },

    /// Enumerate attachable targets.
    GetTargets,
}

impl TargetCommand {
    /// Returns the wire method name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::AttachToTarget { .. } => "Target.attachToTarget",
            Self::DetachFromTarget { .. } => "Target.detachFromTarget",
            Self::CloseTarget { .. } => "Target.closeTarget",
            Self::CreateTarget { .. } => "Target.createTarget",
            Self::GetTargets => "Target.getTargets",
        }
    }

    /// Returns the wire params, if the command carries any.
    ///
    /// Attach always requests a flattened session: responses and events
    /// for the child arrive on the same connection, tagged by session id.
    #[must_use]
    pub fn params(&self) -> Option<Value> {
        match self {
            Self::AttachToTarget { target_id } => Some(json!({
                "targetId": target_id,
                "flatten": true,
            })),
            Self::DetachFromTarget { session_id } => Some(json!({
                "sessionId": session_id,
            })),
            Self::CloseTarget { target_id } => Some(json!({
                "targetId": target_id,
            })),
            Self::CreateTarget { url } => Some(json!({
                "url": url,
            })),
            Self::GetTargets => None,
        }
    }
}

// ============================================================================
// TargetInfo
// ============================================================================

/// Description of a debuggable target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Browser-assigned target ID.
    pub target_id: TargetId,

    /// Target type: `page`, `iframe`, `worker`, `browser`, ...
    #[serde(rename = "type")]
    pub target_type: String,

    /// Target title (page title for pages).
    #[serde(default)]
    pub title: String,

    /// Target URL.
    #[serde(default)]
    pub url: String,

    /// Whether a debugger is attached.
    #[serde(default)]
    pub attached: bool,

    /// Browser context the target belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<String>,
}

// ============================================================================
// Command Results
// ============================================================================

/// Result of `Target.attachToTarget`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
    /// Browser-assigned session ID for the new session.
    pub session_id: SessionId,
}

/// Result of `Target.createTarget`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
    /// ID of the newly created target.
    pub target_id: TargetId,
}

/// Result of `Target.getTargets`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsResult {
    /// Infos for all attachable targets.
    pub target_infos: Vec<TargetInfo>,
}

// ============================================================================
// Tests
// ============================================================================
