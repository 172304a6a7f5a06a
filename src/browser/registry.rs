//! Session registry.
//!
//! Tracks the hierarchy of logical sessions sharing one connection: the
//! root browser session plus zero or more attached target sessions. The
//! tree is explicit, keyed by session ID with a back-reference to the
//! parent; closing a session closes its whole subtree.
//!
//! A session ID, once assigned by the browser, is unique among open
//! sessions on the connection, but may be reused after the original
//! session closes. Entries are therefore removed eagerly on close, before
//! any reuse can be observed.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::identifiers::{SessionId, TargetId};

// ============================================================================
// SessionEntry
// ============================================================================

/// Registry record for one open session.
struct SessionEntry {
    /// Parent session; `None` for sessions attached from the root.
    parent: Option<SessionId>,
    /// Target the session is attached to.
    target_id: TargetId,
    /// Target type, when known from enumeration.
    target_type: Option<String>,
}

// ============================================================================
// SessionRegistry
// ============================================================================

/// The session tree for one connection.
///
/// Presence in the registry is the open flag: a session is `Open` while
/// its entry exists and `Closed` (terminal) once removed. Operations on a
/// removed session fail with `SessionClosed`.
#[derive(Default)]
pub(crate) struct SessionRegistry {
    /// Open sessions by ID.
    entries: RwLock<FxHashMap<SessionId, SessionEntry>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly attached session.
    ///
    /// Called once the attach response carries the browser-assigned ID;
    /// this is the `Attaching -> Open` transition.
    pub fn register(
        &self,
        session_id: SessionId,
        parent: Option<SessionId>,
        target_id: TargetId,
        target_type: Option<String>,
    ) {
        debug!(session = %session_id, target_id = %target_id, "Session opened");

        self.entries.write().insert(
            session_id,
            SessionEntry {
                parent,
                target_id,
                target_type,
            },
        );
    }

    /// Returns `true` while the session is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self, session_id: &SessionId) -> bool {
        self.entries.read().contains_key(session_id)
    }

    /// Returns the target type recorded for a session, if known.
    #[must_use]
    pub fn target_type(&self, session_id: &SessionId) -> Option<String> {
        self.entries
            .read()
            .get(session_id)
            .and_then(|entry| entry.target_type.clone())
    }

    /// Returns the number of open sessions.
    #[inline]
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Closes a session and every descendant, removing their entries.
    ///
    /// Returns the IDs that were closed, in no particular order. Closing
    /// an already-closed session is a no-op returning an empty list.
    pub fn close_subtree(&self, session_id: &SessionId) -> Vec<SessionId> {
        let mut entries = self.entries.write();

        if !entries.contains_key(session_id) {
            return Vec::new();
        }

        let mut closed = vec![session_id.clone()];
        let mut frontier = vec![session_id.clone()];

        while let Some(current) = frontier.pop() {
            let children: Vec<SessionId> = entries
                .iter()
                .filter(|(_, entry)| entry.parent.as_ref() == Some(&current))
                .map(|(id, _)| id.clone())
                .collect();

            for child in children {
                closed.push(child.clone());
                frontier.push(child);
            }
        }

        for id in &closed {
            entries.remove(id);
        }

        debug!(count = closed.len(), root = %session_id, "Session subtree closed");
        closed
    }

    /// Closes every session at once.
    ///
    /// Called when the connection closes: no session survives it.
    pub fn close_all(&self) -> Vec<SessionId> {
        let mut entries = self.entries.write();
        let closed: Vec<SessionId> = entries.drain().map(|(id, _)| id).collect();

        if !closed.is_empty() {
            debug!(count = closed.len(), "All sessions closed");
        }
        closed
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session(raw: &str) -> SessionId {
        SessionId::new(raw).expect("valid session id")
    }

    fn target(raw: &str) -> TargetId {
        TargetId::new(raw).expect("valid target id")
    }

    /// Builds:  A ── B ── C   plus a sibling D under A's parent (root).
    fn populated() -> SessionRegistry {
        let registry = SessionRegistry::new();
        registry.register(session("A"), None, target("tA"), Some("page".into()));
        registry.register(session("B"), Some(session("A")), target("tB"), None);
        registry.register(session("C"), Some(session("B")), target("tC"), None);
        registry.register(session("D"), None, target("tD"), None);
        registry
    }

    #[test]
    fn test_register_opens_session() {
        let registry = populated();

        assert!(registry.is_open(&session("A")));
        assert_eq!(registry.open_count(), 4);
        assert_eq!(registry.target_type(&session("A")), Some("page".into()));
        assert_eq!(registry.target_type(&session("B")), None);
    }

    #[test]
    fn test_close_subtree_closes_descendants() {
        let registry = populated();

        let mut closed = registry.close_subtree(&session("A"));
        closed.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        assert_eq!(closed, vec![session("A"), session("B"), session("C")]);
        assert!(!registry.is_open(&session("A")));
        assert!(!registry.is_open(&session("C")));
        assert!(registry.is_open(&session("D")));
    }

    #[test]
    fn test_close_subtree_of_leaf() {
        let registry = populated();

        let closed = registry.close_subtree(&session("C"));

        assert_eq!(closed, vec![session("C")]);
        assert!(registry.is_open(&session("B")));
    }

    #[test]
    fn test_close_is_idempotent() {
        let registry = populated();

        registry.close_subtree(&session("A"));
        let second = registry.close_subtree(&session("A"));

        assert!(second.is_empty());
    }

    #[test]
    fn test_close_all() {
        let registry = populated();

        let closed = registry.close_all();

        assert_eq!(closed.len(), 4);
        assert_eq!(registry.open_count(), 0);
    }

    #[test]
    fn test_session_id_reuse_after_close() {
        let registry = populated();
        registry.close_subtree(&session("A"));

        // The browser may hand the same ID out again; a fresh registration
        // must behave like a brand-new session.
        registry.register(session("A"), None, target("tX"), None);
        assert!(registry.is_open(&session("A")));
        assert_eq!(registry.close_subtree(&session("A")), vec![session("A")]);
    }
}
