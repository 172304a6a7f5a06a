//! Protocol message types and codec.
//!
//! This module defines the wire format spoken over the DevTools WebSocket
//! endpoint: outbound command envelopes and inbound responses and events.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`Envelope`] | Client → Browser | Command invocation |
//! | [`Response`] | Browser → Client | Command result, correlated by `id` |
//! | [`Event`] | Browser → Client | Unsolicited notification |
//!
//! # Method Naming
//!
//! Commands and events follow `Domain.name` format:
//!
//! - `Target.attachToTarget`
//! - `Page.navigate`
//! - `Network.requestWillBeSent`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Outbound envelope and encoding |
//! | `message` | Inbound decoding (responses, events) |
//! | `target` | Target domain commands and payloads |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command envelope.
pub mod envelope;

/// Inbound message decoding.
pub mod message;

/// Target domain commands and payloads.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::Envelope;
pub use message::{CdpError, Event, InboundMessage, Response, ResponsePayload, decode};
pub use target::{
    AttachToTargetResult, CreateTargetResult, GetTargetsResult, TargetCommand, TargetInfo,
};
