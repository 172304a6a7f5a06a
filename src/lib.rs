//! Chromium CDP - Chrome DevTools Protocol client library.
//!
//! This library speaks the Chrome DevTools Protocol (CDP): JSON over
//! WebSocket against the debugger endpoint of Chromium-based browsers.
//!
//! # Architecture
//!
//! One physical connection carries many logical sessions:
//!
//! - **Local End (Rust)**: Sends command envelopes, receives responses and events
//! - **Remote End (Browser)**: Executes commands, emits events per session
//!
//! Key design principles:
//!
//! - One read-loop task per [`Connection`], many concurrent callers
//! - Commands correlated by monotonically increasing numeric ID
//! - Flattened sessions: one WebSocket, responses and events tagged by session ID
//! - Event-driven architecture (no polling)
//!
//! # Quick Start
//!
//! ```no_run
//! use chromium_cdp::{Browser, HttpClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Discover the root WebSocket URL on the debugging port
//!     let http = HttpClient::new("http://127.0.0.1:9222")?;
//!     let version = http.version().await?;
//!
//!     // Connect and attach to the first page target
//!     let browser = Browser::connect(&version.web_socket_debugger_url).await?;
//!     let targets = browser.targets().await?;
//!     let session = browser.attach_to_target(&targets[0].target_id).await?;
//!
//!     // Issue commands, consume events
//!     session.send_command("Page.enable", None).await?;
//!     let mut loads = session.subscribe("Page.loadEventFired")?;
//!     if let Some(params) = loads.next_event().await {
//!         println!("page loaded: {params}");
//!     }
//!
//!     browser.close();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Session entities: [`Browser`], [`Session`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`http`] | HTTP metadata endpoints (`/json/version`, `/json/list`) |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message types and codec (internal) |
//! | [`transport`] | WebSocket transport and dispatcher (internal) |
//!
//! # Scope
//!
//! This crate is the transport and session substrate every CDP domain
//! flows through. Typed per-domain command bindings are generated from
//! the protocol schema and layered on top; they wrap
//! [`Session::send_command`] and [`Session::subscribe`].

// ============================================================================
// Modules
// ============================================================================

/// Session entities: Browser, Session.
///
/// This module contains the caller-facing handles:
///
/// - [`Browser`] - Root session (owns the connection)
/// - [`Session`] - Attached target session
pub mod browser;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// HTTP metadata endpoints of the debugging port.
///
/// Use [`HttpClient`] to discover WebSocket URLs and enumerate targets.
pub mod http;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Protocol message types and codec.
///
/// Internal module defining envelope/response/event structures.
pub mod protocol;

/// WebSocket transport and connection dispatcher.
///
/// Internal module handling the physical channel and the read loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use browser::{Browser, ConnectOptions, Session};

// Error types
pub use error::{Error, Result};

// HTTP metadata types
pub use http::{HttpClient, TargetMetadata, VersionInfo};

// Identifier types
pub use identifiers::{CommandId, SessionId, SubscriptionId, TargetId};

// Protocol types
pub use protocol::TargetInfo;

// Transport types
pub use transport::{Connection, EventStream, Transport};
