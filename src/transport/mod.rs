//! WebSocket transport and connection dispatcher.
//!
//! This module owns the physical channel to the browser's debugger
//! endpoint and the single read loop that multiplexes it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  Sessions (Rust) │                              │  Browser        │
//! │                  │         WebSocket            │  (DevTools      │
//! │  Connection      │◄────────────────────────────►│   endpoint)     │
//! │  └─ event loop   │   ws://host:port/devtools/…  │                 │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::connect` - Dial the browser's WebSocket debugger URL
//! 2. `Connection::new` - Spawn the dispatcher event loop
//! 3. Send commands, receive responses and events for every session
//! 4. `Connection::close` - Fail pending calls, end event streams
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Dispatcher: correlation, event fan-out, lifecycle |
//! | `websocket` | Physical channel: dial, frame IO, idempotent close |

// ============================================================================
// Submodules
// ============================================================================

/// Connection dispatcher and event loop.
pub mod connection;

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventStream};
pub use websocket::Transport;
