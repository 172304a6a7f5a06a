//! Connection configuration.
//!
//! Options applied when dialing a debugger endpoint. All values have
//! working defaults; use the `with_*` builders to override.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for command execution.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-subscriber event queue capacity.
const DEFAULT_EVENT_BUFFER: usize = 64;

// ============================================================================
// ConnectOptions
// ============================================================================

/// Configuration for a [`Browser`](crate::Browser) connection.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use chromium_cdp::{Browser, ConnectOptions};
///
/// # async fn example() -> chromium_cdp::Result<()> {
/// let options = ConnectOptions::new()
///     .with_command_timeout(Duration::from_secs(10))
///     .with_event_buffer(256);
///
/// let browser = Browser::connect_with("ws://127.0.0.1:9222/devtools/browser/abc", options).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Default timeout for command responses.
    pub(crate) command_timeout: Duration,
    /// Per-subscriber event queue capacity.
    pub(crate) event_buffer: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ConnectOptions {
    /// Creates options with defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default timeout for command responses.
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the per-subscriber event queue capacity.
    ///
    /// When a subscriber's queue is full, further events for it are
    /// dropped with a diagnostic until the consumer catches up.
    #[must_use]
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
