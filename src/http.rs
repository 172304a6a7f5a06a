//! HTTP metadata endpoints of the debugging port.
//!
//! Chromium exposes a small REST surface next to the WebSocket endpoint.
//! This client covers the calls needed to discover the browser's
//! debugger URL and enumerate attachable targets; everything stateful
//! goes over the WebSocket connection.
//!
//! # Endpoints
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /json/version` | Browser build and root WebSocket URL |
//! | `GET /json/list` | Attachable targets with per-target URLs |
//! | `PUT /json/new` | Open a new tab |
//! | `GET /json/close/{id}` | Close a target |
//! | `GET /json/activate/{id}` | Bring a target to the foreground |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::TargetId;

// ============================================================================
// VersionInfo
// ============================================================================

/// Response of `GET /json/version`.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    /// Browser name and version, e.g. `Chrome/126.0.6478.62`.
    #[serde(rename = "Browser")]
    pub browser: String,

    /// DevTools protocol version, e.g. `1.3`.
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,

    /// Browser user agent string.
    #[serde(rename = "User-Agent", default)]
    pub user_agent: String,

    /// V8 engine version.
    #[serde(rename = "V8-Version", default)]
    pub v8_version: Option<String>,

    /// WebKit revision.
    #[serde(rename = "WebKit-Version", default)]
    pub webkit_version: Option<String>,

    /// WebSocket URL of the root browser session.
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

// ============================================================================
// TargetMetadata
// ============================================================================

/// One entry of `GET /json/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMetadata {
    /// Target ID.
    pub id: String,

    /// Target type: `page`, `iframe`, `worker`, ...
    #[serde(rename = "type")]
    pub target_type: String,

    /// Target title.
    #[serde(default)]
    pub title: String,

    /// Target URL.
    #[serde(default)]
    pub url: String,

    /// Per-target WebSocket URL, for the connection-per-target flow.
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,

    /// DevTools frontend URL.
    #[serde(default)]
    pub devtools_frontend_url: Option<String>,
}

impl TargetMetadata {
    /// Returns the entry's ID as a [`TargetId`].
    #[must_use]
    pub fn target_id(&self) -> Option<TargetId> {
        TargetId::new(self.id.clone())
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// Client for the debugging port's HTTP metadata endpoints.
///
/// Explicitly constructed and passed around; no process-wide singleton.
/// Supply your own [`reqwest::Client`] via
/// [`with_client`](Self::with_client) to share connection pools.
///
/// # Example
///
/// ```no_run
/// use chromium_cdp::{Browser, HttpClient};
///
/// # async fn example() -> chromium_cdp::Result<()> {
/// let http = HttpClient::new("http://127.0.0.1:9222")?;
/// let version = http.version().await?;
/// let browser = Browser::connect(&version.web_socket_debugger_url).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Debugging port base URL.
    base: Url,
    /// Underlying HTTP client.
    client: reqwest::Client,
}

impl HttpClient {
    /// Creates a client for a debugging port base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL does not parse or is not
    /// `http`/`https`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client reusing an existing [`reqwest::Client`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL does not parse or is not
    /// `http`/`https`.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| Error::invalid_url(base_url, e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::invalid_url(
                base_url,
                "expected http:// or https:// scheme",
            ));
        }

        Ok(Self { base, client })
    }

    /// Fetches browser build information and the root WebSocket URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport or status failures.
    pub async fn version(&self) -> Result<VersionInfo> {
        let url = self.endpoint("/json/version")?;
        let version: VersionInfo = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(browser = %version.browser, "Fetched version info");
        Ok(version)
    }

    /// Enumerates attachable targets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport or status failures.
    pub async fn list_targets(&self) -> Result<Vec<TargetMetadata>> {
        let url = self.endpoint("/json/list")?;
        let targets: Vec<TargetMetadata> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(count = targets.len(), "Listed targets");
        Ok(targets)
    }

    /// Opens a new tab, optionally at a URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport or status failures.
    pub async fn new_tab(&self, url: Option<&str>) -> Result<TargetMetadata> {
        let mut endpoint = self.endpoint("/json/new")?;
        endpoint.set_query(url);

        let target: TargetMetadata = self
            .client
            .put(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(target_id = %target.id, "Opened new tab");
        Ok(target)
    }

    /// Closes a target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport or status failures, including
    /// an unknown target ID.
    pub async fn close_target(&self, target_id: &TargetId) -> Result<()> {
        let url = self.endpoint(&format!("/json/close/{target_id}"))?;
        self.client.get(url).send().await?.error_for_status()?;

        debug!(target_id = %target_id, "Close requested");
        Ok(())
    }

    /// Brings a target to the foreground.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport or status failures.
    pub async fn activate_target(&self, target_id: &TargetId) -> Result<()> {
        let url = self.endpoint(&format!("/json/activate/{target_id}"))?;
        self.client.get(url).send().await?.error_for_status()?;
        Ok(())
    }

    /// Joins a path onto the base URL.
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::invalid_url(self.base.as_str(), e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ws_base_url() {
        let err = HttpClient::new("ws://127.0.0.1:9222").expect_err("bad scheme");
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_endpoint_join() {
        let client = HttpClient::new("http://127.0.0.1:9222").expect("valid base");
        let url = client.endpoint("/json/version").expect("join");
        assert_eq!(url.as_str(), "http://127.0.0.1:9222/json/version");
    }

    #[test]
    fn test_version_info_deserialization() {
        let json_str = r#"{
            "Browser": "Chrome/126.0.6478.62",
            "Protocol-Version": "1.3",
            "User-Agent": "Mozilla/5.0",
            "V8-Version": "12.6.228.13",
            "WebKit-Version": "537.36",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
        }"#;

        let version: VersionInfo = serde_json::from_str(json_str).expect("parse");
        assert_eq!(version.browser, "Chrome/126.0.6478.62");
        assert_eq!(version.protocol_version, "1.3");
        assert!(version.web_socket_debugger_url.starts_with("ws://"));
    }

    #[test]
    fn test_target_metadata_deserialization() {
        let json_str = r#"[{
            "id": "F2A8",
            "type": "page",
            "title": "Example",
            "url": "https://example.com",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/F2A8"
        }]"#;

        let targets: Vec<TargetMetadata> = serde_json::from_str(json_str).expect("parse");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].target_type, "page");
        assert_eq!(
            targets[0].target_id().expect("target id").as_str(),
            "F2A8"
        );
    }
}
