use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings of an API client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://api.example.com`.
    pub endpoint: String,
    /// Prefix joined in front of every call path.
    #[serde(default)]
    pub common_path: String,
    /// Maximum time to wait for a response.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<Duration>,
    /// Maximum time to wait for a connection.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub open_timeout: Option<Duration>,
    /// Headers sent with every call.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Config for `endpoint` with no prefix, timeouts or headers.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Sets the common path prefix.
    pub fn common_path(mut self, common_path: impl Into<String>) -> Self {
        self.common_path = common_path.into();
        self
    }

    /// Sets the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Sets the open timeout.
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = Some(timeout);
        self
    }

    /// Adds a default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Joins the common prefix and `path`.
    pub fn join_path(&self, path: &str) -> String {
        join_path(&self.common_path, path)
    }
}

/// Joins `common_path` and `path` with `/`, collapsing repeated slashes.
///
/// ```
/// assert_eq!(verdict::join_path("/v1/", "/users"), "/v1/users");
/// assert_eq!(verdict::join_path("", "users"), "/users");
/// ```
pub fn join_path(common_path: &str, path: &str) -> String {
    let mut joined = String::with_capacity(common_path.len() + path.len() + 1);
    for c in common_path.chars().chain(['/']).chain(path.chars()) {
        if c == '/' && joined.ends_with('/') {
            continue;
        }
        joined.push(c);
    }
    joined
}
