use std::fmt::Display;

use http::Method;
use tracing::{error, info, warn};

/// Logs lines about a single call, tagged with its method and path.
///
/// Handler blocks receive one of these so their messages carry the same
/// context as the pipeline's own `Start`/`Duration`/`Success` lines.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    method: Method,
    path: String,
}

impl RequestLogger {
    /// Creates a logger for `method path`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Method of the call being logged.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path of the call being logged.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Logs at info level.
    pub fn info(&self, message: impl Display) {
        info!(method = %self.method, path = %self.path, "{message}");
    }

    /// Logs at warn level.
    pub fn warn(&self, message: impl Display) {
        warn!(method = %self.method, path = %self.path, "{message}");
    }

    /// Logs at error level.
    pub fn error(&self, message: impl Display) {
        error!(method = %self.method, path = %self.path, "{message}");
    }
}
