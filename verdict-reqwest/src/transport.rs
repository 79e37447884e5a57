use std::time::Instant;

use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, trace};
use verdict::{ClientConfig, Request, Response, Transport, TransportFailure};

use crate::error::{BuildError, classify};

/// [`Transport`] backed by a [`reqwest::Client`].
///
/// The client is built lazily on first use from the [`ClientConfig`] and
/// shared by every call afterwards.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use verdict::ClientConfig;
/// use verdict_reqwest::ReqwestTransport;
///
/// let transport = ReqwestTransport::new(
///     ClientConfig::new("https://api.example.com")
///         .read_timeout(Duration::from_secs(30))
///         .open_timeout(Duration::from_secs(5)),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    config: ClientConfig,
    client: OnceCell<reqwest::Client>,
}

impl ReqwestTransport {
    /// Transport for `config`. The underlying client is built on first use.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Transport using a prepared client. Timeouts and default headers from
    /// `config` are not applied to it.
    pub fn with_client(config: ClientConfig, client: reqwest::Client) -> Self {
        Self {
            config,
            client: OnceCell::new_with(Some(client)),
        }
    }

    /// Connection settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds the underlying client if needed and returns it.
    pub async fn client(&self) -> Result<&reqwest::Client, BuildError> {
        self.client
            .get_or_try_init(|| async {
                trace!(endpoint = %self.config.endpoint, "Initialize reqwest client");
                build_client(&self.config)
            })
            .await
    }

    fn url(&self, request: &Request) -> String {
        format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            request.path().trim_start_matches('/')
        )
    }
}

fn build_client(config: &ClientConfig) -> Result<reqwest::Client, BuildError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| BuildError::HeaderName(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| BuildError::HeaderValue(name.clone()))?;
        headers.insert(header_name, header_value);
    }

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout) = config.read_timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = config.open_timeout {
        builder = builder.connect_timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Parses a response body the way the pipeline expects it.
///
/// An empty body (or a literal `null`) is absent. A body that is not JSON is
/// kept as a string.
pub fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &Request) -> Result<Response, TransportFailure> {
        let client = self.client().await?;
        let url = self.url(request);
        debug!(%url, "Sending request");

        let mut builder = client
            .request(request.method().clone(), &url)
            .headers(request.headers().clone());
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(classify)?;
        let timing = started.elapsed();

        Ok(Response::new(status, parse_body(&bytes))
            .with_headers(headers)
            .with_timing(timing))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b""), None);
        assert_eq!(parse_body(b"  \n"), None);
        assert_eq!(parse_body(b"null"), None);
        assert_eq!(parse_body(br#"{"a":[1,2]}"#), Some(json!({"a": [1, 2]})));
        assert_eq!(parse_body(b"42"), Some(json!(42)));
        assert_eq!(parse_body(b"<html>"), Some(json!("<html>")));
    }

    #[test]
    fn test_url_joins_endpoint_and_path() {
        let transport = ReqwestTransport::new(ClientConfig::new("https://api.example.com/"));
        let request = Request::new(http::Method::GET, "/v1/users");
        assert_eq!(transport.url(&request), "https://api.example.com/v1/users");
        let request = Request::new(http::Method::GET, "v1/users");
        assert_eq!(transport.url(&request), "https://api.example.com/v1/users");
    }

    #[tokio::test]
    async fn test_invalid_default_header_fails_build() {
        let transport = ReqwestTransport::new(
            ClientConfig::new("http://localhost").header("bad header", "value"),
        );
        let error = transport.client().await.unwrap_err();
        assert!(matches!(error, BuildError::HeaderName(name) if name == "bad header"));
    }
}
