//! Request/response snapshots.
//!
//! [`Params`] captures exactly one request attempt and, once obtained, its
//! response. It is built by the pipeline, never mutated afterwards, and shared
//! read-only (behind an `Arc`) with whatever error ends up describing the call.

use std::collections::BTreeMap;
use std::time::Duration;

use http::{HeaderMap, Method, StatusCode};
use serde_json::{Map, Value};

/// Query string parameters, in order.
pub type Query = Vec<(String, String)>;

/// Diagnostic key/value view of a call.
pub type Metadata = BTreeMap<String, Value>;

/// The request half of a call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Query,
    body: Option<Value>,
}

impl Request {
    /// Creates a request without headers, query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    /// Replaces the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the query parameters.
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Processed path (common prefix already joined).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Query parameters.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// JSON body, if any.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// `METHOD path`, as used in log lines and metadata.
    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Diagnostic view of the request.
    pub fn metadata(&self) -> Metadata {
        let query = self
            .query
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect::<Map<_, _>>();
        Metadata::from([
            ("request_line".to_owned(), Value::String(self.line())),
            ("request_headers".to_owned(), headers_to_json(&self.headers)),
            ("request_query".to_owned(), Value::Object(query)),
            (
                "request_body".to_owned(),
                self.body.clone().unwrap_or(Value::Null),
            ),
        ])
    }
}

/// The response half of a call, as produced by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    data: Option<Value>,
    timing: Duration,
}

impl Response {
    /// Creates a response with a parsed body (`None` when the body is absent).
    pub fn new(status: StatusCode, data: Option<Value>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            data,
            timing: Duration::ZERO,
        }
    }

    /// Replaces the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets how long the call took.
    pub fn with_timing(mut self, timing: Duration) -> Self {
        self.timing = timing;
        self
    }

    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Parsed body. `None` means the body was empty.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Consumes the response, returning the parsed body.
    pub fn into_data(self) -> Option<Value> {
        self.data
    }

    /// Wall-clock duration of the call.
    pub fn timing(&self) -> Duration {
        self.timing
    }

    /// Diagnostic view of the response.
    pub fn metadata(&self) -> Metadata {
        Metadata::from([
            (
                "response_status".to_owned(),
                Value::from(self.status.as_u16()),
            ),
            (
                "response_headers".to_owned(),
                headers_to_json(&self.headers),
            ),
            (
                "response_body".to_owned(),
                self.data.clone().unwrap_or(Value::Null),
            ),
            (
                "duration".to_owned(),
                Value::from(self.timing.as_secs_f64()),
            ),
        ])
    }
}

/// Immutable snapshot of one request attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    request: Request,
    response: Option<Response>,
}

impl Params {
    /// Snapshots a request and, if one was obtained, its response.
    pub fn new(request: Request, response: Option<Response>) -> Self {
        Self { request, response }
    }

    /// The request that was sent.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The response, absent when the transport failed.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Request metadata merged with response metadata.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = self.request.metadata();
        if let Some(response) = &self.response {
            metadata.extend(response.metadata());
        }
        metadata
    }
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut object = Map::new();
    for name in headers.keys() {
        let mut values = headers
            .get_all(name)
            .iter()
            .map(|value| Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect::<Vec<_>>();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        object.insert(name.as_str().to_owned(), value);
    }
    Value::Object(object)
}
