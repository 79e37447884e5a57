//! Scripted transport double.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use verdict::{Request, Response, Transport, TransportError, TransportErrorKind, TransportFailure};

enum Scripted {
    Respond(Response),
    Network(TransportError),
    Other(String),
}

#[derive(Default)]
struct Inner {
    script: VecDeque<Scripted>,
    requests: Vec<Request>,
}

/// A [`Transport`] that answers with scripted outcomes, in order, and
/// remembers every request it was given.
///
/// Clones share the same script and request log. Once the script runs out
/// every call fails with a non-network error.
#[derive(Clone, Default)]
pub struct StubTransport {
    inner: Arc<Mutex<Inner>>,
}

impl StubTransport {
    /// Transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, scripted: Scripted) -> &Self {
        self.inner.lock().unwrap().script.push_back(scripted);
        self
    }

    /// Scripts a response.
    pub fn respond(&self, status: u16, body: impl Into<Option<Value>>) -> &Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.respond_with(Response::new(status, body.into()))
    }

    /// Scripts a response with headers and a timing.
    pub fn respond_full(
        &self,
        status: u16,
        headers: HeaderMap,
        body: impl Into<Option<Value>>,
        timing: Duration,
    ) -> &Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.respond_with(
            Response::new(status, body.into())
                .with_headers(headers)
                .with_timing(timing),
        )
    }

    /// Scripts a prepared response.
    pub fn respond_with(&self, response: Response) -> &Self {
        self.push(Scripted::Respond(response))
    }

    /// Scripts a recognized network failure.
    pub fn fail(&self, kind: TransportErrorKind, message: &str) -> &Self {
        self.push(Scripted::Network(TransportError::new(kind, message)))
    }

    /// Scripts a failure outside the recognized network set.
    pub fn fail_other(&self, message: &str) -> &Self {
        self.push(Scripted::Other(message.to_owned()))
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<Request> {
        self.inner.lock().unwrap().requests.last().cloned()
    }

    /// Number of scripted outcomes not yet played.
    pub fn remaining(&self) -> usize {
        self.inner.lock().unwrap().script.len()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, request: &Request) -> Result<Response, TransportFailure> {
        let scripted = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(request.clone());
            inner.script.pop_front()
        };
        match scripted {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Network(error)) => Err(TransportFailure::Network(error)),
            Some(Scripted::Other(message)) => Err(TransportFailure::Other(message.into())),
            None => Err(TransportFailure::Other(
                format!("no scripted response for {}", request.line()).into(),
            )),
        }
    }
}
