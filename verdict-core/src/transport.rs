//! The transport collaborator boundary.
//!
//! A [`Transport`] executes one request and either produces a [`Response`] or
//! fails. Failures are split into the recognized network set
//! ([`TransportError`]) and everything else.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::BoxError;
use crate::params::{Request, Response};

/// The recognized set of network-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The connection could not be opened in time.
    OpenTimeout,
    /// The response did not arrive in time.
    ReadTimeout,
    /// The connection could not be established.
    ConnectionFailed,
    /// The peer refused the connection.
    ConnectionRefused,
    /// The peer reset the connection.
    ConnectionReset,
    /// TLS negotiation failed.
    Tls,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::OpenTimeout => "open timeout",
            TransportErrorKind::ReadTimeout => "read timeout",
            TransportErrorKind::ConnectionFailed => "connection failed",
            TransportErrorKind::ConnectionRefused => "connection refused",
            TransportErrorKind::ConnectionReset => "connection reset",
            TransportErrorKind::Tls => "tls error",
        };
        f.write_str(name)
    }
}

/// A network-level failure raised by a transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    /// Creates a transport error.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Kind of failure.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Message reported by the underlying client.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::OpenTimeout | TransportErrorKind::ReadTimeout
        )
    }
}

/// What a transport returns when it cannot produce a [`Response`].
#[derive(Debug, Error)]
pub enum TransportFailure {
    /// A recognized network failure. Surfaces as a `NetworkError`.
    #[error(transparent)]
    Network(#[from] TransportError),
    /// Anything else. Propagated unmodified.
    #[error(transparent)]
    Other(BoxError),
}

/// The HTTP execution collaborator.
///
/// Implementations perform the actual network call and report the status,
/// parsed body and timing. They must be safe to share between concurrent
/// calls on the same client.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use http::StatusCode;
/// use verdict_core::{Request, Response, Transport, TransportFailure};
///
/// struct AlwaysOk;
///
/// #[async_trait]
/// impl Transport for AlwaysOk {
///     async fn execute(&self, _request: &Request) -> Result<Response, TransportFailure> {
///         Ok(Response::new(StatusCode::OK, None))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the call described by `request`.
    async fn execute(&self, request: &Request) -> Result<Response, TransportFailure>;
}

#[async_trait]
impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: &Request) -> Result<Response, TransportFailure> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T> Transport for std::sync::Arc<T>
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: &Request) -> Result<Response, TransportFailure> {
        self.as_ref().execute(request).await
    }
}

#[async_trait]
impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: &Request) -> Result<Response, TransportFailure> {
        self.as_ref().execute(request).await
    }
}
