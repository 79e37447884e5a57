//! Error model.
//!
//! Two families of failure reach a caller:
//!
//! - **Classified** errors are raised when a rule matches a response. Each
//!   error type implements [`ErrorClass`] and carries the call's [`Params`].
//!   The pipeline moves them around type-erased as [`ClassifiedError`].
//! - **Network** errors ([`NetworkError`]) are raised when the transport fails
//!   before any response exists. They carry the original [`TransportError`].
//!
//! New error classes are declared with [`error_class!`](crate::error_class):
//!
//! ```
//! use std::sync::Arc;
//! use verdict_core::{ClassifiedError, ErrorClass, Params, error_class};
//!
//! error_class! {
//!     /// The API refused the request because of rate limiting.
//!     pub struct ApiLimitError => "API limit reached";
//! }
//!
//! let error = ClassifiedError::new(ApiLimitError::from_params(Arc::new(Params::default())));
//! assert!(error.is::<ApiLimitError>());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::params::{Metadata, Params};
use crate::transport::TransportError;

/// Type-erased error used for failures that are propagated unmodified.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A typed error a rule can raise.
///
/// Implementors are constructed from the [`Params`] of the call that
/// triggered them. Use [`error_class!`](crate::error_class) rather than
/// implementing this by hand.
pub trait ErrorClass: std::error::Error + Any + Send + Sync {
    /// Builds the error for the given call.
    fn from_params(params: Arc<Params>) -> Self
    where
        Self: Sized;

    /// The call this error describes.
    fn params(&self) -> &Arc<Params>;

    /// Diagnostic view of the call.
    fn metadata(&self) -> Metadata {
        self.params().metadata()
    }

    /// Name of the concrete error type.
    fn class_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Erases the error into an owned `Any`.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

/// Declares one or more [`ErrorClass`] types.
///
/// Each generated struct holds an `Arc<Params>`, implements `Display`
/// (`"<message>: <request line> (<status>)"`), `std::error::Error` and
/// [`ErrorClass`].
#[macro_export]
macro_rules! error_class {
    ($($(#[$meta:meta])* $vis:vis struct $name:ident => $message:literal;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone)]
            $vis struct $name {
                params: ::std::sync::Arc<$crate::Params>,
            }

            impl $name {
                /// Creates the error for the given call.
                pub fn new(params: impl Into<::std::sync::Arc<$crate::Params>>) -> Self {
                    Self {
                        params: params.into(),
                    }
                }
            }

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    write!(f, "{}: {}", $message, self.params.request().line())?;
                    if let Some(response) = self.params.response() {
                        write!(f, " ({})", response.status())?;
                    }
                    Ok(())
                }
            }

            impl ::std::error::Error for $name {}

            impl $crate::ErrorClass for $name {
                fn from_params(params: ::std::sync::Arc<$crate::Params>) -> Self {
                    Self { params }
                }

                fn params(&self) -> &::std::sync::Arc<$crate::Params> {
                    &self.params
                }

                fn into_any(
                    self: ::std::boxed::Box<Self>,
                ) -> ::std::boxed::Box<dyn ::std::any::Any + Send + Sync> {
                    self
                }
            }
        )+
    };
}

error_class! {
    /// Base classified error, raised by rules that do not name another type.
    pub struct RequestError => "request failed";
    /// 4xx-style failure.
    pub struct ClientError => "client error";
    /// 5xx-style failure.
    pub struct ServerError => "server error";
}

/// A raised [`ErrorClass`] with its concrete type erased.
pub struct ClassifiedError(Box<dyn ErrorClass>);

impl ClassifiedError {
    /// Erases the concrete type of `error`.
    pub fn new<E: ErrorClass>(error: E) -> Self {
        Self(Box::new(error))
    }

    /// Whether the concrete type is exactly `E`.
    pub fn is<E: ErrorClass>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    /// Borrows the concrete error if it is an `E`.
    pub fn downcast_ref<E: ErrorClass>(&self) -> Option<&E> {
        let any: &dyn Any = &*self.0;
        any.downcast_ref::<E>()
    }

    /// Takes the concrete error out if it is an `E`.
    pub fn downcast<E: ErrorClass>(self) -> Option<E> {
        self.0.into_any().downcast::<E>().ok().map(|error| *error)
    }

    /// The call this error describes.
    pub fn params(&self) -> &Arc<Params> {
        self.0.params()
    }

    /// Diagnostic view of the call.
    pub fn metadata(&self) -> Metadata {
        self.0.metadata()
    }

    /// Name of the concrete error type.
    pub fn class_name(&self) -> &'static str {
        self.0.class_name()
    }

    /// Returns the boxed error.
    pub fn into_inner(self) -> Box<dyn ErrorClass> {
        self.0
    }
}

impl<E: ErrorClass> From<E> for ClassifiedError {
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// The transport failed before a response existed.
#[derive(Debug, Clone, Error)]
#[error("network error on {}: {original_error}", .params.request().line())]
pub struct NetworkError {
    params: Arc<Params>,
    #[source]
    original_error: TransportError,
}

impl NetworkError {
    /// Wraps a transport failure.
    pub fn new(params: impl Into<Arc<Params>>, original_error: TransportError) -> Self {
        Self {
            params: params.into(),
            original_error,
        }
    }

    /// The call that failed. It never has a response attached.
    pub fn params(&self) -> &Arc<Params> {
        &self.params
    }

    /// The failure the transport reported.
    pub fn original_error(&self) -> &TransportError {
        &self.original_error
    }

    /// Params metadata plus the original error.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = self.params.metadata();
        metadata.insert(
            "original_error".to_owned(),
            format!("{:?}", self.original_error).into(),
        );
        metadata
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::params::{Request, Response};
    use crate::transport::TransportErrorKind;

    fn params(status: Option<StatusCode>) -> Arc<Params> {
        Arc::new(Params::new(
            Request::new(Method::GET, "/v1/users"),
            status.map(|status| Response::new(status, None)),
        ))
    }

    #[test]
    fn test_display_includes_request_and_status() {
        let error = ClientError::new(params(Some(StatusCode::FORBIDDEN)));
        assert_eq!(
            error.to_string(),
            "client error: GET /v1/users (403 Forbidden)"
        );
        let error = RequestError::new(params(None));
        assert_eq!(error.to_string(), "request failed: GET /v1/users");
    }

    #[test]
    fn test_classified_downcast_is_exact() {
        let error = ClassifiedError::new(ClientError::new(params(Some(StatusCode::NOT_FOUND))));
        assert!(error.is::<ClientError>());
        assert!(!error.is::<ServerError>());
        assert!(!error.is::<RequestError>());
        assert!(error.class_name().ends_with("ClientError"));
        let client = error.downcast_ref::<ClientError>().unwrap();
        assert_eq!(client.params(), error.params());

        let params = Arc::clone(error.params());
        let owned = error.downcast::<ClientError>().unwrap();
        assert_eq!(owned.params(), &params);
    }

    #[test]
    fn test_owned_downcast_to_other_class_is_none() {
        let error = ClassifiedError::new(ServerError::new(params(None)));
        assert!(error.downcast::<ClientError>().is_none());
    }

    #[test]
    fn test_classified_metadata_comes_from_params() {
        let error = ClassifiedError::from(ServerError::new(params(Some(
            StatusCode::SERVICE_UNAVAILABLE,
        ))));
        assert_eq!(error.metadata()["response_status"], json!(503));
    }

    #[test]
    fn test_network_error_metadata_adds_original_error() {
        let original = TransportError::new(TransportErrorKind::OpenTimeout, "execution expired");
        let error = NetworkError::new(params(None), original.clone());
        assert_eq!(error.original_error(), &original);
        assert!(error.params().response().is_none());

        let mut expected = error.params().metadata();
        expected.insert("original_error".to_owned(), json!(format!("{original:?}")));
        assert_eq!(error.metadata(), expected);
    }

    #[test]
    fn test_network_error_source_is_original() {
        let original = TransportError::new(TransportErrorKind::ConnectionReset, "reset by peer");
        let error = NetworkError::new(params(None), original);
        let source = std::error::Error::source(&error).unwrap();
        assert_eq!(source.to_string(), "connection reset: reset by peer");
    }
}
