use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;
use verdict_core::{
    BoxError, ClassifiedError, ErrorClass, JsonPathError, Metadata, NetworkError, Params,
};

/// Everything a client call can fail with.
#[derive(Debug, Error)]
pub enum Error {
    /// A rule matched the response and raised a typed error.
    #[error(transparent)]
    Classified(#[from] ClassifiedError),
    /// The transport failed before a response existed.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// A rule dispatched to a handler the client does not provide.
    #[error("no error handler named `{0}`")]
    UnknownHandler(SmolStr),
    /// Any other failure, propagated unmodified.
    #[error(transparent)]
    Other(BoxError),
}

impl Error {
    /// Raises a classified error of type `E`.
    pub fn raise<E: ErrorClass>(error: E) -> Self {
        Error::Classified(ClassifiedError::new(error))
    }

    /// Wraps an arbitrary failure.
    pub fn other(error: impl Into<BoxError>) -> Self {
        Error::Other(error.into())
    }

    /// Whether this is a classified error of exactly type `E`.
    pub fn is<E: ErrorClass>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    /// Borrows the classified error if it is an `E`.
    pub fn downcast_ref<E: ErrorClass>(&self) -> Option<&E> {
        match self {
            Error::Classified(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Borrows the network error, if this is one.
    pub fn as_network(&self) -> Option<&NetworkError> {
        match self {
            Error::Network(error) => Some(error),
            _ => None,
        }
    }

    /// The call this error describes, for classified and network errors.
    pub fn params(&self) -> Option<&Arc<Params>> {
        match self {
            Error::Classified(error) => Some(error.params()),
            Error::Network(error) => Some(error.params()),
            Error::UnknownHandler(_) | Error::Other(_) => None,
        }
    }

    /// Diagnostic view of the call, for classified and network errors.
    pub fn metadata(&self) -> Option<Metadata> {
        match self {
            Error::Classified(error) => Some(error.metadata()),
            Error::Network(error) => Some(error.metadata()),
            Error::UnknownHandler(_) | Error::Other(_) => None,
        }
    }
}

/// Error returned when rule options cannot be compiled.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A `json` condition names an unparsable path.
    #[error(transparent)]
    JsonPath(#[from] JsonPathError),
}
