use std::error::Error as StdError;
use std::io;

use thiserror::Error;
use verdict::{TransportError, TransportErrorKind, TransportFailure};

/// Error returned when the underlying client cannot be built from the config.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A default header name is not a valid HTTP header name.
    #[error("invalid header name `{0}`")]
    HeaderName(String),
    /// A default header value contains invalid characters.
    #[error("invalid value for header `{0}`")]
    HeaderValue(String),
    /// reqwest refused the configuration.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

impl From<BuildError> for TransportFailure {
    fn from(error: BuildError) -> Self {
        TransportFailure::Other(Box::new(error))
    }
}

/// Sorts a reqwest failure into the recognized network set, or passes it
/// through as [`TransportFailure::Other`].
pub fn classify(error: reqwest::Error) -> TransportFailure {
    let kind = if error.is_timeout() {
        if error.is_connect() {
            TransportErrorKind::OpenTimeout
        } else {
            TransportErrorKind::ReadTimeout
        }
    } else if let Some(kind) = error.source().and_then(chain_kind) {
        kind
    } else if error.is_connect() {
        TransportErrorKind::ConnectionFailed
    } else {
        return TransportFailure::Other(Box::new(error));
    };
    TransportError::new(kind, render_chain(&error)).into()
}

/// Walks a source chain looking for a TLS or socket failure.
///
/// rustls errors reach here wrapped in an `io::Error`, whose own `source`
/// skips the wrapped error, so the payload is checked separately.
fn chain_kind(error: &(dyn StdError + 'static)) -> Option<TransportErrorKind> {
    let mut source = Some(error);
    while let Some(current) = source {
        if current.is::<rustls::Error>() {
            return Some(TransportErrorKind::Tls);
        }
        if let Some(io) = current.downcast_ref::<io::Error>() {
            if io.get_ref().is_some_and(|inner| inner.is::<rustls::Error>()) {
                return Some(TransportErrorKind::Tls);
            }
            match io.kind() {
                io::ErrorKind::ConnectionRefused => {
                    return Some(TransportErrorKind::ConnectionRefused);
                }
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                    return Some(TransportErrorKind::ConnectionReset);
                }
                io::ErrorKind::TimedOut => return Some(TransportErrorKind::ReadTimeout),
                _ => {}
            }
        }
        source = current.source();
    }
    None
}

fn render_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(current) = source {
        message.push_str(": ");
        message.push_str(&current.to_string());
        source = current.source();
    }
    message
}
