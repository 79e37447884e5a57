//! [reqwest] transport for verdict API clients.
//!
//! [`ReqwestTransport`] turns a [`ClientConfig`](verdict::ClientConfig) into
//! real HTTP calls: the endpoint and default headers are applied to every
//! request, the open and read timeouts bound each call, and failures are
//! sorted into the network errors the pipeline recognizes.

mod error;
mod transport;

pub use error::{BuildError, classify};
pub use transport::{ReqwestTransport, parse_body};
