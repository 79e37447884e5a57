#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! Declarative error handling for HTTP API clients.
//!
//! A client declares rules (status code and JSON body conditions paired with
//! a handler) in a [`Registry`]. Every call made through [`ApiClient`] is
//! executed by the client's [`Transport`], then verified: the first matching
//! rule, newest first, decides whether the body is returned or a typed error
//! is raised.
//!
//! ```
//! use verdict::{ClientError, Registry, RuleOptions};
//!
//! let mut registry = Registry::new();
//! registry
//!     .error_handling(RuleOptions::new().status_code(400..=499).raise::<ClientError>())
//!     .unwrap();
//! ```

/// Client trait and verb methods.
pub mod client;

/// Client connection settings.
pub mod config;

/// Error types returned by calls and rule compilation.
///
/// Defines [`Error`] which covers:
/// - Classified errors raised by rules
/// - Network errors raised by the transport
/// - Unknown named handlers and other propagated failures
pub mod error;

/// Per-call logger handed to handler blocks.
pub mod logger;

pub mod pipeline;

pub mod registry;

pub mod rule;

pub use client::ApiClient;
pub use config::{ClientConfig, join_path};
pub use error::{CompileError, Error};
pub use logger::RequestLogger;
pub use pipeline::State;
pub use registry::{Registry, Rules};
pub use rule::{Block, Handler, Raiser, ResponseMatcher, Rule, RuleOptions};

pub use verdict_core::{
    BoxError, ClassifiedError, ClientError, Condition, ErrorClass, JsonPath, JsonPathError,
    Metadata, NetworkError, Numeric, Params, Probe, Query, Request, RequestError, Response,
    ServerError, Transport, TransportError, TransportErrorKind, TransportFailure, error_class,
};
