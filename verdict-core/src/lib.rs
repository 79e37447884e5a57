#![warn(missing_docs)]
//! # verdict-core
//!
//! Core types for the verdict HTTP API client framework.
//!
//! This crate provides the leaf building blocks that the rule engine in
//! `verdict` is assembled from. Nothing in here performs I/O; the transport
//! is only described by the [`Transport`] trait.
//!
//! ## Architecture
//!
//! A client call flows through these types:
//!
//! - **Describe** the call ([`Request`]) and what came back ([`Response`])
//! - **Snapshot** both into immutable [`Params`] for diagnostics
//! - **Match** values against declarative conditions ([`Condition`])
//! - **Extract** values from JSON bodies ([`JsonPath`])
//! - **Classify** failures into typed errors ([`ErrorClass`], [`NetworkError`])
//! - **Execute** the network call ([`Transport`])

pub mod condition;
pub mod error;
pub mod json_path;
pub mod params;
pub mod transport;

pub use condition::{Condition, Numeric, Probe};
pub use error::{
    BoxError, ClassifiedError, ClientError, ErrorClass, NetworkError, RequestError, ServerError,
};
pub use json_path::{JsonPath, JsonPathError, Resolve, Segment};
pub use params::{Metadata, Params, Query, Request, Response};
pub use transport::{Transport, TransportError, TransportErrorKind, TransportFailure};

#[doc(hidden)]
pub use smol_str::SmolStr;
