//! Test tooling for verdict clients.
//!
//! - [`StubTransport`] plays back scripted responses and records requests.
//! - [`Stub`] fakes client methods without running the pipeline.
//! - [`LogCapture`] collects the events a call logs.

pub mod stub;
pub mod log_capture;
pub mod transport;

pub use stub::{Stub, StubCall};
pub use log_capture::{CapturedEvent, LogCapture};
pub use transport::StubTransport;
