//! The request pipeline.
//!
//! Every call walks the same states:
//!
//! ```text
//! Building -> Calling -+-> Succeeded -> Verifying -+-> Returning
//!                      |                           +-> Raising
//!                      +-> TransportFailed
//! ```
//!
//! Transitions are logged at debug level inside a `verdict.request` span.
//! Failures the transport does not recognize as network errors leave the
//! pipeline unmodified. So do handler errors that are neither classified nor
//! network errors.

use std::sync::Arc;

use http::{HeaderMap, Method};
use serde_json::Value;
use tracing::{Instrument, debug, info_span};
use verdict_core::{NetworkError, Params, Query, Request, Transport, TransportFailure};

use crate::client::ApiClient;
use crate::config::join_path;
use crate::error::Error;
use crate::logger::RequestLogger;
use crate::rule::Handler;

/// Where a call is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Assembling the request.
    Building,
    /// Waiting for the transport.
    Calling,
    /// A response came back.
    Succeeded,
    /// The transport failed with a network error.
    TransportFailed,
    /// Evaluating rules against the response.
    Verifying,
    /// Handing the body to the caller.
    Returning,
    /// Handing a classified or network error to the caller.
    Raising,
}

fn transition(state: State) {
    debug!(?state, "verdict pipeline");
}

/// Builds the request for `path` under the client's common path and runs it.
pub async fn call<C>(
    client: &C,
    method: Method,
    path: &str,
    headers: HeaderMap,
    query: Query,
    body: Option<Value>,
) -> Result<Option<Value>, Error>
where
    C: ApiClient + ?Sized,
{
    let request = Request::new(method, join_path(client.common_path(), path))
        .with_headers(headers)
        .with_query(query)
        .with_body(body);
    execute(client, request).await
}

/// Runs a fully built request through the transport and the client's rules.
pub async fn execute<C>(client: &C, request: Request) -> Result<Option<Value>, Error>
where
    C: ApiClient + ?Sized,
{
    let span = info_span!(
        "verdict.request",
        method = %request.method(),
        path = %request.path(),
    );
    run(client, request).instrument(span).await
}

async fn run<C>(client: &C, request: Request) -> Result<Option<Value>, Error>
where
    C: ApiClient + ?Sized,
{
    transition(State::Building);
    let logger = RequestLogger::new(request.method().clone(), request.path());
    logger.info("Start");

    transition(State::Calling);
    let response = match Transport::execute(client.transport(), &request).await {
        Ok(response) => response,
        Err(TransportFailure::Network(error)) => {
            transition(State::TransportFailed);
            logger.error(format_args!("Network Error ({error})"));
            let params = Arc::new(Params::new(request, None));
            return Err(NetworkError::new(params, error).into());
        }
        Err(TransportFailure::Other(error)) => return Err(Error::Other(error)),
    };

    transition(State::Succeeded);
    logger.info(format_args!("Duration {} sec", response.timing().as_secs_f64()));
    let status = response.status();
    let params = Arc::new(Params::new(request, Some(response)));

    transition(State::Verifying);
    match verify(client, &params, &logger) {
        Ok(()) => {
            transition(State::Returning);
            logger.info(format_args!("Success ({})", status.as_u16()));
            Ok(params.response().and_then(|response| response.data().cloned()))
        }
        Err(error @ (Error::Classified(_) | Error::Network(_))) => {
            transition(State::Raising);
            logger.warn(format_args!("Failure ({})", status.as_u16()));
            Err(error)
        }
        Err(error) => Err(error),
    }
}

/// Evaluates the client's rules and runs the handler of the first match.
pub fn verify<C>(client: &C, params: &Arc<Params>, logger: &RequestLogger) -> Result<(), Error>
where
    C: ApiClient + ?Sized,
{
    let Some(response) = params.response() else {
        return Ok(());
    };
    let Some(handler) = client.rules().evaluate(response) else {
        return Ok(());
    };
    debug!(?handler, "verdict rule matched");
    match handler {
        Handler::Block(block) => block(params, logger),
        Handler::Method(name) => client.handle(name, params, logger),
        Handler::Raise(raiser) => Err(raiser.raise(Arc::clone(params)).into()),
    }
}
