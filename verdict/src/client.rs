use std::sync::Arc;

use async_trait::async_trait;
use http::{HeaderMap, Method};
use serde_json::Value;
use verdict_core::{Params, Query, Transport};

use crate::error::Error;
use crate::logger::RequestLogger;
use crate::pipeline;
use crate::registry::Registry;

/// An API client whose responses are verified against a [`Registry`].
///
/// Implementors provide the transport and the rules; the verb methods run
/// every call through the pipeline. Registries are usually built once per
/// client type and kept in a `static`:
///
/// ```
/// use std::sync::LazyLock;
///
/// use verdict::{ApiClient, ClientError, Registry, RuleOptions, ServerError};
/// use verdict_test::StubTransport;
///
/// static RULES: LazyLock<Registry> = LazyLock::new(|| {
///     let mut registry = Registry::new();
///     registry.register(
///         RuleOptions::new()
///             .status_code(400..=499)
///             .raise::<ClientError>()
///             .compile()
///             .expect("static rule"),
///     );
///     registry
/// });
///
/// struct UsersApi {
///     transport: StubTransport,
/// }
///
/// impl ApiClient for UsersApi {
///     type Transport = StubTransport;
///
///     fn transport(&self) -> &StubTransport {
///         &self.transport
///     }
///
///     fn rules(&self) -> &Registry {
///         &RULES
///     }
///
///     fn common_path(&self) -> &str {
///         "/v1"
///     }
/// }
/// ```
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Executes the HTTP calls.
    type Transport: Transport;

    /// The transport used for every call.
    fn transport(&self) -> &Self::Transport;

    /// Rules responses are verified against.
    fn rules(&self) -> &Registry;

    /// Prefix joined in front of every call path.
    fn common_path(&self) -> &str {
        ""
    }

    /// Runs the handler a rule named with `with`.
    ///
    /// Returning `Ok(())` lets the call succeed. The default knows no handlers.
    fn handle(&self, name: &str, params: &Arc<Params>, logger: &RequestLogger) -> Result<(), Error> {
        let _ = (params, logger);
        Err(Error::UnknownHandler(name.into()))
    }

    /// `GET path?query`.
    async fn get(&self, path: &str, headers: HeaderMap, query: Query) -> Result<Option<Value>, Error> {
        pipeline::call(self, Method::GET, path, headers, query, None).await
    }

    /// `POST path` with a JSON body.
    async fn post(&self, path: &str, headers: HeaderMap, body: Option<Value>) -> Result<Option<Value>, Error> {
        pipeline::call(self, Method::POST, path, headers, Query::new(), body).await
    }

    /// `PATCH path` with a JSON body.
    async fn patch(&self, path: &str, headers: HeaderMap, body: Option<Value>) -> Result<Option<Value>, Error> {
        pipeline::call(self, Method::PATCH, path, headers, Query::new(), body).await
    }

    /// Alias of [`patch`](ApiClient::patch): the request goes out as `PATCH`.
    async fn put(&self, path: &str, headers: HeaderMap, body: Option<Value>) -> Result<Option<Value>, Error> {
        self.patch(path, headers, body).await
    }

    /// `DELETE path?query`.
    async fn delete(&self, path: &str, headers: HeaderMap, query: Query) -> Result<Option<Value>, Error> {
        pipeline::call(self, Method::DELETE, path, headers, query, None).await
    }
}
