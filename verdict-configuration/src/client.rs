use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use verdict::{ApiClient, Block, ClientConfig, Error, Params, Registry, RequestLogger, Transport};

use crate::catalog::ErrorCatalog;
use crate::error::ConfigError;
use crate::rule::RuleConfig;

/// Connection settings and rules of one client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ClientDefinition {
    /// Connection settings.
    #[serde(flatten)]
    pub config: ClientConfig,
    /// Rules in declaration order. Later rules take precedence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleConfig>,
}

impl ClientDefinition {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_saphyr::from_str(yaml)?)
    }

    /// Compiles the rules into a registry, on top of `parent` if given.
    pub fn registry(
        &self,
        catalog: &ErrorCatalog,
        parent: Option<Arc<Registry>>,
    ) -> Result<Registry, ConfigError> {
        let mut registry = match parent {
            Some(parent) => Registry::inherit(parent),
            None => Registry::new(),
        };
        for rule in &self.rules {
            registry.error_handling(rule.clone().into_options(catalog)?)?;
        }
        Ok(registry)
    }

    /// Builds a client over `transport`.
    pub fn into_client<T: Transport>(
        self,
        transport: T,
        catalog: &ErrorCatalog,
        parent: Option<Arc<Registry>>,
    ) -> Result<ConfiguredClient<T>, ConfigError> {
        let rules = self.registry(catalog, parent)?;
        Ok(ConfiguredClient {
            config: self.config,
            transport,
            rules,
            handlers: HashMap::new(),
        })
    }
}

/// A client assembled from a [`ClientDefinition`].
///
/// Named handlers referenced by `with` rules are attached with
/// [`ConfiguredClient::handler`].
pub struct ConfiguredClient<T> {
    config: ClientConfig,
    transport: T,
    rules: Registry,
    handlers: HashMap<SmolStr, Block>,
}

impl<T> ConfiguredClient<T> {
    /// Attaches the handler that `with: <name>` rules dispatch to.
    pub fn handler<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Arc<Params>, &RequestLogger) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.handlers.insert(SmolStr::new(name), Arc::new(handler));
        self
    }

    /// Connection settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl<T: Transport> ApiClient for ConfiguredClient<T> {
    type Transport = T;

    fn transport(&self) -> &T {
        &self.transport
    }

    fn rules(&self) -> &Registry {
        &self.rules
    }

    fn common_path(&self) -> &str {
        &self.config.common_path
    }

    fn handle(&self, name: &str, params: &Arc<Params>, logger: &RequestLogger) -> Result<(), Error> {
        match self.handlers.get(name) {
            Some(handler) => handler(params, logger),
            None => Err(Error::UnknownHandler(SmolStr::new(name))),
        }
    }
}
