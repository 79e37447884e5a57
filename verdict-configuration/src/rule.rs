use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use verdict::RuleOptions;

use crate::catalog::ErrorCatalog;
use crate::condition::ConditionConfig;
use crate::error::ConfigError;

/// A rule as written in a definition.
///
/// ```yaml
/// status_code: { range: [400, 499] }
/// json:
///   "$.errors.code": 20
/// raise: ClientError
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Condition on the status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<ConditionConfig>,
    /// Conditions on JSON paths, all of which must match.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub json: IndexMap<String, ConditionConfig>,
    /// Match only responses without a body.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub forbid_nil: bool,
    /// Named handler on the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<String>,
    /// Error class, looked up in the [`ErrorCatalog`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raise: Option<String>,
}

impl RuleConfig {
    /// Resolves the rule into [`RuleOptions`].
    pub fn into_options(self, catalog: &ErrorCatalog) -> Result<RuleOptions, ConfigError> {
        let mut options = RuleOptions::new().forbid_nil(self.forbid_nil);
        if let Some(status_code) = self.status_code {
            options = options.status_code(status_code.into_condition()?);
        }
        for (path, condition) in self.json {
            options = options.json(path, condition.into_condition()?);
        }
        if let Some(with) = self.with {
            options = options.with(with);
        }
        if let Some(name) = self.raise {
            let raiser = catalog
                .get(&name)
                .ok_or(ConfigError::UnknownErrorClass(name))?;
            options = options.raise_with(raiser);
        }
        Ok(options)
    }
}
