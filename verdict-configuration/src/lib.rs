//! YAML client definitions for verdict.
//!
//! A [`ClientDefinition`] carries a client's connection settings and its
//! rules. Rules name the error class they raise, which is resolved through an
//! [`ErrorCatalog`]:
//!
//! ```
//! use verdict_configuration::{ClientDefinition, ErrorCatalog};
//!
//! let definition = ClientDefinition::from_yaml(r#"
//! endpoint: https://api.example.com
//! common_path: v1
//! rules:
//!   - status_code: { range: [400, 499] }
//!     raise: ClientError
//! "#).unwrap();
//! let registry = definition.registry(&ErrorCatalog::default(), None).unwrap();
//! assert_eq!(registry.len(), 1);
//! ```

mod catalog;
mod client;
mod condition;
mod error;
mod rule;

pub use catalog::ErrorCatalog;
pub use client::{ClientDefinition, ConfiguredClient};
pub use condition::ConditionConfig;
pub use error::ConfigError;
pub use rule::RuleConfig;
