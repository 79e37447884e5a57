use thiserror::Error;
use verdict::{CompileError, Numeric};

/// Error returned when a client definition cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML for a client definition.
    #[error("invalid client definition: {0}")]
    Yaml(#[from] serde_saphyr::Error),
    /// A `regex` condition does not compile.
    #[error("invalid regex `{pattern}`: {error}")]
    InvalidRegex {
        /// The pattern as written.
        pattern: String,
        /// Why it failed to compile.
        error: regex::Error,
    },
    /// A `probe` condition names an unknown query.
    #[error("unknown probe `{0}`")]
    UnknownProbe(String),
    /// A `range` condition has its bounds reversed.
    #[error("range [{0}, {1}] is empty")]
    EmptyRange(Numeric, Numeric),
    /// A rule raises an error class the catalog does not know.
    #[error("unknown error class `{0}`")]
    UnknownErrorClass(String),
    /// A rule failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),
}
