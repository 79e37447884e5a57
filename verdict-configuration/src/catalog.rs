use std::collections::HashMap;

use verdict::{ClientError, ErrorClass, Raiser, RequestError, ServerError};

/// Error classes a definition may name in `raise`.
///
/// The default catalog knows `RequestError`, `ClientError` and `ServerError`.
#[derive(Debug, Clone)]
pub struct ErrorCatalog {
    raisers: HashMap<String, Raiser>,
}

impl Default for ErrorCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        catalog
            .register::<RequestError>()
            .register::<ClientError>()
            .register::<ServerError>();
        catalog
    }
}

impl ErrorCatalog {
    /// Catalog with the built-in error classes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog without any error class.
    pub fn empty() -> Self {
        Self {
            raisers: HashMap::new(),
        }
    }

    /// Adds `E` under its type name.
    pub fn register<E: ErrorClass>(&mut self) -> &mut Self {
        let raiser = Raiser::of::<E>();
        self.raisers.insert(raiser.name().to_owned(), raiser);
        self
    }

    /// Adds `E` under `name`.
    pub fn register_as<E: ErrorClass>(&mut self, name: impl Into<String>) -> &mut Self {
        self.raisers.insert(name.into(), Raiser::of::<E>());
        self
    }

    /// Raiser registered under `name`.
    pub fn get(&self, name: &str) -> Option<Raiser> {
        self.raisers.get(name).copied()
    }

    /// Whether `name` is known.
    pub fn contains(&self, name: &str) -> bool {
        self.raisers.contains_key(name)
    }
}
