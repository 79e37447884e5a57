//! Ordered rule collections.
//!
//! Rules are consulted newest first. A registry created with
//! [`Registry::inherit`] consults its own rules before the parent's, so a
//! derived client can override what it inherits by declaring a more specific
//! rule.

use std::iter::{FusedIterator, Rev};
use std::slice::Iter;
use std::sync::Arc;

use verdict_core::Response;

use crate::error::CompileError;
use crate::rule::{Handler, Rule, RuleOptions};

/// Rules for one client type.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    parent: Option<Arc<Registry>>,
    rules: Vec<Rule>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry that falls back to `parent`'s rules.
    pub fn inherit(parent: Arc<Registry>) -> Self {
        Self {
            parent: Some(parent),
            rules: Vec::new(),
        }
    }

    /// Appends a compiled rule. It takes precedence over every rule already
    /// registered.
    pub fn register(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Compiles `options` and registers the resulting rule.
    ///
    /// ```
    /// use verdict::{ClientError, Registry, RuleOptions, ServerError};
    ///
    /// let mut registry = Registry::new();
    /// registry
    ///     .error_handling(RuleOptions::new().status_code(400..=499).raise::<ClientError>())?
    ///     .error_handling(RuleOptions::new().status_code(500..=599).raise::<ServerError>())?;
    /// assert_eq!(registry.len(), 2);
    /// # Ok::<(), verdict::CompileError>(())
    /// ```
    pub fn error_handling(&mut self, options: RuleOptions) -> Result<&mut Self, CompileError> {
        let rule = options.compile()?;
        Ok(self.register(rule))
    }

    /// Handler of the first rule, newest first, that matches `response`.
    pub fn evaluate(&self, response: &Response) -> Option<&Handler> {
        self.iter()
            .find(|rule| rule.matches(response))
            .map(Rule::handler)
    }

    /// Every rule in evaluation order, inherited ones included.
    pub fn iter(&self) -> Rules<'_> {
        Rules {
            current: self.rules.iter().rev(),
            next: self.parent.as_deref(),
        }
    }

    /// Number of rules, inherited ones included.
    pub fn len(&self) -> usize {
        self.rules.len() + self.parent.as_ref().map_or(0, |parent| parent.len())
    }

    /// Whether no rule is registered here or in any ancestor.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Rule;
    type IntoIter = Rules<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a registry's rules in evaluation order.
#[derive(Debug, Clone)]
pub struct Rules<'a> {
    current: Rev<Iter<'a, Rule>>,
    next: Option<&'a Registry>,
}

impl<'a> Iterator for Rules<'a> {
    type Item = &'a Rule;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(rule) = self.current.next() {
                return Some(rule);
            }
            let registry = self.next.take()?;
            self.current = registry.rules.iter().rev();
            self.next = registry.parent.as_deref();
        }
    }
}

impl FusedIterator for Rules<'_> {}
