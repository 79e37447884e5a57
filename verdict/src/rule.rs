//! Rule compilation.
//!
//! A rule is declared as a set of [`RuleOptions`] and compiled into a
//! [`Rule`]: a [`ResponseMatcher`] that decides whether the rule applies and
//! a [`Handler`] that runs when it does.
//!
//! ```
//! use verdict::{ClientError, RuleOptions};
//!
//! let rule = RuleOptions::new()
//!     .status_code(400..=499)
//!     .json("$.errors.code", 20)
//!     .raise::<ClientError>()
//!     .compile()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use smol_str::SmolStr;
use verdict_core::{ClassifiedError, Condition, ErrorClass, JsonPath, Params, RequestError, Response};

use crate::error::{CompileError, Error};
use crate::logger::RequestLogger;

/// Custom handler code run when a rule matches.
///
/// Returning `Ok(())` lets the call succeed with the response body.
pub type Block = Arc<dyn Fn(&Arc<Params>, &RequestLogger) -> Result<(), Error> + Send + Sync>;

/// Builds a classified error of a fixed type from the call's params.
#[derive(Clone, Copy)]
pub struct Raiser {
    name: &'static str,
    build: fn(Arc<Params>) -> ClassifiedError,
}

impl Raiser {
    /// Raiser for error class `E`.
    pub fn of<E: ErrorClass>() -> Self {
        Self {
            name: short_name(std::any::type_name::<E>()),
            build: build::<E>,
        }
    }

    /// Name of the error class this raiser builds.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds the error for `params`.
    pub fn raise(&self, params: Arc<Params>) -> ClassifiedError {
        (self.build)(params)
    }
}

impl fmt::Debug for Raiser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Raiser").field(&self.name).finish()
    }
}

fn build<E: ErrorClass>(params: Arc<Params>) -> ClassifiedError {
    ClassifiedError::new(E::from_params(params))
}

fn short_name(type_name: &'static str) -> &'static str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

/// What runs when a rule matches.
#[derive(Clone)]
pub enum Handler {
    /// Custom code.
    Block(Block),
    /// A named handler on the client, see [`ApiClient::handle`](crate::ApiClient::handle).
    Method(SmolStr),
    /// Raise an error class.
    Raise(Raiser),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Block(_) => f.write_str("Block"),
            Handler::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Handler::Raise(raiser) => f.debug_tuple("Raise").field(&raiser.name()).finish(),
        }
    }
}

/// Predicate over a [`Response`].
#[derive(Debug, Clone, Default)]
pub struct ResponseMatcher {
    status_code: Option<Condition>,
    json: Vec<(JsonPath, Condition)>,
    forbid_nil: bool,
}

impl ResponseMatcher {
    /// Whether the response satisfies every condition.
    ///
    /// With `forbid_nil` set, only an absent (or `null`) body matches and the
    /// other conditions are not consulted. For each JSON path, any one of the
    /// values it resolves to has to satisfy its condition.
    pub fn matches(&self, response: &Response) -> bool {
        if self.forbid_nil {
            return matches!(response.data(), None | Some(Value::Null));
        }
        if let Some(status_code) = &self.status_code
            && !status_code.matches_status(response.status())
        {
            return false;
        }
        self.json.iter().all(|(path, condition)| match response.data() {
            Some(document) => path
                .resolve(document)
                .any(|value| condition.matches(Some(value))),
            None => false,
        })
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    matcher: ResponseMatcher,
    handler: Handler,
}

impl Rule {
    /// Compiles `options` into a rule.
    pub fn compile(options: RuleOptions) -> Result<Self, CompileError> {
        let json = options
            .json
            .into_iter()
            .map(|(path, condition)| Ok((JsonPath::parse(&path)?, condition)))
            .collect::<Result<Vec<_>, CompileError>>()?;

        let handler = if let Some(block) = options.block {
            Handler::Block(block)
        } else if let Some(method) = options.with {
            Handler::Method(method)
        } else {
            Handler::Raise(options.raise.unwrap_or_else(Raiser::of::<RequestError>))
        };

        Ok(Self {
            matcher: ResponseMatcher {
                status_code: options.status_code,
                json,
                forbid_nil: options.forbid_nil,
            },
            handler,
        })
    }

    /// Whether this rule applies to `response`.
    pub fn matches(&self, response: &Response) -> bool {
        self.matcher.matches(response)
    }

    /// The compiled predicate.
    pub fn matcher(&self) -> &ResponseMatcher {
        &self.matcher
    }

    /// What runs when the rule applies.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Declarative description of a rule.
///
/// Handler precedence is `block`, then `with`, then `raise`. A rule that
/// names none of them raises [`RequestError`].
#[derive(Clone, Default)]
pub struct RuleOptions {
    status_code: Option<Condition>,
    json: Vec<(String, Condition)>,
    forbid_nil: bool,
    with: Option<SmolStr>,
    raise: Option<Raiser>,
    block: Option<Block>,
}

impl RuleOptions {
    /// Empty options: a rule that matches every response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Condition on the status code.
    pub fn status_code(mut self, condition: impl Into<Condition>) -> Self {
        self.status_code = Some(condition.into());
        self
    }

    /// Condition on the values reached by a JSON path. May be repeated; all
    /// paths must match.
    pub fn json(mut self, path: impl Into<String>, condition: impl Into<Condition>) -> Self {
        self.json.push((path.into(), condition.into()));
        self
    }

    /// Match only responses without a body.
    pub fn forbid_nil(mut self, forbid_nil: bool) -> Self {
        self.forbid_nil = forbid_nil;
        self
    }

    /// Dispatch to a named handler on the client.
    pub fn with(mut self, method: impl Into<SmolStr>) -> Self {
        self.with = Some(method.into());
        self
    }

    /// Raise error class `E`.
    pub fn raise<E: ErrorClass>(self) -> Self {
        self.raise_with(Raiser::of::<E>())
    }

    /// Raise through a prepared [`Raiser`].
    pub fn raise_with(mut self, raiser: Raiser) -> Self {
        self.raise = Some(raiser);
        self
    }

    /// Run custom code.
    pub fn block<F>(mut self, block: F) -> Self
    where
        F: Fn(&Arc<Params>, &RequestLogger) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.block = Some(Arc::new(block));
        self
    }

    /// Compiles these options, see [`Rule::compile`].
    pub fn compile(self) -> Result<Rule, CompileError> {
        Rule::compile(self)
    }
}

impl fmt::Debug for RuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleOptions")
            .field("status_code", &self.status_code)
            .field("json", &self.json)
            .field("forbid_nil", &self.forbid_nil)
            .field("with", &self.with)
            .field("raise", &self.raise)
            .field("block", &self.block.as_ref().map(|_| "Block"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use verdict_core::{ClientError, Probe, ServerError};

    use super::*;

    fn response(status: u16, data: Option<Value>) -> Response {
        Response::new(StatusCode::from_u16(status).unwrap(), data)
    }

    #[test]
    fn test_empty_options_match_everything() {
        let rule = RuleOptions::new().compile().unwrap();
        assert!(rule.matches(&response(200, None)));
        assert!(rule.matches(&response(503, Some(json!({"a": 1})))));
    }

    #[test]
    fn test_default_handler_raises_request_error() {
        let rule = RuleOptions::new().compile().unwrap();
        match rule.handler() {
            Handler::Raise(raiser) => assert_eq!(raiser.name(), "RequestError"),
            other => panic!("unexpected handler {other:?}"),
        }
    }

    #[test]
    fn test_handler_precedence() {
        let rule = RuleOptions::new()
            .raise::<ClientError>()
            .with("handle_limit")
            .block(|_, _| Ok(()))
            .compile()
            .unwrap();
        assert!(matches!(rule.handler(), Handler::Block(_)));

        let rule = RuleOptions::new()
            .raise::<ClientError>()
            .with("handle_limit")
            .compile()
            .unwrap();
        assert!(matches!(rule.handler(), Handler::Method(name) if name == "handle_limit"));

        let rule = RuleOptions::new().raise::<ServerError>().compile().unwrap();
        assert!(matches!(rule.handler(), Handler::Raise(raiser) if raiser.name() == "ServerError"));
    }

    #[test]
    fn test_status_range() {
        let rule = RuleOptions::new().status_code(400..=499).compile().unwrap();
        assert!(rule.matches(&response(400, None)));
        assert!(rule.matches(&response(499, None)));
        assert!(!rule.matches(&response(500, None)));
        assert!(!rule.matches(&response(399, None)));
    }

    #[test]
    fn test_json_condition_any_value_matches() {
        let rule = RuleOptions::new()
            .status_code(400..=499)
            .json("$.errors.*.code", 20)
            .compile()
            .unwrap();
        let body = json!({"errors": [{"code": 5}, {"code": 20}]});
        assert!(rule.matches(&response(404, Some(body))));
        let body = json!({"errors": [{"code": 5}]});
        assert!(!rule.matches(&response(404, Some(body))));
    }

    #[test]
    fn test_json_conditions_are_conjunctive() {
        let rule = RuleOptions::new()
            .json("$.errors.code", 20)
            .json("$.errors.message", Condition::pattern("^Limit").unwrap())
            .compile()
            .unwrap();
        let body = json!({"errors": {"code": 20, "message": "Limit reached"}});
        assert!(rule.matches(&response(200, Some(body))));
        let body = json!({"errors": {"code": 20, "message": "Other"}});
        assert!(!rule.matches(&response(200, Some(body))));
    }

    #[test]
    fn test_json_condition_without_body_does_not_match() {
        let rule = RuleOptions::new().json("$.errors.code", 20).compile().unwrap();
        assert!(!rule.matches(&response(200, None)));
    }

    #[test]
    fn test_json_probe() {
        let rule = RuleOptions::new()
            .json("$.errors", Probe::Empty)
            .compile()
            .unwrap();
        assert!(rule.matches(&response(200, Some(json!({"errors": []})))));
        assert!(!rule.matches(&response(200, Some(json!({"errors": [1]})))));
    }

    #[test]
    fn test_forbid_nil_ignores_other_conditions() {
        let rule = RuleOptions::new()
            .status_code(500..=599)
            .forbid_nil(true)
            .compile()
            .unwrap();
        assert!(rule.matches(&response(200, None)));
        assert!(rule.matches(&response(200, Some(Value::Null))));
        assert!(!rule.matches(&response(500, Some(json!({})))));
    }

    #[test]
    fn test_invalid_path_fails_compilation() {
        let error = RuleOptions::new().json("errors.code", 1).compile().unwrap_err();
        assert!(matches!(error, CompileError::JsonPath(_)));
    }

    #[test]
    fn test_raiser_builds_error_for_params() {
        let raiser = Raiser::of::<ClientError>();
        let params = Arc::new(Params::default());
        let error = raiser.raise(Arc::clone(&params));
        assert!(error.is::<ClientError>());
        assert_eq!(error.params(), &params);
    }
}
