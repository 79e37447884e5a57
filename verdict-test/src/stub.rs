//! Method-level test double.
//!
//! Code that depends on an API client usually only needs a handful of its
//! methods to return canned data or fail. [`Stub`] stands in for those
//! methods without going through a transport or a registry:
//!
//! ```
//! use serde_json::json;
//! use verdict::ClientError;
//! use verdict_test::Stub;
//!
//! let stub = Stub::new()
//!     .respond("get_user", json!({"id": 1}))
//!     .raise::<ClientError>("delete_user");
//!
//! assert_eq!(stub.call("get_user", json!([1])).unwrap(), Some(json!({"id": 1})));
//! assert!(stub.call("delete_user", json!([1])).unwrap_err().is::<ClientError>());
//! assert_eq!(stub.calls_to("get_user").len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use smol_str::SmolStr;
use verdict::{Error, ErrorClass, NetworkError, Params, TransportError, TransportErrorKind};

type Respond = Box<dyn Fn(&Value) -> Value + Send + Sync>;
type Raise = Box<dyn Fn() -> Error + Send + Sync>;

enum Action {
    Respond(Respond),
    Raise(Raise),
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct StubCall {
    /// Method name.
    pub action: SmolStr,
    /// Arguments the method was called with.
    pub args: Value,
}

/// Stands in for selected client methods.
///
/// Code under test should depend on a trait that names the client methods it
/// uses. The production client implements it by running calls through the
/// pipeline. In tests, a thin wrapper implements it by forwarding to a stub:
///
/// ```
/// use serde_json::{Value, json};
/// use verdict::{ClientError, Error};
/// use verdict_test::Stub;
///
/// trait Users {
///     fn find(&self, id: u64) -> Result<Option<Value>, Error>;
/// }
///
/// struct FakeUsers(Stub);
///
/// impl Users for FakeUsers {
///     fn find(&self, id: u64) -> Result<Option<Value>, Error> {
///         self.0.call("find", json!([id]))
///     }
/// }
///
/// fn display_name(users: &dyn Users, id: u64) -> String {
///     match users.find(id) {
///         Ok(Some(user)) => user["name"].as_str().unwrap_or("?").to_owned(),
///         Ok(None) => "unknown".to_owned(),
///         Err(error) if error.is::<ClientError>() => "hidden".to_owned(),
///         Err(_) => "unavailable".to_owned(),
///     }
/// }
///
/// let users = FakeUsers(Stub::new().respond("find", json!({"name": "Ada"})));
/// assert_eq!(display_name(&users, 1), "Ada");
/// assert_eq!(users.0.calls_to("find")[0].args, json!([1]));
///
/// let users = FakeUsers(Stub::new().raise::<ClientError>("find"));
/// assert_eq!(display_name(&users, 1), "hidden");
/// ```
#[derive(Default)]
pub struct Stub {
    actions: HashMap<SmolStr, Action>,
    calls: Arc<Mutex<Vec<StubCall>>>,
}

impl Stub {
    /// Stub with no methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// `action` returns `response`. `null` is returned as `None`.
    pub fn respond(self, action: &str, response: impl Into<Value>) -> Self {
        let response = response.into();
        self.respond_with(action, move |_| response.clone())
    }

    /// `action` returns whatever `respond` computes from its arguments.
    pub fn respond_with<F>(mut self, action: &str, respond: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.actions
            .insert(action.into(), Action::Respond(Box::new(respond)));
        self
    }

    /// `action` raises error class `E`, built with empty params.
    pub fn raise<E: ErrorClass>(self, action: &str) -> Self {
        self.raise_with(action, || {
            Error::raise(E::from_params(Arc::new(Params::default())))
        })
    }

    /// `action` fails with a [`NetworkError`] caused by an open timeout.
    pub fn raise_network(self, action: &str) -> Self {
        self.raise_with(action, || {
            NetworkError::new(
                Params::default(),
                TransportError::new(TransportErrorKind::OpenTimeout, "execution expired"),
            )
            .into()
        })
    }

    /// `action` fails with whatever `raise` builds.
    pub fn raise_with<F>(mut self, action: &str, raise: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.actions.insert(action.into(), Action::Raise(Box::new(raise)));
        self
    }

    /// Invokes a stubbed method.
    ///
    /// # Panics
    ///
    /// Panics if `action` was never stubbed.
    pub fn call(&self, action: &str, args: Value) -> Result<Option<Value>, Error> {
        self.calls.lock().unwrap().push(StubCall {
            action: action.into(),
            args: args.clone(),
        });
        match self.actions.get(action) {
            Some(Action::Respond(respond)) => match respond(&args) {
                Value::Null => Ok(None),
                value => Ok(Some(value)),
            },
            Some(Action::Raise(raise)) => Err(raise()),
            None => panic!("`{action}` is not stubbed"),
        }
    }

    /// Every invocation so far.
    pub fn calls(&self) -> Vec<StubCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations of `action` so far.
    pub fn calls_to(&self, action: &str) -> Vec<StubCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.action == action)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use verdict::{ServerError, TransportErrorKind};

    use super::*;

    #[test]
    fn test_null_response_is_absent() {
        let stub = Stub::new().respond("ping", Value::Null);
        assert_eq!(stub.call("ping", json!([])).unwrap(), None);
    }

    #[test]
    fn test_respond_with_sees_arguments() {
        let stub = Stub::new().respond_with("echo", |args| json!({"echo": args[0]}));
        assert_eq!(
            stub.call("echo", json!(["hello"])).unwrap(),
            Some(json!({"echo": "hello"}))
        );
    }

    #[test]
    fn test_raise_class_uses_empty_params() {
        let stub = Stub::new().raise::<ServerError>("get");
        let error = stub.call("get", json!([])).unwrap_err();
        assert!(error.is::<ServerError>());
        assert!(error.params().unwrap().response().is_none());
    }

    #[test]
    fn test_raise_network_uses_open_timeout() {
        let stub = Stub::new().raise_network("get");
        let error = stub.call("get", json!([])).unwrap_err();
        let network = error.as_network().unwrap();
        assert_eq!(network.original_error().kind(), TransportErrorKind::OpenTimeout);
    }

    #[test]
    fn test_calls_are_recorded_in_order() {
        let stub = Stub::new().respond("a", 1).respond("b", 2);
        stub.call("a", json!([1])).unwrap();
        stub.call("b", json!([2])).unwrap();
        stub.call("a", json!([3])).unwrap();
        assert_eq!(
            stub.calls_to("a"),
            vec![
                StubCall { action: "a".into(), args: json!([1]) },
                StubCall { action: "a".into(), args: json!([3]) },
            ]
        );
        assert_eq!(stub.calls().len(), 3);
    }

    trait Accounts: Send + Sync {
        fn balance(&self, account: &str) -> Result<Option<Value>, Error>;
    }

    struct FakeAccounts(Stub);

    impl Accounts for FakeAccounts {
        fn balance(&self, account: &str) -> Result<Option<Value>, Error> {
            self.0.call("balance", json!([account]))
        }
    }

    #[test]
    fn test_stub_backs_a_client_trait_object() {
        let accounts: Box<dyn Accounts> = Box::new(FakeAccounts(
            Stub::new().respond_with("balance", |args| json!({"account": args[0], "cents": 150})),
        ));
        assert_eq!(
            accounts.balance("acme").unwrap(),
            Some(json!({"account": "acme", "cents": 150}))
        );

        let accounts: Box<dyn Accounts> =
            Box::new(FakeAccounts(Stub::new().raise_network("balance")));
        assert!(accounts.balance("acme").unwrap_err().as_network().is_some());
    }

    #[test]
    #[should_panic(expected = "`missing` is not stubbed")]
    fn test_unknown_action_panics() {
        Stub::new().call("missing", json!([])).ok();
    }
}
