use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::HeaderMap;
use pretty_assertions::assert_eq;
use serde_json::json;
use verdict::{ApiClient, ClientError, Error, Registry, RuleOptions, ServerError, error_class};
use verdict_configuration::{
    ClientDefinition, ConditionConfig, ConfigError, ErrorCatalog, RuleConfig,
};
use verdict_test::StubTransport;

error_class! {
    /// The API rate limit was reached.
    pub struct ApiLimitError => "API limit reached";
}

const DEFINITION: &str = r#"
endpoint: https://api.example.com
common_path: v1
read_timeout: 5s
open_timeout: 1s
headers:
  accept: application/json
rules:
  - status_code: { range: [400, 499] }
    raise: ClientError
  - json:
      "$.errors.code": 20
    raise: ApiLimitError
  - json:
      "$.errors.message": { regex: "Sorry" }
    with: log_and_continue
  - status_code: 200
    forbid_nil: true
"#;

fn catalog() -> ErrorCatalog {
    let mut catalog = ErrorCatalog::default();
    catalog.register::<ApiLimitError>();
    catalog
}

#[test]
fn test_definition_deserialize() {
    let definition = ClientDefinition::from_yaml(DEFINITION).unwrap();

    assert_eq!(definition.config.endpoint, "https://api.example.com");
    assert_eq!(definition.config.common_path, "v1");
    assert_eq!(definition.config.read_timeout, Some(Duration::from_secs(5)));
    assert_eq!(definition.config.open_timeout, Some(Duration::from_secs(1)));
    assert_eq!(definition.config.headers["accept"], "application/json");
    assert_eq!(definition.rules.len(), 4);
    assert_eq!(
        definition.rules[0],
        RuleConfig {
            status_code: Some(ConditionConfig::Range { range: [400.into(), 499.into()] }),
            raise: Some("ClientError".to_owned()),
            ..Default::default()
        }
    );
    assert_eq!(
        definition.rules[3],
        RuleConfig {
            status_code: Some(ConditionConfig::Exact(json!(200))),
            forbid_nil: true,
            ..Default::default()
        }
    );
}

#[test]
fn test_definition_roundtrip() {
    let definition = ClientDefinition::from_yaml(DEFINITION).unwrap();
    let yaml = serde_saphyr::to_string(&definition).expect("failed to serialize");
    let parsed = ClientDefinition::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, definition);
}

#[test]
fn test_unknown_error_class_fails_registry() {
    let definition = ClientDefinition::from_yaml(DEFINITION).unwrap();
    let error = definition
        .registry(&ErrorCatalog::default(), None)
        .unwrap_err();
    assert!(matches!(error, ConfigError::UnknownErrorClass(name) if name == "ApiLimitError"));
}

#[test]
fn test_invalid_json_path_fails_registry() {
    let definition = ClientDefinition::from_yaml(
        "endpoint: http://localhost\nrules:\n  - json:\n      \"errors.code\": 1\n",
    )
    .unwrap();
    let error = definition
        .registry(&ErrorCatalog::default(), None)
        .unwrap_err();
    assert!(matches!(error, ConfigError::Compile(_)));
}

#[test]
fn test_malformed_yaml() {
    assert!(matches!(
        ClientDefinition::from_yaml("endpoint: [unclosed"),
        Err(ConfigError::Yaml(_))
    ));
}

#[tokio::test]
async fn test_configured_client_applies_rules_in_order() {
    let transport = StubTransport::new();
    transport
        .respond(403, json!({"errors": {"code": 20}}))
        .respond(404, json!({"errors": {"code": 1}}))
        .respond(200, json!({"errors": {"message": "Sorry, try later"}}))
        .respond(200, None);

    let continued = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&continued);
    let client = ClientDefinition::from_yaml(DEFINITION)
        .unwrap()
        .into_client(transport.clone(), &catalog(), None)
        .unwrap()
        .handler("log_and_continue", move |_, logger| {
            logger.info("continuing");
            *counter.lock().unwrap() += 1;
            Ok(())
        });

    let error = client.get("limits", HeaderMap::new(), Vec::new()).await.unwrap_err();
    assert!(error.is::<ApiLimitError>());

    let error = client.get("users/1", HeaderMap::new(), Vec::new()).await.unwrap_err();
    assert!(error.is::<ClientError>());

    let body = client.get("status", HeaderMap::new(), Vec::new()).await.unwrap();
    assert_eq!(body, Some(json!({"errors": {"message": "Sorry, try later"}})));
    assert_eq!(*continued.lock().unwrap(), 1);

    let error = client.get("status", HeaderMap::new(), Vec::new()).await.unwrap_err();
    assert!(matches!(error, Error::Classified(_)));
    assert!(error.is::<verdict::RequestError>());

    assert_eq!(
        transport.last_request().unwrap().line(),
        "GET v1/status"
    );
}

#[tokio::test]
async fn test_definition_inherits_parent_rules() {
    let mut parent = Registry::new();
    parent
        .error_handling(RuleOptions::new().status_code(500..=599).raise::<ServerError>())
        .unwrap();
    let parent = Arc::new(parent);

    let transport = StubTransport::new();
    transport.respond(502, json!({})).respond(404, json!({}));
    let client = ClientDefinition::from_yaml(DEFINITION)
        .unwrap()
        .into_client(transport, &catalog(), Some(parent))
        .unwrap();

    assert_eq!(client.rules().len(), 5);
    let error = client.get("x", HeaderMap::new(), Vec::new()).await.unwrap_err();
    assert!(error.is::<ServerError>());
    let error = client.get("x", HeaderMap::new(), Vec::new()).await.unwrap_err();
    assert!(error.is::<ClientError>());
}
