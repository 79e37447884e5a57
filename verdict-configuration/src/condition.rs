use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};
use verdict::{Condition, Numeric, Probe};

use crate::error::ConfigError;

/// A condition as written in a definition.
///
/// Supports:
/// - Exact: any plain value, e.g. `20` or `"Sorry"`
/// - Range: `{ range: [400, 499] }`, both ends inclusive
/// - Regex: `{ regex: "^Sorry" }`
/// - Probe: `{ probe: "negative?" }`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ConditionConfig {
    /// Inclusive numeric range.
    Range {
        /// `[start, end]`.
        range: [Number; 2],
    },
    /// Regex over the value's string rendering.
    Regex {
        /// The pattern.
        regex: String,
    },
    /// Named query.
    Probe {
        /// Probe name, with or without a trailing `?`.
        probe: String,
    },
    /// Structural equality.
    Exact(JsonValue),
}

impl ConditionConfig {
    /// Compiles the condition.
    pub fn into_condition(self) -> Result<Condition, ConfigError> {
        match self {
            ConditionConfig::Range { range: [start, end] } => {
                let (start, end) = (Numeric::from(&start), Numeric::from(&end));
                if start > end {
                    return Err(ConfigError::EmptyRange(start, end));
                }
                Ok(Condition::range(start, end))
            }
            ConditionConfig::Regex { regex } => {
                Condition::pattern(&regex).map_err(|error| ConfigError::InvalidRegex {
                    pattern: regex,
                    error,
                })
            }
            ConditionConfig::Probe { probe } => match Probe::named(&probe) {
                Probe::Unknown(_) => Err(ConfigError::UnknownProbe(probe)),
                known => Ok(Condition::Probe(known)),
            },
            ConditionConfig::Exact(value) => Ok(Condition::Exact(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn parse(yaml: &str) -> ConditionConfig {
        serde_saphyr::from_str(yaml).expect("failed to deserialize")
    }

    #[test]
    fn test_forms() {
        assert_eq!(parse("20"), ConditionConfig::Exact(json!(20)));
        assert_eq!(parse("Sorry"), ConditionConfig::Exact(json!("Sorry")));
        assert_eq!(
            parse("{ range: [400, 499] }"),
            ConditionConfig::Range { range: [400.into(), 499.into()] }
        );
        assert_eq!(
            parse("{ regex: \"^Sorry\" }"),
            ConditionConfig::Regex { regex: "^Sorry".to_owned() }
        );
        assert_eq!(
            parse("{ probe: \"negative?\" }"),
            ConditionConfig::Probe { probe: "negative?".to_owned() }
        );
    }

    #[test]
    fn test_compile() {
        let condition = parse("{ range: [400, 499] }").into_condition().unwrap();
        assert!(condition.matches(Some(&json!(404))));
        assert!(!condition.matches(Some(&json!(500))));

        let condition = parse("{ range: [9007199254740993, 9007199254740995] }")
            .into_condition()
            .unwrap();
        assert!(!condition.matches(Some(&json!(9_007_199_254_740_992_u64))));
        assert!(condition.matches(Some(&json!(9_007_199_254_740_994_u64))));

        let condition = parse("{ probe: \"empty?\" }").into_condition().unwrap();
        assert_eq!(condition, Condition::Probe(Probe::Empty));
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            parse("{ regex: \"(\" }").into_condition(),
            Err(ConfigError::InvalidRegex { pattern, .. }) if pattern == "("
        ));
        assert!(matches!(
            parse("{ probe: \"shiny?\" }").into_condition(),
            Err(ConfigError::UnknownProbe(name)) if name == "shiny?"
        ));
        assert!(matches!(
            parse("{ range: [5, 1] }").into_condition(),
            Err(ConfigError::EmptyRange(..))
        ));
    }
}
