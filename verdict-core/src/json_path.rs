//! Dotted JSON paths with wildcards.
//!
//! Paths start at the document root `$` and descend one segment at a time:
//!
//! ```text
//! $.errors.code          object keys
//! $.items.0.id           array index (also `$.items[0].id`)
//! $.items.*.code         every element of `items`
//! $['odd key'].value     bracketed keys
//! ```
//!
//! Resolution never fails. A key that is missing or an index that is out of
//! range just ends that branch, so the result is empty rather than an error.

use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use serde_json::Value;
use smol_str::SmolStr;
use thiserror::Error;

/// Error returned when a path cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JsonPathError {
    /// The path does not start with `$`.
    #[error("JSON path `{0}` must start with `$`")]
    MissingRoot(String),
    /// A `.` is not followed by a segment name.
    #[error("JSON path `{0}` contains an empty segment")]
    EmptySegment(String),
    /// A `[` has no matching `]`.
    #[error("JSON path `{0}` has an unterminated bracket")]
    UnterminatedBracket(String),
    /// Something other than `.` or `[` follows a segment.
    #[error("unexpected character `{found}` in JSON path `{path}`")]
    UnexpectedCharacter {
        /// The full path.
        path: String,
        /// The offending character.
        found: char,
    },
}

/// One step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key.
    Key(SmolStr),
    /// Array index. Falls back to a key lookup when applied to an object.
    Index(usize),
    /// Every element of an array or every value of an object.
    Wildcard,
}

impl Segment {
    fn from_name(name: &str) -> Self {
        if name == "*" {
            return Segment::Wildcard;
        }
        if name.bytes().all(|b| b.is_ascii_digit())
            && let Ok(index) = name.parse()
        {
            return Segment::Index(index);
        }
        Segment::Key(SmolStr::new(name))
    }

    fn from_bracket(inner: &str) -> Self {
        let quoted = inner
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')));
        match quoted {
            Some(key) => Segment::Key(SmolStr::new(key)),
            None => Segment::from_name(inner),
        }
    }
}

/// A parsed path into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    source: SmolStr,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parses a path such as `$.errors.code`.
    pub fn parse(path: &str) -> Result<Self, JsonPathError> {
        let mut rest = path
            .strip_prefix('$')
            .ok_or_else(|| JsonPathError::MissingRoot(path.to_owned()))?;
        let mut segments = Vec::new();

        while let Some(first) = rest.chars().next() {
            match first {
                '.' => {
                    let after = &rest[1..];
                    let end = after.find(['.', '[']).unwrap_or(after.len());
                    let name = &after[..end];
                    if name.is_empty() {
                        return Err(JsonPathError::EmptySegment(path.to_owned()));
                    }
                    segments.push(Segment::from_name(name));
                    rest = &after[end..];
                }
                '[' => {
                    let after = &rest[1..];
                    let end = after
                        .find(']')
                        .ok_or_else(|| JsonPathError::UnterminatedBracket(path.to_owned()))?;
                    let inner = after[..end].trim();
                    if inner.is_empty() {
                        return Err(JsonPathError::EmptySegment(path.to_owned()));
                    }
                    segments.push(Segment::from_bracket(inner));
                    rest = &after[end + 1..];
                }
                found => {
                    return Err(JsonPathError::UnexpectedCharacter {
                        path: path.to_owned(),
                        found,
                    });
                }
            }
        }

        Ok(Self {
            source: SmolStr::new(path),
            segments,
        })
    }

    /// The path as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed segments, root excluded.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Lazily walks `document`, yielding every value the path reaches in
    /// document order.
    pub fn resolve<'p, 'v>(&'p self, document: &'v Value) -> Resolve<'p, 'v> {
        Resolve {
            segments: &self.segments,
            stack: vec![(0, document)],
        }
    }
}

impl FromStr for JsonPath {
    type Err = JsonPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Iterator over the values a [`JsonPath`] reaches. Created by [`JsonPath::resolve`].
#[derive(Debug)]
pub struct Resolve<'p, 'v> {
    segments: &'p [Segment],
    stack: Vec<(usize, &'v Value)>,
}

impl<'v> Iterator for Resolve<'_, 'v> {
    type Item = &'v Value;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, value)) = self.stack.pop() {
            let Some(segment) = self.segments.get(depth) else {
                return Some(value);
            };
            let depth = depth + 1;
            match (segment, value) {
                (Segment::Key(key), Value::Object(fields)) => {
                    if let Some(child) = fields.get(key.as_str()) {
                        self.stack.push((depth, child));
                    }
                }
                (Segment::Index(index), Value::Array(items)) => {
                    if let Some(child) = items.get(*index) {
                        self.stack.push((depth, child));
                    }
                }
                (Segment::Index(index), Value::Object(fields)) => {
                    if let Some(child) = fields.get(&index.to_string()) {
                        self.stack.push((depth, child));
                    }
                }
                // Pushed in reverse so elements come out in document order.
                (Segment::Wildcard, Value::Array(items)) => {
                    self.stack
                        .extend(items.iter().rev().map(|child| (depth, child)));
                }
                (Segment::Wildcard, Value::Object(fields)) => {
                    self.stack
                        .extend(fields.values().rev().map(|child| (depth, child)));
                }
                _ => {}
            }
        }
        None
    }
}

impl FusedIterator for Resolve<'_, '_> {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn resolve(path: &str, document: &Value) -> Vec<Value> {
        JsonPath::parse(path)
            .unwrap()
            .resolve(document)
            .cloned()
            .collect()
    }

    #[test]
    fn test_parse_segments() {
        let path = JsonPath::parse("$.errors[0].*['odd key'].code").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("errors".into()),
                Segment::Index(0),
                Segment::Wildcard,
                Segment::Key("odd key".into()),
                Segment::Key("code".into()),
            ]
        );
        assert_eq!(path.to_string(), "$.errors[0].*['odd key'].code");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            JsonPath::parse("errors.code"),
            Err(JsonPathError::MissingRoot(_))
        ));
        assert!(matches!(
            JsonPath::parse("$.errors..code"),
            Err(JsonPathError::EmptySegment(_))
        ));
        assert!(matches!(
            JsonPath::parse("$.errors[0"),
            Err(JsonPathError::UnterminatedBracket(_))
        ));
        assert!(matches!(
            JsonPath::parse("$errors"),
            Err(JsonPathError::UnexpectedCharacter { found: 'e', .. })
        ));
    }

    #[test]
    fn test_root_yields_document() {
        let document = json!({"a": 1});
        assert_eq!(resolve("$", &document), vec![document.clone()]);
    }

    #[test]
    fn test_nested_key() {
        let document = json!({"errors": {"code": 20}});
        assert_eq!(resolve("$.errors.code", &document), vec![json!(20)]);
    }

    #[test]
    fn test_missing_key_is_empty() {
        let document = json!({"errors": {"code": 20}});
        assert!(resolve("$.errors.message", &document).is_empty());
        assert!(resolve("$.missing.deeper.still", &document).is_empty());
        assert!(resolve("$.errors.code.value", &document).is_empty());
    }

    #[test]
    fn test_index_out_of_range_is_empty() {
        let document = json!({"items": [1, 2]});
        assert_eq!(resolve("$.items.1", &document), vec![json!(2)]);
        assert!(resolve("$.items.2", &document).is_empty());
    }

    #[test]
    fn test_numeric_segment_on_object_is_a_key() {
        let document = json!({"codes": {"0": "zero"}});
        assert_eq!(resolve("$.codes.0", &document), vec![json!("zero")]);
    }

    #[test]
    fn test_wildcards_compose() {
        let document = json!({
            "errors": [
                {"details": [{"code": 1}, {"code": 2}]},
                {"details": []},
                {"details": [{"code": 3}, {"message": "no code"}]},
            ]
        });
        assert_eq!(
            resolve("$.errors.*.details.*.code", &document),
            vec![json!(1), json!(2), json!(3)]
        );
    }

    #[test]
    fn test_wildcard_over_object_values() {
        let document = json!({"a": {"code": 1}, "b": {"code": 2}, "c": 3});
        assert_eq!(resolve("$.*.code", &document), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_resolution_is_lazy() {
        let document = json!({"items": [1, 2, 3]});
        let path = JsonPath::parse("$.items.*").unwrap();
        let mut values = path.resolve(&document);
        assert_eq!(values.next(), Some(&json!(1)));
        assert_eq!(values.count(), 2);
    }
}
