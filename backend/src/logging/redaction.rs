//! Deny-list redaction applied to every log record.
//!
//! Two rule kinds are applied, both matching keys case-sensitively:
//! - keys, stripped at any depth including inside arrays;
//! - dotted paths such as `headers.authorization`, where a `*` segment
//!   matches any key at that level.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// Keys stripped from every record unless the policy is rebuilt without them.
pub const DEFAULT_REDACT_KEYS: &[&str] = &[
    "password",
    "passwordHash",
    "currentPassword",
    "newPassword",
    "token",
    "accessToken",
    "refreshToken",
    "secret",
    "clientSecret",
    "apiKey",
];

/// Nested fields stripped from every record.
pub const DEFAULT_REDACT_PATHS: &[&str] = &[
    "headers.authorization",
    "headers.cookie",
    "req.headers.authorization",
    "req.headers.cookie",
    "res.headers.set-cookie",
];

/// A redaction path failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedactionPathError {
    /// The path was blank.
    #[error("redaction path must not be empty")]
    Empty,
    /// A dotted segment was blank, as in `a..b`.
    #[error("redaction path `{path}` contains an empty segment")]
    EmptySegment {
        /// Offending path.
        path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Any,
}

/// Parsed dotted path.
///
/// # Examples
/// ```
/// use switchboard::logging::RedactionPath;
///
/// assert!("headers.authorization".parse::<RedactionPath>().is_ok());
/// assert!("a..b".parse::<RedactionPath>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionPath {
    raw: String,
    segments: Vec<Segment>,
}

impl RedactionPath {
    /// Original dotted form.
    pub fn as_str(&self) -> &str {
        self.raw.as_str()
    }
}

impl FromStr for RedactionPath {
    type Err = RedactionPathError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err(RedactionPathError::Empty);
        }
        let segments = raw
            .split('.')
            .map(|segment| match segment.trim() {
                "" => Err(RedactionPathError::EmptySegment {
                    path: raw.to_owned(),
                }),
                "*" => Ok(Segment::Any),
                key => Ok(Segment::Key(key.to_owned())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }
}

impl fmt::Display for RedactionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Keys and paths removed from log records before they reach the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionPolicy {
    keys: BTreeSet<String>,
    paths: Vec<RedactionPath>,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        let paths = DEFAULT_REDACT_PATHS
            .iter()
            .filter_map(|path| path.parse().ok())
            .collect();
        Self {
            keys: DEFAULT_REDACT_KEYS.iter().map(|key| (*key).to_owned()).collect(),
            paths,
        }
    }
}

impl RedactionPolicy {
    /// Policy with no rules.
    #[must_use]
    pub fn none() -> Self {
        Self {
            keys: BTreeSet::new(),
            paths: Vec::new(),
        }
    }

    /// Add keys stripped at any depth. Blank entries are ignored.
    #[must_use]
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keys.extend(
            keys.into_iter()
                .map(|key| key.as_ref().trim().to_owned())
                .filter(|key| !key.is_empty()),
        );
        self
    }

    /// Add dotted paths.
    pub fn with_paths<I, S>(mut self, paths: I) -> Result<Self, RedactionPathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            let parsed = path.as_ref().parse::<RedactionPath>()?;
            if !self.paths.contains(&parsed) {
                self.paths.push(parsed);
            }
        }
        Ok(self)
    }

    /// Whether `key` is on the deny-list.
    pub fn denies(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Configured paths.
    pub fn paths(&self) -> &[RedactionPath] {
        &self.paths
    }

    /// Strip denied keys and paths from `record` in place.
    pub fn apply(&self, record: &mut Map<String, Value>) {
        if !self.keys.is_empty() {
            strip_keys(record, &self.keys);
        }
        for path in &self.paths {
            strip_path(record, &path.segments);
        }
    }
}

fn strip_keys(map: &mut Map<String, Value>, keys: &BTreeSet<String>) {
    map.retain(|key, _| !keys.contains(key));
    for value in map.values_mut() {
        strip_keys_in_value(value, keys);
    }
}

fn strip_keys_in_value(value: &mut Value, keys: &BTreeSet<String>) {
    match value {
        Value::Object(map) => strip_keys(map, keys),
        Value::Array(items) => {
            for item in items {
                strip_keys_in_value(item, keys);
            }
        }
        _ => {}
    }
}

fn strip_path(map: &mut Map<String, Value>, segments: &[Segment]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        match head {
            Segment::Key(key) => {
                map.remove(key);
            }
            Segment::Any => map.clear(),
        }
        return;
    }
    match head {
        Segment::Key(key) => {
            if let Some(child) = map.get_mut(key) {
                strip_path_in_value(child, rest);
            }
        }
        Segment::Any => {
            for child in map.values_mut() {
                strip_path_in_value(child, rest);
            }
        }
    }
}

fn strip_path_in_value(value: &mut Value, segments: &[Segment]) {
    match value {
        Value::Object(map) => strip_path(map, segments),
        Value::Array(items) => {
            for item in items {
                strip_path_in_value(item, segments);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[rstest]
    fn default_keys_are_stripped_at_any_depth() {
        let mut fields = record(json!({
            "password": "hunter2",
            "user": { "name": "ada", "password": "hunter2" },
            "attempts": [{ "token": "abc", "ok": false }],
        }));
        RedactionPolicy::default().apply(&mut fields);
        assert_eq!(
            Value::Object(fields),
            json!({
                "user": { "name": "ada" },
                "attempts": [{ "ok": false }],
            })
        );
    }

    #[rstest]
    fn keys_match_case_sensitively() {
        let mut fields = record(json!({ "Password": "kept", "password": "dropped" }));
        RedactionPolicy::default().apply(&mut fields);
        assert_eq!(Value::Object(fields), json!({ "Password": "kept" }));
    }

    #[rstest]
    fn default_paths_strip_nested_headers_only() {
        let mut fields = record(json!({
            "headers": { "authorization": "Bearer x", "accept": "*/*" },
            "authorization": "top-level is not a default key",
        }));
        RedactionPolicy::default().apply(&mut fields);
        assert_eq!(
            Value::Object(fields),
            json!({
                "headers": { "accept": "*/*" },
                "authorization": "top-level is not a default key",
            })
        );
    }

    #[rstest]
    fn wildcard_segments_match_any_key() {
        let policy = RedactionPolicy::none()
            .with_paths(["*.ssn"])
            .expect("valid path");
        let mut fields = record(json!({
            "ssn": "top",
            "alice": { "ssn": "1", "age": 3 },
            "bob": [{ "ssn": "2" }],
        }));
        policy.apply(&mut fields);
        assert_eq!(
            Value::Object(fields),
            json!({ "ssn": "top", "alice": { "age": 3 }, "bob": [{}] })
        );
    }

    #[rstest]
    fn extra_keys_extend_the_defaults() {
        let policy = RedactionPolicy::default().with_keys(["ssn", " ", "iban"]);
        assert!(policy.denies("ssn"));
        assert!(policy.denies("iban"));
        assert!(policy.denies("password"));
        assert!(!policy.denies(""));
    }

    #[rstest]
    #[case("", RedactionPathError::Empty)]
    #[case("a..b", RedactionPathError::EmptySegment { path: "a..b".into() })]
    #[case(".a", RedactionPathError::EmptySegment { path: ".a".into() })]
    fn invalid_paths_are_rejected(#[case] raw: &str, #[case] expected: RedactionPathError) {
        assert_eq!(raw.parse::<RedactionPath>(), Err(expected));
    }
}
