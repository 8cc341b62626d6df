//! Tolerant decoding of exported specification files.
//!
//! Specification files come from an external authoring tool and are not
//! always valid JSON. Decoding runs an ordered chain of [`ParseStrategy`]
//! implementations and stops at the first one that yields a top-level
//! object:
//!
//! 1. `strict`: plain JSON.
//! 2. `trailing-commas`: drop commas directly before `}` or `]`.
//! 3. `embedded-json`: escape the quotes of JSON objects stored as strings
//!    in `find_constraints`, `extra_find`, and `extra_constraints`.
//! 4. `relaxed`: YAML flow syntax, which also accepts comments, single
//!    quotes, and unquoted keys.
//!
//! # Examples
//!
//! ```
//! use command_spec_loader::parse_spec_str;
//!
//! let raw = r#"{"bundles": {"Base": {"own_attributes": ["name",]},}, }"#;
//! let parsed = parse_spec_str(raw, "inline").unwrap();
//! assert_eq!(parsed.strategy, "trailing-commas");
//! assert!(parsed.document.bundles.contains_key("Base"));
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use command_spec_core::SpecDocument;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::error::{DecodeError, Result};

/// Fields whose values are JSON objects re-encoded as strings.
pub const EMBEDDED_JSON_FIELDS: [&str; 3] = ["find_constraints", "extra_find", "extra_constraints"];

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern is valid"));

static EMBEDDED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(find_constraints|extra_find|extra_constraints)"(\s*:\s*)"(\{[^{}]*\})""#)
        .expect("embedded json pattern is valid")
});

/// Why one strategy could not decode the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl StrategyFailure {
    fn from_json(strategy: &'static str, err: &serde_json::Error) -> Self {
        Self {
            strategy,
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// One attempt at turning specification text into a JSON value.
pub trait ParseStrategy {
    fn name(&self) -> &'static str;
    fn parse(&self, raw: &str) -> std::result::Result<Value, StrategyFailure>;
}

/// Plain JSON.
pub struct StrictJson;

impl ParseStrategy for StrictJson {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn parse(&self, raw: &str) -> std::result::Result<Value, StrategyFailure> {
        serde_json::from_str(raw).map_err(|err| StrategyFailure::from_json(self.name(), &err))
    }
}

/// JSON after removing trailing commas.
pub struct TrailingCommas;

impl ParseStrategy for TrailingCommas {
    fn name(&self) -> &'static str {
        "trailing-commas"
    }

    fn parse(&self, raw: &str) -> std::result::Result<Value, StrategyFailure> {
        let repaired = strip_trailing_commas(raw);
        serde_json::from_str(&repaired).map_err(|err| StrategyFailure::from_json(self.name(), &err))
    }
}

/// JSON after escaping string-encoded objects and removing trailing commas.
pub struct EmbeddedJson;

impl ParseStrategy for EmbeddedJson {
    fn name(&self) -> &'static str {
        "embedded-json"
    }

    fn parse(&self, raw: &str) -> std::result::Result<Value, StrategyFailure> {
        let escaped = escape_embedded_json(raw);
        let repaired = strip_trailing_commas(&escaped);
        serde_json::from_str(&repaired).map_err(|err| StrategyFailure::from_json(self.name(), &err))
    }
}

/// YAML parse of the raw text.
pub struct RelaxedYaml;

impl ParseStrategy for RelaxedYaml {
    fn name(&self) -> &'static str {
        "relaxed"
    }

    fn parse(&self, raw: &str) -> std::result::Result<Value, StrategyFailure> {
        serde_yaml::from_str(raw).map_err(|err| {
            let (line, column) = err
                .location()
                .map(|loc| (loc.line(), loc.column()))
                .unwrap_or((0, 0));
            StrategyFailure {
                strategy: self.name(),
                line,
                column,
                message: err.to_string(),
            }
        })
    }
}

/// Returns the strategies in the order they are attempted.
pub fn default_strategies() -> Vec<Box<dyn ParseStrategy>> {
    vec![
        Box::new(StrictJson),
        Box::new(TrailingCommas),
        Box::new(EmbeddedJson),
        Box::new(RelaxedYaml),
    ]
}

/// A table entry that did not match its record shape and was left out of
/// the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// `attribute_definitions`, `bundles`, or `commands`.
    pub table: &'static str,
    pub name: String,
    pub reason: String,
}

impl fmt::Display for RejectedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} entry '{}': {}", self.table, self.name, self.reason)
    }
}

/// A decoded document and the strategy that decoded it.
#[derive(Debug, Clone)]
pub struct ParsedSpec {
    pub document: SpecDocument,
    pub strategy: &'static str,
    /// Entries skipped because their fields had the wrong shape.
    pub rejected: Vec<RejectedEntry>,
}

impl ParsedSpec {
    /// Returns `true` if the text needed a repair to decode.
    pub fn was_repaired(&self) -> bool {
        self.strategy != StrictJson.name()
    }
}

/// Decodes one table entry by entry, so a single malformed record only
/// costs that record.
fn decode_table<T: DeserializeOwned>(
    origin: &str,
    table: &'static str,
    entries: Map<String, Value>,
    target: &mut BTreeMap<String, T>,
    rejected: &mut Vec<RejectedEntry>,
) {
    for (name, raw) in entries {
        match serde_json::from_value::<T>(raw) {
            Ok(entry) => {
                target.insert(name, entry);
            }
            Err(err) => {
                warn!(origin, table, entry = %name, error = %err, "skipping malformed entry");
                rejected.push(RejectedEntry {
                    table,
                    name,
                    reason: err.to_string(),
                });
            }
        }
    }
}

/// Builds a [`SpecDocument`] from a decoded top-level object. Unknown
/// top-level keys are ignored and a `null` table counts as empty.
fn decode_document(
    origin: &str,
    mut root: Map<String, Value>,
) -> std::result::Result<(SpecDocument, Vec<RejectedEntry>), DecodeError> {
    let mut document = SpecDocument::new();
    let mut rejected = Vec::new();

    let mut take_table = |table: &'static str| match root.remove(table) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(entries)) => Ok(entries),
        Some(other) => Err(DecodeError {
            origin: origin.to_string(),
            line: 0,
            column: 0,
            message: format!("table '{table}' is {}, expected an object", value_kind(&other)),
            hint: "tables must be objects keyed by name".to_string(),
        }),
    };
    let definitions = take_table("attribute_definitions")?;
    let bundles = take_table("bundles")?;
    let commands = take_table("commands")?;

    decode_table(
        origin,
        "attribute_definitions",
        definitions,
        &mut document.attribute_definitions,
        &mut rejected,
    );
    decode_table(origin, "bundles", bundles, &mut document.bundles, &mut rejected);
    decode_table(origin, "commands", commands, &mut document.commands, &mut rejected);

    Ok((document, rejected))
}

/// Removes commas that directly precede a closing brace or bracket.
///
/// # Examples
///
/// ```
/// use command_spec_loader::strip_trailing_commas;
///
/// assert_eq!(strip_trailing_commas("[1, 2, ]"), "[1, 2 ]");
/// assert_eq!(strip_trailing_commas("{\"a\": 1,\n}"), "{\"a\": 1\n}");
/// ```
pub fn strip_trailing_commas(raw: &str) -> Cow<'_, str> {
    TRAILING_COMMA.replace_all(raw, "$1")
}

/// Escapes bare double quotes inside string-encoded objects of the
/// [`EMBEDDED_JSON_FIELDS`].
///
/// # Examples
///
/// ```
/// use command_spec_loader::escape_embedded_json;
///
/// let raw = r#"{"extra_find": "{"type": "Term"}"}"#;
/// assert_eq!(escape_embedded_json(raw), r#"{"extra_find": "{\"type\": \"Term\"}"}"#);
/// ```
pub fn escape_embedded_json(raw: &str) -> Cow<'_, str> {
    EMBEDDED_JSON.replace_all(raw, |caps: &regex::Captures<'_>| {
        format!(
            "\"{}\"{}\"{}\"",
            &caps[1],
            &caps[2],
            escape_unescaped_quotes(&caps[3])
        )
    })
}

fn escape_unescaped_quotes(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len() + 8);
    let mut escaped = false;
    for ch in inner.chars() {
        if ch == '"' && !escaped {
            out.push('\\');
        }
        escaped = ch == '\\' && !escaped;
        out.push(ch);
    }
    out
}

fn decode_hint(raw: &str) -> &'static str {
    if TRAILING_COMMA.is_match(raw) {
        "trailing comma before a closing brace or bracket"
    } else if EMBEDDED_JSON_FIELDS.iter().any(|field| raw.contains(field)) {
        "unescaped double quotes inside a string value, e.g. a string-encoded JSON constraint"
    } else {
        "unescaped double quotes or trailing commas"
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes specification text, trying each strategy in order.
///
/// `origin` labels the text in errors and logs (usually the file path).
///
/// # Errors
///
/// Returns a [`DecodeError`] carrying the strict parser's position when no
/// strategy yields a top-level object, or when the object does not have the
/// shape of a [`SpecDocument`].
pub fn parse_spec_str(raw: &str, origin: &str) -> std::result::Result<ParsedSpec, DecodeError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut first_failure: Option<StrategyFailure> = None;

    for strategy in default_strategies() {
        let failure = match strategy.parse(raw) {
            Ok(Value::Object(root)) => {
                let (document, rejected) = decode_document(origin, root)?;
                if strategy.name() != StrictJson.name() {
                    debug!(origin, strategy = strategy.name(), "decoded after repair");
                }
                return Ok(ParsedSpec {
                    document,
                    strategy: strategy.name(),
                    rejected,
                });
            }
            Ok(other) => StrategyFailure {
                strategy: strategy.name(),
                line: 1,
                column: 1,
                message: format!("expected a top-level object, found {}", value_kind(&other)),
            },
            Err(failure) => failure,
        };

        trace!(
            origin,
            strategy = failure.strategy,
            line = failure.line,
            column = failure.column,
            "parse strategy failed"
        );
        first_failure.get_or_insert(failure);
    }

    let failure = first_failure.unwrap_or(StrategyFailure {
        strategy: StrictJson.name(),
        line: 0,
        column: 0,
        message: "no parse strategy available".to_string(),
    });

    Err(DecodeError {
        origin: origin.to_string(),
        line: failure.line,
        column: failure.column,
        message: failure.message,
        hint: decode_hint(raw).to_string(),
    })
}

/// Reads and decodes one specification file.
///
/// # Errors
///
/// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot be
/// read, or [`Decode`](crate::LoaderError::Decode) if no strategy decodes
/// it.
pub fn load_spec_file(path: impl AsRef<Path>) -> Result<ParsedSpec> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let parsed = parse_spec_str(&raw, &path.display().to_string())?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = r#"{
        "attribute_definitions": {"name": {"variable_name": "display_name"}},
        "bundles": {"Base": {"own_attributes": ["name"]}},
        "commands": {"Create Term": {"bundle": "Base"}}
    }"#;

    #[test]
    fn test_clean_json_uses_strict() {
        let parsed = parse_spec_str(CLEAN, "clean").unwrap();
        assert_eq!(parsed.strategy, "strict");
        assert!(!parsed.was_repaired());
        assert_eq!(parsed.document.commands.len(), 1);
    }

    #[test]
    fn test_trailing_commas_are_repaired() {
        let raw = r#"{
            "bundles": {"Base": {"own_attributes": ["name", "summary",],},},
            "commands": {},
        }"#;
        let parsed = parse_spec_str(raw, "commas").unwrap();
        assert_eq!(parsed.strategy, "trailing-commas");
        assert_eq!(parsed.document.bundles["Base"].own_attributes.len(), 2);
    }

    #[test]
    fn test_string_encoded_constraints_are_escaped() {
        let raw = r#"{
            "commands": {
                "Create Term": {
                    "find_constraints": "{"metadataElementTypeName": "GlossaryTerm"}",
                    "extra_find": "{\"already\": \"escaped\"}",
                    "display_name": "Create Term",
                }
            }
        }"#;
        let parsed = parse_spec_str(raw, "embedded").unwrap();
        assert_eq!(parsed.strategy, "embedded-json");

        let cmd = &parsed.document.commands["Create Term"];
        assert_eq!(
            cmd.find_constraints,
            Some(Value::String(
                r#"{"metadataElementTypeName": "GlossaryTerm"}"#.to_string()
            ))
        );
        assert_eq!(
            cmd.extra_find,
            Some(Value::String(r#"{"already": "escaped"}"#.to_string()))
        );
    }

    #[test]
    fn test_relaxed_fallback_accepts_comments_and_single_quotes() {
        let raw = "# exported by hand\n{'bundles': {'Base': {'own_attributes': ['name']}}}";
        let parsed = parse_spec_str(raw, "relaxed").unwrap();
        assert_eq!(parsed.strategy, "relaxed");
        assert!(parsed.document.bundles.contains_key("Base"));
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let raw = format!("\u{feff}{CLEAN}");
        assert_eq!(parse_spec_str(&raw, "bom").unwrap().strategy, "strict");
    }

    #[test]
    fn test_undecodable_text_reports_strict_position() {
        let raw = "{\n  \"commands\": {\n    \"Broken\": {\"display_name\": \"a\" \"b\"}\n";
        let err = parse_spec_str(raw, "broken.json").unwrap_err();
        assert_eq!(err.origin, "broken.json");
        assert_eq!(err.line, 3);
        assert!(err.column > 0);
        assert!(err.to_string().starts_with("failed to decode broken.json at line 3"));
    }

    #[test]
    fn test_plain_text_is_not_a_document() {
        let err = parse_spec_str("just some words", "words").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.hint, "unescaped double quotes or trailing commas");
    }

    #[test]
    fn test_top_level_array_is_rejected() {
        let err = parse_spec_str("[1, 2]", "array").unwrap_err();
        assert!(err.message.contains("an array"));
    }

    #[test]
    fn test_wrong_table_shape_is_a_decode_error() {
        let err = parse_spec_str(r#"{"bundles": ["Base"]}"#, "shape").unwrap_err();
        assert_eq!(err.line, 0);
        assert!(err.message.contains("table 'bundles' is an array"));
        assert_eq!(err.hint, "tables must be objects keyed by name");
    }

    #[test]
    fn test_malformed_entries_are_rejected_individually() {
        let raw = r#"{
            "attribute_definitions": {"name": {"variable_name": "display_name"}},
            "bundles": {
                "Base": {"own_attributes": ["name"]},
                "Twisted": {"inherits": 7, "own_attributes": []}
            },
            "commands": {
                "Good": {"bundle": "Base", "display_name": "Good"},
                "Numbered": {"bundle": "Base", "display_name": 42},
                "Flat": {"custom_attributes": "name"}
            }
        }"#;
        let parsed = parse_spec_str(raw, "mixed.json").unwrap();
        assert_eq!(parsed.strategy, "strict");

        let doc = &parsed.document;
        assert_eq!(doc.commands.keys().collect::<Vec<_>>(), ["Good"]);
        assert_eq!(doc.bundles.keys().collect::<Vec<_>>(), ["Base"]);
        assert_eq!(doc.attribute_definitions.len(), 1);

        let rejected: Vec<(&str, &str)> = parsed
            .rejected
            .iter()
            .map(|entry| (entry.table, entry.name.as_str()))
            .collect();
        assert_eq!(
            rejected,
            [("bundles", "Twisted"), ("commands", "Flat"), ("commands", "Numbered")]
        );
        assert!(parsed.rejected[2].reason.contains("42"));
        assert!(parsed.rejected[2].to_string().starts_with("commands entry 'Numbered': "));
    }

    #[test]
    fn test_null_table_is_empty() {
        let parsed = parse_spec_str(r#"{"bundles": null, "commands": {}}"#, "null").unwrap();
        assert!(parsed.document.is_empty());
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_escape_leaves_unrelated_fields_alone() {
        let raw = r#"{"description": "{"not": "touched"}"}"#;
        assert_eq!(escape_embedded_json(raw), raw);
    }
}
