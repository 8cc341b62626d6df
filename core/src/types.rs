//! Specification document type definitions.
//!
//! This module defines the data model of a compact command specification:
//! attribute definitions, inheritable bundles, and commands, grouped into a
//! [`SpecDocument`]. The types are designed for serialization with
//! [`serde`] and accept the field names used by exported specification
//! files verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Full metadata for one named attribute.
///
/// Every field is optional at the type level. A missing `variable_name` is
/// tolerated while loading and reported by
/// [`validate_document`](crate::validate_document). `required` keeps the
/// exporter's spelling; [`is_required`](Self::is_required) interprets it.
///
/// Fields not modeled here are kept in [`extra`](Self::extra) so they reach
/// the legacy projection unchanged.
///
/// # Examples
///
/// ```
/// use command_spec_core::AttributeDefinition;
///
/// let def: AttributeDefinition = serde_json::from_str(
///     r#"{"variable_name": "display_name", "required": "True", "min_length": 1}"#,
/// ).unwrap();
/// assert_eq!(def.variable_name.as_deref(), Some("display_name"));
/// assert!(def.is_required());
/// assert_eq!(def.required, Some(serde_json::json!("True")));
/// assert_eq!(def.extra["min_length"], 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Name of the variable the downstream processor binds the value to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
    /// Declared data type (e.g., `"string"`, `"list"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Display/parse style (e.g., `"Simple"`, `"Reference Name"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Visibility level (e.g., `"Basic"`, `"Advanced"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Whether a value must be supplied, as written in the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Value>,
    /// Example value, kept in whatever shape the exporter wrote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Remaining fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl AttributeDefinition {
    /// Creates a definition with only a variable name set.
    pub fn new(variable_name: &str) -> Self {
        Self {
            variable_name: Some(variable_name.to_string()),
            ..Self::default()
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Marks the attribute as required.
    pub fn mark_required(mut self) -> Self {
        self.required = Some(Value::Bool(true));
        self
    }

    /// Returns `true` when `required` is set to `true`, a truthy string
    /// (`"True"`, `"yes"`, `"y"`, `"1"`), or a nonzero number.
    pub fn is_required(&self) -> bool {
        match &self.required {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "y" | "1"
            ),
            Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        }
    }

    /// Returns `true` when `variable_name` is present and not blank.
    pub fn has_variable_name(&self) -> bool {
        self.variable_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

/// A named, inheritable group of attribute references.
///
/// # Examples
///
/// ```
/// use command_spec_core::Bundle;
///
/// let base = Bundle::new(["display_name", "description"]);
/// let term = Bundle::new(["summary"]).inheriting("Base");
/// assert_eq!(term.inherits.as_deref(), Some("Base"));
/// assert_eq!(base.own_attributes.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Parent bundle name; at most one parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits: Option<String>,
    /// Attribute names declared directly on this bundle, in order.
    #[serde(default)]
    pub own_attributes: Vec<String>,
}

impl Bundle {
    /// Creates a root bundle declaring `attributes`.
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inherits: None,
            own_attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the parent bundle.
    pub fn inheriting(mut self, parent: &str) -> Self {
        self.inherits = Some(parent.to_string());
        self
    }
}

/// A named operation composed from one bundle plus custom attributes.
///
/// Metadata fields are passed through to the legacy projection. Fields whose
/// shape differs between exports (constraint blobs, `alternate_names`,
/// flags) are kept as raw JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Bundle supplying inherited attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    /// Attribute names specific to this command, appended after the bundle's.
    #[serde(default)]
    pub custom_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Command family used by allow-list filtering (e.g., `"Glossary"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qn_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_constraints: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_find: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_constraints: Option<Value>,
    /// Alternate command names, as a list or a pre-joined string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_names: Option<Value>,
    #[serde(
        rename = "ReferenceURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsert: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach: Option<Value>,
    #[serde(
        rename = "Journal Entry",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub journal_entry: Option<Value>,
    /// Remaining fields, not part of the legacy projection.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Command {
    /// Creates a command using `bundle`, with no custom attributes.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_spec_core::Command;
    ///
    /// let cmd = Command::new(Some("Term"))
    ///     .with_custom_attributes(["status"])
    ///     .in_family("Glossary");
    /// assert_eq!(cmd.bundle.as_deref(), Some("Term"));
    /// assert_eq!(cmd.custom_attributes, vec!["status".to_string()]);
    /// ```
    pub fn new(bundle: Option<&str>) -> Self {
        Self {
            bundle: bundle.map(String::from),
            ..Self::default()
        }
    }

    /// Appends custom attribute names.
    pub fn with_custom_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_attributes
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the command family.
    pub fn in_family(mut self, family: &str) -> Self {
        self.family = Some(family.to_string());
        self
    }
}

/// A whole specification document: the three name-keyed tables.
///
/// Tables are ordered maps so iteration (validation, reports, export) is
/// deterministic. Missing tables deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecDocument {
    #[serde(default)]
    pub attribute_definitions: BTreeMap<String, AttributeDefinition>,
    #[serde(default)]
    pub bundles: BTreeMap<String, Bundle>,
    #[serde(default)]
    pub commands: BTreeMap<String, Command>,
}

impl SpecDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `other` into `self`; entries in `other` replace entries with
    /// the same key.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_spec_core::{AttributeDefinition, SpecDocument};
    ///
    /// let mut first = SpecDocument::new();
    /// first.attribute_definitions.insert("name".into(), AttributeDefinition::new("old"));
    ///
    /// let mut second = SpecDocument::new();
    /// second.attribute_definitions.insert("name".into(), AttributeDefinition::new("new"));
    ///
    /// first.merge(second);
    /// let def = &first.attribute_definitions["name"];
    /// assert_eq!(def.variable_name.as_deref(), Some("new"));
    /// ```
    pub fn merge(&mut self, other: SpecDocument) {
        self.attribute_definitions
            .extend(other.attribute_definitions);
        self.bundles.extend(other.bundles);
        self.commands.extend(other.commands);
    }

    /// Returns `true` if all three tables are empty.
    pub fn is_empty(&self) -> bool {
        self.attribute_definitions.is_empty() && self.bundles.is_empty() && self.commands.is_empty()
    }
}
