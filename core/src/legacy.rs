//! Projection of expanded commands into the flat legacy schema shape.
//!
//! The downstream command processor reads one object per command with the
//! pass-through metadata fields, `alternate_names` as a single string, and an
//! `Attributes` list of single-key maps (`{label: metadata}`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AttributeDefinition, Command, ExpandedCommand};

/// Legacy representation of one command.
///
/// Field names match what the downstream processor reads; absent source
/// fields are omitted rather than written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
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
    /// Alternate names joined with `"; "`.
    #[serde(default)]
    pub alternate_names: String,
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
    /// Ordered attributes, each a one-entry map from label to metadata.
    #[serde(rename = "Attributes", default)]
    pub attributes: Vec<BTreeMap<String, AttributeDefinition>>,
}

impl LegacySpec {
    /// Returns the attribute labels in order.
    pub fn attribute_labels(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .flat_map(|entry| entry.keys().map(String::as_str))
            .collect()
    }
}

/// Normalizes a loosely typed value into one semicolon-separated string.
///
/// # Examples
///
/// ```
/// use command_spec_core::to_semicolon_str;
/// use serde_json::json;
///
/// assert_eq!(to_semicolon_str(&json!(null)), "");
/// assert_eq!(to_semicolon_str(&json!(["a", "", "b"])), "a; b");
/// assert_eq!(to_semicolon_str(&json!("x")), "x");
/// assert_eq!(to_semicolon_str(&json!(42)), "42");
/// ```
pub fn to_semicolon_str(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.trim().to_string(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// Builds the legacy representation of `command` from its expansion.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use command_spec_core::*;
///
/// let mut defs = BTreeMap::new();
/// defs.insert("status".to_string(), AttributeDefinition::new("status"));
///
/// let mut cmd = Command::new(None).with_custom_attributes(["status"]);
/// cmd.alternate_names = Some(serde_json::json!(["Update Term", "Edit Term"]));
///
/// let expanded = expand_command(&cmd, &BTreeMap::new(), &defs).unwrap();
/// let legacy = project_legacy(&cmd, &expanded);
/// assert_eq!(legacy.alternate_names, "Update Term; Edit Term");
/// assert_eq!(legacy.attribute_labels(), ["status"]);
/// ```
pub fn project_legacy(command: &Command, expanded: &ExpandedCommand) -> LegacySpec {
    let attributes = expanded
        .all_attributes
        .iter()
        .map(|attr| BTreeMap::from([(attr.name.clone(), attr.definition.clone())]))
        .collect();

    LegacySpec {
        display_name: command.display_name.clone(),
        family: command.family.clone(),
        description: command.description.clone(),
        verb: command.verb.clone(),
        qn_prefix: command.qn_prefix.clone(),
        find_method: command.find_method.clone(),
        find_constraints: command.find_constraints.clone(),
        extra_find: command.extra_find.clone(),
        extra_constraints: command.extra_constraints.clone(),
        alternate_names: command
            .alternate_names
            .as_ref()
            .map(to_semicolon_str)
            .unwrap_or_default(),
        reference_url: command.reference_url.clone(),
        level: command.level.clone(),
        upsert: command.upsert.clone(),
        attach: command.attach.clone(),
        journal_entry: command.journal_entry.clone(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{Bundle, expand_command};

    #[test]
    fn test_semicolon_normalization() {
        assert_eq!(to_semicolon_str(&Value::Null), "");
        assert_eq!(to_semicolon_str(&json!(["a", "b"])), "a; b");
        assert_eq!(to_semicolon_str(&json!(["a", "  ", "b"])), "a; b");
        assert_eq!(to_semicolon_str(&json!("Create Term; New Term")), "Create Term; New Term");
        assert_eq!(to_semicolon_str(&json!(42)), "42");
        assert_eq!(to_semicolon_str(&json!(true)), "true");
        assert_eq!(to_semicolon_str(&json!([])), "");
    }

    #[test]
    fn test_projection_shape() {
        let mut bundles = BTreeMap::new();
        bundles.insert("Base".to_string(), Bundle::new(["name"]));
        let mut defs = BTreeMap::new();
        defs.insert(
            "name".to_string(),
            AttributeDefinition::new("display_name").mark_required(),
        );
        defs.insert("status".to_string(), AttributeDefinition::new("status"));

        let raw = json!({
            "bundle": "Base",
            "custom_attributes": ["status"],
            "display_name": "Create Term",
            "family": "Glossary",
            "verb": "Create",
            "find_constraints": "{\"metadataElementTypeName\": \"GlossaryTerm\"}",
            "ReferenceURL": "https://example.org/term",
            "Journal Entry": false,
            "internal_note": "not exported"
        });
        let cmd: Command = serde_json::from_value(raw).unwrap();
        let expanded = expand_command(&cmd, &bundles, &defs).unwrap();
        let value = serde_json::to_value(project_legacy(&cmd, &expanded)).unwrap();

        assert_eq!(value["display_name"], "Create Term");
        assert_eq!(value["alternate_names"], "");
        assert_eq!(value["ReferenceURL"], "https://example.org/term");
        assert_eq!(value["Journal Entry"], false);
        assert_eq!(
            value["find_constraints"],
            "{\"metadataElementTypeName\": \"GlossaryTerm\"}"
        );
        assert!(value.get("description").is_none());
        assert!(value.get("internal_note").is_none());
        assert!(value.get("bundle").is_none());

        let attrs = value["Attributes"].as_array().unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0]["name"]["variable_name"], "display_name");
        assert_eq!(attrs[0]["name"]["required"], true);
        assert!(attrs[0]["name"].get("name").is_none());
        assert_eq!(attrs[1]["status"]["variable_name"], "status");
        assert!(attrs[1]["status"].get("required").is_none());
    }

    #[test]
    fn test_projected_metadata_never_carries_name() {
        let mut defs = BTreeMap::new();
        defs.insert(
            "Status".to_string(),
            serde_json::from_value(json!({"name": "Status", "variable_name": "status"})).unwrap(),
        );
        let cmd = Command::new(None).with_custom_attributes(["Status"]);
        let expanded = expand_command(&cmd, &BTreeMap::new(), &defs).unwrap();
        let value = serde_json::to_value(project_legacy(&cmd, &expanded)).unwrap();

        assert_eq!(
            value["Attributes"],
            json!([{"Status": {"variable_name": "status"}}])
        );
    }
}
