//! Attribute name resolution against the definition table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::AttributeDefinition;

/// An attribute definition paired with the name it was looked up by.
///
/// The name lives only in [`name`](Self::name); a `name` field stored in
/// the definition itself is dropped during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAttribute {
    pub name: String,
    #[serde(flatten)]
    pub definition: AttributeDefinition,
}

/// Resolves `names` in order against `attr_defs`.
///
/// Returns the resolved attributes and, separately, the names with no
/// definition, both in input order. Never fails; callers decide whether
/// missing definitions matter.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use command_spec_core::{AttributeDefinition, resolve_attributes};
///
/// let mut defs = BTreeMap::new();
/// defs.insert("name".to_string(), AttributeDefinition::new("display_name"));
///
/// let names = vec!["name".to_string(), "ghost".to_string()];
/// let (resolved, missing) = resolve_attributes(&names, &defs);
/// assert_eq!(resolved[0].name, "name");
/// assert_eq!(missing, ["ghost"]);
/// ```
pub fn resolve_attributes(
    names: &[String],
    attr_defs: &BTreeMap<String, AttributeDefinition>,
) -> (Vec<ResolvedAttribute>, Vec<String>) {
    let mut resolved = Vec::with_capacity(names.len());
    let mut missing = Vec::new();

    for name in names {
        match attr_defs.get(name) {
            Some(definition) => {
                let mut definition = definition.clone();
                definition.extra.remove("name");
                resolved.push(ResolvedAttribute {
                    name: name.clone(),
                    definition,
                });
            }
            None => missing.push(name.clone()),
        }
    }

    (resolved, missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_keeps_input_order_and_duplicates() {
        let mut defs = BTreeMap::new();
        defs.insert("b".to_string(), AttributeDefinition::new("b_var"));
        defs.insert("a".to_string(), AttributeDefinition::new("a_var"));

        let names: Vec<String> = ["b", "x", "a", "b", "y"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (resolved, missing) = resolve_attributes(&names, &defs);

        let order: Vec<&str> = resolved.iter().map(|attr| attr.name.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "b"]);
        assert_eq!(missing, vec!["x", "y"]);
        assert_eq!(resolved[1].definition.variable_name.as_deref(), Some("a_var"));
    }

    #[test]
    fn test_resolved_attribute_serializes_flat() {
        let attr = ResolvedAttribute {
            name: "summary".into(),
            definition: AttributeDefinition::new("summary").with_description("Short text"),
        };
        let value = serde_json::to_value(&attr).unwrap();
        assert_eq!(value["name"], "summary");
        assert_eq!(value["variable_name"], "summary");
        assert_eq!(value["description"], "Short text");
    }

    #[test]
    fn test_name_field_inside_definition_is_dropped() {
        let definition: AttributeDefinition =
            serde_json::from_str(r#"{"name": "Status", "variable_name": "status"}"#).unwrap();
        let mut defs = BTreeMap::new();
        defs.insert("Status".to_string(), definition);

        let (resolved, _) = resolve_attributes(&["Status".to_string()], &defs);
        assert!(!resolved[0].definition.extra.contains_key("name"));

        let raw = serde_json::to_string(&resolved[0]).unwrap();
        assert_eq!(raw.matches("\"name\"").count(), 1);
        assert!(defs["Status"].extra.contains_key("name"));
    }
}
