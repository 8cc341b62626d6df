//! Whole-document consistency checks.
//!
//! [`validate_document`] sweeps a [`SpecDocument`] for dangling references,
//! inheritance cycles, and attribute definitions without a variable name.
//! It never fails: every violation becomes one [`ValidationIssue`], and an
//! empty result means the document is self-consistent.
//!
//! # Examples
//!
//! ```
//! use command_spec_core::*;
//!
//! let mut doc = SpecDocument::new();
//! doc.attribute_definitions.insert("name".into(), AttributeDefinition::new("display_name"));
//! doc.bundles.insert("Base".into(), Bundle::new(["name"]));
//! doc.commands.insert("Create Term".into(), Command::new(Some("Base")));
//! assert!(validate_document(&doc).is_empty());
//!
//! // Dangling custom attribute → one issue
//! doc.commands.insert(
//!     "Update Term".into(),
//!     Command::new(Some("Base")).with_custom_attributes(["status"]),
//! );
//! let issues = validate_document(&doc);
//! assert_eq!(issues.len(), 1);
//! assert!(issues[0].to_string().contains("Update Term"));
//! ```

use thiserror::Error;

use crate::{ResolveError, SpecDocument, resolve_bundle_chain};

/// A single consistency violation found by [`validate_document`].
///
/// The `Display` impl provides the human-readable issue line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// A bundle declares an attribute with no definition.
    #[error("Bundle '{bundle}' references undefined attribute '{attribute}'")]
    UnknownBundleAttribute { bundle: String, attribute: String },
    /// A bundle inherits from a bundle that does not exist.
    #[error("Bundle '{bundle}' inherits from unknown bundle '{parent}'")]
    UnknownParentBundle { bundle: String, parent: String },
    /// A command uses a bundle that does not exist.
    #[error("Command '{command}' references unknown bundle '{bundle}'")]
    UnknownCommandBundle { command: String, bundle: String },
    /// A command declares a custom attribute with no definition.
    #[error("Command '{command}' references undefined custom attribute '{attribute}'")]
    UnknownCustomAttribute { command: String, attribute: String },
    /// Resolving the bundle runs into an inheritance cycle.
    #[error("Bundle '{bundle}': {source}")]
    CircularInheritance {
        bundle: String,
        source: ResolveError,
    },
    /// An attribute definition has no (or a blank) `variable_name`.
    #[error("Attribute '{0}' is missing variable_name")]
    MissingVariableName(String),
}

/// Validates every cross-reference and required field in `document`.
///
/// Issues are reported in a fixed order: bundle attributes, bundle parents,
/// command bundles, command custom attributes, inheritance cycles, then
/// attribute definitions. Within each check, tables are walked in key order.
pub fn validate_document(document: &SpecDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let defs = &document.attribute_definitions;
    let bundles = &document.bundles;

    for (name, bundle) in bundles {
        for attribute in &bundle.own_attributes {
            if !defs.contains_key(attribute) {
                issues.push(ValidationIssue::UnknownBundleAttribute {
                    bundle: name.clone(),
                    attribute: attribute.clone(),
                });
            }
        }
    }

    for (name, bundle) in bundles {
        if let Some(parent) = &bundle.inherits {
            if !bundles.contains_key(parent) {
                issues.push(ValidationIssue::UnknownParentBundle {
                    bundle: name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    for (name, command) in &document.commands {
        if let Some(bundle) = &command.bundle {
            if !bundles.contains_key(bundle) {
                issues.push(ValidationIssue::UnknownCommandBundle {
                    command: name.clone(),
                    bundle: bundle.clone(),
                });
            }
        }
    }

    for (name, command) in &document.commands {
        for attribute in &command.custom_attributes {
            if !defs.contains_key(attribute) {
                issues.push(ValidationIssue::UnknownCustomAttribute {
                    command: name.clone(),
                    attribute: attribute.clone(),
                });
            }
        }
    }

    // Unknown ancestors were already reported as missing parents.
    for name in bundles.keys() {
        if let Err(err @ ResolveError::CircularInheritance { .. }) =
            resolve_bundle_chain(name, bundles)
        {
            issues.push(ValidationIssue::CircularInheritance {
                bundle: name.clone(),
                source: err,
            });
        }
    }

    for (name, definition) in defs {
        if !definition.has_variable_name() {
            issues.push(ValidationIssue::MissingVariableName(name.clone()));
        }
    }

    issues
}

/// Returns the issues of [`validate_document`] as display strings.
pub fn validation_messages(document: &SpecDocument) -> Vec<String> {
    validate_document(document)
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{AttributeDefinition, Bundle, Command};

    use super::*;

    fn consistent_document() -> SpecDocument {
        let mut doc = SpecDocument::new();
        for attr in ["name", "summary", "status"] {
            doc.attribute_definitions
                .insert(attr.to_string(), AttributeDefinition::new(attr));
        }
        doc.bundles.insert("Base".into(), Bundle::new(["name"]));
        doc.bundles
            .insert("Term".into(), Bundle::new(["summary"]).inheriting("Base"));
        doc.commands.insert(
            "Create Term".into(),
            Command::new(Some("Term")).with_custom_attributes(["status"]),
        );
        doc
    }

    #[test]
    fn test_consistent_document_has_no_issues() {
        assert!(validate_document(&consistent_document()).is_empty());
        assert!(validation_messages(&consistent_document()).is_empty());
    }

    #[test]
    fn test_undefined_bundle_attribute() {
        let mut doc = consistent_document();
        doc.bundles
            .get_mut("Term")
            .unwrap()
            .own_attributes
            .push("ghost".into());

        assert_eq!(
            validation_messages(&doc),
            vec!["Bundle 'Term' references undefined attribute 'ghost'"]
        );
    }

    #[test]
    fn test_unknown_parent_reported_once() {
        let mut doc = consistent_document();
        doc.bundles.get_mut("Term").unwrap().inherits = Some("Gone".into());

        assert_eq!(
            validate_document(&doc),
            vec![ValidationIssue::UnknownParentBundle {
                bundle: "Term".into(),
                parent: "Gone".into(),
            }]
        );
    }

    #[test]
    fn test_unknown_command_bundle() {
        let mut doc = consistent_document();
        doc.commands.get_mut("Create Term").unwrap().bundle = Some("Glossary".into());

        assert_eq!(
            validation_messages(&doc),
            vec!["Command 'Create Term' references unknown bundle 'Glossary'"]
        );
    }

    #[test]
    fn test_undefined_custom_attribute() {
        let mut doc = consistent_document();
        doc.commands
            .get_mut("Create Term")
            .unwrap()
            .custom_attributes
            .push("ghost".into());

        assert_eq!(
            validation_messages(&doc),
            vec!["Command 'Create Term' references undefined custom attribute 'ghost'"]
        );
    }

    #[test]
    fn test_missing_variable_name() {
        let mut doc = consistent_document();
        doc.attribute_definitions
            .get_mut("summary")
            .unwrap()
            .variable_name = None;

        assert_eq!(
            validate_document(&doc),
            vec![ValidationIssue::MissingVariableName("summary".into())]
        );
    }

    #[test]
    fn test_cycle_is_reported_per_bundle_without_panicking() {
        let mut doc = consistent_document();
        doc.bundles.get_mut("Base").unwrap().inherits = Some("Term".into());

        let messages = validation_messages(&doc);
        assert_eq!(
            messages,
            vec![
                "Bundle 'Base': Circular inheritance detected: Base (Base -> Term -> Base)",
                "Bundle 'Term': Circular inheritance detected: Term (Term -> Base -> Term)",
            ]
        );
    }

    #[test]
    fn test_issue_order_follows_check_order() {
        let mut doc = consistent_document();
        doc.attribute_definitions
            .insert("blank".into(), AttributeDefinition::new(""));
        doc.commands
            .insert("Orphan".into(), Command::new(Some("Nope")));
        doc.bundles.insert("Extra".into(), Bundle::new(["missing"]));

        let issues = validate_document(&doc);
        assert!(matches!(
            issues[0],
            ValidationIssue::UnknownBundleAttribute { .. }
        ));
        assert!(matches!(issues[1], ValidationIssue::UnknownCommandBundle { .. }));
        assert!(matches!(issues[2], ValidationIssue::MissingVariableName(_)));
        assert_eq!(issues.len(), 3);
    }
}
