//! Core types and resolution for compact command specifications.
//!
//! A compact specification describes commands through three tables:
//!
//! - [`AttributeDefinition`]: full metadata for one named field.
//! - [`Bundle`]: a named, inheritable group of attribute references.
//! - [`Command`]: an operation composed from one bundle plus custom
//!   attributes.
//!
//! [`SpecDocument`] holds the three tables. Resolution
//! ([`resolve_bundle_chain`], [`resolve_attributes`]) and expansion
//! ([`expand_command`]) turn a command into an ordered, fully resolved
//! attribute list, which [`project_legacy`] converts into the flat
//! [`LegacySpec`] shape read by the downstream command processor.
//!
//! Validation ([`validate_document`]) reports dangling references,
//! inheritance cycles, and missing variable names without failing.
//!
//! # Example
//!
//! ```
//! use command_spec_core::*;
//!
//! let mut doc = SpecDocument::new();
//! for attr in ["name", "summary", "status"] {
//!     doc.attribute_definitions.insert(attr.into(), AttributeDefinition::new(attr));
//! }
//! doc.bundles.insert("Base".into(), Bundle::new(["name"]));
//! doc.bundles.insert("Term".into(), Bundle::new(["summary"]).inheriting("Base"));
//! doc.commands.insert(
//!     "Create Term".into(),
//!     Command::new(Some("Term")).with_custom_attributes(["status"]),
//! );
//!
//! assert!(validate_document(&doc).is_empty());
//!
//! let cmd = &doc.commands["Create Term"];
//! let expanded = expand_command(cmd, &doc.bundles, &doc.attribute_definitions).unwrap();
//! let legacy = project_legacy(cmd, &expanded);
//! assert_eq!(legacy.attribute_labels(), ["name", "summary", "status"]);
//! ```

mod attributes;
mod bundle;
mod expand;
mod legacy;
mod types;
mod validate;

pub use attributes::{ResolvedAttribute, resolve_attributes};
pub use bundle::{ResolveError, bundle_lineage, resolve_bundle_chain};
pub use expand::{ExpandedCommand, ExpansionMode, expand_command, expand_command_with};
pub use legacy::{LegacySpec, project_legacy, to_semicolon_str};
pub use types::*;
pub use validate::{ValidationIssue, validate_document, validation_messages};
