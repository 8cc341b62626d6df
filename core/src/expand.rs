//! Command expansion.
//!
//! Expanding a [`Command`] composes its bundle chain and custom attributes
//! into one ordered list of resolved attributes: root-bundle attributes
//! first, the command's own `custom_attributes` last.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use command_spec_core::*;
//!
//! let mut bundles = BTreeMap::new();
//! bundles.insert("Base".to_string(), Bundle::new(["name"]));
//! bundles.insert("Term".to_string(), Bundle::new(["summary"]).inheriting("Base"));
//!
//! let mut defs = BTreeMap::new();
//! for attr in ["name", "summary", "status"] {
//!     defs.insert(attr.to_string(), AttributeDefinition::new(attr));
//! }
//!
//! let cmd = Command::new(Some("Term")).with_custom_attributes(["status"]);
//! let expanded = expand_command(&cmd, &bundles, &defs).unwrap();
//! let names: Vec<&str> = expanded.all_attributes.iter().map(|a| a.name.as_str()).collect();
//! assert_eq!(names, ["name", "summary", "status"]);
//! assert_eq!(expanded.bundle_chain, ["Base", "Term"]);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    AttributeDefinition, Bundle, Command, ResolveError, ResolvedAttribute, bundle_lineage,
    resolve_attributes, resolve_bundle_chain,
};

/// How a command's reference to an absent bundle is treated.
///
/// # Examples
///
/// ```
/// use command_spec_core::ExpansionMode;
///
/// assert_eq!(ExpansionMode::default(), ExpansionMode::Lenient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionMode {
    /// Treat the bundle as empty and expand custom attributes only.
    #[default]
    Lenient,
    /// Fail with [`ResolveError::UnknownBundle`].
    Strict,
}

/// A command resolved into its full attribute schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedCommand {
    /// Bundle names from the root ancestor down to the command's bundle.
    pub bundle_chain: Vec<String>,
    /// Resolved attributes: inherited first, then custom.
    pub all_attributes: Vec<ResolvedAttribute>,
    /// Number of resolved attributes (`all_attributes.len()`).
    pub total_attribute_count: usize,
    /// Number of attribute names contributed by the bundle chain.
    pub bundle_attribute_count: usize,
    /// Number of attribute names declared as custom on the command.
    pub custom_attribute_count: usize,
    /// Referenced names that have no definition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_attribute_defs: Vec<String>,
}

impl ExpandedCommand {
    /// Returns `true` if every referenced attribute resolved.
    pub fn is_complete(&self) -> bool {
        self.missing_attribute_defs.is_empty()
    }
}

/// Expands `command` in [`ExpansionMode::Lenient`] mode.
///
/// # Errors
///
/// Returns a [`ResolveError`] when the command's bundle exists but its
/// inheritance chain is circular or names an absent ancestor.
pub fn expand_command(
    command: &Command,
    bundles: &BTreeMap<String, Bundle>,
    attr_defs: &BTreeMap<String, AttributeDefinition>,
) -> Result<ExpandedCommand, ResolveError> {
    expand_command_with(command, bundles, attr_defs, ExpansionMode::Lenient)
}

/// Expands `command`, treating an absent bundle reference according to
/// `mode`.
///
/// # Errors
///
/// Returns a [`ResolveError`] for a broken inheritance chain, and in
/// [`ExpansionMode::Strict`] also for a bundle reference with no entry in
/// `bundles`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use command_spec_core::*;
///
/// let cmd = Command::new(Some("Missing"));
/// let bundles = BTreeMap::new();
/// let defs = BTreeMap::new();
///
/// let lenient = expand_command_with(&cmd, &bundles, &defs, ExpansionMode::Lenient).unwrap();
/// assert!(lenient.bundle_chain.is_empty());
///
/// let strict = expand_command_with(&cmd, &bundles, &defs, ExpansionMode::Strict);
/// assert_eq!(strict, Err(ResolveError::UnknownBundle("Missing".into())));
/// ```
pub fn expand_command_with(
    command: &Command,
    bundles: &BTreeMap<String, Bundle>,
    attr_defs: &BTreeMap<String, AttributeDefinition>,
    mode: ExpansionMode,
) -> Result<ExpandedCommand, ResolveError> {
    let (bundle_chain, bundle_attrs) = match command.bundle.as_deref() {
        Some(name) if bundles.contains_key(name) => (
            bundle_lineage(name, bundles)?,
            resolve_bundle_chain(name, bundles)?,
        ),
        Some(name) if mode == ExpansionMode::Strict => {
            return Err(ResolveError::UnknownBundle(name.to_string()));
        }
        _ => (Vec::new(), Vec::new()),
    };

    let bundle_attribute_count = bundle_attrs.len();
    let custom_attribute_count = command.custom_attributes.len();

    let mut names = bundle_attrs;
    names.extend(command.custom_attributes.iter().cloned());

    let (all_attributes, missing_attribute_defs) = resolve_attributes(&names, attr_defs);

    Ok(ExpandedCommand {
        bundle_chain,
        total_attribute_count: all_attributes.len(),
        all_attributes,
        bundle_attribute_count,
        custom_attribute_count,
        missing_attribute_defs,
    })
}
