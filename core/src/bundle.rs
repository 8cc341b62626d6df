//! Bundle inheritance resolution.
//!
//! A bundle names at most one parent through `inherits`, so the inheritance
//! relation is a forest. Resolving a bundle walks from the bundle up to its
//! root, then emits attribute names root-first. The walk is iterative and
//! tracks the bundles it has visited for the duration of a single call, which
//! bounds it by the chain length and turns any cycle into an error.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//! use command_spec_core::{Bundle, resolve_bundle_chain, bundle_lineage};
//!
//! let mut bundles = BTreeMap::new();
//! bundles.insert("Base".to_string(), Bundle::new(["display_name"]));
//! bundles.insert("Term".to_string(), Bundle::new(["summary"]).inheriting("Base"));
//!
//! assert_eq!(resolve_bundle_chain("Term", &bundles).unwrap(), ["display_name", "summary"]);
//! assert_eq!(bundle_lineage("Term", &bundles).unwrap(), ["Base", "Term"]);
//! ```

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::Bundle;

/// Errors raised while walking a bundle inheritance chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The chain revisits `bundle`; `path` lists the walk from the starting
    /// bundle up to and including the repeated one.
    #[error("Circular inheritance detected: {bundle} ({})", path.join(" -> "))]
    CircularInheritance { bundle: String, path: Vec<String> },
    /// A bundle referenced by the walk is not in the bundle table.
    #[error("Unknown bundle: {0}")]
    UnknownBundle(String),
}

/// Returns the bundles from `bundle_name` up to its root, leaf first.
fn ancestry<'a>(
    bundle_name: &'a str,
    bundles: &'a BTreeMap<String, Bundle>,
) -> Result<Vec<(&'a str, &'a Bundle)>, ResolveError> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut chain: Vec<(&str, &Bundle)> = Vec::new();
    let mut current = Some(bundle_name);

    while let Some(name) = current {
        if !visited.insert(name) {
            let path = chain
                .iter()
                .map(|(seen, _)| seen.to_string())
                .chain(std::iter::once(name.to_string()))
                .collect();
            return Err(ResolveError::CircularInheritance {
                bundle: name.to_string(),
                path,
            });
        }

        let bundle = bundles
            .get(name)
            .ok_or_else(|| ResolveError::UnknownBundle(name.to_string()))?;
        chain.push((name, bundle));
        current = bundle.inherits.as_deref();
    }

    Ok(chain)
}

/// Resolves the full, ordered attribute name list of a bundle.
///
/// Ancestors come first, root-most first; each bundle contributes its own
/// attributes in declaration order.
///
/// # Errors
///
/// Returns [`ResolveError::CircularInheritance`] if the chain loops back on
/// itself, or [`ResolveError::UnknownBundle`] if `bundle_name` or one of its
/// ancestors is missing from `bundles`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use command_spec_core::{Bundle, ResolveError, resolve_bundle_chain};
///
/// let mut bundles = BTreeMap::new();
/// bundles.insert("A".to_string(), Bundle::new(Vec::<String>::new()).inheriting("B"));
/// bundles.insert("B".to_string(), Bundle::new(Vec::<String>::new()).inheriting("A"));
///
/// let err = resolve_bundle_chain("A", &bundles).unwrap_err();
/// assert!(matches!(err, ResolveError::CircularInheritance { .. }));
/// assert!(err.to_string().contains("Circular inheritance detected: A"));
/// ```
pub fn resolve_bundle_chain(
    bundle_name: &str,
    bundles: &BTreeMap<String, Bundle>,
) -> Result<Vec<String>, ResolveError> {
    let chain = ancestry(bundle_name, bundles)?;
    Ok(chain
        .iter()
        .rev()
        .flat_map(|(_, bundle)| bundle.own_attributes.iter().cloned())
        .collect())
}

/// Returns the bundle names of the inheritance chain, root first.
///
/// # Errors
///
/// Same conditions as [`resolve_bundle_chain`].
pub fn bundle_lineage(
    bundle_name: &str,
    bundles: &BTreeMap<String, Bundle>,
) -> Result<Vec<String>, ResolveError> {
    let chain = ancestry(bundle_name, bundles)?;
    Ok(chain
        .iter()
        .rev()
        .map(|(name, _)| name.to_string())
        .collect())
}
