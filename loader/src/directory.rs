//! Directory loading, merging, and legacy export.
//!
//! Every specification file in a directory is decoded, the three tables are
//! merged with later files winning on key collisions, and each command is
//! expanded and projected into a [`LegacySpec`]. Files are visited in
//! lexicographic path order so the merge does not depend on the order the
//! filesystem lists entries.
//!
//! A file that fails to decode, a table entry with the wrong shape, or a
//! command that fails to expand is skipped with a warning and recorded in
//! the [`LoadReport`]. The rest of the batch continues.
//!
//! ```no_run
//! use command_spec_loader::{LoadOptions, load_directory};
//!
//! let catalog = load_directory("specs/", &LoadOptions::default().with_family("Glossary")).unwrap();
//! for (name, spec) in &catalog {
//!     println!("{name}: {} attributes", spec.attributes.len());
//! }
//! ```

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use command_spec_core::{LegacySpec, SpecDocument, expand_command_with, project_legacy};
use tracing::{debug, info, warn};

use crate::config::LoadOptions;
use crate::error::{LoaderError, Result};
use crate::tolerant::load_spec_file;

/// Command name → legacy representation, in command name order.
pub type LegacyCatalog = BTreeMap<String, LegacySpec>;

/// A file that was decoded, with the strategy that decoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub strategy: &'static str,
}

/// A file or command left out of the result, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub name: String,
    pub reason: String,
}

/// What happened during a directory load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded_files: Vec<LoadedFile>,
    pub skipped_files: Vec<Skipped>,
    /// Malformed table entries, named `<table> '<entry>' in <path>`.
    pub skipped_entries: Vec<Skipped>,
    pub skipped_commands: Vec<Skipped>,
    /// Commands dropped by the family allow-list.
    pub filtered_commands: usize,
}

impl LoadReport {
    /// Returns warning lines for everything that was skipped.
    pub fn warnings(&self) -> Vec<String> {
        let files = self
            .skipped_files
            .iter()
            .map(|skip| format!("skipped file {}: {}", skip.name, skip.reason));
        let entries = self
            .skipped_entries
            .iter()
            .map(|skip| format!("skipped entry {}: {}", skip.name, skip.reason));
        let commands = self
            .skipped_commands
            .iter()
            .map(|skip| format!("skipped command '{}': {}", skip.name, skip.reason));
        files.chain(entries).chain(commands).collect()
    }
}

/// The merged document of a directory plus the load report so far.
#[derive(Debug, Clone)]
pub struct MergedDirectory {
    pub document: SpecDocument,
    pub report: LoadReport,
}

/// Lists specification files in `dir` with `extension`, sorted by path.
///
/// # Errors
///
/// Returns [`NotADirectory`](LoaderError::NotADirectory) if `dir` is not a
/// directory, or [`IoError`](LoaderError::IoError) if it cannot be read.
pub fn spec_files(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(LoaderError::NotADirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension() == Some(OsStr::new(extension)) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Decodes and merges every specification file in `dir`.
///
/// # Errors
///
/// Fails only when the directory itself cannot be listed; per-file failures
/// are recorded in [`MergedDirectory::report`].
pub fn merge_directory(dir: impl AsRef<Path>, options: &LoadOptions) -> Result<MergedDirectory> {
    let mut document = SpecDocument::new();
    let mut report = LoadReport::default();

    for path in spec_files(dir, &options.extension)? {
        match load_spec_file(&path) {
            Ok(parsed) => {
                debug!(
                    path = %path.display(),
                    strategy = parsed.strategy,
                    commands = parsed.document.commands.len(),
                    rejected = parsed.rejected.len(),
                    "loaded specification file"
                );
                for entry in parsed.rejected {
                    report.skipped_entries.push(Skipped {
                        name: format!("{} '{}' in {}", entry.table, entry.name, path.display()),
                        reason: entry.reason,
                    });
                }
                report.loaded_files.push(LoadedFile {
                    path,
                    strategy: parsed.strategy,
                });
                document.merge(parsed.document);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping specification file");
                report.skipped_files.push(Skipped {
                    name: path.display().to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(MergedDirectory { document, report })
}

/// Expands and projects the commands of `document` that pass the family
/// allow-list.
///
/// Commands that fail to expand are skipped and recorded in `report`.
pub fn project_document(
    document: &SpecDocument,
    options: &LoadOptions,
    report: &mut LoadReport,
) -> LegacyCatalog {
    let mut catalog = LegacyCatalog::new();

    for (name, command) in &document.commands {
        if !options.is_family_allowed(command.family.as_deref()) {
            report.filtered_commands += 1;
            continue;
        }

        match expand_command_with(
            command,
            &document.bundles,
            &document.attribute_definitions,
            options.mode,
        ) {
            Ok(expanded) => {
                if !expanded.is_complete() {
                    debug!(
                        command = %name,
                        missing = ?expanded.missing_attribute_defs,
                        "command has undefined attributes"
                    );
                }
                catalog.insert(name.clone(), project_legacy(command, &expanded));
            }
            Err(err) => {
                warn!(command = %name, error = %err, "skipping command");
                report.skipped_commands.push(Skipped {
                    name: name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    catalog
}

/// Loads a directory into a legacy catalog, returning the load report too.
///
/// # Errors
///
/// Same conditions as [`merge_directory`].
pub fn load_directory_with_report(
    dir: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<(LegacyCatalog, LoadReport)> {
    let dir = dir.as_ref();
    let MergedDirectory {
        document,
        mut report,
    } = merge_directory(dir, options)?;
    let catalog = project_document(&document, options, &mut report);

    info!(
        dir = %dir.display(),
        files = report.loaded_files.len(),
        skipped_files = report.skipped_files.len(),
        skipped_entries = report.skipped_entries.len(),
        commands = catalog.len(),
        skipped_commands = report.skipped_commands.len(),
        filtered = report.filtered_commands,
        "loaded specification directory"
    );

    Ok((catalog, report))
}

/// Loads a directory into a legacy catalog.
///
/// # Errors
///
/// Same conditions as [`merge_directory`].
pub fn load_directory(dir: impl AsRef<Path>, options: &LoadOptions) -> Result<LegacyCatalog> {
    load_directory_with_report(dir, options).map(|(catalog, _)| catalog)
}

/// Writes `catalog` as pretty JSON.
///
/// # Errors
///
/// Returns [`IoError`](LoaderError::IoError) if the file cannot be written,
/// or [`JsonError`](LoaderError::JsonError) if serialization fails.
pub fn write_catalog(catalog: &LegacyCatalog, path: impl AsRef<Path>) -> Result<()> {
    let raw = serde_json::to_string_pretty(catalog)?;
    std::fs::write(path, raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use command_spec_core::ExpansionMode;

    fn write(dir: &Path, name: &str, raw: &str) {
        std::fs::write(dir.join(name), raw).unwrap();
    }

    #[test]
    fn test_spec_files_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.json", "{}");
        write(dir.path(), "a.json", "{}");
        write(dir.path(), "notes.txt", "{}");
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let files = spec_files(dir.path(), "json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let err = spec_files("/nonexistent/specs", "json").unwrap_err();
        assert!(matches!(err, LoaderError::NotADirectory(_)));
    }

    #[test]
    fn test_strict_mode_skips_command_with_absent_bundle() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "spec.json",
            r#"{
                "attribute_definitions": {"status": {"variable_name": "status"}},
                "commands": {
                    "Dangling": {"bundle": "Nowhere", "custom_attributes": ["status"]},
                    "Plain": {"custom_attributes": ["status"]}
                }
            }"#,
        );

        let lenient = LoadOptions::default();
        let (catalog, report) = load_directory_with_report(dir.path(), &lenient).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(report.skipped_commands.is_empty());

        let strict = LoadOptions {
            mode: ExpansionMode::Strict,
            ..LoadOptions::default()
        };
        let (catalog, report) = load_directory_with_report(dir.path(), &strict).unwrap();
        assert_eq!(catalog.keys().collect::<Vec<_>>(), vec!["Plain"]);
        assert_eq!(report.skipped_commands[0].name, "Dangling");
        assert_eq!(report.skipped_commands[0].reason, "Unknown bundle: Nowhere");
    }

    #[test]
    fn test_report_warnings() {
        let report = LoadReport {
            skipped_files: vec![Skipped {
                name: "bad.json".into(),
                reason: "boom".into(),
            }],
            skipped_entries: vec![Skipped {
                name: "commands 'Odd' in a.json".into(),
                reason: "invalid type".into(),
            }],
            skipped_commands: vec![Skipped {
                name: "Loop".into(),
                reason: "cycle".into(),
            }],
            ..LoadReport::default()
        };
        assert_eq!(
            report.warnings(),
            vec![
                "skipped file bad.json: boom",
                "skipped entry commands 'Odd' in a.json: invalid type",
                "skipped command 'Loop': cycle"
            ]
        );
    }
}
