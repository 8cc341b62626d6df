//! Loading and merging of compact command specification files.
//!
//! This crate reads specification files from disk, tolerating the defects
//! exported files commonly carry, and merges a directory of them into one
//! legacy catalog for the downstream command processor.
//!
//! # Quick start
//!
//! ```no_run
//! use command_spec_core::validate_document;
//! use command_spec_loader::{LoadOptions, LoaderConfig, load_directory, load_spec_file};
//!
//! // One file, with repair of trailing commas and string-encoded constraints
//! let parsed = load_spec_file("specs/glossary.json").unwrap();
//! for issue in validate_document(&parsed.document) {
//!     println!("{issue}");
//! }
//!
//! // A whole directory, restricted by a YAML config
//! let options = LoaderConfig::load("command-spec.yaml").unwrap().to_options().unwrap();
//! let catalog = load_directory("specs/", &options).unwrap();
//! println!("{} commands exported", catalog.len());
//! ```

mod config;
mod directory;
mod error;
mod tolerant;

pub use config::{DEFAULT_EXTENSION, LoadOptions, LoaderConfig};
pub use directory::{
    LegacyCatalog, LoadReport, LoadedFile, MergedDirectory, Skipped, load_directory,
    load_directory_with_report, merge_directory, project_document, spec_files, write_catalog,
};
pub use error::{DecodeError, LoaderError, Result};
pub use tolerant::{
    EMBEDDED_JSON_FIELDS, EmbeddedJson, ParseStrategy, ParsedSpec, RejectedEntry, RelaxedYaml,
    StrategyFailure, StrictJson, TrailingCommas, default_strategies, escape_embedded_json,
    load_spec_file, parse_spec_str, strip_trailing_commas,
};
