use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use command_spec_core::{
    Bundle, ExpansionMode, SpecDocument, expand_command_with, resolve_bundle_chain,
    validation_messages,
};
use command_spec_loader::{
    LoadOptions, LoaderConfig, load_directory_with_report, load_spec_file, merge_directory,
    write_catalog,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "command-spec")]
#[command(about = "Inspect, validate, and export compact command specifications")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Describe one specification file: counts, issues, bundle tree, command expansions.
    Inspect(InspectArgs),
    /// Validate specification files, or the merged document of a directory.
    Validate(ValidateArgs),
    /// Merge a directory of specification files and write the legacy schema JSON.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Specification file to inspect.
    file: PathBuf,
    /// Report commands whose bundle does not exist as expansion errors.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Specification files and/or directories of specification files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Directory containing specification files.
    dir: PathBuf,
    /// Only export commands of this family (repeatable).
    #[arg(long = "family")]
    families: Vec<String>,
    /// Skip commands whose bundle does not exist instead of exporting them without it.
    #[arg(long)]
    strict: bool,
    /// Loader configuration YAML (families, strict_bundles, extension).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output JSON path (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Inspect(args) => run_inspect(args),
        Command::Validate(args) => run_validate(args),
        Command::Export(args) => run_export(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let parsed = load_spec_file(&args.file).map_err(|e| e.to_string())?;
    let doc = &parsed.document;
    let mode = if args.strict {
        ExpansionMode::Strict
    } else {
        ExpansionMode::Lenient
    };

    println!("Specification: {}", args.file.display());
    if parsed.was_repaired() {
        println!("  Decoded with repair strategy: {}", parsed.strategy);
    }
    println!("  Attribute definitions: {}", doc.attribute_definitions.len());
    println!("  Bundles: {}", doc.bundles.len());
    println!("  Commands: {}", doc.commands.len());
    if !parsed.rejected.is_empty() {
        println!("  Skipped malformed entries: {}", parsed.rejected.len());
        for entry in &parsed.rejected {
            println!("    ! {entry}");
        }
    }

    println!();
    print_issues(&validation_messages(doc));

    println!();
    println!("Bundle hierarchy:");
    for line in bundle_tree_lines(&doc.bundles) {
        println!("  {line}");
    }

    println!();
    println!("Commands:");
    for line in command_summary_lines(doc, mode) {
        println!("  {line}");
    }

    Ok(())
}

fn print_issues(issues: &[String]) {
    if issues.is_empty() {
        println!("Validation: no issues found.");
        return;
    }
    println!("Validation: {} issue(s)", issues.len());
    for issue in issues {
        println!("  - {issue}");
    }
}

/// Renders the inheritance forest with resolved attribute counts.
///
/// Roots come first, then bundles whose parent is missing, then anything
/// left over (bundles on or below a cycle) with its resolution error.
fn bundle_tree_lines(bundles: &BTreeMap<String, Bundle>) -> Vec<String> {
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, bundle) in bundles {
        if let Some(parent) = bundle.inherits.as_deref() {
            children.entry(parent).or_default().push(name);
        }
    }

    let mut lines = Vec::new();
    let mut printed: BTreeSet<&str> = BTreeSet::new();

    for (name, bundle) in bundles {
        match bundle.inherits.as_deref() {
            None => push_subtree(name, 0, "", bundles, &children, &mut printed, &mut lines),
            Some(parent) if !bundles.contains_key(parent) => {
                let note = format!(" [inherits unknown bundle '{parent}']");
                push_subtree(name, 0, &note, bundles, &children, &mut printed, &mut lines);
            }
            Some(_) => {}
        }
    }

    for name in bundles.keys() {
        if !printed.contains(name.as_str()) {
            match resolve_bundle_chain(name, bundles) {
                Ok(attrs) => lines.push(format!("{name} ({} attributes)", attrs.len())),
                Err(err) => lines.push(format!("{name}: {err}")),
            }
        }
    }

    lines
}

fn push_subtree<'a>(
    name: &'a str,
    depth: usize,
    note: &str,
    bundles: &'a BTreeMap<String, Bundle>,
    children: &BTreeMap<&'a str, Vec<&'a str>>,
    printed: &mut BTreeSet<&'a str>,
    lines: &mut Vec<String>,
) {
    if !printed.insert(name) {
        return;
    }

    let indent = "  ".repeat(depth);
    let own = bundles
        .get(name)
        .map(|bundle| bundle.own_attributes.len())
        .unwrap_or(0);
    match resolve_bundle_chain(name, bundles) {
        Ok(attrs) => lines.push(format!(
            "{indent}{name} ({} attributes, {own} own){note}",
            attrs.len()
        )),
        Err(_) => lines.push(format!("{indent}{name} ({own} own){note}")),
    }

    if let Some(kids) = children.get(name) {
        for child in kids {
            push_subtree(child, depth + 1, "", bundles, children, printed, lines);
        }
    }
}

fn command_summary_lines(doc: &SpecDocument, mode: ExpansionMode) -> Vec<String> {
    let mut lines = Vec::new();

    for (name, command) in &doc.commands {
        let family = command.family.as_deref().unwrap_or("-");
        lines.push(format!("{name} [{family}]"));

        match expand_command_with(command, &doc.bundles, &doc.attribute_definitions, mode) {
            Ok(expanded) => {
                let chain = if expanded.bundle_chain.is_empty() {
                    match command.bundle.as_deref() {
                        Some(bundle) => format!("(none; bundle '{bundle}' not found)"),
                        None => "(none)".to_string(),
                    }
                } else {
                    expanded.bundle_chain.join(" -> ")
                };
                lines.push(format!("  Bundle chain: {chain}"));
                lines.push(format!(
                    "  Attributes: {} total ({} from bundles, {} custom)",
                    expanded.total_attribute_count,
                    expanded.bundle_attribute_count,
                    expanded.custom_attribute_count
                ));
                if !expanded.missing_attribute_defs.is_empty() {
                    lines.push(format!(
                        "  Missing attribute definitions: {}",
                        expanded.missing_attribute_defs.join(", ")
                    ));
                }
            }
            Err(err) => lines.push(format!("  Expansion failed: {err}")),
        }
    }

    lines
}

/// Prints decode failures and issues for every input. Only a missing input
/// path fails the run.
fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut undecodable = 0usize;

    for input in &args.inputs {
        if input.is_dir() {
            let merged =
                merge_directory(input, &LoadOptions::default()).map_err(|e| e.to_string())?;
            println!(
                "{} (merged from {} file(s))",
                input.display(),
                merged.report.loaded_files.len()
            );
            for warning in merged.report.warnings() {
                println!("  ! {warning}");
            }
            undecodable += merged.report.skipped_files.len();
            print_indented_issues(&validation_messages(&merged.document));
            continue;
        }

        if !input.exists() {
            return Err(format!(
                "Specification path '{}' does not exist",
                input.display()
            ));
        }

        println!("{}", input.display());
        match load_spec_file(input) {
            Ok(parsed) => {
                for entry in &parsed.rejected {
                    println!("  ! skipped {entry}");
                }
                print_indented_issues(&validation_messages(&parsed.document));
            }
            Err(err) => {
                println!("  ! {err}");
                undecodable += 1;
            }
        }
    }

    if undecodable > 0 {
        println!();
        println!("{undecodable} file(s) could not be decoded.");
    }
    Ok(())
}

fn print_indented_issues(issues: &[String]) {
    if issues.is_empty() {
        println!("  no issues found");
    }
    for issue in issues {
        println!("  - {issue}");
    }
}

fn export_options(args: &ExportArgs) -> Result<LoadOptions, String> {
    let mut options = match &args.config {
        Some(path) => LoaderConfig::load(path)
            .and_then(|config| config.to_options())
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => LoadOptions::default(),
    };

    options
        .families
        .extend(args.families.iter().map(|f| f.trim().to_string()));
    if args.strict {
        options.mode = ExpansionMode::Strict;
    }
    Ok(options)
}

fn run_export(args: ExportArgs) -> Result<(), String> {
    let options = export_options(&args)?;
    let (catalog, report) =
        load_directory_with_report(&args.dir, &options).map_err(|e| e.to_string())?;

    match &args.output {
        Some(path) => {
            create_parent_dir(path)?;
            write_catalog(&catalog, path)
                .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
        }
        None => {
            let raw = serde_json::to_string_pretty(&catalog)
                .map_err(|err| format!("Failed to serialize legacy schema: {err}"))?;
            println!("{raw}");
        }
    }

    eprintln!(
        "Exported {} command(s) from {} file(s).",
        catalog.len(),
        report.loaded_files.len()
    );
    if report.filtered_commands > 0 {
        eprintln!(
            "{} command(s) excluded by family filter.",
            report.filtered_commands
        );
    }
    for warning in report.warnings() {
        eprintln!("warning: {warning}");
    }

    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    Ok(())
}
