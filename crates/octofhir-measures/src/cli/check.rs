//! Check command implementation

use super::{output, sources};
use anyhow::Result;
use colored::Colorize;
use octofhir_measures_registry::{CheckOptions, MeasureRegistry, Scope, check as run_checks};
use std::path::PathBuf;

/// Configuration for check command
pub struct CheckConfig {
    /// Strict mode (warnings as errors)
    pub strict: bool,
    pub scope: Scope,
    pub drafts: bool,
    pub cql_paths: Vec<PathBuf>,
    pub config_file: Option<PathBuf>,
}

/// Check the registry and print diagnostics
///
/// Exits with status 1 when the check fails.
pub fn check(registry: &MeasureRegistry, config: CheckConfig) -> Result<()> {
    let options = CheckOptions {
        scope: config.scope,
        include_drafts: config.drafts,
        assembly: sources::assembly_config(config.config_file.as_deref())?,
    };
    let source = sources::stratifier_source(config.cql_paths);
    let report = run_checks(registry, &options, &source);

    for diagnostic in &report.diagnostics {
        println!("{}", output::format_diagnostic(diagnostic));
    }

    let errors = report.errors().count();
    let warnings = report.warnings().count();

    println!();
    if report.diagnostics.is_empty() {
        println!(
            "{}",
            output::format_success(&format!("All {} measure(s) checked", report.checked))
        );
        return Ok(());
    }

    let mut summary = Vec::new();
    if errors > 0 {
        summary.push(format!("{} error(s)", errors).red().to_string());
    }
    if warnings > 0 {
        summary.push(format!("{} warning(s)", warnings).yellow().to_string());
    }

    if report.is_clean(config.strict) {
        eprintln!("{}", output::format_warning(&format!("Found {}", summary.join(", "))));
        return Ok(());
    }

    eprintln!("{} Found {}", "Check failed:".red().bold(), summary.join(", "));
    if config.strict && errors == 0 {
        eprintln!("{}", "Strict mode: treating warnings as errors".yellow());
    }
    std::process::exit(1);
}
