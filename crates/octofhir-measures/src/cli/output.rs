//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use octofhir_measures_diagnostics::Diagnostic;
use std::fs::File;
use std::io::{IsTerminal, Write};
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};

/// Color mode selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => Self::Always,
            "never" => Self::Never,
            _ => Self::Auto,
        }
    }
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match ColorMode::parse(mode) {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => colored::control::set_override(std::io::stdout().is_terminal()),
    }
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red().bold(), error)
}

/// Format a warning for display
pub fn format_warning(warning: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), warning)
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Render a diagnostic the way `check` prints it
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    diagnostic.render_colored()
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!(
            "{}",
            format_success(&format!("Output written to {}", path.display()))
        );
    } else {
        println!("{}", content.trim_end_matches('\n'));
    }
    Ok(())
}

/// Render rows as a table
pub fn format_table<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return "(no measures)".to_string();
    }
    Table::new(rows).with(Style::modern()).to_string()
}
