//! Library command implementation

use super::{output, sources};
use anyhow::{Context, Result};
use octofhir_measures_cql::LibraryAssembler;
use octofhir_measures_registry::MeasureRegistry;
use std::path::PathBuf;

/// Configuration for library command
pub struct LibraryConfig {
    pub cql_paths: Vec<PathBuf>,
    /// Assembly config (JSON)
    pub config_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
}

/// Assemble the CQL library for the exported measures
pub fn library(registry: &MeasureRegistry, config: LibraryConfig) -> Result<()> {
    let assembly = sources::assembly_config(config.config_file.as_deref())?;
    let source = sources::stratifier_source(config.cql_paths);
    let assembler = LibraryAssembler::new(assembly);

    let text = assembler
        .assemble_resolved(registry.measures().iter().map(|m| m.cql_body.as_str()), &source)
        .context("Failed to assemble library")?;
    output::write_output(&text, config.output_file.as_deref())
}
