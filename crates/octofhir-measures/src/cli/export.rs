//! Export command implementation

use super::{output, sources};
use anyhow::{Context, Result};
use octofhir_measures_cql::{StratifierSource, resolve_placeholders};
use octofhir_measures_model::{JsonSerializer, MeasureItem};
use octofhir_measures_registry::{MeasureDefinition, MeasureRegistry};
use std::path::PathBuf;

/// Configuration for export command
pub struct ExportConfig {
    /// Append drafts after the exported measures
    pub drafts: bool,
    /// Replace placeholder tokens with their CQL
    pub resolve: bool,
    pub pretty: bool,
    /// Export only these keys, in this order
    pub keys: Vec<String>,
    pub cql_paths: Vec<PathBuf>,
    pub output_file: Option<PathBuf>,
}

/// Measure items selected by `config`
pub fn export_items(
    registry: &MeasureRegistry,
    config: &ExportConfig,
    source: &dyn StratifierSource,
) -> Result<Vec<MeasureItem>> {
    let definitions: Vec<&MeasureDefinition> = if config.keys.is_empty() {
        if config.drafts {
            registry.iter_all().collect()
        } else {
            registry.measures().iter().collect()
        }
    } else {
        registry.select(&config.keys)?
    };

    definitions
        .into_iter()
        .map(|definition| {
            let mut item = definition.to_item();
            if config.resolve {
                item.cql = resolve_placeholders(&item.cql, source)
                    .with_context(|| format!("Failed to resolve CQL of measure '{}'", item.key))?;
            }
            Ok(item)
        })
        .collect()
}

/// Export measures as a JSON array
pub fn export(registry: &MeasureRegistry, config: ExportConfig) -> Result<()> {
    let source = sources::stratifier_source(config.cql_paths.clone());
    let items = export_items(registry, &config, &source)?;
    log::debug!("exporting {} measures", items.len());

    let serializer = if config.pretty { JsonSerializer::pretty() } else { JsonSerializer::new() };
    let json = serializer.serialize(&items).context("Failed to serialize measures")?;
    output::write_output(&json, config.output_file.as_deref())
}
