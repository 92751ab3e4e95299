//! List command implementation

use super::output;
use anyhow::Result;
use octofhir_measures_cql::placeholder_tokens;
use octofhir_measures_registry::{MeasureDefinition, default_registry};
use std::path::PathBuf;
use tabled::Tabled;

/// Configuration for list command
pub struct ListConfig {
    pub drafts: bool,
    pub output_file: Option<PathBuf>,
}

/// One table row per measure
#[derive(Debug, Tabled)]
pub struct MeasureRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Basis")]
    pub basis: String,
    #[tabled(rename = "Initial population")]
    pub initial_population: String,
    #[tabled(rename = "Stratifiers")]
    pub stratifiers: String,
    #[tabled(rename = "CQL")]
    pub cql: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&MeasureDefinition> for MeasureRow {
    fn from(measure: &MeasureDefinition) -> Self {
        let placeholders: Vec<_> = placeholder_tokens(&measure.cql_body)
            .into_iter()
            .map(|p| p.token)
            .collect();
        Self {
            key: measure.key.clone(),
            code: measure.measure_code.clone(),
            basis: measure
                .population_basis
                .as_ref()
                .map_or_else(|| "Patient".to_string(), |b| b.as_str().to_string()),
            initial_population: measure.initial_population_expression.clone(),
            stratifiers: measure
                .stratifiers
                .iter()
                .map(|s| format!("{} = {}", s.label, s.expression))
                .collect::<Vec<_>>()
                .join("\n"),
            cql: if placeholders.is_empty() {
                "(inline)".to_string()
            } else {
                placeholders.join("\n")
            },
            status: if measure.enabled { "exported" } else { "draft" }.to_string(),
        }
    }
}

/// Rows for the registry, drafts last
pub fn rows(drafts: bool) -> Vec<MeasureRow> {
    let registry = default_registry();
    let definitions: Box<dyn Iterator<Item = &MeasureDefinition>> = if drafts {
        Box::new(registry.iter_all())
    } else {
        Box::new(registry.measures().iter())
    };
    definitions.map(MeasureRow::from).collect()
}

/// List the registry as a table
pub fn list(config: ListConfig) -> Result<()> {
    let table = output::format_table(rows(config.drafts));
    output::write_output(&table, config.output_file.as_deref())
}
