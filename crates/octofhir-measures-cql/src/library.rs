//! Assembly of the CQL library sent to the evaluation engine
//!
//! The engine receives one library: a fixed header (library declaration,
//! data model, helpers, context and the `InInitialPopulation` criterion)
//! followed by the bodies of all selected measures in order.

use crate::resolve::resolve_placeholders;
use crate::scan::defined_names;
use crate::source::StratifierSource;
use indexmap::IndexSet;
use octofhir_measures_diagnostics::{MSR0402, MSR0403, MeasureError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Header settings for assembled libraries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct AssemblyConfig {
    /// Library name
    pub library_name: String,
    /// Library version, omitted from the declaration when absent
    pub library_version: Option<String>,
    /// FHIR model version for the `using` declaration
    pub fhir_version: String,
    /// Whether to include FHIRHelpers (same version as the model)
    pub include_fhir_helpers: bool,
    /// Evaluation context
    pub context: String,
    /// Body of `define InInitialPopulation`
    pub initial_population: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            library_name: "Retrieve".to_string(),
            library_version: None,
            fhir_version: "4.0.0".to_string(),
            include_fhir_helpers: true,
            context: "Patient".to_string(),
            initial_population: "true".to_string(),
        }
    }
}

impl AssemblyConfig {
    /// Load from a JSON string; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| MeasureError::system(MSR0402, format!("Invalid assembly config: {}", e)))
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MeasureError::system(MSR0403, format!("Cannot read {}", path.display()))
                .with_context(e.to_string())
        })?;
        Self::from_json(&json)
    }
}

/// Builds library text from measure bodies
#[derive(Debug, Clone, Default)]
pub struct LibraryAssembler {
    config: AssemblyConfig,
}

impl LibraryAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Header preceding all measure bodies
    pub fn header(&self) -> String {
        let c = &self.config;
        let mut out = format!("library {}", c.library_name);
        if let Some(version) = &c.library_version {
            out.push_str(&format!(" version '{}'", version));
        }
        out.push('\n');
        out.push_str(&format!("using FHIR version '{}'\n", c.fhir_version));
        if c.include_fhir_helpers {
            out.push_str(&format!("include FHIRHelpers version '{}'\n", c.fhir_version));
        }
        out.push_str(&format!("\ncontext {}\n", c.context));
        out.push_str(&format!("\ndefine InInitialPopulation:\n  {}\n", c.initial_population.trim()));
        out
    }

    /// Names the header defines for every measure
    pub fn header_definitions(&self) -> IndexSet<String> {
        defined_names(&self.header())
    }

    /// Header followed by `bodies`, separated by blank lines
    pub fn assemble<'a>(&self, bodies: impl IntoIterator<Item = &'a str>) -> String {
        let mut out = self.header();
        for body in bodies {
            let body = body.trim_matches(|c: char| c == '\n' || c == '\r');
            if body.trim().is_empty() {
                continue;
            }
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }
        out
    }

    /// Like [`assemble`](Self::assemble), resolving placeholders first
    pub fn assemble_resolved<'a>(
        &self,
        bodies: impl IntoIterator<Item = &'a str>,
        source: &dyn StratifierSource,
    ) -> Result<String> {
        let mut resolved = Vec::new();
        let mut errors = Vec::new();
        for body in bodies {
            match resolve_placeholders(body, source) {
                Ok(text) => resolved.push(text),
                Err(MeasureError::Multiple(mut errs)) => errors.append(&mut errs),
                Err(e) => errors.push(e),
            }
        }

        match errors.len() {
            0 => {
                log::debug!("assembled library from {} bodies via {}", resolved.len(), source.describe());
                Ok(self.assemble(resolved.iter().map(String::as_str)))
            }
            1 => Err(errors.remove(0)),
            _ => Err(MeasureError::Multiple(errors)),
        }
    }
}
