//! Static registry of FHIR `Measure` definitions for a federated search UI
//!
//! This crate bundles:
//! - The measure wire model (`MeasureItem`, `Measure`, stratifiers, criteria)
//! - The authored DKTK/DHKI measure catalog and its registry
//! - CQL text support: placeholder resolution and library assembly
//! - Integrity checks with numbered diagnostics
//!
//! # Example
//!
//! ```
//! use octofhir_measures::get_measures;
//!
//! let encounters = get_measures().iter().find(|m| m.key == "encounters").unwrap();
//! assert_eq!(encounters.measure_code, "Encounters");
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_measures_cql as cql;
pub use octofhir_measures_diagnostics as diagnostics;
pub use octofhir_measures_model as model;
pub use octofhir_measures_registry as registry;

// Convenience re-exports
pub use octofhir_measures_diagnostics::{MeasureError, Result};
pub use octofhir_measures_model::{MeasureItem, PopulationBasis};
pub use octofhir_measures_registry::{
    MeasureDefinition, MeasureRegistry, StratifierDefinition, default_registry, get_measures,
};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
