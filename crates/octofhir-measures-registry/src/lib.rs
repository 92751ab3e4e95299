//! Measure registry
//!
//! This crate provides:
//! - `MeasureDefinition`, the authored form of a measure, and its conversion
//!   to and from the FHIR measure item wire shape
//! - The authored catalog of DKTK/DHKI measures, drafts included
//! - `MeasureRegistry` and the process-wide default registry
//! - An opt-in integrity checker over keys, placeholders and CQL references
//!
//! # Example
//!
//! ```
//! use octofhir_measures_registry::get_measures;
//!
//! let keys: Vec<_> = get_measures().iter().map(|m| m.key.as_str()).collect();
//! assert_eq!(keys[0], "patients");
//! ```

pub mod catalog;
pub mod check;
pub mod definition;
pub mod registry;

pub use check::{CheckOptions, CheckReport, Scope, check};
pub use definition::{MeasureDefinition, MeasureDefinitionBuilder, StratifierDefinition};
pub use registry::{MeasureRegistry, default_registry, get_measures};
