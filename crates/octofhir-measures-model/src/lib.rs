//! FHIR Measure fragments for measure definitions
//!
//! This crate provides:
//! - The subset of the FHIR `Measure` resource a measure item carries
//! - The `MeasureItem` envelope (key, measure, CQL text) consumed by charting clients
//! - JSON serialization of item lists

pub mod model;
pub mod serialize;

pub use model::*;
pub use serialize::{JsonSerializer, SerializeError};
