//! CQL text support for measure definitions
//!
//! Measure bodies are CQL fragments, often nothing more than placeholder
//! tokens such as `DKTK_STRAT_GENDER_STRATIFIER` standing for a block of
//! `define` statements. This crate provides:
//! - A scanner for `define` statements (names, kinds, locations)
//! - Placeholder detection and resolution against stratifier sources
//! - The bundled stratifier catalog and directory overrides
//! - Assembly of the CQL library sent to the evaluation engine
//!
//! Nothing here parses or evaluates CQL expressions.

pub mod library;
pub mod placeholder;
pub mod resolve;
pub mod scan;
pub mod source;

pub use library::{AssemblyConfig, LibraryAssembler};
pub use placeholder::{Placeholder, is_placeholder_token, placeholder_tokens};
pub use resolve::{resolve_placeholders, resolve_placeholders_lossy};
pub use scan::{
    Definition, DefinitionKind, defined_names, is_simple_identifier, referenced_identifier, scan_definitions,
};
pub use source::{DirectorySource, LayeredSource, StratifierCatalog, StratifierSource, CQL_PATH_ENV};
