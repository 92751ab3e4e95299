//! CLI functionality for the measures tool
//!
//! - Listing the registry
//! - JSON export, optionally with resolved CQL
//! - Library assembly
//! - Integrity checks
//! - Stratifier source and config loading
//! - Output formatting

pub mod check;
pub mod export;
pub mod library;
pub mod list;
pub mod output;
pub mod sources;
