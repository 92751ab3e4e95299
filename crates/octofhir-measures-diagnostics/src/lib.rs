//! Measure diagnostics and error handling
//!
//! Error codes, source locations and diagnostic reporting shared by the
//! measure model, the CQL text helpers and the registry checker.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for measure operations
pub type Result<T> = std::result::Result<T, MeasureError>;
