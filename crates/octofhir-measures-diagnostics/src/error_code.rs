//! Measure error codes following a structured numbering system
//!
//! Error code ranges:
//! - MSR0001-MSR0099: Definition errors (shape of a measure record)
//! - MSR0100-MSR0199: Integrity errors (keys, CQL references, placeholders)
//! - MSR0400-MSR0499: System errors (I/O, configuration)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a definition error (0001-0099)
    pub const fn is_definition_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is an integrity error (0100-0199)
    pub const fn is_integrity_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MSR{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Definition errors (0001-0099)
    map.insert(1, ErrorInfo::new("Empty measure key"));
    map.insert(2, ErrorInfo::new("Empty stratifier label"));
    map.insert(
        3,
        ErrorInfo::new("Invalid population basis extension")
            .with_help("Expected the cqfm-populationBasis URL and a non-empty valueCode"),
    );
    map.insert(4, ErrorInfo::new("Missing initial population"));
    map.insert(5, ErrorInfo::new("Empty criteria expression"));
    map.insert(
        6,
        ErrorInfo::new("Unsupported initial population language")
            .with_help("The initial population must name an expression (text/cql-identifier)"),
    );

    // Integrity errors (0100-0199)
    map.insert(
        100,
        ErrorInfo::new("Duplicate measure key")
            .with_help("The consumer indexes measures by key; keys must be unique"),
    );
    map.insert(
        101,
        ErrorInfo::new("Undefined expression identifier")
            .with_help("Check that the identifier is defined by the measure's CQL body"),
    );
    map.insert(
        102,
        ErrorInfo::new("Unresolved placeholder")
            .with_help("Add a <TOKEN>.cql file to a CQL search path"),
    );
    map.insert(103, ErrorInfo::new("Duplicate definition"));
    map.insert(104, ErrorInfo::new("Inline expression not checked"));
    map.insert(105, ErrorInfo::new("Unknown measure key"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("Configuration error"));
    map.insert(403, ErrorInfo::new("File not found"));
    map.insert(404, ErrorInfo::new("Invalid format"));

    map
});

// Definition errors
pub const MSR0001: ErrorCode = ErrorCode::new(1);
pub const MSR0002: ErrorCode = ErrorCode::new(2);
pub const MSR0003: ErrorCode = ErrorCode::new(3);
pub const MSR0004: ErrorCode = ErrorCode::new(4);
pub const MSR0005: ErrorCode = ErrorCode::new(5);
pub const MSR0006: ErrorCode = ErrorCode::new(6);

// Integrity errors
pub const MSR0100: ErrorCode = ErrorCode::new(100);
pub const MSR0101: ErrorCode = ErrorCode::new(101);
pub const MSR0102: ErrorCode = ErrorCode::new(102);
pub const MSR0103: ErrorCode = ErrorCode::new(103);
pub const MSR0104: ErrorCode = ErrorCode::new(104);
pub const MSR0105: ErrorCode = ErrorCode::new(105);

// System errors
pub const MSR0400: ErrorCode = ErrorCode::new(400);
pub const MSR0401: ErrorCode = ErrorCode::new(401);
pub const MSR0402: ErrorCode = ErrorCode::new(402);
pub const MSR0403: ErrorCode = ErrorCode::new(403);
pub const MSR0404: ErrorCode = ErrorCode::new(404);
