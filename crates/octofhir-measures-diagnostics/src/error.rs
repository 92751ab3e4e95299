//! Measure error types

use crate::{ErrorCode, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the measure would fail downstream
    Error,
    /// Warning - potential issue, the measure may still evaluate
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message attached to a measure, optionally located in its CQL body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Key of the measure the diagnostic belongs to
    pub measure: Option<String>,
    /// Location inside the measure's CQL text
    pub location: Option<SourceLocation>,
    /// Additional context or help
    pub help: Option<String>,
    /// Related information
    pub related: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            measure: None,
            location: None,
            help: code.info().help.map(str::to_string),
            related: Vec::new(),
        }
    }

    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Create a new informational diagnostic
    pub fn info(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    /// Attach the measure key
    pub fn for_measure(mut self, key: impl Into<String>) -> Self {
        self.measure = Some(key.into());
        self
    }

    /// Set the location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add related information
    pub fn with_related(mut self, info: impl Into<String>) -> Self {
        self.related.push(info.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render with terminal colors
    #[cfg(feature = "colored")]
    pub fn render_colored(&self) -> String {
        use colored::Colorize;

        let head = match self.severity {
            Severity::Error => format!("{}[{}]", "error".red().bold(), self.code),
            Severity::Warning => format!("{}[{}]", "warning".yellow().bold(), self.code),
            Severity::Info => format!("{}[{}]", "info".blue().bold(), self.code),
        };
        let mut out = format!("{}: {}", head, self.message);
        if let Some(key) = &self.measure {
            out.push_str(&format!("\n  {} measure '{}'", "-->".cyan(), key));
            if let Some(loc) = &self.location {
                out.push_str(&format!(" at {}", loc));
            }
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  {} {}", "help:".green(), help));
        }
        for note in &self.related {
            out.push_str(&format!("\n  {} {}", "note:".dimmed(), note));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(key) = &self.measure {
            write!(f, " [{}]", key)?;
        }
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Main measure error type
#[derive(Debug, Clone, Error)]
pub enum MeasureError {
    /// A measure record does not have the expected shape
    #[error("{code}: {message}")]
    Definition {
        code: ErrorCode,
        message: String,
        key: Option<String>,
    },

    /// A placeholder token could not be resolved to CQL text
    #[error("{code}: {message}")]
    Resolution {
        code: ErrorCode,
        message: String,
        token: String,
        location: Option<SourceLocation>,
    },

    /// Keys or CQL references are inconsistent
    #[error("{code}: {message}")]
    Integrity {
        code: ErrorCode,
        message: String,
        key: Option<String>,
    },

    /// I/O or configuration failure
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<MeasureError>),
}

impl MeasureError {
    /// Create a definition error
    pub fn definition(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Definition {
            code,
            message: message.into(),
            key: None,
        }
    }

    /// Create a definition error for a specific measure
    pub fn definition_for(code: ErrorCode, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Definition {
            code,
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a placeholder resolution error
    pub fn resolution(code: ErrorCode, token: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            code,
            message: message.into(),
            token: token.into(),
            location: None,
        }
    }

    /// Create an integrity error
    pub fn integrity(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Integrity {
            code,
            message: message.into(),
            key: None,
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach a location (resolution errors only)
    pub fn at(mut self, loc: SourceLocation) -> Self {
        if let Self::Resolution { location, .. } = &mut self {
            *location = Some(loc);
        }
        self
    }

    /// Attach context (system errors only)
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        if let Self::System { context, .. } = &mut self {
            *context = Some(ctx.into());
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Definition { code, .. } => *code,
            Self::Resolution { code, .. } => *code,
            Self::Integrity { code, .. } => *code,
            Self::System { code, .. } => *code,
            Self::Multiple(errors) => errors.first().map(|e| e.code()).unwrap_or(ErrorCode::new(0)),
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Definition { code, message, key } | Self::Integrity { code, message, key } => {
                let diag = Diagnostic::error(*code, message.clone());
                match key {
                    Some(key) => diag.for_measure(key.clone()),
                    None => diag,
                }
            }
            Self::Resolution { code, message, token, location } => {
                let mut diag = Diagnostic::error(*code, message.clone())
                    .with_related(format!("token: {}", token));
                if let Some(loc) = location {
                    diag = diag.with_location(loc.clone());
                }
                diag
            }
            Self::System { code, message, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(ctx) = context {
                    diag = diag.with_help(ctx.clone());
                }
                diag
            }
            Self::Multiple(errors) => match errors.first() {
                Some(first) => first.to_diagnostic(),
                None => Diagnostic::error(ErrorCode::new(0), "Unknown error"),
            },
        }
    }
}

impl From<std::io::Error> for MeasureError {
    fn from(err: std::io::Error) -> Self {
        Self::system(crate::MSR0401, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MSR0101, MSR0102, MSR0401};

    #[test]
    fn test_resolution_error_to_diagnostic() {
        let err = MeasureError::resolution(MSR0102, "DKTK_STRAT_X", "Unknown placeholder DKTK_STRAT_X")
            .at(SourceLocation::new(2, 1, 1, 12));

        assert_eq!(err.code(), MSR0102);
        let diag = err.to_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.related, vec!["token: DKTK_STRAT_X".to_string()]);
        assert_eq!(diag.location.map(|l| l.line), Some(2));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error(MSR0101, "Undefined identifier 'Gender'")
            .for_measure("patients")
            .with_location(SourceLocation::new(3, 5, 20, 6));

        let text = diag.to_string();
        assert!(text.contains("MSR0101"));
        assert!(text.contains("[patients]"));
        assert!(text.contains("3:5"));
    }

    #[test]
    fn test_help_defaults_from_error_info() {
        let diag = Diagnostic::warning(MSR0102, "x");
        assert_eq!(diag.help.as_deref(), MSR0102.info().help);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MeasureError = io.into();
        assert_eq!(err.code(), MSR0401);
    }
}
