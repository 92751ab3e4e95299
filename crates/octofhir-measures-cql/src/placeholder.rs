//! Stratifier placeholder tokens
//!
//! A placeholder is a line holding nothing but an upper-snake-case token with
//! a `_STRAT_` segment, e.g. `DKTK_STRAT_GENDER_STRATIFIER`. It stands for a
//! block of CQL definitions supplied by a [`StratifierSource`](crate::StratifierSource).

use crate::scan::mask_non_code;
use octofhir_measures_diagnostics::{SourceLocation, Span};
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*([A-Z][A-Z0-9]*_STRAT(?:_[A-Z0-9]+)+)[ \t]*\r?$")
        .expect("placeholder pattern is valid")
});

static PLACEHOLDER_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Z0-9]*_STRAT(?:_[A-Z0-9]+)+$").expect("placeholder pattern is valid")
});

/// A placeholder token occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub token: String,
    /// Span of the token (not the whole line)
    pub span: Span,
    pub location: SourceLocation,
}

/// Whether `token` has the shape of a placeholder token
pub fn is_placeholder_token(token: &str) -> bool {
    PLACEHOLDER_TOKEN_RE.is_match(token)
}

/// All placeholder occurrences in `text`, in source order
pub fn placeholder_tokens(text: &str) -> Vec<Placeholder> {
    let masked = mask_non_code(text);

    PLACEHOLDER_LINE_RE
        .captures_iter(&masked)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            let span = Span::new(m.start(), m.end());
            Placeholder {
                token: m.as_str().to_string(),
                span,
                location: SourceLocation::from_span(span, text),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_in_body() {
        let body = "\nDKTK_STRAT_GENDER_STRATIFIER\n\nDHKI_STRAT_AGE_STRATIFIER\n\nDKTK_STRAT_DECEASED_STRATIFIER\n";
        let tokens: Vec<_> = placeholder_tokens(body).into_iter().map(|p| p.token).collect();
        assert_eq!(
            tokens,
            vec![
                "DKTK_STRAT_GENDER_STRATIFIER",
                "DHKI_STRAT_AGE_STRATIFIER",
                "DKTK_STRAT_DECEASED_STRATIFIER"
            ]
        );
    }

    #[test]
    fn test_token_location() {
        let body = "\n  DHKI_STRAT_ENCOUNTER_STRATIFIER  \n";
        let found = placeholder_tokens(body);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].location.line, 2);
        assert_eq!(found[0].location.column, 3);
        assert_eq!(&body[found[0].span.as_range()], "DHKI_STRAT_ENCOUNTER_STRATIFIER");
    }

    #[test]
    fn test_ignores_definitions_and_comments() {
        let body = "define Encounter:\n  [Encounter]\n// DKTK_STRAT_SPECIMEN_STRATIFIER\nInInitialPopulation\n";
        assert!(placeholder_tokens(body).is_empty());
    }

    #[test]
    fn test_token_shape() {
        assert!(is_placeholder_token("DKTK_STRAT_DIAGNOSIS_STRATIFIER"));
        assert!(is_placeholder_token("DHKI_STRAT_MEDICATION_STRATIFIER"));
        assert!(!is_placeholder_token("DKTK_GENDER"));
        assert!(!is_placeholder_token("dktk_strat_gender"));
        assert!(!is_placeholder_token("DKTK_STRAT_"));
    }
}
