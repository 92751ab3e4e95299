//! Placeholder substitution

use crate::placeholder::placeholder_tokens;
use crate::source::StratifierSource;
use octofhir_measures_diagnostics::{MSR0102, MeasureError, Result};

/// Replace every placeholder token in `text` with the CQL its source supplies
///
/// Substitution is a single pass: placeholders inside substituted text are
/// left as they are. Every unknown token is reported; more than one yields
/// [`MeasureError::Multiple`].
pub fn resolve_placeholders(text: &str, source: &dyn StratifierSource) -> Result<String> {
    let (resolved, mut errors) = resolve_placeholders_lossy(text, source);
    match errors.len() {
        0 => Ok(resolved),
        1 => Err(errors.remove(0)),
        _ => Err(MeasureError::Multiple(errors)),
    }
}

/// Like [`resolve_placeholders`], but always returns the text
///
/// Unknown tokens stay in place and are returned alongside as errors.
pub fn resolve_placeholders_lossy(text: &str, source: &dyn StratifierSource) -> (String, Vec<MeasureError>) {
    let placeholders = placeholder_tokens(text);
    if placeholders.is_empty() {
        return (text.to_string(), Vec::new());
    }

    let mut out = String::with_capacity(text.len());
    let mut errors = Vec::new();
    let mut last = 0;

    for placeholder in placeholders {
        out.push_str(&text[last..placeholder.span.start]);
        match source.lookup(&placeholder.token) {
            Some(cql) => {
                log::trace!("resolved {} ({} bytes)", placeholder.token, cql.len());
                out.push_str(cql.trim_matches(|c: char| c == '\n' || c == '\r'));
            }
            None => {
                errors.push(
                    MeasureError::resolution(
                        MSR0102,
                        placeholder.token.clone(),
                        format!("Unknown stratifier placeholder {}", placeholder.token),
                    )
                    .at(placeholder.location.clone()),
                );
                out.push_str(&placeholder.token);
            }
        }
        last = placeholder.span.end;
    }
    out.push_str(&text[last..]);

    (out, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StratifierCatalog;

    fn catalog() -> StratifierCatalog {
        let mut catalog = StratifierCatalog::new();
        catalog.insert("DKTK_STRAT_GENDER_STRATIFIER", "define Gender:\nPatient.gender\n");
        catalog
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let text = "define Encounter:\n  [Encounter]\n";
        assert_eq!(resolve_placeholders(text, &catalog()).unwrap(), text);
    }

    #[test]
    fn test_substitutes_token_in_place() {
        let text = "\nDKTK_STRAT_GENDER_STRATIFIER\n";
        let resolved = resolve_placeholders(text, &catalog()).unwrap();
        assert_eq!(resolved, "\ndefine Gender:\nPatient.gender\n");
    }

    #[test]
    fn test_reports_every_unknown_token() {
        let text = "DKTK_STRAT_A_STRATIFIER\nDKTK_STRAT_GENDER_STRATIFIER\nDKTK_STRAT_B_STRATIFIER\n";
        let err = resolve_placeholders(text, &catalog()).unwrap_err();
        match err {
            MeasureError::Multiple(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.iter().all(|e| e.code() == MSR0102));
            }
            other => panic!("expected multiple errors, got {:?}", other),
        }
    }

    #[test]
    fn test_lossy_keeps_unknown_tokens() {
        let text = "\nDKTK_STRAT_GENDER_STRATIFIER\nDKTK_STRAT_A_STRATIFIER\n";
        let (resolved, errors) = resolve_placeholders_lossy(text, &catalog());
        assert_eq!(resolved, "\ndefine Gender:\nPatient.gender\nDKTK_STRAT_A_STRATIFIER\n");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_single_unknown_token_has_location() {
        let err = resolve_placeholders("\n\nDHKI_STRAT_X_STRATIFIER\n", &catalog()).unwrap_err();
        match err {
            MeasureError::Resolution { token, location, .. } => {
                assert_eq!(token, "DHKI_STRAT_X_STRATIFIER");
                assert_eq!(location.map(|l| l.line), Some(3));
            }
            other => panic!("expected resolution error, got {:?}", other),
        }
    }
}
