//! Integrity checks over a measure registry
//!
//! Nothing here runs implicitly; the registry emits its data as authored.
//! [`check`] resolves every measure's CQL body against a
//! [`StratifierSource`] and reports:
//!
//! - empty keys and duplicate exported keys
//! - empty stratifier labels, empty expressions, empty population basis codes
//! - placeholder tokens the source does not know
//! - identifiers that no `define` in scope provides
//! - names defined more than once
//! - inline `text/cql` expressions too complex to check (warning)
//!
//! The consumer concatenates all exported bodies into one library, so a
//! measure may rely on definitions from another measure's body. That is the
//! default [`Scope::Library`]; [`Scope::Measure`] only counts the measure's
//! own body and the library header.

use crate::definition::MeasureDefinition;
use crate::registry::MeasureRegistry;
use indexmap::{IndexMap, IndexSet};
use octofhir_measures_cql::{
    AssemblyConfig, DefinitionKind, LibraryAssembler, StratifierSource, referenced_identifier,
    resolve_placeholders_lossy, scan_definitions,
};
use octofhir_measures_diagnostics::{
    Diagnostic, MSR0001, MSR0002, MSR0003, MSR0005, MSR0100, MSR0101, MSR0103, MSR0104, Severity,
};
use octofhir_measures_model::{ExpressionLanguage, PopulationBasis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which definitions an identifier may resolve against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The measure's own body plus the header
    Measure,
    /// All exported bodies plus the header
    #[default]
    Library,
}

/// Options for [`check`]
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub scope: Scope,
    /// Also check drafts; each draft is checked against its own body only
    pub include_drafts: bool,
    /// Header settings; the header contributes `InInitialPopulation`
    pub assembly: AssemblyConfig,
}

/// Result of a check run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Number of measure definitions checked
    pub checked: usize,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// No errors, and in strict mode no warnings either
    pub fn is_clean(&self, strict: bool) -> bool {
        !self.has_errors() && !(strict && self.warnings().next().is_some())
    }

    /// Diagnostics attached to the measure `key`
    pub fn for_measure<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.measure.as_deref() == Some(key))
    }
}

/// Check the registry's measures (and optionally drafts)
pub fn check(registry: &MeasureRegistry, options: &CheckOptions, source: &dyn StratifierSource) -> CheckReport {
    let assembler = LibraryAssembler::new(options.assembly.clone());
    let header_names = assembler.header_definitions();
    let mut report = CheckReport::default();

    log::debug!(
        "checking {} measures ({:?} scope) against {}",
        registry.len(),
        options.scope,
        source.describe()
    );

    let mut seen_keys = HashSet::new();
    let mut resolved = Vec::with_capacity(registry.len());
    for measure in registry.measures() {
        check_shape(measure, &mut report.diagnostics);
        if !measure.key.is_empty() && !seen_keys.insert(measure.key.as_str()) {
            report.diagnostics.push(
                Diagnostic::error(MSR0100, format!("Measure key '{}' is used more than once", measure.key))
                    .for_measure(measure.key.clone()),
            );
        }
        resolved.push(resolve_body(measure, source, &mut report.diagnostics));
    }

    match options.scope {
        Scope::Library => {
            let library_names = check_duplicates(
                registry.measures().iter().zip(&resolved),
                &header_names,
                &mut report.diagnostics,
            );
            for measure in registry.measures() {
                check_references(measure, &library_names, &mut report.diagnostics);
            }
        }
        Scope::Measure => {
            for (measure, text) in registry.measures().iter().zip(&resolved) {
                let own = check_duplicates([(measure, text)], &header_names, &mut report.diagnostics);
                check_references(measure, &own, &mut report.diagnostics);
            }
        }
    }
    report.checked = registry.len();

    if options.include_drafts {
        for draft in registry.drafts() {
            let mut diagnostics = Vec::new();
            check_shape(draft, &mut diagnostics);
            let text = resolve_body(draft, source, &mut diagnostics);
            let own = check_duplicates([(draft, &text)], &header_names, &mut diagnostics);
            check_references(draft, &own, &mut diagnostics);
            report
                .diagnostics
                .extend(diagnostics.into_iter().map(|d| d.with_related("draft")));
        }
        report.checked += registry.drafts().len();
    }

    log::debug!(
        "check finished: {} errors, {} warnings",
        report.errors().count(),
        report.warnings().count()
    );
    report
}

fn check_shape(measure: &MeasureDefinition, diagnostics: &mut Vec<Diagnostic>) {
    if measure.key.trim().is_empty() {
        diagnostics.push(Diagnostic::error(
            MSR0001,
            format!("Measure '{}' has an empty key", measure.measure_code),
        ));
    }
    for (i, stratifier) in measure.stratifiers.iter().enumerate() {
        if stratifier.label.trim().is_empty() {
            diagnostics.push(
                Diagnostic::error(MSR0002, format!("Stratifier #{} has an empty label", i + 1))
                    .for_measure(measure.key.clone()),
            );
        }
    }
    if let Some(PopulationBasis::Other(code)) = &measure.population_basis {
        if code.trim().is_empty() {
            diagnostics.push(
                Diagnostic::error(MSR0003, "Population basis code is empty").for_measure(measure.key.clone()),
            );
        }
    }
}

fn resolve_body(measure: &MeasureDefinition, source: &dyn StratifierSource, diagnostics: &mut Vec<Diagnostic>) -> String {
    let (text, errors) = resolve_placeholders_lossy(&measure.cql_body, source);
    diagnostics.extend(
        errors
            .iter()
            .map(|e| e.to_diagnostic().for_measure(measure.key.clone())),
    );
    text
}

/// Collect the names defined by the header and `bodies`, reporting repeats
fn check_duplicates<'a>(
    bodies: impl IntoIterator<Item = (&'a MeasureDefinition, &'a String)>,
    header_names: &IndexSet<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> IndexSet<String> {
    // name -> (key of the defining measure or None for the header, kind)
    let mut owners: IndexMap<String, (Option<&str>, DefinitionKind)> = header_names
        .iter()
        .map(|name| (name.clone(), (None, DefinitionKind::Expression)))
        .collect();

    for (measure, text) in bodies {
        for definition in scan_definitions(text) {
            if let Some((owner, kind)) = owners.get(&definition.name) {
                // function overloads
                if *kind == DefinitionKind::Function && definition.kind == DefinitionKind::Function {
                    continue;
                }
                let first = match owner {
                    Some(key) => format!("first defined by measure '{}'", key),
                    None => "first defined by the library header".to_string(),
                };
                diagnostics.push(
                    Diagnostic::error(MSR0103, format!("'{}' is defined more than once", definition.name))
                        .for_measure(measure.key.clone())
                        .with_location(definition.location)
                        .with_related(first),
                );
                continue;
            }
            owners.insert(definition.name, (Some(measure.key.as_str()), definition.kind));
        }
    }

    owners.into_keys().collect()
}

fn check_references(measure: &MeasureDefinition, names: &IndexSet<String>, diagnostics: &mut Vec<Diagnostic>) {
    let initial = std::iter::once((
        "initial population".to_string(),
        ExpressionLanguage::CqlIdentifier,
        measure.initial_population_expression.as_str(),
    ));
    let stratifiers = measure
        .stratifiers
        .iter()
        .map(|s| (format!("stratifier '{}'", s.label), s.language, s.expression.as_str()));

    for (what, language, expression) in initial.chain(stratifiers) {
        if expression.trim().is_empty() {
            diagnostics.push(
                Diagnostic::error(MSR0005, format!("The {} has an empty expression", what))
                    .for_measure(measure.key.clone()),
            );
            continue;
        }

        match (referenced_identifier(expression), language) {
            (Some(name), _) => {
                if !names.contains(name) {
                    diagnostics.push(
                        Diagnostic::error(
                            MSR0101,
                            format!("'{}' used by the {} is not defined", name, what),
                        )
                        .for_measure(measure.key.clone()),
                    );
                }
            }
            (None, ExpressionLanguage::CqlIdentifier) => {
                diagnostics.push(
                    Diagnostic::error(
                        MSR0101,
                        format!("The {} expects an identifier, found '{}'", what, expression.trim()),
                    )
                    .for_measure(measure.key.clone()),
                );
            }
            (None, ExpressionLanguage::Cql) => {
                diagnostics.push(
                    Diagnostic::warning(
                        MSR0104,
                        format!("Inline expression of the {} is not checked", what),
                    )
                    .for_measure(measure.key.clone()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_measures_cql::StratifierCatalog;
    use octofhir_measures_diagnostics::MSR0102;
    use pretty_assertions::assert_eq;

    fn catalog() -> StratifierCatalog {
        let mut catalog = StratifierCatalog::new();
        catalog.insert("TEST_STRAT_A", "define A:\n  1\n\ndefine function Label(x Integer):\n  x");
        catalog.insert("TEST_STRAT_B", "define B:\n  2");
        catalog
    }

    fn measure(key: &str, body: &str) -> MeasureDefinition {
        MeasureDefinition::builder(key, key)
            .initial_population("InInitialPopulation")
            .cql(body)
            .build()
    }

    fn codes(report: &CheckReport) -> Vec<String> {
        report.diagnostics.iter().map(|d| d.code.to_string()).collect()
    }

    #[test]
    fn test_clean_registry() {
        let mut a = measure("a", "\nTEST_STRAT_A\n");
        a.stratifiers.push(crate::StratifierDefinition::cql("A", "A"));
        let registry = MeasureRegistry::new([a, measure("b", "\nTEST_STRAT_B\n")]);
        let report = check(&registry, &CheckOptions::default(), &catalog());
        assert_eq!(codes(&report), Vec::<String>::new());
        assert_eq!(report.checked, 2);
        assert!(report.is_clean(true));
    }

    #[test]
    fn test_duplicate_key() {
        let registry = MeasureRegistry::new([measure("a", ""), measure("a", "")]);
        let report = check(&registry, &CheckOptions::default(), &catalog());
        assert_eq!(codes(&report), vec!["MSR0100"]);
    }

    #[test]
    fn test_unknown_placeholder() {
        let registry = MeasureRegistry::new([measure("a", "\nTEST_STRAT_MISSING\n")]);
        let report = check(&registry, &CheckOptions::default(), &catalog());
        let diag = report.errors().next().unwrap();
        assert_eq!(diag.code, MSR0102);
        assert_eq!(diag.measure.as_deref(), Some("a"));
        assert_eq!(diag.location.as_ref().map(|l| l.line), Some(2));
    }

    #[test]
    fn test_scope_decides_cross_body_references() {
        let mut b = measure("b", "\nTEST_STRAT_B\n");
        b.stratifiers.push(crate::StratifierDefinition::cql("uses A", "A"));
        let registry = MeasureRegistry::new([measure("a", "\nTEST_STRAT_A\n"), b]);

        let library = check(&registry, &CheckOptions::default(), &catalog());
        assert!(library.is_clean(false));

        let options = CheckOptions {
            scope: Scope::Measure,
            ..Default::default()
        };
        let per_measure = check(&registry, &options, &catalog());
        assert_eq!(codes(&per_measure), vec!["MSR0101"]);
        assert_eq!(per_measure.for_measure("b").count(), 1);
    }

    #[test]
    fn test_duplicate_definition_across_bodies() {
        let registry = MeasureRegistry::new([measure("a", "\nTEST_STRAT_B\n"), measure("b", "\nTEST_STRAT_B\n")]);
        let report = check(&registry, &CheckOptions::default(), &catalog());
        assert_eq!(codes(&report), vec!["MSR0103"]);
        assert_eq!(report.diagnostics[0].related, vec!["first defined by measure 'a'"]);
    }

    #[test]
    fn test_redefining_header_name() {
        let registry = MeasureRegistry::new([measure("a", "define InInitialPopulation:\n  false")]);
        let report = check(&registry, &CheckOptions::default(), &catalog());
        assert_eq!(codes(&report), vec!["MSR0103"]);
    }

    #[test]
    fn test_inline_expression_warns() {
        let mut a = measure("a", "");
        a.stratifiers.push(crate::StratifierDefinition::cql("Adult", "AgeInYears() >= 18"));
        a.stratifiers.push(crate::StratifierDefinition::cql("", "InInitialPopulation"));
        let registry = MeasureRegistry::new([a]);
        let report = check(&registry, &CheckOptions::default(), &catalog());

        assert_eq!(codes(&report), vec!["MSR0002", "MSR0104"]);
        assert!(!report.is_clean(false));

        let mut b = measure("b", "");
        b.stratifiers.push(crate::StratifierDefinition::cql("Adult", "AgeInYears() >= 18"));
        let report = check(&MeasureRegistry::new([b]), &CheckOptions::default(), &catalog());
        assert!(report.is_clean(false));
        assert!(!report.is_clean(true));
    }

    #[test]
    fn test_empty_key_and_expression() {
        let mut a = measure("", "");
        a.initial_population_expression = " ".to_string();
        a.population_basis = Some(PopulationBasis::Other(String::new()));
        let report = check(&MeasureRegistry::new([a]), &CheckOptions::default(), &catalog());
        assert_eq!(codes(&report), vec!["MSR0001", "MSR0003", "MSR0005"]);
    }
}
