//! Tests for the authored measure catalog
//!
//! Covers:
//! - Export order and key uniqueness
//! - Population basis extensions
//! - The patient-level measure
//! - JSON round trip
//! - Integrity checks in library and measure scope, drafts included

use octofhir_measures_cql::{LibraryAssembler, StratifierCatalog, defined_names};
use octofhir_measures_diagnostics::MSR0101;
use octofhir_measures_model::{ExpressionLanguage, POPULATION_BASIS_URL, PopulationBasis};
use octofhir_measures_registry::{
    CheckOptions, MeasureDefinition, MeasureRegistry, Scope, check, default_registry, get_measures,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashSet;

#[test]
fn test_export_order() {
    let keys: Vec<_> = get_measures().iter().map(|m| m.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["patients", "diagnosis", "specimen", "procedures", "medicationStatements", "encounters"]
    );
}

#[test]
fn test_keys_are_unique_and_non_empty() {
    let mut seen = HashSet::new();
    for measure in get_measures() {
        assert!(!measure.key.is_empty());
        assert!(seen.insert(measure.key.as_str()), "duplicate key {}", measure.key);
    }
}

#[test]
fn test_drafts_are_kept_but_not_exported() {
    let registry = default_registry();
    assert_eq!(registry.drafts().len(), 5);
    assert!(registry.drafts().iter().all(|d| !d.enabled));
    assert!(registry.drafts().iter().all(|d| registry.get(&d.key).is_some()));
    assert_eq!(registry.to_items().len(), 6);
}

#[rstest]
#[case("diagnosis", PopulationBasis::Condition, "Diagnosis")]
#[case("specimen", PopulationBasis::Specimen, "Specimen")]
#[case("procedures", PopulationBasis::Procedure, "Procedure")]
#[case("medicationStatements", PopulationBasis::MedicationStatement, "MedicationStatement")]
#[case("encounters", PopulationBasis::Encounter, "Encounter")]
fn test_population_basis(#[case] key: &str, #[case] basis: PopulationBasis, #[case] initial: &str) {
    let measure = default_registry().get(key).unwrap();
    assert_eq!(measure.population_basis.as_ref(), Some(&basis));
    assert_eq!(measure.initial_population_expression, initial);

    let item = measure.to_item();
    assert_eq!(item.measure.extension.len(), 1);
    assert_eq!(item.measure.extension[0].url, POPULATION_BASIS_URL);
    assert_eq!(item.measure.population_basis(), Some(basis.as_str()));
}

#[test]
fn test_patients_measure() {
    let patients = default_registry().get("patients").unwrap();
    assert!(patients.is_patient_level());
    assert!(patients.to_item().measure.extension.is_empty());

    let labels: Vec<_> = patients.stratifiers.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Gender", "75186-7", "Age"]);
    let expressions: Vec<_> = patients.stratifiers.iter().map(|s| s.expression.as_str()).collect();
    assert_eq!(expressions, vec!["Gender", "Deceased", "AgeClass"]);
}

#[test]
fn test_encounters_code_text_is_capitalised() {
    assert_eq!(default_registry().get("encounters").unwrap().measure_code, "Encounters");
}

#[test]
fn test_diagnosis_uses_identifier_stratifier() {
    let diagnosis = default_registry().get("diagnosis").unwrap();
    assert_eq!(diagnosis.stratifiers[0].language, ExpressionLanguage::CqlIdentifier);
    assert!(
        get_measures()
            .iter()
            .filter(|m| m.key != "diagnosis")
            .flat_map(|m| &m.stratifiers)
            .all(|s| s.language == ExpressionLanguage::Cql)
    );
}

#[test]
fn test_json_round_trip() {
    let json = default_registry().to_json(true).unwrap();
    let restored = MeasureRegistry::from_json(&json).unwrap();
    assert_eq!(restored.measures(), get_measures());
}

#[test]
fn test_definition_json_round_trip() {
    for definition in default_registry().iter_all() {
        let json = serde_json::to_string(definition).unwrap();
        let restored: MeasureDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(&restored, definition);
    }
}

#[test]
fn test_library_scope_is_clean() {
    let report = check(default_registry(), &CheckOptions::default(), StratifierCatalog::bundled());
    assert!(report.diagnostics.is_empty(), "{:#?}", report.diagnostics);
    assert_eq!(report.checked, 6);
}

#[test]
fn test_identifiers_defined_in_assembled_library() {
    let library = LibraryAssembler::default()
        .assemble_resolved(
            get_measures().iter().map(|m| m.cql_body.as_str()),
            StratifierCatalog::bundled(),
        )
        .unwrap();
    let names = defined_names(&library);
    for measure in get_measures() {
        for (_, expression) in measure.referenced_expressions() {
            assert!(names.contains(expression), "{} missing for {}", expression, measure.key);
        }
    }
}

#[test]
fn test_measure_scope_reports_shared_procedure_type() {
    let options = CheckOptions {
        scope: Scope::Measure,
        ..Default::default()
    };
    let report = check(default_registry(), &options, StratifierCatalog::bundled());

    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, MSR0101);
    assert_eq!(errors[0].measure.as_deref(), Some("medicationStatements"));
    assert!(errors[0].message.contains("ProcedureType"));
}

#[test]
fn test_drafts_are_checked_in_their_own_scope() {
    let options = CheckOptions {
        include_drafts: true,
        ..Default::default()
    };
    let report = check(default_registry(), &options, StratifierCatalog::bundled());
    assert_eq!(report.checked, 11);

    // both medication drafts lack the procedures body
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|d| d.code == MSR0101));
    assert!(errors.iter().all(|d| d.measure.as_deref() == Some("medicationStatements")));
    assert!(errors.iter().all(|d| d.related.iter().any(|r| r == "draft")));
}
