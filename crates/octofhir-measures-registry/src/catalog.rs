//! The authored measure catalog
//!
//! Exported measures come first, in the order the consumer lists them.
//! Drafts are alternative versions kept for reference; they share keys with
//! exported measures and are never exported.

use crate::definition::MeasureDefinition;
use octofhir_measures_model::PopulationBasis;

/// Every authored measure, exported ones first, then drafts
pub fn authored() -> Vec<MeasureDefinition> {
    let mut all = exported();
    all.extend(drafts());
    all
}

/// The measures the consumer receives, in display order
pub fn exported() -> Vec<MeasureDefinition> {
    vec![
        dktk_patients(),
        dktk_diagnosis(),
        dhki_specimen(),
        dktk_procedures(),
        dhki_medication_statements(),
        dhki_encounters(),
    ]
}

/// Disabled alternatives, in authored order
pub fn drafts() -> Vec<MeasureDefinition> {
    vec![
        dktk_specimen_draft(),
        dktk_medication_statements_draft(),
        dhki_encounters_inline_draft(),
        dhki_specimen_inline_draft(),
        dhki_medication_statements_inline_draft(),
    ]
}

fn dktk_patients() -> MeasureDefinition {
    MeasureDefinition::builder("patients", "patients")
        .initial_population("InInitialPopulation")
        .stratifier("Gender", "Gender")
        .stratifier("75186-7", "Deceased")
        .stratifier("Age", "AgeClass")
        .cql("\nDKTK_STRAT_GENDER_STRATIFIER\n\nDHKI_STRAT_AGE_STRATIFIER\n\nDKTK_STRAT_DECEASED_STRATIFIER\n")
        .build()
}

fn dktk_diagnosis() -> MeasureDefinition {
    MeasureDefinition::builder("diagnosis", "diagnosis")
        .population_basis(PopulationBasis::Condition)
        .initial_population("Diagnosis")
        .identifier_stratifier("diagnosis", "DiagnosisCode")
        .cql("\nDKTK_STRAT_DIAGNOSIS_STRATIFIER\n")
        .build()
}

fn dhki_specimen() -> MeasureDefinition {
    MeasureDefinition::builder("specimen", "specimen")
        .population_basis(PopulationBasis::Specimen)
        .initial_population("Specimen")
        .stratifier("sample_kind", "SampleType")
        .stratifier("sample_subtype", "SampleSubtype")
        .cql("\nDHKI_STRAT_SPECIMEN_STRATIFIER\n")
        .build()
}

fn dktk_procedures() -> MeasureDefinition {
    MeasureDefinition::builder("procedures", "procedures")
        .population_basis(PopulationBasis::Procedure)
        .initial_population("Procedure")
        .stratifier("ProcedureType", "ProcedureType")
        .cql("\nDKTK_STRAT_PROCEDURE_STRATIFIER\n")
        .build()
}

// MedicationType reuses ProcedureType, which the procedures body defines
fn dhki_medication_statements() -> MeasureDefinition {
    MeasureDefinition::builder("medicationStatements", "medicationStatements")
        .population_basis(PopulationBasis::MedicationStatement)
        .initial_population("MedicationStatement")
        .stratifier("MedicationType", "ProcedureType")
        .stratifier("AppliedMedications", "AppliedMedications")
        .cql("\nDHKI_STRAT_MEDICATION_STRATIFIER\n")
        .build()
}

fn dhki_encounters() -> MeasureDefinition {
    MeasureDefinition::builder("encounters", "Encounters")
        .population_basis(PopulationBasis::Encounter)
        .initial_population("Encounter")
        .stratifier("Departments", "Departments")
        .cql("\nDHKI_STRAT_ENCOUNTER_STRATIFIER\n")
        .build()
}

fn dktk_specimen_draft() -> MeasureDefinition {
    MeasureDefinition::builder("specimen", "specimen")
        .population_basis(PopulationBasis::Specimen)
        .initial_population("Specimen")
        .stratifier("sample_kind", "SampleType")
        .cql("\nDKTK_STRAT_SPECIMEN_STRATIFIER\n")
        .disabled()
        .build()
}

fn dktk_medication_statements_draft() -> MeasureDefinition {
    MeasureDefinition::builder("medicationStatements", "medicationStatements")
        .population_basis(PopulationBasis::MedicationStatement)
        .initial_population("MedicationStatement")
        .stratifier("MedicationType", "ProcedureType")
        .cql("\nDKTK_STRAT_MEDICATION_STRATIFIER\n")
        .disabled()
        .build()
}

fn dhki_encounters_inline_draft() -> MeasureDefinition {
    MeasureDefinition::builder("encounters", "Encounters")
        .population_basis(PopulationBasis::Encounter)
        .initial_population("Encounter")
        .stratifier("Departments", "Departments")
        .cql(
            r#"
define Encounter:
if InInitialPopulation then [Encounter] else {} as List<Encounter>

define function Departments(encounter FHIR.Encounter):
encounter.identifier.where(system = 'http://dktk.dkfz.de/fhir/sid/hki-department').value.first()

"#,
        )
        .disabled()
        .build()
}

fn dhki_specimen_inline_draft() -> MeasureDefinition {
    MeasureDefinition::builder("specimen", "specimen")
        .population_basis(PopulationBasis::Specimen)
        .initial_population("Specimen")
        .stratifier("sample_kind", "SampleType")
        .stratifier("sample_subtype", "SampleSubtype")
        .cql(
            r#"
define Specimen:
if InInitialPopulation then [Specimen] else {} as List<Specimen>

define function SampleType(specimen FHIR.Specimen):
specimen.type.coding.where(system = 'https://fhir.bbmri.de/CodeSystem/SampleMaterialType').code.first()

define function SampleSubtype(specimen FHIR.Specimen):
specimen.type.text.first()

"#,
        )
        .disabled()
        .build()
}

fn dhki_medication_statements_inline_draft() -> MeasureDefinition {
    MeasureDefinition::builder("medicationStatements", "medicationStatements")
        .population_basis(PopulationBasis::MedicationStatement)
        .initial_population("MedicationStatement")
        .stratifier("MedicationType", "ProcedureType")
        .stratifier("AppliedMedications", "AppliedMedications")
        .cql(
            r#"
define MedicationStatement:
if InInitialPopulation then [MedicationStatement] else {} as List <MedicationStatement>

define function AppliedMedications(medication FHIR.MedicationStatement):
medication.medication.coding.code.last()
"#,
        )
        .disabled()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_measures_cql::placeholder_tokens;

    #[test]
    fn test_exported_are_enabled() {
        assert!(exported().iter().all(|m| m.enabled));
        assert!(drafts().iter().all(|m| !m.enabled));
        assert_eq!(authored().len(), 11);
    }

    #[test]
    fn test_exported_bodies_are_placeholders_only() {
        for measure in exported() {
            let tokens = placeholder_tokens(&measure.cql_body);
            assert!(!tokens.is_empty(), "{} has no placeholder", measure.key);
            assert!(
                !measure.cql_body.contains("define"),
                "{} has inline CQL",
                measure.key
            );
        }
    }

    #[test]
    fn test_inline_drafts_have_no_placeholders() {
        let inline: Vec<_> = drafts()
            .into_iter()
            .filter(|m| m.cql_body.contains("define"))
            .collect();
        assert_eq!(inline.len(), 3);
        assert!(inline.iter().all(|m| placeholder_tokens(&m.cql_body).is_empty()));
    }
}
