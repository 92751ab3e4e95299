//! Measure definitions
//!
//! A [`MeasureDefinition`] is the authored, flat form of a measure. It maps
//! one-to-one onto the [`MeasureItem`] wire shape, except for `enabled`, which
//! only decides whether the registry exports the measure.

use octofhir_measures_diagnostics::{MSR0003, MSR0004, MSR0006, MeasureError};
use octofhir_measures_model::{
    CodeText, Criteria, ExpressionLanguage, Measure, MeasureItem, Population, PopulationBasis,
    Stratifier,
};
use serde::{Deserialize, Serialize};

/// One categorical breakdown of a measure's population
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratifierDefinition {
    /// Label shown for the axis (`code.text`)
    pub label: String,
    pub language: ExpressionLanguage,
    /// Expression producing the stratum of each member
    pub expression: String,
}

impl StratifierDefinition {
    /// Stratifier with inline CQL (`text/cql`)
    pub fn cql(label: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            language: ExpressionLanguage::Cql,
            expression: expression.into(),
        }
    }

    /// Stratifier naming a library expression (`text/cql-identifier`)
    pub fn identifier(label: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            language: ExpressionLanguage::CqlIdentifier,
            expression: expression.into(),
        }
    }

    fn to_stratifier(&self) -> Stratifier {
        Stratifier {
            code: CodeText::new(self.label.clone()),
            criteria: Criteria {
                language: self.language,
                expression: self.expression.clone(),
            },
        }
    }
}

impl From<Stratifier> for StratifierDefinition {
    fn from(stratifier: Stratifier) -> Self {
        Self {
            label: stratifier.code.text,
            language: stratifier.criteria.language,
            expression: stratifier.criteria.expression,
        }
    }
}

/// A measure as authored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDefinition {
    /// Key the consumer selects the measure by
    pub key: String,
    /// Human-readable label (`measure.code.text`)
    pub measure_code: String,
    /// Resource type counted; `None` counts patients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population_basis: Option<PopulationBasis>,
    /// Identifier of the expression selecting the cohort
    pub initial_population_expression: String,
    /// Stratifiers in display order
    #[serde(default)]
    pub stratifiers: Vec<StratifierDefinition>,
    /// CQL text, usually placeholder tokens
    pub cql_body: String,
    /// Disabled measures stay in the registry as drafts
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl MeasureDefinition {
    /// Start building a measure
    pub fn builder(key: impl Into<String>, measure_code: impl Into<String>) -> MeasureDefinitionBuilder {
        MeasureDefinitionBuilder::new(key.into(), measure_code.into())
    }

    /// Whether the measure counts patients (no population basis)
    pub fn is_patient_level(&self) -> bool {
        self.population_basis.is_none()
    }

    /// Every expression the measure references: initial population first, then stratifiers
    pub fn referenced_expressions(&self) -> impl Iterator<Item = (ExpressionLanguage, &str)> {
        std::iter::once((ExpressionLanguage::CqlIdentifier, self.initial_population_expression.as_str()))
            .chain(self.stratifiers.iter().map(|s| (s.language, s.expression.as_str())))
    }

    /// The FHIR measure item for this definition
    pub fn to_item(&self) -> MeasureItem {
        MeasureItem {
            key: self.key.clone(),
            measure: Measure {
                code: CodeText::new(self.measure_code.clone()),
                extension: self
                    .population_basis
                    .iter()
                    .map(PopulationBasis::to_extension)
                    .collect(),
                population: vec![Population::initial(Criteria::identifier(
                    self.initial_population_expression.clone(),
                ))],
                stratifier: self.stratifiers.iter().map(StratifierDefinition::to_stratifier).collect(),
            },
            cql: self.cql_body.clone(),
        }
    }

    /// Read a definition back from a measure item
    ///
    /// The result is always enabled. Populations other than the initial
    /// population and extensions other than the population basis are dropped.
    pub fn from_item(item: MeasureItem) -> Result<Self, MeasureError> {
        let MeasureItem { key, measure, cql } = item;

        let mut population_basis = None;
        for ext in measure.extension.iter().filter(|e| e.is_population_basis()) {
            match ext.value_code.as_deref().map(str::trim) {
                Some(code) if !code.is_empty() => {
                    if population_basis.is_none() {
                        population_basis = Some(PopulationBasis::from(code.to_string()));
                    }
                }
                _ => {
                    return Err(MeasureError::definition_for(
                        MSR0003,
                        key,
                        "Population basis extension without valueCode",
                    ));
                }
            }
        }
        let dropped = measure.extension.iter().filter(|e| !e.is_population_basis()).count();
        if dropped > 0 {
            log::debug!("measure '{}': ignoring {} unrelated extension(s)", key, dropped);
        }

        let Some(initial) = measure.population.into_iter().find(Population::is_initial) else {
            return Err(MeasureError::definition_for(
                MSR0004,
                key,
                "No initial-population population",
            ));
        };
        if initial.criteria.language != ExpressionLanguage::CqlIdentifier {
            return Err(MeasureError::definition_for(
                MSR0006,
                key,
                format!("Initial population uses {}", initial.criteria.language),
            ));
        }

        Ok(Self {
            key,
            measure_code: measure.code.text,
            population_basis,
            initial_population_expression: initial.criteria.expression,
            stratifiers: measure.stratifier.into_iter().map(StratifierDefinition::from).collect(),
            cql_body: cql,
            enabled: true,
        })
    }
}

impl From<&MeasureDefinition> for MeasureItem {
    fn from(definition: &MeasureDefinition) -> Self {
        definition.to_item()
    }
}

impl TryFrom<MeasureItem> for MeasureDefinition {
    type Error = MeasureError;

    fn try_from(item: MeasureItem) -> Result<Self, Self::Error> {
        Self::from_item(item)
    }
}

/// Builder for [`MeasureDefinition`]
#[derive(Debug, Clone)]
pub struct MeasureDefinitionBuilder {
    definition: MeasureDefinition,
}

impl MeasureDefinitionBuilder {
    fn new(key: String, measure_code: String) -> Self {
        Self {
            definition: MeasureDefinition {
                key,
                measure_code,
                population_basis: None,
                initial_population_expression: String::new(),
                stratifiers: Vec::new(),
                cql_body: String::new(),
                enabled: true,
            },
        }
    }

    /// Count resources of this type instead of patients
    pub fn population_basis(mut self, basis: PopulationBasis) -> Self {
        self.definition.population_basis = Some(basis);
        self
    }

    pub fn initial_population(mut self, expression: impl Into<String>) -> Self {
        self.definition.initial_population_expression = expression.into();
        self
    }

    /// Append a `text/cql` stratifier
    pub fn stratifier(mut self, label: impl Into<String>, expression: impl Into<String>) -> Self {
        self.definition.stratifiers.push(StratifierDefinition::cql(label, expression));
        self
    }

    /// Append a `text/cql-identifier` stratifier
    pub fn identifier_stratifier(mut self, label: impl Into<String>, expression: impl Into<String>) -> Self {
        self.definition
            .stratifiers
            .push(StratifierDefinition::identifier(label, expression));
        self
    }

    pub fn cql(mut self, body: impl Into<String>) -> Self {
        self.definition.cql_body = body.into();
        self
    }

    /// Keep the measure as a draft
    pub fn disabled(mut self) -> Self {
        self.definition.enabled = false;
        self
    }

    pub fn build(self) -> MeasureDefinition {
        self.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_measures_model::{Extension, POPULATION_BASIS_URL};
    use pretty_assertions::assert_eq;

    fn procedures() -> MeasureDefinition {
        MeasureDefinition::builder("procedures", "procedures")
            .population_basis(PopulationBasis::Procedure)
            .initial_population("Procedure")
            .stratifier("ProcedureType", "ProcedureType")
            .cql("\nDKTK_STRAT_PROCEDURE_STRATIFIER\n")
            .build()
    }

    #[test]
    fn test_to_item_shape() {
        let item = procedures().to_item();
        assert_eq!(item.key, "procedures");
        assert_eq!(item.measure.code.text, "procedures");
        assert_eq!(item.measure.extension, vec![Extension::population_basis("Procedure")]);
        assert_eq!(item.measure.extension[0].url, POPULATION_BASIS_URL);

        let initial = item.measure.initial_population().unwrap();
        assert_eq!(initial.criteria, Criteria::identifier("Procedure"));
        assert_eq!(item.measure.stratifier[0].criteria, Criteria::cql("ProcedureType"));
    }

    #[test]
    fn test_from_item_restores_definition() {
        let definition = procedures();
        assert_eq!(MeasureDefinition::try_from(definition.to_item()).unwrap(), definition);
    }

    #[test]
    fn test_from_item_requires_initial_population() {
        let mut item = procedures().to_item();
        item.measure.population.clear();
        let err = MeasureDefinition::from_item(item).unwrap_err();
        assert_eq!(err.code(), MSR0004);
    }

    #[test]
    fn test_from_item_rejects_inline_initial_population() {
        let mut item = procedures().to_item();
        item.measure.population[0].criteria = Criteria::cql("Procedure");
        let err = MeasureDefinition::from_item(item).unwrap_err();
        assert_eq!(err.code(), MSR0006);
    }

    #[test]
    fn test_from_item_rejects_empty_basis() {
        let mut item = procedures().to_item();
        item.measure.extension[0].value_code = Some(" ".to_string());
        let err = MeasureDefinition::from_item(item).unwrap_err();
        assert_eq!(err.code(), MSR0003);
    }

    #[test]
    fn test_referenced_expressions_order() {
        let definition = MeasureDefinition::builder("patients", "patients")
            .initial_population("InInitialPopulation")
            .stratifier("Gender", "Gender")
            .identifier_stratifier("Age", "AgeClass")
            .build();
        let refs: Vec<_> = definition.referenced_expressions().map(|(_, e)| e).collect();
        assert_eq!(refs, vec!["InInitialPopulation", "Gender", "AgeClass"]);
        assert!(definition.is_patient_level());
    }

    #[test]
    fn test_enabled_defaults_when_missing() {
        let json = r#"{
            "key": "k",
            "measureCode": "k",
            "initialPopulationExpression": "InInitialPopulation",
            "cqlBody": ""
        }"#;
        let definition: MeasureDefinition = serde_json::from_str(json).unwrap();
        assert!(definition.enabled);
        assert!(definition.stratifiers.is_empty());
    }
}
