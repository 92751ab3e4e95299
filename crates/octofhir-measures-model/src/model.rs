//! FHIR `Measure` structures as exchanged with charting clients
//!
//! Only the elements a measure item uses are modelled: `code.text`, the
//! population-basis `extension`, `population` and `stratifier`. Field names
//! follow the FHIR JSON representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Extension URL declaring the resource type a measure counts over
pub const POPULATION_BASIS_URL: &str =
    "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-populationBasis";

/// Code system of measure population types
pub const MEASURE_POPULATION_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/measure-population";

/// Population code of the initial population
pub const INITIAL_POPULATION_CODE: &str = "initial-population";

// ============================================================================
// Measure Item
// ============================================================================

/// A measure together with the key it is selected by and its CQL text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureItem {
    /// Key the consumer indexes measures by
    pub key: String,
    /// FHIR Measure fragment
    pub measure: Measure,
    /// CQL source supplying the referenced expressions
    pub cql: String,
}

/// FHIR Measure fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    /// Measure label
    pub code: CodeText,
    /// Extensions (population basis)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    /// Populations
    pub population: Vec<Population>,
    /// Stratifiers, in display order
    #[serde(default)]
    pub stratifier: Vec<Stratifier>,
}

impl Measure {
    /// Population basis code declared by the cqfm extension, if any
    pub fn population_basis(&self) -> Option<&str> {
        self.extension
            .iter()
            .find(|ext| ext.url == POPULATION_BASIS_URL)
            .and_then(|ext| ext.value_code.as_deref())
    }

    /// The population coded `initial-population`
    pub fn initial_population(&self) -> Option<&Population> {
        self.population.iter().find(|p| p.is_initial())
    }
}

// ============================================================================
// Elements
// ============================================================================

/// A code carried only as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeText {
    pub text: String,
}

impl CodeText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// FHIR extension with a code value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_code: Option<String>,
}

impl Extension {
    /// The cqfm population-basis extension
    pub fn population_basis(code: impl Into<String>) -> Self {
        Self {
            url: POPULATION_BASIS_URL.to_string(),
            value_code: Some(code.into()),
        }
    }

    pub fn is_population_basis(&self) -> bool {
        self.url == POPULATION_BASIS_URL
    }
}

/// Codeable concept with codings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
}

/// A system/code pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
}

/// Measure population
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    pub code: CodeableConcept,
    pub criteria: Criteria,
}

impl Population {
    /// An `initial-population` population
    pub fn initial(criteria: Criteria) -> Self {
        Self {
            code: CodeableConcept {
                coding: vec![Coding {
                    system: MEASURE_POPULATION_SYSTEM.to_string(),
                    code: INITIAL_POPULATION_CODE.to_string(),
                }],
            },
            criteria,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.code
            .coding
            .iter()
            .any(|c| c.system == MEASURE_POPULATION_SYSTEM && c.code == INITIAL_POPULATION_CODE)
    }
}

/// Measure stratifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratifier {
    pub code: CodeText,
    pub criteria: Criteria,
}

/// Expression criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub language: ExpressionLanguage,
    pub expression: String,
}

impl Criteria {
    /// Criteria naming an expression of the CQL library
    pub fn identifier(expression: impl Into<String>) -> Self {
        Self {
            language: ExpressionLanguage::CqlIdentifier,
            expression: expression.into(),
        }
    }

    /// Criteria given as inline CQL
    pub fn cql(expression: impl Into<String>) -> Self {
        Self {
            language: ExpressionLanguage::Cql,
            expression: expression.into(),
        }
    }
}

/// Language of a criteria expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpressionLanguage {
    /// The expression is a bare identifier resolved against the library
    #[serde(rename = "text/cql-identifier")]
    CqlIdentifier,
    /// The expression is CQL text
    #[serde(rename = "text/cql")]
    Cql,
}

impl ExpressionLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CqlIdentifier => "text/cql-identifier",
            Self::Cql => "text/cql",
        }
    }
}

impl fmt::Display for ExpressionLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Population Basis
// ============================================================================

/// FHIR resource type a measure counts over
///
/// Absence of a basis means the measure counts patients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PopulationBasis {
    Condition,
    Procedure,
    Specimen,
    MedicationStatement,
    Encounter,
    Observation,
    /// Any other resource type, kept verbatim
    Other(String),
}

impl PopulationBasis {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Condition => "Condition",
            Self::Procedure => "Procedure",
            Self::Specimen => "Specimen",
            Self::MedicationStatement => "MedicationStatement",
            Self::Encounter => "Encounter",
            Self::Observation => "Observation",
            Self::Other(code) => code,
        }
    }

    /// The cqfm extension declaring this basis
    pub fn to_extension(&self) -> Extension {
        Extension::population_basis(self.as_str())
    }
}

impl From<String> for PopulationBasis {
    fn from(code: String) -> Self {
        match code.as_str() {
            "Condition" => Self::Condition,
            "Procedure" => Self::Procedure,
            "Specimen" => Self::Specimen,
            "MedicationStatement" => Self::MedicationStatement,
            "Encounter" => Self::Encounter,
            "Observation" => Self::Observation,
            _ => Self::Other(code),
        }
    }
}

impl From<PopulationBasis> for String {
    fn from(basis: PopulationBasis) -> Self {
        basis.as_str().to_string()
    }
}

impl FromStr for PopulationBasis {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for PopulationBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
