//! Measure registry
//!
//! Holds measure definitions split into exported measures and drafts. The
//! registry is immutable after construction and performs no validation; see
//! [`check`](crate::check) for the opt-in integrity checks.

use crate::catalog;
use crate::definition::MeasureDefinition;
use octofhir_measures_diagnostics::{MSR0105, MSR0404, MeasureError, Result};
use octofhir_measures_model::{JsonSerializer, MeasureItem};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static DEFAULT_REGISTRY: Lazy<MeasureRegistry> = Lazy::new(|| {
    let registry = MeasureRegistry::new(catalog::authored());
    log::debug!(
        "built measure registry: {} exported, {} drafts",
        registry.len(),
        registry.drafts().len()
    );
    registry
});

/// The process-wide registry built from the authored catalog
pub fn default_registry() -> &'static MeasureRegistry {
    &DEFAULT_REGISTRY
}

/// The exported measures, in display order
pub fn get_measures() -> &'static [MeasureDefinition] {
    default_registry().measures()
}

/// Ordered collection of measure definitions
#[derive(Debug, Clone, Default)]
pub struct MeasureRegistry {
    measures: Vec<MeasureDefinition>,
    drafts: Vec<MeasureDefinition>,
    /// Key to position in `measures`; the first definition of a key wins
    index: HashMap<String, usize>,
}

impl MeasureRegistry {
    /// Build a registry, keeping enabled definitions as exported measures and
    /// the rest as drafts, both in the given order
    pub fn new(definitions: impl IntoIterator<Item = MeasureDefinition>) -> Self {
        let mut registry = Self::default();
        for definition in definitions {
            if !definition.enabled {
                registry.drafts.push(definition);
                continue;
            }
            let position = registry.measures.len();
            if registry.index.contains_key(&definition.key) {
                log::debug!("duplicate measure key '{}' is not indexed", definition.key);
            } else {
                registry.index.insert(definition.key.clone(), position);
            }
            registry.measures.push(definition);
        }
        registry
    }

    /// Build a registry from wire items; all of them are exported
    pub fn from_items(items: impl IntoIterator<Item = MeasureItem>) -> Result<Self> {
        let definitions = items
            .into_iter()
            .map(MeasureDefinition::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(definitions))
    }

    /// Parse a JSON array of measure items
    pub fn from_json(json: &str) -> Result<Self> {
        let items = JsonSerializer::new()
            .deserialize(json)
            .map_err(|e| MeasureError::system(MSR0404, format!("Invalid measure JSON: {}", e)))?;
        Self::from_items(items)
    }

    /// Exported measures, in order
    pub fn measures(&self) -> &[MeasureDefinition] {
        &self.measures
    }

    /// Disabled measures, in order
    pub fn drafts(&self) -> &[MeasureDefinition] {
        &self.drafts
    }

    /// Exported measures followed by drafts
    pub fn iter_all(&self) -> impl Iterator<Item = &MeasureDefinition> {
        self.measures.iter().chain(self.drafts.iter())
    }

    /// Exported measure by key
    pub fn get(&self, key: &str) -> Option<&MeasureDefinition> {
        self.index.get(key).map(|&i| &self.measures[i])
    }

    /// Keys of exported measures, in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.measures.iter().map(|m| m.key.as_str())
    }

    /// Number of exported measures
    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    /// Exported measures selected by key, in the order the keys are given
    pub fn select<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<&MeasureDefinition>> {
        keys.iter()
            .map(|key| {
                let key = key.as_ref();
                self.get(key).ok_or_else(|| {
                    MeasureError::integrity(MSR0105, format!("No measure with key '{}'", key))
                })
            })
            .collect()
    }

    /// Wire items for the exported measures
    pub fn to_items(&self) -> Vec<MeasureItem> {
        self.measures.iter().map(MeasureDefinition::to_item).collect()
    }

    /// JSON array of the exported measures' wire items
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let serializer = if pretty { JsonSerializer::pretty() } else { JsonSerializer::new() };
        serializer
            .serialize(&self.to_items())
            .map_err(|e| MeasureError::system(MSR0404, format!("Cannot serialize measures: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn definition(key: &str, code: &str) -> MeasureDefinition {
        MeasureDefinition::builder(key, code)
            .initial_population("InInitialPopulation")
            .build()
    }

    #[test]
    fn test_new_partitions_by_enabled() {
        let mut draft = definition("a", "draft");
        draft.enabled = false;
        let registry = MeasureRegistry::new([definition("a", "first"), draft, definition("b", "second")]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.drafts().len(), 1);
        assert_eq!(registry.get("a").unwrap().measure_code, "first");
        assert_eq!(registry.iter_all().count(), 3);
    }

    #[test]
    fn test_first_key_wins() {
        let registry = MeasureRegistry::new([definition("a", "first"), definition("a", "second")]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a").unwrap().measure_code, "first");
    }

    #[test]
    fn test_select_unknown_key() {
        let registry = MeasureRegistry::new([definition("a", "first")]);
        assert_eq!(registry.select(&["a"]).unwrap().len(), 1);
        let err = registry.select(&["a", "zzz"]).unwrap_err();
        assert_eq!(err.code(), MSR0105);
    }

    #[test]
    fn test_empty_registry() {
        let registry = MeasureRegistry::new(Vec::new());
        assert!(registry.is_empty());
        assert_eq!(registry.to_json(false).unwrap(), "[]");
    }

    #[test]
    fn test_from_json_invalid() {
        let err = MeasureRegistry::from_json("{").unwrap_err();
        assert_eq!(err.code(), MSR0404);
    }

    #[test]
    fn test_get_measures_is_default_registry() {
        assert_eq!(get_measures().len(), default_registry().len());
        assert!(std::ptr::eq(get_measures(), default_registry().measures()));
    }
}
