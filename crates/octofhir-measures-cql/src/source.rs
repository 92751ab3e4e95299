//! Stratifier sources: where placeholder tokens get their CQL from
//!
//! - [`StratifierCatalog`]: in-memory map, including the bundled catalog
//! - [`DirectorySource`]: `<TOKEN>.cql` files under search paths
//! - [`LayeredSource`]: first source that knows a token wins

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding extra search paths (colon separated)
pub const CQL_PATH_ENV: &str = "MEASURES_CQL_PATH";

/// Supplies the CQL text a placeholder token stands for
pub trait StratifierSource: Send + Sync {
    /// CQL definitions for `token`, if known
    fn lookup(&self, token: &str) -> Option<Cow<'_, str>>;

    /// Short description used in log output
    fn describe(&self) -> String;
}

impl<T: StratifierSource + ?Sized> StratifierSource for &T {
    fn lookup(&self, token: &str) -> Option<Cow<'_, str>> {
        (**self).lookup(token)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: StratifierSource + ?Sized> StratifierSource for Box<T> {
    fn lookup(&self, token: &str) -> Option<Cow<'_, str>> {
        (**self).lookup(token)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// ============================================================================
// Catalog
// ============================================================================

macro_rules! bundled {
    ($($token:literal),* $(,)?) => {
        &[$(($token, include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/cql/", $token, ".cql")))),*]
    };
}

/// Stratifier definitions shipped with the crate (embedded at compile time)
const BUNDLED_STRATIFIERS: &[(&str, &str)] = bundled![
    "DKTK_STRAT_GENDER_STRATIFIER",
    "DHKI_STRAT_AGE_STRATIFIER",
    "DKTK_STRAT_DECEASED_STRATIFIER",
    "DKTK_STRAT_DIAGNOSIS_STRATIFIER",
    "DKTK_STRAT_SPECIMEN_STRATIFIER",
    "DKTK_STRAT_PROCEDURE_STRATIFIER",
    "DKTK_STRAT_MEDICATION_STRATIFIER",
    "DHKI_STRAT_SPECIMEN_STRATIFIER",
    "DHKI_STRAT_MEDICATION_STRATIFIER",
    "DHKI_STRAT_ENCOUNTER_STRATIFIER",
];

static BUNDLED_CATALOG: Lazy<StratifierCatalog> = Lazy::new(|| {
    BUNDLED_STRATIFIERS
        .iter()
        .map(|(token, text)| (token.to_string(), text.to_string()))
        .collect()
});

/// In-memory token to CQL map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StratifierCatalog {
    entries: IndexMap<String, String>,
}

impl StratifierCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog embedded in this crate
    pub fn bundled() -> &'static StratifierCatalog {
        &BUNDLED_CATALOG
    }

    /// Add or replace a token's definitions
    pub fn insert(&mut self, token: impl Into<String>, cql: impl Into<String>) -> Option<String> {
        self.entries.insert(token.into(), cql.into())
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    /// Known tokens, in insertion order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for StratifierCatalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl StratifierSource for StratifierCatalog {
    fn lookup(&self, token: &str) -> Option<Cow<'_, str>> {
        self.get(token).map(Cow::Borrowed)
    }

    fn describe(&self) -> String {
        format!("catalog ({} stratifiers)", self.len())
    }
}

// ============================================================================
// Directory source
// ============================================================================

/// Reads `<TOKEN>.cql` files from search paths, caching what it finds
pub struct DirectorySource {
    search_paths: Vec<PathBuf>,
    cache: Arc<RwLock<HashMap<String, Option<String>>>>,
}

impl DirectorySource {
    /// Create a source over `search_paths` and the paths in `MEASURES_CQL_PATH`
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        let mut paths = search_paths;

        if let Ok(env_path) = std::env::var(CQL_PATH_ENV) {
            for path in env_path.split(':') {
                if !path.is_empty() {
                    paths.push(PathBuf::from(path));
                }
            }
        }

        Self::with_paths(paths)
    }

    /// Create a source over exactly `search_paths`
    pub fn with_paths(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    fn find_file(&self, token: &str) -> Option<PathBuf> {
        let filename = format!("{}.cql", token);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&filename))
            .find(|candidate| candidate.is_file())
    }

    fn load(&self, token: &str) -> Option<String> {
        if !crate::is_placeholder_token(token) {
            return None;
        }
        let path = self.find_file(token)?;
        match fs::read_to_string(&path) {
            Ok(content) => {
                log::debug!("loaded {} from {}", token, path.display());
                Some(content)
            }
            Err(e) => {
                log::warn!("failed to read {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl Default for DirectorySource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl StratifierSource for DirectorySource {
    fn lookup(&self, token: &str) -> Option<Cow<'_, str>> {
        {
            let cache = self.cache.read();
            if let Some(hit) = cache.get(token) {
                return hit.clone().map(Cow::Owned);
            }
        }

        let loaded = self.load(token);
        self.cache.write().insert(token.to_string(), loaded.clone());
        loaded.map(Cow::Owned)
    }

    fn describe(&self) -> String {
        let paths: Vec<_> = self.search_paths.iter().map(|p| p.display().to_string()).collect();
        format!("directories [{}]", paths.join(", "))
    }
}

// ============================================================================
// Layered source
// ============================================================================

/// Consults sources in order; the first that knows a token wins
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn StratifierSource>>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer with lower priority than the existing ones
    pub fn with(mut self, source: impl StratifierSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }

    /// Directory overrides on top of the bundled catalog
    pub fn with_overrides(search_paths: Vec<PathBuf>) -> Self {
        Self::new()
            .with(DirectorySource::new(search_paths))
            .with(StratifierCatalog::bundled())
    }
}

impl StratifierSource for LayeredSource {
    fn lookup(&self, token: &str) -> Option<Cow<'_, str>> {
        self.layers.iter().find_map(|layer| layer.lookup(token))
    }

    fn describe(&self) -> String {
        let layers: Vec<_> = self.layers.iter().map(|l| l.describe()).collect();
        layers.join(" > ")
    }
}
