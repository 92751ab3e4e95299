//! Stratifier source and assembly config loading for CLI commands

use anyhow::{Context, Result};
use octofhir_measures_cql::{AssemblyConfig, LayeredSource, StratifierSource};
use std::path::{Path, PathBuf};

/// Directory overrides (`-L` and `MEASURES_CQL_PATH`) layered over the bundled catalog
pub fn stratifier_source(cql_paths: Vec<PathBuf>) -> LayeredSource {
    for path in &cql_paths {
        if !path.is_dir() {
            log::warn!("CQL search path {} is not a directory", path.display());
        }
    }
    let source = LayeredSource::with_overrides(cql_paths);
    log::debug!("stratifier source: {}", source.describe());
    source
}

/// Load the assembly config from `path`, or the defaults
pub fn assembly_config(path: Option<&Path>) -> Result<AssemblyConfig> {
    match path {
        Some(path) => AssemblyConfig::from_json_file(path)
            .with_context(|| format!("Failed to load assembly config {}", path.display())),
        None => Ok(AssemblyConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_without_path() {
        assert_eq!(assembly_config(None).unwrap(), AssemblyConfig::default());
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assembly.json");
        std::fs::write(&path, r#"{"libraryName": "Measures"}"#).unwrap();
        assert_eq!(assembly_config(Some(&path)).unwrap().library_name, "Measures");
    }

    #[test]
    fn test_missing_config_file() {
        let err = assembly_config(Some(Path::new("/nonexistent/assembly.json"))).unwrap_err();
        assert!(err.to_string().contains("assembly config"));
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DKTK_STRAT_GENDER_STRATIFIER.cql"), "define Gender:\n  'x'").unwrap();
        let source = stratifier_source(vec![dir.path().to_path_buf()]);
        assert_eq!(source.lookup("DKTK_STRAT_GENDER_STRATIFIER").as_deref(), Some("define Gender:\n  'x'"));
        assert!(source.lookup("DHKI_STRAT_AGE_STRATIFIER").is_some());
    }
}
