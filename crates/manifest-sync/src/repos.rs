use crate::config::DEFAULT_REPOSITORY;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const DEFAULT_REPOSITORY_NAME: &str = "FairyRoot";

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(flatten)]
    repositories: BTreeMap<String, String>,
}

/// Named repository references that archives can be fetched from.
///
/// Loaded from a JSON object such as:
///
/// ```json
/// {
///     "default": "Fairyvmos/BlankTMing",
///     "FairyRoot": "Fairyvmos/BlankTMing"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCatalog {
    default: String,
    repositories: BTreeMap<String, String>,
}

impl Default for RepositoryCatalog {
    fn default() -> Self {
        let mut repositories = BTreeMap::new();
        repositories.insert(
            DEFAULT_REPOSITORY_NAME.to_string(),
            DEFAULT_REPOSITORY.to_string(),
        );
        Self {
            default: DEFAULT_REPOSITORY.to_string(),
            repositories,
        }
    }
}

impl RepositoryCatalog {
    /// Load a catalog file, or the built-in catalog if the file is absent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "{} not found; using built-in repository list",
                path.display()
            );
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let file: CatalogFile = serde_json::from_str(text)?;
        let default = file
            .default
            .unwrap_or_else(|| DEFAULT_REPOSITORY.to_string());
        let mut repositories = file.repositories;

        if !repositories.values().any(|reference| *reference == default) {
            repositories.insert(default.clone(), default.clone());
        }

        Ok(Self {
            default,
            repositories,
        })
    }

    /// Write the built-in catalog to `path`.
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let catalog = Self::default();
        let file = CatalogFile {
            default: Some(catalog.default),
            repositories: catalog.repositories,
        };
        let text =
            serde_json::to_string_pretty(&file).map_err(|e| Error::Config(e.to_string()))?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        Ok(())
    }

    /// Reference used when nothing (or something unknown) is selected.
    pub fn default_reference(&self) -> &str {
        &self.default
    }

    /// Display names of all repositories.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }

    /// Look up a repository by display name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.repositories.get(name).map(String::as_str)
    }

    /// Resolve a selected display name to a repository reference.
    pub fn resolve(&self, name: Option<&str>) -> &str {
        match name {
            Some(name) => self.get(name).unwrap_or_else(|| {
                log::warn!("Unknown repository '{}'; using {}", name, self.default);
                self.default.as_str()
            }),
            None => self.default.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_builtin() {
        let dir = tempdir().unwrap();
        let catalog = RepositoryCatalog::load(dir.path().join("repo.json")).unwrap();
        assert_eq!(catalog.default_reference(), DEFAULT_REPOSITORY);
        assert_eq!(catalog.get("FairyRoot"), Some(DEFAULT_REPOSITORY));
    }

    #[test]
    fn test_parse_named_entries() {
        let catalog = RepositoryCatalog::from_json(
            r#"{"default": "b/two", "One": "a/one", "Two": "b/two"}"#,
        )
        .unwrap();

        assert_eq!(catalog.default_reference(), "b/two");
        assert_eq!(catalog.resolve(Some("One")), "a/one");
        assert_eq!(catalog.resolve(Some("Nope")), "b/two");
        assert_eq!(catalog.resolve(None), "b/two");
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["One", "Two"]);
    }

    #[test]
    fn test_default_not_listed_is_added() {
        let catalog =
            RepositoryCatalog::from_json(r#"{"default": "c/three", "One": "a/one"}"#).unwrap();
        assert_eq!(catalog.get("c/three"), Some("c/three"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repo.json");
        fs::write(&path, "{ not json").unwrap();

        let err = RepositoryCatalog::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_write_default_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("repo.json");
        RepositoryCatalog::write_default(&path).unwrap();

        let loaded = RepositoryCatalog::load(&path).unwrap();
        assert_eq!(loaded, RepositoryCatalog::default());
    }
}
