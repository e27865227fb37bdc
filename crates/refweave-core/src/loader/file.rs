//! Filesystem loader
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use crate::error::Error;
use crate::loader::parser::SchemaParser;
use crate::loader::SchemaLoader;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads YAML/JSON documents relative to a base directory
///
/// Identities that resolve outside the base directory are rejected.
#[derive(Debug)]
pub struct FileLoader {
    base_dir: PathBuf,
    parser: SchemaParser,
}

impl FileLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            parser: SchemaParser::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Check if a path stays within the base directory
    pub fn is_safe_path(&self, path: &Path) -> bool {
        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        let Ok(canonical_base) = self.base_dir.canonicalize() else {
            return false;
        };

        match full_path.canonicalize() {
            Ok(canonical_path) => canonical_path.starts_with(&canonical_base),
            // The file may not exist yet; judge by its parent directory
            Err(_) => full_path
                .parent()
                .and_then(|parent| parent.canonicalize().ok())
                .map(|parent| parent.starts_with(&canonical_base))
                .unwrap_or(false),
        }
    }

    fn resolve(&self, identity: &str) -> Result<PathBuf, Error> {
        let relative = identity.strip_prefix("file://").unwrap_or(identity);
        let path = Path::new(relative);

        if !self.is_safe_path(path) {
            return Err(Error::path_traversal(identity, self.base_dir.clone()));
        }

        Ok(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        })
    }
}

impl SchemaLoader for FileLoader {
    fn load(&self, identity: &str) -> anyhow::Result<Value> {
        let path = self.resolve(identity)?;
        debug!(identity, path = %path.display(), "Loading schema document");
        Ok(self.parser.parse_file(&path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_loads_yaml_and_json() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("common")).unwrap();
        fs::write(dir.path().join("car.yaml"), "type: object\n").unwrap();
        fs::write(dir.path().join("common/money.json"), r#"{"type": "number"}"#).unwrap();

        let loader = FileLoader::new(dir.path());
        assert_eq!(loader.load("car.yaml").unwrap()["type"], "object");
        assert_eq!(loader.load("common/money.json").unwrap()["type"], "number");
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempdir().unwrap();
        let loader = FileLoader::new(dir.path());
        let err = loader.load("missing.json").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Io { .. })));
    }

    #[test]
    fn test_rejects_path_traversal() {
        let outer = tempdir().unwrap();
        let base = outer.path().join("schemas");
        fs::create_dir(&base).unwrap();
        fs::write(outer.path().join("secret.json"), "{}").unwrap();

        let loader = FileLoader::new(&base);
        let err = loader.load("../secret.json").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::PathTraversal { .. })
        ));
    }
}
