//! Golden file reading, comparison and updates

use crate::diff::DiffEngine;
use crate::{GoldenConfig, GoldenError, Result};
use refweave_core::canonical::to_canonical_string;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// What [`GoldenFile::verify`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoldenOutcome {
    /// Output equals the golden file
    Matched,
    /// The golden file was rewritten with new output
    Updated,
    /// The golden file did not exist and was written
    Created,
}

/// One golden file on disk
#[derive(Debug, Clone)]
pub struct GoldenFile {
    path: PathBuf,
    config: GoldenConfig,
}

impl GoldenFile {
    /// Golden file at `path`, configured from the environment
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: GoldenConfig::from_env(),
        }
    }

    pub fn with_config(mut self, config: GoldenConfig) -> Self {
        self.config = config;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the golden text, `None` when the file does not exist
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    /// Write text to the golden file, creating parent directories
    pub fn save(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Compare a JSON value, rendered canonically, with the golden file
    pub fn verify(&self, actual: &Value) -> Result<GoldenOutcome> {
        self.verify_text(&to_canonical_string(actual)?)
    }

    /// Compare text with the golden file
    ///
    /// In update mode the file is rewritten whenever it differs; otherwise a
    /// difference is a [`GoldenError::Mismatch`] carrying the diff.
    pub fn verify_text(&self, actual: &str) -> Result<GoldenOutcome> {
        let Some(expected) = self.load()? else {
            if self.config.update {
                self.save(actual)?;
                return Ok(GoldenOutcome::Created);
            }
            return Err(GoldenError::Missing(self.path.clone()));
        };

        let result = DiffEngine::new(self.config.diff_options.clone()).compare_text(&expected, actual);
        if result.matches {
            return Ok(GoldenOutcome::Matched);
        }

        if self.config.update {
            self.save(actual)?;
            return Ok(GoldenOutcome::Updated);
        }

        Err(GoldenError::Mismatch {
            path: self.path.clone(),
            diff: result.diff_output,
        })
    }
}

/// A directory of golden files
#[derive(Debug, Clone)]
pub struct GoldenDir {
    dir: PathBuf,
    config: GoldenConfig,
}

impl GoldenDir {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            config: GoldenConfig::from_env(),
        }
    }

    pub fn with_config(mut self, config: GoldenConfig) -> Self {
        self.config = config;
        self
    }

    /// The golden file for `name`, `.json` appended when missing
    pub fn file(&self, name: &str) -> GoldenFile {
        let filename = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{}.json", name)
        };

        GoldenFile::new(self.dir.join(filename)).with_config(self.config.clone())
    }

    /// Names of all golden files, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        if !self.dir.exists() {
            return Ok(names);
        }

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiffOptions;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn config(update: bool) -> GoldenConfig {
        GoldenConfig {
            update,
            diff_options: DiffOptions {
                colored: false,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_missing_golden_file() {
        let temp_dir = TempDir::new().unwrap();
        let golden = GoldenFile::new(temp_dir.path().join("car.json")).with_config(config(false));

        let err = golden.verify(&json!({})).unwrap_err();
        assert!(matches!(err, GoldenError::Missing(_)));
        assert!(!golden.exists());
    }

    #[test]
    fn test_create_then_match() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/car.json");
        let value = json!({"b": 1, "a": [true, null]});

        let outcome = GoldenFile::new(&path).with_config(config(true)).verify(&value).unwrap();
        assert_eq!(outcome, GoldenOutcome::Created);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"a\": [\n    true,\n    null\n  ],\n  \"b\": 1\n}\n"
        );

        // golden files and saved documents share one renderer
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            to_canonical_string(&value).unwrap()
        );

        let outcome = GoldenFile::new(&path).with_config(config(false)).verify(&value).unwrap();
        assert_eq!(outcome, GoldenOutcome::Matched);
    }

    #[test]
    fn test_mismatch_and_update() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("car.json");
        fs::write(&path, to_canonical_string(&json!({"type": "object"})).unwrap()).unwrap();

        let err = GoldenFile::new(&path)
            .with_config(config(false))
            .verify(&json!({"type": "string"}))
            .unwrap_err();
        match err {
            GoldenError::Mismatch { diff, .. } => assert!(diff.contains("+  \"type\": \"string\"")),
            other => panic!("unexpected error: {}", other),
        }

        let outcome = GoldenFile::new(&path)
            .with_config(config(true))
            .verify(&json!({"type": "string"}))
            .unwrap();
        assert_eq!(outcome, GoldenOutcome::Updated);
    }

    #[test]
    fn test_golden_dir_lists_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = GoldenDir::new(temp_dir.path()).with_config(config(true));

        dir.file("zeta").verify(&json!(1)).unwrap();
        dir.file("alpha.json").verify(&json!(2)).unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        assert_eq!(dir.list().unwrap(), vec!["alpha", "zeta"]);
    }
}
