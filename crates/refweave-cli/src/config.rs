//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - Environment variables
//! - Command-line arguments
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use clap::ValueEnum;
use refweave_core::EmbedderConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the definitions mount path
pub const MOUNT_PATH_ENV: &str = "REFWEAVE_MOUNT_PATH";

/// Environment variable overriding the output format
pub const OUTPUT_FORMAT_ENV: &str = "REFWEAVE_OUTPUT_FORMAT";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Embedding settings
    pub embedder: EmbedderConfig,

    /// Composition settings
    pub compose: ComposeConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingSection,

    /// File the configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Composition configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Placeholder reference -> generated schema file
    ///
    /// Relative files resolve against the directory of the configuration file.
    pub schemas: BTreeMap<String, PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: Option<OutputFormat>,

    /// Use colored output by default
    pub color: bool,
}

/// Logging configuration from the file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level used when no `-v` flag is given
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

impl Config {
    /// Load configuration from a file, by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let mut config: Config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };

        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations,
    /// then apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) if !path.exists() => {
                return Err(Error::config(format!(
                    "configuration file {} does not exist",
                    path.display()
                )))
            }
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("refweave.yaml"),
            PathBuf::from("refweave.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let refweave_dir = config_dir.join("refweave");
            paths.push(refweave_dir.join("config.yaml"));
            paths.push(refweave_dir.join("config.json"));
            paths.push(refweave_dir.join("config.toml"));
        }

        paths
    }

    /// Apply `REFWEAVE_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mount_path) = lookup(MOUNT_PATH_ENV) {
            self.embedder.mount_path = mount_path;
        }

        if let Some(format) = lookup(OUTPUT_FORMAT_ENV) {
            let format = OutputFormat::from_str(&format, true).map_err(|_| {
                Error::config(format!("invalid {} value '{}'", OUTPUT_FORMAT_ENV, format))
            })?;
            self.output.format = Some(format);
        }

        Ok(())
    }

    /// Resolve a path named in the configuration file
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match self.source.as_deref().and_then(Path::parent) {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Configured placeholder mappings with their files resolved
    pub fn schema_mappings(&self) -> BTreeMap<String, PathBuf> {
        self.compose
            .schemas
            .iter()
            .map(|(placeholder, file)| (placeholder.clone(), self.resolve_path(file)))
            .collect()
    }
}
