//! Golden file infrastructure for Refweave
//!
//! Composed and embedded documents are pinned in golden files. A test
//! renders its output canonically (sorted keys, pretty printed, trailing
//! newline) and compares it byte for byte with the file on disk; any drift
//! fails with a readable line diff. Setting `UPDATE_GOLDEN=1` rewrites the
//! files instead.
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

pub mod diff;
pub mod golden;

use std::path::PathBuf;
use thiserror::Error;

pub use diff::{DiffEngine, DiffOptions, DiffResult, DiffSummary};
pub use golden::{GoldenDir, GoldenFile, GoldenOutcome};

/// Golden file error types
#[derive(Debug, Error)]
pub enum GoldenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Golden file {path:?} is out of date:\n{diff}")]
    Mismatch { path: PathBuf, diff: String },

    #[error("Golden file {0:?} does not exist (run with UPDATE_GOLDEN=1 to create it)")]
    Missing(PathBuf),
}

pub type Result<T> = std::result::Result<T, GoldenError>;

/// Configuration for golden comparisons
#[derive(Debug, Clone)]
pub struct GoldenConfig {
    /// Whether to rewrite golden files instead of comparing
    pub update: bool,

    /// Diff options
    pub diff_options: DiffOptions,
}

impl Default for GoldenConfig {
    fn default() -> Self {
        Self {
            update: false,
            diff_options: DiffOptions::default(),
        }
    }
}

impl GoldenConfig {
    /// Create config from environment and defaults
    ///
    /// `UPDATE_GOLDEN` switches to update mode, `GOLDEN_NO_COLOR` disables
    /// colored diffs.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(update) = std::env::var("UPDATE_GOLDEN") {
            config.update = is_truthy(&update);
        }

        if let Ok(no_color) = std::env::var("GOLDEN_NO_COLOR") {
            config.diff_options.colored = !is_truthy(&no_color);
        }

        config
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Assert that a value matches a golden file, relative to the crate root
#[macro_export]
macro_rules! assert_golden {
    ($path:expr, $value:expr) => {{
        let path = ::std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join($path);
        let golden = $crate::GoldenFile::new(path).with_config($crate::GoldenConfig::from_env());
        if let Err(err) = golden.verify(&$value) {
            panic!("{}", err);
        }
    }};
}
