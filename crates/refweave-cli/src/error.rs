//! Error types and handling for the CLI
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use colored::Colorize;
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from refweave-core
    #[error("{0}")]
    Core(#[from] refweave_core::Error),

    /// Golden file comparison failed
    #[error("{0}")]
    Golden(#[from] refweave_golden::GoldenError),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    ///
    /// Core errors get one code per kind so scripts can tell an unknown
    /// placeholder from a missing schema file.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(core) => match core.kind() {
                "invalid_reference" => 2,
                "unresolvable_reference" => 3,
                "unknown_schema" => 4,
                "name_collision" => 5,
                "invalid_document" => 6,
                "unknown_type" => 7,
                _ => 8,
            },
            Self::FileNotFound { .. } => 9,
            Self::Config(_) => 10,
            Self::InvalidArgs(_) => 11,
            Self::Golden(_) => 12,
            Self::Json(_) => 13,
            Self::Yaml(_) => 14,
            Self::Toml(_) => 15,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }

    /// Label shown in front of the message
    fn label(&self) -> String {
        match self {
            Self::Core(core) => format!("Error [{}]:", core.kind()),
            Self::Golden(_) => "Golden mismatch:".to_string(),
            _ => "Error:".to_string(),
        }
    }
}

/// Format an error for display to the user, followed by its causes
pub fn format_error(error: &Error, use_color: bool) -> String {
    let label = error.label();
    let mut output = if use_color {
        format!("{} {}", label.red().bold(), error)
    } else {
        format!("{} {}", label, error)
    };

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        // thiserror messages often embed their source already
        if !output.contains(&text) {
            let line = format!("\n  caused by: {}", text);
            if use_color {
                output.push_str(&line.dimmed().to_string());
            } else {
                output.push_str(&line);
            }
        }
        source = cause.source();
    }

    output
}
