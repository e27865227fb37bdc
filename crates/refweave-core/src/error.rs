//! Error types for reference resolution and schema embedding
//!
//! Every variant is terminal for the call that produced it. Nothing in the
//! engine retries or substitutes a fallback schema.
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use std::path::PathBuf;
use thiserror::Error;

/// Result type for refweave operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing references, loading documents or embedding
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed `$ref` string
    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// The loader could not produce a document for an external identity
    #[error("Unable to resolve reference to '{url}': {source}")]
    UnresolvableReference {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// A base document names a placeholder with no configured type
    #[error("Unknown schema placeholder '{placeholder}': no type is configured for it")]
    UnknownSchema { placeholder: String },

    /// The naming strategy could not produce a unique definition name
    #[error("Cannot assign a unique definition name '{name}' for '{identity}'")]
    NameCollision { name: String, identity: String },

    /// The document cannot host a definitions node
    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },

    /// A schema generator was asked for a type it does not know
    #[error("Unknown type '{name}'")]
    UnknownType { name: String },

    /// File I/O errors
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parsing errors
    #[error("Failed to parse JSON file '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// YAML parsing errors
    #[error("Failed to parse YAML file '{path}': {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// Unsupported file format
    #[error("Unsupported file format for '{path}'. Expected .yaml, .yml, or .json")]
    UnsupportedFormat { path: PathBuf },

    /// A reference tried to leave the loader's base directory
    #[error("Path traversal detected in reference '{reference}' from '{base_dir}'")]
    PathTraversal { reference: String, base_dir: PathBuf },
}

impl Error {
    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create an unresolvable reference error wrapping the loader failure
    pub fn unresolvable(url: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::UnresolvableReference {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Create an unknown schema placeholder error
    pub fn unknown_schema(placeholder: impl Into<String>) -> Self {
        Self::UnknownSchema {
            placeholder: placeholder.into(),
        }
    }

    /// Create a name collision error
    pub fn name_collision(name: impl Into<String>, identity: impl Into<String>) -> Self {
        Self::NameCollision {
            name: name.into(),
            identity: identity.into(),
        }
    }

    /// Create an invalid document error
    pub fn invalid_document(reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            reason: reason.into(),
        }
    }

    /// Create an unknown type error
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Create an I/O error with path context
    pub fn io_error(path: PathBuf, source: std::io::Error) -> Self {
        Self::Io { path, source }
    }

    /// Create a JSON parsing error with path context
    pub fn json_parse_error(path: PathBuf, source: serde_json::Error) -> Self {
        Self::Json { path, source }
    }

    /// Create a YAML parsing error with path context
    pub fn yaml_parse_error(path: PathBuf, source: serde_yaml::Error) -> Self {
        Self::Yaml { path, source }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(path: PathBuf) -> Self {
        Self::UnsupportedFormat { path }
    }

    /// Create a path traversal error
    pub fn path_traversal(reference: impl Into<String>, base_dir: PathBuf) -> Self {
        Self::PathTraversal {
            reference: reference.into(),
            base_dir,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Json { path, .. } => Some(path),
            Self::Yaml { path, .. } => Some(path),
            Self::UnsupportedFormat { path } => Some(path),
            Self::PathTraversal { base_dir, .. } => Some(base_dir),
            _ => None,
        }
    }

    /// Short machine-readable kind, used in logs and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidReference { .. } => "invalid_reference",
            Self::UnresolvableReference { .. } => "unresolvable_reference",
            Self::UnknownSchema { .. } => "unknown_schema",
            Self::NameCollision { .. } => "name_collision",
            Self::InvalidDocument { .. } => "invalid_document",
            Self::UnknownType { .. } => "unknown_type",
            Self::Io { .. } => "io",
            Self::Json { .. } => "json",
            Self::Yaml { .. } => "yaml",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::PathTraversal { .. } => "path_traversal",
        }
    }
}
