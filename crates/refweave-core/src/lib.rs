//! Refweave Core - JSON Reference resolution and schema embedding
//!
//! This crate turns a document full of `$ref` pointers into one
//! self-contained document:
//! - **JsonReference**: parsing and formatting of `[url]#[/pointer]` refs
//! - **JsonSchemaEmbedder**: loads external documents, embeds them into one
//!   shared, deduplicated definitions map and rewrites every ref
//! - **SchemaBuilder**: plain schema generation through a pluggable generator
//! - **ApiDocumentBuilder**: AsyncAPI/OpenAPI composition, moving schemas
//!   from `definitions` to `components/schemas`
//!
//! ## Features
//!
//! - **Cycle Safe**: self- and mutually-referential documents terminate
//! - **Deterministic**: identical input gives byte-identical canonical output
//! - **Pluggable**: loaders, classifiers, naming and generators are traits
//! - **schemars** (default): schema generation for `JsonSchema` types
//!
//! ## Quick Start
//!
//! ```rust
//! use refweave_core::{JsonReference, JsonSchemaEmbedder, InMemoryLoader};
//! use serde_json::json;
//!
//! let reference = JsonReference::parse("schema.json#/parse/external")?;
//! assert_eq!(reference.url(), Some("schema.json"));
//!
//! let loader = InMemoryLoader::new().with_document("schema.json", json!({
//!     "parse": {"external": {"type": "string"}}
//! }));
//! let document = JsonSchemaEmbedder::new(&loader)
//!     .embed(&json!({"$ref": "schema.json#/parse/external"}))?;
//!
//! assert_eq!(document["$ref"], "#/definitions/schema/parse/external");
//! # Ok::<(), refweave_core::Error>(())
//! ```
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

pub mod canonical;
pub mod classifier;
pub mod compose;
pub mod embedder;
pub mod error;
pub mod generator;
pub mod loader;
pub mod naming;
pub mod reference;

// Re-export commonly used types for convenience
pub use classifier::{RefKind, ReferenceClassifier, SuffixClassifier};
pub use compose::{convert_namespace, ApiDocumentBuilder, PlaceholderClassifier};
pub use embedder::{DefinitionsMap, Embedded, EmbedderConfig, JsonSchemaEmbedder};
pub use error::{Error, Result};
pub use generator::{
    GeneratedSchema, InMemoryGenerator, SchemaBuilder, SchemaGenerator, TypeDescriptor,
};
pub use loader::{FileLoader, InMemoryLoader, SchemaLoader};
pub use naming::{DefinitionNamingStrategy, FileStemNaming, NameAllocator, TypeNaming};
pub use reference::JsonReference;

#[cfg(feature = "schemars")]
pub use generator::SchemarsGenerator;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
