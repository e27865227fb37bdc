//! Loading of external schema documents
//!
//! The embedder never touches the filesystem or the network itself; it
//! asks a [`SchemaLoader`] for the document behind an identity. This module
//! provides:
//! - the [`SchemaLoader`] trait, implemented for plain closures
//! - [`InMemoryLoader`] for documents that already live in memory
//! - [`FileLoader`] for YAML/JSON files below a base directory
//!
//! # Example Usage
//!
//! ```rust
//! use refweave_core::loader::{InMemoryLoader, SchemaLoader};
//! use serde_json::json;
//!
//! let loader = InMemoryLoader::new().with_document("car.json", json!({"type": "object"}));
//! assert_eq!(loader.load("car.json")?["type"], "object");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

pub mod file;
pub mod parser;

pub use file::FileLoader;
pub use parser::{Format, SchemaParser};

use anyhow::anyhow;
use serde_json::Value;
use std::collections::BTreeMap;

/// Synchronous source of external documents
///
/// Called at most once per distinct identity within one embedding call.
/// Implementations that go over the network own their timeout policy.
pub trait SchemaLoader: Send + Sync {
    fn load(&self, identity: &str) -> anyhow::Result<Value>;
}

impl<F> SchemaLoader for F
where
    F: Fn(&str) -> anyhow::Result<Value> + Send + Sync,
{
    fn load(&self, identity: &str) -> anyhow::Result<Value> {
        self(identity)
    }
}

/// Loader backed by a map of identity to document
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    documents: BTreeMap<String, Value>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, identity: impl Into<String>, document: Value) -> Self {
        self.documents.insert(identity.into(), document);
        self
    }

    pub fn insert(&mut self, identity: impl Into<String>, document: Value) {
        self.documents.insert(identity.into(), document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl SchemaLoader for InMemoryLoader {
    fn load(&self, identity: &str) -> anyhow::Result<Value> {
        self.documents
            .get(identity)
            .cloned()
            .ok_or_else(|| anyhow!("no document registered for '{}'", identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_memory_loader() {
        let mut loader = InMemoryLoader::new().with_document("a.json", json!({"type": "string"}));
        loader.insert("b.json", json!({"type": "integer"}));

        assert_eq!(loader.len(), 2);
        assert_eq!(loader.load("b.json").unwrap()["type"], "integer");
        assert!(loader.load("c.json").is_err());
    }

    #[test]
    fn test_closure_loader() {
        let loader = |identity: &str| -> anyhow::Result<Value> { Ok(json!({ "title": identity })) };
        assert_eq!(loader.load("car.json").unwrap()["title"], "car.json");
    }
}
