//! JSON Schema embedding
//!
//! [`JsonSchemaEmbedder`] walks a document, loads every external schema it
//! references, stores those documents in one shared definitions map and
//! rewrites each `$ref` to point into that map:
//!
//! - `car.json` becomes `#/definitions/car`
//! - `car.json#/definitions/Engine` becomes `#/definitions/Engine` (the
//!   document's own definitions are hoisted into the shared map)
//! - `#/properties/id` inside `car.json` becomes `#/definitions/car/properties/id`
//! - opaque links such as `https://sda.se` are left alone
//!
//! Names are reserved before a document is traversed, so documents that
//! reference each other, or themselves, resolve to stable names instead of
//! recursing forever.
//!
//! # Example Usage
//!
//! ```rust
//! use refweave_core::embedder::JsonSchemaEmbedder;
//! use refweave_core::loader::InMemoryLoader;
//! use serde_json::json;
//!
//! let loader = InMemoryLoader::new().with_document("car.json", json!({"type": "object"}));
//! let embedded = JsonSchemaEmbedder::new(&loader).embed(&json!({"$ref": "./car.json"}))?;
//!
//! assert_eq!(embedded["$ref"], "#/definitions/car");
//! assert_eq!(embedded["definitions"]["car"]["type"], "object");
//! # Ok::<(), refweave_core::Error>(())
//! ```
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

pub mod context;
pub mod identity;

pub use context::{DefinitionsMap, EmbeddedResource, EmbeddingContext};

use context::RefTarget;
pub use identity::resolve_identity;

use crate::canonical::sort_keys;
use crate::classifier::{RefKind, ReferenceClassifier, SuffixClassifier, DEFAULT_SUFFIXES};
use crate::error::{Error, Result};
use crate::loader::SchemaLoader;
use crate::naming::{DefinitionNamingStrategy, FileStemNaming, DEFAULT_MAX_NAME_SUFFIX};
use crate::reference::{format_pointer, parse_pointer, resolve_pointer, JsonReference};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, instrument, trace};

/// Default location of the shared definitions
pub const DEFAULT_MOUNT_PATH: &str = "/definitions";

/// Configuration for embedder behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// JSON pointer of the definitions node, e.g. `/definitions`
    pub mount_path: String,
    /// File suffixes classified as embeddable schema resources
    pub suffixes: Vec<String>,
    /// Largest numeric suffix tried when disambiguating names
    pub max_name_suffix: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            mount_path: DEFAULT_MOUNT_PATH.to_string(),
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            max_name_suffix: DEFAULT_MAX_NAME_SUFFIX,
        }
    }
}

/// Result of an embedding call
#[derive(Debug, Clone)]
pub struct Embedded {
    /// The rewritten document, definitions mounted
    pub document: Value,
    /// Definitions added by this call
    pub definitions: DefinitionsMap,
    /// External identity to the definition name it was embedded under
    pub assigned_names: BTreeMap<String, String>,
}

/// Resolves external `$ref`s into one shared definitions map
pub struct JsonSchemaEmbedder<'a> {
    loader: &'a dyn SchemaLoader,
    mount: Vec<String>,
    classifier: Box<dyn ReferenceClassifier + 'a>,
    naming: Box<dyn DefinitionNamingStrategy + 'a>,
    reserved_names: Vec<String>,
    max_name_suffix: usize,
}

impl<'a> JsonSchemaEmbedder<'a> {
    /// Embedder mounting at `/definitions` with suffix classification and file-stem naming
    pub fn new(loader: &'a dyn SchemaLoader) -> Self {
        Self {
            loader,
            mount: vec!["definitions".to_string()],
            classifier: Box::new(SuffixClassifier::default()),
            naming: Box::new(FileStemNaming),
            reserved_names: Vec::new(),
            max_name_suffix: DEFAULT_MAX_NAME_SUFFIX,
        }
    }

    /// Embedder built from configuration
    pub fn from_config(loader: &'a dyn SchemaLoader, config: &EmbedderConfig) -> Result<Self> {
        Ok(Self::new(loader)
            .with_mount_path(&config.mount_path)?
            .with_classifier(SuffixClassifier::new(config.suffixes.iter().cloned()))
            .with_max_name_suffix(config.max_name_suffix))
    }

    /// Mount the definitions at a different JSON pointer
    pub fn with_mount_path(mut self, mount_path: &str) -> Result<Self> {
        let mount = parse_pointer(mount_path).map_err(|reason| {
            Error::invalid_document(format!("invalid mount path '{}': {}", mount_path, reason))
        })?;
        if mount.is_empty() {
            return Err(Error::invalid_document(
                "mount path must name a node below the document root",
            ));
        }
        self.mount = mount;
        Ok(self)
    }

    pub fn with_classifier(mut self, classifier: impl ReferenceClassifier + 'a) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_naming(mut self, naming: impl DefinitionNamingStrategy + 'a) -> Self {
        self.naming = Box::new(naming);
        self
    }

    /// Names that must never be assigned, e.g. existing component keys
    pub fn with_reserved_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_max_name_suffix(mut self, max_name_suffix: usize) -> Self {
        self.max_name_suffix = max_name_suffix;
        self
    }

    /// The mount path as a JSON pointer
    pub fn mount_path(&self) -> String {
        format_pointer(&self.mount)
    }

    /// Embed all external references of `root`, returning the new document
    pub fn embed(&self, root: &Value) -> Result<Value> {
        self.embed_into_parts(root).map(|embedded| embedded.document)
    }

    /// Embed all external references of `root`
    ///
    /// `root` is left untouched. A document without external references
    /// comes back unchanged apart from a (possibly empty) definitions node.
    #[instrument(skip_all, fields(mount = %self.mount_path()))]
    pub fn embed_into_parts(&self, root: &Value) -> Result<Embedded> {
        if !root.is_object() {
            return Err(Error::invalid_document(
                "root must be a JSON object to host definitions",
            ));
        }

        let mut context = EmbeddingContext::new(self.max_name_suffix);
        for name in &self.reserved_names {
            context.reserve_name(name.clone());
        }
        match resolve_pointer(root, &self.mount) {
            Some(Value::Object(existing)) => {
                for name in existing.keys() {
                    context.reserve_name(name.clone());
                }
            }
            Some(_) => {
                return Err(Error::invalid_document(format!(
                    "'{}' exists but is not an object",
                    self.mount_path()
                )))
            }
            None => {}
        }

        let mut document = self.rewrite(root.clone(), None, &mut context)?;

        while let Some(pending) = context.next_pending() {
            let raw = context
                .definitions()
                .get(&pending.name)
                .cloned()
                .unwrap_or(Value::Null);
            let rewritten = self.rewrite(raw, Some(&pending.identity), &mut context)?;
            context.complete(&pending.name, rewritten);
        }

        let assigned_names = context.assigned_names();
        let definitions = context.into_definitions();
        debug!(
            definitions = definitions.len(),
            documents = assigned_names.len(),
            "Embedding complete"
        );

        mount_definitions(&mut document, &self.mount, definitions.clone())?;

        Ok(Embedded {
            document,
            definitions,
            assigned_names,
        })
    }

    /// Rewrite every `$ref` in a tree that belongs to `scope`
    fn rewrite(
        &self,
        value: Value,
        scope: Option<&str>,
        context: &mut EmbeddingContext,
    ) -> Result<Value> {
        match value {
            Value::Object(map) => {
                let mut rewritten = Map::new();
                for (key, val) in map {
                    let val = match (key.as_str(), val) {
                        ("$ref", Value::String(raw)) => {
                            Value::String(self.rewrite_reference(&raw, scope, context)?)
                        }
                        (_, other) => self.rewrite(other, scope, context)?,
                    };
                    rewritten.insert(key, val);
                }
                Ok(Value::Object(rewritten))
            }
            Value::Array(items) => items
                .into_iter()
                .map(|item| self.rewrite(item, scope, context))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other),
        }
    }

    fn rewrite_reference(
        &self,
        raw: &str,
        scope: Option<&str>,
        context: &mut EmbeddingContext,
    ) -> Result<String> {
        let reference = if raw.contains('#') {
            JsonReference::parse(raw)?
        } else if self.classifier.classify(raw) == RefKind::Opaque {
            return Ok(raw.to_string());
        } else {
            JsonReference::new(Some(raw.to_string()), Vec::new())
        };

        let Some(url) = reference.url() else {
            return match scope {
                None => Ok(raw.to_string()),
                Some(identity) => Ok(self
                    .target_reference(identity, reference.pointer(), context)?
                    .to_string()),
            };
        };

        if self.classifier.classify(url) == RefKind::Opaque {
            trace!(reference = raw, "Leaving opaque reference");
            return Ok(raw.to_string());
        }

        let identity = resolve_identity(scope, url);
        self.ensure_embedded(&identity, context)?;
        Ok(self
            .target_reference(&identity, reference.pointer(), context)?
            .to_string())
    }

    /// Load and register `identity` unless it already has a name
    fn ensure_embedded(&self, identity: &str, context: &mut EmbeddingContext) -> Result<()> {
        if context.resource(identity).is_some() {
            return Ok(());
        }

        let base_name = self.naming.base_name(identity);
        let name = context.reserve_resource(identity, &base_name)?;

        debug!(identity, name = %name, "Embedding external document");
        let mut document = self.load(identity)?;
        let local_definitions = self.take_local_definitions(&mut document);

        context.store_document(identity, &name, document);
        context.hoist(identity, local_definitions, |owner, raw| {
            self.ref_target(owner, raw)
        })
    }

    /// Where a `$ref` found in a local definition of `identity` points
    ///
    /// Malformed refs count as pointing into the document; rewriting reports
    /// them later.
    fn ref_target(&self, identity: &str, raw: &str) -> RefTarget {
        let reference = if raw.contains('#') {
            match JsonReference::parse(raw) {
                Ok(reference) => reference,
                Err(_) => return RefTarget::Document,
            }
        } else if self.classifier.classify(raw) == RefKind::Opaque {
            return RefTarget::Fixed(raw.to_string());
        } else {
            JsonReference::new(Some(raw.to_string()), Vec::new())
        };

        if reference.is_internal() {
            let pointer = reference.pointer();
            let mount_len = self.mount.len();
            return if pointer.len() > mount_len && pointer.starts_with(&self.mount) {
                RefTarget::Definition(pointer[mount_len].clone())
            } else {
                RefTarget::Document
            };
        }

        match reference.url() {
            Some(url) if self.classifier.classify(url) == RefKind::Embeddable => {
                RefTarget::Fixed(format!(
                    "{}#{}",
                    resolve_identity(Some(identity), url),
                    format_pointer(reference.pointer())
                ))
            }
            _ => RefTarget::Fixed(raw.to_string()),
        }
    }

    fn load(&self, identity: &str) -> Result<Value> {
        let document = self
            .loader
            .load(identity)
            .map_err(|source| match source.downcast::<Error>() {
                Ok(err @ Error::UnknownSchema { .. }) => err,
                Ok(err) => Error::unresolvable(identity, err),
                Err(source) => Error::unresolvable(identity, source),
            })?;

        if document.is_null() {
            return Err(Error::unresolvable(
                identity,
                anyhow!("loader returned an empty document"),
            ));
        }
        Ok(document)
    }

    /// Remove and return the definitions a loaded document carries itself
    fn take_local_definitions(&self, document: &mut Value) -> Map<String, Value> {
        let Some((last, parents)) = self.mount.split_last() else {
            return Map::new();
        };

        let mut current = document;
        for segment in parents {
            match current.get_mut(segment.as_str()) {
                Some(next) => current = next,
                None => return Map::new(),
            }
        }

        let Some(parent) = current.as_object_mut() else {
            return Map::new();
        };
        if !parent.get(last).is_some_and(Value::is_object) {
            return Map::new();
        }
        match parent.remove(last) {
            Some(Value::Object(local)) => local,
            _ => Map::new(),
        }
    }

    /// Where a pointer into the document `identity` lives after embedding
    fn target_reference(
        &self,
        identity: &str,
        pointer: &[String],
        context: &EmbeddingContext,
    ) -> Result<JsonReference> {
        let resource = context.resource(identity).ok_or_else(|| {
            Error::invalid_document(format!("no definition reserved for '{}'", identity))
        })?;

        let mount_len = self.mount.len();
        let mut target = self.mount.clone();

        if pointer.len() > mount_len && pointer.starts_with(&self.mount) {
            if let Some(shared) = resource.local_names.get(&pointer[mount_len]) {
                target.push(shared.clone());
                target.extend(pointer[mount_len + 1..].iter().cloned());
                return Ok(JsonReference::internal(target));
            }
        }

        target.push(resource.name.clone());
        target.extend(pointer.iter().cloned());
        Ok(JsonReference::internal(target))
    }
}

/// Merge definitions into the node at `mount`, creating objects on the way
fn mount_definitions(
    document: &mut Value,
    mount: &[String],
    definitions: DefinitionsMap,
) -> Result<()> {
    let mut current = document;
    for segment in mount {
        let map = current.as_object_mut().ok_or_else(|| {
            Error::invalid_document(format!(
                "cannot mount definitions at '{}': parent is not an object",
                format_pointer(mount)
            ))
        })?;
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let node = current.as_object_mut().ok_or_else(|| {
        Error::invalid_document(format!("'{}' is not an object", format_pointer(mount)))
    })?;

    let mut merged = std::mem::take(node);
    merged.extend(definitions);
    *node = sort_keys(merged);
    Ok(())
}
