//! API-description composition
//!
//! An AsyncAPI or OpenAPI template names the schemas it needs through
//! placeholder refs such as `{"$ref": "./schema.json"}`. [`ApiDocumentBuilder`]
//! maps each placeholder to a type, generates that type's schema, embeds it
//! and moves everything from `definitions` to `components/schemas`, where
//! API-description tooling expects it.
//!
//! # Example Usage
//!
//! ```rust
//! use refweave_core::compose::ApiDocumentBuilder;
//! use refweave_core::generator::{GeneratedSchema, InMemoryGenerator};
//! use serde_json::json;
//!
//! let generator = InMemoryGenerator::new()
//!     .with_schema("Car", GeneratedSchema::new(json!({"type": "object"})));
//!
//! let document = ApiDocumentBuilder::new(&generator)
//!     .with_base(json!({"payload": {"$ref": "./schema.json"}}))
//!     .with_schema("./schema.json", "Car")
//!     .build()?;
//!
//! assert_eq!(document["payload"]["$ref"], "#/components/schemas/Car");
//! # Ok::<(), refweave_core::Error>(())
//! ```
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use crate::canonical::sort_keys;
use crate::classifier::{RefKind, ReferenceClassifier, SuffixClassifier};
use crate::embedder::{resolve_identity, JsonSchemaEmbedder};
use crate::error::{Error, Result};
use crate::generator::{SchemaBuilder, SchemaGenerator, TypeDescriptor, DEFINITIONS_KEY};
use crate::naming::{TypeNaming, DEFAULT_MAX_NAME_SUFFIX};
use crate::reference::{resolve_pointer, JsonReference};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use url::Url;

/// Path of the node API descriptions keep their schemas under
pub const COMPONENTS_SCHEMAS: [&str; 2] = ["components", "schemas"];

/// Classifier for base templates
///
/// Anything that is not an absolute url names a placeholder, whatever its
/// shape. Absolute urls are classified by suffix, so links to websites stay
/// opaque.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderClassifier {
    urls: SuffixClassifier,
}

impl PlaceholderClassifier {
    pub fn new(urls: SuffixClassifier) -> Self {
        Self { urls }
    }
}

impl ReferenceClassifier for PlaceholderClassifier {
    fn classify(&self, url: &str) -> RefKind {
        match Url::parse(url) {
            Ok(_) => self.urls.classify(url),
            Err(_) => RefKind::Embeddable,
        }
    }
}

#[derive(Debug, Clone)]
struct Placeholder {
    written: String,
    ty: TypeDescriptor,
}

/// Composes an API description from a base template and generated schemas
pub struct ApiDocumentBuilder<'a> {
    generator: &'a dyn SchemaGenerator,
    base: Option<Value>,
    placeholders: BTreeMap<String, Placeholder>,
    classifier: PlaceholderClassifier,
    max_name_suffix: usize,
}

impl<'a> ApiDocumentBuilder<'a> {
    pub fn new(generator: &'a dyn SchemaGenerator) -> Self {
        Self {
            generator,
            base: None,
            placeholders: BTreeMap::new(),
            classifier: PlaceholderClassifier::default(),
            max_name_suffix: DEFAULT_MAX_NAME_SUFFIX,
        }
    }

    /// The template document holding placeholder refs
    pub fn with_base(mut self, base: Value) -> Self {
        self.base = Some(base);
        self
    }

    /// Fill `placeholder` with the schema of `ty`
    pub fn with_schema(mut self, placeholder: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        let written = placeholder.into();
        self.placeholders.insert(
            resolve_identity(None, &written),
            Placeholder {
                written,
                ty: ty.into(),
            },
        );
        self
    }

    pub fn with_classifier(mut self, classifier: PlaceholderClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_max_name_suffix(mut self, max_name_suffix: usize) -> Self {
        self.max_name_suffix = max_name_suffix;
        self
    }

    /// Compose the document
    ///
    /// Every placeholder in the base must have a type. Nothing is generated
    /// until that holds, so a failed call leaves no partial output.
    #[instrument(skip_all, fields(placeholders = self.placeholders.len()))]
    pub fn build(&self) -> Result<Value> {
        let base = self
            .base
            .as_ref()
            .ok_or_else(|| Error::invalid_document("no base document configured"))?;
        if !base.is_object() {
            return Err(Error::invalid_document("base document must be a JSON object"));
        }

        self.check_placeholders(base)?;

        let generator = self.generator;
        let placeholders = &self.placeholders;
        let loader = move |identity: &str| -> anyhow::Result<Value> {
            let placeholder = placeholders
                .get(identity)
                .ok_or_else(|| Error::unknown_schema(identity))?;
            debug!(placeholder = %placeholder.written, ty = %placeholder.ty, "Generating placeholder schema");
            let generated = SchemaBuilder::new(generator).generate(&placeholder.ty)?;
            Ok(generated.into_document()?)
        };

        let naming = placeholders
            .iter()
            .fold(TypeNaming::new(), |naming, (identity, placeholder)| {
                naming.with_type(identity.clone(), placeholder.ty.name())
            });

        let existing_components: Vec<String> = match resolve_pointer(base, &COMPONENTS_SCHEMAS) {
            Some(Value::Object(schemas)) => schemas.keys().cloned().collect(),
            _ => Vec::new(),
        };

        let embedded = JsonSchemaEmbedder::new(&loader)
            .with_classifier(self.classifier.clone())
            .with_naming(naming)
            .with_reserved_names(existing_components)
            .with_max_name_suffix(self.max_name_suffix)
            .embed(base)?;

        convert_namespace(embedded)
    }

    /// Fail on the first placeholder that has no type
    fn check_placeholders(&self, base: &Value) -> Result<()> {
        let mut refs = Vec::new();
        collect_refs(base, &mut refs);

        for raw in refs {
            let url = if raw.contains('#') {
                match JsonReference::parse(raw)?.url() {
                    Some(url) => url.to_string(),
                    None => continue,
                }
            } else {
                raw.to_string()
            };

            if self.classifier.classify(&url) == RefKind::Opaque {
                continue;
            }
            if !self.placeholders.contains_key(&resolve_identity(None, &url)) {
                return Err(Error::unknown_schema(url));
            }
        }
        Ok(())
    }
}

fn collect_refs<'v>(value: &'v Value, refs: &mut Vec<&'v str>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match (key.as_str(), val) {
                    ("$ref", Value::String(raw)) => refs.push(raw),
                    _ => collect_refs(val, refs),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, refs)),
        _ => {}
    }
}

/// Move `definitions` to `components/schemas` and rewrite refs to match
///
/// Every ref whose pointer lies below `/definitions/` now points below
/// `/components/schemas/`, including links to other documents that were
/// left opaque. Definitions merge with the components already
/// present; the same key holding different schemas is a
/// [`Error::NameCollision`]. The resulting `components/schemas` is sorted.
pub fn convert_namespace(document: Value) -> Result<Value> {
    let mut document = rewrite_namespace_refs(document);

    let Value::Object(root) = &mut document else {
        return Err(Error::invalid_document("document must be a JSON object"));
    };

    let definitions = match root.remove(DEFINITIONS_KEY) {
        Some(Value::Object(definitions)) => definitions,
        Some(other) => {
            root.insert(DEFINITIONS_KEY.to_string(), other);
            return Err(Error::invalid_document("'definitions' is not an object"));
        }
        None => Map::new(),
    };

    let components = root
        .entry(COMPONENTS_SCHEMAS[0])
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| Error::invalid_document("'components' is not an object"))?;
    let schemas = components
        .entry(COMPONENTS_SCHEMAS[1])
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| Error::invalid_document("'components/schemas' is not an object"))?;

    let mut merged = std::mem::take(schemas);
    for (name, schema) in definitions {
        match merged.get(&name) {
            Some(existing) if *existing != schema => {
                return Err(Error::name_collision(name, "components/schemas"));
            }
            _ => {
                merged.insert(name, schema);
            }
        }
    }
    *schemas = sort_keys(merged);

    Ok(document)
}

fn rewrite_namespace_refs(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| {
                    let val = match (key.as_str(), val) {
                        ("$ref", Value::String(raw)) => Value::String(to_components_ref(raw)),
                        (_, other) => rewrite_namespace_refs(other),
                    };
                    (key, val)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(rewrite_namespace_refs).collect()),
        other => other,
    }
}

fn to_components_ref(raw: String) -> String {
    let Ok(reference) = JsonReference::parse(&raw) else {
        return raw;
    };
    if reference.pointer().len() < 2 || !reference.pointer_starts_with(&[DEFINITIONS_KEY]) {
        return raw;
    }

    let pointer = COMPONENTS_SCHEMAS
        .iter()
        .map(|segment| segment.to_string())
        .chain(reference.pointer()[1..].iter().cloned())
        .collect();
    reference.with_pointer(pointer).to_string()
}
