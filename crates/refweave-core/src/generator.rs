//! Plain schema generation
//!
//! Turning a type into a JSON Schema is delegated to a [`SchemaGenerator`].
//! A generator produces the type's root schema plus the definitions of the
//! types it refers to; [`SchemaBuilder`] orchestrates it, optionally embedding
//! any external documents the generated schema still references.
//!
//! Two generators ship with the crate:
//! - [`SchemarsGenerator`] (feature `schemars`) for Rust types deriving
//!   `schemars::JsonSchema`
//! - [`InMemoryGenerator`] for schemas that already exist as values or files
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use crate::embedder::JsonSchemaEmbedder;
use crate::error::{Error, Result};
use crate::loader::{SchemaLoader, SchemaParser};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, instrument};

/// Key holding a generated schema's definitions
pub const DEFINITIONS_KEY: &str = "definitions";

/// The simple name of a type known to a [`SchemaGenerator`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDescriptor {
    name: String,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Descriptor of a Rust type, named the way `schemars` names it
    #[cfg(feature = "schemars")]
    pub fn of<T: schemars::JsonSchema + ?Sized>() -> Self {
        Self::new(T::schema_name())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for TypeDescriptor {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeDescriptor {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A root schema and the definitions it refers to
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSchema {
    pub root: Value,
    pub definitions: BTreeMap<String, Value>,
}

impl GeneratedSchema {
    pub fn new(root: Value) -> Self {
        Self {
            root,
            definitions: BTreeMap::new(),
        }
    }

    pub fn with_definition(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.definitions.insert(name.into(), schema);
        self
    }

    /// Split a single JSON Schema document into root and `definitions`
    pub fn from_document(document: Value) -> Result<Self> {
        let Value::Object(mut root) = document else {
            return Err(Error::invalid_document("generated schema must be a JSON object"));
        };

        let definitions = match root.remove(DEFINITIONS_KEY) {
            Some(Value::Object(definitions)) => definitions.into_iter().collect(),
            Some(other) => {
                root.insert(DEFINITIONS_KEY.to_string(), other);
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        };

        Ok(Self {
            root: Value::Object(root),
            definitions,
        })
    }

    /// Merge into one JSON Schema document, definitions under `definitions`
    pub fn into_document(self) -> Result<Value> {
        if self.definitions.is_empty() {
            return Ok(self.root);
        }

        let Value::Object(mut root) = self.root else {
            return Err(Error::invalid_document(
                "a root schema with definitions must be a JSON object",
            ));
        };

        let definitions: Map<String, Value> = self.definitions.into_iter().collect();
        root.insert(DEFINITIONS_KEY.to_string(), Value::Object(definitions));
        Ok(Value::Object(root))
    }
}

/// Produces the schema of a type
pub trait SchemaGenerator: Send + Sync {
    fn generate(&self, ty: &TypeDescriptor) -> Result<GeneratedSchema>;
}

impl<F> SchemaGenerator for F
where
    F: Fn(&TypeDescriptor) -> Result<GeneratedSchema> + Send + Sync,
{
    fn generate(&self, ty: &TypeDescriptor) -> Result<GeneratedSchema> {
        self(ty)
    }
}

/// Plain schema generation through a [`SchemaGenerator`]
pub struct SchemaBuilder<'a> {
    generator: &'a dyn SchemaGenerator,
    loader: Option<&'a dyn SchemaLoader>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(generator: &'a dyn SchemaGenerator) -> Self {
        Self {
            generator,
            loader: None,
        }
    }

    /// Embed external documents the generated schema references
    pub fn with_loader(mut self, loader: &'a dyn SchemaLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Generate the schema of `ty`
    ///
    /// Definitions come back in key order. With a loader configured, external
    /// refs are embedded and their documents land among the definitions.
    #[instrument(skip_all, fields(ty = %ty))]
    pub fn generate(&self, ty: &TypeDescriptor) -> Result<GeneratedSchema> {
        let generated = self.generator.generate(ty)?;
        debug!(definitions = generated.definitions.len(), "Generated schema");

        let Some(loader) = self.loader else {
            return Ok(generated);
        };

        let document = generated.into_document()?;
        if !document.is_object() {
            return Ok(GeneratedSchema::new(document));
        }
        let embedded = JsonSchemaEmbedder::new(loader).embed(&document)?;
        GeneratedSchema::from_document(embedded)
    }

    /// Generate the schema of `ty` as one JSON Schema document
    pub fn generate_document(&self, ty: &TypeDescriptor) -> Result<Value> {
        self.generate(ty)?.into_document()
    }
}

/// Generator serving schemas registered up front
#[derive(Debug, Clone, Default)]
pub struct InMemoryGenerator {
    schemas: BTreeMap<String, GeneratedSchema>,
}

impl InMemoryGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, name: impl Into<String>, schema: GeneratedSchema) -> Self {
        self.insert(name, schema);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, schema: GeneratedSchema) {
        self.schemas.insert(name.into(), schema);
    }

    /// Register a JSON Schema file, named by its `title` or else its file stem
    pub fn load_file(&mut self, path: &Path) -> Result<TypeDescriptor> {
        let document = SchemaParser::new().parse_file(path)?;
        let name = match document.get("title").and_then(Value::as_str) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .ok_or_else(|| Error::unsupported_format(path.to_path_buf()))?,
        };

        debug!(path = %path.display(), name = %name, "Registered schema file");
        self.insert(name.clone(), GeneratedSchema::from_document(document)?);
        Ok(TypeDescriptor::new(name))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaGenerator for InMemoryGenerator {
    fn generate(&self, ty: &TypeDescriptor) -> Result<GeneratedSchema> {
        self.schemas
            .get(ty.name())
            .cloned()
            .ok_or_else(|| Error::unknown_type(ty.name()))
    }
}

#[cfg(feature = "schemars")]
pub use schemars_support::SchemarsGenerator;

#[cfg(feature = "schemars")]
mod schemars_support {
    use super::{GeneratedSchema, SchemaGenerator, TypeDescriptor};
    use crate::error::{Error, Result};
    use schemars::generate::SchemaSettings;
    use schemars::JsonSchema;
    use std::collections::BTreeMap;

    type SchemaFn = Box<dyn Fn() -> Result<GeneratedSchema> + Send + Sync>;

    /// Generator for Rust types deriving `schemars::JsonSchema`
    ///
    /// Schemas use draft-07 settings so member types land under
    /// `definitions`. The `$schema` keyword is dropped from the root since
    /// the result is embedded into other documents.
    #[derive(Default)]
    pub struct SchemarsGenerator {
        types: BTreeMap<String, SchemaFn>,
    }

    impl SchemarsGenerator {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register `T`, returning the descriptor it is known by
        pub fn register<T: JsonSchema + 'static>(&mut self) -> TypeDescriptor {
            let descriptor = TypeDescriptor::of::<T>();
            self.types
                .insert(descriptor.name().to_string(), Box::new(schema_of::<T>));
            descriptor
        }

        pub fn with_type<T: JsonSchema + 'static>(mut self) -> Self {
            self.register::<T>();
            self
        }
    }

    impl std::fmt::Debug for SchemarsGenerator {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SchemarsGenerator")
                .field("types", &self.types.keys().collect::<Vec<_>>())
                .finish()
        }
    }

    impl SchemaGenerator for SchemarsGenerator {
        fn generate(&self, ty: &TypeDescriptor) -> Result<GeneratedSchema> {
            let generate = self
                .types
                .get(ty.name())
                .ok_or_else(|| Error::unknown_type(ty.name()))?;
            generate()
        }
    }

    fn schema_of<T: JsonSchema>() -> Result<GeneratedSchema> {
        let schema = SchemaSettings::draft07()
            .into_generator()
            .into_root_schema_for::<T>();
        let mut document = serde_json::to_value(&schema).map_err(|e| {
            Error::invalid_document(format!(
                "schema of '{}' is not serializable: {}",
                T::schema_name(),
                e
            ))
        })?;

        if let Some(root) = document.as_object_mut() {
            root.remove("$schema");
        }
        GeneratedSchema::from_document(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::InMemoryLoader;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn car_schema() -> GeneratedSchema {
        GeneratedSchema::new(json!({
            "title": "Car",
            "type": "object",
            "properties": {"engine": {"$ref": "#/definitions/Engine"}}
        }))
        .with_definition("Wheel", json!({"type": "object"}))
        .with_definition("Engine", json!({"type": "object"}))
    }

    #[test]
    fn test_document_round_trip() {
        let document = car_schema().into_document().unwrap();
        assert_eq!(document["definitions"]["Engine"]["type"], "object");

        let split = GeneratedSchema::from_document(document).unwrap();
        assert_eq!(split, car_schema());
        assert!(split.root.get("definitions").is_none());
    }

    #[test]
    fn test_document_without_definitions() {
        let schema = GeneratedSchema::new(json!({"type": "string"}));
        assert_eq!(schema.into_document().unwrap(), json!({"type": "string"}));
        assert!(GeneratedSchema::from_document(json!(true)).is_err());
    }

    #[test]
    fn test_builder_sorts_definitions() {
        let generator = InMemoryGenerator::new().with_schema("Car", car_schema());
        let generated = SchemaBuilder::new(&generator)
            .generate(&TypeDescriptor::new("Car"))
            .unwrap();

        let names: Vec<_> = generated.definitions.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Engine", "Wheel"]);
    }

    #[test]
    fn test_unknown_type() {
        let generator = InMemoryGenerator::new();
        let err = SchemaBuilder::new(&generator)
            .generate(&"Boat".into())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownType { ref name } if name == "Boat"));
    }

    #[test]
    fn test_builder_embeds_external_refs() {
        let generator = InMemoryGenerator::new().with_schema(
            "Invoice",
            GeneratedSchema::new(json!({"properties": {"total": {"$ref": "money.json"}}})),
        );
        let loader = InMemoryLoader::new().with_document("money.json", json!({"type": "number"}));

        let generated = SchemaBuilder::new(&generator)
            .with_loader(&loader)
            .generate(&"Invoice".into())
            .unwrap();

        assert_eq!(
            generated.root["properties"]["total"]["$ref"],
            "#/definitions/money"
        );
        assert_eq!(generated.definitions["money"]["type"], "number");
    }

    #[test]
    fn test_closure_generator() {
        let generator = |ty: &TypeDescriptor| -> Result<GeneratedSchema> {
            Ok(GeneratedSchema::new(json!({ "title": ty.name() })))
        };
        let document = SchemaBuilder::new(&generator)
            .generate_document(&"Car".into())
            .unwrap();
        assert_eq!(document, json!({"title": "Car"}));
    }

    #[test]
    fn test_load_file_names_by_title_or_stem() {
        let dir = tempdir().unwrap();
        let titled = dir.path().join("car.json");
        let untitled = dir.path().join("engine.yaml");
        fs::write(&titled, r#"{"title": "Car", "definitions": {"Wheel": {}}}"#).unwrap();
        fs::write(&untitled, "type: object\n").unwrap();

        let mut generator = InMemoryGenerator::new();
        assert_eq!(generator.load_file(&titled).unwrap().name(), "Car");
        assert_eq!(generator.load_file(&untitled).unwrap().name(), "engine");

        let car = generator.generate(&"Car".into()).unwrap();
        assert!(car.definitions.contains_key("Wheel"));
    }

    #[cfg(feature = "schemars")]
    mod schemars_generation {
        use super::*;
        use schemars::JsonSchema;

        #[allow(dead_code)]
        #[derive(JsonSchema)]
        struct Engine {
            power: u32,
        }

        #[allow(dead_code)]
        #[derive(JsonSchema)]
        struct Car {
            name: String,
            engine: Engine,
        }

        #[test]
        fn test_generates_draft07_definitions() {
            let mut generator = SchemarsGenerator::new();
            let car = generator.register::<Car>();
            assert_eq!(car.name(), "Car");

            let generated = SchemaBuilder::new(&generator).generate(&car).unwrap();

            assert!(generated.definitions.contains_key("Engine"));
            assert!(generated.root.get("$schema").is_none());
            let root = serde_json::to_string(&generated.root).unwrap();
            assert!(root.contains("#/definitions/Engine"));
        }

        #[test]
        fn test_unregistered_type() {
            let generator = SchemarsGenerator::new().with_type::<Engine>();
            assert!(generator.generate(&TypeDescriptor::of::<Car>()).is_err());
        }
    }
}
