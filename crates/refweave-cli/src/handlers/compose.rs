//! Compose command handler

use super::utils::{ensure_exists, merge_schema_mappings, read_document, write_result};
use crate::cli::ComposeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use refweave_core::compose::COMPONENTS_SCHEMAS;
use refweave_core::{ApiDocumentBuilder, InMemoryGenerator, PlaceholderClassifier, SuffixClassifier};
use tracing::{debug, info, instrument};

/// Handle the compose command
///
/// Every placeholder maps to a JSON Schema file, registered with an
/// [`InMemoryGenerator`] under the schema's `title` (or its file stem).
#[instrument(skip(config, output), fields(base = %args.base.display(), schemas = args.schemas.len()))]
pub fn handle_compose(args: ComposeArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("compose_command", &format!("base: {}", args.base.display()));
    output.info(&format!("Composing {}", args.base.display()))?;

    let base = read_document(&args.base)?;
    let mappings = merge_schema_mappings(config, &args.schemas)?;

    let mut generator = InMemoryGenerator::new();
    let mut placeholders = Vec::with_capacity(mappings.len());
    for (placeholder, file) in mappings {
        ensure_exists(&file)?;
        let ty = generator.load_file(&file)?;
        debug!(placeholder = %placeholder, file = %file.display(), ty = %ty, "Placeholder mapped");
        placeholders.push((placeholder, ty));
    }

    let classifier =
        PlaceholderClassifier::new(SuffixClassifier::new(config.embedder.suffixes.iter().cloned()));
    let builder = placeholders.into_iter().fold(
        ApiDocumentBuilder::new(&generator)
            .with_base(base)
            .with_classifier(classifier)
            .with_max_name_suffix(config.embedder.max_name_suffix),
        |builder, (placeholder, ty)| builder.with_schema(placeholder, ty),
    );

    let composed = {
        let _enter = timer.span().enter();
        builder.build()?
    };

    let schema_names: Vec<String> = composed
        .pointer(&format!("/{}", COMPONENTS_SCHEMAS.join("/")))
        .and_then(|schemas| schemas.as_object())
        .map(|schemas| schemas.keys().cloned().collect())
        .unwrap_or_default();
    info!(schemas = schema_names.len(), "Composition finished");

    write_result(
        &composed,
        args.save_to.as_deref(),
        args.golden.as_deref(),
        output,
    )?;

    if !schema_names.is_empty() {
        output.section("Component schemas")?;
        output.table(
            &["Schema"],
            schema_names.into_iter().map(|name| vec![name]).collect(),
        )?;
    }
    output.debug(&format!("composed in {}ms", timer.elapsed().as_millis()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use refweave_core::loader::SchemaParser;
    use serde_json::{json, Value};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn quiet_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, 0, Box::new(std::io::sink()))
    }

    fn write_fixture(dir: &Path) {
        fs::write(
            dir.join("base.yaml"),
            "asyncapi: 2.6.0\ncomponents:\n  messages:\n    carEvent:\n      payload:\n        $ref: ./schema.json\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("schemas")).unwrap();
        fs::write(
            dir.join("schemas/car.json"),
            r##"{
                "title": "Car",
                "properties": {"engine": {"$ref": "#/definitions/Engine"}},
                "definitions": {"Engine": {"type": "object"}}
            }"##,
        )
        .unwrap();
    }

    fn args(dir: &Path, schemas: Vec<(String, PathBuf)>) -> ComposeArgs {
        ComposeArgs {
            base: dir.join("base.yaml"),
            schemas,
            save_to: Some(dir.join("composed.json")),
            golden: None,
        }
    }

    fn saved(dir: &Path) -> Value {
        SchemaParser::new().parse_file(&dir.join("composed.json")).unwrap()
    }

    #[test]
    fn test_compose_from_flags() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());

        let schemas = vec![("./schema.json".to_string(), dir.path().join("schemas/car.json"))];
        handle_compose(args(dir.path(), schemas), &Config::default(), &mut quiet_output()).unwrap();

        assert_eq!(
            saved(dir.path()),
            json!({
                "asyncapi": "2.6.0",
                "components": {
                    "messages": {"carEvent": {"payload": {"$ref": "#/components/schemas/Car"}}},
                    "schemas": {
                        "Car": {
                            "title": "Car",
                            "properties": {"engine": {"$ref": "#/components/schemas/Engine"}}
                        },
                        "Engine": {"type": "object"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_compose_from_config_file() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());
        let config_path = dir.path().join("refweave.yaml");
        fs::write(
            &config_path,
            "compose:\n  schemas:\n    ./schema.json: schemas/car.json\n",
        )
        .unwrap();
        let config = Config::from_file(&config_path).unwrap();

        handle_compose(args(dir.path(), Vec::new()), &config, &mut quiet_output()).unwrap();

        assert_eq!(
            saved(dir.path())["components"]["messages"]["carEvent"]["payload"]["$ref"],
            "#/components/schemas/Car"
        );
    }

    #[test]
    fn test_unmapped_placeholder_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());

        let err = handle_compose(args(dir.path(), Vec::new()), &Config::default(), &mut quiet_output())
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Core(refweave_core::Error::UnknownSchema { ref placeholder }) if placeholder == "./schema.json"
        ));
        assert_eq!(err.exit_code(), 4);
        assert!(!dir.path().join("composed.json").exists());
    }

    #[test]
    fn test_missing_schema_file() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());

        let schemas = vec![("./schema.json".to_string(), dir.path().join("schemas/absent.json"))];
        let err = handle_compose(args(dir.path(), schemas), &Config::default(), &mut quiet_output())
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
