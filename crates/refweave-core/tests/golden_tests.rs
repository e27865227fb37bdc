//! Golden file tests pinning embedded and composed output
//!
//! Run with `UPDATE_GOLDEN=1` to rewrite the files under `tests/golden/`.

use refweave_core::loader::SchemaParser;
use refweave_core::{ApiDocumentBuilder, FileLoader, InMemoryGenerator, JsonSchemaEmbedder};
use refweave_golden::assert_golden;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn fixture(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(path)
}

fn parse(path: &Path) -> Value {
    SchemaParser::new().parse_file(path).unwrap()
}

#[test]
fn golden_embedded_order() {
    let root = parse(&fixture("order/order.yaml"));
    let loader = FileLoader::new(fixture("order"));

    let embedded = JsonSchemaEmbedder::new(&loader).embed(&root).unwrap();

    assert_golden!("tests/golden/embedded_order.json", embedded);
}

#[test]
fn golden_asyncapi_car() {
    let base = parse(&fixture("asyncapi/base.yaml"));
    let mut generator = InMemoryGenerator::new();
    let car = generator.load_file(&fixture("asyncapi/car.json")).unwrap();

    let composed = ApiDocumentBuilder::new(&generator)
        .with_base(base)
        .with_schema("./schema.json", car)
        .build()
        .unwrap();

    assert_golden!("tests/golden/asyncapi_car.json", composed);
}
