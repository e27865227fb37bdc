// Tests for document output and status lines
//
// Machine formats must carry only the document, so most tests check what
// does NOT get written as much as what does.

use super::*;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

fn writer(format: OutputFormat, quiet: bool, verbose: u8) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, verbose, Box::new(buffer.clone()));
    (writer, buffer)
}

fn sample() -> Value {
    json!({
        "paths": {"/cars": {"$ref": "#/components/schemas/Car"}},
        "components": {"schemas": {"Car": {"type": "object"}}}
    })
}

#[test]
fn test_document_formats() {
    let document = sample();

    let compact = OutputFormat::Json.format_document(&document).unwrap();
    assert_eq!(
        compact,
        r##"{"components":{"schemas":{"Car":{"type":"object"}}},"paths":{"/cars":{"$ref":"#/components/schemas/Car"}}}"##
    );

    let pretty = OutputFormat::JsonPretty.format_document(&document).unwrap();
    assert!(pretty.starts_with("{\n  \"components\""));
    assert!(pretty.ends_with("}\n"));
    assert_eq!(pretty, OutputFormat::Human.format_document(&document).unwrap());

    let yaml = OutputFormat::Yaml.format_document(&document).unwrap();
    assert!(yaml.starts_with("components:"));
    assert!(yaml.contains("#/components/schemas/Car"));
}

#[test]
fn test_machine_formats_print_only_the_document() {
    let (mut output, buffer) = writer(OutputFormat::Json, false, 2);

    output.info("Embedding api.yaml").unwrap();
    output.section("Definitions").unwrap();
    output.success("done").unwrap();
    output.debug("details").unwrap();
    output
        .table(&["Identity", "Definition"], vec![vec!["car.json".into(), "car".into()]])
        .unwrap();
    output.document(&json!({"b": 1, "a": 2})).unwrap();

    assert_eq!(buffer.contents(), "{\"a\":2,\"b\":1}\n");
}

#[test]
fn test_quiet_human_output_keeps_the_document() {
    let (mut output, buffer) = writer(OutputFormat::Human, true, 0);

    output.info("Embedding api.yaml").unwrap();
    output.success("done").unwrap();
    output.document(&json!({"type": "object"})).unwrap();

    assert_eq!(buffer.contents(), "{\n  \"type\": \"object\"\n}\n");
}

#[test]
fn test_human_status_lines_without_color() {
    let (mut output, buffer) = writer(OutputFormat::Human, false, 0);

    output.info("Embedding api.yaml").unwrap();
    output.warning("mount path overridden").unwrap();
    output.debug("hidden at verbosity 0").unwrap();
    output.section("Definitions").unwrap();

    assert_eq!(
        buffer.contents(),
        "INFO: Embedding api.yaml\nWARNING: mount path overridden\n\n=== Definitions ===\n"
    );
}

#[test]
fn test_table_alignment() {
    let (mut output, buffer) = writer(OutputFormat::Human, false, 0);

    output
        .table(
            &["Identity", "Definition"],
            vec![
                vec!["v1/car.json".into(), "car".into()],
                vec!["v2/car.json".into(), "car2".into()],
            ],
        )
        .unwrap();

    let contents = buffer.contents();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines[0], "Identity    │ Definition");
    assert_eq!(lines[2], "v1/car.json │ car");
    assert_eq!(lines[3], "v2/car.json │ car2");
}

#[test]
fn test_format_serializable_values() {
    let names = vec!["car", "engine"];
    assert_eq!(OutputFormat::Yaml.format(&names).unwrap(), "- car\n- engine\n");
    assert_eq!(OutputFormat::Json.format(&names).unwrap(), r#"["car","engine"]"#);
}
