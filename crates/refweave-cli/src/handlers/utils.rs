//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use refweave_core::canonical::{sort_keys_recursive, to_canonical_string};
use refweave_core::loader::{Format, SchemaParser};
use refweave_golden::{DiffOptions, GoldenConfig, GoldenFile, GoldenOutcome};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fail with [`Error::FileNotFound`] unless `path` exists
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Directory relative references of a document resolve against
pub fn document_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Parse a JSON or YAML document from disk
pub fn read_document(path: &Path) -> Result<Value> {
    ensure_exists(path)?;
    Ok(SchemaParser::new().parse_file(path)?)
}

/// Placeholder mappings from the configuration, overridden by `--schema` flags
pub fn merge_schema_mappings(
    config: &Config,
    flags: &[(String, PathBuf)],
) -> Result<BTreeMap<String, PathBuf>> {
    let mut mappings = config.schema_mappings();
    let mut seen = Vec::with_capacity(flags.len());

    for (placeholder, file) in flags {
        if seen.contains(&placeholder) {
            return Err(Error::invalid_args(format!(
                "placeholder '{}' is mapped more than once",
                placeholder
            )));
        }
        seen.push(placeholder);

        if let Some(previous) = mappings.insert(placeholder.clone(), file.clone()) {
            debug!(
                placeholder = %placeholder,
                configured = %previous.display(),
                flag = %file.display(),
                "Flag overrides configured schema"
            );
        }
    }

    Ok(mappings)
}

/// Golden comparison settings, with colors following the terminal
fn golden_config(use_color: bool) -> GoldenConfig {
    let config = GoldenConfig::from_env();
    GoldenConfig {
        diff_options: DiffOptions {
            colored: use_color && config.diff_options.colored,
            ..config.diff_options
        },
        ..config
    }
}

/// Check, save or print a result document
///
/// A golden file is checked first, so drift fails before anything is
/// written. The document goes to `save_to` when given, otherwise to the
/// output writer.
pub fn write_result(
    document: &Value,
    save_to: Option<&Path>,
    golden: Option<&Path>,
    output: &mut OutputWriter,
) -> Result<()> {
    if let Some(golden) = golden {
        let outcome = GoldenFile::new(golden)
            .with_config(golden_config(output.use_color()))
            .verify(document)?;
        info!(golden = %golden.display(), outcome = ?outcome, "Golden file checked");

        let message = match outcome {
            GoldenOutcome::Matched => format!("✓ Output matches {}", golden.display()),
            GoldenOutcome::Updated => format!("✓ Updated golden file {}", golden.display()),
            GoldenOutcome::Created => format!("✓ Created golden file {}", golden.display()),
        };
        output.success(&message)?;
    }

    match save_to {
        Some(path) => {
            save_document(document, path)?;
            output.success(&format!("✓ Saved to {}", path.display()))
        }
        None => output.document(document),
    }
}

/// Write a document with sorted keys, in the format named by the extension
pub fn save_document(document: &Value, path: &Path) -> Result<()> {
    // JSON goes through the golden renderer so saved files can serve as golden files
    let content = match Format::from_path(path)? {
        Format::Json => to_canonical_string(document)?,
        Format::Yaml => {
            let mut content =
                SchemaParser::new().serialize(&sort_keys_recursive(document), Format::Yaml, path)?;
            if !content.ends_with('\n') {
                content.push('\n');
            }
            content
        }
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;

    debug!(path = %path.display(), "Document saved");
    Ok(())
}
