//! Line diffs between golden and actual output

use colored::*;
use refweave_core::canonical::to_canonical_string;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;

/// Options for diff rendering
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Whether to use colored output
    pub colored: bool,

    /// Unchanged lines shown around each change
    pub context_lines: usize,

    /// Maximum diff lines to show (0 = unlimited)
    pub max_diff_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            colored: true,
            context_lines: 3,
            max_diff_lines: 100,
        }
    }
}

/// Result of a diff operation
#[derive(Debug)]
pub struct DiffResult {
    /// Whether the texts are byte-identical
    pub matches: bool,

    /// Human-readable diff output
    pub diff_output: String,

    /// Summary of changes
    pub summary: DiffSummary,
}

/// Summary of diff changes
#[derive(Debug, Default)]
pub struct DiffSummary {
    /// Number of added lines
    pub added: usize,

    /// Number of removed lines
    pub removed: usize,

    /// JSON pointers of the values that differ
    pub differing_paths: Vec<String>,
}

/// Engine comparing golden output
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Compare two texts byte for byte
    pub fn compare_text(&self, expected: &str, actual: &str) -> DiffResult {
        if expected == actual {
            return DiffResult {
                matches: true,
                diff_output: String::new(),
                summary: DiffSummary::default(),
            };
        }

        let text_diff = TextDiff::from_lines(expected, actual);
        let mut summary = DiffSummary::default();
        for change in text_diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Delete => summary.removed += 1,
                ChangeTag::Insert => summary.added += 1,
                ChangeTag::Equal => {}
            }
        }

        DiffResult {
            matches: false,
            diff_output: self.render(&text_diff),
            summary,
        }
    }

    /// Compare two JSON values through their canonical rendering
    pub fn compare(&self, expected: &Value, actual: &Value) -> serde_json::Result<DiffResult> {
        let mut result = self.compare_text(&to_canonical_string(expected)?, &to_canonical_string(actual)?);
        if !result.matches {
            collect_diff_paths(expected, actual, String::new(), &mut result.summary.differing_paths);
        }
        Ok(result)
    }

    fn render<'a>(&self, text_diff: &TextDiff<'a, 'a, 'a, str>) -> String {
        let mut output = String::new();
        let header = "--- golden\n+++ actual\n";
        if self.options.colored {
            output.push_str(&header.bold().to_string());
        } else {
            output.push_str(header);
        }

        let mut line_count = 0;
        for group in text_diff.grouped_ops(self.options.context_lines) {
            for op in group {
                for change in text_diff.iter_changes(&op) {
                    if self.options.max_diff_lines > 0 && line_count >= self.options.max_diff_lines {
                        output.push_str("... (diff truncated) ...\n");
                        return output;
                    }

                    let line = match change.tag() {
                        ChangeTag::Delete if self.options.colored => {
                            format!("{}{}", "-".red(), change.to_string().red())
                        }
                        ChangeTag::Delete => format!("-{}", change),
                        ChangeTag::Insert if self.options.colored => {
                            format!("{}{}", "+".green(), change.to_string().green())
                        }
                        ChangeTag::Insert => format!("+{}", change),
                        ChangeTag::Equal => format!(" {}", change),
                    };
                    output.push_str(&line);
                    if change.missing_newline() {
                        output.push('\n');
                    }
                    line_count += 1;
                }
            }
        }

        output
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DiffOptions::default())
    }
}

/// Recursively collect pointers of values that differ
fn collect_diff_paths(expected: &Value, actual: &Value, path: String, paths: &mut Vec<String>) {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            let all_keys: BTreeSet<_> = exp.keys().chain(act.keys()).collect();

            for key in all_keys {
                let new_path = format!("{}/{}", path, key.replace('~', "~0").replace('/', "~1"));
                match (exp.get(key), act.get(key)) {
                    (Some(exp_val), Some(act_val)) if exp_val != act_val => {
                        collect_diff_paths(exp_val, act_val, new_path, paths);
                    }
                    (Some(_), None) => paths.push(format!("{} (missing in actual)", new_path)),
                    (None, Some(_)) => paths.push(format!("{} (extra in actual)", new_path)),
                    _ => {}
                }
            }
        }
        (Value::Array(exp), Value::Array(act)) if exp.len() == act.len() => {
            for (i, (exp_val, act_val)) in exp.iter().zip(act.iter()).enumerate() {
                if exp_val != act_val {
                    collect_diff_paths(exp_val, act_val, format!("{}/{}", path, i), paths);
                }
            }
        }
        _ if expected != actual => paths.push(path),
        _ => {}
    }
}
