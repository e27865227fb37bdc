//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Refweave CLI - embed external JSON Schemas and compose API documents
///
/// Resolves every `$ref` that points at an external schema file, stores the
/// referenced schemas under one shared definitions node and rewrites the
/// references to point there.
#[derive(Parser, Debug)]
#[command(
    name = "refweave",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "REFWEAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results (defaults to the configured format, then human)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed every external schema a document references into its definitions
    Embed(EmbedArgs),

    /// Compose an API document from a base document and generated schemas
    Compose(ComposeArgs),
}

/// Arguments for the embed command
#[derive(Parser, Debug)]
pub struct EmbedArgs {
    /// Path to the document to embed (JSON or YAML)
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// JSON pointer of the definitions node
    #[arg(long, value_name = "POINTER")]
    pub mount: Option<String>,

    /// Write the result to a file instead of stdout (format from the extension)
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,

    /// Compare the result with a golden file
    #[arg(long, value_name = "GOLDEN_FILE")]
    pub golden: Option<PathBuf>,
}

/// Arguments for the compose command
#[derive(Parser, Debug)]
pub struct ComposeArgs {
    /// Path to the base API document (JSON or YAML)
    #[arg(value_name = "BASE")]
    pub base: PathBuf,

    /// Map a placeholder reference to a generated schema file
    #[arg(
        short,
        long = "schema",
        value_name = "PLACEHOLDER=FILE",
        value_parser = parse_schema_mapping
    )]
    pub schemas: Vec<(String, PathBuf)>,

    /// Write the result to a file instead of stdout (format from the extension)
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,

    /// Compare the result with a golden file
    #[arg(long, value_name = "GOLDEN_FILE")]
    pub golden: Option<PathBuf>,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

/// Parse a `PLACEHOLDER=FILE` pair
pub fn parse_schema_mapping(raw: &str) -> std::result::Result<(String, PathBuf), String> {
    let (placeholder, file) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PLACEHOLDER=FILE, got '{}'", raw))?;

    if placeholder.is_empty() {
        return Err(format!("missing placeholder in '{}'", raw));
    }
    if file.is_empty() {
        return Err(format!("missing schema file in '{}'", raw));
    }

    Ok((placeholder.to_string(), PathBuf::from(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli {
            verbose: 2,
            quiet: false,
            config: None,
            output: None,
            no_color: false,
            command: Commands::Embed(EmbedArgs {
                document: PathBuf::from("api.yaml"),
                mount: None,
                save_to: None,
                golden: None,
            }),
        };
        assert_eq!(cli.verbosity_level(), 2);

        let quiet_cli = Cli { quiet: true, ..cli };
        assert_eq!(quiet_cli.verbosity_level(), 0);
    }

    #[test]
    fn test_compose_schema_flags() {
        let cli = Cli::parse_from([
            "refweave",
            "-o",
            "json-pretty",
            "compose",
            "base.yaml",
            "--schema",
            "./car.json=schemas/car.json",
            "-s",
            "BAD=x.json",
        ]);

        assert_eq!(cli.output, Some(OutputFormat::JsonPretty));
        match cli.command {
            Commands::Compose(args) => {
                assert_eq!(args.base, PathBuf::from("base.yaml"));
                assert_eq!(
                    args.schemas,
                    vec![
                        ("./car.json".to_string(), PathBuf::from("schemas/car.json")),
                        ("BAD".to_string(), PathBuf::from("x.json")),
                    ]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_embed_flags() {
        let cli = Cli::parse_from([
            "refweave",
            "-vv",
            "embed",
            "api.yaml",
            "--mount",
            "/components/schemas",
            "--golden",
            "golden/api.json",
        ]);

        assert_eq!(cli.verbosity_level(), 2);
        match cli.command {
            Commands::Embed(args) => {
                assert_eq!(args.mount.as_deref(), Some("/components/schemas"));
                assert_eq!(args.golden, Some(PathBuf::from("golden/api.json")));
                assert!(args.save_to.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_schema_mapping() {
        assert_eq!(
            parse_schema_mapping("./schema.json=car.json").unwrap(),
            ("./schema.json".to_string(), PathBuf::from("car.json"))
        );
        // only the first '=' separates
        assert_eq!(
            parse_schema_mapping("a=b=c.json").unwrap(),
            ("a".to_string(), PathBuf::from("b=c.json"))
        );
        assert!(parse_schema_mapping("car.json").is_err());
        assert!(parse_schema_mapping("=car.json").is_err());
        assert!(parse_schema_mapping("car=").is_err());
    }

    #[test]
    fn test_output_format_deserializes_kebab_case() {
        let format: OutputFormat = serde_json::from_str("\"json-pretty\"").unwrap();
        assert_eq!(format, OutputFormat::JsonPretty);
    }
}
