//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Treeform CLI - Spec-driven restructuring of JSON and YAML documents
///
/// Maps input documents into a new shape described by a declarative
/// specification. Missing data never aborts a run; it is absorbed and can
/// be listed with `--report`.
#[derive(Parser, Debug)]
#[command(
    name = "treeform",
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
    #[arg(short, long, global = true, env = "TREEFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results (defaults to the configured format)
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
    /// Map a document (or a batch of documents) through a specification
    Map(MapArgs),

    /// Compile a specification and list its problems
    Check(CheckArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the map command
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Path to the mapping specification (JSON or YAML)
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Input document (stdin if not specified)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Dotted path anchoring the top level of the specification (e.g. address.home)
    #[arg(long, value_name = "PATH")]
    pub on: Option<String>,

    /// Treat the input as a batch: every document (or top-level sequence entry) is mapped
    #[arg(long)]
    pub batch: bool,

    /// Input format, needed when reading stdin (defaults to the file extension)
    #[arg(long, value_enum)]
    pub input_format: Option<InputFormat>,

    /// Deepest specification nesting accepted
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Show the degradation report alongside the output
    #[arg(long)]
    pub report: bool,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the mapping specification (JSON or YAML)
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Deepest specification nesting accepted
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
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

/// Input document formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// JSON, including concatenated JSON values (JSON lines)
    Json,
    /// YAML, including `---` separated documents
    Yaml,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
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

impl From<InputFormat> for treeform_core::Format {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Json => treeform_core::Format::Json,
            InputFormat::Yaml => treeform_core::Format::Yaml,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Verify that the CLI structure is valid
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
            command: Commands::Check(CheckArgs {
                spec: PathBuf::from("spec.json"),
                max_depth: None,
            }),
        };
        assert_eq!(cli.verbosity_level(), 2);

        let quiet_cli = Cli {
            verbose: 2,
            quiet: true,
            ..cli
        };
        assert_eq!(quiet_cli.verbosity_level(), 0);
    }

    #[test]
    fn test_map_arguments() {
        let cli = Cli::parse_from([
            "treeform",
            "-o",
            "json",
            "map",
            "spec.yaml",
            "input.json",
            "--on",
            "address.home",
            "--batch",
            "--report",
            "--max-depth",
            "10",
        ]);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        match cli.command {
            Commands::Map(args) => {
                assert_eq!(args.spec, PathBuf::from("spec.yaml"));
                assert_eq!(args.input, Some(PathBuf::from("input.json")));
                assert_eq!(args.on.as_deref(), Some("address.home"));
                assert!(args.batch);
                assert!(args.report);
                assert_eq!(args.max_depth, Some(10));
                assert!(args.save_to.is_none());
            }
            other => panic!("Expected map command, got {:?}", other),
        }
    }

    #[test]
    fn test_input_format_conversion() {
        assert_eq!(treeform_core::Format::from(InputFormat::Yaml), treeform_core::Format::Yaml);
        assert_eq!(treeform_core::Format::from(InputFormat::Json), treeform_core::Format::Json);
    }
}
