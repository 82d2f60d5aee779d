//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Shapeshift CLI - Convert documents between plain and class shapes
///
/// Loads class definitions from a JSON or YAML schema and runs one
/// conversion over an input document.
#[derive(Parser, Debug)]
#[command(
    name = "shapeshift",
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
    #[arg(short, long, global = true, env = "SHAPESHIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

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
    /// Convert a document using the classes of a schema
    Convert(ConvertArgs),

    /// List the classes of a schema and their property rules
    Describe(DescribeArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the convert command
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Path to the input document (JSON or YAML), or '-' for stdin
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Path to the class schema (JSON or YAML)
    #[arg(short, long, value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Name of the root class
    #[arg(long = "class", value_name = "CLASS")]
    pub class_name: String,

    /// Conversion to run
    #[arg(short, long, value_enum, default_value = "plain-to-class")]
    pub direction: ConversionDirection,

    /// Groups to request (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub groups: Vec<String>,

    /// Version to request
    #[arg(long = "target-version", value_name = "VERSION")]
    pub target_version: Option<f64>,

    /// Default visibility of unmarked properties
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Drop input keys that map to no known property
    #[arg(long)]
    pub exclude_extraneous: bool,

    /// Coerce primitives toward declared property types
    #[arg(long)]
    pub implicit_conversion: bool,

    /// Ignore exposure, exclusion and transform rules
    #[arg(long)]
    pub ignore_rules: bool,

    /// Skip keys starting with this prefix (repeatable)
    #[arg(long = "exclude-prefix", value_name = "PREFIX")]
    pub exclude_prefixes: Vec<String>,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to")]
    pub output_file: Option<PathBuf>,
}

/// Arguments for the describe command
#[derive(Parser, Debug)]
pub struct DescribeArgs {
    /// Path to the class schema (JSON or YAML)
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Only describe this class
    #[arg(long = "class", value_name = "CLASS")]
    pub class_name: Option<String>,
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

/// Conversions the convert command can run
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConversionDirection {
    /// Plain input into class instances
    PlainToClass,
    /// Class-shaped input into plain output
    ClassToPlain,
    /// Plain input into instances and back to plain
    RoundTrip,
}

/// Exposure strategy
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Everything is visible unless excluded
    ExposeAll,
    /// Only exposed properties are visible
    ExcludeAll,
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

impl From<StrategyArg> for shapeshift_core::Strategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::ExposeAll => shapeshift_core::Strategy::ExposeAll,
            StrategyArg::ExcludeAll => shapeshift_core::Strategy::ExcludeAll,
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
