use crate::config::OutputFormat;
use cgff::engine::config::ConflictPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "cgff - Parse, validate and normalize coarse-grained force-field YAML files written in shorthand notation.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S normalize.policy=layer
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,

    /// Load additional potential types from a TOML schema file. Can be repeated.
    #[arg(long = "schema", value_name = "PATH", global = true)]
    pub schema_files: Vec<PathBuf>,

    /// Directory searched for inputs and schema files not found as given. Can be repeated.
    #[arg(long = "search-path", value_name = "DIR", global = true)]
    pub search_paths: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load force-field files and report what they define.
    Check(CheckArgs),
    /// Normalize a force-field file into explicit YAML, canonical shorthand or a CSV table.
    Normalize(NormalizeArgs),
    /// List the registered potential types, or describe one.
    Schema(SchemaArgs),
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Force-field YAML files to check.
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

/// Arguments for the `normalize` subcommand.
#[derive(Args, Debug, Default)]
pub struct NormalizeArgs {
    /// Force-field YAML file to normalize.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path. Writes to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format, overriding `output.format` from the config file.
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// How repeated definitions are resolved, overriding the document and config file.
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<ConflictPolicy>,

    /// Declare bead types that are used by potentials but never listed.
    #[arg(long)]
    pub implicit_bead_types: bool,

    /// Comment written at the top of YAML output.
    #[arg(long, value_name = "TEXT")]
    pub header: Option<String>,
}

/// Arguments for the `schema` subcommand.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Potential type to describe. Lists all types when omitted.
    #[arg(value_name = "NAME")]
    pub name: Option<String>,
}
