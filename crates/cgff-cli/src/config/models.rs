use cgff::core::schema::registry::SchemaRegistry;
use cgff::engine::config::NormalizeConfig;
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Fully expanded YAML with one mapping per potential instance.
    #[default]
    Yaml,
    /// Canonical one-line-per-entry shorthand YAML.
    Shorthand,
    /// A parameter table, derived parameters included.
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Shorthand => "shorthand",
            OutputFormat::Csv => "csv",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| format!("unknown output format '{}' (expected yaml, shorthand or csv)", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub header: Option<String>,
}

/// Everything a command needs after the defaults, config file and command line are merged.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub search_paths: Vec<PathBuf>,
    pub registry: SchemaRegistry,
    pub normalize: NormalizeConfig,
    pub output: OutputConfig,
}
