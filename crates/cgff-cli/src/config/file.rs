use super::models::OutputFormat;
use crate::error::{CliError, Result};
use cgff::engine::config::ConflictPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub search_paths: Option<Vec<PathBuf>>,
    pub schema_files: Option<Vec<PathBuf>>,
    pub normalize: Option<FileNormalizeConfig>,
    pub output: Option<FileOutputConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileNormalizeConfig {
    pub policy: Option<ConflictPolicy>,
    pub implicit_bead_types: Option<bool>,
    pub default_kt: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileOutputConfig {
    pub format: Option<OutputFormat>,
    pub header: Option<String>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
