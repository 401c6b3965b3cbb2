use crate::core::models::forcefield::ForceField;
use crate::core::schema::registry::SchemaRegistry;
use crate::engine::config::NormalizeConfig;
use crate::engine::error::NormalizeError;
use crate::engine::normalizer::Normalizer;
use crate::engine::parser::{ParseError, RawForceField, parse_document};
use crate::engine::progress::ProgressReporter;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

const STRING_ORIGIN: &str = "<string>";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("YAML syntax error in '{origin}': {source}")]
    Yaml {
        origin: String,
        source: serde_yaml::Error,
    },
    #[error("Invalid force field in '{origin}': {source}")]
    Parse { origin: String, source: ParseError },
    #[error("Normalization of '{origin}' failed: {source}")]
    Normalize {
        origin: String,
        source: NormalizeError,
    },
}

/// Parses YAML text into a raw document without normalizing it.
pub fn parse_str(
    text: &str,
    origin: &str,
    registry: &SchemaRegistry,
) -> Result<RawForceField, LoadError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| LoadError::Yaml {
        origin: origin.to_string(),
        source: e,
    })?;
    parse_document(&value, registry).map_err(|e| LoadError::Parse {
        origin: origin.to_string(),
        source: e,
    })
}

fn load_text(
    text: &str,
    origin: &str,
    registry: &SchemaRegistry,
    config: &NormalizeConfig,
    reporter: &ProgressReporter,
) -> Result<ForceField, LoadError> {
    let raw = parse_str(text, origin, registry)?;
    let forcefield = Normalizer::new(registry, config)
        .with_reporter(reporter)
        .normalize(raw)
        .map_err(|e| LoadError::Normalize {
            origin: origin.to_string(),
            source: e,
        })?;
    info!(
        "Loaded '{}': {} bead types, {} potential instances.",
        origin,
        forcefield.bead_count(),
        forcefield.potential_count()
    );
    Ok(forcefield)
}

/// Loads a force field from YAML text.
#[instrument(skip_all, name = "load_workflow")]
pub fn from_str(
    text: &str,
    registry: &SchemaRegistry,
    config: &NormalizeConfig,
) -> Result<ForceField, LoadError> {
    load_text(text, STRING_ORIGIN, registry, config, &ProgressReporter::new())
}

/// Loads a force field from a YAML file.
pub fn from_path(
    path: &Path,
    registry: &SchemaRegistry,
    config: &NormalizeConfig,
) -> Result<ForceField, LoadError> {
    from_path_with_progress(path, registry, config, &ProgressReporter::new())
}

/// Loads a force field from a YAML file, reporting normalization progress.
#[instrument(skip_all, name = "load_workflow", fields(path = %path.display()))]
pub fn from_path_with_progress(
    path: &Path,
    registry: &SchemaRegistry,
    config: &NormalizeConfig,
    reporter: &ProgressReporter,
) -> Result<ForceField, LoadError> {
    let origin = path.to_string_lossy();
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: origin.to_string(),
        source: e,
    })?;
    load_text(&text, &origin, registry, config, reporter)
}
