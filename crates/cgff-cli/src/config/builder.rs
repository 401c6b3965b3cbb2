use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, OutputConfig, OutputFormat};
use crate::cli::{GlobalArgs, NormalizeArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use cgff::core::io::paths::find_in_paths;
use cgff::core::schema::registry::SchemaRegistry;
use cgff::engine::config::{ConflictPolicy, NormalizeConfigBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Command-specific flags that take precedence over the config file.
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub policy: Option<ConflictPolicy>,
    pub implicit_bead_types: bool,
    pub format: Option<OutputFormat>,
    pub header: Option<&'a str>,
}

impl<'a> From<&'a NormalizeArgs> for CliOverrides<'a> {
    fn from(args: &'a NormalizeArgs) -> Self {
        Self {
            policy: args.policy,
            implicit_bead_types: args.implicit_bead_types,
            format: args.format,
            header: args.header.as_deref(),
        }
    }
}

pub fn build_config(global: &GlobalArgs, overrides: &CliOverrides) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &global.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &global.set_values)?;

    let mut search_paths = global.search_paths.clone();
    search_paths.extend(file_config.search_paths.take().unwrap_or_default());

    let mut schema_files = file_config.schema_files.take().unwrap_or_default();
    schema_files.extend(global.schema_files.iter().cloned());

    let normalize_file = file_config.normalize.take().unwrap_or_default();
    let policy = overrides.policy.or(normalize_file.policy);
    let implicit_bead_types = overrides.implicit_bead_types
        || normalize_file
            .implicit_bead_types
            .unwrap_or(defaults.implicit_bead_types);
    let default_kt = normalize_file.default_kt.unwrap_or(defaults.default_kt);

    let mut builder = NormalizeConfigBuilder::new()
        .implicit_bead_types(implicit_bead_types)
        .default_kt(default_kt);
    if let Some(policy) = policy {
        builder = builder.policy(policy);
    }
    let normalize = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let output_file = file_config.output.take().unwrap_or_default();
    let output = OutputConfig {
        format: overrides
            .format
            .or(output_file.format)
            .unwrap_or(defaults.format),
        header: overrides
            .header
            .map(str::to_string)
            .or(output_file.header)
            .or(defaults.header),
    };

    let registry = build_registry(&schema_files, &search_paths)?;

    Ok(AppConfig {
        search_paths,
        registry,
        normalize,
        output,
    })
}

fn build_registry(schema_files: &[PathBuf], search_paths: &[PathBuf]) -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::with_builtins();
    for file in schema_files {
        let path = resolve_input(file, search_paths)?;
        info!("Loading potential types from {:?}", path);
        registry.load_toml(&path)?;
    }
    debug!("{} potential types registered.", registry.len());
    Ok(registry)
}

/// Returns `path` if it exists, otherwise the first match under the search paths.
pub fn resolve_input(path: &Path, search_paths: &[PathBuf]) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    find_in_paths(path, search_paths).ok_or_else(|| {
        CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!(
                "'{}' does not exist and was not found in {} search path(s)",
                path.display(),
                search_paths.len()
            ),
        ))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value_str) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        match key {
            "normalize.policy" => {
                config.normalize.get_or_insert_with(Default::default).policy =
                    Some(value_str.parse().map_err(|e| {
                        CliError::Config(format!("Invalid value for {}: {}", key, e))
                    })?);
            }
            "normalize.implicit-bead-types" => {
                config
                    .normalize
                    .get_or_insert_with(Default::default)
                    .implicit_bead_types = Some(
                    parser::parse_bool(key, value_str)
                        .map_err(|e| CliError::Config(e.to_string()))?,
                );
            }
            "normalize.default-kt" => {
                config
                    .normalize
                    .get_or_insert_with(Default::default)
                    .default_kt = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })?);
            }
            "output.format" => {
                config.output.get_or_insert_with(Default::default).format =
                    Some(value_str.parse().map_err(|e| {
                        CliError::Config(format!("Invalid value for {}: {}", key, e))
                    })?);
            }
            "output.header" => {
                config.output.get_or_insert_with(Default::default).header =
                    Some(value_str.to_string());
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
