mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{CliOverrides, build_config, resolve_input};
pub use models::{AppConfig, OutputFormat};
