use super::models::OutputFormat;
use cgff::core::models::forcefield::DEFAULT_KT;

pub struct DefaultsConfig {
    pub implicit_bead_types: bool,
    pub default_kt: f64,
    pub format: OutputFormat,
    pub header: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            implicit_bead_types: false,
            default_kt: DEFAULT_KT,
            format: OutputFormat::Yaml,
            header: None,
        }
    }
}
