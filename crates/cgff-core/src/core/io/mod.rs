//! Serialization of normalized force fields.
//!
//! Three output formats are provided: explicit YAML, which spells out every
//! parameter as a `{value, fixed}` mapping; canonical shorthand YAML, one line per
//! interaction; and a flat CSV table of every parameter. Both YAML flavors are
//! valid input and reload to an equal force field.

pub mod csv;
pub mod paths;
pub mod shorthand;
pub mod traits;
pub mod yaml;

use crate::core::models::forcefield::ForceFieldError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("CSV serialization error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("Force field is inconsistent: {0}")]
    ForceField(#[from] ForceFieldError),
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}
