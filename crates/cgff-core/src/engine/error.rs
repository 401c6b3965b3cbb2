use super::validator::ValidationError;
use crate::core::models::forcefield::ForceFieldError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("{context}: invalid bead type: {source}")]
    BeadType {
        context: String,
        source: ForceFieldError,
    },

    #[error("{context}: unknown bead type '{name}'")]
    UnknownBeadType { context: String, name: String },

    #[error("{context}: potential type '{kind}' is not registered")]
    UnknownPotential { context: String, kind: String },

    #[error("{context}: potential type '{kind}' has no parameter '{parameter}'")]
    UnknownParameter {
        context: String,
        kind: String,
        parameter: String,
    },

    #[error(
        "{context}: parameter '{parameter}' of potential type '{kind}' is derived and cannot be given"
    )]
    DerivedParameter {
        context: String,
        kind: String,
        parameter: String,
    },

    /// A repeated definition under the `error` policy. `first_entry` and `second_entry`
    /// are the species labels of the two entries, `shared` the number of interactions
    /// both of them produce.
    #[error(
        "{context}: {source} ('{first_entry}' and '{second_entry}' share {shared} interaction(s))"
    )]
    Validation {
        context: String,
        first_entry: String,
        second_entry: String,
        shared: usize,
        source: ValidationError,
    },

    #[error("Force field error: {source}")]
    ForceField {
        #[from]
        source: ForceFieldError,
    },
}
