//! # Engine Module
//!
//! Turns a force-field document into a normalized [`ForceField`](crate::core::models::forcefield::ForceField).
//!
//! ## Pipeline
//!
//! 1. **Parsing** ([`parser`]) - Reads the shorthand notations into a raw document that
//!    keeps entries as written
//! 2. **Normalization** ([`normalizer`]) - Layers defaults, expands species groups and
//!    resolves bead names
//! 3. **Validation** ([`validator`]) - Resolves repeated definitions under a
//!    [`config::ConflictPolicy`] and checks assembled force fields
//!
//! Supporting modules:
//!
//! - **Configuration** ([`config`]) - Normalization options and their builder
//! - **Progress Monitoring** ([`progress`]) - Callbacks for long-running normalizations
//! - **Error Handling** ([`error`]) - Normalization errors

pub mod config;
pub mod error;
pub mod normalizer;
pub mod parser;
pub mod progress;
pub mod validator;
