//! # Core Module
//!
//! Data structures and serialization for coarse-grained force fields.
//!
//! ## Overview
//!
//! - **Force-field model** ([`models`]) - Bead types, parameters, species filters and
//!   normalized potential instances
//! - **Potential schemas** ([`schema`]) - Arity, ordering and parameter declarations of
//!   each potential type, including derived parameters
//! - **Serialization** ([`io`]) - Explicit YAML, shorthand YAML and CSV writers, and
//!   search-path lookup for input files
//! - **Utilities** ([`utils`]) - Name validation and lookup normalization

pub mod io;
pub mod models;
pub mod schema;
pub mod utils;
