//! # Workflows Module
//!
//! Entry points that run the whole pipeline, from YAML text or a file path to a
//! validated force field.
//!
//! - **Loading** ([`load`]) - YAML parsing, shorthand parsing and normalization under a
//!   single tracing span

pub mod load;
