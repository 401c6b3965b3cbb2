//! Readers for the shorthand force-field notation.
//!
//! A document is first loaded as a generic YAML tree, then converted into a
//! [`document::RawForceField`] that keeps entries as written: species filters with
//! their groups intact and partial parameter patches. Layering defaults and expanding
//! groups is left to the normalizer.

pub mod bead;
pub mod document;
pub mod entry;
pub mod error;
pub mod potential;
pub mod species;
pub mod tokens;

pub use document::{RawForceField, parse_document};
pub use error::ParseError;
