//! # Models Module
//!
//! Data structures of a normalized force field.
//!
//! - [`bead`] - Bead types (coarse-grained particle species)
//! - [`parameter`] - Resolved parameters and partial patches layered onto them
//! - [`filter`] - Bead-type patterns, grouping and ordering rules
//! - [`potential`] - Individual interaction instances
//! - [`forcefield`] - The [`forcefield::ForceField`] container

pub mod bead;
pub mod filter;
pub mod forcefield;
pub mod ids;
pub mod parameter;
pub mod potential;
