//! # Schema Module
//!
//! Declares the potential types a force field may reference: their arity (n-body),
//! how their bead sequences compare, and the parameters they accept together with
//! default values and optimizability flags.
//!
//! ## Key Components
//!
//! - [`registry`] - [`registry::SchemaRegistry`] lookup and TOML-defined user schemas
//! - [`derived`] - Formulas for parameters computed from other quantities
//!
//! ```ignore
//! use cgff::core::schema::registry::SchemaRegistry;
//!
//! let mut registry = SchemaRegistry::with_builtins();
//! registry.load_toml("extra_potentials.toml".as_ref())?;
//! let bond = registry.get("HarmonicBond").unwrap();
//! assert_eq!(bond.arity, 2);
//! ```

mod builtin;
pub mod derived;
pub mod registry;
