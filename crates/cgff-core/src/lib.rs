//! # cgff
//!
//! Reads coarse-grained force-field files written in a compact YAML shorthand and
//! turns them into fully explicit, validated force fields.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Data models (`ForceField`, `BeadType`,
//!   `PotentialInstance`), the potential schema registry and the output formats.
//!
//! - **[`engine`]: The Logic Core.** The shorthand parser, the normalizer that layers
//!   defaults and expands species groups, and the validator that resolves repeated
//!   definitions under a conflict policy.
//!
//! - **[`workflows`]: The Public API.** One-call loading from text or files.
//!
//! ```ignore
//! use cgff::core::schema::registry::SchemaRegistry;
//! use cgff::engine::config::NormalizeConfig;
//! use cgff::workflows::load;
//!
//! let registry = SchemaRegistry::with_builtins();
//! let ff = load::from_path("forcefield.yaml".as_ref(), &registry, &NormalizeConfig::default())?;
//! for p in ff.free_parameters()? {
//!     println!("{} {:?} {} = {}", p.kind, p.species, p.parameter, p.value);
//! }
//! ```

pub mod core;
pub mod engine;
pub mod workflows;
