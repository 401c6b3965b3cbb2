use super::builtin::{BUILTIN_ALIASES, BUILTIN_SCHEMAS};
use super::derived::Derivation;
use crate::core::models::filter::SpeciesOrdering;
use crate::core::models::parameter::Parameter;
use crate::core::utils::identifiers::{is_reserved_key, is_valid_identifier, lookup_key};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Declaration of one parameter of a potential type.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub default: f64,
    /// Default optimizability flag: `true` holds the parameter constant.
    pub fixed: bool,
    /// Present for parameters computed from other quantities.
    pub derivation: Option<Derivation>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, default: f64, fixed: bool) -> Self {
        Self {
            name: name.into(),
            default,
            fixed,
            derivation: None,
        }
    }

    pub fn is_derived(&self) -> bool {
        self.derivation.is_some()
    }

    pub fn default_parameter(&self) -> Parameter {
        Parameter::new(self.default, self.fixed)
    }
}

/// Declaration of a potential type: how many beads it couples and which parameters it takes.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialSchema {
    pub name: String,
    pub arity: usize,
    pub ordering: SpeciesOrdering,
    pub parameters: Vec<ParameterSpec>,
}

impl PotentialSchema {
    pub fn new(name: impl Into<String>, arity: usize, ordering: SpeciesOrdering) -> Self {
        Self {
            name: name.into(),
            arity,
            ordering,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.parameter(name).is_some_and(ParameterSpec::is_derived)
    }

    pub fn serialized_parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(|p| !p.is_derived())
    }

    pub fn derived_parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(|p| p.is_derived())
    }

    /// Serialized parameters initialized to their schema defaults, in declaration order.
    pub fn default_parameters(&self) -> IndexMap<String, Parameter> {
        self.serialized_parameters()
            .map(|p| (p.name.clone(), p.default_parameter()))
            .collect()
    }

    fn check(&self) -> Result<(), String> {
        if !is_valid_identifier(&self.name) {
            return Err("potential name must be an identifier".to_string());
        }
        if self.arity == 0 {
            return Err("arity must be at least 1".to_string());
        }
        let mut seen = HashSet::new();
        for p in &self.parameters {
            if !is_valid_identifier(&p.name) {
                return Err(format!("parameter name '{}' is not an identifier", p.name));
            }
            if is_reserved_key(&p.name) {
                return Err(format!("parameter name '{}' is reserved", p.name));
            }
            if !p.default.is_finite() {
                return Err(format!("default of parameter '{}' is not finite", p.name));
            }
            if !seen.insert(p.name.as_str()) {
                return Err(format!("parameter '{}' is declared twice", p.name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Potential type '{0}' is already registered")]
    Duplicate(String),
    #[error("Invalid schema for potential type '{name}': {reason}")]
    Invalid { name: String, reason: String },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFileEntry {
    arity: usize,
    #[serde(default)]
    ordering: SpeciesOrdering,
    #[serde(default)]
    parameters: Vec<ParameterFileEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParameterFileEntry {
    name: String,
    #[serde(default)]
    default: f64,
    #[serde(default)]
    fixed: bool,
}

/// The set of potential types a force field may use.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, PotentialSchema>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with `gaussian`, `harmonic_bond` and `harmonic_bond_no_offset`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for builtin in BUILTIN_SCHEMAS.values() {
            let schema = builtin.to_schema();
            registry.schemas.insert(lookup_key(&schema.name), schema);
        }
        registry
    }

    pub fn register(&mut self, schema: PotentialSchema) -> Result<(), SchemaError> {
        schema.check().map_err(|reason| SchemaError::Invalid {
            name: schema.name.clone(),
            reason,
        })?;
        let key = lookup_key(&schema.name);
        if self.schemas.contains_key(&key) {
            return Err(SchemaError::Duplicate(schema.name));
        }
        debug!(
            "Registering potential type '{}' (arity {}, {} parameters).",
            schema.name,
            schema.arity,
            schema.parameters.len()
        );
        self.schemas.insert(key, schema);
        Ok(())
    }

    /// Looks up a schema ignoring case, `_` and `-`; built-in aliases are honored.
    pub fn get(&self, name: &str) -> Option<&PotentialSchema> {
        let key = lookup_key(name);
        self.schemas.get(&key).or_else(|| {
            BUILTIN_ALIASES
                .get(key.as_str())
                .and_then(|target| self.schemas.get(&lookup_key(target)))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.values().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn load_toml(&mut self, path: &Path) -> Result<(), SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        self.extend_from_toml(&content, &path.to_string_lossy())
    }

    pub fn extend_from_toml_str(&mut self, content: &str) -> Result<(), SchemaError> {
        self.extend_from_toml(content, "<string>")
    }

    fn extend_from_toml(&mut self, content: &str, origin: &str) -> Result<(), SchemaError> {
        let entries: BTreeMap<String, SchemaFileEntry> =
            toml::from_str(content).map_err(|e| SchemaError::Toml {
                path: origin.to_string(),
                source: e,
            })?;
        for (name, entry) in entries {
            let schema = PotentialSchema {
                name,
                arity: entry.arity,
                ordering: entry.ordering,
                parameters: entry
                    .parameters
                    .into_iter()
                    .map(|p| ParameterSpec::new(p.name, p.default, p.fixed))
                    .collect(),
            };
            self.register(schema)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builtins_are_registered() {
        let registry = SchemaRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["gaussian", "harmonic_bond", "harmonic_bond_no_offset"]
        );
    }

    #[test]
    fn get_ignores_case_and_separators() {
        let registry = SchemaRegistry::with_builtins();
        for name in ["HarmonicBond", "harmonic-bond", "harmonic_bond", "HARMONIC_BOND"] {
            assert_eq!(registry.get(name).unwrap().name, "harmonic_bond");
        }
        assert_eq!(
            registry.get("HarmonicBondNoOffset").unwrap().name,
            "harmonic_bond_no_offset"
        );
        assert!(registry.get("lennard_jones").is_none());
    }

    #[test]
    fn get_resolves_builtin_aliases() {
        let registry = SchemaRegistry::with_builtins();
        assert_eq!(registry.get("bond").unwrap().name, "harmonic_bond");
        assert_eq!(registry.get("Gauss").unwrap().name, "gaussian");
    }

    #[test]
    fn aliases_do_not_resolve_in_an_empty_registry() {
        assert!(SchemaRegistry::new().get("bond").is_none());
    }

    #[test]
    fn register_rejects_duplicates_after_normalization() {
        let mut registry = SchemaRegistry::with_builtins();
        let result = registry.register(PotentialSchema::new(
            "Harmonic_Bond",
            2,
            SpeciesOrdering::Unordered,
        ));
        assert!(matches!(result, Err(SchemaError::Duplicate(_))));
    }

    #[test]
    fn register_rejects_invalid_schemas() {
        let mut registry = SchemaRegistry::new();
        let zero_arity = PotentialSchema::new("external", 0, SpeciesOrdering::Ordered);
        assert!(matches!(
            registry.register(zero_arity),
            Err(SchemaError::Invalid { .. })
        ));

        let reserved = PotentialSchema::new("soft", 2, SpeciesOrdering::Unordered)
            .with_parameter(ParameterSpec::new("name", 1.0, false));
        assert!(matches!(
            registry.register(reserved),
            Err(SchemaError::Invalid { .. })
        ));

        let repeated = PotentialSchema::new("soft", 2, SpeciesOrdering::Unordered)
            .with_parameter(ParameterSpec::new("A", 1.0, false))
            .with_parameter(ParameterSpec::new("A", 2.0, false));
        assert!(matches!(
            registry.register(repeated),
            Err(SchemaError::Invalid { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn default_parameters_skip_derived_terms() {
        let registry = SchemaRegistry::with_builtins();
        let defaults = registry.get("gaussian").unwrap().default_parameters();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults["excl_vol"], Parameter::free(0.0));
    }

    #[test]
    fn extend_from_toml_str_registers_user_schemas() {
        let mut registry = SchemaRegistry::with_builtins();
        registry
            .extend_from_toml_str(
                r#"
                [soft_repulsion]
                arity = 2
                parameters = [
                    { name = "A", default = 25.0 },
                    { name = "rc", default = 1.0, fixed = true },
                ]

                [angle]
                arity = 3
                ordering = "reversible"
                parameters = [{ name = "K", default = 2.0 }]
                "#,
            )
            .unwrap();

        let soft = registry.get("soft_repulsion").unwrap();
        assert_eq!(soft.arity, 2);
        assert_eq!(soft.ordering, SpeciesOrdering::Unordered);
        assert_eq!(soft.parameters[0], ParameterSpec::new("A", 25.0, false));
        assert_eq!(soft.parameters[1], ParameterSpec::new("rc", 1.0, true));

        let angle = registry.get("angle").unwrap();
        assert_eq!(angle.arity, 3);
        assert_eq!(angle.ordering, SpeciesOrdering::Reversible);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn extend_from_toml_str_rejects_unknown_fields() {
        let mut registry = SchemaRegistry::new();
        let result = registry.extend_from_toml_str(
            r#"
            [soft]
            arity = 2
            colour = "blue"
            "#,
        );
        assert!(matches!(result, Err(SchemaError::Toml { .. })));
    }

    #[test]
    fn load_toml_succeeds_with_valid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schemas.toml");
        fs::write(
            &path,
            "[wall]\narity = 1\nparameters = [{ name = \"eps\", default = 1.0 }]\n",
        )
        .unwrap();

        let mut registry = SchemaRegistry::new();
        registry.load_toml(&path).unwrap();
        assert_eq!(registry.get("wall").unwrap().arity, 1);
    }

    #[test]
    fn load_toml_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let mut registry = SchemaRegistry::new();
        let result = registry.load_toml(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(SchemaError::Io { .. })));
    }
}
