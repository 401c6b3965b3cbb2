use super::bead::{BeadType, BeadTypeDefect};
use super::filter::SpeciesOrdering;
use super::ids::BeadTypeId;
use super::potential::PotentialInstance;
use crate::core::schema::registry::{PotentialSchema, SchemaRegistry};
use indexmap::IndexMap;
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_KT: f64 = 1.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForceFieldError {
    #[error("Thermal energy kT must be finite and positive, got {0}")]
    InvalidKt(f64),
    #[error("Force field already contains bead type '{0}'")]
    DuplicateBeadType(String),
    #[error("Force field does not contain bead type '{0}'")]
    UnknownBeadType(String),
    #[error(
        "Invalid bead type name '{0}': names must be non-empty and free of whitespace and ',;:{{}}'"
    )]
    InvalidBeadName(String),
    #[error("Invalid {field} for bead type '{name}': {value}")]
    InvalidBeadValue {
        name: String,
        field: &'static str,
        value: f64,
    },
    #[error("Provided bead names {found:?} don't match the bead types of the force field {expected:?}")]
    BeadSetMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Unknown potential type '{0}'")]
    UnknownPotential(String),
    #[error("Potential type '{kind}' couples {expected} bead types, but {found} were given")]
    ArityMismatch {
        kind: String,
        expected: usize,
        found: usize,
    },
    #[error("Potential '{name}' of type '{kind}' references a bead type not in the force field")]
    DanglingBead { kind: String, name: String },
    #[error("No '{kind}' potential between {species:?}")]
    PotentialNotFound { kind: String, species: Vec<String> },
    #[error("Potential type '{kind}' has no parameter '{parameter}'")]
    UnknownParameter { kind: String, parameter: String },
    #[error("Parameter '{parameter}' of potential type '{kind}' is derived and cannot be set")]
    ReadOnlyParameter { kind: String, parameter: String },
    #[error("Invalid value {value} for parameter '{parameter}'")]
    InvalidValue { parameter: String, value: f64 },
}

/// A parameter that is free to vary during optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeParameter {
    pub kind: String,
    pub name: String,
    pub species: Vec<String>,
    pub parameter: String,
    pub value: f64,
}

/// The interactions of a system: bead types and the potentials acting between them.
///
/// Bead types are stored in a slot map and referenced by [`BeadTypeId`] from every
/// potential instance, so renaming-free operations such as reordering never touch
/// the potentials.
#[derive(Debug, Clone)]
pub struct ForceField {
    /// Thermal energy, used to express parameters in real energy units.
    kt: f64,
    bead_types: SlotMap<BeadTypeId, BeadType>,
    /// Declaration order of the bead types.
    bead_order: Vec<BeadTypeId>,
    bead_index: HashMap<String, BeadTypeId>,
    /// Instances grouped by potential kind, in first-definition order.
    potentials: IndexMap<String, Vec<PotentialInstance>>,
}

impl Default for ForceField {
    fn default() -> Self {
        Self {
            kt: DEFAULT_KT,
            bead_types: SlotMap::with_key(),
            bead_order: Vec::new(),
            bead_index: HashMap::new(),
            potentials: IndexMap::new(),
        }
    }
}

impl ForceField {
    /// Creates an empty force field with `kT = 1`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kt(kt: f64) -> Result<Self, ForceFieldError> {
        let mut ff = Self::new();
        ff.set_kt(kt)?;
        Ok(ff)
    }

    pub fn kt(&self) -> f64 {
        self.kt
    }

    pub fn set_kt(&mut self, kt: f64) -> Result<(), ForceFieldError> {
        if !kt.is_finite() || kt <= 0.0 {
            return Err(ForceFieldError::InvalidKt(kt));
        }
        self.kt = kt;
        Ok(())
    }

    /// Adds a bead type after validating its name and properties.
    ///
    /// # Errors
    ///
    /// Returns [`ForceFieldError::DuplicateBeadType`] if a bead type of the same name
    /// already exists, or a validation error for malformed names and values.
    pub fn add_bead_type(&mut self, bead_type: BeadType) -> Result<BeadTypeId, ForceFieldError> {
        match bead_type.check() {
            Ok(()) => {}
            Err(BeadTypeDefect::Name) => {
                return Err(ForceFieldError::InvalidBeadName(bead_type.name));
            }
            Err(BeadTypeDefect::SmearLength) => {
                return Err(ForceFieldError::InvalidBeadValue {
                    value: bead_type.smear_length,
                    name: bead_type.name,
                    field: "smear length",
                });
            }
            Err(BeadTypeDefect::Charge) => {
                return Err(ForceFieldError::InvalidBeadValue {
                    value: bead_type.charge,
                    name: bead_type.name,
                    field: "charge",
                });
            }
        }
        if self.bead_index.contains_key(&bead_type.name) {
            return Err(ForceFieldError::DuplicateBeadType(bead_type.name));
        }
        let name = bead_type.name.clone();
        let id = self.bead_types.insert(bead_type);
        self.bead_order.push(id);
        self.bead_index.insert(name, id);
        Ok(id)
    }

    pub fn bead_id(&self, name: &str) -> Option<BeadTypeId> {
        self.bead_index.get(name).copied()
    }

    pub fn bead(&self, id: BeadTypeId) -> Option<&BeadType> {
        self.bead_types.get(id)
    }

    pub fn bead_type(&self, name: &str) -> Option<&BeadType> {
        self.bead_id(name).and_then(|id| self.bead_types.get(id))
    }

    pub fn get_bead_type(&self, name: &str) -> Result<&BeadType, ForceFieldError> {
        self.bead_type(name)
            .ok_or_else(|| ForceFieldError::UnknownBeadType(name.to_string()))
    }

    /// Bead types in declaration order.
    pub fn bead_types(&self) -> impl Iterator<Item = &BeadType> {
        self.bead_order
            .iter()
            .filter_map(move |id| self.bead_types.get(*id))
    }

    pub fn bead_names(&self) -> Vec<&str> {
        self.bead_types().map(|bt| bt.name.as_str()).collect()
    }

    pub fn bead_count(&self) -> usize {
        self.bead_order.len()
    }

    /// Rearranges the declaration order of the bead types.
    ///
    /// The given names must be exactly the current set of bead names.
    pub fn reorder_bead_types<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), ForceFieldError> {
        let requested: HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        let current: HashSet<&str> = self.bead_index.keys().map(String::as_str).collect();
        if requested != current || names.len() != self.bead_order.len() {
            return Err(ForceFieldError::BeadSetMismatch {
                expected: self.bead_names().iter().map(|s| s.to_string()).collect(),
                found: names.iter().map(|n| n.as_ref().to_string()).collect(),
            });
        }
        self.bead_order = names
            .iter()
            .filter_map(|n| self.bead_index.get(n.as_ref()).copied())
            .collect();
        Ok(())
    }

    /// Adds an interaction instance after checking its arity and bead references.
    ///
    /// Duplicate definitions are not detected here; that is the validator's job.
    pub fn add_potential(
        &mut self,
        instance: PotentialInstance,
        schema: &PotentialSchema,
    ) -> Result<(), ForceFieldError> {
        if instance.arity() != schema.arity {
            return Err(ForceFieldError::ArityMismatch {
                kind: schema.name.clone(),
                expected: schema.arity,
                found: instance.arity(),
            });
        }
        if instance
            .beads
            .iter()
            .any(|id| !self.bead_types.contains_key(*id))
        {
            return Err(ForceFieldError::DanglingBead {
                kind: schema.name.clone(),
                name: instance.name,
            });
        }
        let mut instance = instance;
        instance.kind = schema.name.clone();
        self.potentials
            .entry(schema.name.clone())
            .or_default()
            .push(instance);
        Ok(())
    }

    /// All potential instances, grouped by kind.
    pub fn potentials(&self) -> impl Iterator<Item = &PotentialInstance> {
        self.potentials.values().flatten()
    }

    pub fn potentials_of(&self, kind: &str) -> &[PotentialInstance] {
        self.potentials.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Potential kinds present in the force field, in first-definition order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.potentials.keys().map(String::as_str)
    }

    pub fn potential_count(&self) -> usize {
        self.potentials.values().map(Vec::len).sum()
    }

    /// Bead names of an instance, in the instance's own order.
    ///
    /// # Errors
    ///
    /// Returns [`ForceFieldError::DanglingBead`] if the instance references a bead type
    /// this force field does not hold.
    pub fn species_of(&self, instance: &PotentialInstance) -> Result<Vec<&str>, ForceFieldError> {
        instance
            .beads
            .iter()
            .map(|id| {
                self.bead_types
                    .get(*id)
                    .map(|bt| bt.name.as_str())
                    .ok_or_else(|| ForceFieldError::DanglingBead {
                        kind: instance.kind.clone(),
                        name: instance.name.clone(),
                    })
            })
            .collect()
    }

    fn find_index<S: AsRef<str>>(
        &self,
        kind: &str,
        names: &[S],
        ordering: SpeciesOrdering,
    ) -> Option<usize> {
        let ids: Vec<BeadTypeId> = names
            .iter()
            .map(|n| self.bead_id(n.as_ref()))
            .collect::<Option<_>>()?;
        self.potentials_of(kind)
            .iter()
            .position(|p| ordering.equivalent(&p.beads, &ids))
    }

    /// Finds the instance of `kind` between the named beads, honoring the ordering rule.
    pub fn find_potential<S: AsRef<str>>(
        &self,
        kind: &str,
        names: &[S],
        ordering: SpeciesOrdering,
    ) -> Option<&PotentialInstance> {
        self.find_index(kind, names, ordering)
            .map(|i| &self.potentials[kind][i])
    }

    /// Lists every serialized parameter that is free to vary.
    pub fn free_parameters(&self) -> Result<Vec<FreeParameter>, ForceFieldError> {
        let mut free = Vec::new();
        for p in self.potentials() {
            let species: Vec<String> = self
                .species_of(p)?
                .into_iter()
                .map(str::to_string)
                .collect();
            free.extend(
                p.parameters
                    .iter()
                    .filter(|(_, param)| !param.fixed)
                    .map(|(name, param)| FreeParameter {
                        kind: p.kind.clone(),
                        name: p.name.clone(),
                        species: species.clone(),
                        parameter: name.clone(),
                        value: param.value,
                    }),
            );
        }
        Ok(free)
    }

    fn smear_lengths(&self, beads: &[BeadTypeId]) -> Vec<f64> {
        beads
            .iter()
            .filter_map(|id| self.bead_types.get(*id).map(|bt| bt.smear_length))
            .collect()
    }

    /// Sets a parameter of one instance.
    ///
    /// Derived parameters with an inverse (the Gaussian prefactor `B`, the force constant
    /// of an offset-free bond) are set through their source parameter; other derived
    /// parameters are read-only.
    pub fn set_parameter_value<S: AsRef<str>>(
        &mut self,
        kind: &str,
        names: &[S],
        parameter: &str,
        value: f64,
        registry: &SchemaRegistry,
    ) -> Result<(), ForceFieldError> {
        let schema = registry
            .get(kind)
            .ok_or_else(|| ForceFieldError::UnknownPotential(kind.to_string()))?;
        let kind = schema.name.as_str();
        let index = self
            .find_index(kind, names, schema.ordering)
            .ok_or_else(|| ForceFieldError::PotentialNotFound {
                kind: kind.to_string(),
                species: names.iter().map(|n| n.as_ref().to_string()).collect(),
            })?;
        let spec = schema
            .parameter(parameter)
            .ok_or_else(|| ForceFieldError::UnknownParameter {
                kind: kind.to_string(),
                parameter: parameter.to_string(),
            })?;
        if !value.is_finite() {
            return Err(ForceFieldError::InvalidValue {
                parameter: parameter.to_string(),
                value,
            });
        }

        let smear_lengths = self.smear_lengths(&self.potentials[kind][index].beads);
        let (target, target_value) = match spec.derivation {
            None => (spec.name.as_str(), value),
            Some(derivation) if !derivation.is_invertible() => {
                return Err(ForceFieldError::ReadOnlyParameter {
                    kind: kind.to_string(),
                    parameter: parameter.to_string(),
                });
            }
            Some(derivation) => derivation.invert(value, &smear_lengths).ok_or_else(|| {
                ForceFieldError::InvalidValue {
                    parameter: parameter.to_string(),
                    value,
                }
            })?,
        };

        let instance = &mut self.potentials[kind][index];
        match instance.parameters.get_mut(target) {
            Some(param) => param.value = target_value,
            None => {
                return Err(ForceFieldError::UnknownParameter {
                    kind: kind.to_string(),
                    parameter: target.to_string(),
                });
            }
        }
        refresh_instance(instance, schema, &smear_lengths);
        Ok(())
    }

    /// Recomputes the derived parameters of every instance.
    pub fn refresh_derived(&mut self, registry: &SchemaRegistry) {
        let bead_types = &self.bead_types;
        for (kind, instances) in self.potentials.iter_mut() {
            let Some(schema) = registry.get(kind) else {
                warn!(
                    "Potential type '{}' is not registered; derived parameters left untouched.",
                    kind
                );
                continue;
            };
            for instance in instances.iter_mut() {
                let smear_lengths: Vec<f64> = instance
                    .beads
                    .iter()
                    .filter_map(|id| bead_types.get(*id).map(|bt| bt.smear_length))
                    .collect();
                refresh_instance(instance, schema, &smear_lengths);
            }
        }
    }
}

fn refresh_instance(instance: &mut PotentialInstance, schema: &PotentialSchema, smear_lengths: &[f64]) {
    instance.derived.clear();
    for spec in schema.derived_parameters() {
        let Some(derivation) = spec.derivation else {
            continue;
        };
        if let Some(param) = derivation.compute(&instance.parameters, smear_lengths) {
            instance.derived.insert(spec.name.clone(), param);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::parameter::Parameter;

    fn create_test_forcefield() -> ForceField {
        let mut ff = ForceField::new();
        ff.add_bead_type(BeadType::new("A").with_smear_length(1.0).with_charge(-1.0))
            .unwrap();
        ff.add_bead_type(BeadType::new("B").with_smear_length(2.0).with_charge(1.0))
            .unwrap();
        ff
    }

    fn gaussian(ff: &ForceField, a: &str, b: &str, excl_vol: f64) -> PotentialInstance {
        let mut p = PotentialInstance::new(
            "gaussian",
            format!("gaussian_{}_{}", a, b),
            vec![ff.bead_id(a).unwrap(), ff.bead_id(b).unwrap()],
        );
        p.parameters
            .insert("excl_vol".into(), Parameter::free(excl_vol));
        p
    }

    #[test]
    fn bead_types_are_retrievable_by_name() {
        let ff = create_test_forcefield();
        let a = ff.get_bead_type("A").unwrap();
        assert_eq!(a.smear_length, 1.0);
        assert_eq!(a.charge, -1.0);
        assert_eq!(ff.bead_names(), vec!["A", "B"]);
        assert_eq!(
            ff.get_bead_type("C"),
            Err(ForceFieldError::UnknownBeadType("C".into()))
        );
    }

    #[test]
    fn add_bead_type_rejects_duplicates_and_bad_values() {
        let mut ff = create_test_forcefield();
        assert_eq!(
            ff.add_bead_type(BeadType::new("A")),
            Err(ForceFieldError::DuplicateBeadType("A".into()))
        );
        assert!(matches!(
            ff.add_bead_type(BeadType::new("C").with_smear_length(-1.0)),
            Err(ForceFieldError::InvalidBeadValue { field: "smear length", .. })
        ));
        assert_eq!(
            ff.add_bead_type(BeadType::new("C D")),
            Err(ForceFieldError::InvalidBeadName("C D".into()))
        );
        assert_eq!(ff.bead_count(), 2);
    }

    #[test]
    fn reorder_bead_types_changes_declaration_order() {
        let mut ff = create_test_forcefield();
        ff.reorder_bead_types(&["B", "A"]).unwrap();
        assert_eq!(ff.bead_names(), vec!["B", "A"]);
    }

    #[test]
    fn reorder_bead_types_rejects_mismatched_names() {
        let mut ff = create_test_forcefield();
        assert!(matches!(
            ff.reorder_bead_types(&["C"]),
            Err(ForceFieldError::BeadSetMismatch { .. })
        ));
        assert!(matches!(
            ff.reorder_bead_types(&["A", "A"]),
            Err(ForceFieldError::BeadSetMismatch { .. })
        ));
        assert_eq!(ff.bead_names(), vec!["A", "B"]);
    }

    #[test]
    fn set_kt_rejects_non_positive_values() {
        let mut ff = ForceField::new();
        assert_eq!(ff.kt(), 1.0);
        assert_eq!(ff.set_kt(0.0), Err(ForceFieldError::InvalidKt(0.0)));
        ff.set_kt(2.5).unwrap();
        assert_eq!(ff.kt(), 2.5);
    }

    #[test]
    fn add_potential_checks_arity() {
        let registry = SchemaRegistry::with_builtins();
        let schema = registry.get("gaussian").unwrap();
        let mut ff = create_test_forcefield();
        let mut p = gaussian(&ff, "A", "B", 1.0);
        p.beads.pop();
        assert!(matches!(
            ff.add_potential(p, schema),
            Err(ForceFieldError::ArityMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn find_potential_is_order_insensitive() {
        let registry = SchemaRegistry::with_builtins();
        let schema = registry.get("gaussian").unwrap();
        let mut ff = create_test_forcefield();
        let p = gaussian(&ff, "A", "B", 1.0);
        ff.add_potential(p, schema).unwrap();

        let found = ff
            .find_potential("gaussian", &["B", "A"], SpeciesOrdering::Unordered)
            .unwrap();
        assert_eq!(found.name, "gaussian_A_B");
        assert!(ff
            .find_potential("gaussian", &["B", "A"], SpeciesOrdering::Ordered)
            .is_none());
        assert_eq!(ff.potential_count(), 1);
        assert_eq!(ff.kinds().collect::<Vec<_>>(), vec!["gaussian"]);
    }

    #[test]
    fn refresh_derived_computes_gaussian_terms() {
        let registry = SchemaRegistry::with_builtins();
        let schema = registry.get("gaussian").unwrap();
        let mut ff = create_test_forcefield();
        ff.add_potential(gaussian(&ff, "A", "B", 0.0), schema)
            .unwrap();
        ff.refresh_derived(&registry);

        let p = &ff.potentials_of("gaussian")[0];
        assert!((p.value("Kappa").unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(p.value("B"), Some(0.0));
        assert!(p.parameter("Kappa").unwrap().fixed);
    }

    #[test]
    fn setting_prefactor_adjusts_excluded_volume() {
        let registry = SchemaRegistry::with_builtins();
        let schema = registry.get("gaussian").unwrap();
        let mut ff = create_test_forcefield();
        ff.add_potential(gaussian(&ff, "A", "B", 0.0), schema)
            .unwrap();

        ff.set_parameter_value("gaussian", &["A", "B"], "excl_vol", 1.0, &registry)
            .unwrap();
        let p = &ff.potentials_of("gaussian")[0];
        let expected_b = (0.1_f64 / std::f64::consts::PI).powf(1.5);
        assert!((p.value("B").unwrap() - expected_b).abs() < 1e-12);

        ff.set_parameter_value("gaussian", &["B", "A"], "B", 2.0 * expected_b, &registry)
            .unwrap();
        let p = &ff.potentials_of("gaussian")[0];
        assert!((p.value("excl_vol").unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn setting_kappa_is_rejected() {
        let registry = SchemaRegistry::with_builtins();
        let schema = registry.get("gaussian").unwrap();
        let mut ff = create_test_forcefield();
        ff.add_potential(gaussian(&ff, "A", "B", 0.0), schema)
            .unwrap();
        assert_eq!(
            ff.set_parameter_value("gaussian", &["A", "B"], "Kappa", 1.0, &registry),
            Err(ForceFieldError::ReadOnlyParameter {
                kind: "gaussian".into(),
                parameter: "Kappa".into()
            })
        );
        assert!(matches!(
            ff.set_parameter_value("gaussian", &["A", "A"], "excl_vol", 1.0, &registry),
            Err(ForceFieldError::PotentialNotFound { .. })
        ));
    }

    #[test]
    fn free_parameters_lists_only_unfixed_values() {
        let registry = SchemaRegistry::with_builtins();
        let schema = registry.get("gaussian").unwrap();
        let mut ff = create_test_forcefield();
        ff.add_potential(gaussian(&ff, "A", "B", 0.5), schema)
            .unwrap();
        let mut fixed = gaussian(&ff, "A", "A", 0.7);
        fixed.parameters["excl_vol"].fixed = true;
        ff.add_potential(fixed, schema).unwrap();
        ff.refresh_derived(&registry);

        let free = ff.free_parameters().unwrap();
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].species, vec!["A", "B"]);
        assert_eq!(free[0].parameter, "excl_vol");
        assert_eq!(free[0].value, 0.5);
    }

    #[test]
    fn species_of_reports_beads_missing_from_the_force_field() {
        let registry = SchemaRegistry::with_builtins();
        let schema = registry.get("gaussian").unwrap();
        let mut ff = create_test_forcefield();
        let p = gaussian(&ff, "A", "B", 0.5);
        ff.add_potential(p.clone(), schema).unwrap();
        assert_eq!(ff.species_of(&p).unwrap(), vec!["A", "B"]);

        let stranger = create_test_forcefield();
        let foreign = ForceField::new();
        let mut orphan = gaussian(&stranger, "A", "B", 0.5);
        orphan.name = "orphan".into();
        assert_eq!(
            foreign.species_of(&orphan),
            Err(ForceFieldError::DanglingBead {
                kind: "gaussian".into(),
                name: "orphan".into(),
            })
        );
    }

    #[test]
    fn find_potential_ignores_unknown_bead_names() {
        let registry = SchemaRegistry::with_builtins();
        let schema = registry.get("gaussian").unwrap();
        let mut ff = create_test_forcefield();
        ff.add_potential(gaussian(&ff, "A", "B", 0.5), schema)
            .unwrap();
        assert!(ff
            .find_potential("gaussian", &["A", "Z"], SpeciesOrdering::Unordered)
            .is_none());
    }
}
