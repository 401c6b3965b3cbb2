use super::config::ConflictPolicy;
use crate::core::models::forcefield::ForceField;
use crate::core::models::potential::PotentialInstance;
use crate::core::schema::registry::SchemaRegistry;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate '{kind}' definition for {species:?}: {second} repeats {first}")]
    DuplicateDefinition {
        kind: String,
        species: Vec<String>,
        first: String,
        second: String,
    },
    #[error("Conflicting '{kind}' definitions for {species:?}: {first} and {second}")]
    ConflictingDefinition {
        kind: String,
        species: Vec<String>,
        first: String,
        second: String,
    },
}

/// What [`DefinitionTable::insert`] did with an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An identical definition already existed; the new one was dropped.
    KeptFirst,
    Replaced,
    Layered,
}

impl ValidationError {
    /// Canonical bead key the two definitions share.
    pub fn species(&self) -> &[String] {
        match self {
            ValidationError::DuplicateDefinition { species, .. }
            | ValidationError::ConflictingDefinition { species, .. } => species,
        }
    }
}

/// Per-outcome counts of [`DefinitionTable::insert`] calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionTally {
    pub inserted: usize,
    pub kept: usize,
    pub replaced: usize,
    pub layered: usize,
}

impl ResolutionTally {
    pub fn record(&mut self, outcome: InsertOutcome) {
        match outcome {
            InsertOutcome::Inserted => self.inserted += 1,
            InsertOutcome::KeptFirst => self.kept += 1,
            InsertOutcome::Replaced => self.replaced += 1,
            InsertOutcome::Layered => self.layered += 1,
        }
    }

    pub fn add(&mut self, other: &ResolutionTally) {
        self.inserted += other.inserted;
        self.kept += other.kept;
        self.replaced += other.replaced;
        self.layered += other.layered;
    }

    /// Instances handed to the table, whatever became of them.
    pub fn instances(&self) -> usize {
        self.inserted + self.kept + self.replaced + self.layered
    }

    /// Whether any instance met an earlier definition of the same key.
    pub fn has_repeats(&self) -> bool {
        self.kept + self.replaced + self.layered > 0
    }
}

impl fmt::Display for ResolutionTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new, {} kept, {} replaced, {} layered",
            self.inserted, self.kept, self.replaced, self.layered
        )
    }
}

fn describe(instance: &PotentialInstance) -> String {
    format!("'{}' (entry {})", instance.name, instance.source)
}

/// Resolved potential instances keyed by `(kind, canonical bead key)`.
///
/// Instances keep the position of their first definition even when a later one
/// replaces or layers onto them.
#[derive(Debug, Default)]
pub struct DefinitionTable {
    instances: IndexMap<String, Vec<PotentialInstance>>,
    positions: HashMap<(String, Vec<String>), usize>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instance whose canonical bead key is `key`, resolving repeats under `policy`.
    pub fn insert(
        &mut self,
        instance: PotentialInstance,
        key: Vec<String>,
        policy: ConflictPolicy,
    ) -> Result<InsertOutcome, ValidationError> {
        let slot = (instance.kind.clone(), key);
        let Some(&position) = self.positions.get(&slot) else {
            let list = self.instances.entry(instance.kind.clone()).or_default();
            self.positions.insert(slot, list.len());
            list.push(instance);
            return Ok(InsertOutcome::Inserted);
        };

        let (kind, species) = slot;
        let existing = &mut self.instances[&kind][position];

        if existing.same_parameters(&instance) {
            if policy == ConflictPolicy::Error {
                return Err(ValidationError::DuplicateDefinition {
                    kind,
                    species,
                    first: describe(existing),
                    second: describe(&instance),
                });
            }
            debug!(
                "Ignoring {} for '{}' {:?}: identical to {}.",
                describe(&instance),
                kind,
                species,
                describe(existing)
            );
            return Ok(InsertOutcome::KeptFirst);
        }

        match policy {
            ConflictPolicy::Error => Err(ValidationError::ConflictingDefinition {
                kind,
                species,
                first: describe(existing),
                second: describe(&instance),
            }),
            ConflictPolicy::Override => {
                warn!(
                    "{} overrides {} for '{}' {:?}.",
                    describe(&instance),
                    describe(existing),
                    kind,
                    species
                );
                *existing = instance;
                Ok(InsertOutcome::Replaced)
            }
            ConflictPolicy::Layer => {
                info!(
                    "Layering {} onto {} for '{}' {:?}.",
                    describe(&instance),
                    describe(existing),
                    kind,
                    species
                );
                existing.layer(&instance);
                Ok(InsertOutcome::Layered)
            }
        }
    }

    /// Distinct `(kind, canonical key)` definitions held.
    pub fn definition_count(&self) -> usize {
        self.positions.len()
    }

    /// Instances grouped by kind, in first-definition order.
    pub fn into_instances(self) -> IndexMap<String, Vec<PotentialInstance>> {
        self.instances
    }
}

/// A consistency problem found in an assembled force field.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("Potential type '{kind}' is not registered")]
    UnknownPotential { kind: String },
    #[error("'{kind}' is defined {count} times for {species:?}")]
    DuplicateKey {
        kind: String,
        species: Vec<String>,
        count: usize,
    },
    #[error("'{name}' of type '{kind}' couples {found} bead types, expected {expected}")]
    ArityMismatch {
        kind: String,
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("'{name}' of type '{kind}' references a bead type not in the force field")]
    DanglingBead { kind: String, name: String },
    #[error("'{name}' of type '{kind}' lacks parameter '{parameter}'")]
    MissingParameter {
        kind: String,
        name: String,
        parameter: String,
    },
    #[error("'{name}' of type '{kind}' has unexpected parameter '{parameter}'")]
    UnexpectedParameter {
        kind: String,
        name: String,
        parameter: String,
    },
}

/// Checks a force field assembled through the API for problems normalization rules out.
pub fn validate(forcefield: &ForceField, registry: &SchemaRegistry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for kind in forcefield.kinds() {
        let Some(schema) = registry.get(kind) else {
            issues.push(ValidationIssue::UnknownPotential {
                kind: kind.to_string(),
            });
            continue;
        };

        let mut counts: IndexMap<Vec<String>, usize> = IndexMap::new();
        for instance in forcefield.potentials_of(kind) {
            if instance.arity() != schema.arity {
                issues.push(ValidationIssue::ArityMismatch {
                    kind: kind.to_string(),
                    name: instance.name.clone(),
                    expected: schema.arity,
                    found: instance.arity(),
                });
            }

            match forcefield.species_of(instance) {
                Ok(names) => {
                    *counts
                        .entry(schema.ordering.canonical_names(&names))
                        .or_default() += 1;
                }
                Err(_) => issues.push(ValidationIssue::DanglingBead {
                    kind: kind.to_string(),
                    name: instance.name.clone(),
                }),
            }

            for spec in schema.serialized_parameters() {
                if !instance.parameters.contains_key(&spec.name) {
                    issues.push(ValidationIssue::MissingParameter {
                        kind: kind.to_string(),
                        name: instance.name.clone(),
                        parameter: spec.name.clone(),
                    });
                }
            }
            for parameter in instance.parameters.keys() {
                if schema.parameter(parameter).is_none_or(|p| p.is_derived()) {
                    issues.push(ValidationIssue::UnexpectedParameter {
                        kind: kind.to_string(),
                        name: instance.name.clone(),
                        parameter: parameter.clone(),
                    });
                }
            }
        }

        for (species, count) in counts {
            if count > 1 {
                issues.push(ValidationIssue::DuplicateKey {
                    kind: kind.to_string(),
                    species,
                    count,
                });
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bead::BeadType;
    use crate::core::models::ids::BeadTypeId;
    use crate::core::models::parameter::{Parameter, ParameterPatch};
    use slotmap::SlotMap;

    fn ids() -> (BeadTypeId, BeadTypeId) {
        let mut sm: SlotMap<BeadTypeId, ()> = SlotMap::with_key();
        (sm.insert(()), sm.insert(()))
    }

    fn bond(name: &str, source: usize, k: Parameter, explicit: &[(&str, ParameterPatch)]) -> PotentialInstance {
        let (a, b) = ids();
        let mut p = PotentialInstance::new("harmonic_bond", name, vec![a, b]);
        p.source = source;
        p.parameters.insert("K".into(), k);
        p.parameters.insert("r0".into(), Parameter::free(0.0));
        for (param, patch) in explicit {
            p.explicit.insert(param.to_string(), *patch);
        }
        p
    }

    fn key() -> Vec<String> {
        vec!["A".into(), "B".into()]
    }

    #[test]
    fn first_definition_is_inserted() {
        let mut table = DefinitionTable::new();
        let outcome = table
            .insert(bond("b1", 0, Parameter::free(1.0), &[]), key(), ConflictPolicy::Error)
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);
        assert_eq!(table.definition_count(), 1);
    }

    #[test]
    fn error_policy_rejects_identical_repeats() {
        let mut table = DefinitionTable::new();
        table
            .insert(bond("b1", 0, Parameter::free(1.0), &[]), key(), ConflictPolicy::Error)
            .unwrap();
        let err = table
            .insert(bond("b2", 1, Parameter::free(1.0), &[]), key(), ConflictPolicy::Error)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateDefinition {
                kind: "harmonic_bond".into(),
                species: key(),
                first: "'b1' (entry 0)".into(),
                second: "'b2' (entry 1)".into(),
            }
        );
    }

    #[test]
    fn error_policy_rejects_conflicts() {
        let mut table = DefinitionTable::new();
        table
            .insert(bond("b1", 0, Parameter::free(1.0), &[]), key(), ConflictPolicy::Error)
            .unwrap();
        assert!(matches!(
            table.insert(bond("b2", 1, Parameter::free(2.0), &[]), key(), ConflictPolicy::Error),
            Err(ValidationError::ConflictingDefinition { .. })
        ));
    }

    #[test]
    fn identical_repeats_keep_the_first_definition() {
        let mut table = DefinitionTable::new();
        table
            .insert(bond("b1", 0, Parameter::free(1.0), &[]), key(), ConflictPolicy::Override)
            .unwrap();
        let outcome = table
            .insert(bond("b2", 1, Parameter::free(1.0), &[]), key(), ConflictPolicy::Override)
            .unwrap();
        assert_eq!(outcome, InsertOutcome::KeptFirst);
        assert_eq!(table.into_instances()["harmonic_bond"][0].name, "b1");
    }

    #[test]
    fn override_policy_replaces_in_place() {
        let mut table = DefinitionTable::new();
        table
            .insert(bond("b1", 0, Parameter::free(1.0), &[]), key(), ConflictPolicy::Override)
            .unwrap();
        let other_key = vec!["A".to_string(), "A".to_string()];
        table
            .insert(bond("aa", 1, Parameter::free(5.0), &[]), other_key, ConflictPolicy::Override)
            .unwrap();
        let outcome = table
            .insert(bond("b2", 2, Parameter::fixed(2.0), &[]), key(), ConflictPolicy::Override)
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Replaced);

        let instances = table.into_instances();
        let bonds = &instances["harmonic_bond"];
        assert_eq!(bonds.len(), 2);
        assert_eq!(bonds[0].name, "b2");
        assert_eq!(bonds[0].parameters["K"], Parameter::fixed(2.0));
        assert_eq!(bonds[1].name, "aa");
    }

    #[test]
    fn layer_policy_applies_explicit_fields_only() {
        let mut table = DefinitionTable::new();
        table
            .insert(
                bond("b1", 0, Parameter::free(3.0), &[("K", ParameterPatch::with_value(3.0))]),
                key(),
                ConflictPolicy::Layer,
            )
            .unwrap();
        let outcome = table
            .insert(
                bond("b2", 1, Parameter::fixed(1.0), &[("K", ParameterPatch::with_fixed(true))]),
                key(),
                ConflictPolicy::Layer,
            )
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Layered);

        let instances = table.into_instances();
        let layered = &instances["harmonic_bond"][0];
        assert_eq!(layered.name, "b1");
        assert_eq!(layered.parameters["K"], Parameter::fixed(3.0));
    }

    #[test]
    fn tally_counts_each_outcome() {
        let mut tally = ResolutionTally::default();
        for outcome in [
            InsertOutcome::Inserted,
            InsertOutcome::Inserted,
            InsertOutcome::KeptFirst,
            InsertOutcome::Replaced,
        ] {
            tally.record(outcome);
        }
        assert_eq!(tally.instances(), 4);
        assert!(tally.has_repeats());
        assert_eq!(tally.to_string(), "2 new, 1 kept, 1 replaced, 0 layered");

        let mut total = ResolutionTally::default();
        assert!(!total.has_repeats());
        total.add(&tally);
        total.record(InsertOutcome::Layered);
        assert_eq!(total.layered, 1);
        assert_eq!(total.instances(), 5);
    }

    #[test]
    fn errors_expose_the_shared_key() {
        let mut table = DefinitionTable::new();
        table
            .insert(bond("b1", 0, Parameter::free(1.0), &[]), key(), ConflictPolicy::Error)
            .unwrap();
        let err = table
            .insert(bond("b2", 1, Parameter::free(1.0), &[]), key(), ConflictPolicy::Error)
            .unwrap_err();
        assert_eq!(err.species(), key().as_slice());
        assert_eq!(table.definition_count(), 1);
    }

    #[test]
    fn validate_reports_duplicates_and_missing_parameters() {
        let registry = SchemaRegistry::with_builtins();
        let schema = registry.get("gaussian").unwrap();
        let mut ff = ForceField::new();
        let a = ff.add_bead_type(BeadType::new("A")).unwrap();
        let b = ff.add_bead_type(BeadType::new("B")).unwrap();

        let mut p1 = PotentialInstance::new("gaussian", "g1", vec![a, b]);
        p1.parameters.insert("excl_vol".into(), Parameter::free(1.0));
        let mut p2 = PotentialInstance::new("gaussian", "g2", vec![b, a]);
        p2.parameters.insert("B".into(), Parameter::free(1.0));
        ff.add_potential(p1, schema).unwrap();
        ff.add_potential(p2, schema).unwrap();

        let issues = validate(&ff, &registry);
        assert!(issues.contains(&ValidationIssue::DuplicateKey {
            kind: "gaussian".into(),
            species: vec!["A".into(), "B".into()],
            count: 2,
        }));
        assert!(issues.contains(&ValidationIssue::MissingParameter {
            kind: "gaussian".into(),
            name: "g2".into(),
            parameter: "excl_vol".into(),
        }));
        assert!(issues.contains(&ValidationIssue::UnexpectedParameter {
            kind: "gaussian".into(),
            name: "g2".into(),
            parameter: "B".into(),
        }));
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn validate_accepts_consistent_force_field() {
        let registry = SchemaRegistry::with_builtins();
        let mut ff = ForceField::new();
        let a = ff.add_bead_type(BeadType::new("A")).unwrap();
        let mut p = PotentialInstance::new("gaussian", "g", vec![a, a]);
        p.parameters = registry.get("gaussian").unwrap().default_parameters();
        ff.add_potential(p, registry.get("gaussian").unwrap()).unwrap();
        assert!(validate(&ff, &registry).is_empty());
    }
}
