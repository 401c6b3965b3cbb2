use super::config::{ConflictPolicy, NormalizeConfig};
use super::error::NormalizeError;
use super::parser::RawForceField;
use super::parser::potential::RawPotentialEntry;
use super::progress::{Progress, ProgressReporter};
use super::validator::{DefinitionTable, ResolutionTally, ValidationError};
use crate::core::models::bead::BeadType;
use crate::core::models::forcefield::ForceField;
use crate::core::models::ids::BeadTypeId;
use crate::core::models::parameter::ParameterPatch;
use crate::core::models::potential::{PotentialInstance, auto_name};
use crate::core::schema::registry::{PotentialSchema, SchemaRegistry};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Turns a parsed document into a fully explicit force field.
///
/// Parameters are layered field by field (schema default, then the document's
/// `defaults` for the kind, then the entry itself), species groups are expanded into
/// individual instances, and repeated definitions are resolved under the effective
/// [`ConflictPolicy`].
pub struct Normalizer<'a> {
    registry: &'a SchemaRegistry,
    config: &'a NormalizeConfig,
    reporter: Option<&'a ProgressReporter<'a>>,
}

impl<'a> Normalizer<'a> {
    pub fn new(registry: &'a SchemaRegistry, config: &'a NormalizeConfig) -> Self {
        Self {
            registry,
            config,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: &'a ProgressReporter<'a>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn report(&self, event: Progress) {
        if let Some(reporter) = self.reporter {
            reporter.report(event);
        }
    }

    pub fn normalize(&self, raw: RawForceField) -> Result<ForceField, NormalizeError> {
        let policy = self.config.effective_policy(raw.policy);
        let entry_count = raw.entry_count();
        info!(
            "Normalizing force field: {} bead types, {} potential entries, policy '{}'.",
            raw.bead_types.len(),
            entry_count,
            policy
        );
        let RawForceField {
            kt,
            bead_types,
            defaults,
            potentials,
            ..
        } = raw;

        let mut forcefield = ForceField::with_kt(kt.unwrap_or(self.config.default_kt))?;
        for (i, bead_type) in bead_types.into_iter().enumerate() {
            forcefield
                .add_bead_type(bead_type)
                .map_err(|source| NormalizeError::BeadType {
                    context: format!("bead_types[{}]", i),
                    source,
                })?;
        }
        self.report(Progress::BeadTypesDeclared {
            count: forcefield.bead_count(),
        });

        for (kind, patches) in &defaults {
            let schema = self.schema(kind, "defaults")?;
            check_patches(schema, patches, &format!("defaults.{}", kind))?;
        }

        let mut table = DefinitionTable::new();
        let mut total = ResolutionTally::default();
        for (kind, entries) in &potentials {
            let schema = self.schema(kind, "potentials")?;
            let kind_defaults = defaults.get(kind);
            self.report(Progress::KindStart {
                kind: schema.name.clone(),
                entries: entries.len(),
            });

            let mut kind_tally = ResolutionTally::default();
            for source in 0..entries.len() {
                let tally = self.expand_entry(
                    &mut forcefield,
                    &mut table,
                    schema,
                    kind_defaults,
                    entries,
                    source,
                    policy,
                )?;
                kind_tally.add(&tally);
                self.report(Progress::EntryResolved {
                    kind: schema.name.clone(),
                    entry: source,
                    tally,
                });
            }

            debug!("'{}' entries resolved: {}.", schema.name, kind_tally);
            total.add(&kind_tally);
            self.report(Progress::KindFinish {
                kind: schema.name.clone(),
                tally: kind_tally,
            });
        }
        if total.has_repeats() {
            info!(
                "Policy '{}' resolved {} instance(s) into {} definition(s): {}.",
                policy,
                total.instances(),
                table.definition_count(),
                total
            );
        }

        for (kind, instances) in table.into_instances() {
            let schema = self.schema(&kind, "potentials")?;
            for instance in instances {
                forcefield.add_potential(instance, schema)?;
            }
        }
        forcefield.refresh_derived(self.registry);

        info!(
            "Normalized force field: {} bead types, {} potential instances.",
            forcefield.bead_count(),
            forcefield.potential_count()
        );
        Ok(forcefield)
    }

    fn schema(&self, kind: &str, context: &str) -> Result<&'a PotentialSchema, NormalizeError> {
        self.registry
            .get(kind)
            .ok_or_else(|| NormalizeError::UnknownPotential {
                context: context.to_string(),
                kind: kind.to_string(),
            })
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_entry(
        &self,
        forcefield: &mut ForceField,
        table: &mut DefinitionTable,
        schema: &PotentialSchema,
        kind_defaults: Option<&IndexMap<String, ParameterPatch>>,
        entries: &[RawPotentialEntry],
        source: usize,
        policy: ConflictPolicy,
    ) -> Result<ResolutionTally, NormalizeError> {
        let entry = &entries[source];
        check_patches(schema, &entry.patches, &entry.context)?;

        let mut parameters = schema.default_parameters();
        for (name, parameter) in parameters.iter_mut() {
            if let Some(patch) = kind_defaults.and_then(|d| d.get(name)) {
                parameter.apply(patch);
            }
            if let Some(patch) = entry.patches.get(name) {
                parameter.apply(patch);
            }
        }

        let combinations = entry.filter.expand();
        if entry.filter.is_grouped() {
            debug!(
                "{}: group '{}' expands to {} instance(s).",
                entry.context,
                entry.filter.label(),
                combinations.len()
            );
        }

        let mut tally = ResolutionTally::default();
        for combination in &combinations {
            let mut beads = Vec::with_capacity(combination.len());
            for name in combination {
                beads.push(self.resolve_bead(forcefield, name, &entry.context)?);
            }

            let (name, auto_named) = match &entry.name {
                Some(name) => (name.clone(), false),
                None => (auto_name(&schema.name, combination), true),
            };
            let mut instance = PotentialInstance::new(schema.name.clone(), name, beads);
            instance.auto_named = auto_named;
            instance.parameters = parameters.clone();
            instance.explicit = entry.patches.clone();
            instance.source = source;

            let key = schema.ordering.canonical(combination);
            match table.insert(instance, key, policy) {
                Ok(outcome) => tally.record(outcome),
                Err(error) => return Err(repeated_definition(&entries[..source], entry, error)),
            }
        }
        Ok(tally)
    }

    fn resolve_bead(
        &self,
        forcefield: &mut ForceField,
        name: &str,
        context: &str,
    ) -> Result<BeadTypeId, NormalizeError> {
        if let Some(id) = forcefield.bead_id(name) {
            return Ok(id);
        }
        if !self.config.implicit_bead_types {
            return Err(NormalizeError::UnknownBeadType {
                context: context.to_string(),
                name: name.to_string(),
            });
        }
        warn!(
            "{}: bead type '{}' is not declared; adding it with default properties.",
            context, name
        );
        forcefield
            .add_bead_type(BeadType::new(name))
            .map_err(|source| NormalizeError::BeadType {
                context: context.to_string(),
                source,
            })
    }
}

/// Rejects parameters the schema does not declare or computes itself.
fn check_patches(
    schema: &PotentialSchema,
    patches: &IndexMap<String, ParameterPatch>,
    context: &str,
) -> Result<(), NormalizeError> {
    for name in patches.keys() {
        match schema.parameter(name) {
            None => {
                return Err(NormalizeError::UnknownParameter {
                    context: context.to_string(),
                    kind: schema.name.clone(),
                    parameter: name.clone(),
                });
            }
            Some(spec) if spec.is_derived() => {
                return Err(NormalizeError::DerivedParameter {
                    context: context.to_string(),
                    kind: schema.name.clone(),
                    parameter: name.clone(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Names the earlier entry that first produced the rejected key, and how many
/// interactions the two entries have in common.
fn repeated_definition(
    earlier: &[RawPotentialEntry],
    entry: &RawPotentialEntry,
    error: ValidationError,
) -> NormalizeError {
    let first = earlier
        .iter()
        .find(|e| e.filter.matches(error.species()))
        .map(|e| &e.filter)
        .unwrap_or(&entry.filter);
    NormalizeError::Validation {
        context: entry.context.clone(),
        first_entry: first.label(),
        second_entry: entry.filter.label(),
        shared: first.overlap(&entry.filter).len(),
        source: error,
    }
}

/// Normalizes a parsed document without progress reporting.
pub fn normalize(
    raw: RawForceField,
    registry: &SchemaRegistry,
    config: &NormalizeConfig,
) -> Result<ForceField, NormalizeError> {
    Normalizer::new(registry, config).normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::filter::SpeciesOrdering;
    use crate::core::models::parameter::Parameter;
    use crate::engine::config::NormalizeConfigBuilder;
    use crate::engine::parser::parse_document;
    use std::sync::Mutex;

    fn run(text: &str, config: &NormalizeConfig) -> Result<ForceField, NormalizeError> {
        let registry = SchemaRegistry::with_builtins();
        let raw = parse_document(&serde_yaml::from_str(text).unwrap(), &registry).unwrap();
        normalize(raw, &registry, config)
    }

    fn run_default(text: &str) -> Result<ForceField, NormalizeError> {
        run(text, &NormalizeConfig::default())
    }

    fn param(ff: &ForceField, kind: &str, species: &[&str], name: &str) -> Parameter {
        *ff.find_potential(kind, species, SpeciesOrdering::Unordered)
            .unwrap()
            .parameter(name)
            .unwrap()
    }

    #[test]
    fn defaults_layer_field_by_field() {
        let ff = run_default(
            r#"
bead_types: [A, B]
defaults:
  gaussian: {excl_vol: [2.0, fixed]}
potentials:
  gaussian:
    - A A
    - A B excl_vol;free
    - B B excl_vol;3.0
"#,
        )
        .unwrap();
        assert_eq!(param(&ff, "gaussian", &["A", "A"], "excl_vol"), Parameter::fixed(2.0));
        assert_eq!(param(&ff, "gaussian", &["A", "B"], "excl_vol"), Parameter::free(2.0));
        assert_eq!(param(&ff, "gaussian", &["B", "B"], "excl_vol"), Parameter::fixed(3.0));
    }

    #[test]
    fn groups_expand_into_individual_instances() {
        let ff = run_default(
            r#"
bead_types: [A, B, C]
potentials:
  gaussian: "A;B C"
"#,
        )
        .unwrap();
        let names: Vec<_> = ff
            .potentials_of("gaussian")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["gaussian_A_C", "gaussian_B_C"]);
        assert!(ff.potentials().all(|p| p.auto_named));
    }

    #[test]
    fn symmetric_group_expands_to_unique_pairs() {
        let ff = run_default(
            r#"
bead_types: [A, B]
potentials:
  gaussian: "A;B A;B"
"#,
        )
        .unwrap();
        assert_eq!(ff.potential_count(), 3);
    }

    #[test]
    fn explicit_name_is_kept() {
        let ff = run_default(
            r#"
bead_types: [A]
potentials:
  harmonic_bond: "A A name;backbone K;5.0"
"#,
        )
        .unwrap();
        let p = &ff.potentials_of("harmonic_bond")[0];
        assert_eq!(p.name, "backbone");
        assert!(!p.auto_named);
        assert_eq!(p.value("K"), Some(5.0));
        assert_eq!(p.value("r0"), Some(0.0));
    }

    #[test]
    fn unknown_bead_types_are_rejected_unless_implicit() {
        let doc = "bead_types: [A]\npotentials:\n  gaussian: A Z\n";
        assert!(matches!(
            run_default(doc),
            Err(NormalizeError::UnknownBeadType { name, .. }) if name == "Z"
        ));

        let config = NormalizeConfigBuilder::new()
            .implicit_bead_types(true)
            .build()
            .unwrap();
        let ff = run(doc, &config).unwrap();
        assert_eq!(ff.bead_names(), vec!["A", "Z"]);
        assert_eq!(ff.get_bead_type("Z").unwrap(), &BeadType::new("Z"));
    }

    #[test]
    fn unknown_and_derived_parameters_are_rejected() {
        assert!(matches!(
            run_default("bead_types: [A]\npotentials:\n  gaussian: A A sigma;1.0\n"),
            Err(NormalizeError::UnknownParameter { parameter, .. }) if parameter == "sigma"
        ));
        assert!(matches!(
            run_default("bead_types: [A]\npotentials:\n  gaussian: A A Kappa;1.0\n"),
            Err(NormalizeError::DerivedParameter { parameter, .. }) if parameter == "Kappa"
        ));
        assert!(matches!(
            run_default("defaults:\n  gaussian: {B: 1.0}\n"),
            Err(NormalizeError::DerivedParameter { .. })
        ));
    }

    #[test]
    fn duplicate_bead_types_are_rejected() {
        assert!(matches!(
            run_default("bead_types: [A, A]"),
            Err(NormalizeError::BeadType { context, .. }) if context == "bead_types[1]"
        ));
    }

    #[test]
    fn kt_falls_back_to_config_default() {
        let config = NormalizeConfigBuilder::new().default_kt(2.5).build().unwrap();
        assert_eq!(run("bead_types: [A]", &config).unwrap().kt(), 2.5);
        assert_eq!(run("kT: 4.0", &config).unwrap().kt(), 4.0);
        assert!(matches!(
            run_default("kT: -1.0"),
            Err(NormalizeError::ForceField { .. })
        ));
    }

    #[test]
    fn document_policy_applies_unless_config_overrides_it() {
        let doc = r#"
policy: error
bead_types: [A, B]
potentials:
  gaussian:
    - A B excl_vol;1.0
    - B A excl_vol;2.0
"#;
        assert!(matches!(
            run_default(doc),
            Err(NormalizeError::Validation {
                source: ValidationError::ConflictingDefinition { .. },
                ..
            })
        ));

        let config = NormalizeConfigBuilder::new()
            .policy(ConflictPolicy::Override)
            .build()
            .unwrap();
        let ff = run(doc, &config).unwrap();
        assert_eq!(ff.potential_count(), 1);
        assert_eq!(param(&ff, "gaussian", &["A", "B"], "excl_vol").value, 2.0);
    }

    #[test]
    fn derived_parameters_are_computed() {
        let ff = run_default(
            r#"
bead_types: ["A 1.0", "B 2.0"]
potentials:
  gaussian: A B excl_vol;1.0
  harmonic_bond_no_offset: A B b;0.5;fixed
"#,
        )
        .unwrap();
        let kappa = param(&ff, "gaussian", &["A", "B"], "Kappa");
        assert!((kappa.value - 0.1).abs() < 1e-12);
        assert!(kappa.fixed);
        let k = param(&ff, "harmonic_bond_no_offset", &["A", "B"], "K");
        assert!((k.value - 6.0).abs() < 1e-12);
        assert!(k.fixed);
    }

    #[test]
    fn conflicts_name_the_overlapping_entries() {
        let doc = r#"
policy: error
bead_types: [A, B, C]
potentials:
  gaussian:
    - C C
    - A;B A;C
    - B;C A excl_vol;2.0
"#;
        match run_default(doc) {
            Err(NormalizeError::Validation {
                context,
                first_entry,
                second_entry,
                shared,
                source,
            }) => {
                assert_eq!(context, "potentials.gaussian[2]");
                assert_eq!(first_entry, "A;B_A;C");
                assert_eq!(second_entry, "B;C_A");
                assert_eq!(shared, 2);
                assert_eq!(source.species(), ["A", "B"]);
            }
            other => panic!("expected a conflict, got {:?}", other),
        }
    }

    fn events(doc: &str, policy: ConflictPolicy) -> Vec<Progress> {
        let registry = SchemaRegistry::with_builtins();
        let raw = parse_document(&serde_yaml::from_str(doc).unwrap(), &registry).unwrap();
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
            seen.lock().unwrap().push(event);
        }));
        let config = NormalizeConfigBuilder::new().policy(policy).build().unwrap();
        Normalizer::new(&registry, &config)
            .with_reporter(&reporter)
            .normalize(raw)
            .unwrap();
        drop(reporter);
        seen.into_inner().unwrap()
    }

    #[test]
    fn progress_reports_each_kind_and_entry() {
        let seen = events(
            "bead_types: [A, B]\npotentials:\n  gaussian: [A;B A;B, A B]\n  bond: A B\n",
            ConflictPolicy::Override,
        );
        let kinds: Vec<String> = seen
            .iter()
            .filter_map(|e| match e {
                Progress::KindStart { kind, entries } => Some(format!("{}:{}", kind, entries)),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec!["gaussian:2", "harmonic_bond:1"]);
        assert_eq!(seen[0], Progress::BeadTypesDeclared { count: 2 });

        let per_entry: Vec<usize> = seen
            .iter()
            .filter_map(|e| match e {
                Progress::EntryResolved { tally, .. } => Some(tally.instances()),
                _ => None,
            })
            .collect();
        assert_eq!(per_entry, vec![3, 1, 1]);
    }

    #[test]
    fn progress_tallies_policy_outcomes() {
        let doc = r#"
bead_types: [A, B]
potentials:
  gaussian:
    - A;B A;B excl_vol;1.0
    - A B excl_vol;2.0
    - B B excl_vol;1.0
"#;
        let finish = |policy| {
            events(doc, policy)
                .into_iter()
                .find_map(|e| match e {
                    Progress::KindFinish { tally, .. } => Some(tally),
                    _ => None,
                })
                .unwrap()
        };

        let overridden = finish(ConflictPolicy::Override);
        assert_eq!(overridden.inserted, 3);
        assert_eq!(overridden.replaced, 1);
        assert_eq!(overridden.kept, 1);

        let layered = finish(ConflictPolicy::Layer);
        assert_eq!(layered.layered, 1);
        assert_eq!(layered.replaced, 0);
        assert_eq!(layered.instances(), 5);
    }
}
