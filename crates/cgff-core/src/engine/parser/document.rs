use super::bead::parse_bead_type;
use super::entry::{Field, ParsedEntry, mapping_key, number_value, parse_parameter_entry, parse_patch};
use super::error::{ParseError, index_context, key_context};
use super::potential::{RawPotentialEntry, parse_potential_entry};
use crate::core::models::bead::BeadType;
use crate::core::models::parameter::ParameterPatch;
use crate::core::schema::registry::{PotentialSchema, SchemaRegistry};
use crate::engine::config::ConflictPolicy;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// A force-field document after shorthand parsing.
///
/// Potential kinds are keyed by their canonical schema name, so `HarmonicBond` and
/// `harmonic_bond` entries end up in the same list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawForceField {
    pub kt: Option<f64>,
    pub bead_types: Vec<BeadType>,
    pub defaults: IndexMap<String, IndexMap<String, ParameterPatch>>,
    pub potentials: IndexMap<String, Vec<RawPotentialEntry>>,
    pub policy: Option<ConflictPolicy>,
}

impl RawForceField {
    pub fn entry_count(&self) -> usize {
        self.potentials.values().map(Vec::len).sum()
    }
}

/// Parses a whole force-field document.
///
/// The top level is a mapping with the keys `kT`, `bead_types`, `defaults`,
/// `potentials` and `policy`, all optional. An empty document yields an empty force
/// field.
pub fn parse_document(value: &Value, registry: &SchemaRegistry) -> Result<RawForceField, ParseError> {
    let mut raw = RawForceField::default();
    let map = match value {
        Value::Null => return Ok(raw),
        Value::Mapping(map) => map,
        other => return Err(ParseError::unexpected_type("", "a mapping", other)),
    };

    for (key, value) in map {
        let key = mapping_key(key, "")?;
        match key.as_str() {
            "kT" | "kt" => raw.kt = Some(number_value(value, &key)?),
            "bead_types" => raw.bead_types = parse_bead_types(value)?,
            "defaults" => parse_defaults(value, registry, &mut raw.defaults)?,
            "potentials" => parse_potentials(value, registry, &mut raw.potentials)?,
            "policy" => raw.policy = Some(parse_policy(value)?),
            _ => {
                return Err(ParseError::UnknownKey {
                    context: "<document>".to_string(),
                    key,
                });
            }
        }
    }

    debug!(
        "Parsed document: {} bead types, {} potential kinds, {} entries.",
        raw.bead_types.len(),
        raw.potentials.len(),
        raw.entry_count()
    );
    Ok(raw)
}

fn parse_bead_types(value: &Value) -> Result<Vec<BeadType>, ParseError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(seq) => seq
            .iter()
            .enumerate()
            .map(|(i, v)| parse_bead_type(v, &index_context("bead_types", i)))
            .collect(),
        other => Err(ParseError::unexpected_type(
            "bead_types",
            "a sequence",
            other,
        )),
    }
}

fn resolve_schema<'r>(
    registry: &'r SchemaRegistry,
    name: &str,
    context: &str,
) -> Result<&'r PotentialSchema, ParseError> {
    registry
        .get(name)
        .ok_or_else(|| ParseError::UnknownPotential {
            context: context.to_string(),
            name: name.to_string(),
        })
}

fn potential_mapping<'v>(value: &'v Value, context: &str) -> Result<Option<&'v Mapping>, ParseError> {
    match value {
        Value::Null => Ok(None),
        Value::Mapping(map) => Ok(Some(map)),
        other => Err(ParseError::unexpected_type(context, "a mapping", other)),
    }
}

fn parse_defaults(
    value: &Value,
    registry: &SchemaRegistry,
    defaults: &mut IndexMap<String, IndexMap<String, ParameterPatch>>,
) -> Result<(), ParseError> {
    let Some(map) = potential_mapping(value, "defaults")? else {
        return Ok(());
    };
    for (key, value) in map {
        let key = mapping_key(key, "defaults")?;
        let ctx = key_context("defaults", &key);
        let schema = resolve_schema(registry, &key, &ctx)?;
        let parsed = parse_default_fields(value, &ctx)?;

        let merged = defaults.entry(schema.name.clone()).or_default();
        for (param, patch) in parsed {
            merged.entry(param).or_default().merge(&patch);
        }
    }
    Ok(())
}

/// Reads the defaults of one potential kind: a mapping of parameter to value, or
/// shorthand `param;value;flag` fields as a string or sequence.
fn parse_default_fields(
    value: &Value,
    context: &str,
) -> Result<IndexMap<String, ParameterPatch>, ParseError> {
    let mut fields: Vec<(String, Field)> = Vec::new();
    match value {
        Value::Null => {}
        Value::Mapping(map) => {
            for (key, value) in map {
                let key = mapping_key(key, context)?;
                let patch = parse_patch(value, &key_context(context, &key))?;
                fields.push((key, Field::Parameter(patch)));
            }
        }
        Value::String(s) => {
            for piece in s.split_whitespace() {
                fields.extend(expect_fields(
                    parse_parameter_entry(&Value::String(piece.to_string()), context)?,
                    context,
                )?);
            }
        }
        Value::Sequence(seq) => {
            for (i, element) in seq.iter().enumerate() {
                let ctx = index_context(context, i);
                fields.extend(expect_fields(parse_parameter_entry(element, &ctx)?, &ctx)?);
            }
        }
        other => {
            return Err(ParseError::unexpected_type(
                context,
                "parameter defaults",
                other,
            ));
        }
    }

    let mut patches = IndexMap::with_capacity(fields.len());
    for (key, field) in fields {
        match field {
            Field::Name(_) => {
                return Err(ParseError::invalid_entry(
                    context,
                    "defaults cannot set a name",
                ));
            }
            Field::Parameter(patch) => {
                if patches.insert(key.clone(), patch).is_some() {
                    return Err(ParseError::DuplicateField {
                        context: context.to_string(),
                        field: key,
                    });
                }
            }
        }
    }
    Ok(patches)
}

fn expect_fields(parsed: ParsedEntry, context: &str) -> Result<Vec<(String, Field)>, ParseError> {
    match parsed {
        ParsedEntry::Fields(fields) => Ok(fields),
        ParsedEntry::Identifier(ident) => Err(ParseError::invalid_entry(
            context,
            format!("parameter '{}' has no value or flag", ident),
        )),
        ParsedEntry::Patch(_) => Err(ParseError::invalid_entry(
            context,
            "value given without a parameter name",
        )),
    }
}

fn parse_potentials(
    value: &Value,
    registry: &SchemaRegistry,
    potentials: &mut IndexMap<String, Vec<RawPotentialEntry>>,
) -> Result<(), ParseError> {
    let Some(map) = potential_mapping(value, "potentials")? else {
        return Ok(());
    };
    for (key, value) in map {
        let key = mapping_key(key, "potentials")?;
        let ctx = key_context("potentials", &key);
        let schema = resolve_schema(registry, &key, &ctx)?;

        let entries = potentials.entry(schema.name.clone()).or_default();
        match value {
            Value::Null => {}
            Value::Sequence(seq) => {
                for (i, element) in seq.iter().enumerate() {
                    entries.push(parse_potential_entry(
                        element,
                        schema,
                        &index_context(&ctx, i),
                    )?);
                }
            }
            single => entries.push(parse_potential_entry(single, schema, &ctx)?),
        }
    }
    Ok(())
}

fn parse_policy(value: &Value) -> Result<ConflictPolicy, ParseError> {
    match value {
        Value::String(s) => s.parse().map_err(|_| ParseError::UnknownPolicy {
            context: "policy".to_string(),
            value: s.clone(),
        }),
        other => Err(ParseError::unexpected_type("policy", "a string", other)),
    }
}
