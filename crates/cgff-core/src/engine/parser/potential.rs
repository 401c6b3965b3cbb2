use super::entry::{Field, ParsedEntry, mapping_key, parse_parameter_entry, parse_patch};
use super::error::{ParseError, index_context, key_context};
use super::species::parse_species_slot;
use super::tokens::scalar_text;
use crate::core::models::filter::SpeciesFilter;
use crate::core::models::parameter::ParameterPatch;
use crate::core::schema::registry::PotentialSchema;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

/// A potential entry as written, before defaults are layered and groups expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPotentialEntry {
    /// Explicit name; instances are auto-named when absent.
    pub name: Option<String>,
    pub filter: SpeciesFilter,
    /// Parameter fields in the order they were written.
    pub patches: IndexMap<String, ParameterPatch>,
    /// Location of the entry in the document.
    pub context: String,
}

impl RawPotentialEntry {
    fn new(filter: SpeciesFilter, context: &str) -> Self {
        Self {
            name: None,
            filter,
            patches: IndexMap::new(),
            context: context.to_string(),
        }
    }

    fn add_field(&mut self, key: String, field: Field) -> Result<(), ParseError> {
        match field {
            Field::Name(name) => {
                if self.name.is_some() {
                    return Err(ParseError::DuplicateField {
                        context: self.context.clone(),
                        field: key,
                    });
                }
                self.name = Some(name);
            }
            Field::Parameter(patch) => {
                if self.patches.contains_key(&key) {
                    return Err(ParseError::DuplicateField {
                        context: self.context.clone(),
                        field: key,
                    });
                }
                self.patches.insert(key, patch);
            }
        }
        Ok(())
    }
}

/// Reads one potential entry.
///
/// Accepted forms, for a pair potential:
///
/// ```text
/// "A B;C excl_vol;1.0;fixed"
/// [A, [B, C], "excl_vol 1.0 fixed", name;AB]
/// [A, B, {excl_vol: {value: 1.0, fixed: true}}]
/// {species: "A B;C", name: AB, excl_vol: "1.0 fixed"}
/// ```
pub fn parse_potential_entry(
    value: &Value,
    schema: &PotentialSchema,
    context: &str,
) -> Result<RawPotentialEntry, ParseError> {
    match value {
        Value::String(s) => {
            let elements: Vec<Value> = s
                .split_whitespace()
                .map(|t| Value::String(t.to_string()))
                .collect();
            parse_sequence_entry(&elements, schema, context)
        }
        Value::Sequence(seq) => parse_sequence_entry(seq, schema, context),
        Value::Mapping(map) => parse_mapping_entry(map, schema, context),
        other => Err(ParseError::unexpected_type(
            context,
            "a potential entry",
            other,
        )),
    }
}

fn arity_mismatch(schema: &PotentialSchema, found: usize, context: &str) -> ParseError {
    ParseError::ArityMismatch {
        context: context.to_string(),
        kind: schema.name.clone(),
        expected: schema.arity,
        found,
    }
}

fn parse_sequence_entry(
    elements: &[Value],
    schema: &PotentialSchema,
    context: &str,
) -> Result<RawPotentialEntry, ParseError> {
    if elements.len() < schema.arity {
        return Err(arity_mismatch(schema, elements.len(), context));
    }
    let (species, fields) = elements.split_at(schema.arity);

    let mut slots = Vec::with_capacity(schema.arity);
    for (i, slot) in species.iter().enumerate() {
        slots.push(parse_species_slot(slot, &index_context(context, i))?);
    }
    let mut entry = RawPotentialEntry::new(SpeciesFilter::new(slots, schema.ordering), context);

    for (i, element) in fields.iter().enumerate() {
        let ctx = index_context(context, schema.arity + i);
        match parse_parameter_entry(element, &ctx)? {
            ParsedEntry::Fields(parsed) => {
                for (key, field) in parsed {
                    entry.add_field(key, field)?;
                }
            }
            ParsedEntry::Identifier(ident) => {
                return Err(ParseError::invalid_entry(
                    &ctx,
                    format!("parameter '{}' has no value or flag", ident),
                ));
            }
            ParsedEntry::Patch(_) => {
                return Err(ParseError::invalid_entry(
                    &ctx,
                    "value given without a parameter name",
                ));
            }
        }
    }
    Ok(entry)
}

fn parse_mapping_entry(
    map: &Mapping,
    schema: &PotentialSchema,
    context: &str,
) -> Result<RawPotentialEntry, ParseError> {
    let mut species = None;
    let mut rest = Vec::with_capacity(map.len());
    for (key, value) in map {
        let key = mapping_key(key, context)?;
        if key.eq_ignore_ascii_case("species") {
            species = Some(value);
        } else {
            rest.push((key, value));
        }
    }

    let species = species.ok_or_else(|| ParseError::MissingKey {
        context: context.to_string(),
        key: "species",
    })?;
    let species_ctx = key_context(context, "species");
    let slot_values: Vec<Value> = match species {
        Value::String(s) => s
            .split_whitespace()
            .map(|t| Value::String(t.to_string()))
            .collect(),
        Value::Sequence(seq) => seq.clone(),
        other => {
            return Err(ParseError::unexpected_type(
                &species_ctx,
                "a species list",
                other,
            ));
        }
    };
    if slot_values.len() != schema.arity {
        return Err(arity_mismatch(schema, slot_values.len(), &species_ctx));
    }
    let mut slots = Vec::with_capacity(schema.arity);
    for (i, slot) in slot_values.iter().enumerate() {
        slots.push(parse_species_slot(slot, &index_context(&species_ctx, i))?);
    }
    let mut entry = RawPotentialEntry::new(SpeciesFilter::new(slots, schema.ordering), context);

    for (key, value) in rest {
        let ctx = key_context(context, &key);
        let field = if key.eq_ignore_ascii_case("name") {
            let name = scalar_text(value)
                .ok_or_else(|| ParseError::unexpected_type(&ctx, "a name", value))?;
            Field::Name(name)
        } else {
            Field::Parameter(parse_patch(value, &ctx)?)
        };
        entry.add_field(key, field)?;
    }
    Ok(entry)
}
