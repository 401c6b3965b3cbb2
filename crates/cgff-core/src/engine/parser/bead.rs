use super::entry::{mapping_key, number_value};
use super::error::{ParseError, index_context, key_context};
use super::tokens::{parse_number, scalar_text, split_tokens};
use crate::core::models::bead::BeadType;
use serde_yaml::{Mapping, Value};

const FIELD_NAMES: [&str; 3] = ["name", "smear_length", "charge"];

/// Reads a bead type from `"A"`, `"A 0.5 -1.0"`, `[A, 0.5, -1.0]` or a
/// `{name, smear_length, charge}` mapping.
///
/// Names follow the same scalar rules as species slots, so `1` and `"1"` declare the
/// same bead type. Property values are not range-checked here; the force field does
/// that when the bead type is declared.
pub fn parse_bead_type(value: &Value, context: &str) -> Result<BeadType, ParseError> {
    match value {
        Value::String(s) => {
            let fields: Vec<String> = split_tokens(s).into_iter().map(str::to_string).collect();
            from_fields(&fields, context)
        }
        Value::Sequence(seq) => {
            let mut fields = Vec::with_capacity(seq.len());
            for (i, element) in seq.iter().enumerate() {
                fields.push(scalar_text(element).ok_or_else(|| {
                    ParseError::unexpected_type(&index_context(context, i), "a scalar", element)
                })?);
            }
            from_fields(&fields, context)
        }
        Value::Mapping(map) => from_mapping(map, context),
        other => match scalar_text(other) {
            Some(name) => from_fields(&[name], context),
            None => Err(ParseError::unexpected_type(context, "a bead type", other)),
        },
    }
}

fn from_mapping(map: &Mapping, context: &str) -> Result<BeadType, ParseError> {
    let mut name = None;
    let mut smear_length = None;
    let mut charge = None;
    for (key, value) in map {
        let key = mapping_key(key, context)?;
        let ctx = key_context(context, &key);
        match key.as_str() {
            "name" => {
                name = Some(
                    scalar_text(value)
                        .ok_or_else(|| ParseError::unexpected_type(&ctx, "a name", value))?,
                );
            }
            "smear_length" => smear_length = Some(number_value(value, &ctx)?),
            "charge" => charge = Some(number_value(value, &ctx)?),
            _ => {
                return Err(ParseError::invalid_entry(
                    context,
                    format!(
                        "unknown bead type field '{}' (expected {})",
                        key,
                        FIELD_NAMES.join(", ")
                    ),
                ));
            }
        }
    }

    let name = name.ok_or_else(|| ParseError::MissingKey {
        context: context.to_string(),
        key: "name",
    })?;
    let mut bead = BeadType::new(name);
    if let Some(smear_length) = smear_length {
        bead.smear_length = smear_length;
    }
    if let Some(charge) = charge {
        bead.charge = charge;
    }
    Ok(bead)
}

fn from_fields(fields: &[String], context: &str) -> Result<BeadType, ParseError> {
    let Some(name) = fields.first() else {
        return Err(ParseError::invalid_entry(context, "empty bead type"));
    };
    if fields.len() > FIELD_NAMES.len() {
        return Err(ParseError::invalid_entry(
            context,
            format!(
                "bead type takes at most {} fields ({}), found {}",
                FIELD_NAMES.len(),
                FIELD_NAMES.join(", "),
                fields.len()
            ),
        ));
    }

    let mut bead = BeadType::new(name.clone());
    let number = |raw: &String| {
        parse_number(raw).ok_or_else(|| ParseError::InvalidNumber {
            context: context.to_string(),
            value: raw.clone(),
        })
    };
    if let Some(raw) = fields.get(1) {
        bead.smear_length = number(raw)?;
    }
    if let Some(raw) = fields.get(2) {
        bead.charge = number(raw)?;
    }
    Ok(bead)
}
