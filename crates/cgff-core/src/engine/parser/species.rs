use super::error::{ParseError, index_context};
use super::tokens::{scalar_text, split_species};
use crate::core::utils::identifiers::is_valid_bead_name;
use serde_yaml::Value;

/// Reads one species slot: a single bead name or a group such as `B;C`.
///
/// Repeated names are dropped, keeping the first occurrence.
pub fn parse_species_slot(value: &Value, context: &str) -> Result<Vec<String>, ParseError> {
    let mut names: Vec<String> = Vec::new();
    match value {
        Value::Sequence(seq) => {
            for (i, element) in seq.iter().enumerate() {
                let text = scalar_text(element).ok_or_else(|| {
                    ParseError::unexpected_type(&index_context(context, i), "a bead name", element)
                })?;
                names.extend(split_species(&text).into_iter().map(str::to_string));
            }
        }
        other => {
            let text = scalar_text(other)
                .ok_or_else(|| ParseError::unexpected_type(context, "a species slot", other))?;
            names.extend(split_species(&text).into_iter().map(str::to_string));
        }
    }

    if names.is_empty() {
        return Err(ParseError::EmptySpecies {
            context: context.to_string(),
        });
    }
    if let Some(bad) = names.iter().find(|n| !is_valid_bead_name(n)) {
        return Err(ParseError::InvalidBeadName {
            context: context.to_string(),
            name: bad.clone(),
        });
    }

    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    Ok(unique)
}
