use super::error::{ParseError, index_context, key_context};
use super::tokens::{Token, parse_flag, parse_number, scalar_text, scalar_token, split_tokens};
use crate::core::models::parameter::ParameterPatch;
use serde_yaml::{Mapping, Value};

/// One named field of a potential entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Parameter(ParameterPatch),
    Name(String),
}

/// Result of reading one parameter entry in any of the shorthand notations.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEntry {
    /// A value and/or flag without a parameter name, e.g. `1.0 fixed`.
    Patch(ParameterPatch),
    /// Named fields, e.g. `B 1.0 false` or `{B: 1.0, Kappa: 2.0}`.
    Fields(Vec<(String, Field)>),
    /// A lone identifier, e.g. `B`.
    Identifier(String),
}

/// Piece of a flattened sequence: a scalar token (with its source text) or a nested entry.
enum Item {
    Token { raw: String, token: Token },
    Nested(ParsedEntry),
}

/// Reads a parameter entry.
///
/// All of these are equivalent and yield `Fields[B = {value: 1.0, fixed: false}]`:
///
/// ```text
/// "B 1.0 false"      "B;1.0;free"       [B, 1.0, false]
/// [B, [1.0, false]]  [B, "1.0;false"]   {B: {value: 1.0, fixed: false}}
/// ```
pub fn parse_parameter_entry(value: &Value, context: &str) -> Result<ParsedEntry, ParseError> {
    match value {
        Value::Sequence(seq) if seq.len() == 1 => parse_parameter_entry(&seq[0], context),
        Value::Sequence(seq) => {
            let mut items = Vec::new();
            for (i, element) in seq.iter().enumerate() {
                let ctx = index_context(context, i);
                match element {
                    Value::String(s) => items.extend(text_items(s)),
                    Value::Sequence(_) | Value::Mapping(_) => {
                        items.push(Item::Nested(parse_parameter_entry(element, &ctx)?))
                    }
                    other => items.push(scalar_item(other, &ctx)?),
                }
            }
            from_items(items, context)
        }
        Value::Mapping(map) => parse_mapping(map, context),
        Value::String(s) => from_items(text_items(s).collect(), context),
        Value::Number(_) | Value::Bool(_) => from_items(vec![scalar_item(value, context)?], context),
        other => Err(ParseError::unexpected_type(
            context,
            "a parameter entry",
            other,
        )),
    }
}

/// Reads a value-and-flag entry, rejecting names.
pub fn parse_patch(value: &Value, context: &str) -> Result<ParameterPatch, ParseError> {
    match parse_parameter_entry(value, context)? {
        ParsedEntry::Patch(patch) => Ok(patch),
        ParsedEntry::Identifier(token) => Err(ParseError::UnexpectedIdentifier {
            context: context.to_string(),
            token,
        }),
        ParsedEntry::Fields(_) => Err(ParseError::invalid_entry(
            context,
            "expected a value and/or flag, found named fields",
        )),
    }
}

fn text_items(text: &str) -> impl Iterator<Item = Item> + '_ {
    split_tokens(text).into_iter().map(|raw| Item::Token {
        raw: raw.to_string(),
        token: Token::classify(raw),
    })
}

fn scalar_item(value: &Value, context: &str) -> Result<Item, ParseError> {
    match (scalar_text(value), scalar_token(value)) {
        (Some(raw), Some(token)) => Ok(Item::Token { raw, token }),
        _ => Err(ParseError::unexpected_type(context, "a scalar", value)),
    }
}

fn from_items(items: Vec<Item>, context: &str) -> Result<ParsedEntry, ParseError> {
    let mut items = items.into_iter();
    let Some(first) = items.next() else {
        return Err(ParseError::invalid_entry(context, "empty parameter entry"));
    };
    let rest: Vec<Item> = items.collect();

    match first {
        Item::Token {
            token: Token::Identifier(ident),
            ..
        } => {
            if ident.eq_ignore_ascii_case("name") && rest.len() == 1 {
                let name = match &rest[0] {
                    Item::Token { raw, .. } => raw.clone(),
                    Item::Nested(ParsedEntry::Identifier(id)) => id.clone(),
                    Item::Nested(_) => {
                        return Err(ParseError::invalid_entry(context, "invalid name"));
                    }
                };
                return Ok(ParsedEntry::Fields(vec![(ident, Field::Name(name))]));
            }
            if rest.is_empty() {
                return Ok(ParsedEntry::Identifier(ident));
            }
            let patch = patch_from_items(rest, context)?;
            Ok(ParsedEntry::Fields(vec![(ident, Field::Parameter(patch))]))
        }
        Item::Nested(ParsedEntry::Fields(mut fields)) => {
            for item in rest {
                match item {
                    Item::Nested(ParsedEntry::Fields(more)) => fields.extend(more),
                    _ => {
                        return Err(ParseError::invalid_entry(
                            context,
                            "cannot mix named fields with bare values",
                        ));
                    }
                }
            }
            Ok(ParsedEntry::Fields(fields))
        }
        first => {
            let mut all = Vec::with_capacity(rest.len() + 1);
            all.push(first);
            all.extend(rest);
            Ok(ParsedEntry::Patch(patch_from_items(all, context)?))
        }
    }
}

/// Folds numbers and flags into a patch; later tokens win.
fn patch_from_items(items: Vec<Item>, context: &str) -> Result<ParameterPatch, ParseError> {
    let mut patch = ParameterPatch::default();
    for item in items {
        match item {
            Item::Token {
                token: Token::Number(v),
                ..
            } => patch.value = Some(v),
            Item::Token {
                token: Token::Flag(f),
                ..
            } => patch.fixed = Some(f),
            Item::Token {
                token: Token::Identifier(token),
                ..
            } => {
                return Err(ParseError::UnexpectedIdentifier {
                    context: context.to_string(),
                    token,
                });
            }
            Item::Nested(ParsedEntry::Patch(nested)) => patch.merge(&nested),
            Item::Nested(ParsedEntry::Identifier(token)) => {
                return Err(ParseError::UnexpectedIdentifier {
                    context: context.to_string(),
                    token,
                });
            }
            Item::Nested(ParsedEntry::Fields(_)) => {
                return Err(ParseError::invalid_entry(
                    context,
                    "named fields are not allowed inside a parameter value",
                ));
            }
        }
    }
    Ok(patch)
}

fn is_patch_key(key: &str) -> bool {
    matches!(key.to_ascii_lowercase().as_str(), "value" | "val" | "fixed")
}

fn parse_mapping(map: &Mapping, context: &str) -> Result<ParsedEntry, ParseError> {
    let mut keys = Vec::with_capacity(map.len());
    for (key, _) in map {
        keys.push(mapping_key(key, context)?);
    }

    if keys.iter().any(|k| is_patch_key(k)) {
        let mut patch = ParameterPatch::default();
        for (key, (_, value)) in keys.iter().zip(map) {
            let ctx = key_context(context, key);
            match key.to_ascii_lowercase().as_str() {
                "value" | "val" => patch.value = Some(number_value(value, &ctx)?),
                "fixed" => patch.fixed = Some(flag_value(value, &ctx)?),
                _ => {
                    return Err(ParseError::UnknownKey {
                        context: context.to_string(),
                        key: key.clone(),
                    });
                }
            }
        }
        return Ok(ParsedEntry::Patch(patch));
    }

    let mut fields = Vec::with_capacity(map.len());
    for (key, (_, value)) in keys.into_iter().zip(map) {
        let ctx = key_context(context, &key);
        if key.eq_ignore_ascii_case("name") {
            let name = scalar_text(value)
                .ok_or_else(|| ParseError::unexpected_type(&ctx, "a name", value))?;
            fields.push((key, Field::Name(name)));
        } else {
            let patch = parse_patch(value, &ctx)?;
            fields.push((key, Field::Parameter(patch)));
        }
    }
    Ok(ParsedEntry::Fields(fields))
}

/// Mapping keys may be written as strings, numbers or booleans.
pub(crate) fn mapping_key(key: &Value, context: &str) -> Result<String, ParseError> {
    scalar_text(key).ok_or_else(|| ParseError::unexpected_type(context, "a scalar key", key))
}

pub(crate) fn number_value(value: &Value, context: &str) -> Result<f64, ParseError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::InvalidNumber {
                context: context.to_string(),
                value: n.to_string(),
            }),
        Value::String(s) => parse_number(s).ok_or_else(|| ParseError::InvalidNumber {
            context: context.to_string(),
            value: s.clone(),
        }),
        other => Err(ParseError::unexpected_type(context, "a number", other)),
    }
}

fn flag_value(value: &Value, context: &str) -> Result<bool, ParseError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => parse_flag(s).ok_or_else(|| ParseError::InvalidFlag {
            context: context.to_string(),
            value: s.clone(),
        }),
        other => Err(ParseError::unexpected_type(context, "a flag", other)),
    }
}
