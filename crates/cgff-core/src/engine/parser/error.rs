use thiserror::Error;

/// Errors raised while reading the shorthand notation.
///
/// Every variant names the location of the offending value as a dotted path into the
/// document, e.g. `potentials.gaussian[2]`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("{context}: expected {expected}, found {found}")]
    UnexpectedType {
        context: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{context}: unknown key '{key}'")]
    UnknownKey { context: String, key: String },
    #[error("{context}: missing required key '{key}'")]
    MissingKey { context: String, key: &'static str },
    #[error("{context}: invalid number '{value}'")]
    InvalidNumber { context: String, value: String },
    #[error("{context}: invalid flag '{value}' (expected true/fixed or false/free)")]
    InvalidFlag { context: String, value: String },
    #[error("{context}: unexpected identifier '{token}' in a parameter value")]
    UnexpectedIdentifier { context: String, token: String },
    #[error("{context}: invalid bead type name '{name}'")]
    InvalidBeadName { context: String, name: String },
    #[error("{context}: empty species slot")]
    EmptySpecies { context: String },
    #[error(
        "{context}: potential type '{kind}' couples {expected} bead types, but {found} species were given"
    )]
    ArityMismatch {
        context: String,
        kind: String,
        expected: usize,
        found: usize,
    },
    #[error("{context}: field '{field}' is given more than once")]
    DuplicateField { context: String, field: String },
    #[error("{context}: unknown potential type '{name}'")]
    UnknownPotential { context: String, name: String },
    #[error("{context}: unknown conflict policy '{value}' (expected error, override or layer)")]
    UnknownPolicy { context: String, value: String },
    #[error("{context}: {message}")]
    InvalidEntry { context: String, message: String },
}

impl ParseError {
    /// Location of the offending value.
    pub fn context(&self) -> &str {
        match self {
            ParseError::UnexpectedType { context, .. }
            | ParseError::UnknownKey { context, .. }
            | ParseError::MissingKey { context, .. }
            | ParseError::InvalidNumber { context, .. }
            | ParseError::InvalidFlag { context, .. }
            | ParseError::UnexpectedIdentifier { context, .. }
            | ParseError::InvalidBeadName { context, .. }
            | ParseError::EmptySpecies { context }
            | ParseError::ArityMismatch { context, .. }
            | ParseError::DuplicateField { context, .. }
            | ParseError::UnknownPotential { context, .. }
            | ParseError::UnknownPolicy { context, .. }
            | ParseError::InvalidEntry { context, .. } => context,
        }
    }

    pub(crate) fn invalid_entry(context: &str, message: impl Into<String>) -> Self {
        ParseError::InvalidEntry {
            context: context.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn unexpected_type(
        context: &str,
        expected: &'static str,
        value: &serde_yaml::Value,
    ) -> Self {
        ParseError::UnexpectedType {
            context: context.to_string(),
            expected,
            found: value_kind(value),
        }
    }
}

/// Short description of a YAML node, for error messages.
pub(crate) fn value_kind(value: &serde_yaml::Value) -> &'static str {
    use serde_yaml::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// `parent.key`
pub(crate) fn key_context(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// `parent[index]`
pub(crate) fn index_context(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}
