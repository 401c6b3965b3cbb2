use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    MissingSeparator(String),

    #[error("Key cannot be empty in '{0}'.")]
    EmptyKey(String),

    #[error("Invalid boolean value for {key}: '{value}'. Expected true/false, yes/no or on/off.")]
    InvalidBool { key: String, value: String },
}

/// Splits `KEY=VALUE` at the first `=`; the value may itself contain `=`.
pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| ParseError::MissingSeparator(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(pair.to_string()));
    }
    Ok((key, value.trim()))
}

pub fn parse_bool(key: &str, value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ParseError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_pairs_split_at_first_equals() {
        assert_eq!(
            parse_key_value("output.header=a=b"),
            Ok(("output.header", "a=b"))
        );
        assert_eq!(
            parse_key_value(" normalize.policy = layer "),
            Ok(("normalize.policy", "layer"))
        );
        assert_eq!(parse_key_value("output.header="), Ok(("output.header", "")));
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert_eq!(
            parse_key_value("normalize.policy"),
            Err(ParseError::MissingSeparator("normalize.policy".to_string()))
        );
        assert_eq!(
            parse_key_value("=layer"),
            Err(ParseError::EmptyKey("=layer".to_string()))
        );
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert_eq!(parse_bool("k", "Yes"), Ok(true));
        assert_eq!(parse_bool("k", "off"), Ok(false));
        assert!(parse_bool("k", "maybe").is_err());
    }
}
