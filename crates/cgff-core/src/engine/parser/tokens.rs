use phf::{Map, phf_map};
use serde_yaml::Value;

/// Flag words and the `fixed` value they stand for.
static FLAG_WORDS: Map<&'static str, bool> = phf_map! {
    "true" => true,
    "fixed" => true,
    "false" => false,
    "free" => false,
};

const TOKEN_SEPARATORS: &[char] = &[',', ':', ';', '{', '}'];
const SPECIES_SEPARATORS: &[char] = &[',', ';', ':'];

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// `true` holds the parameter fixed.
    Flag(bool),
    Identifier(String),
}

impl Token {
    pub fn classify(raw: &str) -> Self {
        if let Some(flag) = parse_flag(raw) {
            return Token::Flag(flag);
        }
        match parse_number(raw) {
            Some(value) => Token::Number(value),
            None => Token::Identifier(raw.to_string()),
        }
    }
}

/// Case-insensitive flag word lookup.
pub fn parse_flag(raw: &str) -> Option<bool> {
    FLAG_WORDS.get(raw.trim().to_ascii_lowercase().as_str()).copied()
}

/// Parses a finite float; `inf` and `nan` spellings are not numbers here.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Splits a shorthand scalar on whitespace and `, : ; { }`, dropping empty pieces.
pub fn split_tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || TOKEN_SEPARATORS.contains(&c))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Splits a species slot on `, ; :`.
pub fn split_species(text: &str) -> Vec<&str> {
    text.split(SPECIES_SEPARATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Text of a scalar YAML node; `None` for collections and null.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Classifies a scalar YAML node, keeping YAML numbers and booleans typed.
pub fn scalar_token(value: &Value) -> Option<Token> {
    match value {
        Value::Bool(b) => Some(Token::Flag(*b)),
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Token::Number)
            .or_else(|| Some(Token::Identifier(n.to_string()))),
        Value::String(s) => Some(Token::classify(s.trim())),
        _ => None,
    }
}
