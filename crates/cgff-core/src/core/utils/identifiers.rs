use phf::{Set, phf_set};

/// Keys with a structural meaning inside potential entries; they can never name a parameter.
static RESERVED_KEYS: Set<&'static str> = phf_set! {
    "name", "species", "value", "val", "fixed",
};

const NAME_SEPARATORS: &[char] = &[',', ';', ':', '{', '}'];

/// Checks that a bead-type name survives a round trip through the shorthand notation.
pub fn is_valid_bead_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || NAME_SEPARATORS.contains(&c))
}

/// Checks that a potential or parameter name is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn is_reserved_key(name: &str) -> bool {
    RESERVED_KEYS.contains(name.to_ascii_lowercase().as_str())
}

/// Folds a potential name into its lookup form: lowercase with `_` and `-` removed.
pub fn lookup_key(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
