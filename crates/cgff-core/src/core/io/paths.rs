use std::path::{Path, PathBuf};
use tracing::debug;

/// Splits a list of directories written as one string on whitespace and `, : ;`.
pub fn split_search_paths(paths: &str) -> Vec<PathBuf> {
    paths
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ':' | ';'))
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Returns the first existing `dir/file` over `search_paths`.
///
/// An absolute `file` is returned as is when it exists; the search paths are not
/// consulted for it.
pub fn find_in_paths<P: AsRef<Path>>(file: &Path, search_paths: &[P]) -> Option<PathBuf> {
    if file.is_absolute() {
        return file.exists().then(|| file.to_path_buf());
    }
    for dir in search_paths {
        let candidate = dir.as_ref().join(file);
        if candidate.exists() {
            debug!("Located '{}' at '{}'.", file.display(), candidate.display());
            return Some(candidate);
        }
    }
    None
}
