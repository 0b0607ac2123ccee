/// Classifier for LIKE patterns that defeat a B-tree prefix index

/// A fuzzy search starts with a wildcard, so the index prefix cannot anchor
/// the match
pub fn is_fuzzy_search(pattern: &str) -> bool {
    pattern.starts_with('%') || pattern.starts_with('_')
}

/// A reversed-string index helps only when the match is anchored at the end:
/// leading wildcard, fixed tail. A trailing wildcard leaves both ends open.
pub fn benefits_from_reversed_index(pattern: &str) -> bool {
    is_fuzzy_search(pattern)
        && pattern.len() > 1
        && !pattern.ends_with('%')
        && !pattern.ends_with('_')
}
