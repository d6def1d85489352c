//! Shared text helpers

/// Collapse every run of whitespace to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove terminating semicolons (and surrounding whitespace) if present.
pub fn strip_terminating_semicolon(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}
