//! Handle and endpoint normalization

/// Trim, drop a leading `@`, lowercase.
pub fn normalize_handle(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('@')
        .unwrap_or(trimmed)
        .trim()
        .to_lowercase()
}

pub fn strip_trailing_slashes(url: &str) -> &str {
    url.trim_end_matches('/')
}
