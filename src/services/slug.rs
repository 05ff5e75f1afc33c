use regex::Regex;
use std::sync::OnceLock;

use crate::models::errors::ToolkitError;

fn unsafe_run() -> &'static Regex {
    static UNSAFE_RUN: OnceLock<Regex> = OnceLock::new();
    UNSAFE_RUN.get_or_init(|| Regex::new(r"[^a-z\d]+").expect("slug pattern is valid"))
}

/// Turns `s` into a lowercase, hyphen separated, URL-safe token.
///
/// Anything outside `[a-z0-9]` after lowercasing collapses into a single
/// hyphen, so non-ASCII letters are dropped rather than transliterated.
pub fn slugify(s: &str) -> Result<String, ToolkitError> {
    if s.is_empty() {
        return Err(ToolkitError::EmptyInput);
    }

    let lowered = s.to_lowercase();
    let slug = unsafe_run().replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        return Err(ToolkitError::EmptySlug);
    }

    Ok(slug.to_string())
}
