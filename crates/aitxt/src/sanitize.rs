//! Value sanitizing for generated documents.
//!
//! Every free-text value written by the text generator passes through here,
//! so a value can never open a new line or smuggle invisible characters
//! into the block structure.

use crate::limits::MAX_VALUE_LENGTH;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Line breaks, collapsed into spaces
    static ref LINE_BREAKS: Regex = Regex::new(r"\r\n|[\r\n]").unwrap();

    /// C0/C1 controls, DEL, bidi marks/overrides/isolates and zero-width characters
    static ref INVISIBLE: Regex = Regex::new(
        r"[\x00-\x1F\x7F\x{80}-\x{9F}\x{200B}-\x{200F}\x{202A}-\x{202E}\x{2060}\x{2066}-\x{2069}\x{FEFF}]"
    ).unwrap();
}

/// Sanitize a value using the default length ceiling
pub fn sanitize_value(value: &str) -> String {
    sanitize_with_limit(value, MAX_VALUE_LENGTH)
}

/// Sanitize a value, truncating to `max_chars` characters
pub fn sanitize_with_limit(value: &str, max_chars: usize) -> String {
    let collapsed = LINE_BREAKS.replace_all(value, " ");
    let stripped = INVISIBLE.replace_all(&collapsed, "");
    let trimmed = stripped.trim();

    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => trimmed[..cut].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}
