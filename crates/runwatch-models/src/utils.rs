//! Small shared helpers.

use uuid::Uuid;

/// Random upper-case alphanumeric code of `len` characters (max 32).
pub fn random_code(len: usize) -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .to_ascii_uppercase()
        .chars()
        .take(len.min(32))
        .collect()
}

/// Make a string safe to embed in a file name.
///
/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "zone".to_string()
    } else {
        cleaned
    }
}
