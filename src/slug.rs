//! Label → key normalization.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Separator placed between word runs in a key.
const SEPARATOR: char = '_';

/// Derive the canonical key for a raw label.
///
/// Lowercases, strips diacritics (NFD decomposition with combining marks
/// dropped), collapses every run of non-alphanumeric characters into a single
/// `_`, and never emits a leading or trailing separator. The mapping is a
/// pure function of the input and is intentionally not injective: labels that
/// differ only in accents, case, or punctuation collapse to the same key.
pub fn slugify(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    let mut pending_separator = false;
    for c in label.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push(SEPARATOR);
            }
            pending_separator = false;
            key.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    key
}
