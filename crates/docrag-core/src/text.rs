//! Text normalization and tokenization shared by extraction, chunking,
//! and ranking.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Collapse every whitespace run (newlines included) into a single space
/// and strip leading/trailing whitespace.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Lower-cased maximal runs of word characters.
///
/// Word characters follow the Unicode definition, so accented Spanish
/// words stay intact (`"Canción"` → `"canción"`).
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}
