//! Regex chunking: split text on one or more separator patterns.

use std::sync::LazyLock;

use regex::Regex;

/// Paragraph break, the default separator.
pub static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n").expect("valid regex"));

/// Split `text` by each pattern in turn. Pieces produced by one pattern are
/// the input of the next; whitespace-only pieces are dropped.
pub fn regex_chunk(text: &str, patterns: &[Regex]) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = vec![text.to_string()];
    for pattern in patterns {
        chunks = chunks
            .iter()
            .flat_map(|chunk| pattern.split(chunk))
            .filter(|part| !part.trim().is_empty())
            .map(str::to_string)
            .collect();
    }
    chunks
}

/// [`regex_chunk`] with the paragraph separator.
pub fn regex_chunk_default(text: &str) -> Vec<String> {
    regex_chunk(text, std::slice::from_ref(&*PARAGRAPH_BREAK))
}
