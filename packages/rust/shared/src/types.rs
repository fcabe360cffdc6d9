//! Core domain types shared by the distillation stages.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Page input
// ---------------------------------------------------------------------------

/// A fetched page as supplied by the upstream fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInput {
    /// Raw HTML of the page.
    pub html: String,
    /// Final URL the HTML was served from.
    pub url: String,
    /// HTTP status code of the response.
    pub status_code: u16,
}

// ---------------------------------------------------------------------------
// Chunks
// ---------------------------------------------------------------------------

/// A contiguous slice of a larger text. Identity is its position in the
/// sequence it was produced in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
}

impl From<String> for Chunk {
    fn from(content: String) -> Self {
        Self { content }
    }
}

/// A chunk with a relevance score.
///
/// `index` always refers to the chunk's position in the input slice, even
/// after the results have been sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Position of the chunk in the original input.
    pub index: usize,
    /// Relevance score. Always finite.
    pub score: f64,
    /// The chunk text.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

/// One entry of a citation reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Trimmed target URL.
    pub url: String,
    /// 1-based reference number.
    pub index: usize,
}

/// Output of Markdown generation.
///
/// The citation fields are `Some` iff citation generation was enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownResult {
    /// Markdown with standard inline links.
    pub raw_markdown: String,
    /// Markdown with links rewritten to `[text][n]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_with_citations: Option<String>,
    /// Rendered `## References` section (empty string when there are no links).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references_markdown: Option<String>,
}

impl MarkdownResult {
    /// An empty result without citation fields.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_result_skips_absent_citation_fields() {
        let result = MarkdownResult {
            raw_markdown: "# Hi".into(),
            ..MarkdownResult::empty()
        };
        let toml_str = toml::to_string(&result).expect("serialize");
        assert!(toml_str.contains("raw_markdown"));
        assert!(!toml_str.contains("markdown_with_citations"));
    }

    #[test]
    fn chunk_from_string() {
        let chunk = Chunk::from("hello".to_string());
        assert_eq!(chunk.content, "hello");
    }
}
