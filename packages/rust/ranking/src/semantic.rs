//! Embedding-based filtering of chunks by cosine similarity to a query.

use serde::{Deserialize, Serialize};
use tracing::debug;

use distill_shared::{Result, ScoredChunk};

use crate::vectors::cosine_similarity;

/// Default minimum similarity.
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.7;

/// A chunk with a precomputed embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Keep chunks whose similarity to `query` is at least `threshold`, most
/// similar first (stable on ties).
///
/// No chunks or no query embedding yields an empty list. Mismatched
/// dimensions are a contract error.
pub fn filter_by_semantic_similarity(
    chunks: &[EmbeddedChunk],
    query: Option<&[f32]>,
    threshold: f64,
) -> Result<Vec<ScoredChunk>> {
    let Some(query) = query else {
        return Ok(Vec::new());
    };
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let mut scored = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let score = cosine_similarity(query, &chunk.embedding)?;
        if score >= threshold {
            scored.push(ScoredChunk {
                index,
                score,
                content: chunk.content.clone(),
            });
        }
    }

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    debug!(total = chunks.len(), kept = scored.len(), threshold, "semantic filter");
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, embedding: &[f32]) -> EmbeddedChunk {
        EmbeddedChunk {
            content: content.into(),
            embedding: embedding.to_vec(),
        }
    }

    #[test]
    fn identical_embedding_scores_one_and_is_kept() {
        let q = [0.2, 0.9, 0.1];
        let out = filter_by_semantic_similarity(&[chunk("same", &q)], Some(&q), 1.0).unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_chunks_or_missing_query_give_nothing() {
        assert!(filter_by_semantic_similarity(&[], Some(&[1.0]), 0.5).unwrap().is_empty());
        let chunks = [chunk("a", &[1.0])];
        assert!(filter_by_semantic_similarity(&chunks, None, 0.5).unwrap().is_empty());
    }

    #[test]
    fn filters_and_sorts_by_similarity() {
        let chunks = [
            chunk("far", &[0.0, 1.0]),
            chunk("close", &[0.9, 0.1]),
            chunk("exact", &[1.0, 0.0]),
        ];
        let out = filter_by_semantic_similarity(
            &chunks,
            Some(&[1.0, 0.0]),
            DEFAULT_SEMANTIC_THRESHOLD,
        )
        .unwrap();
        let order: Vec<&str> = out.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(order, vec!["exact", "close"]);
        assert_eq!(out[0].index, 2);
    }

    #[test]
    fn mismatched_dimensions_fail() {
        let chunks = [chunk("a", &[1.0, 0.0, 0.0])];
        let err = filter_by_semantic_similarity(&chunks, Some(&[1.0, 0.0]), 0.0).unwrap_err();
        assert!(err.is_contract());
    }
}
