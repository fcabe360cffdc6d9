//! Query-driven pruning of chunks with BM25.

use tracing::{debug, instrument};

use distill_shared::{RankingConfig, ScoredChunk};

use crate::bm25::{Bm25, Bm25Options};

/// Options for [`prune_content`].
#[derive(Debug, Clone, Default)]
pub struct PruningOptions {
    pub query: String,
    /// Minimum score to keep a chunk.
    pub threshold: Option<f64>,
    /// Keep at most this many chunks. `None` or `Some(0)` keeps all.
    pub top_k: Option<usize>,
    pub bm25: Bm25Options,
}

impl PruningOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Query plus threshold, top-k and BM25 parameters from `[ranking]`.
    pub fn from_config(query: impl Into<String>, config: &RankingConfig) -> Self {
        Self {
            query: query.into(),
            threshold: config.threshold,
            top_k: Some(config.top_k),
            bm25: Bm25Options::from(config),
        }
    }
}

/// Score `chunks` against the query and return the survivors, best first.
///
/// Ties keep their input order. An empty chunk list or a blank query returns
/// nothing without building an index.
#[instrument(skip_all, fields(chunks = chunks.len(), query = %options.query))]
pub fn prune_content<S: AsRef<str>>(chunks: &[S], options: &PruningOptions) -> Vec<ScoredChunk> {
    if chunks.is_empty() || options.query.trim().is_empty() {
        return Vec::new();
    }

    let scores = Bm25::new(chunks, options.bm25).score(&options.query);

    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .zip(scores)
        .enumerate()
        .map(|(index, (content, score))| ScoredChunk {
            index,
            score,
            content: content.as_ref().to_string(),
        })
        .filter(|chunk| options.threshold.is_none_or(|min| chunk.score >= min))
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    if let Some(k) = options.top_k.filter(|&k| k > 0) {
        scored.truncate(k);
    }

    debug!(kept = scored.len(), "pruning complete");
    scored
}
