//! Relevance ranking of text chunks.
//!
//! Lexical ranking with [`Bm25`] / [`prune_content`], and semantic filtering
//! over precomputed embeddings with [`filter_by_semantic_similarity`].

mod bm25;
mod prune;
mod semantic;
pub mod vectors;

pub use bm25::{Bm25, Bm25Options, tokenize};
pub use prune::{PruningOptions, prune_content};
pub use semantic::{DEFAULT_SEMANTIC_THRESHOLD, EmbeddedChunk, filter_by_semantic_similarity};
pub use vectors::{cosine_similarity, dot_product, normalize_vector, vector_magnitude};
