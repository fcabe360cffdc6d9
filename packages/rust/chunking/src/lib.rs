//! Text chunking.
//!
//! Two strategies share one contract (text in, ordered chunks out):
//! - [`regex_chunk`] splits on separator patterns, paragraphs by default.
//! - [`sliding_window_chunk`] cuts fixed-size token windows, optionally
//!   overlapping, using a [`Tokenizer`].

mod pattern;
mod tokenizer;
mod window;

pub use pattern::{PARAGRAPH_BREAK, regex_chunk, regex_chunk_default};
pub use tokenizer::{BpeTokenizer, DEFAULT_MODEL, Tokenizer};
pub use window::{SlidingWindowOptions, sliding_window_chunk, sliding_window_chunk_with};
