//! Sliding-window chunking over a token stream.

use tracing::debug;

use distill_shared::{ChunkingConfig, DistillError, Result};

use crate::tokenizer::{BpeTokenizer, DEFAULT_MODEL, Tokenizer};

/// Window geometry for [`sliding_window_chunk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindowOptions {
    /// Tokens per chunk. Must be positive.
    pub window_size: usize,
    /// Tokens to advance between windows. Takes precedence over `overlap`.
    pub step: Option<usize>,
    /// Tokens shared by consecutive windows.
    pub overlap: Option<usize>,
    /// Tokenizer model or encoding name.
    pub model: String,
}

impl SlidingWindowOptions {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            step: None,
            overlap: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = Some(overlap);
        self
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }

    /// Effective step: explicit step, else `window_size - overlap`, else
    /// `window_size`.
    pub fn resolve_step(&self) -> Result<usize> {
        if self.window_size == 0 {
            return Err(DistillError::contract("window_size must be positive"));
        }

        let step = match (self.step, self.overlap) {
            (Some(step), _) => step,
            (None, Some(overlap)) => self.window_size.saturating_sub(overlap),
            (None, None) => self.window_size,
        };

        if step == 0 {
            return Err(DistillError::contract(format!(
                "step must be positive (window_size {}, overlap {:?}, step {:?})",
                self.window_size, self.overlap, self.step
            )));
        }
        Ok(step)
    }
}

impl From<&ChunkingConfig> for SlidingWindowOptions {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            window_size: config.window_size,
            step: None,
            overlap: Some(config.overlap),
            model: config.model.clone(),
        }
    }
}

/// Chunk `text` with the BPE tokenizer named by `options.model`.
pub fn sliding_window_chunk(text: &str, options: &SlidingWindowOptions) -> Result<Vec<String>> {
    options.resolve_step()?;
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let tokenizer = BpeTokenizer::for_model(&options.model)?;
    sliding_window_chunk_with(text, options, &tokenizer)
}

/// Chunk `text` with an injected tokenizer.
///
/// Text that fits in one window comes back unchanged as a single chunk.
/// Otherwise windows of `window_size` tokens advance by the resolved step
/// until one reaches the last token; that final window may be shorter.
pub fn sliding_window_chunk_with(
    text: &str,
    options: &SlidingWindowOptions,
    tokenizer: &dyn Tokenizer,
) -> Result<Vec<String>> {
    let step = options.resolve_step()?;
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let tokens = tokenizer.encode(text);
    if tokens.len() <= options.window_size {
        return Ok(vec![text.to_string()]);
    }

    let mut chunks = Vec::with_capacity(tokens.len().div_ceil(step));
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + options.window_size).min(tokens.len());
        chunks.push(tokenizer.decode(&tokens[start..end])?);
        if end == tokens.len() {
            break;
        }
        start += step;
    }

    debug!(
        tokens = tokens.len(),
        window = options.window_size,
        step,
        chunks = chunks.len(),
        "sliding-window chunking complete"
    );
    Ok(chunks)
}
