//! Token encoding capability and the default BPE backend.

use tiktoken_rs::{CoreBPE, Rank, cl100k_base, get_bpe_from_model, o200k_base};

use distill_shared::{DistillError, Result};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Encodes text to token ids and back.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<u32>;

    fn decode(&self, tokens: &[u32]) -> Result<String>;

    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Cut `text` to at most `limit` tokens. Text within the limit is
    /// returned unchanged.
    fn truncate(&self, text: &str, limit: usize) -> Result<String> {
        let tokens = self.encode(text);
        if tokens.len() <= limit {
            return Ok(text.to_string());
        }
        self.decode(&tokens[..limit])
    }
}

/// Byte-pair-encoding tokenizer backed by `tiktoken-rs`.
pub struct BpeTokenizer {
    bpe: CoreBPE,
    model: String,
}

impl BpeTokenizer {
    /// Resolve a model name (e.g. `gpt-4o-mini`) or an encoding name
    /// (`o200k_base`, `cl100k_base`).
    pub fn for_model(model_or_encoding: &str) -> Result<Self> {
        let lower = model_or_encoding.to_ascii_lowercase();

        let bpe = match get_bpe_from_model(&lower) {
            Ok(bpe) => bpe,
            Err(_) => match lower.as_str() {
                "o200k_base" => o200k_base().map_err(|e| load_error(&lower, e))?,
                "cl100k_base" => cl100k_base().map_err(|e| load_error(&lower, e))?,
                _ => {
                    return Err(DistillError::Tokenizer(format!(
                        "unsupported model or encoding: {model_or_encoding}"
                    )));
                }
            },
        };

        Ok(Self { bpe, model: lower })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn load_error(name: &str, e: impl std::fmt::Display) -> DistillError {
    DistillError::Tokenizer(format!("failed to load {name}: {e}"))
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeTokenizer")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Tokenizer for BpeTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect()
    }

    /// Slices that cut a multi-byte character decode lossily (U+FFFD at the
    /// cut). Unknown token ids are an error.
    fn decode(&self, tokens: &[u32]) -> Result<String> {
        let ids: Vec<Rank> = tokens.to_vec();
        match self.bpe.decode(ids.clone()) {
            Ok(text) => Ok(text),
            Err(e) if e.to_string().starts_with("Invalid token") => {
                Err(DistillError::Tokenizer(format!("decode failed: {e}")))
            }
            Err(_) => {
                let bytes: Vec<u8> = self.bpe._decode_native_and_split(ids).flatten().collect();
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}
