//! Types, errors and configuration shared by every Distill crate.
//!
//! - [`DistillError`] and the crate-wide [`Result`]
//! - pipeline values: [`PageInput`], [`Chunk`], [`ScoredChunk`], [`Citation`], [`MarkdownResult`]
//! - the TOML-backed [`AppConfig`] with its per-stage sections

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, ChunkingConfig, CleanMode, CleanerConfig, MarkdownConfig, PolishConfig,
    RankingConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_api_key,
};
pub use error::{DistillError, Result};
pub use types::{Chunk, Citation, MarkdownResult, PageInput, ScoredChunk};
