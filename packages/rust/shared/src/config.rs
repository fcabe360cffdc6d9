//! Application configuration for Distill.
//!
//! User config lives at `~/.distill/distill.toml`. Every field has a default,
//! so a missing file or a partial file is always valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DistillError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "distill.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".distill";

// ---------------------------------------------------------------------------
// Config structs (matching distill.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Noise filter and main-content scorer.
    #[serde(default)]
    pub cleaner: CleanerConfig,

    /// Markdown generation.
    #[serde(default)]
    pub markdown: MarkdownConfig,

    /// Token chunking.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// BM25 and semantic ranking.
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Optional AI polish of the cleaned fragment.
    #[serde(default)]
    pub polish: PolishConfig,
}

/// How aggressively the noise filter removes elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanMode {
    /// General noise patterns only.
    Lax,
    /// General and e-commerce noise patterns.
    #[default]
    Moderate,
    /// Everything in `Moderate`, plus hidden elements.
    Strict,
}

/// `[cleaner]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Cleaning aggressiveness.
    #[serde(default)]
    pub mode: CleanMode,

    /// Strip images, video, audio and other media.
    #[serde(default)]
    pub exclude_media: bool,
}

/// `[markdown]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Emit the citation-style Markdown and a references list.
    #[serde(default = "default_true")]
    pub enable_citations: bool,

    /// Resolve relative links against the page URL.
    #[serde(default = "default_true")]
    pub resolve_links: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            enable_citations: true,
            resolve_links: true,
        }
    }
}

/// `[chunking]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window size in tokens.
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Token overlap between consecutive windows.
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Model whose vocabulary is used for tokenization.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            overlap: default_overlap(),
            model: default_model(),
        }
    }
}

/// `[ranking]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// BM25 term-frequency saturation.
    #[serde(default = "default_k1")]
    pub k1: f64,

    /// BM25 length normalization.
    #[serde(default = "default_b")]
    pub b: f64,

    /// Maximum number of ranked chunks to keep (0 = unlimited).
    #[serde(default)]
    pub top_k: usize,

    /// Minimum BM25 score to keep a chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Minimum cosine similarity for semantic filtering.
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
            top_k: 0,
            threshold: None,
            semantic_threshold: default_semantic_threshold(),
        }
    }
}

/// `[polish]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolishConfig {
    /// Whether to send the cleaned fragment to a completion service.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat model used for polishing.
    #[serde(default = "default_model")]
    pub model: String,

    /// Deadline for the single polish call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PolishConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_window_size() -> usize {
    512
}
fn default_overlap() -> usize {
    64
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_k1() -> f64 {
    1.2
}
fn default_b() -> f64 {
    0.75
}
fn default_semantic_threshold() -> f64 {
    0.7
}
fn default_base_url() -> String {
    "https://api.openai.com".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_timeout_ms() -> u64 {
    30_000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.distill/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DistillError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.distill/distill.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DistillError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DistillError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DistillError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DistillError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DistillError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the polish API key from the configured env var.
///
/// Only checked when polish is enabled.
pub fn validate_api_key(config: &AppConfig) -> Result<Option<String>> {
    if !config.polish.enabled {
        return Ok(None);
    }
    let var_name = &config.polish.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(Some(val)),
        _ => Err(DistillError::config(format!(
            "polish is enabled but no API key was found. Set the {var_name} environment variable."
        ))),
    }
}
