//! End-to-end distillation: page → cleaned fragment → Markdown → chunks → ranking.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use distill_chunking::{BpeTokenizer, SlidingWindowOptions, Tokenizer, regex_chunk_default};
use distill_cleaner::{OpenAiCompatProvider, PolishOptions, SmartCleanOptions, smart_clean};
use distill_markdown::{MarkdownGeneratorOptions, generate};
use distill_ranking::{
    EmbeddedChunk, PruningOptions, filter_by_semantic_similarity, prune_content,
};
use distill_shared::{
    AppConfig, Chunk, ChunkingConfig, CleanerConfig, MarkdownConfig, MarkdownResult, PageInput,
    RankingConfig, Result, ScoredChunk, validate_api_key,
};

/// Settings for a [`Distiller`].
#[derive(Debug, Clone, Default)]
pub struct DistillConfig {
    pub cleaner: CleanerConfig,
    pub markdown: MarkdownConfig,
    pub chunking: ChunkingConfig,
    pub ranking: RankingConfig,
    /// Chunks are ranked against this query when set.
    pub query: Option<String>,
    /// AI polish of the cleaned fragment.
    pub polish: Option<PolishOptions>,
}

impl From<&AppConfig> for DistillConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            cleaner: config.cleaner.clone(),
            markdown: config.markdown.clone(),
            chunking: config.chunking.clone(),
            ranking: config.ranking.clone(),
            query: None,
            polish: None,
        }
    }
}

impl DistillConfig {
    /// Build from the app config, wiring up the OpenAI-compatible polish
    /// provider when `[polish]` is enabled.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let mut distill = Self::from(config);
        if config.polish.enabled {
            let api_key = validate_api_key(config)?;
            let provider = OpenAiCompatProvider::from_config(&config.polish, api_key)?;
            distill.polish = Some(
                PolishOptions::new(Arc::new(provider))
                    .with_timeout(Duration::from_millis(config.polish.timeout_ms)),
            );
        }
        Ok(distill)
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_polish(mut self, polish: PolishOptions) -> Self {
        self.polish = Some(polish);
        self
    }
}

/// Everything distilled from one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistilledPage {
    pub url: String,
    /// Main-content HTML fragment.
    pub cleaned_html: String,
    pub markdown: MarkdownResult,
    /// Paragraph chunks of the raw Markdown, oversized ones windowed by tokens.
    pub chunks: Vec<Chunk>,
    /// Chunks ranked against the configured query, best first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranked: Option<Vec<ScoredChunk>>,
    /// SHA-256 of the raw Markdown, hex encoded.
    pub content_hash: String,
}

/// Runs the distillation stages for pages with one configuration.
pub struct Distiller {
    config: DistillConfig,
    tokenizer: Arc<dyn Tokenizer>,
}

impl std::fmt::Debug for Distiller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distiller")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Distiller {
    /// Create a distiller using the BPE tokenizer of `config.chunking.model`.
    pub fn new(config: DistillConfig) -> Result<Self> {
        let tokenizer = BpeTokenizer::for_model(&config.chunking.model)?;
        Ok(Self::with_tokenizer(config, Arc::new(tokenizer)))
    }

    pub fn with_tokenizer(config: DistillConfig, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { config, tokenizer }
    }

    pub fn config(&self) -> &DistillConfig {
        &self.config
    }

    /// Distill one fetched page.
    #[instrument(skip_all, fields(url = %page.url, status = page.status_code))]
    pub async fn distill(&self, page: &PageInput) -> Result<DistilledPage> {
        if !(200..300).contains(&page.status_code) {
            warn!(status = page.status_code, "distilling a non-success response");
        }

        let clean_options = SmartCleanOptions {
            polish: self.config.polish.clone(),
            ..SmartCleanOptions::from(&self.config.cleaner)
        };
        let cleaned_html = smart_clean(&page.html, &clean_options).await;

        let md_options = MarkdownGeneratorOptions::from_config(&self.config.markdown, &page.url);
        let markdown = generate(&cleaned_html, &md_options)?;

        let chunks = self.chunk(&markdown.raw_markdown)?;

        let ranked = self.config.query.as_deref().map(|query| {
            let options = PruningOptions::from_config(query, &self.config.ranking);
            let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            prune_content(&contents, &options)
        });

        let content_hash = compute_hash(&markdown.raw_markdown);

        info!(
            html_len = page.html.len(),
            cleaned_len = cleaned_html.len(),
            md_len = markdown.raw_markdown.len(),
            chunks = chunks.len(),
            ranked = ranked.as_ref().map(Vec::len),
            "page distilled"
        );

        Ok(DistilledPage {
            url: page.url.clone(),
            cleaned_html,
            markdown,
            chunks,
            ranked,
            content_hash,
        })
    }

    /// Split Markdown into paragraphs, then cut any paragraph longer than
    /// the token window into overlapping windows.
    pub fn chunk(&self, markdown: &str) -> Result<Vec<Chunk>> {
        let window = SlidingWindowOptions::from(&self.config.chunking);
        let mut chunks = Vec::new();

        for paragraph in regex_chunk_default(markdown) {
            if self.tokenizer.count(&paragraph) <= window.window_size {
                chunks.push(Chunk::from(paragraph));
                continue;
            }
            let pieces = distill_chunking::sliding_window_chunk_with(
                &paragraph,
                &window,
                self.tokenizer.as_ref(),
            )?;
            chunks.extend(pieces.into_iter().map(Chunk::from));
        }

        debug!(chunks = chunks.len(), "markdown chunked");
        Ok(chunks)
    }

    /// Filter embedded chunks by similarity to `query`, using the configured
    /// semantic threshold.
    pub fn rank_semantic(
        &self,
        chunks: &[EmbeddedChunk],
        query: Option<&[f32]>,
    ) -> Result<Vec<ScoredChunk>> {
        filter_by_semantic_similarity(chunks, query, self.config.ranking.semantic_threshold)
    }
}

/// Hex-encoded SHA-256 of `content`.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use distill_cleaner::{CompletionRequest, CompletionResponse, TextCompletion};
    use distill_shared::DistillError;

    use super::*;

    /// One token per whitespace-separated word.
    struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn encode(&self, text: &str) -> Vec<u32> {
            text.split_whitespace().map(|w| w.len() as u32).collect()
        }

        fn decode(&self, tokens: &[u32]) -> Result<String> {
            Ok(tokens
                .iter()
                .map(|&len| "w".repeat(len as usize))
                .collect::<Vec<_>>()
                .join(" "))
        }
    }

    struct Rewrite(&'static str);

    #[async_trait]
    impl TextCompletion for Rewrite {
        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            Ok(CompletionResponse {
                text: self.0.to_string(),
            })
        }

        fn name(&self) -> &str {
            "rewrite"
        }
    }

    struct Offline;

    #[async_trait]
    impl TextCompletion for Offline {
        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            Err(DistillError::Polish("offline".into()))
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    fn page(html: &str) -> PageInput {
        PageInput {
            html: html.to_string(),
            url: "https://fruit.test/articles/1".into(),
            status_code: 200,
        }
    }

    fn fixture(name: &str) -> String {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/html")
            .join(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn distiller(config: DistillConfig) -> Distiller {
        Distiller::with_tokenizer(config, Arc::new(WordTokenizer))
    }

    const FRUIT: &str = "<html><body><nav>Menu</nav><article><p>Apple is a technology company.</p><p>Banana is a fruit.</p></article></body></html>";

    #[tokio::test]
    async fn distills_and_ranks_the_fruit_page() {
        let d = distiller(DistillConfig::default().with_query("technology"));
        let out = d.distill(&page(FRUIT)).await.unwrap();

        assert!(!out.cleaned_html.contains("Menu"));
        assert!(out.markdown.raw_markdown.contains("Apple is a technology company."));
        assert!(!out.markdown.raw_markdown.contains("Menu"));

        let contents: Vec<&str> = out.chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["Apple is a technology company.", "Banana is a fruit."]
        );

        let ranked = out.ranked.unwrap();
        assert_eq!(ranked[0].content, "Apple is a technology company.");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[tokio::test]
    async fn no_query_means_no_ranking() {
        let out = distiller(DistillConfig::default())
            .distill(&page(FRUIT))
            .await
            .unwrap();
        assert!(out.ranked.is_none());
        assert_eq!(out.content_hash, compute_hash(&out.markdown.raw_markdown));
        assert_eq!(out.url, "https://fruit.test/articles/1");
    }

    #[tokio::test]
    async fn fixture_page_resolves_links_and_cites() {
        let out = distiller(DistillConfig::default())
            .distill(&PageInput {
                html: fixture("article.html"),
                url: "https://systems-weekly.test/rust/ownership".into(),
                status_code: 200,
            })
            .await
            .unwrap();

        let md = &out.markdown;
        assert!(md.raw_markdown.contains("borrow checker"));
        assert!(!md.raw_markdown.contains("Subscribe to our newsletter"));
        assert!(md.raw_markdown.contains("https://systems-weekly.test/guides/lifetimes"));
        let refs = md.references_markdown.as_deref().unwrap();
        assert!(refs.starts_with("\n\n## References\n"));
        assert!(md.markdown_with_citations.as_deref().unwrap().contains("[lifetimes guide][1]"));
    }

    #[tokio::test]
    async fn polish_result_flows_into_markdown() {
        let polish = PolishOptions::new(Arc::new(Rewrite(
            "```html\n<p>Polished summary of the apple article.</p>\n```",
        )));
        let out = distiller(DistillConfig::default().with_polish(polish))
            .distill(&page(FRUIT))
            .await
            .unwrap();
        assert_eq!(out.cleaned_html, "<p>Polished summary of the apple article.</p>");
        assert_eq!(out.markdown.raw_markdown, "Polished summary of the apple article.");
    }

    #[tokio::test]
    async fn polish_failure_keeps_heuristic_output() {
        let polish = PolishOptions::new(Arc::new(Offline));
        let out = distiller(DistillConfig::default().with_polish(polish))
            .distill(&page(FRUIT))
            .await
            .unwrap();
        assert!(out.markdown.raw_markdown.contains("Banana is a fruit."));
    }

    #[test]
    fn long_paragraphs_are_windowed() {
        let config = DistillConfig {
            chunking: ChunkingConfig {
                window_size: 4,
                overlap: 1,
                model: "test".into(),
            },
            ..DistillConfig::default()
        };
        let d = distiller(config);
        let chunks = d.chunk("one two\n\na bb ccc dddd eeeee ffffff").unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["one two", "w ww www wwww", "wwww wwwww wwwwww"]
        );
    }

    #[test]
    fn semantic_ranking_uses_configured_threshold() {
        let d = distiller(DistillConfig::default());
        let chunks = [
            EmbeddedChunk {
                content: "match".into(),
                embedding: vec![1.0, 0.0],
            },
            EmbeddedChunk {
                content: "miss".into(),
                embedding: vec![0.0, 1.0],
            },
        ];
        let out = d.rank_semantic(&chunks, Some(&[1.0, 0.0])).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, "match");
    }

    #[test]
    fn app_config_without_polish_needs_no_key() {
        let config = DistillConfig::from_app_config(&AppConfig::default()).unwrap();
        assert!(config.polish.is_none());
        assert!(config.query.is_none());
    }

    #[test]
    fn hash_is_stable_hex() {
        let hash = compute_hash("hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn distill_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}
        let d = distiller(DistillConfig::default());
        let input = page(FRUIT);
        let fut = d.distill(&input);
        assert_send(&fut);
    }
}
