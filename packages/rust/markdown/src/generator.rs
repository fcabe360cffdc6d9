//! HTML in, [`MarkdownResult`] out.

use std::sync::Arc;

use tracing::{debug, instrument};

use distill_cleaner::{CleanHtmlOptions, clean_html};
use distill_shared::{MarkdownConfig, MarkdownResult, Result};

use crate::citations::{convert_to_citations, format_references};
use crate::convert::{HtmdConverter, MarkdownOptions, MarkdownTransformer};

/// Options for [`generate`].
#[derive(Clone)]
pub struct MarkdownGeneratorOptions {
    /// Pre-conversion cleanup.
    pub clean: CleanHtmlOptions,
    /// Settings for the default converter.
    pub markdown: MarkdownOptions,
    /// Produce the citation variant and reference list.
    pub enable_citations: bool,
    /// Replaces the default converter when set.
    pub custom_transformer: Option<Arc<dyn MarkdownTransformer>>,
}

impl Default for MarkdownGeneratorOptions {
    fn default() -> Self {
        Self {
            clean: CleanHtmlOptions::default(),
            markdown: MarkdownOptions::default(),
            enable_citations: true,
            custom_transformer: None,
        }
    }
}

impl std::fmt::Debug for MarkdownGeneratorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownGeneratorOptions")
            .field("clean", &self.clean)
            .field("markdown", &self.markdown)
            .field("enable_citations", &self.enable_citations)
            .field("custom_transformer", &self.custom_transformer.is_some())
            .finish()
    }
}

impl MarkdownGeneratorOptions {
    /// Generator settings from `[markdown]`, resolving links against
    /// `page_url` when the config asks for it.
    pub fn from_config(config: &MarkdownConfig, page_url: &str) -> Self {
        Self {
            markdown: if config.resolve_links {
                MarkdownOptions::for_page(page_url)
            } else {
                MarkdownOptions::default()
            },
            enable_citations: config.enable_citations,
            ..Self::default()
        }
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn MarkdownTransformer>) -> Self {
        self.custom_transformer = Some(transformer);
        self
    }
}

/// Pre-clean `html`, convert it, and optionally build the citation variant.
///
/// Empty input gives an empty result without citation fields.
#[instrument(skip_all, fields(len = html.len(), citations = options.enable_citations))]
pub fn generate(html: &str, options: &MarkdownGeneratorOptions) -> Result<MarkdownResult> {
    if html.is_empty() {
        return Ok(MarkdownResult::empty());
    }

    let cleaned = clean_html(html, &options.clean);

    let raw_markdown = match &options.custom_transformer {
        Some(transformer) => transformer.to_markdown(&cleaned)?,
        None => HtmdConverter::new(options.markdown.clone()).to_markdown(&cleaned)?,
    };

    if !options.enable_citations {
        debug!(md_len = raw_markdown.len(), "markdown generated");
        return Ok(MarkdownResult {
            raw_markdown,
            ..MarkdownResult::default()
        });
    }

    let citations = convert_to_citations(&raw_markdown);
    let references_markdown = format_references(&citations.references);
    debug!(
        md_len = raw_markdown.len(),
        references = citations.references.len(),
        "markdown generated"
    );

    Ok(MarkdownResult {
        raw_markdown,
        markdown_with_citations: Some(citations.markdown),
        references_markdown: Some(references_markdown),
    })
}
