//! DOM noise filtering and main-content extraction.
//!
//! [`clean_main_content`] strips structural noise, scores paragraph-like
//! blocks, and returns the inner HTML of the best-scoring container (with
//! semantic fallbacks). [`smart_clean`] adds the optional AI polish step.

pub mod dom;
pub mod extract;
pub mod patterns;
pub mod polish;
pub mod preclean;
pub mod scorer;

use tracing::{debug, instrument};

use distill_shared::{CleanMode, CleanerConfig};

pub use dom::{Dom, HtmlSource};
pub use extract::{
    MediaItem, MediaKind, PageMedia, PageMetadata, calculate_text_density, extract_links,
    extract_media, extract_metadata, extract_text,
};
pub use polish::{
    CompletionRequest, CompletionResponse, OpenAiCompatProvider, PolishOptions, TextCompletion,
    polish_fragment,
};
pub use preclean::{CleanHtmlOptions, clean_html};

use patterns::{
    BODY_SELECTOR, EMPTY_CONTAINER_SELECTOR, FALLBACK, IMG_SELECTOR, MEDIA_SELECTOR,
    NOISE_TAG_SELECTOR, is_hidden, is_noise_signature,
};

/// A chosen fragment shorter than this (trimmed) triggers the fallbacks.
const MIN_CONTENT_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options for [`smart_clean`] and [`clean_main_content`].
#[derive(Debug, Clone, Default)]
pub struct SmartCleanOptions {
    /// Drop images, video, audio and other embedded media.
    pub exclude_media: bool,
    /// How aggressive attribute-based noise removal is.
    pub mode: CleanMode,
    /// Optional AI polish of the heuristic result.
    pub polish: Option<PolishOptions>,
}

impl From<&CleanerConfig> for SmartCleanOptions {
    fn from(config: &CleanerConfig) -> Self {
        Self {
            exclude_media: config.exclude_media,
            mode: config.mode,
            polish: None,
        }
    }
}

impl SmartCleanOptions {
    pub fn with_polish(mut self, polish: PolishOptions) -> Self {
        self.polish = Some(polish);
        self
    }
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Run the heuristic cleaner and, if configured, the AI polish step.
///
/// Never fails: malformed markup is repaired by the parser and polish errors
/// fall back to the heuristic fragment.
#[instrument(skip_all, fields(len = html.len(), mode = ?options.mode))]
pub async fn smart_clean(html: &str, options: &SmartCleanOptions) -> String {
    let fragment = clean_main_content(html, options);
    match &options.polish {
        Some(polish) => polish_fragment(fragment, polish).await,
        None => fragment,
    }
}

/// Extract the main content of a page as an HTML fragment.
///
/// Accepts raw markup or an already-parsed [`scraper::Html`].
pub fn clean_main_content<'a>(
    source: impl Into<HtmlSource<'a>>,
    options: &SmartCleanOptions,
) -> String {
    let mut dom = Dom::from_source(source.into());

    strip_noise(&mut dom, options);

    let scores = scorer::score_candidates(&dom);
    let mut content = match scores.top() {
        Some((id, score)) => {
            debug!(score, tag = dom.tag_name(id), "top content candidate");
            dom.inner_html(id)
        }
        None => String::new(),
    };

    if is_too_short(&content) {
        let fallback = FALLBACK.iter().find_map(|selector| {
            dom.first_inner_html(selector)
                .filter(|html| html.trim().chars().count() > MIN_CONTENT_CHARS)
        });
        if let Some(html) = fallback {
            debug!("using fallback content selector");
            content = html;
        }
    }

    if is_too_short(&content) {
        debug!("falling back to document body");
        content = dom
            .first_inner_html(&BODY_SELECTOR)
            .filter(|html| !html.is_empty())
            .unwrap_or_else(|| dom.html());
    }

    remove_empty_containers(&content)
}

fn is_too_short(html: &str) -> bool {
    html.trim().chars().count() < MIN_CONTENT_CHARS
}

/// Steps before scoring: noise tags, noise attributes, hidden elements, media.
fn strip_noise(dom: &mut Dom, options: &SmartCleanOptions) {
    let tags = dom.select(&NOISE_TAG_SELECTOR);
    let removed_tags = dom.remove_all(tags);

    let noisy: Vec<_> = dom
        .elements()
        .into_iter()
        .filter(|&id| !matches!(dom.tag_name(id), Some("html" | "body")))
        .filter(|&id| {
            is_noise_signature(&dom.attr_signature(id), options.mode)
                || (options.mode == CleanMode::Strict
                    && is_hidden(
                        dom.attr(id, "hidden").is_some(),
                        dom.attr(id, "aria-hidden"),
                        dom.attr(id, "style"),
                    ))
        })
        .collect();
    let removed_attrs = dom.remove_all(noisy);

    let removed_media = if options.exclude_media {
        let media = dom.select(&MEDIA_SELECTOR);
        dom.remove_all(media)
    } else {
        0
    };

    debug!(removed_tags, removed_attrs, removed_media, "noise stripped");
}

/// Drop `div`, `section` and `span` elements with no text and no image.
fn remove_empty_containers(fragment: &str) -> String {
    let mut dom = Dom::parse_fragment(fragment);
    let empty: Vec<_> = dom
        .select(&EMPTY_CONTAINER_SELECTOR)
        .into_iter()
        .filter(|&id| dom.text(id).trim().is_empty() && !dom.has_descendant(id, &IMG_SELECTOR))
        .collect();
    dom.remove_all(empty);
    dom.root_inner_html()
}
