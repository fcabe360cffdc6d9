//! Noise tags, noise attribute patterns, and fallback content selectors.

use std::sync::LazyLock;

use regex::RegexSet;
use scraper::Selector;

use distill_shared::CleanMode;

/// Tags that never carry main content.
pub const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "form", "button", "input", "select",
    "textarea", "nav", "footer", "header", "aside", "dialog", "canvas", "map", "picture",
    "source",
];

/// Media tags dropped when `exclude_media` is set.
pub const MEDIA_TAGS: &[&str] = &[
    "img", "video", "audio", "source", "track", "object", "embed", "figure", "picture",
];

/// Content containers tried in order when scoring finds nothing usable.
pub const FALLBACK_SELECTORS: &[&str] = &[
    "main",
    "article",
    r#"[role="main"]"#,
    ".main-content",
    "#main-content",
    ".content-area",
    "#content",
    ".post-content",
    ".blog-post",
    ".article-body",
    ".entry-content",
    ".page-content",
    ".section-content",
];

/// Matched against `id class role`, case-insensitively.
const NOISE_PATTERNS: &[&str] = &[
    r"cookie",
    r"popup",
    r"subscribe",
    r"newsletter",
    r"ad-?wrapper",
    r"advertisement",
    r"banner",
    r"social-share",
    r"share-buttons",
    r"(^|\s)sidebar(\s|$)",
    r"related-posts",
    r"recommended",
    r"comment",
    r"meta-info",
    r"author-box",
    r"breadcrumbs",
    r"navigation",
    r"(^|\s)menu(\s|$)",
    r"(^|\s)header(\s|$)",
    r"(^|\s)footer(\s|$)",
    r"copyright",
    r"disclaimer",
    r"modal",
    r"toast",
    r"widget",
    r"search",
    r"gdpr",
    r"consent",
    r"promo",
    r"sticky",
    r"chat",
    r"live-chat",
    r"intercom",
    r"crisp",
    r"zendesk",
    r"drift",
    r"hubspot",
    r"login",
    r"sign-up",
    r"register",
    r"overlay",
];

const ECOMMERCE_PATTERNS: &[&str] = &[
    r"cart",
    r"checkout",
    r"basket",
    r"shopify-section-header",
    r"shopify-section-footer",
    r"minicart",
    r"ajax-cart",
    r"add-to-cart",
    r"price-box",
    r"product-form",
    r"wishlist",
    r"compare",
    r"upsell",
    r"cross-sell",
];

static NOISE_SET: LazyLock<RegexSet> = LazyLock::new(|| case_insensitive_set(NOISE_PATTERNS));

static ECOMMERCE_SET: LazyLock<RegexSet> =
    LazyLock::new(|| case_insensitive_set(ECOMMERCE_PATTERNS));

fn case_insensitive_set(patterns: &[&str]) -> RegexSet {
    RegexSet::new(patterns.iter().map(|p| format!("(?i){p}"))).expect("valid noise patterns")
}

/// Whether an `id class role` signature marks an element as noise under `mode`.
pub fn is_noise_signature(signature: &str, mode: CleanMode) -> bool {
    if NOISE_SET.is_match(signature) {
        return true;
    }
    match mode {
        CleanMode::Lax => false,
        CleanMode::Moderate | CleanMode::Strict => ECOMMERCE_SET.is_match(signature),
    }
}

/// Whether an element is hidden through `hidden`, `aria-hidden` or an inline style.
pub fn is_hidden(hidden: bool, aria_hidden: Option<&str>, style: Option<&str>) -> bool {
    if hidden {
        return true;
    }
    if aria_hidden.is_some_and(|v| v.trim().eq_ignore_ascii_case("true")) {
        return true;
    }
    style.is_some_and(|s| {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

/// Parse a comma-joined tag list into one selector.
pub(crate) fn tag_selector(tags: &[&str]) -> Selector {
    Selector::parse(&tags.join(", ")).expect("valid tag selector")
}

pub(crate) static NOISE_TAG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| tag_selector(NOISE_TAGS));

pub(crate) static MEDIA_SELECTOR: LazyLock<Selector> = LazyLock::new(|| tag_selector(MEDIA_TAGS));

pub(crate) static CANDIDATE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| tag_selector(&["p", "div", "article", "section"]));

pub(crate) static EMPTY_CONTAINER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| tag_selector(&["div", "section", "span"]));

pub(crate) static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| tag_selector(&["img"]));

pub(crate) static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| tag_selector(&["body"]));

pub(crate) static FALLBACK: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    FALLBACK_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("valid fallback selector"))
        .collect()
});
