//! Light pre-conversion cleanup: drop unwanted tags and comments.

use scraper::Selector;
use tracing::debug;

use crate::dom::{Dom, HtmlSource};

/// Tags removed by default before Markdown conversion.
pub const DEFAULT_EXCLUDE_TAGS: &[&str] =
    &["script", "style", "noscript", "iframe", "svg", "link", "meta"];

/// Extra chrome removed when only the main content is wanted.
const CHROME_TAGS: &[&str] = &["nav", "footer", "header", "aside", "menu"];

/// Options for [`clean_html`].
#[derive(Debug, Clone)]
pub struct CleanHtmlOptions {
    /// Tags to remove outright.
    pub exclude_tags: Vec<String>,
    /// Strip `<!-- -->` comments.
    pub remove_comments: bool,
    /// Also remove nav, footer, header, aside and menu.
    pub only_main_content: bool,
}

impl Default for CleanHtmlOptions {
    fn default() -> Self {
        Self {
            exclude_tags: DEFAULT_EXCLUDE_TAGS.iter().map(|t| t.to_string()).collect(),
            remove_comments: true,
            only_main_content: false,
        }
    }
}

/// Remove excluded tags (and optionally comments and page chrome) and
/// re-serialize the document.
pub fn clean_html<'a>(html: impl Into<HtmlSource<'a>>, options: &CleanHtmlOptions) -> String {
    let mut dom = Dom::from_source(html.into());

    let mut tags: Vec<&str> = options.exclude_tags.iter().map(String::as_str).collect();
    if options.only_main_content {
        tags.extend_from_slice(CHROME_TAGS);
    }

    let mut removed = 0;
    for tag in tags {
        // Unknown or malformed tag names are skipped rather than failing the pass.
        let Ok(selector) = Selector::parse(tag) else {
            continue;
        };
        let ids = dom.select(&selector);
        removed += dom.remove_all(ids);
    }

    if options.remove_comments {
        removed += dom.remove_comments();
    }

    debug!(removed, "pre-clean complete");
    dom.html()
}
