//! Inline links to numbered citations.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use distill_shared::Citation;

/// `[text](url)` with an optional `"title"`. Reference-style and autolinks are
/// not recognized.
static INLINE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\]]+)\]\(([^)\s]+)(?:\s+"[^"]+")?\)"#).expect("valid regex")
});

/// Markdown with citations plus the reference list, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationOutput {
    pub markdown: String,
    pub references: Vec<Citation>,
}

/// Rewrite every inline link to `[text][n]`. Each distinct (trimmed) URL gets
/// one number, starting at 1, in order of first appearance.
pub fn convert_to_citations(markdown: &str) -> CitationOutput {
    let mut references: Vec<Citation> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    let rewritten = INLINE_LINK_RE.replace_all(markdown, |caps: &Captures| {
        let url = caps[2].trim();
        let index = match seen.get(url) {
            Some(&index) => index,
            None => {
                let index = references.len() + 1;
                references.push(Citation {
                    url: url.to_string(),
                    index,
                });
                seen.insert(url.to_string(), index);
                index
            }
        };
        format!("[{}][{index}]", &caps[1])
    });

    CitationOutput {
        markdown: rewritten.into_owned(),
        references,
    }
}

/// Render a `## References` section. No references renders as `""`.
pub fn format_references(references: &[Citation]) -> String {
    if references.is_empty() {
        return String::new();
    }

    let mut lines = vec!["\n\n## References\n".to_string()];
    lines.extend(references.iter().map(|r| format!("{}. {}", r.index, r.url)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_urls_share_one_citation() {
        let out = convert_to_citations("[a](https://x.test) and [b](https://x.test)");
        assert_eq!(out.markdown, "[a][1] and [b][1]");
        assert_eq!(out.references.len(), 1);
    }

    #[test]
    fn distinct_urls_number_in_first_seen_order() {
        let out = convert_to_citations(
            "[one](https://a.test) [two](https://b.test) [again](https://a.test) [three](https://c.test)",
        );
        assert_eq!(out.markdown, "[one][1] [two][2] [again][1] [three][3]");
        let urls: Vec<(usize, &str)> = out
            .references
            .iter()
            .map(|c| (c.index, c.url.as_str()))
            .collect();
        assert_eq!(
            urls,
            vec![(1, "https://a.test"), (2, "https://b.test"), (3, "https://c.test")]
        );
    }

    #[test]
    fn titles_are_dropped() {
        let out = convert_to_citations(r#"[Doc](https://d.test "Docs home")"#);
        assert_eq!(out.markdown, "[Doc][1]");
        assert_eq!(out.references[0].url, "https://d.test");
    }

    #[test]
    fn non_inline_forms_are_left_alone() {
        let text = "[ref][1] and <https://auto.test> and plain text";
        let out = convert_to_citations(text);
        assert_eq!(out.markdown, text);
        assert!(out.references.is_empty());
    }

    #[test]
    fn image_links_are_rewritten_too() {
        let out = convert_to_citations("![logo](https://x.test/logo.png)");
        assert_eq!(out.markdown, "![logo][1]");
    }

    #[test]
    fn references_render_numbered_list() {
        let refs = vec![
            Citation {
                url: "https://a.test".into(),
                index: 1,
            },
            Citation {
                url: "https://b.test".into(),
                index: 2,
            },
        ];
        assert_eq!(
            format_references(&refs),
            "\n\n## References\n\n1. https://a.test\n2. https://b.test"
        );
        assert_eq!(format_references(&[]), "");
    }
}
