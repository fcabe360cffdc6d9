//! HTML-to-Markdown conversion.
//!
//! [`MarkdownTransformer`] is the conversion seam; [`HtmdConverter`] is the
//! default implementation on top of `htmd`.

use std::sync::LazyLock;

use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, Options};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use distill_shared::{DistillError, Result};

use crate::cleanup;

/// Converts an HTML string to Markdown.
pub trait MarkdownTransformer: Send + Sync {
    fn to_markdown(&self, html: &str) -> Result<String>;
}

impl<F> MarkdownTransformer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn to_markdown(&self, html: &str) -> Result<String> {
        Ok(self(html))
    }
}

/// Options for [`HtmdConverter`].
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    /// Relative link targets are resolved against this URL when set.
    pub base_url: Option<Url>,
}

impl MarkdownOptions {
    /// Options resolving links against `page_url`. An unparsable URL leaves
    /// links as they are.
    pub fn for_page(page_url: &str) -> Self {
        Self {
            base_url: Url::parse(page_url).ok(),
        }
    }
}

/// Tags whose content never reaches the Markdown.
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "head", "title"];

/// `htmd` with ATX headings, dash bullets and fenced code, plus pipe tables
/// and the cleanup passes.
#[derive(Debug, Clone, Default)]
pub struct HtmdConverter {
    options: MarkdownOptions,
}

impl HtmdConverter {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    fn converter() -> HtmlToMarkdown {
        HtmlToMarkdown::builder()
            .skip_tags(SKIP_TAGS.to_vec())
            .options(Options {
                heading_style: HeadingStyle::Atx,
                bullet_list_marker: BulletListMarker::Dash,
                code_block_style: CodeBlockStyle::Fenced,
                ..Options::default()
            })
            .build()
    }
}

impl MarkdownTransformer for HtmdConverter {
    fn to_markdown(&self, html: &str) -> Result<String> {
        let (html, tables) = extract_tables(html);

        let raw = Self::converter()
            .convert(&html)
            .map_err(|e| DistillError::Conversion(format!("htmd conversion failed: {e}")))?;
        debug!(raw_len = raw.len(), tables = tables.len(), "htmd conversion complete");

        let with_tables = restore_tables(&raw, &tables);
        Ok(cleanup::run_pipeline(&with_tables, self.options.base_url.as_ref()))
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

// `htmd` 0.1 has no table support: tables are swapped for placeholder
// paragraphs before conversion and for pipe tables afterwards.

const TABLE_PLACEHOLDER: &str = "DISTILLTABLEPLACEHOLDER";

static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));

/// Replace every outermost `<table>` with a numbered placeholder and return
/// the rendered pipe tables in the same order.
fn extract_tables(html: &str) -> (String, Vec<String>) {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let tables: Vec<ElementRef<'_>> = root
        .select(&TABLE_SEL)
        .filter(|table| {
            !table
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| a.value().name() == "table")
        })
        .collect();

    if tables.is_empty() {
        return (html.to_string(), Vec::new());
    }

    let mut serialized = doc.html();
    let mut rendered = Vec::with_capacity(tables.len());
    for (i, table) in tables.iter().enumerate() {
        serialized = serialized.replacen(
            &table.html(),
            &format!("<p>{TABLE_PLACEHOLDER}{i}</p>"),
            1,
        );
        rendered.push(table_to_markdown(table));
    }
    (serialized, rendered)
}

/// Render a table as a pipe table. The first row is the header.
fn table_to_markdown(table: &ElementRef<'_>) -> String {
    let mut rows: Vec<Vec<String>> = table
        .select(&ROW_SEL)
        .map(|tr| {
            tr.select(&CELL_SEL)
                .map(|cell| {
                    cell.text()
                        .collect::<String>()
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" ")
                        .replace('|', "\\|")
                })
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }
    for row in &mut rows {
        row.resize(columns, String::new());
    }

    let line = |cells: &[String]| format!("| {} |", cells.join(" | "));
    let separator = vec!["---".to_string(); columns];
    let mut out = vec![line(&rows[0]), line(&separator)];
    out.extend(rows[1..].iter().map(|row| line(row)));
    out.join("\n")
}

fn restore_tables(md: &str, tables: &[String]) -> String {
    // Highest index first so that placeholder 1 never clobbers placeholder 10.
    tables
        .iter()
        .enumerate()
        .rev()
        .fold(md.to_string(), |acc, (i, table)| {
            acc.replace(&format!("{TABLE_PLACEHOLDER}{i}"), table)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> String {
        HtmdConverter::default().to_markdown(html).unwrap()
    }

    #[test]
    fn headings_paragraphs_and_emphasis() {
        let md = convert("<h1>Hello World</h1><p>Some <strong>bold</strong> text.</p>");
        assert!(md.contains("# Hello World"));
        assert!(md.contains("**bold**"));
        assert!(!md.contains("<p>"));
    }

    #[test]
    fn lists_use_dash_bullets() {
        let md = convert("<ul><li>Item one</li><li>Item two</li></ul>");
        assert!(
            md.lines()
                .any(|l| l.trim_start().starts_with('-') && l.contains("Item one"))
        );
    }

    #[test]
    fn code_blocks_are_fenced_with_language() {
        let md = convert(
            r#"<pre><code class="language-rust">fn main() {
    println!("hello");
}</code></pre>"#,
        );
        assert!(md.contains("```rust"));
        assert!(md.contains("println!"));
    }

    #[test]
    fn scripts_and_styles_are_skipped() {
        let md = convert(
            "<html><head><title>Tab</title><style>p{}</style></head><body><script>x()</script><p>Body</p></body></html>",
        );
        assert_eq!(md, "Body");
    }

    #[test]
    fn tables_become_pipe_tables() {
        let md = convert(
            r#"<h2>Data</h2>
            <table>
                <thead><tr><th>Name</th><th>Value</th></tr></thead>
                <tbody>
                    <tr><td>foo</td><td>bar</td></tr>
                    <tr><td>baz</td><td>a|b</td></tr>
                </tbody>
            </table>
            <p>After</p>"#,
        );
        assert!(md.contains("| Name | Value |\n| --- | --- |\n| foo | bar |"));
        assert!(md.contains(r"| baz | a\|b |"));
        assert!(md.contains("After"));
        assert!(!md.contains(TABLE_PLACEHOLDER));
    }

    #[test]
    fn ragged_rows_are_padded() {
        let doc = Html::parse_fragment("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>");
        let table = doc.root_element().select(&TABLE_SEL).next().unwrap();
        assert_eq!(table_to_markdown(&table), "| a | b |\n| --- | --- |\n| c |  |");
    }

    #[test]
    fn relative_links_resolve_with_base_url() {
        let converter = HtmdConverter::new(MarkdownOptions::for_page("https://example.com/docs/page"));
        let md = converter
            .to_markdown(r#"<p><a href="/about">About</a></p>"#)
            .unwrap();
        assert_eq!(md, "[About](https://example.com/about)");
    }

    #[test]
    fn closures_are_transformers() {
        let shout = |html: &str| html.to_uppercase();
        assert_eq!(shout.to_markdown("<p>x</p>").unwrap(), "<P>X</P>");
    }
}
