//! Post-conversion cleanup passes.
//!
//! Each pass is a `&str -> String` function; [`run_pipeline`] applies them in
//! order.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Run every cleanup pass. Links are resolved only when `base_url` is set.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = collapse_blank_lines(md);
    result = fix_code_block_languages(&result);
    result = strip_layout_tags(&result);
    if let Some(base) = base_url {
        result = resolve_links(&result, base);
    }
    result = trim_trailing_whitespace(&result);
    result.trim_matches('\n').to_string()
}

// ---------------------------------------------------------------------------
// Fenced code
// ---------------------------------------------------------------------------

/// Apply `f` to the text between fenced code blocks. Fence lines and the code
/// inside them are copied through unchanged.
fn outside_fences(md: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(md.len());
    let mut prose = String::new();
    let mut in_fence = false;

    for line in md.split_inclusive('\n') {
        let is_fence = line.trim_start().starts_with("```");
        if in_fence {
            if is_fence {
                // The newline after a closing fence belongs to the following prose.
                let (fence, newline) = match line.strip_suffix('\n') {
                    Some(fence) => (fence, "\n"),
                    None => (line, ""),
                };
                out.push_str(fence);
                prose.push_str(newline);
                in_fence = false;
            } else {
                out.push_str(line);
            }
        } else if is_fence {
            out.push_str(&f(&prose));
            prose.clear();
            out.push_str(line);
            in_fence = true;
        } else {
            prose.push_str(line);
        }
    }

    out.push_str(&f(&prose));
    out
}

// ---------------------------------------------------------------------------
// Blank lines
// ---------------------------------------------------------------------------

/// Collapse any run of blank lines into one, so paragraphs are separated by
/// exactly `\n\n`. Blank lines inside fenced code are kept.
fn collapse_blank_lines(md: &str) -> String {
    static BLANK_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+\n").expect("valid regex"));

    outside_fences(md, |prose| BLANK_RUN_RE.replace_all(prose, "\n\n").into_owned())
}

// ---------------------------------------------------------------------------
// Code fences
// ---------------------------------------------------------------------------

/// Turn class-style hints (`language-js`, `lang-py`, `highlight-rust`) on a
/// fence into bare language names.
fn fix_code_block_languages(md: &str) -> String {
    static LANG_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^([ \t]*)```(?:language-|lang-|highlight-)([\w+#-]+)").expect("valid regex")
    });

    LANG_PREFIX_RE.replace_all(md, "$1```$2").into_owned()
}

// ---------------------------------------------------------------------------
// Stray layout tags
// ---------------------------------------------------------------------------

/// Remove layout tags that survived conversion, keeping their text. Fenced
/// code is left alone.
fn strip_layout_tags(md: &str) -> String {
    static LAYOUT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"</?(?:div|span|section|article|aside|header|footer|main|figure|figcaption|details|summary)(?:\s[^>]*)?/?>",
        )
        .expect("valid regex")
    });

    outside_fences(md, |prose| LAYOUT_TAG_RE.replace_all(prose, "").into_owned())
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Make relative link targets absolute against `base`. Images, fragments and
/// URLs that already carry a scheme are unchanged, as is fenced code. An
/// optional quoted title after the target is preserved.
fn resolve_links(md: &str, base: &Url) -> String {
    static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(!?)\[([^\]]*)\]\(([^)\s]+)((?:\s+"[^"]*")?)\)"#).expect("valid regex")
    });

    outside_fences(md, |prose| {
        LINK_RE
            .replace_all(prose, |caps: &Captures| {
                let whole = caps[0].to_string();
                let href = &caps[3];

                let is_image = !caps[1].is_empty();
                let is_absolute = Url::parse(href).is_ok();
                if is_image || is_absolute || href.starts_with('#') {
                    return whole;
                }

                match base.join(href) {
                    Ok(resolved) => format!("[{}]({resolved}{})", &caps[2], &caps[4]),
                    Err(_) => whole,
                }
            })
            .into_owned()
    })
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

fn trim_trailing_whitespace(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}
