//! Read-only HTML helpers: text, links, metadata, media, text density.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

fn sel(s: &str) -> Selector {
    Selector::parse(s).expect("valid selector")
}

static A_SEL: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| sel("title"));
static META_SEL: LazyLock<Selector> = LazyLock::new(|| sel("meta[content]"));
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| sel("img[src]"));
static VIDEO_SEL: LazyLock<Selector> = LazyLock::new(|| sel("video"));
static AUDIO_SEL: LazyLock<Selector> = LazyLock::new(|| sel("audio"));
static SOURCE_SEL: LazyLock<Selector> = LazyLock::new(|| sel("source[src]"));

/// Page-level metadata from `<title>` and `<meta>` tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
    pub published_time: Option<String>,
    /// OpenGraph properties without the `og:` prefix.
    pub og: BTreeMap<String, String>,
    /// Twitter card fields without the `twitter:` prefix.
    pub twitter: BTreeMap<String, String>,
}

/// Kind of a media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

/// One image, video or audio resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srcset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    /// `<source>` children, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// All media on a page, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMedia {
    pub images: Vec<MediaItem>,
    pub videos: Vec<MediaItem>,
    pub audio: Vec<MediaItem>,
}

/// Plain text of a document or fragment, trimmed.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    doc.root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

/// Every `href` of every `<a>`, in document order.
pub fn extract_links(doc: &Html) -> Vec<String> {
    doc.root_element()
        .select(&A_SEL)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Title, description, author and social-card metadata.
pub fn extract_metadata(doc: &Html) -> PageMetadata {
    let root = doc.root_element();
    let mut meta = PageMetadata {
        title: root
            .select(&TITLE_SEL)
            .next()
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default(),
        ..PageMetadata::default()
    };

    let mut date = None;
    for el in root.select(&META_SEL) {
        let attrs = el.value();
        let Some(content) = attrs.attr("content") else {
            continue;
        };
        let content = content.to_string();

        if let Some(name) = attrs.attr("name") {
            match name {
                "description" => meta.description.get_or_insert(content),
                "keywords" => meta.keywords.get_or_insert(content),
                "author" => meta.author.get_or_insert(content),
                "date" => date.get_or_insert(content),
                _ => match name.strip_prefix("twitter:") {
                    Some(key) => meta.twitter.entry(key.to_string()).or_insert(content),
                    None => continue,
                },
            };
        } else if let Some(property) = attrs.attr("property") {
            if property == "article:published_time" {
                meta.published_time.get_or_insert(content);
            } else if let Some(key) = property.strip_prefix("og:") {
                meta.og.entry(key.to_string()).or_insert(content);
            }
        }
    }

    if meta.published_time.is_none() {
        meta.published_time = date;
    }
    meta
}

/// Images, videos and audio with their sources.
pub fn extract_media(doc: &Html) -> PageMedia {
    let root = doc.root_element();
    let mut media = PageMedia::default();

    for img in root.select(&IMG_SEL) {
        let attrs = img.value();
        let owned = |name: &str| attrs.attr(name).map(str::to_string);
        if let Some(src) = owned("src") {
            media.images.push(MediaItem {
                kind: MediaKind::Image,
                src,
                alt: owned("alt"),
                srcset: owned("srcset"),
                width: owned("width"),
                height: owned("height"),
                poster: None,
                sources: Vec::new(),
            });
        }
    }

    for (selector, kind) in [(&*VIDEO_SEL, MediaKind::Video), (&*AUDIO_SEL, MediaKind::Audio)] {
        for el in root.select(selector) {
            let sources: Vec<String> = el
                .select(&SOURCE_SEL)
                .filter_map(|s| s.value().attr("src"))
                .map(str::to_string)
                .collect();
            let src = el
                .value()
                .attr("src")
                .map(str::to_string)
                .or_else(|| sources.first().cloned());
            let Some(src) = src else {
                continue;
            };
            let poster = match kind {
                MediaKind::Video => el.value().attr("poster").map(str::to_string),
                _ => None,
            };
            let item = MediaItem {
                kind,
                src,
                alt: None,
                srcset: None,
                width: None,
                height: None,
                poster,
                sources,
            };
            match kind {
                MediaKind::Video => media.videos.push(item),
                _ => media.audio.push(item),
            }
        }
    }

    media
}

/// Text length over markup length. 0 for empty input.
pub fn calculate_text_density(html: &str) -> f64 {
    if html.is_empty() {
        return 0.0;
    }
    let text = extract_text(html);
    text.len() as f64 / html.len() as f64
}
