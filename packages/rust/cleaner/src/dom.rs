//! Thin DOM capability over `scraper`.
//!
//! Everything the cleaner needs from a parsed tree goes through [`Dom`]:
//! query by selector, read text and attributes, walk to a parent, and remove a
//! node. Nodes are addressed by their stable arena id, so scores can be keyed
//! by identity without holding borrows into the tree.
//!
//! Queries start at the root element. `scraper::Html::select` walks every node
//! in the arena, including detached ones, so it is never used here.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// HTML input for the cleaner: raw markup or an already-parsed tree.
pub enum HtmlSource<'a> {
    Raw(&'a str),
    Parsed(Html),
}

impl<'a> From<&'a str> for HtmlSource<'a> {
    fn from(html: &'a str) -> Self {
        Self::Raw(html)
    }
}

impl<'a> From<&'a String> for HtmlSource<'a> {
    fn from(html: &'a String) -> Self {
        Self::Raw(html.as_str())
    }
}

impl From<Html> for HtmlSource<'_> {
    fn from(doc: Html) -> Self {
        Self::Parsed(doc)
    }
}

/// A mutable parsed document.
pub struct Dom {
    html: Html,
}

impl Dom {
    /// Parse a full document. Malformed markup is repaired by the parser.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Parse a fragment (no implicit `<head>`/`<body>`).
    pub fn parse_fragment(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }

    /// Wrap an already-parsed tree.
    pub fn from_html(html: Html) -> Self {
        Self { html }
    }

    /// Build a document from either input form.
    pub fn from_source(source: HtmlSource<'_>) -> Self {
        match source {
            HtmlSource::Raw(html) => Self::parse(html),
            HtmlSource::Parsed(doc) => Self::from_html(doc),
        }
    }

    /// Ids of all attached elements matching `selector`, in document order.
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .root_element()
            .select(selector)
            .map(|el| el.id())
            .collect()
    }

    /// Ids of all attached elements below the root, in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .map(|el| el.id())
            .collect()
    }

    /// Borrow an element by id.
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.value().name())
    }

    /// Concatenated, trimmed-by-caller text of an element's subtree.
    pub fn text(&self, id: NodeId) -> String {
        self.element(id)
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
    }

    /// Read one attribute.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.value().attr(name))
    }

    /// `id class role` joined by spaces, for noise-pattern matching.
    pub fn attr_signature(&self, id: NodeId) -> String {
        let attr = |name| self.attr(id, name).unwrap_or("");
        format!("{} {} {}", attr("id"), attr("class"), attr("role"))
    }

    /// The parent element, if the node has one that is an element.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.html
            .tree
            .get(id)
            .and_then(|node| node.parent())
            .and_then(ElementRef::wrap)
            .map(|el| el.id())
    }

    /// Whether any attached descendant matches `selector`.
    pub fn has_descendant(&self, id: NodeId, selector: &Selector) -> bool {
        self.element(id)
            .is_some_and(|el| el.select(selector).next().is_some())
    }

    /// Inner HTML of an element, empty if it no longer exists.
    pub fn inner_html(&self, id: NodeId) -> String {
        self.element(id)
            .map(|el| el.inner_html())
            .unwrap_or_default()
    }

    /// Inner HTML of the first element matching `selector`.
    pub fn first_inner_html(&self, selector: &Selector) -> Option<String> {
        self.html
            .root_element()
            .select(selector)
            .next()
            .map(|el| el.inner_html())
    }

    /// Detach a node (and its subtree) from the document.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Detach every node in `ids`. Ids already inside a detached subtree are harmless.
    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = NodeId>) -> usize {
        let mut removed = 0;
        for id in ids {
            self.remove(id);
            removed += 1;
        }
        removed
    }

    /// Remove HTML comments anywhere in the document.
    pub fn remove_comments(&mut self) -> usize {
        let ids: Vec<NodeId> = self
            .html
            .tree
            .root()
            .descendants()
            .filter(|node| node.value().is_comment())
            .map(|node| node.id())
            .collect();
        self.remove_all(ids)
    }

    /// Serialize the whole document.
    pub fn html(&self) -> String {
        self.html.html()
    }

    /// Serialize the children of the root element. For fragments this is the
    /// fragment itself without the synthetic `<html>` wrapper.
    pub fn root_inner_html(&self) -> String {
        self.html.root_element().inner_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn removed_nodes_are_not_selected_again() {
        let mut dom = Dom::parse("<body><div><p>one</p></div><p>two</p></body>");
        let divs = dom.select(&sel("div"));
        assert_eq!(divs.len(), 1);
        dom.remove_all(divs);

        let texts: Vec<String> = dom
            .select(&sel("p"))
            .into_iter()
            .map(|id| dom.text(id))
            .collect();
        assert_eq!(texts, vec!["two".to_string()]);
    }

    #[test]
    fn attr_signature_joins_id_class_role() {
        let dom = Dom::parse(r#"<div id="a" class="b c" role="main">x</div>"#);
        let id = dom.select(&sel("div"))[0];
        assert_eq!(dom.attr_signature(id), "a b c main");
    }

    #[test]
    fn parent_walks_to_element() {
        let dom = Dom::parse("<body><article><p>hello</p></article></body>");
        let p = dom.select(&sel("p"))[0];
        let parent = dom.parent(p).unwrap();
        assert_eq!(dom.tag_name(parent), Some("article"));
        let grandparent = dom.parent(parent).unwrap();
        assert_eq!(dom.tag_name(grandparent), Some("body"));
    }

    #[test]
    fn comments_are_removed() {
        let mut dom = Dom::parse("<body><!-- hidden --><p>shown</p></body>");
        assert_eq!(dom.remove_comments(), 1);
        assert!(!dom.html().contains("hidden"));
        assert!(dom.html().contains("shown"));
    }

    #[test]
    fn fragment_serializes_without_wrapper() {
        let dom = Dom::parse_fragment("<p>alone</p>");
        assert_eq!(dom.root_inner_html(), "<p>alone</p>");
    }
}
