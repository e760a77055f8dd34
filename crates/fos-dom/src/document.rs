//! Document - High-level document API
//!
//! Wraps the arena tree with the cached `<html>`/`<head>`/`<body>` ids,
//! the document URL, and focus state.

use crate::{DomTree, NodeId};

/// Options for [`Document::focus`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusOptions {
    /// Keep the viewport where it is
    pub prevent_scroll: bool,
}

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
    /// Focused element, if any
    active_element: NodeId,
    /// Last element scrolled into view by a focus call
    scrolled_into_view: NodeId,
}

impl Document {
    /// Create a new document with `<html><head></head><body></body></html>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        tree.append_child(tree.root(), html);
        tree.append_child(html, head);
        tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
            active_element: NodeId::NONE,
            scrolled_into_view: NodeId::NONE,
        }
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            active_element: NodeId::NONE,
            scrolled_into_view: NodeId::NONE,
        }
    }

    /// Locate `<html>`, `<head>` and `<body>` after the tree was built
    /// externally (e.g. by the parser)
    pub fn finalize(&mut self) {
        let root = self.tree.root();
        self.html_element = self
            .tree
            .children(root)
            .find(|&id| self.tree.tag_name(id) == Some("html"))
            .unwrap_or(NodeId::NONE);
        let find_child = |tag: &str| {
            self.tree
                .children(self.html_element)
                .find(|&id| self.tree.tag_name(id) == Some(tag))
                .unwrap_or(NodeId::NONE)
        };
        self.head_element = find_child("head");
        self.body_element = find_child("body");
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Update document URL
    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    /// Text of the first `<title>` in `<head>`, whitespace-collapsed
    pub fn title(&self) -> String {
        self.title_element()
            .map(|id| {
                self.tree
                    .text_content(id)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    /// Set the `<title>`, creating it in `<head>` if needed
    pub fn set_title(&mut self, title: &str) {
        if !self.head_element.is_valid() {
            return;
        }
        let id = match self.title_element() {
            Some(id) => id,
            None => {
                let id = self.tree.create_element("title");
                self.tree.append_child(self.head_element, id);
                id
            }
        };
        self.tree.set_text_content(id, title);
    }

    fn title_element(&self) -> Option<NodeId> {
        if !self.head_element.is_valid() {
            return None;
        }
        self.tree
            .children(self.head_element)
            .find(|&id| self.tree.tag_name(id) == Some("title"))
    }

    /// `lang` attribute of the document element (empty if unset)
    pub fn lang(&self) -> &str {
        self.tree
            .get_attribute(self.html_element, "lang")
            .unwrap_or("")
    }

    /// Set the `lang` attribute of the document element
    pub fn set_lang(&mut self, lang: &str) {
        self.tree.set_attribute(self.html_element, "lang", lang);
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .find(|&node| self.tree.get_attribute(node, "id") == Some(id))
    }

    /// First element in the document matching `selector`
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.tree.query_selector(self.tree.root(), selector)
    }

    /// Currently focused element, falling back to `<body>` like browsers do
    pub fn active_element(&self) -> Option<NodeId> {
        if self.active_element.is_valid() && self.tree.is_connected(self.active_element) {
            Some(self.active_element)
        } else if self.body_element.is_valid() {
            Some(self.body_element)
        } else {
            None
        }
    }

    /// Whether `focus()` would succeed on this element
    ///
    /// Any element with a `tabindex` attribute is focusable, as are links
    /// with `href`, enabled form controls, iframes and editing hosts.
    pub fn is_focusable(&self, id: NodeId) -> bool {
        if !self.tree.is_connected(id) {
            return false;
        }
        let Some(elem) = self.tree.get(id).and_then(|n| n.as_element()) else {
            return false;
        };
        if elem
            .get_attr("tabindex")
            .is_some_and(|v| v.trim().parse::<i32>().is_ok())
        {
            return true;
        }
        match elem.tag.as_str() {
            "a" | "area" => elem.has_attr("href"),
            "button" | "select" | "textarea" => !elem.has_attr("disabled"),
            "input" => !elem.has_attr("disabled") && elem.get_attr("type") != Some("hidden"),
            "iframe" | "summary" => true,
            _ => elem
                .get_attr("contenteditable")
                .is_some_and(|v| v.is_empty() || v.eq_ignore_ascii_case("true")),
        }
    }

    /// Move focus to an element. Returns false (and changes nothing) if the
    /// element cannot receive focus.
    pub fn focus(&mut self, id: NodeId, options: FocusOptions) -> bool {
        if !self.is_focusable(id) {
            tracing::debug!("Element {:?} is not focusable", id);
            return false;
        }
        self.active_element = id;
        if !options.prevent_scroll {
            self.scrolled_into_view = id;
        }
        true
    }

    /// Drop focus back to the body
    pub fn blur(&mut self) {
        self.active_element = NodeId::NONE;
    }

    /// Scroll a connected element into view without moving focus
    pub fn scroll_into_view(&mut self, id: NodeId) -> bool {
        if !self.tree.is_connected(id) {
            return false;
        }
        self.scrolled_into_view = id;
        true
    }

    /// Element most recently scrolled into view
    pub fn scrolled_into_view(&self) -> Option<NodeId> {
        self.scrolled_into_view.is_valid().then_some(self.scrolled_into_view)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
