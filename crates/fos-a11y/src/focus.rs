//! Focus Management
//!
//! Moving keyboard and screen reader focus to new content after a visit.

use fos_dom::{Document, FocusOptions, NodeId};

/// Elements flagged to receive focus on page load
pub const AUTOFOCUS_SELECTOR: &str = "[autofocus]";

/// Containers whose descendants must never receive autofocus
pub const INERT_CONTAINER_SELECTOR: &str = r#"[inert], [aria-disabled], [aria-hidden="true"]"#;

/// Element to focus, by selector or by node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRef<'a> {
    Selector(&'a str),
    Element(NodeId),
}

impl<'a> From<&'a str> for FocusRef<'a> {
    fn from(selector: &'a str) -> Self {
        Self::Selector(selector)
    }
}

impl<'a> From<&'a String> for FocusRef<'a> {
    fn from(selector: &'a String) -> Self {
        Self::Selector(selector)
    }
}

impl From<NodeId> for FocusRef<'_> {
    fn from(id: NodeId) -> Self {
        Self::Element(id)
    }
}

/// First `[autofocus]` element in the body outside of inert, disabled or
/// hidden containers
pub fn get_autofocus_element(document: &Document) -> Option<NodeId> {
    let tree = document.tree();
    let body = document.body();
    if !body.is_valid() {
        return None;
    }
    tree.query_selector_all(body, AUTOFOCUS_SELECTOR)
        .into_iter()
        .find(|&id| tree.closest(id, INERT_CONTAINER_SELECTOR).is_none())
}

/// Focus the autofocus element, if there is one
///
/// Returns true when an autofocus element exists, whether or not it already
/// had focus. Does nothing while `enabled` is false.
pub fn focus_autofocus_element(document: &mut Document, enabled: bool) -> bool {
    if !enabled {
        return false;
    }
    let Some(element) = get_autofocus_element(document) else {
        return false;
    };
    if document.active_element() != Some(element) {
        document.focus(element, FocusOptions::default());
    }
    true
}

/// Focus an element without scrolling, making it focusable first
///
/// Unresolvable targets are ignored. A pre-existing `tabindex` is restored
/// afterwards; elements that had none keep `tabindex="-1"` so the screen
/// reader's reading position stays on the new content.
pub fn focus_element<'a>(document: &mut Document, target: impl Into<FocusRef<'a>>) -> bool {
    let element = match target.into() {
        FocusRef::Selector(selector) => document.query_selector(selector),
        FocusRef::Element(id) => Some(id),
    };
    let Some(element) = element.filter(|&id| document.tree().get(id).is_some_and(|n| n.is_element())) else {
        tracing::debug!("No focus target found");
        return false;
    };

    let tree = document.tree_mut();
    let previous = tree.get_attribute(element, "tabindex").map(str::to_string);
    tree.set_attribute(element, "tabindex", "-1");

    let focused = document.focus(element, FocusOptions { prevent_scroll: true });

    if let Some(tabindex) = previous {
        document.tree_mut().set_attribute(element, "tabindex", &tabindex);
    }
    focused
}
