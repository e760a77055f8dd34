//! fOS DOM - Document Object Model
//!
//! Arena-based DOM tree with the selector matching, attribute access and
//! focus state needed to drive page-level accessibility.

mod node;
mod tree;
mod document;
mod selector;

use std::cell::RefCell;
use std::rc::Rc;

pub use node::{Attribute, ElementData, Node, NodeData};
pub use tree::{Ancestors, Children, Descendants, DomTree};
pub use document::{Document, FocusOptions};
pub use selector::{AttrSelector, Combinator, Compound, Selector, SelectorError};

/// Document shared between the page and its single-threaded collaborators
pub type SharedDocument = Rc<RefCell<Document>>;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check this is not the NONE sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }
}
