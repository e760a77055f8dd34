//! DOM Tree (arena-based allocation)

use crate::{Node, NodeData, NodeId, Selector};

/// Arena-based DOM tree
///
/// Nodes are never freed while the tree lives. Detaching only clears
/// links, so a detached node keeps its id and can be attached again.
/// The arena therefore grows with every node created (parsed or imported
/// content included) and is released as a whole when the tree is dropped.
/// Text updates through [`set_text_content`](Self::set_text_content)
/// reuse an existing text child instead of allocating.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self { nodes: vec![Node::document()] }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if !id.is_valid() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !id.is_valid() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Number of nodes in the arena (including detached ones)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree holds nothing but the document node
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text))
    }

    /// Create a detached doctype
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push(Node::doctype(name))
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    /// elsewhere. Returns false if either id is unknown or the move would
    /// create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.get(parent).is_none() || self.get(child).is_none() || parent == child {
            return false;
        }
        if self.contains(child, parent) {
            return false;
        }
        self.detach(child);

        let last = self.nodes[parent.0 as usize].last_child;
        {
            let node = &mut self.nodes[child.0 as usize];
            node.parent = parent;
            node.prev_sibling = last;
            node.next_sibling = NodeId::NONE;
        }
        if last.is_valid() {
            self.nodes[last.0 as usize].next_sibling = child;
        } else {
            self.nodes[parent.0 as usize].first_child = child;
        }
        self.nodes[parent.0 as usize].last_child = child;
        true
    }

    /// Unlink a node from its parent and siblings
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if prev.is_valid() {
            self.nodes[prev.0 as usize].next_sibling = next;
        } else if parent.is_valid() {
            self.nodes[parent.0 as usize].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.0 as usize].prev_sibling = prev;
        } else if parent.is_valid() {
            self.nodes[parent.0 as usize].last_child = prev;
        }

        let node = &mut self.nodes[id.0 as usize];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Detach every child of `parent`
    pub fn remove_children(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = self.children(parent).collect();
        for child in children {
            self.detach(child);
        }
    }

    /// Parent id (NONE for root and detached nodes)
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE)
    }

    /// Direct children in order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Ancestors from parent upwards (excluding `id`)
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    /// Descendants in document (pre-)order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Inclusive containment check
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Check if the node is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.contains(self.root(), id)
    }

    /// Lowercased tag name for elements
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.tag.as_str())
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get(id)
            .and_then(|n| n.as_element())
            .is_some_and(|e| e.has_attr(name))
    }

    /// Set an attribute; ignored for non-elements
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(elem) = self.get_mut(id).and_then(|n| n.as_element_mut()) {
            elem.set_attr(name, value);
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.get_mut(id)?.as_element_mut()?.remove_attr(name)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.get(id).and_then(|n| n.as_text()) {
            return text.to_string();
        }
        self.descendants(id)
            .filter_map(|d| self.get(d).and_then(|n| n.as_text()))
            .collect()
    }

    /// Replace all children with a single text node (none if empty)
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let Some(NodeData::Text(content)) = self.get_mut(id).map(|n| &mut n.data) {
            *content = text.to_string();
            return;
        }

        // A lone text child is rewritten in place
        let only_child = self.get(id).map(|n| n.first_child).filter(|&child| {
            child.is_valid() && self.get(child).is_some_and(|c| !c.next_sibling.is_valid())
        });
        if let Some(child) = only_child {
            if let Some(NodeData::Text(content)) = self.get_mut(child).map(|n| &mut n.data) {
                *content = text.to_string();
                return;
            }
        }

        self.remove_children(id);
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(id, text_node);
        }
    }

    /// Check an element against a parsed selector
    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        selector.matches(self, id)
    }

    /// First descendant of `root` matching `selector`, in document order
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let selector = parse_or_warn(selector)?;
        self.descendants(root).find(|&id| selector.matches(self, id))
    }

    /// All descendants of `root` matching `selector`, in document order
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = parse_or_warn(selector) else {
            return Vec::new();
        };
        self.descendants(root)
            .filter(|&id| selector.matches(self, id))
            .collect()
    }

    /// Closest inclusive ancestor matching `selector`
    pub fn closest(&self, id: NodeId, selector: &str) -> Option<NodeId> {
        let selector = parse_or_warn(selector)?;
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&candidate| selector.matches(self, candidate))
    }

    /// Deep-copy `node` (and its subtree) from another tree into this one.
    /// The copy is returned detached.
    pub fn import_node(&mut self, from: &DomTree, node: NodeId) -> Option<NodeId> {
        let source = from.get(node)?;
        let copy = self.push(Node {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data: source.data.clone(),
        });
        for child in from.children(node) {
            if let Some(child_copy) = self.import_node(from, child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_or_warn(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!("Invalid selector {:?}: {}", selector, err);
            None
        }
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next;
        let node = self.tree.get(current)?;
        self.next = node.next_sibling;
        Some(current)
    }
}

/// Iterator over ancestors
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next;
        let node = self.tree.get(current)?;
        self.next = node.parent;
        Some(current)
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next;
        let node = self.tree.get(current)?;

        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            // Climb until a next sibling exists, stopping at the subtree root
            let mut cursor = current;
            loop {
                if cursor == self.root {
                    break NodeId::NONE;
                }
                let Some(n) = self.tree.get(cursor) else { break NodeId::NONE };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                cursor = n.parent;
                if !cursor.is_valid() || cursor == self.root {
                    break NodeId::NONE;
                }
            }
        };
        Some(current)
    }
}
