use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a rich-content node
///
/// Stable for the lifetime of the node: moving a node between pages keeps
/// its id, so cursors can follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A single rich-content node (text run or element subtree)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Text run (entities already decoded)
    Text(String),

    /// Block, inline, or void element
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Layout category of an element tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    /// Starts its own line box (`p`, `h1`, `div`, ...)
    Block,
    /// Flows within a line (`b`, `span`, `a`, ...)
    Inline,
    /// Embedded media (`img`)
    Media,
    /// Line break (`br`)
    Break,
    /// Horizontal rule (`hr`)
    Rule,
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol", "li",
    "section", "article", "figure", "table", "tr",
];

/// Elements that never have children or a closing tag
pub const VOID_TAGS: &[&str] = &["img", "br", "hr", "input", "meta", "link", "wbr"];

impl TagCategory {
    pub fn of(tag: &str) -> Self {
        match tag {
            "img" => TagCategory::Media,
            "br" => TagCategory::Break,
            "hr" => TagCategory::Rule,
            t if BLOCK_TAGS.contains(&t) => TagCategory::Block,
            _ => TagCategory::Inline,
        }
    }
}

/// Whether `tag` is a void element
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

impl Node {
    pub fn text(id: NodeId, content: impl Into<String>) -> Self {
        Self {
            id,
            kind: NodeKind::Text(content.into()),
        }
    }

    pub fn element(id: NodeId, tag: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            id,
            kind: NodeKind::Element(Element {
                tag: tag.into().to_ascii_lowercase(),
                attributes: Vec::new(),
                children,
            }),
        }
    }

    /// Builder: add an attribute (elements only; ignored on text)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let NodeKind::Element(element) = &mut self.kind {
            element.attributes.push(Attribute {
                name: name.into(),
                value: value.into(),
            });
        }
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(s) => Some(s),
            NodeKind::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Text(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag.as_str())
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Element(e) => &e.children,
            NodeKind::Text(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.kind {
            NodeKind::Element(e) => Some(&mut e.children),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.as_element()?
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Concatenated text of this node and all descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text(s) => out.push_str(s),
            NodeKind::Element(e) => e.children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    /// Number of chars of descendant text
    pub fn text_len(&self) -> usize {
        match &self.kind {
            NodeKind::Text(s) => s.chars().count(),
            NodeKind::Element(e) => e.children.iter().map(Node::text_len).sum(),
        }
    }

    /// A node is text-bearing when it has any descendant text
    pub fn is_text_bearing(&self) -> bool {
        self.text_len() > 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Depth-first search for `id` within this subtree (including self)
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        match &mut self.kind {
            NodeKind::Element(e) => e.children.iter_mut().find_map(|c| c.find_mut(id)),
            NodeKind::Text(_) => None,
        }
    }

    /// Parent of `id` within this subtree
    pub fn find_parent_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.children().iter().any(|c| c.id == id) {
            return Some(self);
        }
        match &mut self.kind {
            NodeKind::Element(e) => e.children.iter_mut().find_map(|c| c.find_parent_mut(id)),
            NodeKind::Text(_) => None,
        }
    }

    /// Text nodes of this subtree in document order
    pub fn text_nodes(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_text_nodes(&mut out);
        out
    }

    fn collect_text_nodes<'a>(&'a self, out: &mut Vec<&'a Node>) {
        match &self.kind {
            NodeKind::Text(_) => out.push(self),
            NodeKind::Element(e) => e.children.iter().for_each(|c| c.collect_text_nodes(out)),
        }
    }

    /// Char offset within this subtree's text at which `target` (a descendant
    /// text node) begins. `None` if `target` is not a text node in the subtree.
    pub fn text_offset_of(&self, target: NodeId) -> Option<usize> {
        let mut offset = 0;
        for node in self.text_nodes() {
            if node.id == target {
                return Some(offset);
            }
            offset += node.text_len();
        }
        None
    }

    /// Char offset within this subtree's text at which element `target` begins
    /// its `child_index`-th child. Used to flatten element-anchored positions.
    pub fn element_position_offset(&self, target: NodeId, child_index: usize) -> Option<usize> {
        let element = self.find(target)?;
        let start = self.offset_before(target)?;
        let inner: usize = element
            .children()
            .iter()
            .take(child_index)
            .map(Node::text_len)
            .sum();
        Some(start + inner)
    }

    /// Text offset at which the subtree rooted at `target` starts
    fn offset_before(&self, target: NodeId) -> Option<usize> {
        fn walk(node: &Node, target: NodeId, acc: &mut usize) -> bool {
            if node.id == target {
                return true;
            }
            match &node.kind {
                NodeKind::Text(s) => {
                    *acc += s.chars().count();
                    false
                }
                NodeKind::Element(e) => e.children.iter().any(|c| walk(c, target, acc)),
            }
        }

        let mut acc = 0;
        walk(self, target, &mut acc).then_some(acc)
    }

    /// Resolve a subtree-relative text offset to `(text node, local offset)`.
    ///
    /// Offsets at a boundary between two text nodes resolve to the end of the
    /// earlier one. Offsets past the end clamp to the end of the last text node.
    pub fn locate_text_offset(&self, offset: usize) -> Option<(NodeId, usize)> {
        let texts = self.text_nodes();
        let mut remaining = offset;
        for node in &texts {
            let len = node.text_len();
            if remaining <= len {
                return Some((node.id, remaining));
            }
            remaining -= len;
        }
        texts.last().map(|n| (n.id, n.text_len()))
    }

    /// Number of nodes in this subtree (including self)
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Node::node_count).sum::<usize>()
    }
}
