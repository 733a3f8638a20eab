use crate::ast::{is_void_tag, Node, NodeKind};
use crate::entities::{escape_attribute, escape_text};

/// Serializer converts nodes back to markup
///
/// Output is canonical: lowercase tags, double-quoted attributes in original
/// order, void elements without a closing tag or slash. Canonical markup
/// re-parses to the same structure and re-serializes byte-for-byte.
#[derive(Debug, Default)]
pub struct Serializer {
    output: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: String::with_capacity(capacity),
        }
    }

    pub fn write_nodes(&mut self, nodes: &[Node]) -> &mut Self {
        for node in nodes {
            self.write_node(node);
        }
        self
    }

    pub fn write_node(&mut self, node: &Node) -> &mut Self {
        match &node.kind {
            NodeKind::Text(text) => escape_text(text, &mut self.output),
            NodeKind::Element(element) => {
                self.output.push('<');
                self.output.push_str(&element.tag);
                for attribute in &element.attributes {
                    self.output.push(' ');
                    self.output.push_str(&attribute.name);
                    self.output.push_str("=\"");
                    escape_attribute(&attribute.value, &mut self.output);
                    self.output.push('"');
                }
                self.output.push('>');

                if !is_void_tag(&element.tag) {
                    for child in &element.children {
                        self.write_node(child);
                    }
                    self.output.push_str("</");
                    self.output.push_str(&element.tag);
                    self.output.push('>');
                }
            }
        }
        self
    }

    pub fn finish(self) -> String {
        self.output
    }
}

/// Serialize nodes to canonical markup
pub fn serialize(nodes: &[Node]) -> String {
    let mut serializer = Serializer::new();
    serializer.write_nodes(nodes);
    serializer.finish()
}

/// Serialize a single node (and its subtree)
pub fn serialize_node(node: &Node) -> String {
    let mut serializer = Serializer::new();
    serializer.write_node(node);
    serializer.finish()
}
