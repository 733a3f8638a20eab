use crate::ast::{is_void_tag, Attribute, Element, Node, NodeId, NodeKind};
use crate::entities;
use crate::error::{ParseError, ParseResult};
use crate::id_generator::IdGenerator;
use crate::tokenizer::{close_tag_name, split_open_tag, tokenize, Token};

/// Parser for serialized rich content
///
/// Works like a browser's fragment parser: in lenient mode stray closing tags
/// are dropped, unclosed elements are closed at end of input, and a `<` that
/// does not begin a tag is literal text. Strict mode reports those cases.
pub struct Parser<'src, 'ids> {
    tokens: Vec<(Token<'src>, std::ops::Range<usize>)>,
    pos: usize,
    ids: &'ids mut IdGenerator,
    strict: bool,
}

/// Element under construction
struct OpenElement {
    id: NodeId,
    tag: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
    opened_at: usize,
}

impl OpenElement {
    fn finish(self) -> Node {
        Node {
            id: self.id,
            kind: NodeKind::Element(Element {
                tag: self.tag,
                attributes: self.attributes,
                children: self.children,
            }),
        }
    }
}

impl<'src, 'ids> Parser<'src, 'ids> {
    pub fn new(source: &'src str, ids: &'ids mut IdGenerator) -> Self {
        Self {
            tokens: tokenize(source),
            pos: 0,
            ids,
            strict: false,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Parse the whole input into top-level nodes
    pub fn parse_fragment(&mut self) -> ParseResult<Vec<Node>> {
        let mut root: Vec<Node> = Vec::new();
        let mut stack: Vec<OpenElement> = Vec::new();

        while let Some((token, span)) = self.tokens.get(self.pos).cloned() {
            self.pos += 1;

            match token {
                Token::Text(raw) => {
                    let text = entities::decode(raw);
                    self.push_text(current_children(&mut root, &mut stack), &text);
                }
                Token::Lt => {
                    if self.strict {
                        return Err(ParseError::invalid_syntax(
                            span.start,
                            "'<' does not start a tag",
                        ));
                    }
                    self.push_text(current_children(&mut root, &mut stack), "<");
                }
                Token::OpenTag(slice) => {
                    let parts = split_open_tag(slice);
                    let tag = parts.name.to_ascii_lowercase();
                    let attributes = parts
                        .attributes
                        .iter()
                        .map(|(name, value)| Attribute {
                            name: name.to_ascii_lowercase(),
                            value: entities::decode(value).into_owned(),
                        })
                        .collect();

                    let element = OpenElement {
                        id: self.ids.new_id(),
                        tag,
                        attributes,
                        children: Vec::new(),
                        opened_at: span.start,
                    };

                    if parts.self_closing || is_void_tag(&element.tag) {
                        current_children(&mut root, &mut stack).push(element.finish());
                    } else {
                        stack.push(element);
                    }
                }
                Token::CloseTag(slice) => {
                    let tag = close_tag_name(slice).to_ascii_lowercase();

                    match stack.iter().rposition(|open| open.tag == tag) {
                        Some(index) => {
                            if self.strict && index + 1 != stack.len() {
                                let inner = &stack[stack.len() - 1];
                                return Err(ParseError::unclosed(inner.opened_at, &inner.tag));
                            }
                            while stack.len() > index {
                                close_top(&mut root, &mut stack);
                            }
                        }
                        None => {
                            if self.strict {
                                return Err(ParseError::unexpected_close(span.start, tag));
                            }
                        }
                    }
                }
            }
        }

        if self.strict {
            if let Some(open) = stack.last() {
                return Err(ParseError::unclosed(open.opened_at, &open.tag));
            }
        }

        while !stack.is_empty() {
            close_top(&mut root, &mut stack);
        }

        Ok(root)
    }

    /// Append text, merging with a preceding text run
    fn push_text(&mut self, children: &mut Vec<Node>, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Node {
            kind: NodeKind::Text(existing),
            ..
        }) = children.last_mut()
        {
            existing.push_str(text);
            return;
        }
        children.push(Node::text(self.ids.new_id(), text));
    }
}

fn current_children<'a>(root: &'a mut Vec<Node>, stack: &'a mut [OpenElement]) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(open) => &mut open.children,
        None => root,
    }
}

fn close_top(root: &mut Vec<Node>, stack: &mut Vec<OpenElement>) {
    if let Some(open) = stack.pop() {
        let node = open.finish();
        current_children(root, stack).push(node);
    }
}

/// Parse markup leniently with a fresh id generator
pub fn parse(source: &str) -> Vec<Node> {
    let mut ids = IdGenerator::new();
    parse_with_ids(source, &mut ids)
}

/// Parse markup leniently, drawing node ids from `ids`
pub fn parse_with_ids(source: &str, ids: &mut IdGenerator) -> Vec<Node> {
    // Lenient mode has no error paths
    Parser::new(source, ids).parse_fragment().unwrap_or_default()
}

/// Parse markup, rejecting stray or unclosed tags
pub fn parse_strict(source: &str) -> ParseResult<Vec<Node>> {
    let mut ids = IdGenerator::new();
    Parser::new(source, &mut ids).strict().parse_fragment()
}
