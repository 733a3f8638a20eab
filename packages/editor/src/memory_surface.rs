//! # In-Memory Surface
//!
//! A [`RichTextSurface`] that keeps page content as node trees and measures
//! it with [`LayoutMetrics`]. Mirrors the observable behavior of a browser
//! host: detaching the node that holds the caret drops the caret, and node
//! ids survive moves between pages.

use crate::config::PageGeometry;
use crate::layout::LayoutMetrics;
use crate::surface::{Cursor, EditableSurface, PageId, RichTextSurface};
use crate::SurfaceError;
use folio_markup::{
    is_void_tag, parse_with_ids, serialize, IdGenerator, Node, NodeId, NodeKind, TagCategory,
};

#[derive(Debug, Clone)]
pub struct MemorySurface {
    pages: Vec<Vec<Node>>,
    ids: IdGenerator,
    metrics: LayoutMetrics,
    geometry: PageGeometry,
    cursor: Option<Cursor>,
    scrolled_to: Option<NodeId>,
}

impl MemorySurface {
    pub fn new(geometry: PageGeometry, metrics: LayoutMetrics) -> Self {
        Self {
            pages: Vec::new(),
            ids: IdGenerator::new(),
            metrics,
            geometry,
            cursor: None,
            scrolled_to: None,
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    /// Node most recently brought into view
    pub fn scrolled_to(&self) -> Option<NodeId> {
        self.scrolled_to
    }

    /// Serialized content of every page, in order
    pub fn pages_markup(&self) -> Vec<String> {
        self.pages.iter().map(|nodes| serialize(nodes)).collect()
    }

    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        self.pages
            .iter()
            .flat_map(|nodes| nodes.iter())
            .find_map(|node| node.find(id))
    }

    fn find_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.pages
            .iter_mut()
            .flat_map(|nodes| nodes.iter_mut())
            .find_map(|node| node.find_mut(id))
    }

    /// `(page, index)` of the top-level node containing `id`
    fn top_level_position(&self, id: NodeId) -> Option<(usize, usize)> {
        self.pages.iter().enumerate().find_map(|(page, nodes)| {
            nodes
                .iter()
                .position(|node| node.contains(id))
                .map(|index| (page, index))
        })
    }

    fn page_index(&self, page: PageId) -> Result<usize, SurfaceError> {
        if page.0 < self.pages.len() {
            Ok(page.0)
        } else {
            Err(SurfaceError::PageNotFound(page.0))
        }
    }

    fn validate_cursor(&self, cursor: &Cursor) -> Result<(), SurfaceError> {
        let node = self
            .find_node(cursor.node)
            .ok_or(SurfaceError::NodeNotFound(cursor.node))?;
        let limit = match &node.kind {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::Element(element) => element.children.len(),
        };
        if cursor.offset > limit {
            return Err(SurfaceError::InvalidCursor(format!(
                "offset {} past end ({}) of {}",
                cursor.offset, limit, cursor.node
            )));
        }
        Ok(())
    }

    /// Current caret, or a caret at the end of the document.
    ///
    /// With no usable text at the end, an empty paragraph is appended to
    /// the last page to hold it.
    fn ensure_cursor(&mut self) -> Cursor {
        if let Some(cursor) = self.cursor {
            if self.validate_cursor(&cursor).is_ok() {
                return cursor;
            }
        }

        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last_page = self.pages.len() - 1;

        let anchor = self.pages[last_page].last().and_then(|node| {
            if node.is_text_bearing() {
                Some(Cursor::anchored_in(node, node.text_len()))
            } else if node.as_element().is_some_and(|e| !is_void_tag(&e.tag)) {
                Some(Cursor::new(node.id, node.children().len()))
            } else {
                None
            }
        });

        let cursor = match anchor {
            Some(cursor) => cursor,
            None => {
                let paragraph = Node::element(self.ids.new_id(), "p", Vec::new());
                let cursor = Cursor::start_of(paragraph.id);
                self.pages[last_page].push(paragraph);
                cursor
            }
        };

        self.cursor = Some(cursor);
        cursor
    }
}

impl RichTextSurface for MemorySurface {
    fn create_page(&mut self) -> PageId {
        self.pages.push(Vec::new());
        PageId(self.pages.len() - 1)
    }

    fn truncate_pages(&mut self, keep: usize) {
        self.pages.truncate(keep);
        if let Some(cursor) = self.cursor {
            if self.find_node(cursor.node).is_none() {
                self.cursor = None;
            }
        }
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn apply_geometry(&mut self, geometry: PageGeometry) {
        self.geometry = geometry;
    }

    fn page_nodes(&self, page: PageId) -> Result<&[Node], SurfaceError> {
        let index = self.page_index(page)?;
        Ok(&self.pages[index])
    }

    fn replace_page_content(&mut self, page: PageId, raw: &str) -> Result<(), SurfaceError> {
        let index = self.page_index(page)?;
        self.pages[index] = parse_with_ids(raw, &mut self.ids);
        if let Some(cursor) = self.cursor {
            if self.find_node(cursor.node).is_none() {
                self.cursor = None;
            }
        }
        Ok(())
    }

    fn take_last_node(&mut self, page: PageId) -> Result<Option<Node>, SurfaceError> {
        let index = self.page_index(page)?;
        let node = self.pages[index].pop();
        if let (Some(node), Some(cursor)) = (&node, self.cursor) {
            if node.contains(cursor.node) {
                self.cursor = None;
            }
        }
        Ok(node)
    }

    fn prepend_node(&mut self, page: PageId, node: Node) -> Result<(), SurfaceError> {
        let index = self.page_index(page)?;
        self.pages[index].insert(0, node);
        Ok(())
    }

    fn content_extent(&self, page: PageId) -> Result<f32, SurfaceError> {
        let nodes = self.page_nodes(page)?;
        Ok(self
            .metrics
            .measure_nodes(nodes, self.geometry.content_width))
    }

    fn page_of_node(&self, node: NodeId) -> Option<PageId> {
        self.top_level_position(node).map(|(page, _)| PageId(page))
    }

    fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: Cursor) -> Result<(), SurfaceError> {
        self.validate_cursor(&cursor)?;
        self.cursor = Some(cursor);
        Ok(())
    }

    fn scroll_into_view(&mut self, node: NodeId) {
        self.scrolled_to = Some(node);
    }
}

impl EditableSurface for MemorySurface {
    fn insert_text(&mut self, text: &str) -> Result<NodeId, SurfaceError> {
        let cursor = self.ensure_cursor();
        let inserted = text.chars().count();

        if let Some((page, index)) = self.void_top_level(cursor.node) {
            // Caret on a top-level image or rule: type into a new paragraph after it
            let text_node = Node::text(self.ids.new_id(), text);
            let text_id = text_node.id;
            let paragraph = Node::element(self.ids.new_id(), "p", vec![text_node]);
            self.pages[page].insert(index + 1, paragraph);
            self.cursor = Some(Cursor::new(text_id, inserted));
            return Ok(text_id);
        }

        let (target, offset) = self.resolve_void_cursor(cursor);
        let new_id = self.ids.new_id();
        let node = self
            .find_node_mut(target)
            .ok_or(SurfaceError::NodeNotFound(target))?;

        let caret = match &mut node.kind {
            NodeKind::Text(existing) => {
                let at = byte_index(existing, offset);
                existing.insert_str(at, text);
                Cursor::new(target, offset + inserted)
            }
            NodeKind::Element(element) => {
                let at = offset.min(element.children.len());
                match at.checked_sub(1).map(|i| &mut element.children[i]) {
                    Some(Node {
                        id,
                        kind: NodeKind::Text(previous),
                    }) => {
                        previous.push_str(text);
                        Cursor::new(*id, previous.chars().count())
                    }
                    _ => {
                        element.children.insert(at, Node::text(new_id, text));
                        Cursor::new(new_id, inserted)
                    }
                }
            }
        };

        self.cursor = Some(caret);
        Ok(caret.node)
    }

    fn delete_backward(&mut self) -> Result<Option<NodeId>, SurfaceError> {
        let Some(cursor) = self.cursor else {
            return Ok(None);
        };
        let Some((page, index)) = self.top_level_position(cursor.node) else {
            return Ok(None);
        };

        let block = &mut self.pages[page][index];
        let relative = cursor.relative_offset_in(block).unwrap_or(0);

        if relative > 0 {
            let Some((text_id, local)) = char_position(block, relative - 1) else {
                return Ok(None);
            };
            if let Some(NodeKind::Text(text)) = block.find_mut(text_id).map(|n| &mut n.kind) {
                let at = byte_index(text, local);
                text.remove(at);
            }
            self.cursor = Some(Cursor::new(text_id, local));
            return Ok(Some(text_id));
        }

        // Caret at the start of a block: merge into the previous block on this page
        if index == 0 {
            return Ok(None);
        }
        let mergeable = |node: &Node| {
            node.tag()
                .is_some_and(|tag| TagCategory::of(tag) == TagCategory::Block)
        };
        if !mergeable(&self.pages[page][index]) || !mergeable(&self.pages[page][index - 1]) {
            return Ok(None);
        }

        let current = self.pages[page].remove(index);
        let previous = &mut self.pages[page][index - 1];
        let join_offset = previous.text_len();
        let child_count = previous.children().len();
        if let (Some(children), NodeKind::Element(moved)) = (previous.children_mut(), current.kind) {
            children.extend(moved.children);
        }

        let caret = if previous.is_text_bearing() {
            Cursor::anchored_in(previous, join_offset)
        } else {
            Cursor::new(previous.id, child_count)
        };
        let merged_id = previous.id;
        self.cursor = Some(caret);
        Ok(Some(merged_id))
    }

    fn split_block(&mut self) -> Result<NodeId, SurfaceError> {
        let cursor = self.ensure_cursor();
        let (page, index) = self
            .top_level_position(cursor.node)
            .ok_or(SurfaceError::NodeNotFound(cursor.node))?;

        let block = &mut self.pages[page][index];
        let tail = if block.tag().is_some_and(is_void_tag) {
            Node::element(self.ids.new_id(), "p", Vec::new())
        } else {
            let relative = cursor.relative_offset_in(block).unwrap_or(0);
            split_node_at(block, relative, &mut self.ids)
        };

        let caret = if tail.is_text_bearing() {
            Cursor::anchored_in(&tail, 0)
        } else {
            Cursor::start_of(tail.id)
        };
        let tail_id = tail.id;
        self.pages[page].insert(index + 1, tail);
        self.cursor = Some(caret);
        Ok(tail_id)
    }

    fn insert_markup(&mut self, raw: &str) -> Result<NodeId, SurfaceError> {
        let nodes = parse_with_ids(raw, &mut self.ids);
        let (first, last) = match (nodes.first(), nodes.last()) {
            (Some(first), Some(last)) => (first.id, Cursor::anchored_in(last, last.text_len())),
            _ => return Err(SurfaceError::NothingToInsert),
        };

        let (page, at) = match self.cursor.and_then(|c| self.top_level_position(c.node)) {
            Some((page, index)) => (page, index + 1),
            None => {
                if self.pages.is_empty() {
                    self.pages.push(Vec::new());
                }
                let page = self.pages.len() - 1;
                (page, self.pages[page].len())
            }
        };

        for (offset, node) in nodes.into_iter().enumerate() {
            self.pages[page].insert(at + offset, node);
        }
        self.cursor = Some(last);
        Ok(first)
    }
}

impl MemorySurface {
    /// `(page, index)` when `id` is a top-level void element
    fn void_top_level(&self, id: NodeId) -> Option<(usize, usize)> {
        let (page, index) = self.top_level_position(id)?;
        let node = &self.pages[page][index];
        (node.id == id && node.tag().is_some_and(is_void_tag)).then_some((page, index))
    }

    /// A caret on a nested void element moves to its parent, before it
    fn resolve_void_cursor(&mut self, cursor: Cursor) -> (NodeId, usize) {
        let is_void = self
            .find_node(cursor.node)
            .and_then(Node::tag)
            .is_some_and(is_void_tag);
        if !is_void {
            return (cursor.node, cursor.offset);
        }

        self.pages
            .iter_mut()
            .flat_map(|nodes| nodes.iter_mut())
            .find_map(|node| node.find_parent_mut(cursor.node))
            .and_then(|parent| {
                let index = parent.children().iter().position(|c| c.id == cursor.node)?;
                Some((parent.id, index))
            })
            .unwrap_or((cursor.node, cursor.offset))
    }
}

/// Byte index of the `chars`-th character
fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Text node containing the `index`-th char of `root`'s text
fn char_position(root: &Node, index: usize) -> Option<(NodeId, usize)> {
    let mut remaining = index;
    for node in root.text_nodes() {
        let len = node.text_len();
        if remaining < len {
            return Some((node.id, remaining));
        }
        remaining -= len;
    }
    None
}

/// Split `node` at a text offset; `node` keeps the head, the returned node
/// (fresh id, same tag and attributes) holds the tail.
fn split_node_at(node: &mut Node, offset: usize, ids: &mut IdGenerator) -> Node {
    match &mut node.kind {
        NodeKind::Text(text) => {
            let at = byte_index(text, offset);
            let tail = text.split_off(at);
            Node::text(ids.new_id(), tail)
        }
        NodeKind::Element(element) => {
            let mut consumed = 0;
            let mut split_at = element.children.len();
            let mut partial = None;

            for (i, child) in element.children.iter_mut().enumerate() {
                let len = child.text_len();
                if consumed + len <= offset {
                    consumed += len;
                    continue;
                }
                let local = offset - consumed;
                if local == 0 {
                    split_at = i;
                } else {
                    partial = Some(split_node_at(child, local, ids));
                    split_at = i + 1;
                }
                break;
            }

            let mut tail_children = element.children.split_off(split_at);
            if let Some(partial) = partial {
                tail_children.insert(0, partial);
            }

            let mut tail = Node::element(ids.new_id(), element.tag.clone(), tail_children);
            if let NodeKind::Element(tail_element) = &mut tail.kind {
                tail_element.attributes = element.attributes.clone();
            }
            tail
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> MemorySurface {
        let mut surface = MemorySurface::new(PageGeometry::new(600.0, 240.0), LayoutMetrics::default());
        surface.create_page();
        surface
    }

    #[test]
    fn test_replace_and_measure() {
        let mut surface = surface();
        surface
            .replace_page_content(PageId(0), "<p>a</p><p>b</p><p>c</p>")
            .unwrap();
        assert_eq!(surface.content_extent(PageId(0)).unwrap(), 72.0);
        assert_eq!(surface.page_markup(PageId(0)).unwrap(), "<p>a</p><p>b</p><p>c</p>");
    }

    #[test]
    fn test_missing_page_is_an_error() {
        let surface = surface();
        assert_eq!(
            surface.content_extent(PageId(3)),
            Err(SurfaceError::PageNotFound(3))
        );
    }

    #[test]
    fn test_take_last_node_drops_contained_cursor() {
        let mut surface = surface();
        surface.replace_page_content(PageId(0), "<p>a</p><p>bc</p>").unwrap();
        let text = surface.page_nodes(PageId(0)).unwrap()[1].children()[0].id;
        surface.set_cursor(Cursor::new(text, 1)).unwrap();

        let moved = surface.take_last_node(PageId(0)).unwrap().unwrap();
        assert_eq!(moved.text_content(), "bc");
        assert_eq!(surface.cursor(), None);
    }

    #[test]
    fn test_take_last_node_keeps_unrelated_cursor() {
        let mut surface = surface();
        surface.replace_page_content(PageId(0), "<p>a</p><p>bc</p>").unwrap();
        let text = surface.page_nodes(PageId(0)).unwrap()[0].children()[0].id;
        surface.set_cursor(Cursor::new(text, 1)).unwrap();

        surface.take_last_node(PageId(0)).unwrap();
        assert_eq!(surface.cursor(), Some(Cursor::new(text, 1)));
    }

    #[test]
    fn test_set_cursor_validates() {
        let mut surface = surface();
        surface.replace_page_content(PageId(0), "<p>abc</p>").unwrap();
        let text = surface.page_nodes(PageId(0)).unwrap()[0].children()[0].id;

        assert!(surface.set_cursor(Cursor::new(text, 3)).is_ok());
        assert!(matches!(
            surface.set_cursor(Cursor::new(text, 4)),
            Err(SurfaceError::InvalidCursor(_))
        ));
        assert_eq!(
            surface.set_cursor(Cursor::new(NodeId(999), 0)),
            Err(SurfaceError::NodeNotFound(NodeId(999)))
        );
    }

    #[test]
    fn test_typing_into_empty_surface_creates_paragraph() {
        let mut surface = surface();
        surface.insert_text("Hello").unwrap();
        surface.insert_text(", world").unwrap();
        assert_eq!(surface.pages_markup(), vec!["<p>Hello, world</p>"]);
    }

    #[test]
    fn test_insert_text_mid_word() {
        let mut surface = surface();
        surface.replace_page_content(PageId(0), "<p>héllo</p>").unwrap();
        let text = surface.page_nodes(PageId(0)).unwrap()[0].children()[0].id;
        surface.set_cursor(Cursor::new(text, 2)).unwrap();

        surface.insert_text("XY").unwrap();
        assert_eq!(surface.pages_markup(), vec!["<p>héXYllo</p>"]);
        assert_eq!(surface.cursor(), Some(Cursor::new(text, 4)));
    }

    #[test]
    fn test_split_block_moves_tail_and_caret() {
        let mut surface = surface();
        surface
            .replace_page_content(PageId(0), "<p class=\"x\">ab<b>cd</b>ef</p>")
            .unwrap();
        let bold_text = surface.page_nodes(PageId(0)).unwrap()[0].children()[1].children()[0].id;
        surface.set_cursor(Cursor::new(bold_text, 1)).unwrap();

        surface.split_block().unwrap();
        assert_eq!(
            surface.pages_markup(),
            vec![r#"<p class="x">ab<b>c</b></p><p class="x"><b>d</b>ef</p>"#]
        );

        let caret = surface.cursor().unwrap();
        let node = surface.find_node(caret.node).unwrap();
        assert_eq!(node.as_text(), Some("d"));
        assert_eq!(caret.offset, 0);
    }

    #[test]
    fn test_split_at_end_creates_empty_block() {
        let mut surface = surface();
        surface.insert_text("one").unwrap();
        surface.split_block().unwrap();
        surface.insert_text("two").unwrap();
        assert_eq!(surface.pages_markup(), vec!["<p>one</p><p>two</p>"]);
    }

    #[test]
    fn test_delete_backward_within_and_across_blocks() {
        let mut surface = surface();
        surface.insert_text("ab").unwrap();
        surface.split_block().unwrap();
        surface.insert_text("c").unwrap();

        surface.delete_backward().unwrap();
        assert_eq!(surface.pages_markup(), vec!["<p>ab</p><p></p>"]);

        // Start of the empty second paragraph: merge into the first
        surface.delete_backward().unwrap();
        assert_eq!(surface.pages_markup(), vec!["<p>ab</p>"]);

        surface.delete_backward().unwrap();
        assert_eq!(surface.pages_markup(), vec!["<p>a</p>"]);
    }

    #[test]
    fn test_delete_backward_without_cursor_is_noop() {
        let mut surface = surface();
        assert_eq!(surface.delete_backward().unwrap(), None);
    }

    #[test]
    fn test_insert_markup_after_current_block() {
        let mut surface = surface();
        surface.replace_page_content(PageId(0), "<p>a</p><p>c</p>").unwrap();
        let first = surface.page_nodes(PageId(0)).unwrap()[0].children()[0].id;
        surface.set_cursor(Cursor::new(first, 1)).unwrap();

        surface.insert_markup("<p>b</p>").unwrap();
        assert_eq!(surface.pages_markup(), vec!["<p>a</p><p>b</p><p>c</p>"]);
        assert_eq!(surface.insert_markup(""), Err(SurfaceError::NothingToInsert));
    }

    #[test]
    fn test_typing_after_image_opens_paragraph() {
        let mut surface = surface();
        surface
            .replace_page_content(PageId(0), r#"<img src="a.png">"#)
            .unwrap();
        surface.insert_text("caption").unwrap();
        assert_eq!(surface.pages_markup(), vec![r#"<img src="a.png"><p>caption</p>"#]);
    }

    #[test]
    fn test_page_of_node_finds_nested() {
        let mut surface = surface();
        surface.create_page();
        surface.replace_page_content(PageId(1), "<p><b>x</b></p>").unwrap();
        let nested = surface.page_nodes(PageId(1)).unwrap()[0].children()[0].children()[0].id;
        assert_eq!(surface.page_of_node(nested), Some(PageId(1)));
        assert_eq!(surface.page_of_node(NodeId(12345)), None);
    }
}
