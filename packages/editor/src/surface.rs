//! # Rich-Text Surface
//!
//! Capability interface between the pagination engine and whatever hosts
//! the editable content (a DOM, a GPU text view, or [`MemorySurface`] in
//! tests and the CLI). The engine only needs to move top-level nodes
//! between pages, measure page content, and query/restore the caret.
//!
//! [`MemorySurface`]: crate::MemorySurface

use crate::config::PageGeometry;
use crate::SurfaceError;
use folio_markup::{serialize, Node, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a page's editable content area (0-based position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub usize);

impl PageId {
    pub fn position(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page#{}", self.0)
    }
}

/// Caret position
///
/// For a text node `offset` is a char offset into its text. For an element
/// it is a child index, the way DOM selections address element positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub node: NodeId,
    pub offset: usize,
}

impl Cursor {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Caret before the first child of `node`
    pub fn start_of(node: NodeId) -> Self {
        Self { node, offset: 0 }
    }

    /// Char offset of this caret within `root`'s text, if it lies inside `root`
    pub fn relative_offset_in(&self, root: &Node) -> Option<usize> {
        let target = root.find(self.node)?;
        if target.is_text() {
            Some(root.text_offset_of(self.node)? + self.offset)
        } else {
            root.element_position_offset(self.node, self.offset)
        }
    }

    /// Equivalent caret at `offset` chars into `root`.
    ///
    /// Text-bearing nodes get an exact text position; anything else falls
    /// back to the start of `root`.
    pub fn anchored_in(root: &Node, offset: usize) -> Self {
        match root.locate_text_offset(offset) {
            Some((node, local)) => Self::new(node, local),
            None => Self::start_of(root.id),
        }
    }
}

/// Host capability the pagination engine drives
pub trait RichTextSurface {
    /// Append an empty page content area
    fn create_page(&mut self) -> PageId;

    /// Drop every page after the first `keep` pages
    fn truncate_pages(&mut self, keep: usize);

    fn page_count(&self) -> usize;

    /// Update the content box every page is laid out in
    fn apply_geometry(&mut self, geometry: PageGeometry);

    /// Top-level nodes of a page, in order
    fn page_nodes(&self, page: PageId) -> Result<&[Node], SurfaceError>;

    /// Replace a page's content with parsed `raw` markup
    fn replace_page_content(&mut self, page: PageId, raw: &str) -> Result<(), SurfaceError>;

    /// Detach and return the last top-level node of a page.
    ///
    /// If the caret was inside the detached node the surface drops it.
    fn take_last_node(&mut self, page: PageId) -> Result<Option<Node>, SurfaceError>;

    /// Insert a node before the first top-level node of a page
    fn prepend_node(&mut self, page: PageId, node: Node) -> Result<(), SurfaceError>;

    /// Rendered height of a page's content
    fn content_extent(&self, page: PageId) -> Result<f32, SurfaceError>;

    /// Page holding `node` (at any depth)
    fn page_of_node(&self, node: NodeId) -> Option<PageId>;

    fn cursor(&self) -> Option<Cursor>;

    fn set_cursor(&mut self, cursor: Cursor) -> Result<(), SurfaceError>;

    fn scroll_into_view(&mut self, node: NodeId);

    /// Serialized content of a page
    fn page_markup(&self, page: PageId) -> Result<String, SurfaceError> {
        Ok(serialize(self.page_nodes(page)?))
    }
}

/// Editing primitives a host exposes for user input
///
/// Each operation returns the node that received the edit so the caller can
/// resolve which page raised it.
pub trait EditableSurface: RichTextSurface {
    /// Insert text at the caret
    fn insert_text(&mut self, text: &str) -> Result<NodeId, SurfaceError>;

    /// Delete the character before the caret. `None` when there is nothing
    /// to delete on the caret's line.
    fn delete_backward(&mut self) -> Result<Option<NodeId>, SurfaceError>;

    /// Split the caret's top-level block in two (Enter)
    fn split_block(&mut self) -> Result<NodeId, SurfaceError>;

    /// Parse `raw` and insert the nodes after the caret's top-level block
    fn insert_markup(&mut self, raw: &str) -> Result<NodeId, SurfaceError>;
}
