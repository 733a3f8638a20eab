//! # Page Manager
//!
//! Owns the page sequence, the single structural representation of the
//! document. After an edit settles, the manager checks the page that raised
//! it and pushes trailing top-level nodes forward until every page fits:
//!
//! ```text
//! page i:   [a b c d]  extent > capacity
//!                  └─ d moves to the front of page i+1 (created if missing)
//! page i:   [a b c]    fits → continue with page i+1
//! page i+1: [d e f]
//! ```
//!
//! Concatenating the pages in order always reproduces the document. Moves
//! are whole top-level nodes, so a page holding a single node taller than
//! the page keeps it rather than looping forever.

use crate::config::PageGeometry;
use crate::events::{EditorEvent, EventBus};
use crate::page::{Page, PageSummary};
use crate::surface::{Cursor, PageId, RichTextSurface};
use crate::undo_stack::SnapshotTarget;
use crate::SurfaceError;
use folio_markup::NodeId;
use tracing::{debug, info, instrument, warn};

/// What raised an edit: a page content area, or a node somewhere inside one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    Page(PageId),
    Node(NodeId),
}

/// Tally of one reflow pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReflowReport {
    /// Top-level nodes moved to a following page
    pub moved: usize,

    /// Pages appended during the pass
    pub pages_created: usize,

    /// Whether the caret rode along with a moved node and was re-anchored
    pub cursor_restored: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Another pass was still running
    AlreadyProcessing,

    /// The origin does not belong to any page
    UnknownOrigin(EditOrigin),

    /// The surface failed mid-pass
    Aborted(SurfaceError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReflowOutcome {
    Completed(ReflowReport),
    Skipped(SkipReason),
}

impl ReflowOutcome {
    pub fn report(&self) -> Option<&ReflowReport> {
        match self {
            ReflowOutcome::Completed(report) => Some(report),
            ReflowOutcome::Skipped(_) => None,
        }
    }
}

pub struct PageManager<S: RichTextSurface> {
    surface: S,
    pages: Vec<Page>,
    geometry: PageGeometry,
    is_processing: bool,
    events: EventBus,
}

impl<S: RichTextSurface> PageManager<S> {
    /// Wrap a surface; pages the surface already holds are adopted.
    pub fn new(mut surface: S, geometry: PageGeometry, events: EventBus) -> Self {
        surface.apply_geometry(geometry);
        let pages = (0..surface.page_count())
            .map(|i| Page::new(PageId(i), geometry.capacity()))
            .collect();

        Self {
            surface,
            pages,
            geometry,
            is_processing: false,
            events,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn capacity(&self) -> f32 {
        self.geometry.capacity()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Append an empty page and return its content handle
    pub fn add_page(&mut self) -> PageId {
        let id = self.surface.create_page();
        let page = Page::new(id, self.geometry.capacity());
        debug!(page = %page.label(), "page added");
        self.pages.push(page);
        self.events.publish(EditorEvent::PageAdded { page: id });
        id
    }

    /// Page (by position) that raised `origin`
    pub fn resolve_origin(&self, origin: EditOrigin) -> Option<usize> {
        let page = match origin {
            EditOrigin::Page(page) => page,
            EditOrigin::Node(node) => self.surface.page_of_node(node)?,
        };
        self.pages.iter().position(|p| p.id() == page)
    }

    /// Reflow starting from the page that raised `origin`.
    ///
    /// Overlapping triggers are serialized: a pass requested while another
    /// is running is skipped, as is one whose origin is on no page. Surface
    /// failures abort the pass; the next idle tick retries.
    pub fn check_overflow(&mut self, origin: EditOrigin) -> ReflowOutcome {
        if self.is_processing {
            debug!(?origin, "overflow pass already running");
            return ReflowOutcome::Skipped(SkipReason::AlreadyProcessing);
        }

        let Some(start) = self.resolve_origin(origin) else {
            debug!(?origin, "edit origin is not on any page");
            return ReflowOutcome::Skipped(SkipReason::UnknownOrigin(origin));
        };

        self.is_processing = true;
        let result = self.propagate_content(start);
        self.is_processing = false;

        match result {
            Ok(report) => ReflowOutcome::Completed(report),
            Err(err) => {
                warn!(error = %err, start, "overflow pass aborted");
                ReflowOutcome::Skipped(SkipReason::Aborted(err))
            }
        }
    }

    fn overflows(&self, index: usize) -> Result<bool, SurfaceError> {
        let page = &self.pages[index];
        let extent = self.surface.content_extent(page.id())?;
        Ok(!page.fits(extent))
    }

    /// Move trailing nodes forward until every page from `start` on fits
    #[instrument(level = "debug", skip(self), fields(pages = self.pages.len()))]
    pub fn propagate_content(&mut self, start: usize) -> Result<ReflowReport, SurfaceError> {
        let mut report = ReflowReport::default();
        let mut index = start;

        while index < self.pages.len() {
            let page = self.pages[index].id();

            while self.overflows(index)? {
                let nodes = self.surface.page_nodes(page)?;
                if nodes.len() <= 1 {
                    debug!(page = %page, "single node exceeds page capacity, leaving it");
                    break;
                }

                // The surface drops the caret on detach, so read it first
                let relative = match (self.surface.cursor(), nodes.last()) {
                    (Some(cursor), Some(last)) => cursor.relative_offset_in(last),
                    _ => None,
                };

                let Some(node) = self.surface.take_last_node(page)? else {
                    break;
                };

                if index + 1 == self.pages.len() {
                    self.add_page();
                    report.pages_created += 1;
                }
                let next = self.pages[index + 1].id();

                let node_id = node.id;
                let anchor = relative.map(|offset| Cursor::anchored_in(&node, offset));
                self.surface.prepend_node(next, node)?;
                report.moved += 1;
                debug!(node = %node_id, from = %page, to = %next, "node migrated");

                if let Some(anchor) = anchor {
                    match self.surface.set_cursor(anchor) {
                        Ok(()) => {
                            self.surface.scroll_into_view(anchor.node);
                            report.cursor_restored = true;
                        }
                        Err(err) => warn!(error = %err, "could not restore cursor after move"),
                    }
                }

                self.events.publish(EditorEvent::ContentMigrated {
                    node: node_id,
                    from: page,
                    to: next,
                });
            }

            index += 1;
        }

        if report.moved > 0 {
            info!(
                moved = report.moved,
                pages_created = report.pages_created,
                pages = self.pages.len(),
                "reflow completed"
            );
        }
        self.events.publish(EditorEvent::ReflowCompleted {
            start: PageId(start),
            moved: report.moved,
            pages_created: report.pages_created,
            pages: self.pages.len(),
        });

        Ok(report)
    }

    /// Serialized content of every page, concatenated in order
    pub fn get_all_content(&self) -> Result<String, SurfaceError> {
        self.pages
            .iter()
            .map(|page| self.surface.page_markup(page.id()))
            .collect()
    }

    /// Replace the whole document and paginate it from scratch
    #[instrument(level = "debug", skip_all, fields(bytes = raw.len()))]
    pub fn load_content(&mut self, raw: &str) -> Result<ReflowReport, SurfaceError> {
        if self.pages.is_empty() {
            self.add_page();
        }
        self.pages.truncate(1);
        self.surface.truncate_pages(1);

        let first = self.pages[0].id();
        self.surface.replace_page_content(first, raw)?;
        let report = self.propagate_content(0)?;

        info!(pages = self.pages.len(), "content loaded");
        self.events.publish(EditorEvent::ContentLoaded {
            pages: self.pages.len(),
        });
        Ok(report)
    }

    /// Change the page box; the document is re-paginated from scratch and
    /// the caret is kept at the same document offset.
    pub fn set_geometry(&mut self, geometry: PageGeometry) -> Result<ReflowReport, SurfaceError> {
        let caret = self.cursor_document_offset();
        let content = self.get_all_content()?;

        self.geometry = geometry;
        self.surface.apply_geometry(geometry);
        for page in &mut self.pages {
            page.set_capacity(geometry.capacity());
        }

        let report = self.load_content(&content)?;
        if let Some(offset) = caret {
            self.restore_cursor_at(offset);
        }
        Ok(report)
    }

    pub fn set_capacity(&mut self, capacity: f32) -> Result<ReflowReport, SurfaceError> {
        self.set_geometry(PageGeometry::new(self.geometry.content_width, capacity))
    }

    /// Char offset of the caret within the whole document's text
    pub fn cursor_document_offset(&self) -> Option<usize> {
        let cursor = self.surface.cursor()?;
        let mut before = 0;
        for page in &self.pages {
            for node in self.surface.page_nodes(page.id()).ok()? {
                if node.contains(cursor.node) {
                    return cursor.relative_offset_in(node).map(|offset| before + offset);
                }
                before += node.text_len();
            }
        }
        None
    }

    /// Place the caret at a document char offset; returns whether it was set
    pub fn restore_cursor_at(&mut self, offset: usize) -> bool {
        let mut remaining = offset;
        let mut target = None;

        'pages: for page in &self.pages {
            let Ok(nodes) = self.surface.page_nodes(page.id()) else {
                continue;
            };
            for node in nodes {
                let len = node.text_len();
                if remaining <= len && node.is_text_bearing() {
                    target = Some(Cursor::anchored_in(node, remaining));
                    break 'pages;
                }
                remaining = remaining.saturating_sub(len);
            }
        }

        match target {
            Some(cursor) => self.surface.set_cursor(cursor).is_ok(),
            None => false,
        }
    }

    pub fn page_summaries(&self) -> Result<Vec<PageSummary>, SurfaceError> {
        self.pages
            .iter()
            .map(|page| {
                let extent = self.surface.content_extent(page.id())?;
                Ok(PageSummary {
                    index: page.index(),
                    label: page.label(),
                    node_count: self.surface.page_nodes(page.id())?.len(),
                    extent,
                    capacity: page.capacity(),
                    overflowing: !page.fits(extent),
                })
            })
            .collect()
    }

    /// Serialized content of each page
    pub fn page_contents(&self) -> Result<Vec<String>, SurfaceError> {
        self.pages
            .iter()
            .map(|page| self.surface.page_markup(page.id()))
            .collect()
    }
}

impl<S: RichTextSurface> SnapshotTarget for PageManager<S> {
    fn snapshot(&self) -> Result<String, SurfaceError> {
        self.get_all_content()
    }

    fn restore(&mut self, snapshot: &str) -> Result<(), SurfaceError> {
        self.load_content(snapshot).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutMetrics;
    use crate::MemorySurface;

    /// 75 chars per line, 5 lines per page
    fn manager() -> PageManager<MemorySurface> {
        let geometry = PageGeometry::new(600.0, 120.0);
        let surface = MemorySurface::new(geometry, LayoutMetrics::default());
        let mut manager = PageManager::new(surface, geometry, EventBus::new());
        manager.add_page();
        manager
    }

    fn paragraphs(count: usize) -> String {
        (1..=count).map(|i| format!("<p>line {i}</p>")).collect()
    }

    #[test]
    fn test_load_fitting_content_keeps_one_page() {
        let mut manager = manager();
        let report = manager.load_content(&paragraphs(5)).unwrap();
        assert_eq!(manager.page_count(), 1);
        assert_eq!(report.moved, 0);
    }

    #[test]
    fn test_load_overflowing_content_splits_pages() {
        let mut manager = manager();
        let source = paragraphs(12);
        let report = manager.load_content(&source).unwrap();

        assert_eq!(manager.page_count(), 3);
        assert_eq!(report.pages_created, 2);
        assert_eq!(manager.get_all_content().unwrap(), source);

        let contents = manager.page_contents().unwrap();
        assert_eq!(contents[0], paragraphs(5));
        assert!(contents[2].starts_with("<p>line 11</p>"));
    }

    #[test]
    fn test_propagate_is_idempotent() {
        let mut manager = manager();
        manager.load_content(&paragraphs(12)).unwrap();
        let report = manager.propagate_content(0).unwrap();
        assert_eq!(report, ReflowReport::default());
        assert_eq!(manager.page_count(), 3);
    }

    #[test]
    fn test_oversized_single_node_stays() {
        let mut manager = manager();
        let long = format!("<p>{}</p>", "x".repeat(75 * 8));
        manager.load_content(&long).unwrap();
        assert_eq!(manager.page_count(), 1);

        manager.load_content(&format!("<p>a</p>{long}")).unwrap();
        assert_eq!(manager.page_count(), 2);
        assert_eq!(manager.page_contents().unwrap()[1], long);
    }

    #[test]
    fn test_check_overflow_unknown_origin() {
        let mut manager = manager();
        manager.load_content(&paragraphs(3)).unwrap();
        let outcome = manager.check_overflow(EditOrigin::Page(PageId(7)));
        assert_eq!(
            outcome,
            ReflowOutcome::Skipped(SkipReason::UnknownOrigin(EditOrigin::Page(PageId(7))))
        );
        let outcome = manager.check_overflow(EditOrigin::Node(NodeId(9999)));
        assert!(matches!(outcome, ReflowOutcome::Skipped(SkipReason::UnknownOrigin(_))));
    }

    #[test]
    fn test_check_overflow_is_not_reentrant() {
        let mut manager = manager();
        manager.is_processing = true;
        let outcome = manager.check_overflow(EditOrigin::Page(PageId(0)));
        assert_eq!(outcome, ReflowOutcome::Skipped(SkipReason::AlreadyProcessing));
        assert_eq!(manager.page_count(), 1);
    }

    #[test]
    fn test_check_overflow_resolves_node_origin() {
        let mut manager = manager();
        manager.load_content(&paragraphs(5)).unwrap();
        manager
            .surface_mut()
            .prepend_node(PageId(0), folio_markup::Node::element(NodeId(5000), "p", vec![]))
            .unwrap();

        let outcome = manager.check_overflow(EditOrigin::Node(NodeId(5000)));
        let report = outcome.report().copied().unwrap();
        assert_eq!(report.moved, 1);
        assert_eq!(manager.page_count(), 2);
        assert!(!manager.is_processing());
    }

    #[test]
    fn test_cursor_follows_moved_node() {
        let mut manager = manager();
        manager.load_content(&paragraphs(5)).unwrap();

        let last = manager.surface().page_nodes(PageId(0)).unwrap()[4].children()[0].id;
        manager.surface_mut().set_cursor(Cursor::new(last, 3)).unwrap();
        let before = manager.cursor_document_offset();

        manager
            .surface_mut()
            .prepend_node(PageId(0), folio_markup::Node::element(NodeId(5000), "p", vec![]))
            .unwrap();
        let report = manager.propagate_content(0).unwrap();

        assert!(report.cursor_restored);
        assert_eq!(manager.surface().cursor(), Some(Cursor::new(last, 3)));
        assert_eq!(manager.surface().page_of_node(last), Some(PageId(1)));
        assert_eq!(manager.cursor_document_offset(), before);
        assert_eq!(manager.surface().scrolled_to(), Some(last));
    }

    #[test]
    fn test_set_capacity_repaginates() {
        let mut manager = manager();
        let source = paragraphs(10);
        manager.load_content(&source).unwrap();
        assert_eq!(manager.page_count(), 2);

        manager.set_capacity(240.0).unwrap();
        assert_eq!(manager.page_count(), 1);
        assert_eq!(manager.get_all_content().unwrap(), source);
        assert!(manager.pages().iter().all(|p| p.capacity() == 240.0));
    }

    #[test]
    fn test_events_published() {
        let mut manager = manager();
        let mut events = manager.events().subscribe();
        manager.load_content(&paragraphs(6)).unwrap();

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert!(received.contains(&EditorEvent::PageAdded { page: PageId(1) }));
        assert!(received
            .iter()
            .any(|e| matches!(e, EditorEvent::ContentMigrated { to: PageId(1), .. })));
        assert!(received.iter().any(|e| matches!(
            e,
            EditorEvent::ReflowCompleted { pages_created: 1, pages: 2, moved, .. } if *moved > 0
        )));
        assert_eq!(received.last(), Some(&EditorEvent::ContentLoaded { pages: 2 }));
    }

    #[test]
    fn test_page_summaries() {
        let mut manager = manager();
        manager.load_content(&paragraphs(7)).unwrap();
        let summaries = manager.page_summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].label, "Page 1");
        assert_eq!(summaries[0].node_count, 5);
        assert_eq!(summaries[1].extent, 48.0);
        assert!(summaries.iter().all(|s| !s.overflowing));
    }
}
