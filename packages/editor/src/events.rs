//! # Editor Events
//!
//! The pagination engine publishes what it did after each completed pass
//! instead of collaborators watching the content tree for mutations.
//! External consumers (entity scanning, autosave) subscribe to the bus.
//!
//! Events are sent over a tokio broadcast channel, so every subscriber sees
//! every event; slow subscribers observe `Lagged` rather than blocking the
//! editor.

use crate::surface::PageId;
use folio_markup::NodeId;
use tokio::sync::broadcast;

/// Default number of buffered events per subscriber
pub const EVENT_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// A page was appended
    PageAdded { page: PageId },

    /// A top-level node moved from the end of one page to the start of the next
    ContentMigrated { node: NodeId, from: PageId, to: PageId },

    /// A reflow pass finished; carries the pass totals so a subscriber that
    /// lagged behind the per-node events still sees what happened
    ReflowCompleted {
        start: PageId,
        moved: usize,
        pages_created: usize,
        pages: usize,
    },

    /// The whole document was (re)loaded and paginated
    ContentLoaded { pages: usize },

    /// An edit burst was recorded as a history entry
    HistoryRecorded { entries: usize },

    /// Undo or redo restored a snapshot
    HistoryApplied { undo: bool },
}

/// Broadcast bus owned by an editor session
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.tx.subscribe()
    }

    /// Publish to all current subscribers; returns how many received it
    pub fn publish(&self, event: EditorEvent) -> usize {
        // No subscribers is not an error for the editor
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
