//! # Editor Session
//!
//! The application context for one editing session. It owns the page
//! manager, idle scheduler, history, and event bus, and wires them
//! together:
//!
//! ```text
//! input ─→ surface edit ─→ scheduler.record_input(origin page)
//! tick  ─→ scheduler.poll ─→ CheckOverflow ─→ reflow ─→ record history
//! ```
//!
//! Nothing here is global; hosts construct an [`Editor`] and pass it around.

use crate::config::{EditorConfig, PaperSize};
use crate::events::{EditorEvent, EventBus};
use crate::idle::{IdleScheduler, IdleSignal};
use crate::page::PageSummary;
use crate::page_manager::{EditOrigin, PageManager, ReflowOutcome, ReflowReport};
use crate::stats::DocumentStats;
use crate::surface::{Cursor, EditableSurface, RichTextSurface};
use crate::undo_stack::UndoManager;
use crate::{EditorError, MemorySurface};
use folio_markup::NodeId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// A user edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    InsertText { text: String },
    DeleteBackward,
    SplitBlock,
    InsertMarkup { markup: String },
    SetCursor { cursor: Cursor },
}

/// What a [`Editor::tick`] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub typing_stopped: bool,
    pub reflow: Option<ReflowOutcome>,
    pub recorded: bool,
}

pub struct Editor<S: EditableSurface> {
    config: EditorConfig,
    pages: PageManager<S>,
    scheduler: IdleScheduler,
    history: UndoManager,
    events: EventBus,
    initialized: bool,
}

impl<S: EditableSurface> Editor<S> {
    pub fn new(surface: S, config: EditorConfig) -> Self {
        let events = EventBus::new();
        let pages = PageManager::new(surface, config.geometry(), events.clone());
        Self {
            scheduler: IdleScheduler::new(config.idle),
            history: UndoManager::with_max_history(config.history_limit),
            pages,
            events,
            config,
            initialized: false,
        }
    }

    /// Create the first page and take the initial history baseline
    pub fn init(&mut self) -> Result<(), EditorError> {
        if self.pages.page_count() == 0 {
            self.pages.add_page();
        }
        self.history.set_baseline(self.pages.get_all_content()?);
        self.initialized = true;
        debug!(paper = self.config.paper.name(), "editor initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> Result<(), EditorError> {
        if self.initialized {
            Ok(())
        } else {
            Err(EditorError::NotInitialized)
        }
    }

    /// Apply an edit and notify the idle scheduler.
    ///
    /// Returns the node that received the edit; `None` for caret moves and
    /// deletes with nothing to delete.
    pub fn handle_input(
        &mut self,
        now: Instant,
        event: InputEvent,
    ) -> Result<Option<NodeId>, EditorError> {
        self.ensure_initialized()?;

        let surface = self.pages.surface_mut();
        let edited = match event {
            InputEvent::InsertText { text } => Some(surface.insert_text(&text)?),
            InputEvent::DeleteBackward => surface.delete_backward()?,
            InputEvent::SplitBlock => Some(surface.split_block()?),
            InputEvent::InsertMarkup { markup } => Some(surface.insert_markup(&markup)?),
            InputEvent::SetCursor { cursor } => {
                surface.set_cursor(cursor)?;
                None
            }
        };

        if let Some(node) = edited {
            let origin = match self.pages.surface().page_of_node(node) {
                Some(page) => EditOrigin::Page(page),
                None => EditOrigin::Node(node),
            };
            self.scheduler.record_input(now, origin);
        }
        Ok(edited)
    }

    /// Drive due idle timers
    pub fn tick(&mut self, now: Instant) -> Result<TickOutcome, EditorError> {
        let mut outcome = TickOutcome::default();

        for signal in self.scheduler.poll(now) {
            match signal {
                IdleSignal::TypingStopped => outcome.typing_stopped = true,
                IdleSignal::CheckOverflow(origin) => {
                    outcome.reflow = Some(self.pages.check_overflow(origin));
                    outcome.recorded = self.record_history()?;
                }
            }
        }

        Ok(outcome)
    }

    /// Record a history entry if the document changed since the last one
    pub fn record_history(&mut self) -> Result<bool, EditorError> {
        let content = self.pages.get_all_content()?;
        let recorded = self.history.record(content);
        if recorded {
            debug!(entries = self.history.len(), "history entry recorded");
            self.events.publish(EditorEvent::HistoryRecorded {
                entries: self.history.len(),
            });
        }
        Ok(recorded)
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let applied = self.history.undo(&mut self.pages)?;
        if applied {
            self.scheduler.reset();
            self.events.publish(EditorEvent::HistoryApplied { undo: true });
        }
        Ok(applied)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let applied = self.history.redo(&mut self.pages)?;
        if applied {
            self.scheduler.reset();
            self.events.publish(EditorEvent::HistoryApplied { undo: false });
        }
        Ok(applied)
    }

    pub fn get_all_content(&self) -> Result<String, EditorError> {
        Ok(self.pages.get_all_content()?)
    }

    /// Replace the document; history starts over from the new content
    pub fn load_content(&mut self, raw: &str) -> Result<ReflowReport, EditorError> {
        if !self.initialized {
            self.init()?;
        }
        let report = self.pages.load_content(raw)?;
        self.scheduler.reset();
        self.history.clear();
        self.history.set_baseline(self.pages.get_all_content()?);
        Ok(report)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<ReflowReport, EditorError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        info!(path = %path.as_ref().display(), "loading document");
        self.load_content(&raw)
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        std::fs::write(path.as_ref(), self.get_all_content()?)?;
        Ok(())
    }

    /// Switch paper size; the document re-paginates immediately
    pub fn set_paper(&mut self, paper: PaperSize) -> Result<ReflowReport, EditorError> {
        self.config.paper = paper;
        let report = self.pages.set_geometry(self.config.geometry())?;
        info!(paper = paper.name(), pages = self.pages.page_count(), "paper changed");
        Ok(report)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn page_summaries(&self) -> Result<Vec<PageSummary>, EditorError> {
        Ok(self.pages.page_summaries()?)
    }

    pub fn stats(&self) -> DocumentStats {
        let surface = self.pages.surface();
        DocumentStats::from_nodes(
            self.pages
                .pages()
                .iter()
                .filter_map(|page| surface.page_nodes(page.id()).ok())
                .flatten(),
        )
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn pages(&self) -> &PageManager<S> {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut PageManager<S> {
        &mut self.pages
    }

    pub fn surface(&self) -> &S {
        self.pages.surface()
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn scheduler(&self) -> &IdleScheduler {
        &self.scheduler
    }
}

impl Editor<MemorySurface> {
    /// Editor over an in-memory surface laid out with `config.layout`
    pub fn in_memory(config: EditorConfig) -> Self {
        let surface = MemorySurface::new(config.geometry(), config.layout);
        Self::new(surface, config)
    }
}
