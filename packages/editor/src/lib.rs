//! # Folio Editor
//!
//! Paginated rich-text editing engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ markup: raw content ⇄ node trees            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ surface: pages of nodes, caret, measurement │
//! │  - RichTextSurface capability (host)        │
//! │  - MemorySurface + LayoutMetrics            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session context                     │
//! │  - PageManager: overflow + migration        │
//! │  - IdleScheduler: debounce typing           │
//! │  - UndoManager: snapshot history            │
//! │  - EventBus: post-reflow notifications      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Pages are the document**: concatenating page content in order is the
//!    persistence format; there is no second copy
//! 2. **Never fight the keyboard**: reflow and history run only once typing
//!    has paused
//! 3. **Whole nodes move**: pagination moves top-level nodes, never splits them
//! 4. **Caret follows content**: a moved node takes the caret with it
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{Editor, EditorConfig, InputEvent};
//! use std::time::Instant;
//!
//! let mut editor = Editor::in_memory(EditorConfig::default());
//! editor.init()?;
//! editor.load_content("<p>Chapter one</p>")?;
//!
//! editor.handle_input(Instant::now(), InputEvent::InsertText { text: "…".into() })?;
//!
//! // Later, from a timer or the async driver
//! editor.tick(Instant::now())?;
//! let raw = editor.get_all_content()?;
//! ```

mod config;
mod driver;
mod errors;
mod events;
mod idle;
mod layout;
mod memory_surface;
mod page;
mod page_manager;
mod session;
mod stats;
mod surface;
mod undo_stack;

pub use config::{EditorConfig, IdleConfig, Margins, PageGeometry, PaperSize, PX_PER_MM};
pub use driver::{DriverCommand, DriverHandle, EditorDriver};
pub use errors::{EditorError, SurfaceError};
pub use events::{EditorEvent, EventBus};
pub use idle::{IdleScheduler, IdleSignal};
pub use layout::LayoutMetrics;
pub use memory_surface::MemorySurface;
pub use page::{Page, PageSummary};
pub use page_manager::{EditOrigin, PageManager, ReflowOutcome, ReflowReport, SkipReason};
pub use session::{Editor, InputEvent, TickOutcome};
pub use stats::DocumentStats;
pub use surface::{Cursor, EditableSurface, PageId, RichTextSurface};
pub use undo_stack::{Command, ContentEditCommand, SnapshotTarget, UndoManager};

// Re-export the node model for hosts
pub use folio_markup::{Node, NodeId};
