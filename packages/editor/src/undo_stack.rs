//! # Undo/Redo History
//!
//! Whole-document snapshot history, coalesced by the idle signal.
//!
//! ## Design
//!
//! - Each entry holds the document before and after one burst of edits
//! - Recording an entry does not replay it; the edit is already live
//! - Undo restores the entry's "before" snapshot, redo its "after" snapshot
//! - Recording after an undo discards the redo tail
//! - Oldest entries are evicted past the history limit
//!
//! Snapshots are full serializations, so each entry costs O(document size).
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = UndoManager::new();
//! history.set_baseline(pages.get_all_content()?);
//!
//! // ... typing pauses ...
//! history.record(pages.get_all_content()?);
//!
//! history.undo(&mut pages)?;
//! history.redo(&mut pages)?;
//! ```

use crate::SurfaceError;
use std::fmt;

/// Default maximum number of history entries
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Something whose whole state can be captured and restored as markup
pub trait SnapshotTarget {
    fn snapshot(&self) -> Result<String, SurfaceError>;

    fn restore(&mut self, snapshot: &str) -> Result<(), SurfaceError>;
}

/// A reversible history entry
pub trait Command: fmt::Debug + Send {
    /// Put the target back in its state from before the command
    fn undo(&self, target: &mut dyn SnapshotTarget) -> Result<(), SurfaceError>;

    /// Re-apply the command's result
    fn redo(&self, target: &mut dyn SnapshotTarget) -> Result<(), SurfaceError>;

    fn description(&self) -> &str {
        "edit"
    }

    /// Snapshot the target holds after [`Command::undo`], if known
    fn before(&self) -> Option<&str> {
        None
    }

    /// Snapshot the target holds after [`Command::redo`], if known
    fn after(&self) -> Option<&str> {
        None
    }
}

/// One coalesced burst of edits, as a pair of document snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEditCommand {
    old_snapshot: String,
    new_snapshot: String,
}

impl ContentEditCommand {
    pub fn new(old_snapshot: impl Into<String>, new_snapshot: impl Into<String>) -> Self {
        Self {
            old_snapshot: old_snapshot.into(),
            new_snapshot: new_snapshot.into(),
        }
    }

    pub fn old_snapshot(&self) -> &str {
        &self.old_snapshot
    }

    pub fn new_snapshot(&self) -> &str {
        &self.new_snapshot
    }
}

impl Command for ContentEditCommand {
    fn undo(&self, target: &mut dyn SnapshotTarget) -> Result<(), SurfaceError> {
        target.restore(&self.old_snapshot)
    }

    fn redo(&self, target: &mut dyn SnapshotTarget) -> Result<(), SurfaceError> {
        target.restore(&self.new_snapshot)
    }

    fn description(&self) -> &str {
        "content edit"
    }

    fn before(&self) -> Option<&str> {
        Some(&self.old_snapshot)
    }

    fn after(&self) -> Option<&str> {
        Some(&self.new_snapshot)
    }
}

/// Linear command history with a cursor
#[derive(Debug)]
pub struct UndoManager {
    history: Vec<Box<dyn Command>>,

    /// Number of history entries currently applied; the entry an undo
    /// would revert sits at `applied - 1`
    applied: usize,

    /// Maximum number of entries (0 = unlimited)
    max_history: usize,

    /// Document state the next recorded entry starts from
    baseline: Option<String>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            history: Vec::new(),
            applied: 0,
            max_history,
            baseline: None,
        }
    }

    /// Add an already-applied command, discarding anything redoable
    pub fn execute(&mut self, command: Box<dyn Command>) {
        self.history.truncate(self.applied);
        self.history.push(command);

        if self.max_history > 0 && self.history.len() > self.max_history {
            self.history.remove(0);
        }
        self.applied = self.history.len();
    }

    /// Record a transition from the baseline to `current`.
    ///
    /// Returns `false` without touching history when nothing changed.
    pub fn record(&mut self, current: String) -> bool {
        let Some(baseline) = self.baseline.take() else {
            self.baseline = Some(current);
            return false;
        };

        if baseline == current {
            self.baseline = Some(baseline);
            return false;
        }

        self.execute(Box::new(ContentEditCommand::new(baseline, current.clone())));
        self.baseline = Some(current);
        true
    }

    /// Revert the most recent applied entry
    pub fn undo(&mut self, target: &mut dyn SnapshotTarget) -> Result<bool, SurfaceError> {
        if !self.can_undo() {
            return Ok(false); // Nothing to undo
        }

        let command = &self.history[self.applied - 1];
        command.undo(target)?;
        self.baseline = command.before().map(str::to_owned).or(self.baseline.take());
        self.applied -= 1;
        Ok(true)
    }

    /// Re-apply the next undone entry
    pub fn redo(&mut self, target: &mut dyn SnapshotTarget) -> Result<bool, SurfaceError> {
        if !self.can_redo() {
            return Ok(false); // Nothing to redo
        }

        let command = &self.history[self.applied];
        command.redo(target)?;
        self.baseline = command.after().map(str::to_owned).or(self.baseline.take());
        self.applied += 1;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.history.len()
    }

    pub fn undo_levels(&self) -> usize {
        self.applied
    }

    pub fn redo_levels(&self) -> usize {
        self.history.len() - self.applied
    }

    /// Index of the entry an undo would revert, `None` when nothing is undoable
    pub fn current_index(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Drop all entries; the baseline is kept
    pub fn clear(&mut self) {
        self.history.clear();
        self.applied = 0;
    }

    pub fn set_baseline(&mut self, snapshot: impl Into<String>) {
        self.baseline = Some(snapshot.into());
    }

    /// Document state at the last record, undo, or redo
    pub fn last_snapshot(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    /// Description of the entry an undo would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.current_index().map(|i| self.history[i].description())
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Buffer {
        content: String,
        restores: usize,
    }

    impl SnapshotTarget for Buffer {
        fn snapshot(&self) -> Result<String, SurfaceError> {
            Ok(self.content.clone())
        }

        fn restore(&mut self, snapshot: &str) -> Result<(), SurfaceError> {
            self.content = snapshot.to_string();
            self.restores += 1;
            Ok(())
        }
    }

    fn edit(history: &mut UndoManager, buffer: &mut Buffer, content: &str) -> bool {
        buffer.content = content.to_string();
        history.record(buffer.snapshot().unwrap())
    }

    #[test]
    fn test_record_requires_change() {
        let mut history = UndoManager::new();
        let mut buffer = Buffer::default();
        history.set_baseline("");

        assert!(!edit(&mut history, &mut buffer, ""));
        assert!(edit(&mut history, &mut buffer, "a"));
        assert!(!edit(&mut history, &mut buffer, "a"));
        assert_eq!(history.len(), 1);
        assert_eq!(buffer.restores, 0, "recording must not replay");
    }

    #[test]
    fn test_first_record_without_baseline_only_sets_it() {
        let mut history = UndoManager::new();
        assert!(!history.record("x".into()));
        assert_eq!(history.last_snapshot(), Some("x"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_undo_redo() {
        let mut history = UndoManager::new();
        let mut buffer = Buffer::default();
        history.set_baseline("");
        edit(&mut history, &mut buffer, "a");
        edit(&mut history, &mut buffer, "ab");

        assert!(history.undo(&mut buffer).unwrap());
        assert_eq!(buffer.content, "a");
        assert!(history.undo(&mut buffer).unwrap());
        assert_eq!(buffer.content, "");
        assert!(!history.undo(&mut buffer).unwrap());
        assert_eq!(history.current_index(), None);

        assert!(history.redo(&mut buffer).unwrap());
        assert!(history.redo(&mut buffer).unwrap());
        assert_eq!(buffer.content, "ab");
        assert!(!history.redo(&mut buffer).unwrap());
        assert_eq!(history.last_snapshot(), Some("ab"));
    }

    #[test]
    fn test_new_record_discards_redo_tail() {
        let mut history = UndoManager::new();
        let mut buffer = Buffer::default();
        history.set_baseline("");
        edit(&mut history, &mut buffer, "a");
        edit(&mut history, &mut buffer, "ab");
        history.undo(&mut buffer).unwrap();

        assert!(history.can_redo());
        edit(&mut history, &mut buffer, "ax");
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);

        history.undo(&mut buffer).unwrap();
        assert_eq!(buffer.content, "a");
    }

    #[test]
    fn test_eviction_keeps_limit() {
        let mut history = UndoManager::with_max_history(3);
        let mut buffer = Buffer::default();
        history.set_baseline("");
        for i in 0..5 {
            edit(&mut history, &mut buffer, &i.to_string());
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.undo_levels(), 3);
        while history.undo(&mut buffer).unwrap() {}
        // Entries 0→1 and ""→0 were evicted
        assert_eq!(buffer.content, "1");
    }

    #[test]
    fn test_levels_and_clear() {
        let mut history = UndoManager::new();
        let mut buffer = Buffer::default();
        history.set_baseline("");
        edit(&mut history, &mut buffer, "a");
        edit(&mut history, &mut buffer, "b");
        history.undo(&mut buffer).unwrap();

        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.redo_levels(), 1);
        assert_eq!(history.undo_description(), Some("content edit"));

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.last_snapshot(), Some("a"));
    }
}
