use super::paginate::{print_pages, PaginateReport};
use super::with_paper;
use crate::config;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{Editor, EditorEvent, InputEvent, MemorySurface, PaperSize};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Starting document (empty when omitted)
    pub input: Option<PathBuf>,

    /// Timed edit script (JSON)
    #[arg(short, long)]
    pub script: PathBuf,

    /// Paper preset (a4, a5, b5, letter, legal) or WxH in mm
    #[arg(short, long)]
    pub paper: Option<String>,

    /// Write the final document here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,
}

/// A list of edits stamped with milliseconds since the start of the replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    pub steps: Vec<ReplayStep>,

    /// Idle time allowed after the last step so pending timers fire
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_settle_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    pub at_ms: u64,
    pub action: ReplayAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplayAction {
    Input { event: InputEvent },
    Undo,
    Redo,
    SetPaper { paper: String },
}

impl ReplayScript {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        let script: ReplayScript = serde_json::from_str(&content)
            .with_context(|| format!("Invalid script {}", path.display()))?;
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<()> {
        for pair in self.steps.windows(2) {
            if pair[1].at_ms < pair[0].at_ms {
                bail!(
                    "Script steps must be in time order ({}ms comes after {}ms)",
                    pair[1].at_ms,
                    pair[0].at_ms
                );
            }
        }
        Ok(())
    }
}

/// Counts of what the engine published during a replay
///
/// Page and migration counts come from the per-pass totals in
/// `ReflowCompleted`, so they stay exact when a large re-pagination
/// overruns the event buffer and per-node events are dropped.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTally {
    pub pages_added: usize,
    pub nodes_migrated: usize,
    pub reflows: usize,
    pub history_recorded: usize,
    pub history_applied: usize,
    /// Events skipped because the buffer overflowed
    pub lagged: u64,
}

impl EventTally {
    fn count(&mut self, event: &EditorEvent) {
        match event {
            EditorEvent::ReflowCompleted {
                moved,
                pages_created,
                ..
            } => {
                self.reflows += 1;
                self.nodes_migrated += moved;
                self.pages_added += pages_created;
            }
            EditorEvent::HistoryRecorded { .. } => self.history_recorded += 1,
            EditorEvent::HistoryApplied { .. } => self.history_applied += 1,
            EditorEvent::PageAdded { .. }
            | EditorEvent::ContentMigrated { .. }
            | EditorEvent::ContentLoaded { .. } => {}
        }
    }

    /// Take everything buffered, continuing past a lag
    fn drain(&mut self, events: &mut Receiver<EditorEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.count(&event),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "event buffer overflowed during replay");
                    self.lagged += skipped;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    #[serde(flatten)]
    pub pages: PaginateReport,
    pub undo_levels: usize,
    pub redo_levels: usize,
    pub events: EventTally,
}

/// Run `script` against `editor` on a virtual clock starting at `start`
pub fn run_script(
    editor: &mut Editor<MemorySurface>,
    script: &ReplayScript,
    start: Instant,
) -> Result<EventTally> {
    let mut events = editor.subscribe();
    let mut tally = EventTally::default();

    for step in &script.steps {
        let now = start + Duration::from_millis(step.at_ms);
        editor.tick(now)?;

        match &step.action {
            ReplayAction::Input { event } => {
                editor.handle_input(now, event.clone())?;
            }
            ReplayAction::Undo => {
                editor.undo()?;
            }
            ReplayAction::Redo => {
                editor.redo()?;
            }
            ReplayAction::SetPaper { paper } => {
                editor.set_paper(paper.parse::<PaperSize>()?)?;
            }
        }

        tally.drain(&mut events);
    }

    let last = script.steps.last().map_or(0, |step| step.at_ms);
    editor.tick(start + Duration::from_millis(last + script.settle_ms))?;
    tally.drain(&mut events);

    Ok(tally)
}

pub fn replay(args: ReplayArgs, cwd: &str) -> Result<()> {
    let config = with_paper(config::load(cwd)?, args.paper.as_deref())?;
    let script = ReplayScript::load(&args.script)?;

    let mut editor = Editor::in_memory(config);
    editor.init()?;
    if let Some(input) = &args.input {
        editor
            .load_file(input)
            .with_context(|| format!("Failed to load {}", input.display()))?;
    }

    let events = run_script(&mut editor, &script, Instant::now())?;

    if let Some(output) = &args.output {
        editor.save_file(output)?;
    }

    let report = ReplayReport {
        pages: PaginateReport {
            paper: editor.config().paper.to_string(),
            capacity: editor.pages().capacity(),
            pages: editor.page_summaries()?,
            stats: editor.stats(),
            contents: None,
        },
        undo_levels: editor.history().undo_levels(),
        redo_levels: editor.history().redo_levels(),
        events,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "⌨️  {} {} steps from {}",
        "Replayed".green().bold(),
        script.steps.len(),
        args.script.display()
    );
    println!();
    print_pages(&report.pages);
    println!();
    println!(
        "   History: {} undo / {} redo",
        report.undo_levels, report.redo_levels
    );
    println!(
        "   Events:  {} pages added, {} nodes migrated, {} entries recorded",
        report.events.pages_added, report.events.nodes_migrated, report.events.history_recorded
    );
    if let Some(output) = &args.output {
        println!("   Saved:   {}", output.display());
    }

    Ok(())
}
