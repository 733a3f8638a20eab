//! # Async Driver
//!
//! Runs an [`Editor`] as a single tokio task. Input arrives over an mpsc
//! channel; between commands the task sleeps until the idle scheduler's
//! next deadline and then ticks the editor. There is one task and one
//! owner of the editor, so no locking is involved.
//!
//! ```rust,ignore
//! let (handle, task) = EditorDriver::spawn(Editor::in_memory(config))?;
//! handle.input(InputEvent::InsertText { text: "Hello".into() }).await?;
//! let content = handle.snapshot().await?;
//! handle.shutdown().await;
//! let editor = task.await?;
//! ```

use crate::page::PageSummary;
use crate::session::{Editor, InputEvent};
use crate::surface::EditableSurface;
use crate::EditorError;
use std::time::Instant as StdInstant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Depth of the command queue
pub const COMMAND_BUFFER: usize = 64;

#[derive(Debug)]
pub enum DriverCommand {
    Input(InputEvent),
    Undo(oneshot::Sender<bool>),
    Redo(oneshot::Sender<bool>),
    Load(String),
    Snapshot(oneshot::Sender<String>),
    Inspect(oneshot::Sender<Vec<PageSummary>>),
    Shutdown,
}

/// Cloneable sender side of a running driver
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::Sender<DriverCommand>,
}

impl DriverHandle {
    async fn send(&self, command: DriverCommand) -> Result<(), EditorError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| EditorError::DriverClosed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> DriverCommand,
    ) -> Result<T, EditorError> {
        let (tx, rx) = oneshot::channel();
        self.send(command(tx)).await?;
        rx.await.map_err(|_| EditorError::DriverClosed)
    }

    pub async fn input(&self, event: InputEvent) -> Result<(), EditorError> {
        self.send(DriverCommand::Input(event)).await
    }

    pub async fn undo(&self) -> Result<bool, EditorError> {
        self.request(DriverCommand::Undo).await
    }

    pub async fn redo(&self) -> Result<bool, EditorError> {
        self.request(DriverCommand::Redo).await
    }

    pub async fn load(&self, raw: impl Into<String>) -> Result<(), EditorError> {
        self.send(DriverCommand::Load(raw.into())).await
    }

    /// Current serialized document
    pub async fn snapshot(&self) -> Result<String, EditorError> {
        self.request(DriverCommand::Snapshot).await
    }

    pub async fn pages(&self) -> Result<Vec<PageSummary>, EditorError> {
        self.request(DriverCommand::Inspect).await
    }

    pub async fn shutdown(&self) {
        // Already gone is as good as shut down
        let _ = self.tx.send(DriverCommand::Shutdown).await;
    }
}

pub struct EditorDriver<S: EditableSurface> {
    editor: Editor<S>,
    commands: mpsc::Receiver<DriverCommand>,
}

impl<S: EditableSurface> EditorDriver<S> {
    pub fn new(editor: Editor<S>) -> (Self, DriverHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        (Self { editor, commands }, DriverHandle { tx })
    }

    /// Initialize the editor if needed and run it on a new task
    pub fn spawn(
        mut editor: Editor<S>,
    ) -> Result<(DriverHandle, JoinHandle<Editor<S>>), EditorError>
    where
        S: Send + 'static,
    {
        if !editor.is_initialized() {
            editor.init()?;
        }
        let (driver, handle) = Self::new(editor);
        Ok((handle, tokio::spawn(driver.run())))
    }

    /// Process commands and idle timers until shutdown; returns the editor
    pub async fn run(mut self) -> Editor<S> {
        info!("editor driver started");

        loop {
            let deadline = self.editor.next_deadline();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(DriverCommand::Shutdown) | None => break,
                    Some(command) => self.dispatch(command),
                },
                _ = sleep_until(deadline) => self.tick(),
            }
        }

        info!("editor driver stopped");
        self.editor
    }

    fn dispatch(&mut self, command: DriverCommand) {
        match command {
            DriverCommand::Input(event) => {
                if let Err(err) = self.editor.handle_input(now(), event) {
                    warn!(error = %err, "input rejected");
                }
            }
            DriverCommand::Undo(reply) => {
                let applied = self.editor.undo().unwrap_or_else(|err| {
                    warn!(error = %err, "undo failed");
                    false
                });
                let _ = reply.send(applied);
            }
            DriverCommand::Redo(reply) => {
                let applied = self.editor.redo().unwrap_or_else(|err| {
                    warn!(error = %err, "redo failed");
                    false
                });
                let _ = reply.send(applied);
            }
            DriverCommand::Load(raw) => {
                if let Err(err) = self.editor.load_content(&raw) {
                    warn!(error = %err, "load failed");
                }
            }
            DriverCommand::Snapshot(reply) => match self.editor.get_all_content() {
                Ok(content) => {
                    let _ = reply.send(content);
                }
                Err(err) => warn!(error = %err, "snapshot failed"),
            },
            DriverCommand::Inspect(reply) => match self.editor.page_summaries() {
                Ok(pages) => {
                    let _ = reply.send(pages);
                }
                Err(err) => warn!(error = %err, "inspect failed"),
            },
            DriverCommand::Shutdown => {}
        }
    }

    fn tick(&mut self) {
        match self.editor.tick(now()) {
            Ok(outcome) => debug!(?outcome, "idle tick"),
            Err(err) => warn!(error = %err, "idle tick failed"),
        }
    }
}

/// Current time on tokio's clock, so paused-clock tests drive the scheduler
fn now() -> StdInstant {
    Instant::now().into_std()
}

async fn sleep_until(deadline: Option<StdInstant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::MemorySurface;
    use std::time::Duration;

    fn spawn_default() -> (DriverHandle, JoinHandle<Editor<MemorySurface>>) {
        EditorDriver::spawn(Editor::in_memory(EditorConfig::default())).unwrap()
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_driver_ticks_after_idle() {
        let (handle, task) = spawn_default();

        handle
            .input(InputEvent::InsertText { text: "Hello".into() })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(handle.snapshot().await.unwrap(), "<p>Hello</p>");
        assert!(handle.undo().await.unwrap());
        assert_eq!(handle.snapshot().await.unwrap(), "");

        handle.shutdown().await;
        let editor = task.await.unwrap();
        assert_eq!(editor.history().redo_levels(), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_no_history_before_idle() {
        let (handle, task) = spawn_default();

        handle
            .input(InputEvent::InsertText { text: "draft".into() })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!handle.undo().await.unwrap());

        handle.shutdown().await;
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_driver_reports_error() {
        let (driver, handle) = EditorDriver::new(Editor::in_memory(EditorConfig::default()));
        drop(driver);
        assert!(matches!(
            handle.snapshot().await,
            Err(EditorError::DriverClosed)
        ));
    }
}
