//! Error types for the editor

use folio_markup::NodeId;
use thiserror::Error;

/// Failures reported by a rich-text surface
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Page not found: {0}")]
    PageNotFound(usize),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid cursor position: {0}")]
    InvalidCursor(String),

    #[error("Nothing to insert")]
    NothingToInsert,
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Editor has not been initialized")]
    NotInitialized,

    #[error("Editor driver has shut down")]
    DriverClosed,
}
