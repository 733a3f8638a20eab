pub mod paginate;
pub mod papers;
pub mod replay;

pub use paginate::{paginate, PaginateArgs};
pub use papers::{papers, PapersArgs};
pub use replay::{replay, ReplayArgs};

use anyhow::Result;
use folio_editor::{EditorConfig, PaperSize};

/// Apply a `--paper` override to the loaded config
pub fn with_paper(config: EditorConfig, paper: Option<&str>) -> Result<EditorConfig> {
    match paper {
        Some(name) => Ok(config.with_paper(name.parse::<PaperSize>()?)),
        None => Ok(config),
    }
}
