//! Word, character, and reading-time counts for a document

use folio_markup::Node;
use serde::{Deserialize, Serialize};

/// Average adult reading speed
pub const READING_SPEED_WPM: usize = 250;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub words: usize,
    pub characters: usize,
    pub blocks: usize,
    pub reading_minutes: usize,
}

impl DocumentStats {
    /// Count over top-level nodes; block boundaries separate words
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let mut stats = Self::default();
        for node in nodes {
            let text = node.text_content();
            if text.trim().is_empty() && node.is_text() {
                continue;
            }
            stats.blocks += 1;
            stats.characters += text.chars().count();
            stats.words += text.split_whitespace().count();
        }
        stats.reading_minutes = stats.words.div_ceil(READING_SPEED_WPM);
        stats
    }

    /// Human-readable reading time ("< 1 min", "12 min", "1h 5m")
    pub fn reading_time(&self) -> String {
        let minutes = self.reading_minutes;
        match minutes {
            0 => "< 1 min".to_string(),
            1..=59 => format!("{minutes} min"),
            _ => {
                let (hours, mins) = (minutes / 60, minutes % 60);
                match (hours, mins) {
                    (1, 0) => "1 hour".to_string(),
                    (h, 0) => format!("{h} hours"),
                    (h, m) => format!("{h}h {m}m"),
                }
            }
        }
    }
}
