//! A single fixed-capacity rendering unit

use crate::surface::PageId;
use serde::{Deserialize, Serialize};

/// Structural descriptor of one page
///
/// The page's nodes live in the surface under [`Page::id`]; the page itself
/// only knows where it sits in the sequence and how much it can hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    id: PageId,
    capacity: f32,
}

impl Page {
    pub fn new(id: PageId, capacity: f32) -> Self {
        Self { id, capacity }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    /// 1-based display index
    pub fn index(&self) -> usize {
        self.id.0 + 1
    }

    pub fn label(&self) -> String {
        format!("Page {}", self.index())
    }

    pub fn capacity(&self) -> f32 {
        self.capacity
    }

    pub(crate) fn set_capacity(&mut self, capacity: f32) {
        self.capacity = capacity;
    }

    /// Whether `extent` fits, allowing half a pixel of rounding slack
    pub fn fits(&self, extent: f32) -> bool {
        extent <= self.capacity + 0.5
    }
}

/// Snapshot of a page for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub index: usize,
    pub label: String,
    pub node_count: usize,
    pub extent: f32,
    pub capacity: f32,
    pub overflowing: bool,
}
