//! Paper sizes, page geometry, and editor tuning knobs

use crate::layout::LayoutMetrics;
use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// CSS pixels per millimetre (96 dpi)
pub const PX_PER_MM: f32 = 96.0 / 25.4;

/// Named paper format
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A4,
    A5,
    B5,
    Letter,
    Legal,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    pub const PRESETS: [PaperSize; 5] = [
        PaperSize::A4,
        PaperSize::A5,
        PaperSize::B5,
        PaperSize::Letter,
        PaperSize::Legal,
    ];

    /// Width and height in millimetres (portrait)
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match *self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::B5 => (176.0, 250.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaperSize::A4 => "a4",
            PaperSize::A5 => "a5",
            PaperSize::B5 => "b5",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
            PaperSize::Custom { .. } => "custom",
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        PaperSize::A4
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions_mm();
        write!(f, "{} ({}×{} mm)", self.name(), w, h)
    }
}

impl FromStr for PaperSize {
    type Err = EditorError;

    /// Accepts a preset name or `WIDTHxHEIGHT` in millimetres
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if let Some(preset) = Self::PRESETS.iter().find(|p| p.name() == lower) {
            return Ok(*preset);
        }

        let custom = lower.split_once('x').and_then(|(w, h)| {
            let width_mm = w.trim().parse::<f32>().ok()?;
            let height_mm = h.trim().parse::<f32>().ok()?;
            (width_mm > 0.0 && height_mm > 0.0).then_some(PaperSize::Custom {
                width_mm,
                height_mm,
            })
        });

        custom.ok_or_else(|| {
            EditorError::InvalidConfig(format!(
                "Unknown paper size '{}'. Use a4, a5, b5, letter, legal, or WxH in mm",
                s
            ))
        })
    }
}

/// Page margins in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Margins {
    pub top_mm: f32,
    pub right_mm: f32,
    pub bottom_mm: f32,
    pub left_mm: f32,
}

impl Margins {
    pub fn uniform(mm: f32) -> Self {
        Self {
            top_mm: mm,
            right_mm: mm,
            bottom_mm: mm,
            left_mm: mm,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(25.4)
    }
}

/// Content box of a page in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub content_width: f32,
    pub content_height: f32,
}

impl PageGeometry {
    pub fn new(content_width: f32, content_height: f32) -> Self {
        Self {
            content_width,
            content_height,
        }
    }

    pub fn from_paper(paper: PaperSize, margins: Margins) -> Self {
        let (w, h) = paper.dimensions_mm();
        Self {
            content_width: ((w - margins.left_mm - margins.right_mm) * PX_PER_MM).max(1.0),
            content_height: ((h - margins.top_mm - margins.bottom_mm) * PX_PER_MM).max(1.0),
        }
    }

    /// Vertical capacity of a page
    pub fn capacity(&self) -> f32 {
        self.content_height
    }
}

/// Debounce timings for the edit-idle scheduler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleConfig {
    #[serde(default = "default_typing_stopped_ms")]
    pub typing_stopped_ms: u64,

    #[serde(default = "default_overflow_check_ms")]
    pub overflow_check_ms: u64,
}

fn default_typing_stopped_ms() -> u64 {
    500
}

fn default_overflow_check_ms() -> u64 {
    1000
}

impl IdleConfig {
    pub fn typing_stopped(&self) -> Duration {
        Duration::from_millis(self.typing_stopped_ms)
    }

    pub fn overflow_check(&self) -> Duration {
        Duration::from_millis(self.overflow_check_ms)
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            typing_stopped_ms: default_typing_stopped_ms(),
            overflow_check_ms: default_overflow_check_ms(),
        }
    }
}

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    #[serde(default)]
    pub paper: PaperSize,

    #[serde(default)]
    pub margins: Margins,

    #[serde(default)]
    pub idle: IdleConfig,

    /// Maximum number of undo entries
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default)]
    pub layout: LayoutMetrics,
}

fn default_history_limit() -> usize {
    50
}

impl EditorConfig {
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::from_paper(self.paper, self.margins)
    }

    pub fn with_paper(mut self, paper: PaperSize) -> Self {
        self.paper = paper;
        self
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::default(),
            margins: Margins::default(),
            idle: IdleConfig::default(),
            history_limit: default_history_limit(),
            layout: LayoutMetrics::default(),
        }
    }
}
