//! # Block Measurement
//!
//! Coarse line-box model used by [`MemorySurface`](crate::MemorySurface) to
//! answer "how tall is this page's content". Text wraps at a fixed number of
//! characters per line derived from the content width and an average glyph
//! width. No kerning, justification, or hyphenation.
//!
//! ```text
//! <p> 150 chars, 75 chars/line  →  2 lines × line height
//! <img height="180">            →  180px
//! <br>                          →  ends the current line
//! whitespace-only text          →  0px
//! ```

use folio_markup::{Node, NodeKind, TagCategory};
use serde::{Deserialize, Serialize};

/// Typographic metrics for measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    /// Height of one line of body text (px)
    pub line_height: f32,

    /// Average advance width of one character (px)
    pub glyph_width: f32,

    /// Extra space after each top-level block (px)
    pub block_spacing: f32,

    /// Height of an image with no `height` attribute (px)
    pub media_height: f32,

    /// Line-height multiplier for `h1`–`h3`
    pub heading_scale: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            line_height: 24.0,
            glyph_width: 8.0,
            block_spacing: 0.0,
            media_height: 240.0,
            heading_scale: 1.5,
        }
    }
}

impl LayoutMetrics {
    /// Characters that fit on one line of `content_width`
    pub fn chars_per_line(&self, content_width: f32) -> usize {
        ((content_width / self.glyph_width).floor() as usize).max(1)
    }

    /// Total height of a sequence of top-level nodes
    pub fn measure_nodes(&self, nodes: &[Node], content_width: f32) -> f32 {
        nodes
            .iter()
            .map(|node| self.measure_top_level(node, content_width))
            .sum()
    }

    /// Height of a single top-level node, including block spacing
    pub fn measure_top_level(&self, node: &Node, content_width: f32) -> f32 {
        let height = match &node.kind {
            NodeKind::Text(text) if text.trim().is_empty() => return 0.0,
            _ => self.measure_block(node, content_width, self.line_height),
        };
        height + self.block_spacing
    }

    fn media_height(&self, node: &Node) -> f32 {
        node.attribute("height")
            .and_then(|h| h.trim_end_matches("px").trim().parse::<f32>().ok())
            .filter(|h| *h >= 0.0)
            .unwrap_or(self.media_height)
    }

    fn line_height_for(&self, tag: &str, inherited: f32) -> f32 {
        match tag {
            "h1" | "h2" | "h3" => self.line_height * self.heading_scale,
            _ => inherited,
        }
    }

    /// Height of a node laid out as a block
    fn measure_block(&self, node: &Node, content_width: f32, line_height: f32) -> f32 {
        let element = match &node.kind {
            NodeKind::Text(_) => {
                let mut lines = LineBuilder::new(self.chars_per_line(content_width), line_height, false);
                lines.push_inline(node);
                return lines.finish();
            }
            NodeKind::Element(element) => element,
        };

        match TagCategory::of(&element.tag) {
            TagCategory::Media => return self.media_height(node),
            TagCategory::Break | TagCategory::Rule => return line_height,
            TagCategory::Block | TagCategory::Inline => {}
        }

        let line_height = self.line_height_for(&element.tag, line_height);
        let preformatted = element.tag == "pre";
        let mut lines = LineBuilder::new(self.chars_per_line(content_width), line_height, preformatted);

        for child in &element.children {
            let category = child.tag().map(TagCategory::of);
            match category {
                Some(TagCategory::Block) => {
                    lines.flush();
                    lines.height += self.measure_block(child, content_width, line_height);
                }
                Some(TagCategory::Media) => {
                    lines.flush();
                    lines.height += self.media_height(child);
                }
                Some(TagCategory::Rule) => {
                    lines.flush();
                    lines.height += line_height;
                }
                _ => lines.push_inline(child),
            }
        }

        let height = lines.finish();
        if height == 0.0 {
            line_height
        } else {
            height
        }
    }
}

/// Accumulates inline content into wrapped lines
struct LineBuilder {
    chars_per_line: usize,
    line_height: f32,
    preformatted: bool,
    run_chars: usize,
    run_open: bool,
    height: f32,
}

impl LineBuilder {
    fn new(chars_per_line: usize, line_height: f32, preformatted: bool) -> Self {
        Self {
            chars_per_line,
            line_height,
            preformatted,
            run_chars: 0,
            run_open: false,
            height: 0.0,
        }
    }

    fn push_inline(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Text(text) => {
                if self.preformatted {
                    let mut segments = text.split('\n').peekable();
                    while let Some(segment) = segments.next() {
                        self.run_chars += segment.chars().count();
                        self.run_open = true;
                        if segments.peek().is_some() {
                            self.break_line();
                        }
                    }
                } else {
                    self.run_chars += text.chars().count();
                    self.run_open = true;
                }
            }
            NodeKind::Element(element) => match TagCategory::of(&element.tag) {
                TagCategory::Break => self.break_line(),
                _ => element.children.iter().for_each(|c| self.push_inline(c)),
            },
        }
    }

    /// End the current line (a `<br>` or a preformatted newline)
    fn break_line(&mut self) {
        self.run_open = true;
        self.flush();
    }

    /// Close the current run, adding its wrapped height
    fn flush(&mut self) {
        if !self.run_open {
            return;
        }
        let lines = self.run_chars.div_ceil(self.chars_per_line).max(1);
        self.height += lines as f32 * self.line_height;
        self.run_chars = 0;
        self.run_open = false;
    }

    fn finish(mut self) -> f32 {
        self.flush();
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_markup::parse;

    const WIDTH: f32 = 600.0; // 75 chars per line at 8px

    fn measure(source: &str) -> f32 {
        LayoutMetrics::default().measure_nodes(&parse(source), WIDTH)
    }

    #[test]
    fn test_short_paragraph_is_one_line() {
        assert_eq!(measure("<p>Hello</p>"), 24.0);
    }

    #[test]
    fn test_long_paragraph_wraps() {
        let text = "x".repeat(151);
        assert_eq!(measure(&format!("<p>{text}</p>")), 72.0);
    }

    #[test]
    fn test_empty_paragraph_takes_a_line() {
        assert_eq!(measure("<p></p>"), 24.0);
    }

    #[test]
    fn test_whitespace_between_blocks_is_free() {
        assert_eq!(measure("<p>a</p>\n  \n<p>b</p>"), 48.0);
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(measure("<p>a<br>b<br>c</p>"), 72.0);
    }

    #[test]
    fn test_inline_markup_counts_text() {
        let text = "y".repeat(70);
        // 70 + 10 chars spread over inline elements → 2 lines
        assert_eq!(measure(&format!("<p>{text}<b>0123456789</b></p>")), 48.0);
    }

    #[test]
    fn test_media_height() {
        assert_eq!(measure(r#"<img src="a.png" height="180">"#), 180.0);
        assert_eq!(measure(r#"<img src="a.png">"#), 240.0);
        assert_eq!(measure(r#"<p>caption<img height="100px"></p>"#), 124.0);
    }

    #[test]
    fn test_headings_are_taller() {
        assert_eq!(measure("<h1>Title</h1>"), 36.0);
        assert_eq!(measure("<h4>Small</h4>"), 24.0);
    }

    #[test]
    fn test_nested_blocks() {
        assert_eq!(measure("<blockquote><p>a</p><p>b</p></blockquote>"), 48.0);
        assert_eq!(measure("<ul><li>one</li><li>two</li><li>three</li></ul>"), 72.0);
    }

    #[test]
    fn test_preformatted_newlines() {
        assert_eq!(measure("<pre>a\nb\nc</pre>"), 72.0);
    }

    #[test]
    fn test_block_spacing() {
        let metrics = LayoutMetrics {
            block_spacing: 6.0,
            ..LayoutMetrics::default()
        };
        assert_eq!(metrics.measure_nodes(&parse("<p>a</p><p>b</p>"), WIDTH), 60.0);
    }
}
