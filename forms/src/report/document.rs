//! Page-oriented drawing model.
//!
//! Coordinates are millimetres from the top-left corner of an A4 page. Text
//! is positioned by its baseline, the way PDF text is. Widths are estimated
//! from an average Helvetica glyph of half an em, which is close enough for
//! wrapping prose and never depends on font files being present.

#[cfg(test)]
#[path = "document_test.rs"]
mod document_test;

use super::MM_PER_PT;

/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_EM: f64 = 0.5;

/// Baseline-to-baseline distance as a fraction of the font size.
const LINE_HEIGHT_EM: f64 = 1.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const GREY: Self = Self::rgb(128, 128, 128);
    pub const BRAND: Self = Self::rgb(37, 99, 235);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Font {
    #[default]
    Regular,
    Bold,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    /// `x` is the horizontal centre of the text.
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in points.
    pub size: f64,
    pub font: Font,
    pub color: Color,
    pub align: Align,
}

impl TextStyle {
    #[must_use]
    pub const fn new(size: f64) -> Self {
        Self { size, font: Font::Regular, color: Color::BLACK, align: Align::Left }
    }

    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.font = Font::Bold;
        self
    }

    #[must_use]
    pub const fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub const fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    /// Baseline advance for one line of this style, in millimetres.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.size * LINE_HEIGHT_EM * MM_PER_PT
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Text { x: f64, y: f64, style: TextStyle, text: String },
    Line { x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: Color },
    FillRect { x: f64, y: f64, w: f64, h: f64, color: Color },
    StrokeRect { x: f64, y: f64, w: f64, h: f64, width: f64, color: Color },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<Op>,
}

/// A document under construction. Drawing always targets the last page.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pages: Vec<Page>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document with one empty page.
    #[must_use]
    pub fn new() -> Self {
        Self { pages: vec![Page::default()] }
    }

    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
    }

    /// Every text run in drawing order, across all pages.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|page| page.ops.iter()).filter_map(|op| match op {
            Op::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn push(&mut self, op: Op) {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    pub fn text(&mut self, x: f64, y: f64, text: impl Into<String>, style: TextStyle) {
        self.push(Op::Text { x, y, style, text: text.into() });
    }

    /// Draw pre-wrapped lines starting at baseline `y`; returns the number of
    /// lines drawn.
    pub fn text_lines(&mut self, x: f64, y: f64, lines: &[String], style: TextStyle) -> usize {
        let step = style.line_height();
        let mut baseline = y;
        for line in lines {
            self.text(x, baseline, line.clone(), style);
            baseline += step;
        }
        lines.len()
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color) {
        self.push(Op::Line { x1: from.0, y1: from.1, x2: to.0, y2: to.1, width, color });
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color) {
        self.push(Op::FillRect { x, y, w, h, color });
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, width: f64, color: Color) {
        self.push(Op::StrokeRect { x, y, w, h, width, color });
    }
}

/// Estimated rendered width of `text` at `size` points, in millimetres.
#[must_use]
pub fn text_width(text: &str, size: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let chars = text.chars().count() as f64;
    chars * size * AVG_GLYPH_EM * MM_PER_PT
}

/// Word-wrap `text` so every line fits within `max_width` millimetres.
///
/// Explicit newlines always break. Words wider than a whole line are split
/// across lines. Empty input yields a single empty line so callers can still
/// advance the cursor by one line.
#[must_use]
pub fn wrap_text(text: &str, size: f64, max_width: f64) -> Vec<String> {
    let per_char = size * AVG_GLYPH_EM * MM_PER_PT;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_chars = if per_char > 0.0 { ((max_width / per_char).floor() as usize).max(1) } else { usize::MAX };

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        // Leading indentation survives on the paragraph's first line.
        let body = paragraph.trim_start();
        let mut current = paragraph[..paragraph.len() - body.len()].to_owned();
        let mut current_len = current.chars().count();
        let mut has_word = false;
        for word in body.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            loop {
                let gap = usize::from(has_word);
                if current_len + gap + word.len() <= max_chars {
                    if gap == 1 {
                        current.push(' ');
                    }
                    current.extend(word.iter());
                    current_len += gap + word.len();
                    has_word = true;
                    break;
                }
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                    has_word = false;
                    continue;
                }
                // Word alone is wider than a line: hard split.
                let rest = word.split_off(max_chars);
                lines.push(word.iter().collect());
                word = rest;
                if word.is_empty() {
                    break;
                }
            }
        }
        lines.push(current);
    }
    lines
}
