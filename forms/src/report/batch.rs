//! Multi-record report for one form type.
//!
//! DESIGN
//! ======
//! Two layouts implement [`BatchLayout`]: a bordered grid ([`TableLayout`])
//! and a numbered list that paginates by hand ([`PagedTextLayout`]).
//! [`BatchRenderer::probe`] picks one from the [`RenderCapabilities`] it is
//! given and keeps it for its whole lifetime; individual render calls never
//! re-decide.

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;

use time::OffsetDateTime;

use super::document::{Color, Document, TextStyle, wrap_text};
use super::{ExportError, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, truncate_chars};
use crate::record::{FeedbackRecord, MAX_RATING};
use crate::timestamp;

/// Narrowest side margin any layout may use.
pub const MIN_MARGIN_MM: f64 = 10.0;

const TITLE_Y: f64 = 20.0;
const GENERATED_Y: f64 = 30.0;
/// Where every page after the first starts drawing.
const CONTINUATION_Y: f64 = 20.0;

// =============================================================================
// LAYOUT SEAM
// =============================================================================

/// Places the per-record part of a batch report below the title block.
pub trait BatchLayout {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Draw `records` into `doc`, adding pages as needed.
    fn layout(&self, doc: &mut Document, records: &[FeedbackRecord]);
}

// =============================================================================
// TABLE
// =============================================================================

pub const TABLE_HEAD: [&str; 5] = ["Name", "Email", "Rating", "Comments", "Date"];

/// Comment cells are cut to this many characters.
pub const TABLE_COMMENT_CHARS: usize = 50;

const TABLE_START_Y: f64 = 40.0;
const TABLE_FONT_SIZE: f64 = 9.0;
const CELL_PADDING: f64 = 3.0;
const GRID_LINE_WIDTH: f64 = 0.1;
const GRID_COLOR: Color = Color::rgb(200, 200, 200);
/// Rows may not extend below this line.
const TABLE_BOTTOM_Y: f64 = PAGE_HEIGHT_MM - 15.0;
/// Baseline offset from the top of a line box, as a fraction of line height.
const BASELINE_RATIO: f64 = 0.8;

/// Bordered grid with a filled header row that repeats on every page.
#[derive(Clone, Debug, PartialEq)]
pub struct TableLayout {
    widths: [f64; 5],
}

impl Default for TableLayout {
    fn default() -> Self {
        Self { widths: [30.0, 40.0, 20.0, 60.0, 35.0] }
    }
}

impl TableLayout {
    #[must_use]
    pub fn widths(&self) -> &[f64; 5] {
        &self.widths
    }

    /// Total width of all columns.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.widths.iter().sum()
    }

    fn left(&self) -> f64 {
        (PAGE_WIDTH_MM - self.width()) / 2.0
    }

    fn cells(record: &FeedbackRecord) -> [String; 5] {
        [
            record.name.clone(),
            record.email.clone(),
            format!("{}/{MAX_RATING}", record.rating),
            truncate_chars(&record.comments, TABLE_COMMENT_CHARS),
            record.submitted_display(),
        ]
    }

    /// Draw one row at `y` and return its height.
    fn row(&self, doc: &mut Document, y: f64, cells: &[String], style: TextStyle, fill: Option<Color>) -> f64 {
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(self.widths)
            .map(|(cell, width)| wrap_text(cell, style.size, width - 2.0 * CELL_PADDING))
            .collect();
        let height = self.row_height(&wrapped, style);

        let mut x = self.left();
        for (lines, width) in wrapped.iter().zip(self.widths) {
            if let Some(fill) = fill {
                doc.fill_rect(x, y, width, height, fill);
            }
            doc.stroke_rect(x, y, width, height, GRID_LINE_WIDTH, GRID_COLOR);
            let baseline = y + CELL_PADDING + style.line_height() * BASELINE_RATIO;
            doc.text_lines(x + CELL_PADDING, baseline, lines, style);
            x += width;
        }
        height
    }

    #[allow(clippy::unused_self)]
    fn row_height(&self, wrapped: &[Vec<String>], style: TextStyle) -> f64 {
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        #[allow(clippy::cast_precision_loss)]
        let text_height = lines as f64 * style.line_height();
        text_height + 2.0 * CELL_PADDING
    }

    fn head(&self, doc: &mut Document, y: f64) -> f64 {
        let head: Vec<String> = TABLE_HEAD.iter().map(|&h| h.to_owned()).collect();
        let style = TextStyle::new(TABLE_FONT_SIZE).bold().color(Color::WHITE);
        self.row(doc, y, &head, style, Some(Color::BRAND))
    }
}

impl BatchLayout for TableLayout {
    fn name(&self) -> &'static str {
        "table"
    }

    fn layout(&self, doc: &mut Document, records: &[FeedbackRecord]) {
        let body = TextStyle::new(TABLE_FONT_SIZE);
        let mut y = TABLE_START_Y;
        y += self.head(doc, y);

        for record in records {
            let cells = Self::cells(record);
            let wrapped: Vec<Vec<String>> = cells
                .iter()
                .zip(self.widths)
                .map(|(cell, width)| wrap_text(cell, body.size, width - 2.0 * CELL_PADDING))
                .collect();
            if y + self.row_height(&wrapped, body) > TABLE_BOTTOM_Y {
                doc.add_page();
                y = CONTINUATION_Y;
                y += self.head(doc, y);
            }
            y += self.row(doc, y, &cells, body, None);
        }
    }
}

// =============================================================================
// PAGED TEXT
// =============================================================================

/// Comments in the list layout are cut to this many characters.
pub const LIST_COMMENT_CHARS: usize = 80;

const LIST_START_Y: f64 = 50.0;
const LIST_MARGIN_X: f64 = 20.0;
const LIST_WRAP_WIDTH: f64 = 170.0;
const LIST_LINE_STEP: f64 = 7.0;
const LIST_ITEM_GAP: f64 = 5.0;
/// A new item starting below this line goes on a fresh page.
const LIST_PAGE_LIMIT_Y: f64 = 270.0;
const INDENT: &str = "   ";

/// Numbered list of records with explicit page breaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PagedTextLayout;

impl BatchLayout for PagedTextLayout {
    fn name(&self) -> &'static str {
        "paged-text"
    }

    fn layout(&self, doc: &mut Document, records: &[FeedbackRecord]) {
        let body = TextStyle::new(12.0);
        let mut y = LIST_START_Y;

        for (index, record) in records.iter().enumerate() {
            if y > LIST_PAGE_LIMIT_Y {
                doc.add_page();
                y = CONTINUATION_Y;
            }

            doc.text(LIST_MARGIN_X, y, format!("{}. {}", index + 1, record.name), body.bold());
            y += LIST_LINE_STEP;
            doc.text(LIST_MARGIN_X, y, format!("{INDENT}Email: {}", record.email), body);
            y += LIST_LINE_STEP;
            doc.text(LIST_MARGIN_X, y, format!("{INDENT}Rating: {}/{MAX_RATING}", record.rating), body);
            y += LIST_LINE_STEP;

            let comment = truncate_chars(&record.comments, LIST_COMMENT_CHARS);
            let lines = wrap_text(&format!("{INDENT}{comment}"), body.size, LIST_WRAP_WIDTH);
            for line in &lines {
                doc.text(LIST_MARGIN_X, y, line.clone(), body);
                y += LIST_LINE_STEP;
            }
            y += LIST_ITEM_GAP;
        }
    }
}

// =============================================================================
// STRATEGY SELECTION
// =============================================================================

/// What the rendering environment supports.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderCapabilities {
    /// Grid tables are available.
    pub tables: bool,
    /// Usable page width in millimetres.
    pub printable_width: f64,
}

impl Default for RenderCapabilities {
    fn default() -> Self {
        Self { tables: true, printable_width: PAGE_WIDTH_MM - 2.0 * MIN_MARGIN_MM }
    }
}

impl RenderCapabilities {
    #[must_use]
    pub fn with_tables(tables: bool) -> Self {
        Self { tables, ..Self::default() }
    }
}

/// Which layout a [`BatchRenderer`] settled on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStrategy {
    Table,
    PagedText,
}

/// Batch report renderer with a strategy fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchRenderer {
    inner: Strategy,
}

#[derive(Clone, Debug, PartialEq)]
enum Strategy {
    Table(TableLayout),
    PagedText(PagedTextLayout),
}

impl BatchRenderer {
    /// Use the table layout when tables are supported and its columns fit
    /// the printable width, the paged list otherwise.
    #[must_use]
    pub fn probe(capabilities: RenderCapabilities) -> Self {
        let table = TableLayout::default();
        let inner = if capabilities.tables && table.width() <= capabilities.printable_width {
            Strategy::Table(table)
        } else {
            Strategy::PagedText(PagedTextLayout)
        };
        Self { inner }
    }

    #[must_use]
    pub fn strategy(&self) -> BatchStrategy {
        match self.inner {
            Strategy::Table(_) => BatchStrategy::Table,
            Strategy::PagedText(_) => BatchStrategy::PagedText,
        }
    }

    fn layout(&self) -> &dyn BatchLayout {
        match &self.inner {
            Strategy::Table(table) => table,
            Strategy::PagedText(list) => list,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.layout().name()
    }

    /// Render every record of `form_type` into one document.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::EmptyBatch`] when `records` is empty.
    pub fn render(
        &self,
        form_type: &str,
        records: &[FeedbackRecord],
        generated_at: OffsetDateTime,
    ) -> Result<Document, ExportError> {
        if records.is_empty() {
            return Err(ExportError::EmptyBatch(form_type.to_owned()));
        }

        let mut doc = Document::new();
        let center_x = PAGE_WIDTH_MM / 2.0;
        doc.text(
            center_x,
            TITLE_Y,
            format!("{form_type} - All Feedbacks"),
            TextStyle::new(20.0).color(Color::BRAND).centered(),
        );
        doc.text(
            center_x,
            GENERATED_Y,
            format!("Generated on: {}", timestamp::display(Some(generated_at))),
            TextStyle::new(10.0).color(Color::GREY).centered(),
        );
        self.layout().layout(&mut doc, records);
        Ok(doc)
    }
}

/// Render with the default capabilities.
///
/// # Errors
///
/// Returns [`ExportError::EmptyBatch`] when `records` is empty.
pub fn render_batch(
    form_type: &str,
    records: &[FeedbackRecord],
    generated_at: OffsetDateTime,
) -> Result<Document, ExportError> {
    BatchRenderer::probe(RenderCapabilities::default()).render(form_type, records, generated_at)
}
