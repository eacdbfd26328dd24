//! One-page sheet for a single feedback record.

#[cfg(test)]
#[path = "single_test.rs"]
mod single_test;

use time::OffsetDateTime;

use super::PAGE_WIDTH_MM;
use super::document::{Color, Document, TextStyle, wrap_text};
use crate::record::FeedbackRecord;
use crate::timestamp;

pub const TITLE: &str = "Feedback Report";

const MARGIN_X: f64 = 20.0;
const VALUE_X: f64 = 50.0;
const VALUE_WIDTH: f64 = 140.0;
const COMMENTS_WIDTH: f64 = 170.0;
const TITLE_Y: f64 = 20.0;
const FORM_TYPE_Y: f64 = 40.0;
const RULE_Y: f64 = 45.0;
const RULE_END_X: f64 = 190.0;
const FIELDS_Y: f64 = 60.0;
const FIELD_STEP: f64 = 15.0;
const SUBMITTED_STEP: f64 = 20.0;
const COMMENTS_GAP: f64 = 10.0;
const FOOTER_Y: f64 = 270.0;

/// Lay out `record` as a single report sheet.
#[must_use]
pub fn render_single(record: &FeedbackRecord, generated_at: OffsetDateTime) -> Document {
    let mut doc = Document::new();
    let center_x = PAGE_WIDTH_MM / 2.0;

    doc.text(center_x, TITLE_Y, TITLE, TextStyle::new(20.0).color(Color::BRAND).centered());
    doc.text(MARGIN_X, FORM_TYPE_Y, format!("Form Type: {}", record.form_type), TextStyle::new(14.0));
    doc.line((MARGIN_X, RULE_Y), (RULE_END_X, RULE_Y), 0.5, Color::BLACK);

    let body = TextStyle::new(12.0);
    let label = body.bold();
    let mut y = FIELDS_Y;

    // --- Wrapped fields ---
    for (name, value) in [("Name:", &record.name), ("Email:", &record.email)] {
        doc.text(MARGIN_X, y, name, label);
        let lines = wrap_text(value, body.size, VALUE_WIDTH);
        let drawn = doc.text_lines(VALUE_X, y, &lines, body);
        #[allow(clippy::cast_precision_loss)]
        let advance = FIELD_STEP * drawn as f64;
        y += advance;
    }

    doc.text(MARGIN_X, y, "Rating:", label);
    doc.text(VALUE_X, y, record.rating_text(), body);
    y += FIELD_STEP;

    doc.text(MARGIN_X, y, "Submitted:", label);
    doc.text(VALUE_X, y, record.submitted_display(), body);
    y += SUBMITTED_STEP;

    // --- Comments ---
    doc.text(MARGIN_X, y, "Comments:", label);
    y += COMMENTS_GAP;
    let comments = wrap_text(&record.comments, body.size, COMMENTS_WIDTH);
    doc.text_lines(MARGIN_X, y, &comments, body);

    doc.text(
        center_x,
        FOOTER_Y,
        format!("Generated on: {}", timestamp::display(Some(generated_at))),
        TextStyle::new(10.0).color(Color::GREY).centered(),
    );
    doc
}
