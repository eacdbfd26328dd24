//! Report rendering: feedback records to paginated PDF documents.
//!
//! DESIGN
//! ======
//! Rendering is split in three layers:
//! - [`document`] is a page-oriented drawing model in millimetres with a
//!   top-left origin (text, lines, rectangles) plus text measurement.
//! - [`single`] and [`batch`] lay records out onto that model. The batch
//!   report has two interchangeable layouts chosen once by capability probing.
//! - [`pdf`] serializes a finished document to PDF 1.4 bytes.
//!
//! Writing the bytes to disk belongs to the caller; [`ExportError`] covers
//! both the layout and the write step so callers surface one error type.

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

pub mod batch;
pub mod document;
pub mod pdf;
pub mod single;

use std::path::PathBuf;

pub use batch::{
    BatchLayout, BatchRenderer, BatchStrategy, PagedTextLayout, RenderCapabilities, TableLayout, render_batch,
};
pub use document::{Align, Color, Document, Font, Op, Page, TextStyle};
pub use single::render_single;

/// A4 portrait, in millimetres.
pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;

/// Millimetres per PDF point.
pub const MM_PER_PT: f64 = 25.4 / 72.0;

/// Appended to text cut short by [`truncate_chars`].
pub const ELLIPSIS: &str = "...";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A batch report was requested for a form type with no records.
    #[error("no feedback to export for {0}")]
    EmptyBatch(String),

    /// The export directory is missing or is not a directory.
    #[error("export directory {0} does not exist")]
    MissingDirectory(PathBuf),

    /// Writing or renaming the output file failed.
    #[error("failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Keep the first `max` characters of `text`, appending `...` if anything
/// was cut.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_owned(),
    }
}

/// `feedback_{name}_{millis}.pdf`
#[must_use]
pub fn single_filename(name: &str, millis: u64) -> String {
    format!("feedback_{}_{millis}.pdf", file_component(name))
}

/// `{formType}_all_feedbacks_{millis}.pdf`
#[must_use]
pub fn batch_filename(form_type: &str, millis: u64) -> String {
    format!("{}_all_feedbacks_{millis}.pdf", file_component(form_type))
}

/// Collapse whitespace runs to `_` and neutralize path separators so a
/// respondent name can never escape the export directory.
fn file_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match ch {
            '/' | '\\' | ':' | '\0' => out.push('-'),
            _ => out.push(ch),
        }
    }
    if out.is_empty() || out.chars().all(|c| c == '.') {
        return "untitled".to_owned();
    }
    out
}
