//! Minimal PDF 1.4 writer for [`Document`].
//!
//! Only the two standard Helvetica faces are referenced, so no font program
//! is embedded. Text is encoded as WinAnsi; characters outside Latin-1 are
//! replaced with `?`. Page coordinates are converted from top-left
//! millimetres to bottom-left points.

#[cfg(test)]
#[path = "pdf_test.rs"]
mod pdf_test;

use std::fmt::Write as _;

use super::document::{Align, Color, Document, Font, Op, text_width};
use super::{MM_PER_PT, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

const HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_REGULAR_ID: usize = 3;
const FONT_BOLD_ID: usize = 4;
const FIRST_PAGE_ID: usize = 5;

/// Serialize `doc` into a complete PDF file.
#[must_use]
pub fn to_pdf_bytes(doc: &Document) -> Vec<u8> {
    let mut out = PdfWriter::default();
    out.bytes.extend_from_slice(HEADER);

    let page_count = doc.page_count();
    // Each page takes two objects: the page dictionary and its content stream.
    let page_ids: Vec<usize> = (0..page_count).map(|i| FIRST_PAGE_ID + 2 * i).collect();

    out.object(CATALOG_ID, &format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>"));

    let kids = page_ids.iter().map(|id| format!("{id} 0 R")).collect::<Vec<_>>().join(" ");
    out.object(PAGES_ID, &format!("<< /Type /Pages /Kids [{kids}] /Count {page_count} >>"));

    out.object(FONT_REGULAR_ID, &font_dict("Helvetica"));
    out.object(FONT_BOLD_ID, &font_dict("Helvetica-Bold"));

    let width_pt = PAGE_WIDTH_MM / MM_PER_PT;
    let height_pt = PAGE_HEIGHT_MM / MM_PER_PT;
    for (page, page_id) in doc.pages().iter().zip(&page_ids) {
        let content_id = page_id + 1;
        out.object(
            *page_id,
            &format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 {FONT_REGULAR_ID} 0 R /F2 {FONT_BOLD_ID} 0 R >> >> \
                 /Contents {content_id} 0 R >>",
                num(width_pt),
                num(height_pt),
            ),
        );
        let stream = content_stream(&page.ops);
        out.stream(content_id, &stream);
    }

    out.finish(CATALOG_ID)
}

fn font_dict(base: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
}

#[derive(Default)]
struct PdfWriter {
    bytes: Vec<u8>,
    /// `(object id, byte offset)` of every object written so far.
    offsets: Vec<(usize, usize)>,
}

impl PdfWriter {
    fn object(&mut self, id: usize, body: &str) {
        self.offsets.push((id, self.bytes.len()));
        self.bytes.extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn stream(&mut self, id: usize, data: &[u8]) {
        self.offsets.push((id, self.bytes.len()));
        self.bytes.extend_from_slice(format!("{id} 0 obj\n<< /Length {} >>\nstream\n", data.len()).as_bytes());
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        self.offsets.sort_unstable();
        let xref_at = self.bytes.len();
        let size = self.offsets.len() + 1;

        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for (_, offset) in &self.offsets {
            let _ = write!(xref, "{offset:010} 00000 n \n");
        }
        let _ = write!(xref, "trailer\n<< /Size {size} /Root {root} 0 R >>\nstartxref\n{xref_at}\n%%EOF\n");
        self.bytes.extend_from_slice(xref.as_bytes());
        self.bytes
    }
}

fn content_stream(ops: &[Op]) -> Vec<u8> {
    let mut out = Vec::new();
    for op in ops {
        match op {
            Op::Text { x, y, style, text } => {
                let left = match style.align {
                    Align::Left => *x,
                    Align::Center => x - text_width(text, style.size) / 2.0,
                };
                let font = match style.font {
                    Font::Regular => "F1",
                    Font::Bold => "F2",
                };
                out.extend_from_slice(
                    format!(
                        "BT /{font} {} Tf {} rg {} {} Td (",
                        num(style.size),
                        rgb(style.color),
                        num(to_pt(left)),
                        num(flip_y(*y)),
                    )
                    .as_bytes(),
                );
                encode_text(text, &mut out);
                out.extend_from_slice(b") Tj ET\n");
            }
            Op::Line { x1, y1, x2, y2, width, color } => {
                let line = format!(
                    "{} w {} RG {} {} m {} {} l S\n",
                    num(to_pt(*width)),
                    rgb(*color),
                    num(to_pt(*x1)),
                    num(flip_y(*y1)),
                    num(to_pt(*x2)),
                    num(flip_y(*y2)),
                );
                out.extend_from_slice(line.as_bytes());
            }
            Op::FillRect { x, y, w, h, color } => {
                let fill = format!("{} rg {} re f\n", rgb(*color), rect(*x, *y, *w, *h));
                out.extend_from_slice(fill.as_bytes());
            }
            Op::StrokeRect { x, y, w, h, width, color } => {
                let stroke =
                    format!("{} w {} RG {} re S\n", num(to_pt(*width)), rgb(*color), rect(*x, *y, *w, *h));
                out.extend_from_slice(stroke.as_bytes());
            }
        }
    }
    out
}

fn to_pt(mm: f64) -> f64 {
    mm / MM_PER_PT
}

fn flip_y(mm: f64) -> f64 {
    to_pt(PAGE_HEIGHT_MM - mm)
}

/// `x y w h` operands for a rectangle whose top-left corner is `(x, y)`.
fn rect(x: f64, y: f64, w: f64, h: f64) -> String {
    format!("{} {} {} {}", num(to_pt(x)), num(flip_y(y + h)), num(to_pt(w)), num(to_pt(h)))
}

fn rgb(color: Color) -> String {
    let c = |v: u8| num(f64::from(v) / 255.0);
    format!("{} {} {}", c(color.r), c(color.g), c(color.b))
}

/// Two-decimal number without trailing zeros.
fn num(value: f64) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

/// Append `text` as the inside of a PDF literal string.
fn encode_text(text: &str, out: &mut Vec<u8>) {
    for ch in text.chars() {
        match ch {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\t' | '\r' | '\n' => out.push(b' '),
            _ => match u8::try_from(u32::from(ch)) {
                Ok(byte) if (0x20..0x7F).contains(&byte) || byte >= 0xA0 => out.push(byte),
                _ => out.push(b'?'),
            },
        }
    }
}
