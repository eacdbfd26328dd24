use super::*;
use crate::report::document::TextStyle;

fn as_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn sample(pages: usize) -> Document {
    let mut doc = Document::new();
    for i in 0..pages {
        if i > 0 {
            doc.add_page();
        }
        doc.text(20.0, 20.0, format!("page {}", i + 1), TextStyle::new(12.0));
    }
    doc
}

#[test]
fn output_is_framed_as_pdf() {
    let bytes = to_pdf_bytes(&sample(1));
    assert!(bytes.starts_with(b"%PDF-1.4\n"));
    assert!(bytes.ends_with(b"%%EOF\n"));
}

#[test]
fn page_tree_counts_every_page() {
    let text = as_text(&to_pdf_bytes(&sample(3)));
    assert!(text.contains("/Kids [5 0 R 7 0 R 9 0 R] /Count 3"));
    assert_eq!(text.matches("/Type /Page ").count(), 3);
}

#[test]
fn xref_offsets_point_at_objects() {
    let bytes = to_pdf_bytes(&sample(2));
    let text = as_text(&bytes);
    let xref_at: usize = text.rsplit("startxref\n").next().unwrap().lines().next().unwrap().parse().unwrap();
    let xref = as_text(&bytes[xref_at..]);
    assert!(xref.starts_with("xref\n0 9\n"));

    let entries: Vec<&str> = xref.lines().skip(3).take(8).collect();
    for (index, entry) in entries.iter().enumerate() {
        let offset: usize = entry[..10].parse().unwrap();
        let expected = format!("{} 0 obj", index + 1);
        assert!(bytes[offset..].starts_with(expected.as_bytes()), "object {} not at {offset}", index + 1);
    }
}

#[test]
fn stream_length_matches_content() {
    let text = as_text(&to_pdf_bytes(&sample(1)));
    let start = text.find("/Length ").unwrap() + "/Length ".len();
    let length: usize = text[start..].split(' ').next().unwrap().parse().unwrap();
    let body_start = text.find("stream\n").unwrap() + "stream\n".len();
    let body_end = text.find("\nendstream").unwrap();
    assert_eq!(body_end - body_start, length);
}

#[test]
fn text_is_positioned_from_the_top_left() {
    let text = as_text(&to_pdf_bytes(&sample(1)));
    // 20 mm = 56.69 pt; 297 - 20 = 277 mm = 785.2 pt.
    assert!(text.contains("BT /F1 12 Tf 0 0 0 rg 56.69 785.2 Td (page 1) Tj ET"));
}

#[test]
fn bold_text_uses_second_font() {
    let mut doc = Document::new();
    doc.text(10.0, 10.0, "x", TextStyle::new(9.0).bold());
    assert!(as_text(&to_pdf_bytes(&doc)).contains("BT /F2 9 Tf"));
}

#[test]
fn literal_strings_are_escaped() {
    let mut out = Vec::new();
    encode_text("a(b)c\\d", &mut out);
    assert_eq!(out, b"a\\(b\\)c\\\\d");
}

#[test]
fn non_latin1_characters_are_replaced() {
    let mut out = Vec::new();
    encode_text("café ✓", &mut out);
    assert_eq!(out, b"caf\xE9 ?");
}

#[test]
fn numbers_drop_trailing_zeros() {
    assert_eq!(num(12.0), "12");
    assert_eq!(num(0.5), "0.5");
    assert_eq!(num(-0.001), "0");
    assert_eq!(num(785.196), "785.2");
}

#[test]
fn rectangles_are_anchored_at_their_bottom_edge() {
    // Top at 10 mm, 10 mm tall: bottom edge 20 mm from the top.
    assert_eq!(rect(0.0, 10.0, 10.0, 10.0), "0 785.2 28.35 28.35");
}
