use time::macros::datetime;

use super::*;
use crate::Id;
use crate::report::document::Op;

fn record(rating: u8, comments: &str) -> FeedbackRecord {
    FeedbackRecord {
        id: Id::from("1"),
        form_type: "Course Evaluation".to_owned(),
        name: "Jane Doe".to_owned(),
        email: "jane@example.test".to_owned(),
        rating,
        comments: comments.to_owned(),
        created_at: Some(datetime!(2024-03-01 9:30:00 UTC)),
    }
}

fn text_at<'a>(doc: &'a Document, needle: &str) -> Option<(f64, f64, &'a TextStyle)> {
    doc.pages()[0].ops.iter().find_map(|op| match op {
        Op::Text { x, y, style, text } if text == needle => Some((*x, *y, style)),
        _ => None,
    })
}

#[test]
fn single_sheet_has_every_labeled_field() {
    let doc = render_single(&record(4, "Great course"), datetime!(2024-03-02 10:00:00 UTC));
    let texts: Vec<&str> = doc.texts().collect();
    assert_eq!(
        texts,
        vec![
            "Feedback Report",
            "Form Type: Course Evaluation",
            "Name:",
            "Jane Doe",
            "Email:",
            "jane@example.test",
            "Rating:",
            "4/5 - Good",
            "Submitted:",
            "2024-03-01 09:30:00",
            "Comments:",
            "Great course",
            "Generated on: 2024-03-02 10:00:00",
        ]
    );
    assert_eq!(doc.page_count(), 1);
}

#[test]
fn title_is_centered_in_brand_color() {
    let doc = render_single(&record(4, "x"), datetime!(2024-03-02 10:00:00 UTC));
    let (x, y, style) = text_at(&doc, "Feedback Report").unwrap();
    assert!((x - 105.0).abs() < f64::EPSILON);
    assert!((y - 20.0).abs() < f64::EPSILON);
    assert_eq!(style.color, Color::BRAND);
    assert_eq!(style.align, crate::report::Align::Center);
}

#[test]
fn unrated_record_says_not_rated() {
    let doc = render_single(&record(0, "x"), datetime!(2024-03-02 10:00:00 UTC));
    assert!(doc.texts().any(|t| t == "Not rated"));
}

#[test]
fn separator_line_spans_the_page() {
    let doc = render_single(&record(3, "x"), datetime!(2024-03-02 10:00:00 UTC));
    let line = doc.pages()[0].ops.iter().find(|op| matches!(op, Op::Line { .. })).unwrap();
    assert_eq!(line, &Op::Line { x1: 20.0, y1: 45.0, x2: 190.0, y2: 45.0, width: 0.5, color: Color::BLACK });
}

#[test]
fn field_rows_follow_fixed_steps() {
    let doc = render_single(&record(5, "x"), datetime!(2024-03-02 10:00:00 UTC));
    assert!((text_at(&doc, "Name:").unwrap().1 - 60.0).abs() < f64::EPSILON);
    assert!((text_at(&doc, "Email:").unwrap().1 - 75.0).abs() < f64::EPSILON);
    assert!((text_at(&doc, "Rating:").unwrap().1 - 90.0).abs() < f64::EPSILON);
    assert!((text_at(&doc, "Submitted:").unwrap().1 - 105.0).abs() < f64::EPSILON);
    assert!((text_at(&doc, "Comments:").unwrap().1 - 125.0).abs() < f64::EPSILON);
}

#[test]
fn long_comments_wrap_onto_several_lines() {
    let comments = "The sessions were well paced and the material was relevant. ".repeat(6);
    let doc = render_single(&record(5, &comments), datetime!(2024-03-02 10:00:00 UTC));
    let body_lines = doc
        .texts()
        .skip_while(|t| *t != "Comments:")
        .skip(1)
        .take_while(|t| !t.starts_with("Generated on:"))
        .count();
    assert!(body_lines > 1);
}

#[test]
fn missing_timestamp_shows_placeholder() {
    let mut rec = record(2, "x");
    rec.created_at = None;
    let doc = render_single(&rec, datetime!(2024-03-02 10:00:00 UTC));
    assert!(text_at(&doc, "N/A").is_some());
}
