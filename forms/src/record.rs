//! Feedback submissions as the admin dashboard sees them.
//!
//! DESIGN
//! ======
//! The backend stores each submission as a free-form `answers` object. Records
//! are normalized once at the boundary ([`RawFeedback`] -> [`FeedbackRecord`])
//! so analytics and export code can rely on the defaults below instead of
//! re-checking optional keys.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::{Id, timestamp};

pub const DEFAULT_FORM_TYPE: &str = "General Feedback";
pub const DEFAULT_NAME: &str = "Anonymous";
pub const DEFAULT_EMAIL: &str = "N/A";
pub const DEFAULT_COMMENTS: &str = "No comments provided";

/// Highest rating on the five-point scale. 0 means unrated.
pub const MAX_RATING: u8 = 5;

/// Labels for ratings 1 through 5.
pub const RATING_LABELS: [&str; 5] = ["Very Poor", "Poor", "Average", "Good", "Excellent"];

/// A feedback submission exactly as returned by `GET /api/feedback`.
#[derive(Clone, Debug, Deserialize)]
pub struct RawFeedback {
    pub id: Id,
    #[serde(default)]
    pub answers: Value,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

/// A normalized, read-only feedback submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub id: Id,
    /// Form template title the submission was made against.
    pub form_type: String,
    pub name: String,
    pub email: String,
    /// 0 when unrated, otherwise 1..=5.
    pub rating: u8,
    pub comments: String,
    pub created_at: Option<OffsetDateTime>,
}

impl From<RawFeedback> for FeedbackRecord {
    fn from(raw: RawFeedback) -> Self {
        let answers = &raw.answers;
        Self {
            id: raw.id,
            form_type: answer_text(answers, "formType").unwrap_or_else(|| DEFAULT_FORM_TYPE.to_owned()),
            name: answer_text(answers, "name").unwrap_or_else(|| DEFAULT_NAME.to_owned()),
            email: answer_text(answers, "email").unwrap_or_else(|| DEFAULT_EMAIL.to_owned()),
            rating: normalize_rating(answers.get("rating")),
            comments: answer_text(answers, "comments").unwrap_or_else(|| DEFAULT_COMMENTS.to_owned()),
            created_at: timestamp::parse_lenient(raw.created_at.as_deref()),
        }
    }
}

impl FeedbackRecord {
    #[must_use]
    pub fn is_rated(&self) -> bool {
        self.rating > 0
    }

    /// `"4/5 - Good"`, or `"Not rated"` for an unrated record.
    #[must_use]
    pub fn rating_text(&self) -> String {
        match rating_label(self.rating) {
            Some(label) => format!("{}/{MAX_RATING} - {label}", self.rating),
            None => "Not rated".to_owned(),
        }
    }

    #[must_use]
    pub fn submitted_display(&self) -> String {
        timestamp::display(self.created_at)
    }
}

/// Label for a rating on the five-point scale, `None` for 0 or out of range.
#[must_use]
pub fn rating_label(rating: u8) -> Option<&'static str> {
    let index = usize::from(rating).checked_sub(1)?;
    RATING_LABELS.get(index).copied()
}

/// Coerce a JSON rating into 0..=5.
///
/// Numbers and numeric strings are accepted when they are whole values within
/// the scale; anything else (absent, non-numeric, fractional, out of range)
/// becomes 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn normalize_rating(value: Option<&Value>) -> u8 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.fract() == 0.0 && (0.0..=f64::from(MAX_RATING)).contains(&n) => n as u8,
        _ => 0,
    }
}

/// Non-empty textual answer for `key`. Numbers are rendered as text.
fn answer_text(answers: &Value, key: &str) -> Option<String> {
    match answers.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Replace a missing or empty form type with [`DEFAULT_FORM_TYPE`].
#[must_use]
pub fn normalize_form_type(form_type: &str) -> &str {
    if form_type.is_empty() { DEFAULT_FORM_TYPE } else { form_type }
}
