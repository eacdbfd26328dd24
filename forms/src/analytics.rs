//! Per-form feedback analytics.
//!
//! Records are grouped by form type in first-seen order, and every group gets
//! a total, a one-decimal average rating and a 5..1 histogram. Unrated records
//! (rating 0) count toward the total and pull the average down, but are never
//! counted in a histogram bucket or in `rated`.

#[cfg(test)]
#[path = "analytics_test.rs"]
mod analytics_test;

use indexmap::IndexMap;

use crate::record::{FeedbackRecord, MAX_RATING, normalize_form_type};

/// Occurrences of one rating value within a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RatingCount {
    pub rating: u8,
    pub count: usize,
}

/// Aggregate numbers for a group of records.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub total: usize,
    /// Records with a rating of 1..=5.
    pub rated: usize,
    /// Mean rating over all records, rounded to one decimal; 0 when empty.
    pub average: f64,
    /// Always five entries, ratings 5, 4, 3, 2, 1 in that order.
    pub histogram: Vec<RatingCount>,
}

/// Analytics for one form type, with the records it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct FormAnalytics {
    pub form_type: String,
    pub summary: Summary,
    pub records: Vec<FeedbackRecord>,
}

/// Partition records by form type, preserving first-seen group order.
#[must_use]
pub fn group_by_form_type(records: &[FeedbackRecord]) -> IndexMap<String, Vec<FeedbackRecord>> {
    let mut groups: IndexMap<String, Vec<FeedbackRecord>> = IndexMap::new();
    for record in records {
        let key = normalize_form_type(&record.form_type);
        groups.entry(key.to_owned()).or_default().push(record.clone());
    }
    groups
}

/// Total, average and histogram for a group of records.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(records: &[FeedbackRecord]) -> Summary {
    let total = records.len();
    let sum: u64 = records.iter().map(|record| u64::from(record.rating)).sum();
    let average = if total == 0 { 0.0 } else { round_one_decimal(sum as f64 / total as f64) };
    let histogram = (1..=MAX_RATING)
        .rev()
        .map(|rating| RatingCount {
            rating,
            count: records.iter().filter(|record| record.rating == rating).count(),
        })
        .collect();
    Summary {
        total,
        rated: records.iter().filter(|record| record.is_rated()).count(),
        average,
        histogram,
    }
}

/// Group and summarize in one pass over the dashboard's record list.
#[must_use]
pub fn analyze(records: &[FeedbackRecord]) -> Vec<FormAnalytics> {
    group_by_form_type(records)
        .into_iter()
        .map(|(form_type, records)| FormAnalytics { summary: summarize(&records), form_type, records })
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
