//! Admin feedback dashboard: fetch, per-form analytics, and bulk clear.
//!
//! DESIGN
//! ======
//! The record cache is replaced only by a successful fetch. A failed fetch
//! leaves an error state next to whatever was cached before, and
//! [`FeedbackDashboard::retry`] re-runs the same fetch.
//!
//! The bulk clear issues one `DELETE` per record, all in flight at once, and
//! waits for every one to settle. Afterwards the cache holds exactly the
//! records whose delete failed, and those failures are returned to the caller
//! instead of being dropped.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::collections::HashSet;

use forms::{FeedbackRecord, FormAnalytics, Id, analyze};
use futures::future::join_all;

use crate::api::ApiClient;
use crate::error::{ClearError, ClientError};

pub const LOAD_FAILED: &str = "Failed to load feedbacks. Please try again later.";

/// Token proving the operator confirmed a bulk clear.
#[derive(Debug)]
pub struct Confirmed(());

impl Confirmed {
    /// Only call after the operator has explicitly agreed to delete every
    /// feedback record.
    #[must_use]
    pub fn by_operator() -> Self {
        Self(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded,
    Failed(String),
}

pub struct FeedbackDashboard {
    api: ApiClient,
    records: Vec<FeedbackRecord>,
    state: LoadState,
}

impl FeedbackDashboard {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api, records: Vec::new(), state: LoadState::NotLoaded }
    }

    #[must_use]
    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    #[must_use]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Fetch every feedback record.
    pub async fn load(&mut self) -> &LoadState {
        match self.api.list_feedback().await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "feedback loaded");
                self.records = records;
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                tracing::warn!(error = %e, "feedback fetch failed");
                self.state = LoadState::Failed(LOAD_FAILED.to_owned());
            }
        }
        &self.state
    }

    /// Re-run the initial fetch after a failure.
    pub async fn retry(&mut self) -> &LoadState {
        self.load().await
    }

    /// Cached records grouped by form type, groups in first-seen order.
    #[must_use]
    pub fn analytics(&self) -> Vec<FormAnalytics> {
        analyze(&self.records)
    }

    /// Analytics for one form type, if any record carries it.
    #[must_use]
    pub fn group(&self, form_type: &str) -> Option<FormAnalytics> {
        self.analytics().into_iter().find(|group| group.form_type == form_type)
    }

    /// Delete every feedback record on the server.
    ///
    /// The current list is re-fetched first so records submitted since the
    /// last load are included. Returns how many records were deleted.
    ///
    /// # Errors
    ///
    /// Returns [`ClearError::Fetch`] if the list cannot be fetched (nothing is
    /// deleted), or [`ClearError::Partial`] naming every record whose delete
    /// failed.
    pub async fn clear_all(&mut self, _confirmed: Confirmed) -> Result<usize, ClearError> {
        let current = self.api.list_feedback().await.map_err(ClearError::Fetch)?;
        let api = &self.api;
        let outcomes = join_all(current.iter().map(|record| async move {
            let result = api.delete_feedback(&record.id).await;
            (record.id.clone(), result)
        }))
        .await;

        let mut failed: Vec<(Id, ClientError)> = Vec::new();
        let mut deleted = 0usize;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(%id, error = %e, "feedback delete failed");
                    failed.push((id, e));
                }
            }
        }

        let remaining: HashSet<&Id> = failed.iter().map(|(id, _)| id).collect();
        self.records = current.iter().filter(|r| remaining.contains(&r.id)).cloned().collect();
        tracing::info!(deleted, failed = failed.len(), "feedback clear finished");

        if failed.is_empty() { Ok(deleted) } else { Err(ClearError::Partial { deleted, failed }) }
    }
}
