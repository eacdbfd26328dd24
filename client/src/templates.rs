//! Live list of form templates mirrored from `/api/forms`.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store only ever holds what the server has confirmed. Field edits go to
//! a [`TemplateDraft`] and reach the list through [`TemplateStore::save`],
//! which creates or replaces the template on the server first.

#[cfg(test)]
#[path = "templates_test.rs"]
mod templates_test;

use std::sync::Arc;

use forms::{FormTemplate, Id, TemplateDraft};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::notify::Notifier;

pub const LOAD_FAILED: &str = "Unable to load forms. Please check your connection.";

pub struct TemplateStore {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    templates: Vec<FormTemplate>,
}

impl TemplateStore {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier, templates: Vec::new() }
    }

    #[must_use]
    pub fn templates(&self) -> &[FormTemplate] {
        &self.templates
    }

    #[must_use]
    pub fn get(&self, id: &Id) -> Option<&FormTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    /// Fetch every template.
    ///
    /// A failed fetch is not an error for the caller: it raises an alert,
    /// empties the list and returns the empty list.
    pub async fn load(&mut self) -> &[FormTemplate] {
        match self.api.list_forms().await {
            Ok(templates) => {
                tracing::debug!(count = templates.len(), "templates loaded");
                self.templates = templates;
            }
            Err(e) => {
                tracing::warn!(error = %e, "template fetch failed");
                self.notifier.error(LOAD_FAILED);
                self.templates.clear();
            }
        }
        &self.templates
    }

    /// Create a template from a new draft and append it to the list.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Template`] without sending anything when the
    /// title is blank, or the request failure.
    pub async fn create(&mut self, draft: &TemplateDraft) -> Result<FormTemplate, ClientError> {
        draft.validate()?;
        let created = self.api.create_form(&draft.payload()).await?;
        tracing::info!(id = %created.id, title = %created.title, "template created");
        self.templates.push(created.clone());
        Ok(created)
    }

    /// Replace title, description and fields of template `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Template`] without sending anything when the
    /// title is blank, or the request failure.
    pub async fn update(&mut self, id: &Id, draft: &TemplateDraft) -> Result<FormTemplate, ClientError> {
        draft.validate()?;
        self.api.update_form(id, &draft.payload()).await?;
        let updated = draft.to_template(id.clone());
        match self.templates.iter_mut().find(|t| &t.id == id) {
            Some(slot) => *slot = updated.clone(),
            None => self.templates.push(updated.clone()),
        }
        tracing::info!(%id, fields = updated.fields.len(), "template updated");
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns the request failure; the list is unchanged in that case.
    pub async fn delete(&mut self, id: &Id) -> Result<(), ClientError> {
        self.api.delete_form(id).await?;
        self.templates.retain(|t| &t.id != id);
        tracing::info!(%id, "template deleted");
        Ok(())
    }

    /// Open an edit buffer on a template from the live list.
    #[must_use]
    pub fn edit(&self, id: &Id) -> Option<TemplateDraft> {
        self.get(id).map(TemplateDraft::from_template)
    }

    /// Persist a draft: update when it already has an id, create otherwise.
    /// A created draft takes on the server-assigned id.
    ///
    /// # Errors
    ///
    /// See [`Self::create`] and [`Self::update`].
    pub async fn save(&mut self, draft: &mut TemplateDraft) -> Result<FormTemplate, ClientError> {
        match draft.id.clone() {
            Some(id) => self.update(&id, draft).await,
            None => {
                let created = self.create(draft).await?;
                draft.id = Some(created.id.clone());
                Ok(created)
            }
        }
    }
}
