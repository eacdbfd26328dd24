//! Admin management view: admin and user accounts side by side.
//!
//! DESIGN
//! ======
//! Both lists are fetched together. Only the admin list is essential: when it
//! fails the directory enters an error state, while a failed user fetch is
//! logged and leaves an empty user list.
//!
//! The session store is touched in two places. Editing the admin the session
//! is signed in as rewrites the cached profile, and deleting that admin is
//! refused before any request is made.

#[cfg(test)]
#[path = "accounts_test.rs"]
mod accounts_test;

use std::sync::Arc;

use forms::account::ensure_not_current_admin;
use forms::{AdminAccount, AdminUpdate, Id, NewAccount, SessionState, UserAccount, UserUpdate};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::session_store::SessionStore;

pub const ADMINS_FAILED: &str = "Failed to load admin users.";

pub struct AccountDirectory {
    api: ApiClient,
    session: Arc<dyn SessionStore>,
    admins: Vec<AdminAccount>,
    users: Vec<UserAccount>,
    error: Option<String>,
}

impl AccountDirectory {
    #[must_use]
    pub fn new(api: ApiClient, session: Arc<dyn SessionStore>) -> Self {
        Self { api, session, admins: Vec::new(), users: Vec::new(), error: None }
    }

    #[must_use]
    pub fn admins(&self) -> &[AdminAccount] {
        &self.admins
    }

    #[must_use]
    pub fn users(&self) -> &[UserAccount] {
        &self.users
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch both account lists concurrently.
    pub async fn load(&mut self) {
        let (admins, users) = futures::join!(self.api.list_admins(), self.api.list_users());

        match admins {
            Ok(admins) => {
                tracing::debug!(count = admins.len(), "admins loaded");
                self.admins = admins;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "admin fetch failed");
                self.error = Some(ADMINS_FAILED.to_owned());
            }
        }

        match users {
            Ok(users) => {
                tracing::debug!(count = users.len(), "users loaded");
                self.users = users;
            }
            Err(e) => {
                tracing::warn!(error = %e, "user fetch failed");
                self.users.clear();
            }
        }
    }

    // =========================================================================
    // ADMINS
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] without sending anything, or the
    /// request failure.
    pub async fn create_admin(&mut self, account: &NewAccount) -> Result<AdminAccount, ClientError> {
        account.validate()?;
        let created = self.api.create_admin(account).await?;
        tracing::info!(id = %created.id, username = %created.username, "admin created");
        self.admins.push(created.clone());
        Ok(created)
    }

    /// Rename an admin and optionally change its password. An empty password
    /// means "keep the current one".
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] without sending anything, the
    /// request failure, or a session write failure when refreshing the
    /// signed-in profile.
    pub async fn update_admin(&mut self, id: &Id, mut update: AdminUpdate) -> Result<(), ClientError> {
        update.password = update.password.filter(|p| !p.is_empty());
        update.validate()?;
        let echo = self.api.update_admin(id, &update).await?;

        if let Some(admin) = self.admins.iter_mut().find(|a| &a.id == id) {
            admin.merge(echo.clone());
        }

        if let SessionState::Admin(mut current) = self.session.load()? {
            if &current.id == id {
                current.merge(echo);
                self.session.save(&SessionState::Admin(current))?;
                tracing::debug!(%id, "signed-in admin profile refreshed");
            }
        }
        tracing::info!(%id, "admin updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] without sending anything when `id`
    /// is the signed-in admin, or the request failure.
    pub async fn delete_admin(&mut self, id: &Id) -> Result<(), ClientError> {
        ensure_not_current_admin(id, &self.session.load()?)?;
        self.api.delete_admin(id).await?;
        self.admins.retain(|a| &a.id != id);
        tracing::info!(%id, "admin deleted");
        Ok(())
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] without sending anything, or the
    /// request failure.
    pub async fn create_user(&mut self, account: &NewAccount) -> Result<UserAccount, ClientError> {
        account.validate()?;
        let created = self.api.create_user(account).await?;
        tracing::info!(id = %created.id, username = %created.username, "user created");
        self.users.push(created.clone());
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] without sending anything, or the
    /// request failure.
    pub async fn update_user(&mut self, id: &Id, mut update: UserUpdate) -> Result<(), ClientError> {
        update.password = update.password.filter(|p| !p.is_empty());
        update.validate()?;
        let echo = self.api.update_user(id, &update).await?;
        if let Some(user) = self.users.iter_mut().find(|u| &u.id == id) {
            user.merge(echo);
        }
        tracing::info!(%id, "user updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the request failure; the list is unchanged in that case.
    pub async fn delete_user(&mut self, id: &Id) -> Result<(), ClientError> {
        self.api.delete_user(id).await?;
        self.users.retain(|u| &u.id != id);
        tracing::info!(%id, "user deleted");
        Ok(())
    }
}
