//! Login, logout, and self-registration.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthService` is the single writer of the session store apart from the
//! admin profile refresh in [`crate::accounts`]. Every flow returns the
//! [`View`] the operator should land on next; the CLI turns that into a
//! message, a UI would turn it into navigation.
//!
//! ERROR HANDLING
//! ==============
//! A failed login or registration leaves the stored session exactly as it
//! was. HTTP rejections without a server message fall back to a fixed text
//! per flow so the error always displays something meaningful.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;
use std::time::Duration;

use forms::session::guard;
use forms::{Access, Credentials, Registration, Role, SessionState, View};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::session_store::SessionStore;

pub const LOGIN_FAILED: &str = "Invalid username or password!";
pub const REGISTER_FAILED: &str = "Registration failed!";
pub const REGISTERED: &str = "Registration successful! Redirecting to login...";

/// Pause between a successful registration and the redirect to login.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

pub struct AuthService {
    api: ApiClient,
    store: Arc<dyn SessionStore>,
    redirect_delay: Duration,
}

impl AuthService {
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self { api, store, redirect_delay: REDIRECT_DELAY }
    }

    #[must_use]
    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the stored session cannot be read.
    pub fn session(&self) -> Result<SessionState, ClientError> {
        Ok(self.store.load()?)
    }

    /// Check the stored session against `view`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the stored session cannot be read.
    pub fn guard(&self, view: View) -> Result<Access, ClientError> {
        let access = guard(view, &self.session()?);
        if let Access::Redirect(to) = access {
            tracing::debug!(%view, %to, "view guarded");
        }
        Ok(access)
    }

    /// Sign in as `role` and persist the new session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for empty credentials, the request
    /// failure (HTTP rejections carry the server text or [`LOGIN_FAILED`]),
    /// or a session write failure.
    pub async fn login(&self, role: Role, credentials: &Credentials) -> Result<View, ClientError> {
        credentials.validate()?;
        let state = match role {
            Role::Admin => self.api.admin_login(credentials).await.map(SessionState::Admin),
            Role::User => self.api.user_login(credentials).await.map(SessionState::User),
        }
        .map_err(|e| with_fallback(e, LOGIN_FAILED))?;

        self.store.clear()?;
        self.store.save(&state)?;
        tracing::info!(role = role.as_str(), username = ?state.username(), "signed in");
        Ok(View::landing(role))
    }

    /// Forget every stored session key.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the stored session cannot be removed.
    pub fn logout(&self) -> Result<View, ClientError> {
        self.store.clear()?;
        tracing::info!("signed out");
        Ok(View::Login)
    }

    /// Create a user account, then wait out the redirect delay.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] without sending anything, or the
    /// request failure (HTTP rejections carry the server text or
    /// [`REGISTER_FAILED`]).
    pub async fn register(&self, registration: &Registration) -> Result<View, ClientError> {
        registration.validate()?;
        self.api.register(&registration.to_new_account()).await.map_err(|e| with_fallback(e, REGISTER_FAILED))?;
        tracing::info!(username = %registration.username, "registered");
        tokio::time::sleep(self.redirect_delay).await;
        Ok(View::Login)
    }
}

/// Give an HTTP failure without server text a flow-specific message.
fn with_fallback(error: ClientError, fallback: &str) -> ClientError {
    match error {
        ClientError::Http { status, message: None } => {
            ClientError::Http { status, message: Some(fallback.to_owned()) }
        }
        other => other,
    }
}
