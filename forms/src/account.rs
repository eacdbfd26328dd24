//! Admin and user accounts plus the client-side rules applied before any
//! account request leaves the machine.

#[cfg(test)]
#[path = "account_test.rs"]
mod account_test;

use serde::{Deserialize, Serialize};

use crate::Id;
use crate::session::SessionState;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validation failures caught before a network call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Username must be at least 3 characters!")]
    UsernameTooShort,
    #[error("Password must be at least 6 characters!")]
    PasswordTooShort,
    #[error("Passwords do not match!")]
    PasswordMismatch,
    #[error("Username and password are required.")]
    MissingCredentials,
    #[error("You cannot delete the account you are signed in with.")]
    SelfDelete,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: Id,
    pub username: String,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Id,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of the two login endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingCredentials`] if either part is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(())
    }
}

/// Body of `POST /api/admin` and `POST /api/user`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl NewAccount {
    /// # Errors
    ///
    /// Returns the first failing username/password rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        validate_password(&self.password)
    }
}

/// Self-registration form, including the confirmation field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    /// Checks run in the order the registration form reports them.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        validate_password(&self.password)?;
        validate_username(&self.username)
    }

    /// Request body for `POST /api/user/register`, without the confirmation.
    #[must_use]
    pub fn to_new_account(&self) -> NewAccount {
        NewAccount {
            username: self.username.clone(),
            password: self.password.clone(),
            email: self.email.clone().filter(|email| !email.trim().is_empty()),
        }
    }
}

/// Body of `PUT /api/admin/{id}`. The password is only sent when changing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdminUpdate {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AdminUpdate {
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        validate_optional_password(self.password.as_deref())
    }
}

/// Body of `PUT /api/user/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserUpdate {
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        validate_optional_password(self.password.as_deref())
    }
}

/// Fields echoed back by the update endpoints; anything missing is unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UpdatedAccount {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl AdminAccount {
    pub fn merge(&mut self, echo: UpdatedAccount) {
        if let Some(username) = echo.username {
            self.username = username;
        }
    }
}

impl UserAccount {
    pub fn merge(&mut self, echo: UpdatedAccount) {
        if let Some(username) = echo.username {
            self.username = username;
        }
        if echo.email.is_some() {
            self.email = echo.email;
        }
    }
}

/// # Errors
///
/// Returns [`ValidationError::UsernameTooShort`].
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().chars().count() < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    Ok(())
}

/// # Errors
///
/// Returns [`ValidationError::PasswordTooShort`].
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

fn validate_optional_password(password: Option<&str>) -> Result<(), ValidationError> {
    match password {
        Some(password) if !password.is_empty() => validate_password(password),
        _ => Ok(()),
    }
}

/// Refuse to delete the admin record the session is signed in as.
///
/// # Errors
///
/// Returns [`ValidationError::SelfDelete`].
pub fn ensure_not_current_admin(target: &Id, session: &SessionState) -> Result<(), ValidationError> {
    match session {
        SessionState::Admin(admin) if &admin.id == target => Err(ValidationError::SelfDelete),
        _ => Ok(()),
    }
}
