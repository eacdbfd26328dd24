//! Session state and view access policy.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected command asks [`guard`] before fetching anything. The guard
//! never fails: a visitor without the right role is redirected to
//! [`View::Login`].
//!
//! DESIGN
//! ======
//! The state is an explicit enum. Its persisted form ([`PersistedSession`])
//! keeps the historical layout of two booleans and two cached profile blobs,
//! and the two convert into each other losslessly for every reachable state.
//! Admin-only views check the admin flag alone; the authenticated flag never
//! grants them.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::account::{AdminAccount, UserAccount};

/// Which login endpoint a sign-in goes through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Who is signed in on this machine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    User(UserAccount),
    /// The profile may be empty when the cached blob was lost but the admin
    /// flag survived; the flag alone still grants admin views.
    Admin(AdminAccount),
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(&user.username),
            Self::Admin(admin) => Some(&admin.username),
        }
    }

    #[must_use]
    pub fn admin(&self) -> Option<&AdminAccount> {
        match self {
            Self::Admin(admin) => Some(admin),
            _ => None,
        }
    }
}

/// Navigable views of the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    /// Public submission form.
    FeedbackForm,
    Login,
    Register,
    /// Submission view for signed-in users.
    Feedback,
    AdminFeedback,
    AdminManagement,
}

/// Minimum session a view requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    Admin,
}

impl View {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::FeedbackForm => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Feedback => "/feedback",
            Self::AdminFeedback => "/admin-feedback",
            Self::AdminManagement => "/admin-management",
        }
    }

    #[must_use]
    pub fn requirement(self) -> Requirement {
        match self {
            Self::FeedbackForm | Self::Login | Self::Register => Requirement::Public,
            Self::Feedback => Requirement::Authenticated,
            Self::AdminFeedback | Self::AdminManagement => Requirement::Admin,
        }
    }

    /// Where a successful login of `role` lands.
    #[must_use]
    pub fn landing(role: Role) -> Self {
        match role {
            Role::User => Self::Feedback,
            Role::Admin => Self::AdminFeedback,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of a guard check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(View),
}

/// Decide whether `state` may enter `view`.
#[must_use]
pub fn guard(view: View, state: &SessionState) -> Access {
    let allowed = match view.requirement() {
        Requirement::Public => true,
        Requirement::Authenticated => state.is_authenticated(),
        Requirement::Admin => state.is_admin(),
    };
    if allowed { Access::Granted } else { Access::Redirect(View::Login) }
}

/// On-disk layout of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<AdminAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user: Option<UserAccount>,
}

impl From<&SessionState> for PersistedSession {
    fn from(state: &SessionState) -> Self {
        match state {
            SessionState::Anonymous => Self::default(),
            SessionState::User(user) => Self {
                is_authenticated: true,
                current_user: Some(user.clone()),
                ..Self::default()
            },
            SessionState::Admin(admin) => Self {
                is_authenticated: true,
                is_admin: true,
                admin_user: Some(admin.clone()),
                ..Self::default()
            },
        }
    }
}

impl From<PersistedSession> for SessionState {
    fn from(stored: PersistedSession) -> Self {
        if stored.is_admin {
            return Self::Admin(stored.admin_user.unwrap_or_default());
        }
        if stored.is_authenticated {
            return Self::User(stored.current_user.unwrap_or_default());
        }
        Self::Anonymous
    }
}
