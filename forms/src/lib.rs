//! Domain model for the feedback desk.
//!
//! This crate owns everything that does not need a network connection:
//! feedback records and their normalization, form templates with their
//! field editor, per-form analytics, the session/view access policy, account
//! validation rules, and report layout down to PDF bytes. The `client` crate
//! layers REST calls and persistence on top of it.


pub mod account;
pub mod analytics;
pub mod record;
pub mod report;
pub mod session;
pub mod template;
pub mod timestamp;

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use account::{
    AdminAccount, AdminUpdate, Credentials, NewAccount, Registration, UpdatedAccount, UserAccount, UserUpdate,
    ValidationError,
};
pub use analytics::{FormAnalytics, RatingCount, Summary, analyze, group_by_form_type, summarize};
pub use record::{FeedbackRecord, RawFeedback};
pub use report::ExportError;
pub use session::{Access, PersistedSession, Role, SessionState, View};
pub use template::{
    FieldCommand, FieldDefinition, FieldPatch, FieldType, FormTemplate, NewField, TemplateDraft, TemplateError,
    TemplatePayload,
};

/// Server-assigned identifier.
///
/// The backend hands out either strings or integers depending on the
/// collection; both are kept as their decimal/string form so ids can be used
/// in URL paths and compared without caring about the original JSON type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id, when it is a plain decimal integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(D::Error::custom(format!("expected string or integer id, got {other}"))),
        }
    }
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
#[must_use]
pub fn now_ms() -> u64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
