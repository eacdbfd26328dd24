//! Networked half of the feedback desk.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`api::ApiClient`] speaks the REST backend. The stateful flows sit on top
//! of it, one per view: [`auth::AuthService`] for login and registration,
//! [`templates::TemplateStore`] for form management,
//! [`dashboard::FeedbackDashboard`] for feedback review and bulk clear, and
//! [`accounts::AccountDirectory`] for admin and user management.
//! [`export::ReportExporter`] turns records into PDF files on disk.
//!
//! Session persistence goes through the [`session_store::SessionStore`]
//! trait and user-visible alerts through [`notify::Notifier`], so frontends
//! pick how state is kept and how messages are shown.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod notify;
pub mod session_store;
pub mod templates;

#[cfg(test)]
mod mock_backend;

pub use accounts::AccountDirectory;
pub use api::ApiClient;
pub use auth::AuthService;
pub use config::{ClientConfig, ConfigError};
pub use dashboard::{Confirmed, FeedbackDashboard, LoadState};
pub use error::{ClearError, ClientError};
pub use export::ReportExporter;
pub use notify::{Level, Notifier};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore, SessionStoreError};
pub use templates::TemplateStore;
