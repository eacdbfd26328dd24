//! Typed REST client for the feedback backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! One method per endpoint. Methods do not validate or cache anything; the
//! stores in this crate do that and call in here only once a request is
//! known to be well formed.
//!
//! ERROR HANDLING
//! ==============
//! Connection failures map to [`ClientError::Transport`], non-2xx statuses
//! to [`ClientError::Http`] with the body's `message`/`error` text, and bodies
//! of the wrong shape to [`ClientError::Decode`].

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use forms::{
    AdminAccount, AdminUpdate, Credentials, FeedbackRecord, FormTemplate, Id, NewAccount, RawFeedback,
    TemplatePayload, UpdatedAccount, UserAccount, UserUpdate,
};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ClientError, error_message};

#[derive(Debug, Deserialize)]
struct AdminLoginResponse {
    #[serde(default)]
    admin: Option<AdminAccount>,
}

#[derive(Debug, Deserialize)]
struct UserLoginResponse {
    #[serde(default)]
    user: Option<UserAccount>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ClientError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_url.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // FEEDBACK
    // =========================================================================

    /// `GET /api/feedback`, normalized into display records.
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, ClientError> {
        let raw: Vec<RawFeedback> = self.fetch(self.request(Method::GET, "/api/feedback")).await?;
        Ok(raw.into_iter().map(FeedbackRecord::from).collect())
    }

    /// `DELETE /api/feedback/{id}`
    ///
    /// # Errors
    ///
    /// Returns transport or HTTP failures.
    pub async fn delete_feedback(&self, id: &Id) -> Result<(), ClientError> {
        self.execute(self.request(Method::DELETE, &format!("/api/feedback/{id}"))).await.map(drop)
    }

    // =========================================================================
    // FORMS
    // =========================================================================

    /// `GET /api/forms`. Entries that do not decode as a template are
    /// skipped so one bad record does not hide the rest.
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures of the list itself.
    pub async fn list_forms(&self) -> Result<Vec<FormTemplate>, ClientError> {
        let entries: Vec<serde_json::Value> = self.fetch(self.request(Method::GET, "/api/forms")).await?;
        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(template) => Some(template),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping malformed form template");
                    None
                }
            })
            .collect())
    }

    /// `POST /api/forms`; the server assigns the id.
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn create_form(&self, payload: &TemplatePayload<'_>) -> Result<FormTemplate, ClientError> {
        self.fetch(self.request(Method::POST, "/api/forms").json(payload)).await
    }

    /// `PUT /api/forms/{id}`, replacing title, description and fields.
    ///
    /// # Errors
    ///
    /// Returns transport or HTTP failures.
    pub async fn update_form(&self, id: &Id, payload: &TemplatePayload<'_>) -> Result<(), ClientError> {
        self.execute(self.request(Method::PUT, &format!("/api/forms/{id}")).json(payload)).await.map(drop)
    }

    /// `DELETE /api/forms/{id}`
    ///
    /// # Errors
    ///
    /// Returns transport or HTTP failures.
    pub async fn delete_form(&self, id: &Id) -> Result<(), ClientError> {
        self.execute(self.request(Method::DELETE, &format!("/api/forms/{id}"))).await.map(drop)
    }

    // =========================================================================
    // ADMINS
    // =========================================================================

    /// `POST /api/admin/login`
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn admin_login(&self, credentials: &Credentials) -> Result<AdminAccount, ClientError> {
        let body: AdminLoginResponse =
            self.fetch(self.request(Method::POST, "/api/admin/login").json(credentials)).await?;
        Ok(body.admin.unwrap_or_default())
    }

    /// `GET /api/admin`
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn list_admins(&self) -> Result<Vec<AdminAccount>, ClientError> {
        self.fetch(self.request(Method::GET, "/api/admin")).await
    }

    /// `POST /api/admin`
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn create_admin(&self, account: &NewAccount) -> Result<AdminAccount, ClientError> {
        self.fetch(self.request(Method::POST, "/api/admin").json(account)).await
    }

    /// `PUT /api/admin/{id}`
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn update_admin(&self, id: &Id, update: &AdminUpdate) -> Result<UpdatedAccount, ClientError> {
        self.fetch_or_default(self.request(Method::PUT, &format!("/api/admin/{id}")).json(update)).await
    }

    /// `DELETE /api/admin/{id}`
    ///
    /// # Errors
    ///
    /// Returns transport or HTTP failures.
    pub async fn delete_admin(&self, id: &Id) -> Result<(), ClientError> {
        self.execute(self.request(Method::DELETE, &format!("/api/admin/{id}"))).await.map(drop)
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// `POST /api/user/login`
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn user_login(&self, credentials: &Credentials) -> Result<UserAccount, ClientError> {
        let body: UserLoginResponse =
            self.fetch(self.request(Method::POST, "/api/user/login").json(credentials)).await?;
        Ok(body.user.unwrap_or_default())
    }

    /// `POST /api/user/register`
    ///
    /// # Errors
    ///
    /// Returns transport or HTTP failures.
    pub async fn register(&self, account: &NewAccount) -> Result<(), ClientError> {
        self.execute(self.request(Method::POST, "/api/user/register").json(account)).await.map(drop)
    }

    /// `GET /api/user`
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn list_users(&self) -> Result<Vec<UserAccount>, ClientError> {
        self.fetch(self.request(Method::GET, "/api/user")).await
    }

    /// `POST /api/user`
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn create_user(&self, account: &NewAccount) -> Result<UserAccount, ClientError> {
        self.fetch(self.request(Method::POST, "/api/user").json(account)).await
    }

    /// `PUT /api/user/{id}`
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, or decode failures.
    pub async fn update_user(&self, id: &Id, update: &UserUpdate) -> Result<UpdatedAccount, ClientError> {
        self.fetch_or_default(self.request(Method::PUT, &format!("/api/user/{id}")).json(update)).await
    }

    /// `DELETE /api/user/{id}`
    ///
    /// # Errors
    ///
    /// Returns transport or HTTP failures.
    pub async fn delete_user(&self, id: &Id) -> Result<(), ClientError> {
        self.execute(self.request(Method::DELETE, &format!("/api/user/{id}"))).await.map(drop)
    }

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "api request");
        self.http.request(method, format!("{}{path}", self.base_url))
    }

    /// Send and return the raw body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ClientError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "api request failed to send");
            ClientError::Transport(e)
        })?;
        let status = response.status();
        let url = response.url().path().to_owned();
        let body = response.text().await.map_err(ClientError::Transport)?;
        if !status.is_success() {
            tracing::warn!(%status, path = %url, "api request rejected");
            return Err(ClientError::Http { status: status.as_u16(), message: error_message(&body) });
        }
        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Like [`Self::fetch`], but an empty or non-object 2xx body decodes as
    /// `T::default()`.
    async fn fetch_or_default<T: DeserializeOwned + Default>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let body = self.execute(request).await?;
        if body.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "undecodable response body, using default");
            T::default()
        }))
    }
}
