//! In-process stand-in for the REST backend, used by the async tests.
//!
//! Every request is logged as `"METHOD /path"`. Individual routes can be made
//! to fail with a chosen status and body through [`MockBackend::fail`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::api::ApiClient;
use crate::config::ClientConfig;

type Shared = Arc<Mutex<BackendState>>;

#[derive(Debug, Default)]
pub struct BackendState {
    pub feedback: Vec<Value>,
    pub forms: Vec<Value>,
    /// `(account, password)`
    pub admins: Vec<(Value, String)>,
    pub users: Vec<(Value, String)>,
    next_id: u64,
    failures: HashMap<String, (u16, Value)>,
    log: Vec<String>,
}

impl BackendState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState { next_id: 100, ..BackendState::default() }));
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state, handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_base_url(&self.url())
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.config()).unwrap()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Make `METHOD path` answer `status` with a `{"message": ...}` body.
    pub fn fail(&self, method: &str, path: &str, status: u16) {
        self.fail_with(method, path, status, json!({ "message": "injected failure" }));
    }

    pub fn fail_with(&self, method: &str, path: &str, status: u16, body: Value) {
        self.with(|s| s.failures.insert(format!("{method} {path}"), (status, body)));
    }

    pub fn heal(&self) {
        self.with(|s| s.failures.clear());
    }

    pub fn requests(&self) -> Vec<String> {
        self.with(|s| s.log.clone())
    }

    pub fn count(&self, request: &str) -> usize {
        self.requests().iter().filter(|r| *r == request).count()
    }

    pub fn seed_feedback(&self, id: u64, answers: Value) {
        self.with(|s| {
            s.feedback.push(json!({ "id": id, "answers": answers, "createdAt": "2024-05-01T12:00:00Z" }));
        });
    }

    pub fn seed_admin(&self, username: &str, password: &str) -> String {
        self.with(|s| {
            let id = s.next_id().to_string();
            s.admins.push((json!({ "id": id, "username": username }), password.to_owned()));
            id
        })
    }

    pub fn seed_user(&self, username: &str, password: &str) -> String {
        self.with(|s| {
            let id = s.next_id().to_string();
            s.users.push((json!({ "id": id, "username": username, "email": null }), password.to_owned()));
            id
        })
    }

    pub fn seed_form(&self, title: &str) -> String {
        self.with(|s| {
            let id = s.next_id().to_string();
            s.forms.push(json!({ "id": id, "title": title, "description": "", "fields": [] }));
            id
        })
    }
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/feedback", get(list_feedback))
        .route("/api/feedback/{id}", axum::routing::delete(delete_feedback))
        .route("/api/forms", get(list_forms).post(create_form))
        .route("/api/forms/{id}", put(update_form).delete(delete_form))
        .route("/api/admin", get(list_admins).post(create_admin))
        .route("/api/admin/login", post(admin_login))
        .route("/api/admin/{id}", put(update_admin).delete(delete_admin))
        .route("/api/user", get(list_users).post(create_user))
        .route("/api/user/login", post(user_login))
        .route("/api/user/register", post(register))
        .route("/api/user/{id}", put(update_user).delete(delete_user))
        .layer(middleware::from_fn_with_state(state.clone(), record_and_inject))
        .with_state(state)
}

async fn record_and_inject(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let key = format!("{} {}", request.method(), request.uri().path());
    let injected = {
        let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
        guard.log.push(key.clone());
        guard.failures.get(&key).cloned()
    };
    if let Some((status, body)) = injected {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(body)).into_response();
    }
    next.run(request).await
}

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

fn id_matches(value: &Value, id: &str) -> bool {
    match &value["id"] {
        Value::String(s) => s == id,
        Value::Number(n) => n.to_string() == id,
        _ => false,
    }
}

// --- Feedback ---

async fn list_feedback(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).feedback.clone()))
}

async fn delete_feedback(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut guard = lock(&state);
    let before = guard.feedback.len();
    guard.feedback.retain(|f| !id_matches(f, &id));
    if guard.feedback.len() == before {
        return not_found();
    }
    Json(json!({ "message": "Feedback deleted" })).into_response()
}

// --- Forms ---

async fn list_forms(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).forms.clone()))
}

async fn create_form(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut guard = lock(&state);
    body["id"] = json!(guard.next_id().to_string());
    guard.forms.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_form(State(state): State<Shared>, Path(id): Path<String>, Json(mut body): Json<Value>) -> Response {
    let mut guard = lock(&state);
    let Some(form) = guard.forms.iter_mut().find(|f| id_matches(f, &id)) else {
        return not_found();
    };
    body["id"] = json!(id);
    *form = body.clone();
    Json(body).into_response()
}

async fn delete_form(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut guard = lock(&state);
    let before = guard.forms.len();
    guard.forms.retain(|f| !id_matches(f, &id));
    if guard.forms.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

// --- Accounts ---

fn login(accounts: &[(Value, String)], body: &Value) -> Option<Value> {
    accounts
        .iter()
        .find(|(account, password)| account["username"] == body["username"] && *password == body["password"])
        .map(|(account, _)| account.clone())
}

fn invalid_credentials() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" }))).into_response()
}

fn username_taken(accounts: &[(Value, String)], body: &Value) -> bool {
    accounts.iter().any(|(account, _)| account["username"] == body["username"])
}

fn taken() -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": "Username already exists" }))).into_response()
}

async fn admin_login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    match login(&lock(&state).admins, &body) {
        Some(admin) => Json(json!({ "message": "Login successful", "admin": admin })).into_response(),
        None => invalid_credentials(),
    }
}

async fn list_admins(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).admins.iter().map(|(a, _)| a.clone()).collect()))
}

async fn create_admin(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut guard = lock(&state);
    if username_taken(&guard.admins, &body) {
        return taken();
    }
    let id = guard.next_id().to_string();
    let account = json!({ "id": id, "username": body["username"], "createdAt": "2024-05-01T12:00:00Z" });
    let password = body["password"].as_str().unwrap_or_default().to_owned();
    guard.admins.push((account.clone(), password));
    (StatusCode::CREATED, Json(account)).into_response()
}

async fn update_admin(State(state): State<Shared>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    let mut guard = lock(&state);
    let Some((account, password)) = guard.admins.iter_mut().find(|(a, _)| id_matches(a, &id)) else {
        return not_found();
    };
    account["username"] = body["username"].clone();
    if let Some(new_password) = body["password"].as_str() {
        *password = new_password.to_owned();
    }
    Json(json!({ "id": id, "username": account["username"] })).into_response()
}

async fn delete_admin(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut guard = lock(&state);
    let before = guard.admins.len();
    guard.admins.retain(|(a, _)| !id_matches(a, &id));
    if guard.admins.len() == before {
        return not_found();
    }
    Json(json!({ "message": "Admin deleted" })).into_response()
}

async fn user_login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    match login(&lock(&state).users, &body) {
        Some(user) => Json(json!({ "message": "Login successful", "user": user })).into_response(),
        None => invalid_credentials(),
    }
}

fn insert_user(guard: &mut BackendState, body: &Value) -> Value {
    let id = guard.next_id().to_string();
    let account = json!({ "id": id, "username": body["username"], "email": body.get("email").cloned().unwrap_or(Value::Null) });
    let password = body["password"].as_str().unwrap_or_default().to_owned();
    guard.users.push((account.clone(), password));
    account
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut guard = lock(&state);
    if username_taken(&guard.users, &body) {
        return taken();
    }
    insert_user(&mut guard, &body);
    (StatusCode::CREATED, Json(json!({ "message": "User registered successfully" }))).into_response()
}

async fn list_users(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).users.iter().map(|(u, _)| u.clone()).collect()))
}

async fn create_user(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut guard = lock(&state);
    if username_taken(&guard.users, &body) {
        return taken();
    }
    let account = insert_user(&mut guard, &body);
    (StatusCode::CREATED, Json(account)).into_response()
}

async fn update_user(State(state): State<Shared>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    let mut guard = lock(&state);
    let Some((account, password)) = guard.users.iter_mut().find(|(u, _)| id_matches(u, &id)) else {
        return not_found();
    };
    account["username"] = body["username"].clone();
    if let Some(email) = body.get("email") {
        account["email"] = email.clone();
    }
    if let Some(new_password) = body["password"].as_str() {
        *password = new_password.to_owned();
    }
    Json(json!({ "id": id, "username": account["username"], "email": account["email"] })).into_response()
}

async fn delete_user(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut guard = lock(&state);
    let before = guard.users.len();
    guard.users.retain(|(u, _)| !id_matches(u, &id));
    if guard.users.len() == before {
        return not_found();
    }
    Json(json!({ "message": "User deleted" })).into_response()
}
