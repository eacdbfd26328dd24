use forms::{FieldDefinition, FieldType, TemplateDraft};
use serde_json::json;

use super::*;
use crate::mock_backend::{MockBackend, unreachable_url};

fn creds(username: &str, password: &str) -> Credentials {
    Credentials { username: username.to_owned(), password: password.to_owned() }
}

// =============================================================================
// Feedback
// =============================================================================

#[tokio::test]
async fn list_feedback_normalizes_records() {
    let backend = MockBackend::start().await;
    backend.seed_feedback(1, json!({ "formType": "Event", "name": "Ann", "rating": "4" }));
    backend.seed_feedback(2, json!({}));

    let records = backend.api().list_feedback().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].form_type, "Event");
    assert_eq!(records[0].rating, 4);
    assert_eq!(records[1].form_type, "General Feedback");
    assert_eq!(records[1].name, "Anonymous");
    assert_eq!(records[1].id.as_str(), "2");
}

#[tokio::test]
async fn delete_feedback_hits_the_id_path() {
    let backend = MockBackend::start().await;
    backend.seed_feedback(7, json!({}));
    backend.api().delete_feedback(&Id::from("7")).await.unwrap();
    assert_eq!(backend.count("DELETE /api/feedback/7"), 1);
    assert!(backend.with(|s| s.feedback.is_empty()));
}

// =============================================================================
// Forms
// =============================================================================

#[tokio::test]
async fn create_form_returns_server_assigned_id() {
    let backend = MockBackend::start().await;
    let draft = TemplateDraft::new("Survey", None);
    let created = backend.api().create_form(&draft.payload()).await.unwrap();
    assert!(!created.id.as_str().is_empty());
    assert_eq!(created.title, "Survey");
    assert!(created.fields.is_empty());
}

#[tokio::test]
async fn list_forms_skips_entries_that_do_not_decode() {
    let backend = MockBackend::start().await;
    backend.seed_form("Good");
    backend.with(|s| {
        s.forms.push(json!({ "title": "No id", "fields": [] }));
        s.forms.push(json!({ "id": "9", "fields": [{ "id": "5", "type": "text" }] }));
    });
    backend.seed_form("Also good");

    let forms = backend.api().list_forms().await.unwrap();
    let titles: Vec<&str> = forms.iter().map(|f| f.title.as_str()).collect();
    assert_eq!(titles, vec!["Good", "", "Also good"]);
    assert!(forms[1].fields[0].name.is_empty());
}

#[tokio::test]
async fn update_form_sends_full_payload() {
    let backend = MockBackend::start().await;
    let id = Id::new(backend.seed_form("Old"));
    let mut draft = TemplateDraft::new("New", Some("desc".to_owned()));
    draft.fields.push(FieldDefinition {
        id: Id::from("1"),
        name: "Team".to_owned(),
        field_type: FieldType::Select,
        options: vec!["A".to_owned(), "B".to_owned()],
        required: false,
        extra: serde_json::Map::new(),
    });
    backend.api().update_form(&id, &draft.payload()).await.unwrap();

    let stored = backend.with(|s| s.forms[0].clone());
    assert_eq!(stored["title"], "New");
    assert_eq!(stored["description"], "desc");
    assert_eq!(stored["fields"][0]["type"], "select");
    assert_eq!(stored["fields"][0]["options"], json!(["A", "B"]));
}

#[tokio::test]
async fn deleting_unknown_form_surfaces_error_text() {
    let backend = MockBackend::start().await;
    let err = backend.api().delete_form(&Id::from("404")).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Not found");
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn admin_login_unwraps_admin_object() {
    let backend = MockBackend::start().await;
    let id = backend.seed_admin("root", "secret1");
    let admin = backend.api().admin_login(&creds("root", "secret1")).await.unwrap();
    assert_eq!(admin.id.as_str(), id);
    assert_eq!(admin.username, "root");
}

#[tokio::test]
async fn user_login_rejection_carries_server_message() {
    let backend = MockBackend::start().await;
    backend.seed_user("bob", "secret1");
    let err = backend.api().user_login(&creds("bob", "wrong!")).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.server_message(), Some("Invalid credentials"));
}

#[tokio::test]
async fn update_admin_returns_echoed_username() {
    let backend = MockBackend::start().await;
    let id = Id::new(backend.seed_admin("root", "secret1"));
    let echo = backend
        .api()
        .update_admin(&id, &AdminUpdate { username: "boss".to_owned(), password: None })
        .await
        .unwrap();
    assert_eq!(echo.username.as_deref(), Some("boss"));
}

#[tokio::test]
async fn undecodable_update_echo_falls_back_to_empty() {
    let backend = MockBackend::start().await;
    let id = backend.seed_admin("root", "secret1");
    backend.fail_with("PUT", &format!("/api/admin/{id}"), 200, json!("updated"));
    let echo = backend
        .api()
        .update_admin(&Id::new(id), &AdminUpdate { username: "boss".to_owned(), password: None })
        .await
        .unwrap();
    assert_eq!(echo.username, None);
    assert_eq!(echo.email, None);
}

#[tokio::test]
async fn register_then_list_users() {
    let backend = MockBackend::start().await;
    let api = backend.api();
    let account = NewAccount { username: "carol".to_owned(), password: "secret1".to_owned(), email: None };
    api.register(&account).await.unwrap();
    let users = api.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "carol");
}

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let api = ApiClient::new(&ClientConfig::for_base_url(&unreachable_url().await)).unwrap();
    let err = api.list_forms().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(err.to_string(), "Failed to connect to server. Please try again.");
}

#[tokio::test]
async fn error_field_is_used_when_message_is_absent() {
    let backend = MockBackend::start().await;
    backend.fail_with("GET", "/api/admin", 500, json!({ "error": "database down" }));
    let err = backend.api().list_admins().await.unwrap_err();
    assert_eq!(err.server_message(), Some("database down"));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let backend = MockBackend::start().await;
    backend.fail_with("GET", "/api/forms", 200, json!({ "not": "a list" }));
    let err = backend.api().list_forms().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}
