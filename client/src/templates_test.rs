use forms::{FieldCommand, FieldPatch, FieldType, NewField, TemplateError};

use super::*;
use crate::mock_backend::MockBackend;
use crate::notify::RecordingNotifier;

fn store(backend: &MockBackend) -> (TemplateStore, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    (TemplateStore::new(backend.api(), notifier.clone()), notifier)
}

#[tokio::test]
async fn load_mirrors_the_server_list() {
    let backend = MockBackend::start().await;
    backend.seed_form("One");
    backend.seed_form("Two");
    let (mut store, notifier) = store(&backend);
    let titles: Vec<String> = store.load().await.iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn one_malformed_template_does_not_hide_the_others() {
    let backend = MockBackend::start().await;
    backend.seed_form("One");
    backend.with(|s| s.forms.push(serde_json::json!({ "fields": "broken" })));
    backend.seed_form("Two");
    let (mut store, notifier) = store(&backend);
    let titles: Vec<String> = store.load().await.iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
    assert!(notifier.errors().is_empty());
}

#[tokio::test]
async fn failed_load_alerts_and_empties_the_list() {
    let backend = MockBackend::start().await;
    backend.seed_form("One");
    let (mut store, notifier) = store(&backend);
    store.load().await;
    assert_eq!(store.templates().len(), 1);

    backend.fail("GET", "/api/forms", 500);
    assert!(store.load().await.is_empty());
    assert!(store.templates().is_empty());
    assert_eq!(notifier.errors(), vec![LOAD_FAILED.to_owned()]);
}

#[tokio::test]
async fn blank_title_never_reaches_the_network() {
    let backend = MockBackend::start().await;
    let (mut store, _) = store(&backend);
    let err = store.create(&TemplateDraft::new("   ", None)).await.unwrap_err();
    assert!(matches!(err, ClientError::Template(TemplateError::BlankTitle)));

    let id = Id::new(backend.seed_form("Kept"));
    let err = store.update(&id, &TemplateDraft::new("", None)).await.unwrap_err();
    assert_eq!(err.to_string(), "Please enter a form title.");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn create_appends_and_delete_removes() {
    let backend = MockBackend::start().await;
    let (mut store, _) = store(&backend);
    let created = store.create(&TemplateDraft::new("Survey", None)).await.unwrap();
    assert_eq!(store.templates(), std::slice::from_ref(&created));

    store.delete(&created.id).await.unwrap();
    assert!(store.templates().is_empty());
    assert!(backend.with(|s| s.forms.is_empty()));
}

#[tokio::test]
async fn failed_delete_keeps_the_template() {
    let backend = MockBackend::start().await;
    let id = backend.seed_form("Stays");
    let (mut store, _) = store(&backend);
    store.load().await;
    backend.fail("DELETE", &format!("/api/forms/{id}"), 500);
    assert!(store.delete(&Id::new(id)).await.is_err());
    assert_eq!(store.templates().len(), 1);
}

#[tokio::test]
async fn select_field_survives_create_edit_and_update() {
    let backend = MockBackend::start().await;
    let (mut store, _) = store(&backend);
    let created = store.create(&TemplateDraft::new("Survey", None)).await.unwrap();
    assert!(created.fields.is_empty());

    let mut draft = store.edit(&created.id).unwrap();
    draft.apply(FieldCommand::Add(NewField::new("Team", FieldType::Select).with_options(["A", "B"]))).unwrap();
    store.save(&mut draft).await.unwrap();

    store.load().await;
    let stored = store.get(&created.id).unwrap();
    assert_eq!(stored.fields.len(), 1);
    assert_eq!(stored.fields[0].field_type, FieldType::Select);
    assert_eq!(stored.fields[0].name, "Team");
    assert_eq!(stored.fields[0].options, vec!["A", "B"]);
}

#[tokio::test]
async fn draft_edits_stay_local_until_saved() {
    let backend = MockBackend::start().await;
    let id = Id::new(backend.seed_form("Survey"));
    let (mut store, _) = store(&backend);
    store.load().await;
    let before = backend.requests().len();

    let mut draft = store.edit(&id).unwrap();
    let field = draft.apply(FieldCommand::Add(NewField::new("Age", FieldType::Number))).unwrap();
    draft
        .apply(FieldCommand::Update { id: field.clone(), patch: FieldPatch { required: Some(true), ..FieldPatch::default() } })
        .unwrap();

    assert_eq!(backend.requests().len(), before);
    assert!(store.get(&id).unwrap().fields.is_empty());

    store.save(&mut draft).await.unwrap();
    let saved = store.get(&id).unwrap();
    assert_eq!(saved.fields.len(), 1);
    assert!(saved.fields[0].required);
}

#[tokio::test]
async fn saving_a_new_draft_assigns_its_id() {
    let backend = MockBackend::start().await;
    let (mut store, _) = store(&backend);
    let mut draft = TemplateDraft::new("Fresh", Some("with fields".to_owned()));
    draft.add_field(NewField::new("Name", FieldType::Text).required(true)).unwrap();

    let created = store.save(&mut draft).await.unwrap();
    assert_eq!(draft.id.as_ref(), Some(&created.id));
    assert_eq!(created.fields.len(), 1);
    assert_eq!(backend.count("POST /api/forms"), 1);
}
