use super::*;

#[test]
fn truncate_keeps_short_text() {
    assert_eq!(truncate_chars("short", 50), "short");
    assert_eq!(truncate_chars(&"x".repeat(50), 50), "x".repeat(50));
}

#[test]
fn truncate_cuts_on_characters_and_appends_ellipsis() {
    let long = "é".repeat(51);
    let cut = truncate_chars(&long, 50);
    assert_eq!(cut, format!("{}...", "é".repeat(50)));
}

#[test]
fn single_filename_collapses_whitespace_runs() {
    assert_eq!(single_filename("Jane   Q  Doe", 1_700_000_000_000), "feedback_Jane_Q_Doe_1700000000000.pdf");
}

#[test]
fn batch_filename_uses_form_type() {
    assert_eq!(batch_filename("Event Survey", 42), "Event_Survey_all_feedbacks_42.pdf");
}

#[test]
fn filenames_never_contain_path_separators() {
    let name = single_filename("../../etc/passwd", 1);
    assert!(!name.contains('/'));
    assert_eq!(name, "feedback_..-..-etc-passwd_1.pdf");
}

#[test]
fn empty_component_gets_placeholder() {
    assert_eq!(batch_filename("", 7), "untitled_all_feedbacks_7.pdf");
}

#[test]
fn export_error_messages_name_the_path() {
    let err = ExportError::Io {
        path: PathBuf::from("/tmp/x.pdf"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    assert_eq!(err.to_string(), "failed to write report /tmp/x.pdf: denied");
}
