use super::*;

#[test]
fn status_400_is_validation() {
    let err = status_error(400, r#"{"name":["This field may not be blank."]}"#.into());
    assert!(matches!(err, SyncError::Validation(ref body) if body.contains("blank")));
    assert_eq!(err.error_code(), "E_VALIDATION");
    assert!(!err.is_transient());
}

#[test]
fn status_404_is_not_found() {
    let err = status_error(404, "missing".into());
    assert!(matches!(err, SyncError::NotFound(_)));
}

#[test]
fn other_statuses_are_rejections() {
    let err = status_error(403, "forbidden".into());
    assert!(matches!(err, SyncError::Rejected { status: 403, .. }));
    assert!(!err.is_transient());
}

#[test]
fn server_errors_and_network_are_transient() {
    assert!(status_error(503, String::new()).is_transient());
    assert!(status_error(429, String::new()).is_transient());
    assert!(SyncError::Network("connection reset".into()).is_transient());
    assert!(!SyncError::Decode("eof".into()).is_transient());
}

#[test]
fn unknown_group_mentions_id() {
    let err = SyncError::UnknownGroup(RecordId::from(42));
    assert_eq!(err.to_string(), "unknown group 42");
}
