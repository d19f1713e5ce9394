use super::*;
use crate::discussion::test_helpers::{group, message};

// =============================================================================
// Feed scopes
// =============================================================================

#[test]
fn new_store_has_no_selection() {
    let store = DiscussionStore::new();
    assert!(store.feed_scope().is_none());
    assert_eq!(store.snapshot(), DiscussionState::default());
}

#[test]
fn activate_clears_previous_feed() {
    let store = DiscussionStore::new();
    let first = store.activate(group(1, "A"));
    assert!(store.apply_feed(&first, vec![message(1, 1, "ravi", "hi")], true));

    store.activate(group(2, "B"));
    let snap = store.snapshot();
    assert!(snap.messages.is_empty());
    assert!(!snap.scroll_pending);
    assert_eq!(snap.active.map(|g| g.id), Some(RecordId::Int(2)));
}

#[test]
fn stale_scope_is_rejected_after_reselect() {
    let store = DiscussionStore::new();
    let old = store.activate(group(1, "A"));
    let new = store.activate(group(2, "B"));

    assert!(!store.apply_feed(&old, vec![message(1, 1, "ravi", "from A")], false));
    assert!(store.snapshot().messages.is_empty());
    assert!(store.apply_feed(&new, vec![message(2, 2, "sibi", "from B")], false));
    assert_eq!(store.snapshot().messages[0].content, "from B");
}

#[test]
fn reselecting_same_group_still_invalidates_old_scope() {
    let store = DiscussionStore::new();
    let old = store.activate(group(1, "A"));
    let new = store.activate(group(1, "A"));
    assert_eq!(old.group_id(), new.group_id());
    assert!(new.generation() > old.generation());
    assert!(!store.is_current_feed(&old));
    assert!(store.is_current_feed(&new));
}

#[test]
fn deactivate_rejects_in_flight_feed() {
    let store = DiscussionStore::new();
    let scope = store.activate(group(1, "A"));
    store.deactivate();
    assert!(!store.apply_feed(&scope, vec![message(1, 1, "ravi", "late")], true));
    assert!(!store.set_feed_loading(&scope, true));
    let snap = store.snapshot();
    assert!(snap.active.is_none());
    assert!(snap.messages.is_empty());
    assert!(!snap.scroll_pending);
}

#[test]
fn scroll_request_is_consumed_once() {
    let store = DiscussionStore::new();
    let scope = store.activate(group(1, "A"));
    store.apply_feed(&scope, vec![], true);
    assert!(store.take_scroll_request());
    assert!(!store.take_scroll_request());

    store.apply_feed(&scope, vec![], false);
    assert!(!store.take_scroll_request());
}

// =============================================================================
// List scopes
// =============================================================================

#[test]
fn groups_apply_only_while_run_is_current() {
    let store = DiscussionStore::new();
    let scope = store.begin_group_list();
    assert!(store.apply_groups(scope, vec![group(1, "A")]));

    store.end_group_list(scope);
    assert!(!store.apply_groups(scope, vec![group(9, "late")]));
    assert_eq!(store.snapshot().groups, vec![group(1, "A")]);
    assert!(store.list_scope().is_none());
}

#[test]
fn new_list_run_invalidates_previous_run() {
    let store = DiscussionStore::new();
    let first = store.begin_group_list();
    let second = store.begin_group_list();
    assert!(!store.apply_groups(first, vec![group(1, "A")]));
    assert!(store.apply_groups(second, vec![group(2, "B")]));
    assert_eq!(store.list_scope(), Some(second));
}

#[test]
fn ending_a_stale_run_leaves_current_run_alone() {
    let store = DiscussionStore::new();
    let first = store.begin_group_list();
    let second = store.begin_group_list();
    store.end_group_list(first);
    assert_eq!(store.list_scope(), Some(second));
}

#[test]
fn prepend_moves_duplicate_to_head() {
    let store = DiscussionStore::new();
    let scope = store.begin_group_list();
    store.apply_groups(scope, vec![group(1, "A"), group(2, "B")]);
    store.set_group_draft(NewGroup { name: "B".into(), description: String::new() });

    store.prepend_group(group(2, "B"));
    let snap = store.snapshot();
    let ids: Vec<_> = snap.groups.iter().map(|g| g.id.clone()).collect();
    assert_eq!(ids, vec![RecordId::Int(2), RecordId::Int(1)]);
    assert!(snap.group_draft.is_none());
}

// =============================================================================
// Revisions, drafts, notices
// =============================================================================

#[test]
fn mutations_bump_revision_and_noops_do_not() {
    let store = DiscussionStore::new();
    let start = store.revision();
    store.set_draft("hello");
    assert_eq!(store.revision(), start + 1);
    store.set_draft("hello");
    assert_eq!(store.revision(), start + 1);
    assert!(!store.take_scroll_request());
    assert_eq!(store.revision(), start + 1);
}

#[test]
fn stale_apply_does_not_bump_revision() {
    let store = DiscussionStore::new();
    let old = store.activate(group(1, "A"));
    store.activate(group(2, "B"));
    let before = store.revision();
    store.apply_feed(&old, vec![message(1, 1, "ravi", "late")], true);
    assert_eq!(store.revision(), before);
}

#[tokio::test]
async fn subscribers_observe_changes() {
    let store = DiscussionStore::new();
    let mut rx = store.subscribe();
    store.push_notice(Notice::alert("create failed"));
    rx.changed().await.unwrap();
    let notices = store.take_notices();
    assert_eq!(notices, vec![Notice::alert("create failed")]);
    assert!(store.take_notices().is_empty());
}
