//! Shared discussion state read by the UI and written by pollers/coordinators.
//!
//! DESIGN
//! ======
//! All mutations are whole-container replacements made under a short
//! `std::sync::Mutex` that is never held across an `.await`. Readers take
//! cloned snapshots. Every mutation bumps a `watch` revision so a UI can
//! await changes instead of polling the store.
//!
//! SCOPES
//! ======
//! Fetches are tagged with the scope they were issued for: a [`FeedScope`]
//! (group id + selection generation) or a [`ListScope`] (list generation).
//! `apply_*` compares the tag against the current scope under the lock and
//! drops stale responses. Bumping a generation is therefore the synchronous
//! "stop" for everything that poller still has in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::api::{CurrentUser, Group, Message, NewGroup, RecordId};

// =============================================================================
// SCOPES
// =============================================================================

/// The active selection a feed request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedScope {
    group_id: RecordId,
    generation: u64,
}

impl FeedScope {
    #[must_use]
    pub fn group_id(&self) -> &RecordId {
        &self.group_id
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The group-list poller run a list request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListScope {
    generation: u64,
}

impl ListScope {
    #[must_use]
    pub fn generation(self) -> u64 {
        self.generation
    }
}

// =============================================================================
// NOTICES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Alert,
}

/// A user-facing notification queued for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }

    #[must_use]
    pub fn alert(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Alert, text: text.into() }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Everything the UI renders. Cloned out by [`DiscussionStore::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscussionState {
    /// Groups visible to the user, newest-created first after a local create.
    pub groups: Vec<Group>,
    /// True only while the first (non-silent) list fetch is outstanding.
    pub groups_loading: bool,
    /// Currently selected group, `None` drives the empty-state view.
    pub active: Option<Group>,
    /// Feed of the active group, ordered by server timestamp.
    pub messages: Vec<Message>,
    /// True only while the initial (non-silent) feed fetch is outstanding.
    pub feed_loading: bool,
    /// Compose box contents.
    pub draft: String,
    /// Create-group form values kept after a failed create.
    pub group_draft: Option<NewGroup>,
    pub notices: Vec<Notice>,
    pub current_user: Option<CurrentUser>,
    /// Set when the feed view should jump to the newest message.
    pub scroll_pending: bool,
}

struct Inner {
    state: DiscussionState,
    feed_generation: u64,
    list_generation: u64,
    list_running: bool,
}

impl Inner {
    fn feed_scope(&self) -> Option<FeedScope> {
        self.state
            .active
            .as_ref()
            .map(|group| FeedScope { group_id: group.id.clone(), generation: self.feed_generation })
    }

    fn is_current_feed(&self, scope: &FeedScope) -> bool {
        scope.generation == self.feed_generation
            && self.state.active.as_ref().is_some_and(|group| group.id == scope.group_id)
    }

    fn is_current_list(&self, scope: ListScope) -> bool {
        self.list_running && scope.generation == self.list_generation
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Clone)]
pub struct DiscussionStore {
    inner: Arc<Mutex<Inner>>,
    revision: Arc<watch::Sender<u64>>,
}

impl DiscussionStore {
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: DiscussionState::default(),
                feed_generation: 0,
                list_generation: 0,
                list_running: false,
            })),
            revision: Arc::new(revision),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the lock and publish a new revision if it reports a change.
    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> (R, bool)) -> R {
        let (result, changed) = {
            let mut inner = self.lock();
            f(&mut inner)
        };
        if changed {
            self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
        }
        result
    }

    #[must_use]
    pub fn snapshot(&self) -> DiscussionState {
        self.lock().state.clone()
    }

    /// Receiver that observes a new value after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    // -------------------------------------------------------------------------
    // group list
    // -------------------------------------------------------------------------

    /// Open a new list-poller run. Responses from earlier runs become stale.
    pub fn begin_group_list(&self) -> ListScope {
        self.update(|inner| {
            inner.list_generation += 1;
            inner.list_running = true;
            (ListScope { generation: inner.list_generation }, false)
        })
    }

    /// Close the list-poller run `scope` belongs to, if it is still the current one.
    pub fn end_group_list(&self, scope: ListScope) {
        self.update(|inner| {
            if !inner.is_current_list(scope) {
                return ((), false);
            }
            inner.list_generation += 1;
            inner.list_running = false;
            let changed = inner.state.groups_loading;
            inner.state.groups_loading = false;
            ((), changed)
        });
    }

    #[must_use]
    pub fn list_scope(&self) -> Option<ListScope> {
        let inner = self.lock();
        inner
            .list_running
            .then_some(ListScope { generation: inner.list_generation })
    }

    /// Returns `false` if `scope` is stale.
    pub fn set_groups_loading(&self, scope: ListScope, loading: bool) -> bool {
        self.update(|inner| {
            if !inner.is_current_list(scope) {
                return (false, false);
            }
            let changed = inner.state.groups_loading != loading;
            inner.state.groups_loading = loading;
            (true, changed)
        })
    }

    /// Replace the cached list (last write wins). Returns `false` if `scope` is stale.
    pub fn apply_groups(&self, scope: ListScope, groups: Vec<Group>) -> bool {
        self.update(|inner| {
            if !inner.is_current_list(scope) {
                return (false, false);
            }
            inner.state.groups = groups;
            inner.state.groups_loading = false;
            (true, true)
        })
    }

    /// Insert a freshly created group at the head of the list, replacing any
    /// copy a poll already delivered.
    pub fn prepend_group(&self, group: Group) {
        self.update(|inner| {
            inner.state.groups.retain(|g| g.id != group.id);
            inner.state.groups.insert(0, group);
            inner.state.group_draft = None;
            ((), true)
        });
    }

    #[must_use]
    pub fn group_by_id(&self, id: &RecordId) -> Option<Group> {
        self.lock().state.groups.iter().find(|g| &g.id == id).cloned()
    }

    // -------------------------------------------------------------------------
    // active selection + feed
    // -------------------------------------------------------------------------

    /// Make `group` the active selection and return the scope its feed
    /// requests must carry. Clears the previous feed.
    pub fn activate(&self, group: Group) -> FeedScope {
        self.update(|inner| {
            inner.feed_generation += 1;
            let scope = FeedScope { group_id: group.id.clone(), generation: inner.feed_generation };
            inner.state.active = Some(group);
            inner.state.messages.clear();
            inner.state.feed_loading = false;
            inner.state.scroll_pending = false;
            (scope, true)
        })
    }

    /// Return to "no group selected". Every outstanding feed scope becomes stale.
    pub fn deactivate(&self) {
        self.update(|inner| {
            inner.feed_generation += 1;
            let changed = inner.state.active.is_some() || !inner.state.messages.is_empty();
            inner.state.active = None;
            inner.state.messages.clear();
            inner.state.feed_loading = false;
            inner.state.scroll_pending = false;
            ((), changed)
        });
    }

    #[must_use]
    pub fn active_group(&self) -> Option<Group> {
        self.lock().state.active.clone()
    }

    #[must_use]
    pub fn feed_scope(&self) -> Option<FeedScope> {
        self.lock().feed_scope()
    }

    #[must_use]
    pub fn is_current_feed(&self, scope: &FeedScope) -> bool {
        self.lock().is_current_feed(scope)
    }

    /// Returns `false` if `scope` is stale.
    pub fn set_feed_loading(&self, scope: &FeedScope, loading: bool) -> bool {
        self.update(|inner| {
            if !inner.is_current_feed(scope) {
                return (false, false);
            }
            let changed = inner.state.feed_loading != loading;
            inner.state.feed_loading = loading;
            (true, changed)
        })
    }

    /// Replace the feed with a full response. Returns `false` (and changes
    /// nothing) if the selection moved on since the request was issued.
    pub fn apply_feed(&self, scope: &FeedScope, messages: Vec<Message>, scroll: bool) -> bool {
        self.update(|inner| {
            if !inner.is_current_feed(scope) {
                return (false, false);
            }
            inner.state.messages = messages;
            inner.state.feed_loading = false;
            if scroll {
                inner.state.scroll_pending = true;
            }
            (true, true)
        })
    }

    /// Consume a pending scroll-to-latest request.
    pub fn take_scroll_request(&self) -> bool {
        self.update(|inner| {
            let pending = std::mem::take(&mut inner.state.scroll_pending);
            (pending, pending)
        })
    }

    // -------------------------------------------------------------------------
    // drafts, notices, session
    // -------------------------------------------------------------------------

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|inner| {
            let changed = inner.state.draft != text;
            inner.state.draft = text;
            ((), changed)
        });
    }

    pub fn clear_draft(&self) {
        self.set_draft(String::new());
    }

    pub fn set_group_draft(&self, draft: NewGroup) {
        self.update(|inner| {
            inner.state.group_draft = Some(draft);
            ((), true)
        });
    }

    pub fn push_notice(&self, notice: Notice) {
        self.update(|inner| {
            inner.state.notices.push(notice);
            ((), true)
        });
    }

    /// Drain queued notices in the order they were raised.
    pub fn take_notices(&self) -> Vec<Notice> {
        self.update(|inner| {
            let notices = std::mem::take(&mut inner.state.notices);
            let changed = !notices.is_empty();
            (notices, changed)
        })
    }

    pub fn set_current_user(&self, user: CurrentUser) {
        self.update(|inner| {
            inner.state.current_user = Some(user);
            ((), true)
        });
    }
}

impl Default for DiscussionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
