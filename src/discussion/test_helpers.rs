//! In-memory `DiscussionApi` and fixtures for engine tests.
//!
//! `MockApi` can hold individual requests in flight (`hold_groups`,
//! `hold_messages`) so tests can resolve them after the selection changed.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::api::{CurrentUser, DiscussionApi, Group, Message, NewGroup, NewMessage, RecordId, Role};
use crate::error::SyncError;

// =========================================================================
// Fixtures
// =========================================================================

#[must_use]
pub fn group(id: i64, name: &str) -> Group {
    Group { id: RecordId::Int(id), name: name.to_owned(), description: String::new(), member_count: 1 }
}

#[must_use]
pub fn message(id: i64, group_id: i64, author: &str, content: &str) -> Message {
    Message {
        id: RecordId::Int(id),
        group: RecordId::Int(group_id),
        author: author.to_owned(),
        content: content.to_owned(),
        timestamp: format!("2025-01-01T10:{:02}:00Z", id % 60),
    }
}

/// Yield in 1ms steps (virtual time under `start_paused`) until `cond` holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..250 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}

/// Let spawned tasks run without advancing far enough to hit a poll tick.
pub async fn settle() {
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

// =========================================================================
// MockApi
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListGroups,
    CreateGroup(String),
    ListMessages(RecordId),
    SendMessage(RecordId, String),
    CurrentUser,
}

#[derive(Default)]
struct MockInner {
    groups: Vec<Group>,
    feeds: HashMap<RecordId, Vec<Message>>,
    next_id: i64,
    fail_list_groups: bool,
    fail_list_messages: bool,
    fail_send: bool,
    fail_create: bool,
    group_holds: VecDeque<oneshot::Receiver<()>>,
    user_hold: Option<oneshot::Receiver<()>>,
    feed_holds: HashMap<RecordId, VecDeque<oneshot::Receiver<()>>>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct MockApi {
    inner: Mutex<MockInner>,
}

impl MockApi {
    #[must_use]
    pub fn new() -> Self {
        let api = Self::default();
        api.lock().next_id = 1000;
        api
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap()
    }

    pub fn set_groups(&self, groups: Vec<Group>) {
        self.lock().groups = groups;
    }

    pub fn set_feed(&self, group_id: i64, messages: Vec<Message>) {
        self.lock().feeds.insert(RecordId::Int(group_id), messages);
    }

    pub fn push_message(&self, msg: Message) {
        self.lock().feeds.entry(msg.group.clone()).or_default().push(msg);
    }

    pub fn set_next_id(&self, id: i64) {
        self.lock().next_id = id;
    }

    pub fn fail_list_groups(&self, fail: bool) {
        self.lock().fail_list_groups = fail;
    }

    pub fn fail_list_messages(&self, fail: bool) {
        self.lock().fail_list_messages = fail;
    }

    pub fn fail_send(&self, fail: bool) {
        self.lock().fail_send = fail;
    }

    pub fn fail_create(&self, fail: bool) {
        self.lock().fail_create = fail;
    }

    /// The next `list_groups` call waits until the returned sender fires (or drops).
    pub fn hold_groups(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().group_holds.push_back(rx);
        tx
    }

    /// The next `current_user` call waits until the returned sender fires.
    pub fn hold_current_user(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().user_hold = Some(rx);
        tx
    }

    /// The next `list_messages(group_id)` call waits until the returned sender fires.
    pub fn hold_messages(&self, group_id: i64) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock()
            .feed_holds
            .entry(RecordId::Int(group_id))
            .or_default()
            .push_back(rx);
        tx
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn count(&self, call: &Call) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    #[must_use]
    pub fn feed_calls(&self, group_id: i64) -> usize {
        self.count(&Call::ListMessages(RecordId::Int(group_id)))
    }
}

#[async_trait::async_trait]
impl DiscussionApi for MockApi {
    async fn list_groups(&self) -> Result<Vec<Group>, SyncError> {
        let hold = {
            let mut inner = self.lock();
            inner.calls.push(Call::ListGroups);
            inner.group_holds.pop_front()
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        let inner = self.lock();
        if inner.fail_list_groups {
            return Err(SyncError::Network("connection reset".into()));
        }
        Ok(inner.groups.clone())
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group, SyncError> {
        let mut inner = self.lock();
        inner.calls.push(Call::CreateGroup(group.name.clone()));
        if inner.fail_create {
            return Err(SyncError::Rejected { status: 500, body: "boom".into() });
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let created = Group {
            id: RecordId::Int(id),
            name: group.name.clone(),
            description: group.description.clone(),
            member_count: 1,
        };
        inner.groups.push(created.clone());
        Ok(created)
    }

    async fn list_messages(&self, group_id: &RecordId) -> Result<Vec<Message>, SyncError> {
        let hold = {
            let mut inner = self.lock();
            inner.calls.push(Call::ListMessages(group_id.clone()));
            inner.feed_holds.get_mut(group_id).and_then(VecDeque::pop_front)
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        let inner = self.lock();
        if inner.fail_list_messages {
            return Err(SyncError::Network("timed out".into()));
        }
        Ok(inner.feeds.get(group_id).cloned().unwrap_or_default())
    }

    async fn send_message(&self, msg: &NewMessage) -> Result<Message, SyncError> {
        let mut inner = self.lock();
        inner.calls.push(Call::SendMessage(msg.group.clone(), msg.content.clone()));
        if inner.fail_send {
            return Err(SyncError::Network("connection refused".into()));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let sent = Message {
            id: RecordId::Int(id),
            group: msg.group.clone(),
            author: "me".into(),
            content: msg.content.clone(),
            timestamp: "2025-01-01T12:00:00Z".into(),
        };
        inner.feeds.entry(msg.group.clone()).or_default().push(sent.clone());
        Ok(sent)
    }

    async fn current_user(&self) -> Result<CurrentUser, SyncError> {
        let hold = {
            let mut inner = self.lock();
            inner.calls.push(Call::CurrentUser);
            inner.user_hold.take()
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        Ok(CurrentUser { id: RecordId::Int(5), username: "me".into(), email: "me@example.test".into(), role: Role::User })
    }
}
