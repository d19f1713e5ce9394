//! Discussion engine — keeps a local view of groups and one group's feed in
//! step with the server.
//!
//! DESIGN
//! ======
//! Every piece of view state lives in [`store::DiscussionStore`]. Pollers
//! and coordinators never hold state of their own; they read a scope token
//! from the store, perform a request, and hand the response back together
//! with that token. The store accepts it only if the token still matches
//! the running poller, which is how responses from stopped pollers or
//! previously selected groups get dropped.
//!
//! Two timers run at most: the group list poller for the engine's lifetime
//! and one feed poller for the selected group.

pub mod active;
pub mod create;
pub mod feed;
pub mod group_list;
pub mod send;
pub mod store;
pub mod ticker;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use self::active::ActiveGroupCoordinator;
use self::create::GroupCreateCoordinator;
use self::group_list::{GroupListPoller, fetch_groups};
use self::send::SendCoordinator;
use self::store::{DiscussionState, DiscussionStore, Notice};
use crate::api::{DiscussionApi, Group, Message, RecordId};
use crate::config::SyncConfig;
use crate::error::SyncError;

/// How a fetch presents itself in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// First fetch after a poller starts: shows a loading indicator and
    /// scrolls to the newest message.
    Initial,
    /// Periodic refresh: no loading indicator, scroll position untouched.
    Background,
    /// Refresh right after a send: silent, but scrolls to the newest message.
    Confirm,
}

impl FetchMode {
    #[must_use]
    pub fn is_silent(self) -> bool {
        !matches!(self, Self::Initial)
    }

    #[must_use]
    pub fn requests_scroll(self) -> bool {
        matches!(self, Self::Initial | Self::Confirm)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Background work owned by a started engine.
struct Running {
    list_poller: GroupListPoller,
    user_loader: JoinHandle<()>,
}

/// Entry point that owns the pollers and coordinators for one session.
pub struct DiscussionEngine {
    api: Arc<dyn DiscussionApi>,
    store: DiscussionStore,
    group_interval: Duration,
    running: Mutex<Option<Running>>,
    active: Arc<ActiveGroupCoordinator>,
    sender: SendCoordinator,
    creator: GroupCreateCoordinator,
}

impl DiscussionEngine {
    #[must_use]
    pub fn new(api: Arc<dyn DiscussionApi>, config: &SyncConfig) -> Self {
        Self::with_intervals(api, config.group_poll_interval, config.feed_poll_interval)
    }

    #[must_use]
    pub fn with_intervals(api: Arc<dyn DiscussionApi>, group_interval: Duration, feed_interval: Duration) -> Self {
        let store = DiscussionStore::new();
        let active = Arc::new(ActiveGroupCoordinator::new(api.clone(), store.clone(), feed_interval));
        let sender = SendCoordinator::new(api.clone(), store.clone());
        let creator = GroupCreateCoordinator::new(api.clone(), store.clone(), active.clone());
        Self { api, store, group_interval, running: Mutex::new(None), active, sender, creator }
    }

    /// Start group list polling and load the signed-in user in the background.
    ///
    /// Calling `start` while already running is a no-op.
    pub async fn start(&self) {
        let mut slot = self.running.lock().await;
        if slot.is_some() {
            return;
        }
        let list_poller = GroupListPoller::start(self.api.clone(), self.store.clone(), self.group_interval);

        let api = self.api.clone();
        let store = self.store.clone();
        let user_loader = tokio::spawn(async move {
            match api.current_user().await {
                Ok(user) => {
                    info!(username = %user.username, "session user loaded");
                    store.set_current_user(user);
                }
                Err(e) => warn!(error = %e, code = e.error_code(), "current user fetch failed"),
            }
        });
        *slot = Some(Running { list_poller, user_loader });
    }

    /// Stop every poller. No state changes after this returns, even for
    /// requests that are still in flight.
    pub async fn shutdown(&self) {
        if let Some(running) = self.running.lock().await.take() {
            running.list_poller.stop().await;
            running.user_loader.abort();
            // Wait for the loader to finish or observe the abort.
            let _ = running.user_loader.await;
        }
        self.active.deselect().await;
        info!("discussion engine stopped");
    }

    #[must_use]
    pub fn snapshot(&self) -> DiscussionState {
        self.store.snapshot()
    }

    /// Receiver that changes whenever the view state does.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    #[must_use]
    pub fn store(&self) -> &DiscussionStore {
        &self.store
    }

    // -------------------------------------------------------------------------
    // actions
    // -------------------------------------------------------------------------

    pub async fn select(&self, group: Group) {
        self.active.select(group).await;
    }

    /// # Errors
    ///
    /// Returns [`SyncError::UnknownGroup`] if the cached list has no such id.
    pub async fn select_by_id(&self, id: &RecordId) -> Result<Group, SyncError> {
        self.active.select_by_id(id).await
    }

    pub async fn deselect(&self) {
        self.active.deselect().await;
    }

    /// # Errors
    ///
    /// Returns the API error if the post fails; the draft is kept.
    pub async fn send(&self, text: &str) -> Result<Option<Message>, SyncError> {
        self.sender.send(text).await
    }

    /// # Errors
    ///
    /// Returns the API error if the create fails; an alert notice is raised.
    pub async fn create(&self, name: &str, description: &str) -> Result<Option<Group>, SyncError> {
        self.creator.create(name, description).await
    }

    /// Fetch the group list once, outside the timer. Does nothing when the
    /// list poller is not running.
    pub async fn refresh_groups(&self) {
        if let Some(scope) = self.store.list_scope() {
            fetch_groups(self.api.as_ref(), &self.store, scope, FetchMode::Background).await;
        }
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.store.set_draft(text);
    }

    /// Consume the pending scroll-to-newest request, if any.
    pub fn take_scroll_request(&self) -> bool {
        self.store.take_scroll_request()
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        self.store.take_notices()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
