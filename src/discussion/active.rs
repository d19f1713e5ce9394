//! Active group coordinator — the only writer of the current selection.
//!
//! DESIGN
//! ======
//! Selection changes are serialized behind an async mutex that also owns the
//! running [`MessageFeedPoller`]. A change stops the old poller and waits for
//! its timer loop to exit before the store switches scope and a new poller
//! is spawned, so at most one feed loop exists at any time. Requests the old
//! poller still has in flight are invalidated by the scope switch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::feed::MessageFeedPoller;
use super::store::DiscussionStore;
use crate::api::{DiscussionApi, Group, RecordId};
use crate::error::SyncError;

pub struct ActiveGroupCoordinator {
    api: Arc<dyn DiscussionApi>,
    store: DiscussionStore,
    feed_interval: Duration,
    poller: Mutex<Option<MessageFeedPoller>>,
}

impl ActiveGroupCoordinator {
    #[must_use]
    pub fn new(api: Arc<dyn DiscussionApi>, store: DiscussionStore, feed_interval: Duration) -> Self {
        Self { api, store, feed_interval, poller: Mutex::new(None) }
    }

    /// Make `group` the active selection and start polling its feed.
    ///
    /// Re-selecting the group that is already active keeps the running poller.
    pub async fn select(&self, group: Group) {
        let mut slot = self.poller.lock().await;

        if slot.as_ref().is_some_and(|p| p.scope().group_id() == &group.id && self.store.is_current_feed(p.scope())) {
            debug!(group_id = %group.id, "group already active");
            return;
        }

        if let Some(previous) = slot.take() {
            previous.stop().await;
        }

        let scope = self.store.activate(group);
        info!(group_id = %scope.group_id(), generation = scope.generation(), "group selected");
        *slot = Some(MessageFeedPoller::start(self.api.clone(), self.store.clone(), scope, self.feed_interval));
    }

    /// Select a group from the cached list by id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownGroup`] if no cached group has that id.
    pub async fn select_by_id(&self, id: &RecordId) -> Result<Group, SyncError> {
        let group = self
            .store
            .group_by_id(id)
            .ok_or_else(|| SyncError::UnknownGroup(id.clone()))?;
        self.select(group.clone()).await;
        Ok(group)
    }

    /// Stop polling and return to "no group selected".
    pub async fn deselect(&self) {
        let mut slot = self.poller.lock().await;
        if let Some(previous) = slot.take() {
            previous.stop().await;
        }
        self.store.deactivate();
        info!("group deselected");
    }

    #[must_use]
    pub fn current(&self) -> Option<Group> {
        self.store.active_group()
    }

    /// Whether a feed loop is currently running.
    pub async fn is_polling(&self) -> bool {
        self.poller.lock().await.is_some()
    }
}

#[cfg(test)]
#[path = "active_test.rs"]
mod tests;
