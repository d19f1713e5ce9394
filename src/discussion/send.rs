//! Send coordinator — post a message, then refresh the feed out of band.
//!
//! The feed response is always the full ordered list, so one silent fetch
//! right after a successful post is enough to make the sender's message
//! visible without waiting for the next poll tick.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::FetchMode;
use super::feed::fetch_feed;
use super::store::DiscussionStore;
use crate::api::{DiscussionApi, Message, NewMessage};
use crate::error::SyncError;

pub struct SendCoordinator {
    api: Arc<dyn DiscussionApi>,
    store: DiscussionStore,
}

impl SendCoordinator {
    #[must_use]
    pub fn new(api: Arc<dyn DiscussionApi>, store: DiscussionStore) -> Self {
        Self { api, store }
    }

    /// Post `text` to the active group.
    ///
    /// Returns `Ok(None)` without touching any state when `text` is blank or
    /// no group is selected.
    ///
    /// # Errors
    ///
    /// Returns the API error after logging it. The draft is left populated so
    /// the user can resubmit.
    pub async fn send(&self, text: &str) -> Result<Option<Message>, SyncError> {
        if text.trim().is_empty() {
            debug!("ignoring blank message");
            return Ok(None);
        }
        let Some(scope) = self.store.feed_scope() else {
            debug!("no active group; message not sent");
            return Ok(None);
        };

        let request = NewMessage { group: scope.group_id().clone(), content: text.to_owned() };
        match self.api.send_message(&request).await {
            Ok(message) => {
                info!(group_id = %scope.group_id(), message_id = %message.id, "message sent");
                self.store.clear_draft();
                // A selection change while the post was in flight makes this a no-op.
                fetch_feed(self.api.as_ref(), &self.store, &scope, FetchMode::Confirm).await;
                Ok(Some(message))
            }
            Err(e) => {
                warn!(group_id = %scope.group_id(), error = %e, code = e.error_code(), "message send failed");
                self.store.set_draft(text);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "send_test.rs"]
mod tests;
