//! Message feed poller — refreshes the feed of the active group only.
//!
//! Each poller is bound to one [`FeedScope`] for its whole life; the
//! coordinator replaces the poller on every selection change. Responses carry
//! that scope and are dropped by the store if the selection moved on, which
//! is what keeps group A's messages out of group B's view.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::FetchMode;
use super::store::{DiscussionStore, FeedScope};
use super::ticker::PeriodicTask;
use crate::api::DiscussionApi;

pub struct MessageFeedPoller {
    task: PeriodicTask,
    scope: FeedScope,
}

impl MessageFeedPoller {
    /// Initial non-silent fetch, then a silent fetch every `period`.
    pub fn start(api: Arc<dyn DiscussionApi>, store: DiscussionStore, scope: FeedScope, period: Duration) -> Self {
        let job_scope = scope.clone();
        let task = PeriodicTask::spawn("message-feed", period, move |tick| {
            let api = api.clone();
            let store = store.clone();
            let scope = job_scope.clone();
            let mode = if tick == 0 { FetchMode::Initial } else { FetchMode::Background };
            async move {
                fetch_feed(api.as_ref(), &store, &scope, mode).await;
            }
        });
        info!(group_id = %scope.group_id(), generation = scope.generation(), "feed polling started");
        Self { task, scope }
    }

    #[must_use]
    pub fn scope(&self) -> &FeedScope {
        &self.scope
    }

    /// Cancel the interval and wait for the timer loop to exit.
    pub async fn stop(self) {
        self.task.stop().await;
        info!(group_id = %self.scope.group_id(), generation = self.scope.generation(), "feed polling stopped");
    }
}

/// Fetch the full feed for `scope` and apply it if the scope is still current.
///
/// Returns whether the response was applied.
pub async fn fetch_feed(api: &dyn DiscussionApi, store: &DiscussionStore, scope: &FeedScope, mode: FetchMode) -> bool {
    if !mode.is_silent() && !store.set_feed_loading(scope, true) {
        return false;
    }

    match api.list_messages(scope.group_id()).await {
        Ok(messages) => {
            let count = messages.len();
            let applied = store.apply_feed(scope, messages, mode.requests_scroll());
            if applied {
                debug!(group_id = %scope.group_id(), count, ?mode, "feed refreshed");
            } else {
                debug!(group_id = %scope.group_id(), generation = scope.generation(), "discarding stale feed response");
            }
            applied
        }
        Err(e) => {
            warn!(group_id = %scope.group_id(), error = %e, code = e.error_code(), "feed fetch failed; keeping cached feed");
            if !mode.is_silent() {
                store.set_feed_loading(scope, false);
            }
            false
        }
    }
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
