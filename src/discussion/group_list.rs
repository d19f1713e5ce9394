//! Group list poller — keeps the cached list of visible groups fresh.
//!
//! DESIGN
//! ======
//! Immediate fetch on start, then one fetch per interval. The server returns
//! the complete set each time, so responses replace the cache wholesale in
//! arrival order. Out-of-order responses are tolerated: the worst case is a
//! list one tick old until the next response lands.
//!
//! ERROR HANDLING
//! ==============
//! Failures are logged and the previous list is kept. There is no backoff;
//! the next scheduled tick is the retry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::FetchMode;
use super::store::{DiscussionStore, ListScope};
use super::ticker::PeriodicTask;
use crate::api::DiscussionApi;

pub struct GroupListPoller {
    task: PeriodicTask,
    scope: ListScope,
    store: DiscussionStore,
}

impl GroupListPoller {
    /// Open a new list run and start polling every `period`.
    pub fn start(api: Arc<dyn DiscussionApi>, store: DiscussionStore, period: Duration) -> Self {
        let scope = store.begin_group_list();
        let job_store = store.clone();
        let task = PeriodicTask::spawn("group-list", period, move |tick| {
            let api = api.clone();
            let store = job_store.clone();
            let mode = if tick == 0 { FetchMode::Initial } else { FetchMode::Background };
            async move { fetch_groups(api.as_ref(), &store, scope, mode).await }
        });
        info!(generation = scope.generation(), "group list polling started");
        Self { task, scope, store }
    }

    #[must_use]
    pub fn scope(&self) -> ListScope {
        self.scope
    }

    /// Cancel the timer. Responses still in flight are discarded on arrival.
    pub async fn stop(self) {
        self.store.end_group_list(self.scope);
        self.task.stop().await;
        info!(generation = self.scope.generation(), "group list polling stopped");
    }
}

/// Fetch the list once and apply it if `scope` is still the running poller.
pub async fn fetch_groups(api: &dyn DiscussionApi, store: &DiscussionStore, scope: ListScope, mode: FetchMode) {
    if !mode.is_silent() {
        store.set_groups_loading(scope, true);
    }

    match api.list_groups().await {
        Ok(groups) => {
            let count = groups.len();
            if store.apply_groups(scope, groups) {
                debug!(count, "group list refreshed");
            } else {
                debug!(generation = scope.generation(), "discarding group list from stopped poller");
            }
        }
        Err(e) => {
            warn!(error = %e, code = e.error_code(), "group list fetch failed; keeping cached list");
            if !mode.is_silent() {
                store.set_groups_loading(scope, false);
            }
        }
    }
}

#[cfg(test)]
#[path = "group_list_test.rs"]
mod tests;
