//! Group create coordinator — create a group and move the user into it.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::active::ActiveGroupCoordinator;
use super::store::{DiscussionStore, Notice};
use crate::api::{DiscussionApi, Group, NewGroup};
use crate::error::SyncError;

pub struct GroupCreateCoordinator {
    api: Arc<dyn DiscussionApi>,
    store: DiscussionStore,
    active: Arc<ActiveGroupCoordinator>,
}

impl GroupCreateCoordinator {
    #[must_use]
    pub fn new(api: Arc<dyn DiscussionApi>, store: DiscussionStore, active: Arc<ActiveGroupCoordinator>) -> Self {
        Self { api, store, active }
    }

    /// Create a group, show it at the head of the list, and select it.
    ///
    /// Returns `Ok(None)` without issuing a request when `name` is blank.
    ///
    /// # Errors
    ///
    /// Returns the API error after raising an alert notice. The group list is
    /// left untouched and the entered values are kept in `group_draft`.
    pub async fn create(&self, name: &str, description: &str) -> Result<Option<Group>, SyncError> {
        if name.trim().is_empty() {
            debug!("ignoring create with blank name");
            return Ok(None);
        }

        let request = NewGroup { name: name.trim().to_owned(), description: description.trim().to_owned() };
        match self.api.create_group(&request).await {
            Ok(group) => {
                info!(group_id = %group.id, name = %group.name, "group created");
                self.store.prepend_group(group.clone());
                self.store.push_notice(Notice::info(format!("Created group \"{}\"", group.name)));
                self.active.select(group.clone()).await;
                Ok(Some(group))
            }
            Err(e) => {
                error!(name = %request.name, error = %e, code = e.error_code(), "group create failed");
                self.store.push_notice(Notice::alert(format!("Could not create group \"{}\": {e}", request.name)));
                self.store.set_group_draft(request);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;
