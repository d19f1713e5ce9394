//! API — the remote discussion endpoints the engine consumes.
//!
//! DESIGN
//! ======
//! The engine only talks to [`DiscussionApi`]. Production code uses the
//! reqwest-backed [`HttpDiscussionApi`]; tests substitute an in-memory mock
//! so polling races can be staged deterministically.

pub mod http;
pub mod types;

pub use http::HttpDiscussionApi;
pub use types::{CurrentUser, Group, Message, NewGroup, NewMessage, RecordId, Role};

use crate::error::SyncError;

/// Async access to groups, feeds, and the signed-in user. Enables mocking in tests.
#[async_trait::async_trait]
pub trait DiscussionApi: Send + Sync {
    /// Full set of groups visible to the current user.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] on transport failure or a non-success status.
    async fn list_groups(&self) -> Result<Vec<Group>, SyncError>;

    /// Create a group and return it with its server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] if the server rejects the name.
    async fn create_group(&self, group: &NewGroup) -> Result<Group, SyncError>;

    /// Complete, timestamp-ordered feed of one group.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if the group is invalid or inaccessible.
    async fn list_messages(&self, group_id: &RecordId) -> Result<Vec<Message>, SyncError>;

    /// Append one message to a group.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] on transport failure or a non-success status.
    async fn send_message(&self, message: &NewMessage) -> Result<Message, SyncError>;

    /// The user the configured credentials belong to.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the session is missing or expired.
    async fn current_user(&self) -> Result<CurrentUser, SyncError>;
}
