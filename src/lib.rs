//! groupsync — client-side sync engine for group discussions.
//!
//! Keeps a local view of the user's groups and the selected group's message
//! feed in step with a REST backend by polling, and posts new messages and
//! groups on the user's behalf.

pub mod api;
pub mod config;
pub mod discussion;
pub mod error;

pub use api::{DiscussionApi, HttpDiscussionApi};
pub use config::SyncConfig;
pub use discussion::DiscussionEngine;
pub use discussion::store::{DiscussionState, Notice, NoticeLevel};
pub use error::SyncError;
