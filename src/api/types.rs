//! Wire and domain types shared by the API client and the sync engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque server-assigned identifier.
///
/// Keeps the JSON form the server used (integer or string) so the id can be
/// echoed back in request bodies and paths without reinterpretation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    /// Numeric input becomes `Int`, anything else `Text`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>().map_or_else(|_| Self::Text(s.to_owned()), Self::Int))
    }
}

// =============================================================================
// GROUPS
// =============================================================================

/// A discussion group as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "memberCount", alias = "members")]
    pub member_count: u32,
}

/// Body of a create-group request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
}

// =============================================================================
// MESSAGES
// =============================================================================

/// One append-only message in a group feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: RecordId,
    pub group: RecordId,
    /// Author display name.
    #[serde(alias = "user", deserialize_with = "author_name")]
    pub author: String,
    pub content: String,
    /// Server-assigned creation time; feeds arrive already ordered by it.
    #[serde(alias = "created_at")]
    pub timestamp: String,
}

impl Message {
    #[must_use]
    pub fn is_authored_by(&self, user: &CurrentUser) -> bool {
        self.author == user.username
    }
}

/// Body of a send-message request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    pub group: RecordId,
    pub content: String,
}

/// Authors arrive either as a plain name or as a nested user object.
fn author_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AuthorWire {
        Name(String),
        User { username: String },
    }

    Ok(match AuthorWire::deserialize(deserializer)? {
        AuthorWire::Name(name) | AuthorWire::User { username: name } => name,
    })
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// The signed-in user, as reported by `/auth/me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: RecordId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
