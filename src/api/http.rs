//! REST client for the discussion endpoints.
//!
//! Thin reqwest wrapper. Status mapping and body parsing are pure functions
//! so they can be tested without a server.
//!
//! ENDPOINTS
//! =========
//! - `GET  {base}/groups/`
//! - `POST {base}/groups/`
//! - `GET  {base}/groups/{id}/messages/`
//! - `POST {base}/groups/{id}/messages/`
//! - `GET  {base}/auth/me/`

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::DiscussionApi;
use super::types::{CurrentUser, Group, Message, NewGroup, NewMessage, RecordId};
use crate::config::SyncConfig;
use crate::error::{SyncError, status_error};

const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpDiscussionApi {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpDiscussionApi {
    /// Build a client from typed config.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::HttpClientBuild`] if the reqwest client cannot be built.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| SyncError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), access_token: config.access_token.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: impl reqwest::IntoUrl) -> Result<T, SyncError> {
        self.execute(self.http.get(url)).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: impl reqwest::IntoUrl,
        body: &B,
    ) -> Result<T, SyncError> {
        self.execute(self.http.post(url).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, SyncError> {
        let request_id = Uuid::new_v4();
        let mut request = request.header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = &self.access_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SyncError::Validation(format!("access token is not a valid header value: {e}")))?;
            request = request.header(AUTHORIZATION, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;
        debug!(%request_id, status, bytes = text.len(), "api response");

        parse_body(status, &text)
    }
}

#[async_trait::async_trait]
impl DiscussionApi for HttpDiscussionApi {
    async fn list_groups(&self) -> Result<Vec<Group>, SyncError> {
        self.get_json(self.url("/groups/")).await
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group, SyncError> {
        self.post_json(self.url("/groups/"), group).await
    }

    async fn list_messages(&self, group_id: &RecordId) -> Result<Vec<Message>, SyncError> {
        self.get_json(messages_url(&self.base_url, group_id)?).await
    }

    async fn send_message(&self, message: &NewMessage) -> Result<Message, SyncError> {
        self.post_json(messages_url(&self.base_url, &message.group)?, message).await
    }

    async fn current_user(&self) -> Result<CurrentUser, SyncError> {
        self.get_json(self.url("/auth/me/")).await
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// `{base}/groups/{id}/messages/` with the id percent-encoded as one segment.
fn messages_url(base_url: &str, group_id: &RecordId) -> Result<Url, SyncError> {
    let mut url = Url::parse(base_url).map_err(|e| SyncError::Validation(format!("invalid base URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| SyncError::Validation(format!("base URL cannot take a path: {base_url}")))?
        .pop_if_empty()
        .extend(["groups", &group_id.to_string(), "messages", ""]);
    Ok(url)
}

/// Decode a successful body or map the status to an error.
fn parse_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, SyncError> {
    if !(200..300).contains(&status) {
        return Err(status_error(status, body.to_owned()));
    }
    serde_json::from_str(body).map_err(|e| SyncError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
