//! HTTP client for the scheduling backend
//!
//! This module implements [`RoomsBackend`] over the backend's REST API with
//! a shared [`reqwest::Client`]. Status handling follows the engine's
//! fail-closed posture: 5xx responses and transport failures become
//! [`BackendError::Transport`], 4xx responses become
//! [`BackendError::Rejected`] carrying whatever reason the body offers.

use crate::backend::api::{
    EntryFilter, RegisterEntryRequest, RegisterExitRequest, RoomAccessCheck, RoomsBackend,
    ValidateAccessRequest, ValidateAccessResponse,
};
use crate::error::{BackendError, BackendResult};
use crate::model::{Entry, Schedule};
use crate::types::{ClientConfig, EntryId, RoomId};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const VALIDATE_ACCESS_PATH: &str = "/schedule/schedules/validate_room_access/";
const REGISTER_ENTRY_PATH: &str = "/rooms/entry/";
const MY_SCHEDULES_PATH: &str = "/schedule/schedules/my_schedules/";
const MY_ENTRIES_PATH: &str = "/api/rooms/my-entries/";
const MY_ACTIVE_ENTRY_PATH: &str = "/api/rooms/my-active-entry/";
const ENTRIES_PATH: &str = "/api/rooms/entries/";

fn register_exit_path(entry_id: EntryId) -> String {
    format!("/rooms/entry/{}/exit/", entry_id)
}

fn room_access_path(room_id: RoomId) -> String {
    format!("/rooms/{}/access/", room_id)
}

/// Keys checked, in order, when pulling a reason out of a rejection body
const REJECTION_KEYS: [&str; 4] = ["reason", "detail", "error", "message"];

/// Listing responses arrive either as a bare array or wrapped in the
/// paginator's envelope, depending on the endpoint's configuration.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntryListing {
    Plain(Vec<Entry>),
    Paginated { results: Vec<Entry> },
}

impl EntryListing {
    fn into_entries(self) -> Vec<Entry> {
        match self {
            EntryListing::Plain(entries) => entries,
            EntryListing::Paginated { results } => results,
        }
    }
}

/// [`RoomsBackend`] implementation over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBackend {
    /// Create a client against the given base URL
    ///
    /// The token, when present, is sent as `Authorization: Token <value>` on
    /// every request. The timeout bounds each request end to end.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::transport(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    /// Create a client from the loaded configuration
    pub fn from_config(config: &ClientConfig) -> BackendResult<Self> {
        Self::new(
            config.base_url.clone(),
            config.auth_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.auth_token {
            builder = builder.header(AUTHORIZATION, format!("Token {}", token));
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(builder: RequestBuilder) -> BackendResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| BackendError::decode(e.to_string()))
        } else if status.is_server_error() {
            Err(BackendError::transport(format!(
                "server returned {}",
                status
            )))
        } else {
            let message = Self::rejection_message(response).await;
            Err(BackendError::rejected(status.as_u16(), message))
        }
    }

    async fn rejection_message(response: Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(body) => extract_reason(&body)
                .unwrap_or_else(|| format!("request rejected with status {}", status)),
            Err(_) => format!("request rejected with status {}", status),
        }
    }
}

/// Pull a human-readable reason out of a rejection body
fn extract_reason(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in REJECTION_KEYS {
        if let Some(reason) = value.get(key).and_then(|v| v.as_str()) {
            return Some(reason.to_string());
        }
    }
    None
}

#[async_trait]
impl RoomsBackend for HttpBackend {
    async fn validate_room_access(
        &self,
        request: &ValidateAccessRequest,
    ) -> BackendResult<ValidateAccessResponse> {
        debug!(room_id = %request.room_id, access_type = %request.access_type, "validating room access");
        Self::execute(self.request(Method::POST, VALIDATE_ACCESS_PATH).json(request)).await
    }

    async fn register_entry(&self, request: &RegisterEntryRequest) -> BackendResult<Entry> {
        debug!(room = %request.room, "registering entry");
        Self::execute(self.request(Method::POST, REGISTER_ENTRY_PATH).json(request)).await
    }

    async fn register_exit(
        &self,
        entry_id: EntryId,
        request: &RegisterExitRequest,
    ) -> BackendResult<Entry> {
        debug!(entry_id = %entry_id, "registering exit");
        Self::execute(
            self.request(Method::PATCH, &register_exit_path(entry_id))
                .json(request),
        )
        .await
    }

    async fn room_access(&self, room_id: RoomId) -> BackendResult<RoomAccessCheck> {
        Self::execute(self.request(Method::GET, &room_access_path(room_id))).await
    }

    async fn my_schedules(&self) -> BackendResult<Vec<Schedule>> {
        Self::execute(self.request(Method::GET, MY_SCHEDULES_PATH)).await
    }

    async fn my_entries(&self) -> BackendResult<Vec<Entry>> {
        let listing: EntryListing =
            Self::execute(self.request(Method::GET, MY_ENTRIES_PATH)).await?;
        Ok(listing.into_entries())
    }

    async fn my_active_entry(&self) -> BackendResult<Option<Entry>> {
        let response = self
            .request(Method::GET, MY_ACTIVE_ENTRY_PATH)
            .send()
            .await
            .map_err(|e| BackendError::transport(e.to_string()))?;

        // No open entry is reported as an empty response by some deployments
        // and as a JSON null by others
        if response.status() == StatusCode::NO_CONTENT
            || response.status() == StatusCode::NOT_FOUND
        {
            return Ok(None);
        }
        Self::decode::<Option<Entry>>(response).await
    }

    async fn entries(&self, filter: &EntryFilter) -> BackendResult<Vec<Entry>> {
        let listing: EntryListing = Self::execute(
            self.request(Method::GET, ENTRIES_PATH)
                .query(&filter.query_pairs()),
        )
        .await?;
        Ok(listing.into_entries())
    }
}
