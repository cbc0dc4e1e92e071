//! Guestbook store over HTTP.
//!
//! Response bodies are parsed as JSON whatever the HTTP status: the store
//! reports rejections as `{success: false, error}` with 4xx codes and the
//! message is what the visitor gets to see.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::GuestbookStore;
use crate::api::{endpoint, DELETE_PATH, PHOTOS_PATH, UPLOAD_PATH};
use crate::config::SyncConfig;
use crate::entry::{
    CreateEntryRequest, DeleteEntryRequest, EntryId, GuestbookEntry, PhotoList, StoreResponse,
};
use crate::error::{GuestbookError, Result, StoreError};
use crate::identity::VisitorId;

/// Configuration for [`HttpGuestbookStore`].
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL of the guestbook server.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry budget for the list request, in multiples of `timeout`.
    pub max_retries: u32,
    /// Initial retry interval.
    pub initial_interval: Duration,
    /// Maximum retry interval.
    pub max_interval: Duration,
}

impl HttpStoreConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GuestbookError::Config(format!("Invalid server URL '{base_url}': {e}")))?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(2),
        })
    }

    pub fn from_sync_config(config: &SyncConfig) -> Result<Self> {
        let mut store = Self::new(&config.server_url)?;
        store.timeout = config.request_timeout;
        Ok(store)
    }
}

/// [`GuestbookStore`] backed by the guestbook HTTP API.
#[derive(Debug, Clone)]
pub struct HttpGuestbookStore {
    client: Client,
    config: HttpStoreConfig,
}

impl HttpGuestbookStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GuestbookError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    fn url(&self, path: &str, tail: Option<&str>) -> std::result::Result<Url, StoreError> {
        endpoint(&self.config.base_url, path, tail).ok_or_else(|| {
            StoreError::Network(format!(
                "Server URL {} cannot carry a path",
                self.config.base_url
            ))
        })
    }

    async fn list_once(&self, url: &Url) -> std::result::Result<Vec<GuestbookEntry>, backoff::Error<StoreError>> {
        let start = Instant::now();

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            if is_transient_error(&e) {
                warn!(error = %e, latency_ms, "Transient error, will retry");
                backoff::Error::transient(StoreError::Network(e.to_string()))
            } else {
                warn!(error = %e, latency_ms, "Permanent error, aborting");
                backoff::Error::permanent(StoreError::Network(e.to_string()))
            }
        })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if is_transient_status(status) {
            warn!(status = %status, "Transient HTTP status, will retry");
            return Err(backoff::Error::transient(StoreError::Network(format!(
                "Server returned status: {status}"
            ))));
        }

        let list: PhotoList = read_json(response).await.map_err(backoff::Error::permanent)?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "List request completed"
        );
        Ok(list.into_entries())
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_interval,
            max_interval: self.config.max_interval,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries),
            ..Default::default()
        }
    }
}

#[async_trait]
impl GuestbookStore for HttpGuestbookStore {
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    async fn list(&self) -> std::result::Result<Vec<GuestbookEntry>, StoreError> {
        let url = self.url(PHOTOS_PATH, None)?;

        retry_notify(
            self.build_backoff(),
            || async { self.list_once(&url).await },
            |err: StoreError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    #[instrument(skip(self, request), fields(visitor_id = %request.visitor_id, image_bytes = request.image.len()))]
    async fn create(
        &self,
        request: CreateEntryRequest,
    ) -> std::result::Result<Option<GuestbookEntry>, StoreError> {
        let url = self.url(UPLOAD_PATH, None)?;
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        let body: StoreResponse = read_json(response).await?;
        if body.success {
            debug!(status = %status, echoed = body.photo.is_some(), "Entry created");
            Ok(body.photo)
        } else {
            warn!(status = %status, error = ?body.error, "Create rejected");
            Err(StoreError::rejected(body.error))
        }
    }

    #[instrument(skip(self), fields(entry_id = %id))]
    async fn delete(&self, id: &EntryId, visitor: &VisitorId) -> std::result::Result<(), StoreError> {
        let url = self.url(DELETE_PATH, Some(id.as_str()))?;
        let response = self
            .client
            .delete(url)
            .json(&DeleteEntryRequest {
                visitor_id: visitor.clone(),
            })
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        let body: StoreResponse = read_json(response).await?;
        if body.success {
            debug!(status = %status, "Entry deleted");
            Ok(())
        } else {
            warn!(status = %status, error = ?body.error, "Delete rejected");
            Err(StoreError::rejected(body.error))
        }
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, StoreError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| StoreError::Network(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!(error = %e, "Failed to parse JSON response");
        StoreError::Malformed(e.to_string())
    })
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}
