//! Server-sent events transport.

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::transport::{FrameStream, Transport};
use crate::api::{endpoint, STREAM_PATH};
use crate::error::{ChannelError, GuestbookError, Result};
use crate::event::RawEvent;

const EVENT_STREAM: &str = "text/event-stream";

/// Opens `GET /api/guestbook/stream` and parses the body as SSE.
///
/// Only the connect phase has a timeout; the stream itself is long-lived.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: Client,
    url: Url,
}

impl SseTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| GuestbookError::Config(format!("Invalid server URL '{base_url}': {e}")))?;
        let url = endpoint(&base, STREAM_PATH, None).ok_or_else(|| {
            GuestbookError::Config(format!("Server URL {base} cannot carry a path"))
        })?;
        Self::with_url(url)
    }

    /// Stream from an exact URL, e.g. one carrying `?format=message`.
    pub fn with_url(url: Url) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GuestbookError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn open(&self) -> std::result::Result<FrameStream, ChannelError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, EVENT_STREAM)
            .send()
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::BadResponse(format!("status {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with(EVENT_STREAM) {
            return Err(ChannelError::BadResponse(format!(
                "content type '{content_type}'"
            )));
        }

        debug!(url = %self.url, "Push stream opened");
        let frames = response.bytes_stream().eventsource().map(|result| match result {
            Ok(event) => Ok(RawEvent::new(event.event, event.data)),
            Err(e) => Err(ChannelError::Stream(e.to_string())),
        });
        Ok(frames.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_parses_named_and_unnamed_events() {
        let server = MockServer::start().await;
        let body = "event: connected\ndata: {\"status\":\"connected\"}\n\n\
                    : keep-alive\n\n\
                    event: delete_photo\ndata: {\"id\":\"e1\"}\n\n\
                    data: {\"type\":\"delete_photo\",\"data\":{\"id\":\"e2\"}}\n\n";
        Mock::given(method("GET"))
            .and(path(STREAM_PATH))
            .and(header("accept", EVENT_STREAM))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENT_STREAM))
            .mount(&server)
            .await;

        let transport = SseTransport::new(&server.uri()).unwrap();
        let frames: Vec<_> = transport.open().await.unwrap().collect().await;
        let frames: Vec<RawEvent> = frames.into_iter().map(|f| f.unwrap()).collect();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].event, "connected");
        assert_eq!(frames[1], RawEvent::new("delete_photo", r#"{"id":"e1"}"#));
        assert_eq!(frames[2].event, "message");
    }

    #[tokio::test]
    async fn test_rejects_non_stream_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(STREAM_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let transport = SseTransport::new(&server.uri()).unwrap();
        assert!(matches!(
            transport.open().await,
            Err(ChannelError::BadResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_error_status_is_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(STREAM_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = SseTransport::new(&server.uri()).unwrap();
        assert!(matches!(
            transport.open().await,
            Err(ChannelError::BadResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let transport = SseTransport::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            transport.open().await,
            Err(ChannelError::Connect(_))
        ));
    }
}
