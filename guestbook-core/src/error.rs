use thiserror::Error;

/// Message shown when the store rejects a request without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Error, Debug)]
pub enum GuestbookError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Failure talking to the guestbook store (list/create/delete).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// A response was received with `success = false`. Displays the server message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// A response was received but could not be understood.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Build a rejection from the optional server-reported message.
    pub fn rejected(message: Option<String>) -> Self {
        Self::Rejected(
            message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        )
    }
}

/// Transport-level failure on the push channel. Always recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Unexpected response: {0}")]
    BadResponse(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Stream closed by server")]
    Closed,
}

/// A push payload that could not be decoded. Logged and dropped.
#[derive(Error, Debug)]
#[error("Failed to decode {event} event: {source}")]
pub struct DecodeError {
    pub event: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Outcome taxonomy of the capture-to-publish pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("No captured image to publish")]
    NothingCaptured,

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Network error. Please try again.")]
    NetworkError(String),

    /// Server-reported message, verbatim.
    #[error("{0}")]
    ServerRejected(String),
}

impl From<StoreError> for PublishError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(message) => Self::ServerRejected(message),
            StoreError::Network(detail) | StoreError::Malformed(detail) => {
                Self::NetworkError(detail)
            }
        }
    }
}

impl From<CompressionError> for PublishError {
    fn from(err: CompressionError) -> Self {
        Self::CompressionFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GuestbookError>;
