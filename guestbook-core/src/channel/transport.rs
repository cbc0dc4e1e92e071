use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;
use crate::event::RawEvent;

/// Raw frames of one open connection. The stream ending counts as a
/// transport error.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<RawEvent, ChannelError>> + Send>>;

/// Opens push streams.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Whether this runtime can open push streams at all.
    fn is_supported(&self) -> bool {
        true
    }

    async fn open(&self) -> Result<FrameStream, ChannelError>;
}

/// Delay source for reconnect scheduling.
#[async_trait]
pub trait Timer: Send + Sync + 'static {
    async fn sleep(&self, duration: Duration);
}

/// [`Timer`] backed by the tokio clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
