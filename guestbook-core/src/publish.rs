//! Capture-to-publish pipeline.
//!
//! One local capture slot. Publishing compresses the captured image, sends
//! it to the store and clears the slot only on success; every failure keeps
//! the capture so the visitor can retry without recapturing.

use tracing::{info, instrument, warn};

use crate::compress::ImageCompressor;
use crate::entry::{display_name, CreateEntryRequest, GuestbookEntry};
use crate::error::PublishError;
use crate::identity::VisitorId;
use crate::store::GuestbookStore;

#[derive(Debug, Clone, Default)]
pub struct PublishPipeline {
    buffer: Option<Vec<u8>>,
    compressor: ImageCompressor,
}

impl PublishPipeline {
    pub fn new(compressor: ImageCompressor) -> Self {
        Self {
            buffer: None,
            compressor,
        }
    }

    /// Store raw image bytes in the capture slot, replacing any previous capture.
    pub fn capture(&mut self, image: Vec<u8>) {
        self.buffer = Some(image);
    }

    /// Discard the pending capture.
    pub fn cancel(&mut self) -> bool {
        self.buffer.take().is_some()
    }

    pub fn pending(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }

    /// Compress and upload the pending capture.
    ///
    /// Returns the created entry when the store echoes it back.
    #[instrument(skip(self, store), fields(visitor_id = %visitor))]
    pub async fn publish<S>(
        &mut self,
        store: &S,
        visitor: &VisitorId,
        name: &str,
    ) -> Result<Option<GuestbookEntry>, PublishError>
    where
        S: GuestbookStore + ?Sized,
    {
        let name = display_name(name);
        let raw = self.buffer.as_deref().ok_or(PublishError::NothingCaptured)?;

        let compressed = self.compressor.compress(raw).map_err(|e| {
            warn!(error = %e, "Capture could not be compressed");
            PublishError::from(e)
        })?;

        let request = CreateEntryRequest {
            image: compressed.to_data_url(),
            name,
            visitor_id: visitor.clone(),
        };

        match store.create(request).await {
            Ok(entry) => {
                self.buffer = None;
                info!(
                    width = compressed.width,
                    height = compressed.height,
                    bytes = compressed.jpeg.len(),
                    "Photo published"
                );
                Ok(entry)
            }
            Err(e) => {
                warn!(error = %e, "Publish failed, capture kept for retry");
                Err(e.into())
            }
        }
    }
}
