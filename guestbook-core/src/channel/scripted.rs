//! Transport that plays back prepared connections, for tests and demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use super::transport::{FrameStream, Transport};
use crate::error::ChannelError;
use crate::event::RawEvent;

/// Behaviour of one `open` call.
#[derive(Debug)]
pub enum Script {
    /// The connection attempt fails.
    Refuse,
    /// Yield `frames`, then either stay open forever or end the stream.
    Frames {
        frames: Vec<Result<RawEvent, ChannelError>>,
        hold_open: bool,
    },
    /// Yield whatever is sent on the paired sender; ends when it is dropped.
    Feed(mpsc::UnboundedReceiver<RawEvent>),
}

impl Script {
    /// A feed script plus the sender that drives it.
    pub fn feed() -> (mpsc::UnboundedSender<RawEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::Feed(rx))
    }
}

/// Plays back one [`Script`] per `open` call, in order. Once the scripts
/// run out every further attempt is refused.
#[derive(Debug)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    opens: AtomicUsize,
    supported: bool,
}

impl ScriptedTransport {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            opens: AtomicUsize::new(0),
            supported: true,
        }
    }

    /// A transport the runtime does not support; `open` is never called.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new([])
        }
    }

    /// Queue another script.
    pub fn push(&self, script: Script) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.push_back(script);
        }
    }

    /// Number of `open` calls so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn open(&self) -> Result<FrameStream, ChannelError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .map_err(|_| ChannelError::Connect("script queue poisoned".into()))?
            .pop_front()
            .unwrap_or(Script::Refuse);

        match script {
            Script::Refuse => Err(ChannelError::Connect("connection refused".into())),
            Script::Frames { frames, hold_open } => {
                let frames = stream::iter(frames);
                if hold_open {
                    Ok(frames.chain(stream::pending()).boxed())
                } else {
                    Ok(frames.boxed())
                }
            }
            Script::Feed(rx) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|frame| (Ok(frame), rx))
            })
            .boxed()),
        }
    }
}
