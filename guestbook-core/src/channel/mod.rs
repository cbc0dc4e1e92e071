//! Push channel: one long-lived server-to-client event stream with a fixed
//! delay reconnect policy and a hard attempt ceiling.
//!
//! ## Layout
//!
//! - [`ConnectionMachine`]: pure state machine, no IO, no clock
//! - [`PushChannel`]: owns the single driver task and delivers decoded
//!   [`PushEvent`](crate::event::PushEvent)s in arrival order
//! - [`Transport`] / [`Timer`]: injectable seams for the stream and the delay
//!
//! ```no_run
//! use guestbook_core::channel::{PushChannel, ReconnectPolicy, SseTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = SseTransport::new("http://127.0.0.1:3000")?;
//! let (mut channel, mut events) = PushChannel::new(transport, ReconnectPolicy::default());
//! channel.connect().await;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod machine;
mod manager;
pub mod scripted;
#[cfg(feature = "network")]
mod sse;
mod transport;

pub use machine::{ConnectionMachine, ReconnectPolicy, RetryDecision};
pub use manager::PushChannel;
pub use scripted::{Script, ScriptedTransport};
#[cfg(feature = "network")]
pub use sse::SseTransport;
pub use transport::{FrameStream, Timer, TokioTimer, Transport};

use std::fmt;

/// Lifecycle state of the push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    /// A transport error occurred and a retry is scheduled.
    Erroring,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Erroring => "erroring",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Consecutive transport errors since the last successful open.
    pub reconnect_attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display_names() {
        let names: Vec<String> = [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Erroring,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(names, ["disconnected", "connecting", "open", "erroring"]);
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }
}
