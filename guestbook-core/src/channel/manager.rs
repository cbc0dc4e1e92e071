use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::machine::{ConnectionMachine, ReconnectPolicy, RetryDecision};
use super::transport::{FrameStream, Timer, TokioTimer, Transport};
use super::ConnectionStatus;
use crate::error::ChannelError;
use crate::event::PushEvent;

const EVENT_BUFFER: usize = 256;

/// Owner of the push connection.
///
/// At most one driver task exists at a time. [`connect`](Self::connect)
/// tears the previous one down and waits for it to finish before a new
/// stream is opened, so connections and handlers never leak.
pub struct PushChannel<T, C = TokioTimer> {
    shared: Arc<Shared<T, C>>,
    driver: Option<JoinHandle<()>>,
}

struct Shared<T, C> {
    transport: T,
    timer: C,
    policy: ReconnectPolicy,
    status: watch::Sender<ConnectionStatus>,
    events: mpsc::Sender<PushEvent>,
    generation: AtomicU64,
}

impl<T: Transport> PushChannel<T, TokioTimer> {
    /// Channel using the tokio clock. Decoded events arrive on the returned
    /// receiver in the order the server emitted them.
    pub fn new(transport: T, policy: ReconnectPolicy) -> (Self, mpsc::Receiver<PushEvent>) {
        Self::with_timer(transport, TokioTimer, policy)
    }
}

impl<T: Transport, C: Timer> PushChannel<T, C> {
    pub fn with_timer(
        transport: T,
        timer: C,
        policy: ReconnectPolicy,
    ) -> (Self, mpsc::Receiver<PushEvent>) {
        let (events, rx) = mpsc::channel(EVENT_BUFFER);
        let (status, _) = watch::channel(ConnectionStatus::default());
        let channel = Self {
            shared: Arc::new(Shared {
                transport,
                timer,
                policy,
                status,
                events,
                generation: AtomicU64::new(0),
            }),
            driver: None,
        };
        (channel, rx)
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// Watch status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// Open the push stream, replacing any existing connection.
    ///
    /// Does nothing when the transport is unsupported by this runtime.
    pub async fn connect(&mut self) {
        if !self.shared.transport.is_supported() {
            debug!("Push transport unsupported, live updates disabled");
            return;
        }

        let generation = self.teardown().await;
        let shared = Arc::clone(&self.shared);
        self.driver = Some(tokio::spawn(async move {
            shared.drive(generation).await;
        }));
    }

    /// Close the connection if any. Safe to call repeatedly.
    pub async fn disconnect(&mut self) {
        let generation = self.teardown().await;
        let mut machine = ConnectionMachine::new(self.shared.policy);
        machine.disconnect();
        self.shared.publish(generation, machine.status());
        debug!("Push channel disconnected");
    }

    /// Invalidate the running driver, stop it and wait for it to exit.
    async fn teardown(&mut self) -> u64 {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(driver) = self.driver.take() {
            driver.abort();
            // Cancelled is the expected outcome
            let _ = driver.await;
        }
        generation
    }
}

impl<T, C> Drop for PushChannel<T, C> {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

enum PumpExit {
    Failed(ChannelError),
    ReceiverGone,
}

impl<T: Transport, C: Timer> Shared<T, C> {
    /// Publish `status` unless a newer connect/disconnect has happened.
    fn publish(&self, generation: u64, status: ConnectionStatus) {
        self.status.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation || *current == status {
                return false;
            }
            *current = status;
            true
        });
    }

    async fn drive(&self, generation: u64) {
        let mut machine = ConnectionMachine::new(self.policy);
        machine.connect();
        self.publish(generation, machine.status());

        loop {
            let error = match self.transport.open().await {
                Ok(stream) => {
                    machine.opened();
                    self.publish(generation, machine.status());
                    info!("Push channel open");

                    match self.pump(stream).await {
                        PumpExit::Failed(error) => error,
                        PumpExit::ReceiverGone => {
                            debug!("Event receiver dropped, stopping push channel");
                            machine.disconnect();
                            self.publish(generation, machine.status());
                            return;
                        }
                    }
                }
                Err(error) => error,
            };

            match machine.transport_error() {
                RetryDecision::Retry { after, attempt } => {
                    warn!(
                        error = %error,
                        attempt,
                        retry_after_ms = after.as_millis() as u64,
                        "Push channel error, reconnecting"
                    );
                    self.publish(generation, machine.status());
                    self.timer.sleep(after).await;
                    machine.retry_due();
                    self.publish(generation, machine.status());
                }
                RetryDecision::GiveUp { attempts } => {
                    warn!(
                        error = %error,
                        attempts,
                        "Push channel giving up, live updates disabled"
                    );
                    self.publish(generation, machine.status());
                    return;
                }
            }
        }
    }

    /// Forward decoded events until the stream fails or ends.
    async fn pump(&self, mut stream: FrameStream) -> PumpExit {
        while let Some(frame) = stream.next().await {
            let raw = match frame {
                Ok(raw) => raw,
                Err(error) => return PumpExit::Failed(error),
            };

            match PushEvent::decode(&raw) {
                Ok(Some(event)) => {
                    debug!(event = event.name(), "Push event received");
                    if self.events.send(event).await.is_err() {
                        return PumpExit::ReceiverGone;
                    }
                }
                Ok(None) => debug!(event = %raw.event, "Ignoring unknown push event"),
                Err(error) => warn!(error = %error, "Dropping malformed push event"),
            }
        }
        PumpExit::Failed(ChannelError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::scripted::{Script, ScriptedTransport};
    use crate::channel::ConnectionState;
    use crate::event::RawEvent;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default, Clone)]
    struct RecordingTimer {
        delays: Arc<Mutex<Vec<Duration>>>,
    }

    #[async_trait]
    impl Timer for RecordingTimer {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
            tokio::task::yield_now().await;
        }
    }

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_millis(3000),
            max_attempts: 5,
        }
    }

    fn frame(event: &str, data: &str) -> Result<RawEvent, ChannelError> {
        Ok(RawEvent::new(event, data))
    }

    #[tokio::test]
    async fn test_gives_up_after_ceiling() {
        let timer = RecordingTimer::default();
        let (mut channel, _events) =
            PushChannel::with_timer(ScriptedTransport::new([]), timer.clone(), policy());
        let mut status = channel.subscribe_status();

        channel.connect().await;
        let last = *status
            .wait_for(|s| s.state == ConnectionState::Disconnected && s.reconnect_attempts > 0)
            .await
            .unwrap();

        assert_eq!(last.reconnect_attempts, 5);
        assert_eq!(channel.transport().opens(), 5);
        assert_eq!(*timer.delays.lock().unwrap(), vec![Duration::from_millis(3000); 4]);
    }

    #[tokio::test]
    async fn test_events_delivered_in_order_and_bad_frames_dropped() {
        let entry = r#"{"id":"e1","visitor_id":"v1","visitor_name":"Ana","image_url":"/i","created_at":"2025-03-01T10:00:00Z"}"#;
        let transport = ScriptedTransport::new([Script::Frames {
            frames: vec![
                frame("connected", "{}"),
                frame("new_photo", "{oops"),
                frame("typing", "{}"),
                frame("new_photo", entry),
                frame("delete_photo", r#"{"id":"e1"}"#),
            ],
            hold_open: true,
        }]);
        let (mut channel, mut events) =
            PushChannel::with_timer(transport, RecordingTimer::default(), policy());

        channel.connect().await;
        assert_eq!(events.recv().await.unwrap(), PushEvent::Connected);
        assert!(matches!(events.recv().await.unwrap(), PushEvent::NewEntry(_)));
        assert!(matches!(events.recv().await.unwrap(), PushEvent::DeleteEntry(_)));

        let status = channel.status();
        assert_eq!(status.state, ConnectionState::Open);
        assert_eq!(status.reconnect_attempts, 0);
    }

    #[tokio::test]
    async fn test_stream_end_reconnects_and_open_resets_attempts() {
        let transport = ScriptedTransport::new([
            Script::Frames {
                frames: vec![frame("connected", "{}")],
                hold_open: false,
            },
            Script::Refuse,
            Script::Frames {
                frames: vec![frame("connected", "{}")],
                hold_open: true,
            },
        ]);
        let timer = RecordingTimer::default();
        let (mut channel, mut events) =
            PushChannel::with_timer(transport, timer.clone(), policy());

        channel.connect().await;
        assert_eq!(events.recv().await.unwrap(), PushEvent::Connected);
        assert_eq!(events.recv().await.unwrap(), PushEvent::Connected);

        let mut status = channel.subscribe_status();
        status
            .wait_for(|s| s.state == ConnectionState::Open)
            .await
            .unwrap();
        assert_eq!(channel.status().reconnect_attempts, 0);
        assert_eq!(channel.transport().opens(), 3);
        assert_eq!(timer.delays.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_previous_connection() {
        let (first_tx, first) = Script::feed();
        let (second_tx, second) = Script::feed();
        let transport = ScriptedTransport::new([first, second]);
        let (mut channel, mut events) =
            PushChannel::with_timer(transport, RecordingTimer::default(), policy());

        channel.connect().await;
        first_tx.send(RawEvent::new("connected", "")).unwrap();
        assert_eq!(events.recv().await.unwrap(), PushEvent::Connected);

        channel.connect().await;
        // the old stream was torn down with its driver
        assert!(first_tx.send(RawEvent::new("connected", "")).is_err());

        second_tx
            .send(RawEvent::new("delete_photo", r#"{"id":7}"#))
            .unwrap();
        assert!(matches!(events.recv().await.unwrap(), PushEvent::DeleteEntry(_)));
        assert_eq!(channel.transport().opens(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_and_final() {
        let (_tx, feed) = Script::feed();
        let (mut channel, _events) = PushChannel::with_timer(
            ScriptedTransport::new([feed]),
            RecordingTimer::default(),
            policy(),
        );

        channel.connect().await;
        channel.disconnect().await;
        channel.disconnect().await;

        assert_eq!(channel.status(), ConnectionStatus::default());
        tokio::task::yield_now().await;
        assert!(channel.transport().opens() <= 1);
    }

    #[tokio::test]
    async fn test_unsupported_transport_is_noop() {
        let (mut channel, _events) = PushChannel::with_timer(
            ScriptedTransport::unsupported(),
            RecordingTimer::default(),
            policy(),
        );
        channel.connect().await;
        assert_eq!(channel.transport().opens(), 0);
        assert_eq!(channel.status().state, ConnectionState::Disconnected);
    }
}
