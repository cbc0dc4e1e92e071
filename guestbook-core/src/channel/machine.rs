use std::time::Duration;

use super::{ConnectionState, ConnectionStatus};
use crate::config::{SyncConfig, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY};

/// Fixed-delay reconnect policy with a hard attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY,
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl From<&SyncConfig> for ReconnectPolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            delay: config.reconnect_delay,
            max_attempts: config.max_reconnect_attempts,
        }
    }
}

/// What to do after a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Open again after `after`. `attempt` counts consecutive errors so far.
    Retry { after: Duration, attempt: u32 },
    /// The ceiling was reached; the channel stays disconnected.
    GiveUp { attempts: u32 },
}

/// Connection lifecycle without IO.
///
/// `Disconnected -> Connecting -> Open`; a transport error from `Connecting`
/// or `Open` either schedules a retry (`Erroring -> Connecting`) or ends in
/// `Disconnected` once `max_attempts` consecutive errors have been seen.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempts: u32,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            attempts: 0,
        }
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state,
            reconnect_attempts: self.attempts,
        }
    }

    /// Explicit connect. Starts a fresh attempt budget.
    pub fn connect(&mut self) {
        self.state = ConnectionState::Connecting;
        self.attempts = 0;
    }

    /// The transport reported the stream open.
    pub fn opened(&mut self) {
        self.state = ConnectionState::Open;
        self.attempts = 0;
    }

    /// Any transport-level failure, including the server closing the stream.
    pub fn transport_error(&mut self) -> RetryDecision {
        if self.state == ConnectionState::Disconnected {
            return RetryDecision::GiveUp {
                attempts: self.attempts,
            };
        }

        self.attempts = self.attempts.saturating_add(1);
        if self.attempts < self.policy.max_attempts {
            self.state = ConnectionState::Erroring;
            RetryDecision::Retry {
                after: self.policy.delay,
                attempt: self.attempts,
            }
        } else {
            self.state = ConnectionState::Disconnected;
            RetryDecision::GiveUp {
                attempts: self.attempts,
            }
        }
    }

    /// The retry delay elapsed.
    pub fn retry_due(&mut self) -> bool {
        if self.state != ConnectionState::Erroring {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// Explicit teardown; no retry follows.
    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_millis(3000),
            max_attempts,
        }
    }

    #[test]
    fn test_open_resets_attempts() {
        let mut machine = ConnectionMachine::new(policy(5));
        machine.connect();
        assert_eq!(
            machine.transport_error(),
            RetryDecision::Retry {
                after: Duration::from_millis(3000),
                attempt: 1
            }
        );
        assert_eq!(machine.state(), ConnectionState::Erroring);
        assert!(machine.retry_due());
        machine.opened();
        assert_eq!(machine.status().reconnect_attempts, 0);
        assert_eq!(machine.state(), ConnectionState::Open);
    }

    #[test]
    fn test_reconnect_ceiling() {
        let mut machine = ConnectionMachine::new(policy(5));
        machine.connect();

        let mut retries = 0;
        loop {
            match machine.transport_error() {
                RetryDecision::Retry { .. } => {
                    retries += 1;
                    assert!(machine.retry_due());
                }
                RetryDecision::GiveUp { attempts } => {
                    assert_eq!(attempts, 5);
                    break;
                }
            }
        }

        // initial attempt plus four retries: five connection attempts in total
        assert_eq!(retries, 4);
        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert!(!machine.retry_due());
        assert!(matches!(
            machine.transport_error(),
            RetryDecision::GiveUp { .. }
        ));
    }

    #[test]
    fn test_errors_after_open_share_the_budget() {
        let mut machine = ConnectionMachine::new(policy(2));
        machine.connect();
        machine.opened();
        assert!(matches!(
            machine.transport_error(),
            RetryDecision::Retry { attempt: 1, .. }
        ));
        machine.retry_due();
        assert!(matches!(
            machine.transport_error(),
            RetryDecision::GiveUp { attempts: 2 }
        ));
    }

    #[test]
    fn test_explicit_disconnect_never_retries() {
        let mut machine = ConnectionMachine::new(policy(5));
        machine.connect();
        machine.opened();
        machine.disconnect();
        assert_eq!(machine.status(), ConnectionStatus::default());
        assert!(matches!(
            machine.transport_error(),
            RetryDecision::GiveUp { attempts: 0 }
        ));

        // a later explicit connect gets a fresh budget
        machine.connect();
        assert_eq!(machine.state(), ConnectionState::Connecting);
        assert_eq!(machine.status().reconnect_attempts, 0);
    }

    #[test]
    fn test_zero_ceiling_gives_up_immediately() {
        let mut machine = ConnectionMachine::new(policy(0));
        machine.connect();
        assert!(matches!(
            machine.transport_error(),
            RetryDecision::GiveUp { attempts: 1 }
        ));
    }
}
