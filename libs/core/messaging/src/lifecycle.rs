use std::fmt;

/// Where a [`KafkaBroker`](crate::KafkaBroker) is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerState {
    Uninitialized,
    Starting,
    Ready,
    Stopping,
    Stopped,
}

impl BrokerState {
    /// `start()` is accepted from these states.
    pub fn can_start(self) -> bool {
        matches!(self, BrokerState::Uninitialized | BrokerState::Stopped)
    }

    pub fn is_ready(self) -> bool {
        self == BrokerState::Ready
    }
}

impl fmt::Display for BrokerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrokerState::Uninitialized => "uninitialized",
            BrokerState::Starting => "starting",
            BrokerState::Ready => "ready",
            BrokerState::Stopping => "stopping",
            BrokerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
