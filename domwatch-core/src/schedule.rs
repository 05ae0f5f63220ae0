use std::time::Duration;

pub const DEFAULT_PASS_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CONNECTION_PAUSE: Duration = Duration::from_secs(60);
pub const DEFAULT_READY_POLL: Duration = Duration::from_secs(5);

/// Fixed waits of the polling loop.
///
/// Every wait goes through `tokio::time::sleep`, so a paused test runtime
/// advances through them instantly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Wait after a full pass over the domain list.
    pub pass_interval: Duration,
    /// Wait after a lookup failed to reach the WHOIS server.
    pub connection_pause: Duration,
    /// Wait between readiness probes of the delivery client.
    pub ready_poll: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            pass_interval: DEFAULT_PASS_INTERVAL,
            connection_pause: DEFAULT_CONNECTION_PAUSE,
            ready_poll: DEFAULT_READY_POLL,
        }
    }
}

impl Schedule {
    pub fn with_pass_interval(mut self, interval: Duration) -> Self {
        self.pass_interval = interval;
        self
    }

    pub fn with_connection_pause(mut self, pause: Duration) -> Self {
        self.connection_pause = pause;
        self
    }
}
