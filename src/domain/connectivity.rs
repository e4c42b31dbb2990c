use std::time::{Duration, Instant};

pub const PROBE_INTERVAL: Duration = Duration::from_secs(5);
pub const RETRY_COUNTDOWN_SECS: u32 = 5;

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectivityState {
    Connected,
    /// A probe is in flight. `after_failure` keeps the overlay up while retrying.
    Probing { after_failure: bool },
    Disconnected { retry_seconds: u32 },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeOutcome {
    Alive,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectivityChange {
    Lost,
    Restored,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DisconnectOverlay {
    pub retry_seconds: u32,
    pub retrying: bool,
}

/// Liveness state machine. Time only moves when the caller passes a later
/// `Instant`, which keeps every transition reproducible.
///
/// Every probe handed out carries an id; only the result for the latest id
/// is applied.
#[derive(Clone, Debug)]
pub struct ConnectivityMonitor {
    state: ConnectivityState,
    probe_interval: Duration,
    retry_countdown: u32,
    next_due: Instant,
    consecutive_failures: u32,
    last_probe_id: u64,
}

impl ConnectivityMonitor {
    pub fn new(now: Instant) -> Self {
        Self::with_timing(now, PROBE_INTERVAL, RETRY_COUNTDOWN_SECS)
    }

    pub fn with_timing(now: Instant, probe_interval: Duration, retry_countdown: u32) -> Self {
        Self {
            state: ConnectivityState::Connected,
            probe_interval,
            retry_countdown: retry_countdown.max(1),
            next_due: now,
            consecutive_failures: 0,
            last_probe_id: 0,
        }
    }

    /// Back to a fresh connected state with a probe due at `now`. Probes
    /// issued before the reset stay outdated.
    pub fn reset(&mut self, now: Instant) {
        self.state = ConnectivityState::Connected;
        self.next_due = now;
        self.consecutive_failures = 0;
    }

    fn start_probe(&mut self, after_failure: bool) -> u64 {
        self.state = ConnectivityState::Probing { after_failure };
        self.last_probe_id += 1;
        self.last_probe_id
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(
            self.state,
            ConnectivityState::Disconnected { .. } | ConnectivityState::Probing { after_failure: true }
        )
    }

    pub fn overlay(&self) -> Option<DisconnectOverlay> {
        match self.state {
            ConnectivityState::Connected | ConnectivityState::Probing { after_failure: false } => {
                None
            }
            ConnectivityState::Probing { after_failure: true } => Some(DisconnectOverlay {
                retry_seconds: 0,
                retrying: true,
            }),
            ConnectivityState::Disconnected { retry_seconds } => Some(DisconnectOverlay {
                retry_seconds,
                retrying: false,
            }),
        }
    }

    /// Advances the interval timer or the retry countdown. Returns a probe id
    /// when the caller must issue a probe now; it then owes one
    /// `on_probe_result` for that id.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        match self.state {
            ConnectivityState::Connected => {
                if now < self.next_due {
                    return None;
                }
                Some(self.start_probe(false))
            }
            ConnectivityState::Probing { .. } => None,
            ConnectivityState::Disconnected { mut retry_seconds } => {
                while retry_seconds > 0 && now >= self.next_due {
                    retry_seconds -= 1;
                    self.next_due += COUNTDOWN_TICK;
                }
                if retry_seconds == 0 {
                    return Some(self.start_probe(true));
                }
                self.state = ConnectivityState::Disconnected { retry_seconds };
                None
            }
        }
    }

    /// Skips the remaining countdown. Returns the id of the probe to issue.
    pub fn retry_now(&mut self) -> Option<u64> {
        if !matches!(self.state, ConnectivityState::Disconnected { .. }) {
            return None;
        }
        Some(self.start_probe(true))
    }

    pub fn on_probe_result(
        &mut self,
        probe_id: u64,
        outcome: ProbeOutcome,
        now: Instant,
    ) -> Option<ConnectivityChange> {
        let ConnectivityState::Probing { after_failure } = self.state else {
            return None;
        };
        if probe_id != self.last_probe_id {
            return None;
        }

        match outcome {
            ProbeOutcome::Alive => {
                self.state = ConnectivityState::Connected;
                self.consecutive_failures = 0;
                self.next_due = now + self.probe_interval;
                after_failure.then_some(ConnectivityChange::Restored)
            }
            ProbeOutcome::Failed => {
                self.state = ConnectivityState::Disconnected {
                    retry_seconds: self.retry_countdown,
                };
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.next_due = now + COUNTDOWN_TICK;
                (!after_failure).then_some(ConnectivityChange::Lost)
            }
        }
    }
}
