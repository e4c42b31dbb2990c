use crate::domain::VersionInfo;
use std::time::{Duration, Instant};

pub const VERSION_CHECK_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const READY_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VersionAction {
    FetchVersion,
    TriggerUpdate,
    /// `wait` identifies the update wait the probe belongs to and must be
    /// handed back to `on_ready_result`.
    ProbeReady { wait: u64 },
    Reload,
    UpdateAbandoned,
}

#[derive(Clone, Copy, Debug)]
struct UpdateWait {
    id: u64,
    started_at: Instant,
    next_probe_at: Instant,
    probe_in_flight: bool,
}

#[derive(Clone, Debug)]
pub struct VersionMonitor {
    info: VersionInfo,
    check_interval: Duration,
    ready_interval: Duration,
    ready_timeout: Duration,
    next_check_at: Instant,
    check_in_flight: bool,
    update: Option<UpdateWait>,
    last_wait_id: u64,
}

impl VersionMonitor {
    pub fn new(now: Instant) -> Self {
        Self::with_timing(now, VERSION_CHECK_INTERVAL, READY_POLL_INTERVAL, READY_TIMEOUT)
    }

    pub fn with_timing(
        now: Instant,
        check_interval: Duration,
        ready_interval: Duration,
        ready_timeout: Duration,
    ) -> Self {
        Self {
            info: VersionInfo::default(),
            check_interval,
            ready_interval,
            ready_timeout,
            next_check_at: now,
            check_in_flight: false,
            update: None,
            last_wait_id: 0,
        }
    }

    pub fn info(&self) -> &VersionInfo {
        &self.info
    }

    pub fn is_updating(&self) -> bool {
        self.update.is_some()
    }

    pub fn can_update(&self) -> bool {
        self.info.update_available && self.update.is_none()
    }

    /// Returns the next piece of I/O that is due. Call repeatedly until `None`;
    /// an action is never handed out twice while its result is outstanding.
    pub fn poll(&mut self, now: Instant) -> Option<VersionAction> {
        if let Some(wait) = self.update.as_mut() {
            if now.duration_since(wait.started_at) >= self.ready_timeout {
                self.update = None;
                return Some(VersionAction::UpdateAbandoned);
            }
            if !wait.probe_in_flight && now >= wait.next_probe_at {
                wait.probe_in_flight = true;
                return Some(VersionAction::ProbeReady { wait: wait.id });
            }
        }

        if !self.check_in_flight && now >= self.next_check_at {
            self.check_in_flight = true;
            return Some(VersionAction::FetchVersion);
        }

        None
    }

    /// A failed check keeps the last known info.
    pub fn on_version_result(&mut self, result: Option<VersionInfo>, now: Instant) {
        self.check_in_flight = false;
        self.next_check_at = now + self.check_interval;
        if let Some(info) = result {
            self.info = info;
        }
    }

    pub fn begin_update(&mut self, now: Instant) -> Option<VersionAction> {
        if self.update.is_some() {
            return None;
        }
        self.last_wait_id += 1;
        self.update = Some(UpdateWait {
            id: self.last_wait_id,
            started_at: now,
            next_probe_at: now + self.ready_interval,
            probe_in_flight: false,
        });
        Some(VersionAction::TriggerUpdate)
    }

    /// Errors while waiting are expected (the server is restarting) and only
    /// reschedule the next probe. Results for an earlier wait are ignored.
    pub fn on_ready_result(
        &mut self,
        wait_id: u64,
        ready: bool,
        now: Instant,
    ) -> Option<VersionAction> {
        let wait = self.update.as_mut().filter(|wait| wait.id == wait_id)?;
        wait.probe_in_flight = false;
        if ready {
            self.update = None;
            return Some(VersionAction::Reload);
        }
        wait.next_probe_at = now + self.ready_interval;
        None
    }

    /// The trigger request never left the client, so there is nothing to wait
    /// for. A trigger that was sent but errored keeps waiting.
    pub fn abort_update(&mut self) -> bool {
        self.update.take().is_some()
    }

    /// After a reload the version is re-read right away.
    pub fn schedule_check_now(&mut self, now: Instant) {
        self.next_check_at = now;
    }
}
