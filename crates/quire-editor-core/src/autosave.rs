//! Auto-save scheduling.
//!
//! The engine never runs a timer itself; the host polls [`AutosavePolicy::is_due`]
//! from its own tick and performs the save over its transport. The policy
//! keeps the idle window: saving happens only after the configured quiet
//! period since the last change, every change restarts the window, and a
//! failed save is logged and retried on a later tick rather than surfaced.

use std::time::Duration;

use web_time::Instant;

#[derive(Debug, Clone)]
pub struct AutosavePolicy {
    interval: Duration,
    deadline: Option<Instant>,
    in_flight: bool,
    change_seq: u64,
    attempt_seq: u64,
}

impl AutosavePolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            in_flight: false,
            change_seq: 0,
            attempt_seq: 0,
        }
    }

    /// Restart the idle window from `now`.
    pub fn record_change(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
        self.change_seq += 1;
    }

    /// Whether an auto-save should fire at `now`. Never true while a save
    /// is already in flight.
    pub fn is_due(&self, now: Instant) -> bool {
        !self.in_flight && matches!(self.deadline, Some(deadline) if now >= deadline)
    }

    /// The host is about to issue a save request.
    pub fn record_attempt(&mut self) {
        self.in_flight = true;
        self.attempt_seq = self.change_seq;
    }

    /// The save went through. Changes made while it was in flight keep
    /// their own pending deadline.
    pub fn record_success(&mut self) {
        self.in_flight = false;
        if self.attempt_seq == self.change_seq {
            self.deadline = None;
        }
    }

    /// The save failed: log it and retry a full interval later.
    pub fn record_failure(&mut self, now: Instant, error: &dyn std::fmt::Display) {
        tracing::warn!(
            target: "quire::autosave",
            error = %error,
            retry_secs = self.interval.as_secs(),
            "auto-save failed, will retry"
        );
        self.in_flight = false;
        if self.attempt_seq == self.change_seq {
            self.deadline = Some(now + self.interval);
        }
    }

    /// Forget any pending save. Used when a different document is opened.
    pub fn reset(&mut self) {
        self.deadline = None;
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(30);

    fn policy() -> AutosavePolicy {
        AutosavePolicy::new(INTERVAL)
    }

    #[test]
    fn test_not_due_without_changes() {
        let policy = policy();
        assert!(!policy.is_due(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn test_due_exactly_at_the_idle_window() {
        let mut policy = policy();
        let start = Instant::now();
        policy.record_change(start);
        assert!(!policy.is_due(start + Duration::from_secs(29)));
        assert!(policy.is_due(start + Duration::from_secs(30)));
    }

    #[test]
    fn test_change_restarts_the_window() {
        let mut policy = policy();
        let start = Instant::now();
        policy.record_change(start);
        policy.record_change(start + Duration::from_secs(10));
        assert!(!policy.is_due(start + Duration::from_secs(30)));
        assert!(policy.is_due(start + Duration::from_secs(40)));
    }

    #[test]
    fn test_success_clears_the_deadline() {
        let mut policy = policy();
        let start = Instant::now();
        policy.record_change(start);
        policy.record_attempt();
        policy.record_success();
        assert!(!policy.is_due(start + Duration::from_secs(3600)));
    }

    #[test]
    fn test_failure_defers_by_one_interval() {
        let mut policy = policy();
        let start = Instant::now();
        policy.record_change(start);
        let fired = start + Duration::from_secs(30);
        assert!(policy.is_due(fired));
        policy.record_attempt();
        policy.record_failure(fired, &"store unreachable");
        assert!(!policy.is_due(fired + Duration::from_secs(29)));
        assert!(policy.is_due(fired + Duration::from_secs(30)));
    }

    #[test]
    fn test_in_flight_suppresses_due() {
        let mut policy = policy();
        let start = Instant::now();
        policy.record_change(start);
        policy.record_attempt();
        assert!(!policy.is_due(start + Duration::from_secs(60)));
    }

    #[test]
    fn test_change_during_flight_keeps_its_deadline() {
        let mut policy = policy();
        let start = Instant::now();
        policy.record_change(start);
        policy.record_attempt();
        let during = start + Duration::from_secs(31);
        policy.record_change(during);
        policy.record_success();
        assert!(!policy.is_due(during + Duration::from_secs(29)));
        assert!(policy.is_due(during + Duration::from_secs(30)));
    }
}
