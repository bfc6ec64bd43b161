use std::time::{Duration, Instant};

/// Owned handle for the session's single pending autosave deadline.
///
/// Arming always replaces the previous deadline, so a session can never
/// accumulate more than one pending save. The timer does not fire by
/// itself; hosts check [`is_due`](Self::is_due) from their event loop and
/// the session cancels the deadline when it acts on it.
#[derive(Debug, Clone, Default)]
pub struct AutosaveTimer {
    deadline: Option<Instant>,
}

impl AutosaveTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule (or reschedule) the deadline `quiet` from `now`.
    pub fn arm(&mut self, now: Instant, quiet: Duration) {
        self.deadline = Some(now + quiet);
    }

    /// Drop any pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once the quiet interval has elapsed. The deadline stays set
    /// until `cancel` or a re-`arm`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
