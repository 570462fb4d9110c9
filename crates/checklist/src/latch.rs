use std::time::{Duration, Instant};

pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Blocks overlapping step transitions. A latch that is never released
/// frees itself once `timeout` has elapsed.
#[derive(Debug, Clone)]
pub struct NavigationLatch {
    started_at: Option<Instant>,
    timeout: Duration,
}

impl Default for NavigationLatch {
    fn default() -> Self {
        Self::new(NAVIGATION_TIMEOUT)
    }
}

impl NavigationLatch {
    pub fn new(timeout: Duration) -> Self {
        Self {
            started_at: None,
            timeout,
        }
    }

    /// Takes the latch. Returns false while an earlier transition still holds it.
    pub fn try_begin(&mut self, now: Instant) -> bool {
        if self.is_active(now) {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.started_at
            .is_some_and(|started| now.saturating_duration_since(started) < self.timeout)
    }

    pub fn release(&mut self) {
        self.started_at = None;
    }
}
