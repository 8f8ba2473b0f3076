//! Single-shot deferred actions.
//!
//! A `Debounce` only tracks a deadline. Whoever drives the event loop asks for
//! `deadline()` and calls `fire_if_due()` when it wakes up.

use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Start the timer, or restart it if already pending.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns true exactly once per scheduled deadline that has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reschedule_pushes_deadline() {
        let start = Instant::now();
        let mut timer = Debounce::new(Duration::from_millis(150));

        timer.schedule(start);
        timer.schedule(start + Duration::from_millis(100));

        assert!(!timer.fire_if_due(start + Duration::from_millis(200)));
        assert!(timer.fire_if_due(start + Duration::from_millis(250)));
        assert!(!timer.fire_if_due(start + Duration::from_millis(400)));
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut timer = Debounce::new(Duration::from_millis(10));
        timer.schedule(start);
        timer.cancel();
        assert!(!timer.fire_if_due(start + Duration::from_secs(1)));
        assert_eq!(timer.deadline(), None);
    }
}
