//! One-shot timers owned by a single view.
//!
//! Timers are driven by the event loop passing the current [`Instant`] to
//! [`ViewTimers::take_due`]. A view cancels its timers when it is torn
//! down, so nothing fires against a view that is gone.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Stands in for the acknowledgement of an outbound connection request.
    ConnectionComplete,
    ToastDismiss,
}

#[derive(Debug, Default)]
pub struct ViewTimers {
    pending: Vec<(TimerKind, Instant)>,
}

impl ViewTimers {
    /// Arms a timer, replacing any pending timer of the same kind.
    pub fn schedule(&mut self, kind: TimerKind, now: Instant, delay: Duration) {
        self.cancel(kind);
        self.pending.push((kind, now + delay));
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.pending.retain(|(k, _)| *k != kind);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|(k, _)| *k == kind)
    }

    /// Removes and returns every timer whose deadline has passed, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due: Vec<(TimerKind, Instant)> = Vec::new();
        self.pending.retain(|(kind, deadline)| {
            if *deadline <= now {
                due.push((*kind, *deadline));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(_, deadline)| *deadline);
        due.into_iter().map(|(kind, _)| kind).collect()
    }

    /// Time until the earliest deadline, for sizing the event poll timeout.
    pub fn next_deadline_in(&self, now: Instant) -> Option<Duration> {
        self.pending
            .iter()
            .map(|(_, deadline)| deadline.saturating_duration_since(now))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_only_after_deadline() {
        let start = Instant::now();
        let mut timers = ViewTimers::default();
        timers.schedule(TimerKind::ToastDismiss, start, Duration::from_secs(3));

        assert!(timers.take_due(start + Duration::from_secs(2)).is_empty());
        assert_eq!(
            timers.take_due(start + Duration::from_secs(3)),
            vec![TimerKind::ToastDismiss]
        );
        // One-shot
        assert!(timers.take_due(start + Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_reschedule_replaces() {
        let start = Instant::now();
        let mut timers = ViewTimers::default();
        timers.schedule(TimerKind::ToastDismiss, start, Duration::from_secs(3));
        timers.schedule(
            TimerKind::ToastDismiss,
            start + Duration::from_secs(2),
            Duration::from_secs(3),
        );
        assert!(timers.take_due(start + Duration::from_secs(4)).is_empty());
        assert_eq!(timers.take_due(start + Duration::from_secs(5)).len(), 1);
    }

    #[test]
    fn test_cancel_all_prevents_firing() {
        let start = Instant::now();
        let mut timers = ViewTimers::default();
        timers.schedule(TimerKind::ConnectionComplete, start, Duration::from_secs(6));
        timers.schedule(TimerKind::ToastDismiss, start, Duration::from_secs(3));
        timers.cancel_all();
        assert!(!timers.is_pending(TimerKind::ConnectionComplete));
        assert!(timers.take_due(start + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn test_due_timers_come_back_in_deadline_order() {
        let start = Instant::now();
        let mut timers = ViewTimers::default();
        timers.schedule(TimerKind::ConnectionComplete, start, Duration::from_secs(6));
        timers.schedule(TimerKind::ToastDismiss, start, Duration::from_secs(3));
        assert_eq!(
            timers.next_deadline_in(start),
            Some(Duration::from_secs(3))
        );
        assert_eq!(
            timers.take_due(start + Duration::from_secs(7)),
            vec![TimerKind::ToastDismiss, TimerKind::ConnectionComplete]
        );
    }
}
