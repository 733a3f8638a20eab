//! # Edit-Idle Scheduler
//!
//! Keeps reflow and history snapshots from running mid-keystroke. Every
//! edit marks the user as typing and restarts two timers:
//!
//! - *typing stopped* (500 ms): clears the typing flag
//! - *overflow check* (1000 ms): asks for a reflow of the edited page, but
//!   only if the user is no longer typing when it fires
//!
//! New input before either timer fires restarts both. Time is passed in by
//! the caller, so the scheduler is a plain state machine that a driver
//! polls at [`IdleScheduler::next_deadline`].

use crate::config::IdleConfig;
use crate::page_manager::EditOrigin;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleSignal {
    /// Input has paused long enough to count as not typing
    TypingStopped,

    /// The edit burst that started at `origin` has settled
    CheckOverflow(EditOrigin),
}

#[derive(Debug, Clone)]
pub struct IdleScheduler {
    config: IdleConfig,
    last_input_time: Option<Instant>,
    is_typing: bool,
    typing_deadline: Option<Instant>,
    overflow_deadline: Option<Instant>,
    origin: Option<EditOrigin>,
}

impl IdleScheduler {
    pub fn new(config: IdleConfig) -> Self {
        Self {
            config,
            last_input_time: None,
            is_typing: false,
            typing_deadline: None,
            overflow_deadline: None,
            origin: None,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn last_input_time(&self) -> Option<Instant> {
        self.last_input_time
    }

    /// Origin of the most recent edit still waiting for an overflow check
    pub fn pending_origin(&self) -> Option<EditOrigin> {
        self.overflow_deadline.and(self.origin)
    }

    /// Note an edit at `now`, restarting both timers
    pub fn record_input(&mut self, now: Instant, origin: EditOrigin) {
        self.last_input_time = Some(now);
        self.is_typing = true;
        self.origin = Some(origin);
        self.typing_deadline = Some(now + self.config.typing_stopped());
        self.overflow_deadline = Some(now + self.config.overflow_check());
    }

    /// Earliest pending timer
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.typing_deadline, self.overflow_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire every timer due at `now`, earliest first
    pub fn poll(&mut self, now: Instant) -> Vec<IdleSignal> {
        let mut signals = Vec::new();

        loop {
            let typing_due = self.typing_deadline.filter(|d| *d <= now);
            let overflow_due = self.overflow_deadline.filter(|d| *d <= now);

            match (typing_due, overflow_due) {
                (Some(typing), Some(overflow)) if typing <= overflow => {
                    self.fire_typing_stopped(&mut signals)
                }
                (Some(_), None) => self.fire_typing_stopped(&mut signals),
                (_, Some(_)) => self.fire_overflow_check(&mut signals),
                (None, None) => break,
            }
        }

        signals
    }

    fn fire_typing_stopped(&mut self, signals: &mut Vec<IdleSignal>) {
        self.typing_deadline = None;
        self.is_typing = false;
        signals.push(IdleSignal::TypingStopped);
    }

    fn fire_overflow_check(&mut self, signals: &mut Vec<IdleSignal>) {
        self.overflow_deadline = None;
        if self.is_typing {
            return;
        }
        if let Some(origin) = self.origin.take() {
            signals.push(IdleSignal::CheckOverflow(origin));
        }
    }

    /// Cancel pending timers, e.g. after the document was replaced
    pub fn reset(&mut self) {
        self.is_typing = false;
        self.typing_deadline = None;
        self.overflow_deadline = None;
        self.origin = None;
    }
}

impl Default for IdleScheduler {
    fn default() -> Self {
        Self::new(IdleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PageId;
    use std::time::Duration;

    const ORIGIN: EditOrigin = EditOrigin::Page(PageId(0));

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_idle_sequence() {
        let start = Instant::now();
        let mut scheduler = IdleScheduler::default();
        scheduler.record_input(start, ORIGIN);
        assert!(scheduler.is_typing());
        assert_eq!(scheduler.next_deadline(), Some(start + ms(500)));

        assert!(scheduler.poll(start + ms(499)).is_empty());
        assert_eq!(scheduler.poll(start + ms(500)), vec![IdleSignal::TypingStopped]);
        assert!(!scheduler.is_typing());
        assert_eq!(scheduler.next_deadline(), Some(start + ms(1000)));

        assert_eq!(
            scheduler.poll(start + ms(1000)),
            vec![IdleSignal::CheckOverflow(ORIGIN)]
        );
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_late_poll_fires_in_order() {
        let start = Instant::now();
        let mut scheduler = IdleScheduler::default();
        scheduler.record_input(start, ORIGIN);

        assert_eq!(
            scheduler.poll(start + ms(5000)),
            vec![IdleSignal::TypingStopped, IdleSignal::CheckOverflow(ORIGIN)]
        );
    }

    #[test]
    fn test_new_input_restarts_timers() {
        let start = Instant::now();
        let mut scheduler = IdleScheduler::default();
        scheduler.record_input(start, ORIGIN);
        scheduler.record_input(start + ms(900), EditOrigin::Page(PageId(1)));

        assert!(scheduler.poll(start + ms(1000)).is_empty());
        assert!(scheduler.is_typing());
        assert_eq!(
            scheduler.poll(start + ms(1900)),
            vec![
                IdleSignal::TypingStopped,
                IdleSignal::CheckOverflow(EditOrigin::Page(PageId(1)))
            ]
        );
    }

    #[test]
    fn test_overflow_check_skipped_while_typing() {
        let config = IdleConfig {
            typing_stopped_ms: 800,
            overflow_check_ms: 300,
        };
        let start = Instant::now();
        let mut scheduler = IdleScheduler::new(config);
        scheduler.record_input(start, ORIGIN);

        assert!(scheduler.poll(start + ms(300)).is_empty());
        assert_eq!(scheduler.poll(start + ms(800)), vec![IdleSignal::TypingStopped]);
        assert_eq!(scheduler.pending_origin(), None);
    }

    #[test]
    fn test_reset_cancels_timers() {
        let start = Instant::now();
        let mut scheduler = IdleScheduler::default();
        scheduler.record_input(start, ORIGIN);
        scheduler.reset();
        assert_eq!(scheduler.next_deadline(), None);
        assert!(scheduler.poll(start + ms(2000)).is_empty());
    }
}
