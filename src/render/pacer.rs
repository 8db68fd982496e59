//! Pacer: fixed-cadence reveal of queued answer text.
//!
//! The pacer is decoupled from arrival rate. It reveals a fixed number of
//! grapheme clusters per interval and never bursts to catch up: a pacer
//! that was not polled for a while reveals one increment and re-arms from
//! the current instant.

use super::queue::RenderQueue;
use crate::config::PacingConfig;
use std::time::{Duration, Instant};

/// Per-session pacer.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    graphemes_per_tick: usize,
    /// Earliest instant of the next reveal.
    next_due: Instant,
    /// Set when the session no longer wants paced output.
    stopped: bool,
}

impl Pacer {
    /// Create a pacer whose first reveal is due at `now`.
    ///
    /// At least one grapheme is revealed per tick.
    pub const fn new(config: PacingConfig, now: Instant) -> Self {
        let graphemes_per_tick = if config.graphemes_per_tick == 0 {
            1
        } else {
            config.graphemes_per_tick
        };
        Self {
            interval: config.interval,
            graphemes_per_tick,
            next_due: now,
            stopped: false,
        }
    }

    /// Whether the pacer has been stopped.
    #[inline]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Whether a reveal is due at `now`.
    #[inline]
    pub fn is_due(&self, now: Instant) -> bool {
        !self.stopped && now >= self.next_due
    }

    /// Instant of the next reveal, if running.
    #[inline]
    pub const fn next_due(&self) -> Option<Instant> {
        if self.stopped {
            None
        } else {
            Some(self.next_due)
        }
    }

    /// Reveal the next increment from `queue` if one is due.
    ///
    /// The pacer only re-arms after revealing something, so text arriving
    /// into an idle queue shows up on the next poll.
    pub fn reveal(&mut self, queue: &mut RenderQueue, now: Instant) -> Option<String> {
        if !self.is_due(now) || queue.is_empty() {
            return None;
        }

        let text = queue.take_graphemes(self.graphemes_per_tick);

        self.next_due += self.interval;
        // Behind schedule: re-arm from now instead of bursting.
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }

        Some(text)
    }

    /// Stop pacing. Further reveals return `None`.
    pub const fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn pacing(interval_ms: u64, graphemes: usize) -> PacingConfig {
        PacingConfig {
            interval: MS * u32::try_from(interval_ms).unwrap(),
            graphemes_per_tick: graphemes,
        }
    }

    fn queue_with(text: &str, now: Instant) -> RenderQueue {
        let mut queue = RenderQueue::new();
        queue.enqueue([text.to_string()], now);
        queue
    }

    #[test]
    fn test_reveals_one_increment_per_interval() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(pacing(20, 1), t0);
        let mut queue = queue_with("abc", t0);

        assert_eq!(pacer.reveal(&mut queue, t0).as_deref(), Some("a"));
        // Not yet due.
        assert_eq!(pacer.reveal(&mut queue, t0 + MS * 10), None);
        assert_eq!(pacer.reveal(&mut queue, t0 + MS * 20).as_deref(), Some("b"));
        assert_eq!(pacer.reveal(&mut queue, t0 + MS * 40).as_deref(), Some("c"));
        assert_eq!(pacer.reveal(&mut queue, t0 + MS * 60), None);
    }

    #[test]
    fn test_no_burst_after_stall() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(pacing(20, 1), t0);
        let mut queue = queue_with("abcdef", t0);

        assert_eq!(pacer.reveal(&mut queue, t0).as_deref(), Some("a"));
        let late = t0 + MS * 500;
        assert_eq!(pacer.reveal(&mut queue, late).as_deref(), Some("b"));
        // Re-armed from `late`, not from the missed schedule.
        assert_eq!(pacer.reveal(&mut queue, late + MS), None);
        assert_eq!(pacer.next_due(), Some(late + MS * 20));
    }

    #[test]
    fn test_graphemes_per_tick() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(pacing(10, 3), t0);
        let mut queue = queue_with("abcdefg", t0);
        assert_eq!(pacer.reveal(&mut queue, t0).as_deref(), Some("abc"));
        assert_eq!(pacer.reveal(&mut queue, t0 + MS * 10).as_deref(), Some("def"));
        assert_eq!(pacer.reveal(&mut queue, t0 + MS * 20).as_deref(), Some("g"));
    }

    #[test]
    fn test_zero_graphemes_still_drains() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(pacing(10, 0), t0);
        let mut queue = queue_with("ab", t0);
        assert_eq!(pacer.reveal(&mut queue, t0).as_deref(), Some("a"));
        assert_eq!(pacer.reveal(&mut queue, t0 + MS * 10).as_deref(), Some("b"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_idle_pacer_does_not_rearm() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(pacing(20, 1), t0);
        let mut queue = RenderQueue::new();
        assert_eq!(pacer.reveal(&mut queue, t0 + MS * 100), None);

        queue.enqueue(["x".to_string()], t0 + MS * 105);
        assert_eq!(pacer.reveal(&mut queue, t0 + MS * 105).as_deref(), Some("x"));
    }

    #[test]
    fn test_stopped_pacer_reveals_nothing() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(pacing(20, 1), t0);
        let mut queue = queue_with("abc", t0);
        pacer.stop();
        assert!(pacer.is_stopped());
        assert_eq!(pacer.next_due(), None);
        assert_eq!(pacer.reveal(&mut queue, t0), None);
        assert_eq!(queue.pending_bytes(), 3);
    }
}
