//! Render queue: classified answer text awaiting display.
//!
//! Enqueueing never blocks and never fails; the queue is bounded only by
//! the size of one model response. Output order is enqueue order.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use unicode_segmentation::UnicodeSegmentation;

/// An indivisible slice of classified answer text.
#[derive(Debug, Clone)]
pub struct RenderUnit {
    /// The text.
    text: String,
    /// Byte offset of the first undisplayed grapheme.
    cursor: usize,
    /// When the unit was enqueued.
    enqueued_at: Instant,
}

impl RenderUnit {
    /// Create a unit enqueued at `enqueued_at`.
    pub fn new(text: String, enqueued_at: Instant) -> Self {
        Self {
            text,
            cursor: 0,
            enqueued_at,
        }
    }

    /// Undisplayed remainder.
    #[inline]
    pub fn remaining(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// When the unit was enqueued.
    #[inline]
    pub const fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    #[inline]
    fn is_spent(&self) -> bool {
        self.cursor >= self.text.len()
    }
}

/// FIFO of render units.
#[derive(Debug, Default)]
pub struct RenderQueue {
    units: VecDeque<RenderUnit>,
}

impl RenderQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append units in order. Empty strings are skipped.
    pub fn enqueue<I>(&mut self, units: I, now: Instant)
    where
        I: IntoIterator<Item = String>,
    {
        self.units.extend(
            units
                .into_iter()
                .filter(|text| !text.is_empty())
                .map(|text| RenderUnit::new(text, now)),
        );
    }

    /// Number of units not yet fully displayed.
    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether everything has been displayed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Undisplayed bytes.
    pub fn pending_bytes(&self) -> usize {
        self.units.iter().map(|u| u.remaining().len()).sum()
    }

    /// Undisplayed grapheme clusters.
    pub fn pending_graphemes(&self) -> usize {
        self.units
            .iter()
            .map(|u| u.remaining().graphemes(true).count())
            .sum()
    }

    /// How long the oldest undisplayed unit has been waiting.
    pub fn oldest_age(&self, now: Instant) -> Option<Duration> {
        self.units
            .front()
            .map(|u| now.saturating_duration_since(u.enqueued_at))
    }

    /// Take up to `count` grapheme clusters from the front.
    ///
    /// Returns an empty string if the queue is empty.
    pub fn take_graphemes(&mut self, count: usize) -> String {
        let mut out = String::new();
        let mut left = count;

        while left > 0 {
            let Some(unit) = self.units.front_mut() else {
                break;
            };

            let rest = &unit.text[unit.cursor..];
            let mut taken = 0;
            for (offset, grapheme) in rest.grapheme_indices(true) {
                if left == 0 {
                    break;
                }
                taken = offset + grapheme.len();
                left -= 1;
            }
            out.push_str(&rest[..taken]);
            unit.cursor += taken;

            if unit.is_spent() {
                self.units.pop_front();
            }
        }

        out
    }

    /// Take everything, in order.
    pub fn drain_all(&mut self) -> String {
        let mut out = String::with_capacity(self.pending_bytes());
        for unit in self.units.drain(..) {
            out.push_str(unit.remaining());
        }
        out
    }

    /// Drop everything without displaying it.
    pub fn clear(&mut self) {
        self.units.clear();
    }
}
