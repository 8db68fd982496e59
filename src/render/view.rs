//! Transcript view: the downstream consumer of session snapshots.
//!
//! The view lays revealed answer text out into rows and keeps a viewport
//! over them. The [`ScrollCoordinator`] decides, on every append, whether
//! the viewport follows the new bottom or holds still.
//!
//! # Usage
//!
//! ```rust
//! use docai_stream::{EngineConfig, TranscriptView};
//!
//! let mut view = TranscriptView::new(40, 10, &EngineConfig::default());
//! view.push("Hello, world");
//! assert!(view.scroll_state().follow_enabled);
//! ```

use super::scroll::{ScrollAction, ScrollCoordinator, ScrollState};
use super::transcript::{Row, Transcript};
use crate::config::EngineConfig;
use crate::session::{SessionId, SessionSnapshot};
use std::collections::HashMap;

/// A viewport over one transcript.
#[derive(Debug)]
pub struct TranscriptView {
    transcript: Transcript,
    scroll: ScrollCoordinator,
    /// Viewport height in rows.
    height: usize,
    /// Bytes of each session's answer text already appended.
    shown: HashMap<SessionId, usize>,
}

impl TranscriptView {
    /// Create a view of `width` × `height` cells.
    pub fn new(width: usize, height: usize, config: &EngineConfig) -> Self {
        Self {
            transcript: Transcript::new(width, config.max_scrollback),
            scroll: ScrollCoordinator::new(config.scroll_threshold_rows),
            height: height.max(1),
            shown: HashMap::new(),
        }
    }

    /// The underlying transcript.
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Scroll-position query.
    pub const fn scroll_state(&self) -> ScrollState {
        self.scroll.state()
    }

    /// Rows below the viewport.
    #[inline]
    pub const fn distance_from_bottom(&self) -> usize {
        self.scroll.state().last_known_distance_from_bottom
    }

    /// Append revealed text.
    ///
    /// Returns what the viewport did, or `None` for empty text.
    pub fn push(&mut self, text: &str) -> Option<ScrollAction> {
        if text.is_empty() {
            return None;
        }
        let rows_added = self.transcript.append(text);
        let action = self.scroll.on_append(rows_added);
        self.clamp();
        Some(action)
    }

    /// Consume a snapshot, appending whatever answer text is new.
    ///
    /// Progress is kept per session, so snapshots of sessions pacing side
    /// by side never repeat text. The first snapshot of a session starts a
    /// new paragraph.
    pub fn apply(&mut self, snapshot: &SessionSnapshot) -> Option<ScrollAction> {
        let mut action = None;
        if !self.shown.is_empty() && !self.shown.contains_key(&snapshot.session) {
            action = self.push("\n\n");
        }

        let shown = self.shown.entry(snapshot.session).or_insert(0);
        let Some(new) = snapshot.answer_text.get(*shown..) else {
            return action;
        };
        *shown = snapshot.answer_text.len();
        self.push(new).or(action)
    }

    /// Viewer scrolled up by `rows`.
    pub fn scroll_up(&mut self, rows: usize) {
        let distance = (self.distance_from_bottom() + rows).min(self.max_distance());
        self.scroll.on_scroll(distance);
    }

    /// Viewer scrolled down by `rows`.
    pub fn scroll_down(&mut self, rows: usize) {
        let distance = self.distance_from_bottom().saturating_sub(rows);
        self.scroll.on_scroll(distance);
    }

    /// "Jump to latest" command.
    pub fn jump_to_latest(&mut self) -> ScrollAction {
        self.scroll.jump_to_latest()
    }

    /// Resize the viewport, rewrapping content to the new width.
    ///
    /// The view returns to the bottom if it was following.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.height = height.max(1);
        self.transcript.rewrap(width);
        if self.scroll.state().follow_enabled {
            self.scroll.jump_to_latest();
        } else {
            self.clamp();
        }
    }

    /// Rows currently inside the viewport, top to bottom.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        let total = self.transcript.row_count();
        let end = total.saturating_sub(self.distance_from_bottom());
        let start = end.saturating_sub(self.height);
        self.transcript.rows(start, end - start)
    }

    fn max_distance(&self) -> usize {
        self.transcript.row_count().saturating_sub(self.height)
    }

    fn clamp(&mut self) {
        let max = self.max_distance();
        if self.distance_from_bottom() > max {
            self.scroll.on_scroll(max);
        }
    }
}
