//! Scroll coordinator: decides whether the viewport follows new output.
//!
//! Distances are in rows below the bottom edge of the viewport. A viewer
//! close enough to the bottom keeps following; one who scrolled up is left
//! alone and told that new content is waiting below.

/// Follow state of one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    /// Whether appends move the viewport to the bottom.
    pub follow_enabled: bool,
    /// Rows between the viewport's bottom edge and the end of content.
    pub last_known_distance_from_bottom: usize,
    /// Whether content arrived below a viewport that did not follow.
    pub has_unseen_content: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            follow_enabled: true,
            last_known_distance_from_bottom: 0,
            has_unseen_content: false,
        }
    }
}

/// What the viewport should do after an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    /// Move the viewport to the new bottom.
    ScrollToBottom,
    /// Leave the viewport; surface a "new content below" affordance.
    ShowNewContentBelow,
}

/// Follow/hold decisions for one viewport.
#[derive(Debug, Clone)]
pub struct ScrollCoordinator {
    threshold: usize,
    state: ScrollState,
}

impl ScrollCoordinator {
    /// Create a coordinator following output while closer than
    /// `threshold` rows to the bottom.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            state: ScrollState::default(),
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> ScrollState {
        self.state
    }

    /// Record a viewer scroll that left the viewport `distance` rows above
    /// the bottom.
    pub const fn on_scroll(&mut self, distance_from_bottom: usize) {
        self.state.last_known_distance_from_bottom = distance_from_bottom;
        self.state.follow_enabled = distance_from_bottom < self.threshold;
        if self.state.follow_enabled {
            self.state.has_unseen_content = false;
        }
    }

    /// Record that `rows_added` rows were appended below.
    pub const fn on_append(&mut self, rows_added: usize) -> ScrollAction {
        if self.state.follow_enabled {
            self.state.last_known_distance_from_bottom = 0;
            ScrollAction::ScrollToBottom
        } else {
            self.state.last_known_distance_from_bottom += rows_added;
            self.state.has_unseen_content = true;
            ScrollAction::ShowNewContentBelow
        }
    }

    /// "Jump to latest": follow again and scroll to the bottom once.
    pub const fn jump_to_latest(&mut self) -> ScrollAction {
        self.state.follow_enabled = true;
        self.state.last_known_distance_from_bottom = 0;
        self.state.has_unseen_content = false;
        ScrollAction::ScrollToBottom
    }
}
