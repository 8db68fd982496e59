//! Stream session: per-request state owned by the controller.

use crate::classify::{Classified, ClassifierState, TagClassifier};
use crate::config::{MarkerConfig, PacingConfig};
use crate::protocol::StreamEvent;
use crate::render::{Pacer, RenderQueue};
use bitflags::bitflags;
use std::fmt;
use std::time::Instant;

/// Identifier of one request's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Identifier of a conversation slot. At most one session per slot is
/// active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SlotId(pub u64);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot{}", self.0)
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Receiving events.
    Active,
    /// The stream ended normally.
    Completed,
    /// The stream failed; see the error detail.
    Failed,
    /// Replaced by a newer session on the same slot.
    Superseded,
    /// Aborted by the viewer.
    Cancelled,
}

impl SessionState {
    /// Whether no further events will be applied.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Lowercase label for logs and display.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Superseded => "superseded",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// What changed since the previous snapshot of a session.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SnapshotChanges: u8 {
        /// Reasoning text grew.
        const REASONING = 0b0000_0001;
        /// Visible answer text grew.
        const ANSWER = 0b0000_0010;
        /// State, thinking flag, error detail or finalization changed.
        const STATE = 0b0000_0100;
    }
}

/// Display-ready view of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Session.
    pub session: SessionId,
    /// Slot the session belongs to.
    pub slot: SlotId,
    /// Lifecycle state.
    pub state: SessionState,
    /// All reasoning text so far.
    pub reasoning_text: String,
    /// Answer text revealed so far.
    pub answer_text: String,
    /// Whether the model is currently reasoning.
    pub is_thinking: bool,
    /// Transport error detail, for failed sessions.
    pub error_detail: Option<String>,
    /// Whether pacing has stopped for good.
    pub finalized: bool,
    /// What changed since the previous snapshot.
    pub changes: SnapshotChanges,
}

/// A request to start a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Conversation slot.
    pub slot: SlotId,
    /// The viewer's message, kept with the session record.
    pub prompt: String,
}

impl SessionRequest {
    /// Create a request.
    pub fn new(slot: SlotId, prompt: impl Into<String>) -> Self {
        Self {
            slot,
            prompt: prompt.into(),
        }
    }
}

/// State of one outstanding request.
///
/// `reasoning_text` and `answer_text` only ever grow. Only the
/// classifier's lookahead tail is provisional.
#[derive(Debug)]
pub struct StreamSession {
    id: SessionId,
    slot: SlotId,
    prompt: String,
    state: SessionState,
    classifier: TagClassifier,
    reasoning_text: String,
    answer_text: String,
    queue: RenderQueue,
    pacer: Pacer,
    error_detail: Option<String>,
    is_thinking: bool,
    finalized: bool,
    started_at: Instant,
}

impl StreamSession {
    pub(crate) fn new(
        id: SessionId,
        request: SessionRequest,
        markers: &MarkerConfig,
        pacing: PacingConfig,
        now: Instant,
    ) -> Self {
        Self {
            id,
            slot: request.slot,
            prompt: request.prompt,
            state: SessionState::Active,
            classifier: TagClassifier::new(markers),
            reasoning_text: String::new(),
            answer_text: String::new(),
            queue: RenderQueue::new(),
            pacer: Pacer::new(pacing, now),
            error_detail: None,
            is_thinking: false,
            finalized: false,
            started_at: now,
        }
    }

    /// Session id.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Slot.
    pub const fn slot(&self) -> SlotId {
        self.slot
    }

    /// The viewer's message.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Lifecycle state.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Inline classifier state.
    pub const fn classifier_state(&self) -> ClassifierState {
        self.classifier.state()
    }

    /// Reasoning text so far.
    pub fn reasoning_text(&self) -> &str {
        &self.reasoning_text
    }

    /// Revealed answer text.
    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    /// Answer text classified but not yet revealed.
    pub const fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    /// Transport error detail.
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Whether the model is currently reasoning.
    pub const fn is_thinking(&self) -> bool {
        self.is_thinking
    }

    /// Whether pacing has stopped for good.
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// When the session was started.
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// When the pacer next wants a tick, if it has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.finalized {
            return None;
        }
        if self.queue.is_empty() && !self.state.is_terminal() {
            return None;
        }
        // A stopped pacer still needs one tick to finalize.
        self.pacer.next_due().or(Some(self.started_at))
    }

    /// Build a snapshot carrying `changes`.
    pub fn snapshot(&self, changes: SnapshotChanges) -> SessionSnapshot {
        SessionSnapshot {
            session: self.id,
            slot: self.slot,
            state: self.state,
            reasoning_text: self.reasoning_text.clone(),
            answer_text: self.answer_text.clone(),
            is_thinking: self.is_thinking,
            error_detail: self.error_detail.clone(),
            finalized: self.finalized,
            changes,
        }
    }

    /// Apply a source event. Ignored unless the session is active.
    pub(crate) fn apply_event(&mut self, event: StreamEvent, now: Instant) -> SnapshotChanges {
        if self.state.is_terminal() {
            return SnapshotChanges::empty();
        }

        match event {
            StreamEvent::ReasoningDelta(text) => {
                let mut changes = self.set_thinking(true);
                if !text.is_empty() {
                    self.reasoning_text.push_str(&text);
                    changes |= SnapshotChanges::REASONING;
                }
                changes
            }
            StreamEvent::AnswerDelta(text) => {
                let classified = self.classifier.classify(&text);
                self.merge(classified, now)
            }
            StreamEvent::Completed => self.end(SessionState::Completed, None, now),
            StreamEvent::Failed(detail) => self.end(SessionState::Failed, Some(detail), now),
        }
    }

    /// Advance the pacer.
    pub(crate) fn tick(&mut self, now: Instant) -> SnapshotChanges {
        if self.finalized {
            return SnapshotChanges::empty();
        }

        match self.state {
            SessionState::Active => self.reveal(now),
            SessionState::Completed | SessionState::Failed => {
                let changes = self.reveal(now);
                if self.queue.is_empty() {
                    changes | self.finalize()
                } else {
                    changes
                }
            }
            SessionState::Cancelled | SessionState::Superseded => {
                // The tick after a cancel observes the new state and stops.
                let mut changes = self.flush_queue();
                changes |= self.finalize();
                changes
            }
        }
    }

    /// Viewer abort.
    ///
    /// An active session becomes `Cancelled`: classification stops and
    /// everything already queued is revealed at once. A terminal session
    /// that is still draining has its remainder revealed at once. Anything
    /// else is a no-op.
    pub(crate) fn cancel(&mut self) -> SnapshotChanges {
        if self.finalized {
            return SnapshotChanges::empty();
        }
        match self.state {
            SessionState::Active => {
                self.state = SessionState::Cancelled;
                self.classifier.discard_pending();
                self.pacer.stop();
                let mut changes = SnapshotChanges::STATE | self.set_thinking(false);
                changes |= self.flush_queue();
                changes
            }
            SessionState::Completed | SessionState::Failed => {
                let mut changes = self.flush_queue();
                changes |= self.finalize();
                changes
            }
            SessionState::Cancelled | SessionState::Superseded => SnapshotChanges::empty(),
        }
    }

    /// Replaced by a newer session on the same slot. Visible text stays
    /// as it is; nothing further is classified or revealed.
    pub(crate) fn supersede(&mut self) -> SnapshotChanges {
        if self.state != SessionState::Active {
            return SnapshotChanges::empty();
        }
        self.state = SessionState::Superseded;
        self.classifier.discard_pending();
        self.queue.clear();
        self.set_thinking(false) | self.finalize() | SnapshotChanges::STATE
    }

    fn end(&mut self, state: SessionState, detail: Option<String>, now: Instant) -> SnapshotChanges {
        let flushed = self.classifier.finish();
        let mut changes = self.merge(flushed, now);
        self.state = state;
        self.error_detail = detail;
        changes |= SnapshotChanges::STATE | self.set_thinking(false);
        if self.queue.is_empty() {
            changes |= self.finalize();
        }
        changes
    }

    fn merge(&mut self, classified: Classified, now: Instant) -> SnapshotChanges {
        let mut changes = SnapshotChanges::empty();
        if !classified.reasoning.is_empty() {
            self.reasoning_text.push_str(&classified.reasoning);
            changes |= SnapshotChanges::REASONING;
        }
        if classified.answer_units.is_empty() {
            if self.classifier.is_in_reasoning() {
                changes |= self.set_thinking(true);
            }
        } else {
            self.queue.enqueue(classified.answer_units, now);
            changes |= self.set_thinking(self.classifier.is_in_reasoning());
        }
        changes
    }

    fn reveal(&mut self, now: Instant) -> SnapshotChanges {
        match self.pacer.reveal(&mut self.queue, now) {
            Some(text) if !text.is_empty() => {
                self.answer_text.push_str(&text);
                SnapshotChanges::ANSWER
            }
            _ => SnapshotChanges::empty(),
        }
    }

    fn flush_queue(&mut self) -> SnapshotChanges {
        let rest = self.queue.drain_all();
        if rest.is_empty() {
            SnapshotChanges::empty()
        } else {
            self.answer_text.push_str(&rest);
            SnapshotChanges::ANSWER
        }
    }

    fn finalize(&mut self) -> SnapshotChanges {
        if self.finalized {
            return SnapshotChanges::empty();
        }
        self.pacer.stop();
        self.finalized = true;
        SnapshotChanges::STATE
    }

    fn set_thinking(&mut self, thinking: bool) -> SnapshotChanges {
        if self.is_thinking == thinking {
            SnapshotChanges::empty()
        } else {
            self.is_thinking = thinking;
            SnapshotChanges::STATE
        }
    }
}
