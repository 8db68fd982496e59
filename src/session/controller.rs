//! Session controller: owns every session and sequences source events,
//! classification and pacing.
//!
//! The controller is a plain state machine. It never blocks and never
//! spawns; the [`Engine`](crate::Engine) drives it from a single loop.
//! Every visible change is published as a [`SessionSnapshot`] to all
//! subscribers.

use super::stream::{
    SessionId, SessionRequest, SessionSnapshot, SessionState, SlotId, SnapshotChanges,
    StreamSession,
};
use crate::config::{EngineConfig, MarkerConfig, PacingConfig};
use crate::protocol::StreamEvent;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Outcome of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The event was applied to an active session.
    Applied,
    /// The session is unknown or no longer active; the event was dropped.
    Ignored,
}

/// Owner of all stream sessions.
#[derive(Debug)]
pub struct SessionController {
    markers: MarkerConfig,
    pacing: PacingConfig,
    /// Sessions by id, oldest first.
    sessions: BTreeMap<SessionId, StreamSession>,
    /// Current session of each slot.
    slots: HashMap<SlotId, SessionId>,
    next_id: u64,
    subscribers: Vec<Sender<SessionSnapshot>>,
}

impl SessionController {
    /// Create a controller from engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_parts(config.markers.clone(), config.pacing)
    }

    /// Create a controller from markers and pacing.
    pub fn with_parts(markers: MarkerConfig, pacing: PacingConfig) -> Self {
        Self {
            markers,
            pacing,
            sessions: BTreeMap::new(),
            slots: HashMap::new(),
            next_id: 1,
            subscribers: Vec::new(),
        }
    }

    /// Subscribe to snapshots of every session.
    pub fn subscribe(&mut self) -> Receiver<SessionSnapshot> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Start a session for `request`.
    ///
    /// If the slot's current session is still active it is superseded: it
    /// receives no further events and its visible text stays as is.
    pub fn start(&mut self, request: SessionRequest, now: Instant) -> SessionId {
        let slot = request.slot;
        if let Some(previous) = self.slots.get(&slot).copied() {
            self.supersede(previous);
        }

        let id = SessionId(self.next_id);
        self.next_id += 1;

        let session = StreamSession::new(id, request, &self.markers, self.pacing, now);
        self.sessions.insert(id, session);
        self.slots.insert(slot, id);

        tracing::info!(session = %id, slot = %slot, "session started");
        self.publish(id, SnapshotChanges::STATE);
        id
    }

    /// Viewer abort. No-op for unknown or already finished sessions.
    ///
    /// Returns whether anything changed.
    pub fn cancel(&mut self, id: SessionId) -> bool {
        let Some(session) = self.sessions.get_mut(&id) else {
            return false;
        };
        let was_active = session.state() == SessionState::Active;
        let changes = session.cancel();
        if changes.is_empty() {
            return false;
        }
        if was_active {
            tracing::info!(session = %id, "session cancelled");
        }
        self.publish(id, changes);
        true
    }

    /// Route a source event to its session.
    pub fn on_event(&mut self, id: SessionId, event: StreamEvent, now: Instant) -> Dispatch {
        let Some(session) = self.sessions.get_mut(&id) else {
            tracing::debug!(session = %id, kind = event.kind(), "event for unknown session");
            return Dispatch::Ignored;
        };
        if session.state() != SessionState::Active {
            tracing::debug!(
                session = %id,
                state = %session.state(),
                kind = event.kind(),
                "event for inactive session"
            );
            return Dispatch::Ignored;
        }

        let terminal = match &event {
            StreamEvent::Completed => Some(None),
            StreamEvent::Failed(detail) => Some(Some(detail.clone())),
            _ => None,
        };

        let changes = session.apply_event(event, now);

        match terminal {
            Some(None) => tracing::info!(session = %id, "session completed"),
            Some(Some(detail)) => tracing::warn!(session = %id, error = %detail, "session failed"),
            None => {}
        }

        if !changes.is_empty() {
            self.publish(id, changes);
        }
        Dispatch::Applied
    }

    /// Advance every pacer that is due at `now`.
    ///
    /// Returns how many sessions changed.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut changed = Vec::new();
        for (id, session) in &mut self.sessions {
            let due = session.next_deadline().is_some_and(|at| at <= now);
            if !due {
                continue;
            }
            let changes = session.tick(now);
            if !changes.is_empty() {
                if session.is_finalized() {
                    tracing::debug!(session = %id, state = %session.state(), "pacer finished");
                }
                changed.push((*id, changes));
            }
        }

        let count = changed.len();
        for (id, changes) in changed {
            self.publish(id, changes);
        }
        count
    }

    /// Earliest instant at which some pacer wants a tick.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions.values().filter_map(StreamSession::next_deadline).min()
    }

    /// Whether every session has stopped pacing.
    pub fn is_idle(&self) -> bool {
        self.sessions.values().all(StreamSession::is_finalized)
    }

    /// Session by id.
    pub fn session(&self, id: SessionId) -> Option<&StreamSession> {
        self.sessions.get(&id)
    }

    /// Snapshot of a session with no change flags.
    pub fn snapshot(&self, id: SessionId) -> Option<SessionSnapshot> {
        self.sessions
            .get(&id)
            .map(|s| s.snapshot(SnapshotChanges::empty()))
    }

    /// Current session of a slot.
    pub fn current_session(&self, slot: SlotId) -> Option<SessionId> {
        self.slots.get(&slot).copied()
    }

    /// Whether `id` exists and is still receiving events.
    pub fn is_active(&self, id: SessionId) -> bool {
        self.sessions
            .get(&id)
            .is_some_and(|s| s.state() == SessionState::Active)
    }

    /// Number of sessions held, finished records included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are held.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove a finished, fully drained session record.
    pub fn retire(&mut self, id: SessionId) -> Option<StreamSession> {
        let done = self
            .sessions
            .get(&id)
            .is_some_and(|s| s.state().is_terminal() && s.is_finalized());
        if !done {
            return None;
        }
        let session = self.sessions.remove(&id)?;
        if self.slots.get(&session.slot()) == Some(&id) {
            self.slots.remove(&session.slot());
        }
        Some(session)
    }

    fn supersede(&mut self, id: SessionId) {
        let Some(session) = self.sessions.get_mut(&id) else {
            return;
        };
        let changes = session.supersede();
        if !changes.is_empty() {
            tracing::info!(session = %id, slot = %session.slot(), "session superseded");
            self.publish(id, changes);
        }
    }

    fn publish(&mut self, id: SessionId, changes: SnapshotChanges) {
        if self.subscribers.is_empty() {
            return;
        }
        let Some(session) = self.sessions.get(&id) else {
            return;
        };
        let snapshot = session.snapshot(changes);
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MS: Duration = Duration::from_millis(1);

    fn controller() -> SessionController {
        SessionController::with_parts(
            MarkerConfig::default(),
            PacingConfig {
                interval: MS * 10,
                graphemes_per_tick: 1,
            },
        )
    }

    fn answer(text: &str) -> StreamEvent {
        StreamEvent::AnswerDelta(text.to_string())
    }

    /// Tick until no pacer has work left.
    fn run_until_idle(c: &mut SessionController, mut now: Instant) {
        while c.next_deadline().is_some() {
            c.tick(now);
            now += MS * 10;
        }
    }

    #[test]
    fn test_end_to_end_think_scenario() {
        let t0 = Instant::now();
        let mut c = controller();
        let id = c.start(SessionRequest::new(SlotId(1), "q"), t0);

        for fragment in ["Hello ", "<think>reason", "ing here</think> world"] {
            assert_eq!(c.on_event(id, answer(fragment), t0), Dispatch::Applied);
        }
        c.on_event(id, StreamEvent::Completed, t0);
        run_until_idle(&mut c, t0);

        let snap = c.snapshot(id).unwrap();
        assert_eq!(snap.state, SessionState::Completed);
        assert_eq!(snap.reasoning_text, "reasoning here");
        assert_eq!(snap.answer_text, "Hello  world");
        assert!(snap.finalized);
        assert_eq!(snap.error_detail, None);
    }

    #[test]
    fn test_end_to_end_failure_scenario() {
        let t0 = Instant::now();
        let mut c = controller();
        let id = c.start(SessionRequest::new(SlotId(1), "q"), t0);

        c.on_event(id, answer("part one, "), t0);
        c.on_event(id, answer("part two"), t0);
        c.on_event(id, StreamEvent::Failed("connection reset".into()), t0);
        run_until_idle(&mut c, t0);

        let snap = c.snapshot(id).unwrap();
        assert_eq!(snap.state, SessionState::Failed);
        assert_eq!(snap.answer_text, "part one, part two");
        assert_eq!(snap.error_detail.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_supersede_on_same_slot() {
        let t0 = Instant::now();
        let mut c = controller();
        let first = c.start(SessionRequest::new(SlotId(7), "a"), t0);
        c.on_event(first, answer("old text"), t0);
        c.tick(t0);

        let second = c.start(SessionRequest::new(SlotId(7), "b"), t0);
        assert_ne!(first, second);
        assert_eq!(c.current_session(SlotId(7)), Some(second));

        let old = c.snapshot(first).unwrap();
        assert_eq!(old.state, SessionState::Superseded);
        assert_eq!(old.answer_text, "o");

        assert_eq!(c.on_event(first, answer("late"), t0), Dispatch::Ignored);
        run_until_idle(&mut c, t0 + MS * 10);
        assert_eq!(c.snapshot(first).unwrap().answer_text, "o");
    }

    #[test]
    fn test_other_slots_are_independent() {
        let t0 = Instant::now();
        let mut c = controller();
        let a = c.start(SessionRequest::new(SlotId(1), "a"), t0);
        let b = c.start(SessionRequest::new(SlotId(2), "b"), t0);
        assert!(c.is_active(a));
        assert!(c.is_active(b));
    }

    #[test]
    fn test_finished_session_is_not_superseded() {
        let t0 = Instant::now();
        let mut c = controller();
        let first = c.start(SessionRequest::new(SlotId(1), "a"), t0);
        c.on_event(first, answer("abc"), t0);
        c.on_event(first, StreamEvent::Completed, t0);
        c.start(SessionRequest::new(SlotId(1), "b"), t0);

        assert_eq!(c.snapshot(first).unwrap().state, SessionState::Completed);
        run_until_idle(&mut c, t0);
        assert_eq!(c.snapshot(first).unwrap().answer_text, "abc");
    }

    #[test]
    fn test_zero_graphemes_per_tick_still_finalizes() {
        let t0 = Instant::now();
        let mut c = SessionController::with_parts(
            MarkerConfig::default(),
            PacingConfig {
                interval: MS * 10,
                graphemes_per_tick: 0,
            },
        );
        let id = c.start(SessionRequest::new(SlotId(1), "q"), t0);
        c.on_event(id, answer("abc"), t0);
        c.on_event(id, StreamEvent::Completed, t0);

        let mut now = t0;
        for _ in 0..100 {
            if c.next_deadline().is_none() {
                break;
            }
            c.tick(now);
            now += MS * 10;
        }
        let snap = c.snapshot(id).unwrap();
        assert_eq!(snap.answer_text, "abc");
        assert!(snap.finalized);
        assert_eq!(c.next_deadline(), None);
    }

    #[test]
    fn test_cancel_flushes_and_ignores_later_events() {
        let t0 = Instant::now();
        let mut c = controller();
        let id = c.start(SessionRequest::new(SlotId(1), "q"), t0);
        c.on_event(id, answer("already queued"), t0);

        assert!(c.cancel(id));
        let snap = c.snapshot(id).unwrap();
        assert_eq!(snap.state, SessionState::Cancelled);
        assert_eq!(snap.answer_text, "already queued");
        assert!(snap.error_detail.is_none());

        assert_eq!(c.on_event(id, answer(" more"), t0), Dispatch::Ignored);
        assert_eq!(c.tick(t0), 1);
        assert!(c.snapshot(id).unwrap().finalized);
        assert!(!c.cancel(id));
    }

    #[test]
    fn test_unknown_session_is_ignored() {
        let t0 = Instant::now();
        let mut c = controller();
        assert_eq!(c.on_event(SessionId(99), answer("x"), t0), Dispatch::Ignored);
        assert!(!c.cancel(SessionId(99)));
    }

    #[test]
    fn test_subscribers_see_ordered_snapshots() {
        let t0 = Instant::now();
        let mut c = controller();
        let rx = c.subscribe();
        let id = c.start(SessionRequest::new(SlotId(1), "q"), t0);
        c.on_event(id, StreamEvent::ReasoningDelta("r".into()), t0);
        c.on_event(id, answer("hi"), t0);
        c.on_event(id, StreamEvent::Completed, t0);
        run_until_idle(&mut c, t0);

        let snaps: Vec<SessionSnapshot> = rx.try_iter().collect();
        assert!(snaps.len() >= 4);
        assert!(snaps[0].changes.contains(SnapshotChanges::STATE));
        assert!(snaps[1].changes.contains(SnapshotChanges::REASONING));

        let answers: Vec<&str> = snaps
            .iter()
            .filter(|s| s.changes.contains(SnapshotChanges::ANSWER))
            .map(|s| s.answer_text.as_str())
            .collect();
        assert_eq!(answers, vec!["h", "hi"]);

        let last = snaps.last().unwrap();
        assert!(last.finalized);
        assert_eq!(last.state, SessionState::Completed);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let t0 = Instant::now();
        let mut c = controller();
        drop(c.subscribe());
        let keep = c.subscribe();
        c.start(SessionRequest::new(SlotId(1), "q"), t0);
        assert_eq!(c.subscribers.len(), 1);
        assert_eq!(keep.try_iter().count(), 1);
    }

    #[test]
    fn test_retire_only_finished_records() {
        let t0 = Instant::now();
        let mut c = controller();
        let id = c.start(SessionRequest::new(SlotId(1), "q"), t0);
        assert!(c.retire(id).is_none());

        c.on_event(id, StreamEvent::Completed, t0);
        let record = c.retire(id).unwrap();
        assert_eq!(record.prompt(), "q");
        assert!(c.is_empty());
        assert_eq!(c.current_session(SlotId(1)), None);
    }

    #[test]
    fn test_next_deadline_tracks_pacers() {
        let t0 = Instant::now();
        let mut c = controller();
        let id = c.start(SessionRequest::new(SlotId(1), "q"), t0);
        assert_eq!(c.next_deadline(), None);
        c.on_event(id, answer("ab"), t0);
        assert_eq!(c.next_deadline(), Some(t0));
        c.tick(t0);
        assert_eq!(c.next_deadline(), Some(t0 + MS * 10));
    }
}
