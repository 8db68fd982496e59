//! Message types for actor communication.
//!
//! These enums define the protocol between the source threads, callers on
//! other threads, and the engine loop.

use crate::protocol::StreamEvent;
use crate::session::SessionId;

/// Sent by a source actor to the engine loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMessage {
    /// A decoded event for a session.
    Event {
        /// Session the source belongs to.
        session: SessionId,
        /// The event.
        event: StreamEvent,
    },
    /// The source thread has exited. Always the last message of a source.
    Closed {
        /// Session the source belonged to.
        session: SessionId,
    },
}

impl SourceMessage {
    /// Session this message belongs to.
    pub const fn session(&self) -> SessionId {
        match self {
            Self::Event { session, .. } | Self::Closed { session } => *session,
        }
    }
}

/// Control commands accepted by the engine loop from any thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Viewer abort of one session.
    Cancel(SessionId),
    /// Stop the loop.
    Shutdown,
}
