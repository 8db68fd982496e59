//! Stream sessions and their controller.
//!
//! One [`StreamSession`] exists per outstanding request. The
//! [`SessionController`] owns them all, routes source events, drives the
//! pacers and publishes [`SessionSnapshot`]s.

mod controller;
mod stream;

pub use controller::{Dispatch, SessionController};
pub use stream::{
    SessionId, SessionRequest, SessionSnapshot, SessionState, SlotId, SnapshotChanges,
    StreamSession,
};
