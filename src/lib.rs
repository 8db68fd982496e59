//! # docai-stream
//!
//! Streaming reasoning/answer pipeline for document-assistant chat.
//!
//! A model's streamed output is split into two channels: reasoning text,
//! delimited by configurable markers such as `<think>` … `</think>`, and the
//! answer shown to the viewer. Answer text is revealed at a fixed cadence,
//! independent of how bursty the upstream is.
//!
//! ## Core Concepts
//!
//! - **Incremental classification**: markers split across fragments are
//!   still detected, with no marker text leaking into either channel
//! - **Paced reveal**: a per-session queue drained one grapheme increment
//!   per tick, never bursting after a stall
//! - **Sessions**: one per request, with start, cancel and supersede
//! - **Actor model**: source and ticker threads feed one coordinating loop
//!
//! ## Example
//!
//! ```rust,no_run
//! use docai_stream::{Engine, EngineConfig, SessionRequest, SlotId};
//! use std::time::Duration;
//!
//! let mut engine = Engine::with_config(EngineConfig::from_env()?)?;
//! let snapshots = engine.subscribe();
//!
//! let body = std::fs::File::open("recorded.sse")?;
//! engine.start(SessionRequest::new(SlotId(1), "Summarise the report"), body)?;
//! engine.run_until_idle(Duration::from_secs(30));
//!
//! for snapshot in snapshots.try_iter() {
//!     println!("{}: {}", snapshot.state, snapshot.answer_text);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod classify;
pub mod config;
pub mod error;
pub mod protocol;
pub mod render;
pub mod session;
pub mod terminal;

// Re-exports for convenience
pub use actor::{Command, Engine};
pub use classify::{Classified, ClassifierState, TagClassifier};
pub use config::{EngineConfig, MarkerConfig, PacingConfig};
pub use error::{ConfigError, EngineError, SourceError};
pub use protocol::{SseDecoder, StreamEvent};
pub use render::{
    Pacer, RenderQueue, ScrollAction, ScrollCoordinator, ScrollState, Transcript, TranscriptView,
};
pub use session::{
    Dispatch, SessionController, SessionId, SessionRequest, SessionSnapshot, SessionState,
    SlotId, SnapshotChanges, StreamSession,
};
pub use terminal::{PrinterOptions, SnapshotPrinter};
