//! Actor Model: message-passing concurrency for the streaming engine.
//!
//! This module implements a small actor system over crossbeam channels:
//! - **Source Actor**: one per session, reads and decodes the upstream stream
//! - **Ticker Actor**: emits the pacing cadence
//! - **Engine Loop**: owns the session controller, handles everything else
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   SourceMessage    ┌──────────────┐
//! │Source Thread │ ─────────────────▶ │              │
//! └──────────────┘                    │              │
//! ┌──────────────┐       Tick         │  Engine Loop │ ──▶ SessionSnapshot
//! │Ticker Thread │ ─────────────────▶ │              │     subscribers
//! └──────────────┘                    │              │
//!        any thread ── Command ─────▶ │              │
//!                                     └──────────────┘
//! ```

mod engine;
mod messages;
mod source;
mod ticker;

pub use engine::Engine;
pub use messages::{Command, SourceMessage};
pub use source::SourceActor;
pub use ticker::{Tick, TickerActor};
