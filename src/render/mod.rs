//! Render pipeline: the path from classified answer units to visible rows.
//!
//! - [`RenderQueue`] holds classified units in emission order.
//! - [`Pacer`] reveals them at a fixed cadence, a grapheme cluster at a time.
//! - [`Transcript`] lays revealed text out into width-wrapped rows.
//! - [`ScrollCoordinator`] decides whether the viewport follows new rows.
//! - [`TranscriptView`] ties the last two to a stream of session snapshots.

mod pacer;
mod queue;
mod scroll;
mod transcript;
mod view;

pub use pacer::Pacer;
pub use queue::{RenderQueue, RenderUnit};
pub use scroll::{ScrollAction, ScrollCoordinator, ScrollState};
pub use transcript::{Row, Transcript};
pub use view::TranscriptView;
