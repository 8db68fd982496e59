//! Terminal output for command-line consumers.
//!
//! [`SnapshotPrinter`] turns a stream of session snapshots into styled,
//! append-only terminal output. Styling goes through `crossterm` and each
//! update is flushed with a single write.

mod output;
mod printer;

pub use output::OutputBuffer;
pub use printer::{PrinterOptions, SnapshotPrinter};
