//! Line-oriented printing of session snapshots.
//!
//! Snapshots carry whole texts; the printer remembers how much of each it
//! has written, per session, and emits only the growth. Reasoning is dimmed
//! and answer text is plain. A failure detail is printed inline in red once
//! the session is final. Output moves to a new line whenever it switches
//! channel or session.

use super::output::OutputBuffer;
use crate::session::{SessionId, SessionSnapshot, SessionState};
use crossterm::style::Color;
use std::collections::HashMap;
use std::io::{self, Write};

/// Which channel was written last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Reasoning,
    Answer,
}

/// How much of one session has been printed.
#[derive(Debug, Default)]
struct Progress {
    reasoning: usize,
    answer: usize,
    error_shown: bool,
}

/// Printer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterOptions {
    /// Print reasoning text.
    pub show_reasoning: bool,
    /// Emit ANSI styling.
    pub styled: bool,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self {
            show_reasoning: true,
            styled: true,
        }
    }
}

/// Writes the growth of successive snapshots to a terminal.
#[derive(Debug)]
pub struct SnapshotPrinter<W: Write> {
    out: W,
    buf: OutputBuffer,
    options: PrinterOptions,
    progress: HashMap<SessionId, Progress>,
    /// Session and channel written last, `None` at the start of a line.
    last: Option<(SessionId, Channel)>,
}

impl<W: Write> SnapshotPrinter<W> {
    /// Create a printer writing to `out`.
    pub fn new(out: W, options: PrinterOptions) -> Self {
        Self {
            out,
            buf: OutputBuffer::new(options.styled),
            options,
            progress: HashMap::new(),
            last: None,
        }
    }

    /// Print whatever `snapshot` adds to what was already printed.
    ///
    /// The first snapshot of a session after earlier output starts a new
    /// paragraph.
    pub fn print(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        let id = snapshot.session;
        let mut progress = if let Some(progress) = self.progress.remove(&id) {
            progress
        } else {
            if !self.progress.is_empty() {
                self.buf.plain(if self.last.is_some() { "\n\n" } else { "\n" })?;
                self.last = None;
            }
            Progress::default()
        };

        if self.options.show_reasoning {
            if let Some(new) = grown(&snapshot.reasoning_text, &mut progress.reasoning) {
                self.switch_to(id, Channel::Reasoning)?;
                self.buf.dim(new)?;
            }
        }

        if let Some(new) = grown(&snapshot.answer_text, &mut progress.answer) {
            self.switch_to(id, Channel::Answer)?;
            self.buf.plain(new)?;
        }

        if snapshot.state == SessionState::Failed && snapshot.finalized && !progress.error_shown {
            progress.error_shown = true;
            let detail = snapshot.error_detail.as_deref().unwrap_or("stream failed");
            if self.last.is_some() {
                self.buf.plain("\n")?;
            }
            self.buf.colored(&format!("error: {detail}"), Color::Red)?;
            self.last = Some((id, Channel::Answer));
        }

        if snapshot.finalized && self.last.is_some_and(|(session, _)| session == id) {
            self.buf.plain("\n")?;
            self.last = None;
        }

        self.progress.insert(id, progress);
        self.buf.flush_to(&mut self.out)
    }

    /// Consume the printer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn switch_to(&mut self, session: SessionId, channel: Channel) -> io::Result<()> {
        if self.last.is_some_and(|last| last != (session, channel)) {
            self.buf.plain("\n")?;
        }
        self.last = Some((session, channel));
        Ok(())
    }
}

/// The part of `text` past `shown` bytes, advancing `shown`.
fn grown<'a>(text: &'a str, shown: &mut usize) -> Option<&'a str> {
    let new = text.get(*shown..).filter(|s| !s.is_empty())?;
    *shown = text.len();
    Some(new)
}
