//! `OutputBuffer`: styled output accumulated for a single write.

use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::QueueableCommand;
use std::io::{self, Write};

/// Pre-allocated buffer of text and ANSI styling.
///
/// Everything for one update is accumulated here, then flushed in a single
/// `write()` so that reasoning and answer text never interleave with other
/// output mid-sequence.
#[derive(Debug)]
pub struct OutputBuffer {
    data: Vec<u8>,
    /// Whether ANSI styling is emitted.
    styled: bool,
}

impl OutputBuffer {
    /// Create a buffer with the given capacity.
    pub fn with_capacity(capacity: usize, styled: bool) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            styled,
        }
    }

    /// Create a 4KB buffer.
    pub fn new(styled: bool) -> Self {
        Self::with_capacity(4096, styled)
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Buffer length.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing is buffered.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Plain text.
    pub fn plain(&mut self, text: &str) -> io::Result<()> {
        self.data.queue(Print(text))?;
        Ok(())
    }

    /// Dimmed text.
    pub fn dim(&mut self, text: &str) -> io::Result<()> {
        if !self.styled {
            return self.plain(text);
        }
        self.data
            .queue(SetAttribute(Attribute::Dim))?
            .queue(Print(text))?
            .queue(SetAttribute(Attribute::Reset))?;
        Ok(())
    }

    /// Text in `color`.
    pub fn colored(&mut self, text: &str, color: Color) -> io::Result<()> {
        if !self.styled {
            return self.plain(text);
        }
        self.data
            .queue(SetForegroundColor(color))?
            .queue(Print(text))?
            .queue(ResetColor)?;
        Ok(())
    }

    /// Flush to a writer in a single write and clear.
    pub fn flush_to<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        writer.write_all(&self.data)?;
        writer.flush()?;
        self.data.clear();
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new(true)
    }
}
