//! Transcript: wrapped rows of revealed answer text.
//!
//! Text is laid out into rows of at most `width` display columns. Rows
//! produced by soft wrapping are flagged so the transcript can be rewrapped
//! to a new width without losing hard line breaks.

use std::collections::VecDeque;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// One display row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    /// Row text.
    pub text: String,
    /// Display width of `text` in columns.
    pub width: usize,
    /// Whether the row continues on the next one (soft wrap).
    pub wrapped: bool,
}

impl Row {
    const fn empty() -> Self {
        Self {
            text: String::new(),
            width: 0,
            wrapped: false,
        }
    }
}

/// Row store with bounded scrollback.
#[derive(Debug)]
pub struct Transcript {
    rows: VecDeque<Row>,
    /// Wrap width in columns.
    width: usize,
    /// Maximum rows to retain.
    max_rows: usize,
}

impl Transcript {
    /// Create a transcript wrapping at `width` columns.
    pub fn new(width: usize, max_rows: usize) -> Self {
        let mut rows = VecDeque::with_capacity(max_rows.min(1024));
        rows.push_back(Row::empty());
        Self {
            rows,
            width: width.max(1),
            max_rows: max_rows.max(1),
        }
    }

    /// Number of rows, including the row being appended to.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Wrap width.
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Get a row by index from the top.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Append text, returning how many rows were added.
    pub fn append(&mut self, text: &str) -> usize {
        let before = self.rows.len();
        let mut trimmed = 0;

        for grapheme in text.graphemes(true) {
            match grapheme {
                "\n" | "\r\n" => trimmed += self.newline(false),
                "\r" => {}
                "\t" => {
                    let spaces = 4 - (self.current().width % 4);
                    for _ in 0..spaces {
                        trimmed += self.push_grapheme(" ");
                    }
                }
                g => trimmed += self.push_grapheme(g),
            }
        }

        (self.rows.len() + trimmed).saturating_sub(before)
    }

    /// Rows `[start, start + height)` from the top.
    pub fn rows(&self, start: usize, height: usize) -> impl Iterator<Item = &Row> {
        let end = (start + height).min(self.rows.len());
        let start = start.min(end);
        self.rows.range(start..end)
    }

    /// Re-layout everything at a new width.
    pub fn rewrap(&mut self, width: usize) {
        let width = width.max(1);
        if width == self.width {
            return;
        }

        let mut logical: Vec<String> = Vec::new();
        let mut current = String::new();
        for row in &self.rows {
            current.push_str(&row.text);
            if !row.wrapped {
                logical.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() || logical.is_empty() {
            logical.push(current);
        }

        self.width = width;
        self.rows.clear();
        self.rows.push_back(Row::empty());
        let last = logical.len() - 1;
        for (i, line) in logical.iter().enumerate() {
            for grapheme in line.graphemes(true) {
                self.push_grapheme(grapheme);
            }
            if i < last {
                self.newline(false);
            }
        }
    }

    fn current(&self) -> &Row {
        // Never empty: construction and `rewrap` keep one row.
        &self.rows[self.rows.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Row {
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }

    /// Push a grapheme, soft-wrapping first if it does not fit. Returns the
    /// number of rows trimmed from the top.
    fn push_grapheme(&mut self, grapheme: &str) -> usize {
        let width = UnicodeWidthStr::width(grapheme);
        let mut trimmed = 0;
        if self.current().width + width > self.width && self.current().width > 0 {
            self.current_mut().wrapped = true;
            trimmed += self.newline(true);
        }
        let row = self.current_mut();
        row.text.push_str(grapheme);
        row.width += width;
        trimmed
    }

    /// Start a new row. Returns the number of rows trimmed from the top.
    fn newline(&mut self, wrapped: bool) -> usize {
        if !wrapped {
            self.current_mut().wrapped = false;
        }
        let mut trimmed = 0;
        while self.rows.len() >= self.max_rows {
            self.rows.pop_front();
            trimmed += 1;
        }
        self.rows.push_back(Row::empty());
        trimmed
    }
}
