//! Incremental Server-Sent Events decoder.
//!
//! Bytes are buffered until a full line is available, so a chunk boundary
//! may fall anywhere: inside a `data:` line, inside its JSON, or inside a
//! multi-byte UTF-8 sequence. A blank line dispatches the accumulated
//! `data:` payload.
//!
//! A line longer than the decoder's limit is dropped whole, so an upstream
//! that never sends a newline cannot grow the buffer without bound.

use super::event::{StreamEvent, WirePayload};

/// Sentinel some providers send instead of a terminal record.
const DONE_SENTINEL: &str = "[DONE]";

/// Default cap on a single line, in bytes (1 MiB).
const MAX_LINE_BYTES: usize = 1 << 20;

/// Decoder state for one stream.
#[derive(Debug)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line.
    line: Vec<u8>,
    /// Longest line kept, in bytes.
    line_limit: usize,
    /// Set while discarding the rest of an over-long line.
    discarding: bool,
    /// `data:` lines of the event being assembled.
    data: Vec<String>,
    /// Set once a terminal event has been decoded.
    finished: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_line_limit(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder dropping lines longer than `limit` bytes.
    pub fn with_line_limit(limit: usize) -> Self {
        Self {
            line: Vec::new(),
            line_limit: limit.max(1),
            discarding: false,
            data: Vec::new(),
            finished: false,
        }
    }

    /// Whether a terminal event has been decoded.
    #[inline]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed raw bytes, returning every event completed by them.
    ///
    /// Nothing is returned after a terminal event.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for &byte in bytes {
            if self.finished {
                break;
            }
            if byte == b'\n' {
                let line = std::mem::take(&mut self.line);
                if !std::mem::take(&mut self.discarding) {
                    self.handle_line(&line, &mut events);
                }
            } else if self.discarding {
                // Skip to the end of the dropped line.
            } else if self.line.len() >= self.line_limit {
                tracing::warn!(limit = self.line_limit, "dropping over-long SSE line");
                self.line = Vec::new();
                self.discarding = true;
            } else {
                self.line.push(byte);
            }
        }
        events
    }

    /// Signal end of input.
    ///
    /// Dispatches any event left without its trailing blank line. If the
    /// stream never carried a terminal record, a closed connection counts
    /// as completion.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        let line = std::mem::take(&mut self.line);
        if !line.is_empty() && !std::mem::take(&mut self.discarding) {
            self.handle_line(&line, &mut events);
        }
        self.dispatch(&mut events);
        if !self.finished {
            self.finished = true;
            events.push(StreamEvent::Completed);
        }
        events
    }

    fn handle_line(&mut self, raw: &[u8], events: &mut Vec<StreamEvent>) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            self.dispatch(events);
            return;
        }

        let line = String::from_utf8_lossy(raw);
        if line.starts_with(':') {
            return;
        }
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.data.push(value.to_string());
        } else {
            tracing::trace!(line = %line, "ignoring non-data SSE line");
        }
    }

    fn dispatch(&mut self, events: &mut Vec<StreamEvent>) {
        if self.data.is_empty() {
            return;
        }
        let payload = self.data.join("\n");
        self.data.clear();

        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            self.emit(StreamEvent::Completed, events);
            return;
        }

        match serde_json::from_str::<WirePayload>(payload) {
            Ok(decoded) => {
                for event in decoded.into_events() {
                    self.emit(event, events);
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "skipping undecodable SSE payload");
            }
        }
    }

    fn emit(&mut self, event: StreamEvent, events: &mut Vec<StreamEvent>) {
        if self.finished {
            return;
        }
        self.finished = event.is_terminal();
        events.push(event);
    }
}
