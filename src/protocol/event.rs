//! Stream events and their wire encoding.

use serde::Deserialize;

/// One event delivered by a stream source.
///
/// A closed set: every source encoding is mapped onto these four kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Reasoning text labelled as such by the transport.
    ReasoningDelta(String),
    /// Answer text, which may still carry inline reasoning markers.
    AnswerDelta(String),
    /// The stream ended normally.
    Completed,
    /// The stream failed; carries the error detail.
    Failed(String),
}

impl StreamEvent {
    /// Whether this event ends the stream.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }

    /// Short kind label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ReasoningDelta(_) => "reasoning-delta",
            Self::AnswerDelta(_) => "answer-delta",
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
        }
    }
}

/// `{type, content}` record as relayed by the chat backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum WireRecord {
    Thinking {
        #[serde(default)]
        content: String,
    },
    Content {
        #[serde(default)]
        content: String,
    },
    Done {},
    Error {
        #[serde(default)]
        content: String,
    },
}

impl From<WireRecord> for StreamEvent {
    fn from(record: WireRecord) -> Self {
        match record {
            WireRecord::Thinking { content } => Self::ReasoningDelta(content),
            WireRecord::Content { content } => Self::AnswerDelta(content),
            WireRecord::Done {} => Self::Completed,
            WireRecord::Error { content } => Self::Failed(content),
        }
    }
}

/// Raw chat-completion chunk, as emitted by OpenAI-compatible providers.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    delta: Option<CompletionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CompletionDelta {
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl CompletionChunk {
    /// Events carried by the first choice's delta, reasoning first.
    pub(crate) fn into_events(self) -> Vec<StreamEvent> {
        let Some(delta) = self.choices.into_iter().next().and_then(|c| c.delta) else {
            return Vec::new();
        };

        let mut events = Vec::with_capacity(2);
        let reasoning = delta
            .reasoning
            .filter(|r| !r.is_empty())
            .or(delta.reasoning_content);
        if let Some(reasoning) = reasoning.filter(|r| !r.is_empty()) {
            events.push(StreamEvent::ReasoningDelta(reasoning));
        }
        if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
            events.push(StreamEvent::AnswerDelta(content));
        }
        events
    }
}

/// A decoded `data:` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WirePayload {
    Record(WireRecord),
    Chunk(CompletionChunk),
}

impl WirePayload {
    pub(crate) fn into_events(self) -> Vec<StreamEvent> {
        match self {
            Self::Record(record) => vec![record.into()],
            Self::Chunk(chunk) => chunk.into_events(),
        }
    }
}
