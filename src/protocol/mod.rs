//! Upstream stream protocol.
//!
//! The chat backend relays model output as Server-Sent Events whose
//! `data:` payloads are `{type, content}` records:
//!
//! | `type`     | event                           |
//! |------------|---------------------------------|
//! | `thinking` | [`StreamEvent::ReasoningDelta`] |
//! | `content`  | [`StreamEvent::AnswerDelta`]    |
//! | `done`     | [`StreamEvent::Completed`]      |
//! | `error`    | [`StreamEvent::Failed`]         |
//!
//! Raw chat-completion chunks and the `[DONE]` sentinel are accepted too.

mod event;
mod sse;

pub use event::StreamEvent;
pub use sse::SseDecoder;
