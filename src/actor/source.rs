//! Source Actor: dedicated thread reading one upstream event stream.
//!
//! The actor owns a reader (an HTTP body, a file, stdin), decodes it with
//! an [`SseDecoder`] and forwards every event to the engine loop. It never
//! touches session state; the loop decides what an event means.
//!
//! A blocking read cannot be interrupted. A source told to shut down stops
//! at its next read boundary, and anything it sends meanwhile is ignored by
//! the controller because its session is no longer active.

use super::messages::SourceMessage;
use crate::error::{EngineError, SourceError};
use crate::protocol::{SseDecoder, StreamEvent};
use crate::session::SessionId;
use crossbeam_channel::Sender;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const READ_CHUNK: usize = 4096;

/// Handle to a running source thread.
pub struct SourceActor {
    session: SessionId,
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl SourceActor {
    /// Spawn a thread reading `reader` on behalf of `session`.
    pub fn spawn<R>(
        session: SessionId,
        reader: R,
        sender: Sender<SourceMessage>,
    ) -> Result<Self, EngineError>
    where
        R: Read + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);
        let name = format!("docai-source-{session}");

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                Self::run_loop(session, reader, &sender, &shutdown_clone);
                let _ = sender.send(SourceMessage::Closed { session });
            })
            .map_err(|source| EngineError::Spawn { name, source })?;

        Ok(Self {
            session,
            handle: Some(handle),
            shutdown,
        })
    }

    /// Session this source feeds.
    #[inline]
    pub const fn session(&self) -> SessionId {
        self.session
    }

    /// Signal the thread to stop at its next read boundary.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the thread to finish.
    ///
    /// Only call this once the thread has announced [`SourceMessage::Closed`]
    /// or its reader is known to return.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop<R: Read>(
        session: SessionId,
        mut reader: R,
        sender: &Sender<SourceMessage>,
        shutdown: &AtomicBool,
    ) {
        let mut decoder = SseDecoder::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::debug!(session = %session, "source stopped");
                return;
            }

            let events = match reader.read(&mut buf) {
                Ok(0) => decoder.finish(),
                Ok(n) => decoder.push(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    let error = SourceError::from(e);
                    tracing::warn!(session = %session, error = %error, "source read failed");
                    vec![StreamEvent::Failed(error.to_string())]
                }
            };

            let done = events.iter().any(StreamEvent::is_terminal);
            for event in events {
                if sender.send(SourceMessage::Event { session, event }).is_err() {
                    // Engine gone.
                    return;
                }
            }
            if done {
                return;
            }
        }
    }
}

impl Drop for SourceActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
