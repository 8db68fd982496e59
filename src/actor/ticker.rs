//! Ticker Actor: dedicated thread generating pacer ticks.
//!
//! The ticker provides the cadence at which the engine polls session
//! pacers. It decouples timing from source delivery so that a stalled
//! upstream never stalls reveal of already queued text.

use crate::error::EngineError;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const THREAD_NAME: &str = "docai-pacer";

/// A tick event sent at regular intervals.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// Tick number, counting ticks skipped while the receiver was behind.
    pub frame: u64,
}

/// Ticker actor that generates regular timing events.
pub struct TickerActor {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    tick_rx: Receiver<Tick>,
}

impl TickerActor {
    /// Spawn a ticker firing every `interval`.
    pub fn spawn(interval: Duration) -> Result<Self, EngineError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        // Ticks must not queue up behind a slow loop.
        let (tick_tx, tick_rx) = bounded(2);

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || Self::run_loop(&tick_tx, &shutdown_clone, interval))
            .map_err(|source| EngineError::Spawn {
                name: THREAD_NAME.to_string(),
                source,
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            tick_rx,
        })
    }

    /// The tick receiver, for use with `select!`.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<Tick> {
        &self.tick_rx
    }

    /// Signal the ticker to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Shut down and wait for the ticker thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop(tick_tx: &Sender<Tick>, shutdown: &AtomicBool, interval: Duration) {
        let mut frame = 0u64;
        let mut next_tick = Instant::now() + interval;

        while !shutdown.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now < next_tick {
                thread::sleep((next_tick - now).min(Duration::from_millis(1)));
                continue;
            }

            // Full buffer: the loop is behind, skip this tick.
            if let Err(crossbeam_channel::TrySendError::Disconnected(_)) =
                tick_tx.try_send(Tick { frame })
            {
                break;
            }

            frame += 1;
            next_tick += interval;
            if next_tick < now {
                next_tick = now + interval;
            }
        }
        tracing::trace!(frames = frame, "ticker stopped");
    }
}

impl Drop for TickerActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
