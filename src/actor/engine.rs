//! Engine: the coordinating loop that ties the actors together.
//!
//! The Engine is the entry point for applications. It owns the
//! [`SessionController`], spawns one source actor per session plus a
//! ticker, and multiplexes their channels in [`Engine::step`]. Every
//! controller call happens on the thread driving the engine, so session
//! state needs no locking.

use super::messages::{Command, SourceMessage};
use super::source::SourceActor;
use super::ticker::{Tick, TickerActor};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::protocol::StreamEvent;
use crate::session::{Dispatch, SessionController, SessionId, SessionRequest, SessionSnapshot};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::io::Read;
use std::time::{Duration, Instant};

/// Idle wait of [`Engine::run`] between checks for shutdown.
const RUN_POLL: Duration = Duration::from_millis(50);

/// What one [`Engine::step`] woke up for.
enum Wake {
    Source(SourceMessage),
    Command(Command),
    Tick(Tick),
    Timeout,
}

/// The streaming engine.
pub struct Engine {
    config: EngineConfig,
    controller: SessionController,
    source_tx: Sender<SourceMessage>,
    source_rx: Receiver<SourceMessage>,
    command_tx: Sender<Command>,
    command_rx: Receiver<Command>,
    ticker: TickerActor,
    /// Live source threads by session.
    sources: HashMap<SessionId, SourceActor>,
    running: bool,
}

impl Engine {
    /// Create an engine with default configuration.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let (source_tx, source_rx) = bounded(config.channel_capacity.max(1));
        let (command_tx, command_rx) = unbounded();
        let ticker = TickerActor::spawn(config.pacing.interval)?;
        let controller = SessionController::new(&config);

        tracing::debug!(
            interval_ms = config.pacing.interval.as_millis(),
            graphemes = config.pacing.graphemes_per_tick,
            "engine started"
        );

        Ok(Self {
            config,
            controller,
            source_tx,
            source_rx,
            command_tx,
            command_rx,
            ticker,
            sources: HashMap::new(),
            running: true,
        })
    }

    /// Active configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The session controller, for queries.
    pub const fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Subscribe to snapshots of every session.
    pub fn subscribe(&mut self) -> Receiver<SessionSnapshot> {
        self.controller.subscribe()
    }

    /// Sender for control commands from other threads.
    pub fn commands(&self) -> Sender<Command> {
        self.command_tx.clone()
    }

    /// Whether the engine has not been told to shut down.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the engine loop.
    pub const fn stop(&mut self) {
        self.running = false;
    }

    /// Start a session reading its event stream from `reader`.
    ///
    /// The slot's previous session, if still active, is superseded and its
    /// source told to stop. If the source thread cannot be spawned the new
    /// session fails with the spawn error as its detail.
    pub fn start<R>(
        &mut self,
        request: SessionRequest,
        reader: R,
    ) -> Result<SessionId, EngineError>
    where
        R: Read + Send + 'static,
    {
        if let Some(previous) = self.controller.current_session(request.slot) {
            self.stop_source(previous);
        }

        let now = Instant::now();
        let id = self.controller.start(request, now);
        match SourceActor::spawn(id, reader, self.source_tx.clone()) {
            Ok(actor) => {
                self.sources.insert(id, actor);
                Ok(id)
            }
            Err(e) => {
                self.controller
                    .on_event(id, StreamEvent::Failed(e.to_string()), now);
                Err(e)
            }
        }
    }

    /// Viewer abort. Returns whether the session changed.
    pub fn cancel(&mut self, id: SessionId) -> bool {
        self.stop_source(id);
        self.controller.cancel(id)
    }

    /// Feed an event directly, bypassing source threads.
    ///
    /// For callers that run their own transport.
    pub fn dispatch(&mut self, id: SessionId, event: StreamEvent) -> Dispatch {
        let now = Instant::now();
        let dispatch = self.controller.on_event(id, event, now);
        self.controller.tick(now);
        dispatch
    }

    /// Wait up to `timeout` for one source event, command or tick and
    /// handle it.
    ///
    /// A timeout still polls the pacers, so callers may pass the time to
    /// [`SessionController::next_deadline`] as `timeout`. Returns whether
    /// anything woke the loop before the timeout.
    pub fn step(&mut self, timeout: Duration) -> bool {
        let wake = select! {
            recv(self.source_rx) -> msg => msg.map_or(Wake::Timeout, Wake::Source),
            recv(self.command_rx) -> cmd => cmd.map_or(Wake::Timeout, Wake::Command),
            recv(self.ticker.receiver()) -> tick => tick.map_or(Wake::Timeout, Wake::Tick),
            default(timeout) => Wake::Timeout,
        };
        let woke = !matches!(wake, Wake::Timeout);

        match wake {
            Wake::Source(msg) => self.handle_source(msg),
            Wake::Command(cmd) => self.handle_command(cmd),
            Wake::Tick(tick) => {
                let changed = self.controller.tick(Instant::now());
                if changed > 0 {
                    tracing::trace!(frame = tick.frame, changed, "pacer tick");
                }
            }
            Wake::Timeout => {
                self.controller.tick(Instant::now());
            }
        }
        woke
    }

    /// Whether no source is live and no pacer has work left.
    pub fn is_idle(&self) -> bool {
        self.sources.is_empty() && self.controller.next_deadline().is_none()
    }

    /// Step until idle, shut down, or `timeout` elapses.
    ///
    /// Returns whether the engine became idle.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.running && !self.is_idle() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let mut wait = deadline - now;
            if let Some(due) = self.controller.next_deadline() {
                wait = wait.min(due.saturating_duration_since(now));
            }
            self.step(wait);
        }
        self.is_idle()
    }

    /// Step until a [`Command::Shutdown`] arrives or [`Engine::stop`] is
    /// called.
    pub fn run(&mut self) {
        while self.running {
            let wait = self
                .controller
                .next_deadline()
                .map_or(RUN_POLL, |due| due.saturating_duration_since(Instant::now()));
            self.step(wait.min(RUN_POLL));
        }
    }

    fn handle_source(&mut self, msg: SourceMessage) {
        match msg {
            SourceMessage::Event { session, event } => {
                let now = Instant::now();
                self.controller.on_event(session, event, now);
                // Text arriving into an idle queue shows without waiting
                // for the next tick.
                self.controller.tick(now);
            }
            SourceMessage::Closed { session } => {
                if let Some(actor) = self.sources.remove(&session) {
                    actor.join();
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Cancel(id) => {
                self.cancel(id);
            }
            Command::Shutdown => {
                tracing::debug!("engine shutdown requested");
                self.running = false;
            }
        }
    }

    /// Detach a session's source. The thread exits at its next read
    /// boundary; its remaining messages are ignored.
    fn stop_source(&mut self, id: SessionId) {
        if let Some(actor) = self.sources.remove(&id) {
            tracing::debug!(session = %actor.session(), "stopping source");
            actor.shutdown();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        for actor in self.sources.values() {
            actor.shutdown();
        }
        self.ticker.shutdown();
    }
}
