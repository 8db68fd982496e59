//! docai-replay: replay a recorded event stream through the engine.
//!
//! Reads Server-Sent Events (`data: {"type": ..., "content": ...}` records)
//! from a file or stdin and prints reasoning and paced answer text as a
//! viewer would see it.
//!
//! Usage:
//!   docai-replay recorded.sse
//!   curl -sN "$BACKEND/chat" | docai-replay --interval-ms 10 --graphemes 2
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use anyhow::Context;
use clap::Parser;
use docai_stream::{
    Engine, EngineConfig, PrinterOptions, SessionRequest, SessionState, SlotId, SnapshotPrinter,
};
use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Replay a recorded reasoning/answer event stream.
#[derive(Parser, Debug)]
#[command(name = "docai-replay", version, about)]
struct Args {
    /// Event stream to replay; stdin when omitted or `-`.
    file: Option<PathBuf>,

    /// Milliseconds between paced reveals.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Grapheme clusters revealed per tick.
    #[arg(long)]
    graphemes: Option<usize>,

    /// Opening reasoning marker.
    #[arg(long)]
    open: Option<String>,

    /// Closing reasoning marker.
    #[arg(long)]
    close: Option<String>,

    /// Do not print reasoning text.
    #[arg(long)]
    hide_reasoning: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = EngineConfig::from_env().context("reading DOCAI_* environment")?;
        if let Some(ms) = self.interval_ms {
            config.pacing.interval = Duration::from_millis(ms);
        }
        if let Some(graphemes) = self.graphemes {
            config.pacing.graphemes_per_tick = graphemes;
        }
        if let Some(open) = &self.open {
            config.markers.open.clone_from(open);
        }
        if let Some(close) = &self.close {
            config.markers.close.clone_from(close);
        }
        config.validate()?;
        Ok(config)
    }

    fn reader(&self) -> anyhow::Result<Box<dyn Read + Send>> {
        match self.file.as_deref() {
            Some(path) if path.as_os_str() != "-" => {
                let file = File::open(path)
                    .with_context(|| format!("opening {}", path.display()))?;
                Ok(Box::new(file))
            }
            _ => Ok(Box::new(io::stdin())),
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config()?;
    let reader = args.reader()?;

    let mut engine = Engine::with_config(config)?;
    let snapshots = engine.subscribe();
    let stdout = io::stdout();
    let mut printer = SnapshotPrinter::new(
        stdout.lock(),
        PrinterOptions {
            show_reasoning: !args.hide_reasoning,
            styled: stdout.is_terminal(),
        },
    );

    let started = Instant::now();
    let id = engine.start(SessionRequest::new(SlotId(0), "replay"), reader)?;

    loop {
        let wait = engine
            .controller()
            .next_deadline()
            .map_or(Duration::from_millis(100), |due| {
                due.saturating_duration_since(Instant::now())
            });
        engine.step(wait);
        for snapshot in snapshots.try_iter() {
            printer.print(&snapshot).context("writing to stdout")?;
        }
        if engine.is_idle() {
            break;
        }
    }

    let state = engine
        .controller()
        .session(id)
        .map_or(SessionState::Failed, |s| s.state());
    tracing::info!(session = %id, state = %state, elapsed = ?started.elapsed(), "replay finished");

    Ok(if state == SessionState::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
