//! Streaming Demo: bursty model output revealed at a steady cadence.
//!
//! A simulated upstream emits tokens in irregular bursts, with an inline
//! reasoning span split across tokens. The engine strips the reasoning
//! into its own channel and paces the answer at 100 graphemes/s.
//!
//! Run with `cargo run --example streaming_demo`.

use docai_stream::{
    Engine, EngineConfig, PacingConfig, PrinterOptions, SessionRequest, SlotId, SnapshotPrinter,
    TranscriptView,
};
use std::io::{self, IsTerminal, Read};
use std::thread;
use std::time::{Duration, Instant};

/// Sample model output, reasoning inline.
const SAMPLE_TEXT: &str = "<think>The user asks about the Q3 filing. Section 4 covers \
revenue; the appendix has the regional split.</think>Revenue for Q3 rose 12% year on \
year, driven mostly by the EMEA region.\n\nThe appendix breaks this down further: \
EMEA grew 21%, the Americas 8%, and APAC was flat. Operating costs held steady, so \
most of the revenue growth reached the operating margin.\n";

/// Upstream that delivers SSE records in irregular bursts.
struct BurstySource {
    records: Vec<Vec<u8>>,
    next: usize,
}

impl BurstySource {
    fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut records = Vec::new();
        let mut index = 0;
        while index < chars.len() {
            // Pseudo-random 1-3 char tokens.
            let end = (index + (index * 7) % 3 + 1).min(chars.len());
            let token: String = chars[index..end].iter().collect();
            let json = serde_json::json!({ "type": "content", "content": token });
            records.push(format!("data: {json}\n\n").into_bytes());
            index = end;
        }
        records.push(b"data: {\"type\":\"done\"}\n\n".to_vec());
        Self { records, next: 0 }
    }
}

impl Read for BurstySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(record) = self.records.get(self.next) else {
            return Ok(0);
        };
        // Every 20th token the upstream stalls, then floods.
        if self.next % 20 == 0 {
            thread::sleep(Duration::from_millis(250));
        }
        let len = record.len().min(buf.len());
        buf[..len].copy_from_slice(&record[..len]);
        self.next += 1;
        Ok(len)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig {
        pacing: PacingConfig {
            interval: Duration::from_millis(10),
            graphemes_per_tick: 1,
        },
        ..EngineConfig::default()
    };

    let mut engine = Engine::with_config(config.clone())?;
    let snapshots = engine.subscribe();
    let mut view = TranscriptView::new(60, 8, &config);
    let stdout = io::stdout();
    let mut printer = SnapshotPrinter::new(
        stdout.lock(),
        PrinterOptions {
            show_reasoning: true,
            styled: stdout.is_terminal(),
        },
    );

    let started = Instant::now();
    let id = engine.start(
        SessionRequest::new(SlotId(1), "How did Q3 revenue develop?"),
        BurstySource::new(SAMPLE_TEXT),
    )?;

    while !engine.is_idle() {
        engine.step(Duration::from_millis(10));
        for snapshot in snapshots.try_iter() {
            printer.print(&snapshot)?;
            view.apply(&snapshot);
        }
    }

    let state = engine.controller().session(id).map(|s| s.state());
    println!();
    println!("state: {state:?}, elapsed: {:.2?}", started.elapsed());
    println!(
        "transcript: {} rows at width {}, following: {}",
        view.transcript().row_count(),
        view.transcript().width(),
        view.scroll_state().follow_enabled
    );
    Ok(())
}
