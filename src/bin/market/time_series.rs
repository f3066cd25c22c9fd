// Per-Tick JSONL Time Series Recorder
// Outputs one JSON line per tick for offline charting

use commodity_market::{DiurnalBand, TickResult};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub hour: u32,
    pub band: DiurnalBand,
    /// corn, flour, oil, biofuel, ingot
    pub prices: [f64; 5],
    pub saved: bool,
}

impl TickSnapshot {
    pub fn from_result(result: &TickResult) -> Self {
        Self {
            tick: result.tick,
            hour: result.hour,
            band: result.band,
            prices: result.prices,
            saved: result.saved,
        }
    }
}

/// Time series recorder that accumulates snapshots and writes JSONL
pub struct TimeSeriesRecorder {
    snapshots: Vec<TickSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, result: &TickResult) {
        self.snapshots.push(TickSnapshot::from_result(result));
    }

    pub fn snapshots(&self) -> &[TickSnapshot] {
        &self.snapshots
    }

    /// One JSON object per tick, in tick order, so a run can be replayed or
    /// charted line by line.
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}
