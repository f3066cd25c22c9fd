// Market Report
// Per-commodity statistics over a run and the console tables printed from them

use commodity_market::{Commodity, MarketState};
use serde::Serialize;

use crate::time_series::TickSnapshot;

// ─── Statistics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        Self {
            mean,
            std_dev: variance.sqrt(),
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Run Summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CommoditySummary {
    pub commodity: Commodity,
    pub band: (f64, f64),
    pub final_price: f64,
    pub stats: Stats,
    /// Ticks that landed exactly on a band edge. Draws past an edge are
    /// clamped onto it, so a high count means the walk spent that long
    /// pressed against the floor or ceiling rather than moving freely.
    pub pinned: usize,
}

pub fn summarize(snapshots: &[TickSnapshot], state: &MarketState) -> Vec<CommoditySummary> {
    Commodity::ALL
        .iter()
        .enumerate()
        .map(|(i, &commodity)| {
            let band = commodity.price_band();
            let samples: Vec<f64> = snapshots.iter().map(|s| s.prices[i]).collect();
            let pinned = samples.iter().filter(|&&p| p == band.0 || p == band.1).count();
            CommoditySummary {
                commodity,
                band,
                final_price: state.get(commodity).price,
                stats: Stats::from_samples(&samples),
                pinned,
            }
        })
        .collect()
}

pub fn print_summary(summaries: &[CommoditySummary]) {
    println!("  {:<10} {:>9} {:>9} {:>9} {:>9} {:>9} {:>7}",
        "Commodity", "Final", "Mean", "StdDev", "Min", "Max", "Pinned");
    println!("  {}", "-".repeat(68));
    for s in summaries {
        println!("  {:<10} {:>9.2} {:>9.3} {:>9.3} {:>9.2} {:>9.2} {:>7}",
            s.commodity.key(),
            s.final_price,
            s.stats.mean,
            s.stats.std_dev,
            s.stats.min,
            s.stats.max,
            s.pinned,
        );
    }
    println!();
}

/// One-line price board, printed on every live update.
pub fn print_prices(state: &MarketState) {
    let line: Vec<String> = state
        .iter()
        .map(|(c, rec)| format!("{}={:.2} ({:+.2})", c.key(), rec.price, rec.change()))
        .collect();
    println!("  {}", line.join("  "));
}
