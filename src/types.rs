// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Type Definitions

use std::fmt;
use std::str::FromStr;

use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Default number of entries kept in every commodity's history.
pub const HISTORY_LEN: usize = 60;

// ─── Commodity ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Commodity {
    Corn = 0,
    Flour = 1,
    Oil = 2,
    Biofuel = 3,
    Ingot = 4,
}

impl Commodity {
    pub const ALL: [Commodity; 5] = [
        Self::Corn,
        Self::Flour,
        Self::Oil,
        Self::Biofuel,
        Self::Ingot,
    ];

    /// Commodities recomputed from corn every tick.
    pub const DERIVED: [Commodity; 4] = [Self::Flour, Self::Oil, Self::Biofuel, Self::Ingot];

    /// Identifier used in the persisted payload.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Corn => "corn",
            Self::Flour => "flour",
            Self::Oil => "oil",
            Self::Biofuel => "biofuel",
            Self::Ingot => "ingot",
        }
    }

    pub fn is_derived(&self) -> bool {
        !matches!(self, Self::Corn)
    }

    /// Inclusive price band every stored price is clamped into.
    pub fn price_band(&self) -> (f64, f64) {
        match self {
            Self::Corn => (0.05, 0.90),
            Self::Flour => (0.50, 8.0),
            Self::Oil => (2.0, 30.0),
            Self::Biofuel => (5.0, 80.0),
            Self::Ingot => (10.0, 200.0),
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown commodity: {0}")]
pub struct UnknownCommodity(pub String);

impl FromStr for Commodity {
    type Err = UnknownCommodity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| UnknownCommodity(s.to_string()))
    }
}

// ─── CommodityRecord ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityRecord {
    pub price: f64,
    /// Most recent last.
    #[serde(default)]
    pub history: Vec<f64>,
}

impl CommodityRecord {
    pub fn new(price: f64) -> Self {
        Self { price, history: Vec::new() }
    }

    /// Set the price and append it to the bounded history.
    pub fn record(&mut self, price: f64, cap: usize) {
        self.price = price;
        push_bounded(&mut self.history, price, cap);
    }

    /// Difference between the newest and oldest history entries.
    pub fn change(&self) -> f64 {
        match (self.history.first(), self.history.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Drop non-finite history entries and keep only the last `cap`.
    pub fn normalize(&mut self, cap: usize) {
        self.history.retain(|v| v.is_finite());
        truncate_front(&mut self.history, cap);
    }
}

// ─── MarketState ─────────────────────────────────────────────────────────────

/// The five commodity records. The key set is fixed by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub corn: CommodityRecord,
    pub flour: CommodityRecord,
    pub oil: CommodityRecord,
    pub biofuel: CommodityRecord,
    pub ingot: CommodityRecord,
}

impl Default for MarketState {
    fn default() -> Self {
        Self {
            corn: CommodityRecord::new(0.25),
            flour: CommodityRecord::new(Commodity::Flour.price_band().0),
            oil: CommodityRecord::new(Commodity::Oil.price_band().0),
            biofuel: CommodityRecord::new(Commodity::Biofuel.price_band().0),
            ingot: CommodityRecord::new(Commodity::Ingot.price_band().0),
        }
    }
}

impl MarketState {
    pub fn get(&self, commodity: Commodity) -> &CommodityRecord {
        match commodity {
            Commodity::Corn => &self.corn,
            Commodity::Flour => &self.flour,
            Commodity::Oil => &self.oil,
            Commodity::Biofuel => &self.biofuel,
            Commodity::Ingot => &self.ingot,
        }
    }

    pub fn get_mut(&mut self, commodity: Commodity) -> &mut CommodityRecord {
        match commodity {
            Commodity::Corn => &mut self.corn,
            Commodity::Flour => &mut self.flour,
            Commodity::Oil => &mut self.oil,
            Commodity::Biofuel => &mut self.biofuel,
            Commodity::Ingot => &mut self.ingot,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Commodity, &CommodityRecord)> {
        Commodity::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn normalize_histories(&mut self, cap: usize) {
        for commodity in Commodity::ALL {
            self.get_mut(commodity).normalize(cap);
        }
    }

    /// Current prices in `Commodity::ALL` order.
    pub fn prices(&self) -> [f64; 5] {
        Commodity::ALL.map(|c| self.get(c).price)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Append `value` and drop the oldest entries beyond `cap`.
pub fn push_bounded(history: &mut Vec<f64>, value: f64, cap: usize) {
    history.push(value);
    truncate_front(history, cap);
}

fn truncate_front(history: &mut Vec<f64>, cap: usize) {
    if history.len() > cap {
        let excess = history.len() - cap;
        history.drain(..excess);
    }
}

/// Round to the nearest cent, halves away from zero. The result is the
/// double nearest to `cents / 100`, so it survives a JSON round trip exactly.
pub fn round_cents(value: f64) -> f64 {
    let Some(d) = Decimal::from_f64(value) else {
        return value;
    };
    let mut cents = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents.mantissa() as f64 / 100.0
}

/// Clamp into `[lo, hi]` then round to cents.
pub fn clamp_cents(value: f64, (lo, hi): (f64, f64)) -> f64 {
    round_cents(value.clamp(lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commodity_keys_round_trip_through_from_str() {
        for c in Commodity::ALL {
            assert_eq!(c.key().parse::<Commodity>(), Ok(c));
        }
        assert!("wheat".parse::<Commodity>().is_err());
    }

    #[test]
    fn push_bounded_drops_oldest_first() {
        let mut history = Vec::new();
        for i in 0..75 {
            push_bounded(&mut history, i as f64, HISTORY_LEN);
        }
        assert_eq!(history.len(), HISTORY_LEN);
        assert_eq!(history[0], 15.0);
        assert_eq!(*history.last().unwrap(), 74.0);
        assert!(history.windows(2).all(|w| w[0] < w[1]), "order must be preserved");
    }

    #[test]
    fn round_cents_rounds_half_away_from_zero() {
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(0.254_999), 0.25);
        assert_eq!(round_cents(12.0), 12.0);
    }

    #[test]
    fn clamp_cents_respects_band() {
        assert_eq!(clamp_cents(1.234, (0.05, 0.90)), 0.90);
        assert_eq!(clamp_cents(0.01, (0.05, 0.90)), 0.05);
        assert_eq!(clamp_cents(0.333, (0.05, 0.90)), 0.33);
    }

    #[test]
    fn normalize_filters_and_truncates() {
        let mut rec = CommodityRecord::new(1.0);
        rec.history = (0..70).map(|i| i as f64).collect();
        rec.history.insert(3, f64::NAN);
        rec.normalize(HISTORY_LEN);
        assert_eq!(rec.history.len(), HISTORY_LEN);
        assert!(rec.history.iter().all(|v| v.is_finite()));
        assert_eq!(rec.history[0], 10.0);
    }

    #[test]
    fn market_state_serializes_with_fixed_keys() {
        let json = serde_json::to_value(MarketState::default()).unwrap();
        let obj = json.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["biofuel", "corn", "flour", "ingot", "oil"]);
    }

    #[test]
    fn change_is_last_minus_first() {
        let mut rec = CommodityRecord::new(0.25);
        assert_eq!(rec.change(), 0.0);
        rec.history = vec![0.20, 0.22, 0.25];
        assert!((rec.change() - 0.05).abs() < 1e-9);
    }
}
