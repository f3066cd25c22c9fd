// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Engine Configuration

//! Engine configuration and the fixed pricing tables.
//!
//! The diurnal volatility table and the derived-commodity table are
//! constants: they define the market's behavior and are not tunable. The
//! remaining knobs (storage key, tick cadence, history depth, seed range)
//! live on [`EngineConfig`] and can be overridden from JSON or environment.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Commodity, HISTORY_LEN};

pub const DEFAULT_STORAGE_KEY: &str = "commodity-market/state";
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 60_000;

// ---------------------------------------------------------------------------
// DiurnalBand
// ---------------------------------------------------------------------------

/// Time-of-day regime selecting the corn delta distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiurnalBand {
    /// 06:00-11:59, mild upward bias.
    Morning,
    /// 12:00-17:59, low volatility.
    Midday,
    /// Everything else, high volatility.
    Night,
}

impl DiurnalBand {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Midday,
            _ => Self::Night,
        }
    }

    /// Uniform delta range `(lo, hi)` applied to the corn price.
    pub fn delta_range(&self) -> (f64, f64) {
        match self {
            Self::Morning => (-0.01, 0.03),
            Self::Midday => (-0.01, 0.01),
            Self::Night => (-0.04, 0.04),
        }
    }
}

// ---------------------------------------------------------------------------
// DerivedSpec
// ---------------------------------------------------------------------------

/// Pricing parameters for a commodity computed from the corn price.
///
/// `price = clamp(corn * corn_units * uniform(lo, hi), band)` rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedSpec {
    pub commodity: Commodity,
    pub corn_units: f64,
    pub multiplier: (f64, f64),
}

impl DerivedSpec {
    pub fn band(&self) -> (f64, f64) {
        self.commodity.price_band()
    }
}

pub const DERIVED_SPECS: [DerivedSpec; 4] = [
    DerivedSpec { commodity: Commodity::Flour, corn_units: 4.0, multiplier: (1.6, 2.4) },
    DerivedSpec { commodity: Commodity::Oil, corn_units: 10.0, multiplier: (2.0, 3.0) },
    DerivedSpec { commodity: Commodity::Biofuel, corn_units: 25.0, multiplier: (2.5, 3.5) },
    DerivedSpec { commodity: Commodity::Ingot, corn_units: 50.0, multiplier: (3.0, 4.5) },
];

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Key the market state is persisted under.
    pub storage_key: String,
    pub tick_interval_ms: u64,
    /// Entries kept per commodity history.
    pub history_len: usize,
    /// Range the initial corn price is drawn from when seeding.
    pub seed_range: (f64, f64),
    /// Corn price assumed when the stored one is unusable.
    pub default_corn_price: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            history_len: HISTORY_LEN,
            seed_range: (0.18, 0.32),
            default_corn_price: 0.25,
        }
    }
}

impl EngineConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `MARKET_STORAGE_KEY`, `MARKET_TICK_INTERVAL_MS`
    /// and `MARKET_HISTORY_LEN` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(key) = lookup("MARKET_STORAGE_KEY") {
            config.storage_key = key;
        }
        if let Some(raw) = lookup("MARKET_TICK_INTERVAL_MS") {
            config.tick_interval_ms = parse_var("MARKET_TICK_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("MARKET_HISTORY_LEN") {
            config.history_len = parse_var("MARKET_HISTORY_LEN", &raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_key must not be empty".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.history_len == 0 {
            return Err(ConfigError::Invalid("history_len must be positive".into()));
        }
        let (lo, hi) = self.seed_range;
        let (min, max) = Commodity::Corn.price_band();
        if !(lo.is_finite() && hi.is_finite()) || lo >= hi || lo < min || hi > max {
            return Err(ConfigError::Invalid(format!(
                "seed_range ({lo}, {hi}) must be increasing and within corn band ({min}, {max})"
            )));
        }
        if !self.default_corn_price.is_finite() {
            return Err(ConfigError::Invalid("default_corn_price must be finite".into()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::BadVar {
        name,
        value: raw.to_string(),
    })
}
