// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Persistence

//! Durable storage of the market state.
//!
//! The state is written as one JSON object under a single string key:
//!
//! ```text
//! { "corn": { "price": 0.25, "history": [0.24, 0.25] }, "flour": { ... }, ... }
//! ```
//!
//! Loading is lenient. Unknown keys are ignored, commodities with an
//! unusable price are skipped, and non-numeric history entries are dropped.
//! Saving never writes a non-finite number.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{PersistError, StoreError};
use crate::types::{Commodity, MarketState};

// ---------------------------------------------------------------------------
// KeyValueStore
// ---------------------------------------------------------------------------

/// A string-keyed, string-valued storage facility.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process store. Clones share the same backing map, so a second engine
/// built on a clone sees what the first one saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value under `key`, bypassing the trait.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.insert_raw(key, value);
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash never leaves a half-written file.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Which commodities a load merged into memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub restored: Vec<Commodity>,
    pub skipped: Vec<Commodity>,
}

impl LoadReport {
    pub fn has_restored(&self, commodity: Commodity) -> bool {
        self.restored.contains(&commodity)
    }
}

#[derive(Serialize)]
struct PersistedRecord<'a> {
    price: f64,
    history: &'a [f64],
}

/// Loads and saves a [`MarketState`] under a fixed key of a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    store: S,
    key: String,
    history_len: usize,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S, key: impl Into<String>, history_len: usize) -> Self {
        Self { store, key: key.into(), history_len }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Merge the persisted payload into `state`.
    ///
    /// For each known commodity present with a finite numeric `price`, the
    /// price is overwritten (clamped into its band) and the history replaced
    /// by the last `history_len` finite entries of the stored array. Missing
    /// commodities are left untouched. `Ok` means the payload was readable,
    /// even if nothing in it was usable; inspect the report.
    pub fn load(&self, state: &mut MarketState) -> Result<LoadReport, PersistError> {
        let raw = self.store.get(&self.key)?.ok_or(PersistError::Missing)?;
        let payload: Value = serde_json::from_str(&raw)?;
        let object = payload.as_object().ok_or(PersistError::NotAnObject)?;

        let mut report = LoadReport::default();
        for commodity in Commodity::ALL {
            let Some(entry) = object.get(commodity.key()) else {
                continue;
            };
            let price = entry
                .get("price")
                .and_then(Value::as_f64)
                .filter(|p| p.is_finite());
            let Some(price) = price else {
                report.skipped.push(commodity);
                continue;
            };

            let (min, max) = commodity.price_band();
            let record = state.get_mut(commodity);
            record.price = price.clamp(min, max);
            record.history = finite_tail(entry.get("history"), self.history_len);
            report.restored.push(commodity);
        }
        Ok(report)
    }

    /// Serialize all five commodities under the storage key.
    pub fn save(&mut self, state: &MarketState) -> Result<(), PersistError> {
        let histories: Vec<Vec<f64>> = Commodity::ALL
            .iter()
            .map(|&c| finite_tail_of(&state.get(c).history, self.history_len))
            .collect();
        let payload: serde_json::Map<String, Value> = Commodity::ALL
            .iter()
            .zip(&histories)
            .map(|(&c, history)| {
                let price = state.get(c).price;
                let record = PersistedRecord {
                    price: if price.is_finite() { price } else { 0.0 },
                    history,
                };
                Ok((c.key().to_string(), serde_json::to_value(record)?))
            })
            .collect::<Result<_, serde_json::Error>>()?;
        let raw = serde_json::to_string(&payload)?;
        self.store.set(&self.key, &raw)?;
        Ok(())
    }
}

fn finite_tail(source: Option<&Value>, cap: usize) -> Vec<f64> {
    let Some(items) = source.and_then(Value::as_array) else {
        return Vec::new();
    };
    let finite: Vec<f64> = items
        .iter()
        .filter_map(Value::as_f64)
        .filter(|v| v.is_finite())
        .collect();
    finite_tail_of(&finite, cap)
}

fn finite_tail_of(values: &[f64], cap: usize) -> Vec<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let start = finite.len().saturating_sub(cap);
    finite[start..].to_vec()
}
