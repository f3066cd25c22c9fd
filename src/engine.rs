// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Market Engine

//! The market engine: owns the state, its persistence, the recurring tick
//! and the update listeners.
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized --ensure_initialized--> Initializing --(seed | restore)--> Running
//!                                                                           |
//!                         ensure_initialized: no mutation, notify only  <---+
//! ```
//!
//! Each tick walks corn, derives the other four from the fresh corn price,
//! saves, then notifies listeners.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{DiurnalBand, EngineConfig};
use crate::derive::derive_all;
use crate::error::PersistError;
use crate::listener::{ListenerId, ListenerRegistry, MarketListener};
use crate::persistence::{KeyValueStore, LoadReport, Persistence};
use crate::scheduler::IntervalTimer;
use crate::types::{round_cents, Commodity, MarketState};
use crate::walk::step_corn;

// ─── Status / outcomes ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    Uninitialized,
    Initializing,
    Running,
}

/// How a call to [`MarketEngine::ensure_initialized`] resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitOutcome {
    /// Fresh state drawn and persisted.
    Seeded,
    /// Persisted state with a valid corn price was restored.
    Restored,
    /// Engine was already running; nothing changed.
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitReport {
    pub outcome: InitOutcome,
    /// True only on the call that armed the recurring tick.
    pub timer_started: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickResult {
    pub tick: u64,
    pub hour: u32,
    pub band: DiurnalBand,
    pub prices: [f64; 5],
    pub saved: bool,
}

// ─── MarketEngine ───────────────────────────────────────────────────────────

pub struct MarketEngine<S, C, R> {
    config: EngineConfig,
    state: MarketState,
    persistence: Persistence<S>,
    clock: C,
    rng: R,
    status: EngineStatus,
    timer: Option<IntervalTimer>,
    listeners: ListenerRegistry,
    tick_count: u64,
}

impl<S, C, R> MarketEngine<S, C, R>
where
    S: KeyValueStore,
    C: Clock,
    R: Rng,
{
    pub fn new(config: EngineConfig, store: S, clock: C, rng: R) -> Self {
        let persistence = Persistence::new(store, config.storage_key.clone(), config.history_len);
        Self {
            config,
            state: MarketState::default(),
            persistence,
            clock,
            rng,
            status: EngineStatus::Uninitialized,
            timer: None,
            listeners: ListenerRegistry::new(),
            tick_count: 0,
        }
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn timer(&self) -> Option<&IntervalTimer> {
        self.timer.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &S {
        self.persistence.store()
    }

    pub fn subscribe<L>(&mut self, listener: L) -> ListenerId
    where
        L: MarketListener + 'static,
    {
        self.listeners.subscribe(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Bring the engine to `Running` exactly once; every later call only
    /// notifies listeners so a newly attached consumer renders immediately.
    pub fn ensure_initialized(&mut self) -> InitReport {
        if self.status == EngineStatus::Running {
            debug!("market engine already running");
            self.notify();
            return InitReport { outcome: InitOutcome::AlreadyRunning, timer_started: false };
        }

        self.status = EngineStatus::Initializing;
        let outcome = match self.persistence.load(&mut self.state) {
            Ok(report) if report.has_restored(Commodity::Corn) => {
                self.state.normalize_histories(self.config.history_len);
                info!(
                    corn = self.state.corn.price,
                    restored = report.restored.len(),
                    "market state restored"
                );
                InitOutcome::Restored
            }
            Ok(report) => {
                self.seed(Some(&report));
                InitOutcome::Seeded
            }
            Err(e) => {
                match e {
                    PersistError::Missing => debug!("no persisted market state"),
                    ref other => warn!(error = %other, "persisted market state unusable"),
                }
                self.seed(None);
                InitOutcome::Seeded
            }
        };

        self.status = EngineStatus::Running;
        self.notify();

        let timer_started = if self.timer.is_none() {
            let now = self.clock.now_millis();
            self.timer = Some(IntervalTimer::start(now, self.config.tick_interval_ms));
            true
        } else {
            false
        };

        InitReport { outcome, timer_started }
    }

    fn seed(&mut self, partial: Option<&LoadReport>) {
        let (lo, hi) = self.config.seed_range;
        let corn = round_cents(self.rng.gen_range(lo..hi));
        self.state.corn.price = corn;
        self.state.corn.history = vec![corn];
        derive_all(&mut self.state, self.config.history_len, &mut self.rng);
        info!(
            corn,
            skipped = partial.map_or(0, |r| r.skipped.len()),
            "market state seeded"
        );
        self.persist();
    }

    /// One market step: walk corn, derive the rest from the new corn price,
    /// persist, notify.
    pub fn tick(&mut self) -> TickResult {
        let hour = self.clock.local_hour();
        let history_len = self.config.history_len;

        let corn = step_corn(
            &mut self.state.corn,
            hour,
            self.config.default_corn_price,
            history_len,
            &mut self.rng,
        );
        derive_all(&mut self.state, history_len, &mut self.rng);
        self.tick_count += 1;

        let saved = self.persist();
        debug!(tick = self.tick_count, hour, corn, saved, "market tick");
        self.notify();

        TickResult {
            tick: self.tick_count,
            hour,
            band: DiurnalBand::from_hour(hour),
            prices: self.state.prices(),
            saved,
        }
    }

    /// Run every tick the timer says is due. Does nothing before the engine
    /// is running.
    pub fn run_due(&mut self) -> Vec<TickResult> {
        if self.status != EngineStatus::Running {
            return Vec::new();
        }
        let now = self.clock.now_millis();
        let due = match self.timer.as_mut() {
            Some(timer) => timer.take_due(now),
            None => 0,
        };
        (0..due).map(|_| self.tick()).collect()
    }

    /// Milliseconds until the next tick, if the timer is armed.
    pub fn millis_until_next_tick(&self) -> Option<u64> {
        let now = self.clock.now_millis();
        self.timer.map(|t| t.millis_until_due(now))
    }

    fn persist(&mut self) -> bool {
        match self.persistence.save(&self.state) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, key = self.persistence.key(), "market state not saved");
                false
            }
        }
    }

    fn notify(&mut self) {
        self.listeners.notify(&self.state);
    }
}

impl<S, C, R> std::fmt::Debug for MarketEngine<S, C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketEngine")
            .field("status", &self.status)
            .field("tick_count", &self.tick_count)
            .field("timer", &self.timer)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
