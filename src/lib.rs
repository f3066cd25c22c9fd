// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation

pub mod types;
pub mod config;
pub mod error;
pub mod walk;
pub mod derive;
pub mod persistence;
pub mod clock;
pub mod scheduler;
pub mod listener;
pub mod engine;

pub use types::*;
pub use config::{DiurnalBand, EngineConfig, DERIVED_SPECS};
pub use engine::{EngineStatus, InitOutcome, InitReport, MarketEngine, TickResult};
pub use error::{ConfigError, ListenerError, PersistError, StoreError};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, Persistence};
pub use clock::{Clock, ManualClock, SystemClock};
pub use listener::{ListenerId, MarketListener};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);

    #[wasm_bindgen(catch, js_namespace = localStorage, js_name = getItem)]
    fn local_storage_get(key: &str) -> Result<Option<String>, JsValue>;

    #[wasm_bindgen(catch, js_namespace = localStorage, js_name = setItem)]
    fn local_storage_set(key: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = setInterval)]
    fn set_interval(handler: &Closure<dyn FnMut()>, timeout_ms: u32) -> i32;

    #[wasm_bindgen(js_namespace = Math, js_name = random)]
    fn math_random() -> f64;

    /// Zero-argument page callback fired after every market change.
    #[derive(Clone)]
    pub type UpdateHook;

    #[wasm_bindgen(method, catch, js_name = call)]
    fn invoke(this: &UpdateHook, receiver: &JsValue) -> Result<JsValue, JsValue>;
}

// ─── Browser storage ────────────────────────────────────────────────────────

/// `window.localStorage`. A missing or throwing storage object surfaces as a
/// [`StoreError`] instead of an exception.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        local_storage_get(key).map_err(|e| StoreError::Unavailable(describe(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        local_storage_set(key, value).map_err(|e| StoreError::WriteRejected(describe(&e)))
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

// ─── WASM Interface ─────────────────────────────────────────────────────────

type BrowserEngine = MarketEngine<LocalStorage, SystemClock, ChaCha8Rng>;

struct Shared {
    engine: RefCell<BrowserEngine>,
    /// Engine notifications not yet forwarded to page hooks.
    pending: Rc<Cell<u32>>,
    hooks: RefCell<Vec<(u32, UpdateHook)>>,
    next_hook: Cell<u32>,
    interval_id: Cell<Option<i32>>,
}

/// Handle to a market engine living in the page's process. Clones share the
/// same engine.
#[wasm_bindgen]
#[derive(Clone)]
pub struct BrowserMarket {
    shared: Rc<Shared>,
}

thread_local! {
    static SHARED_MARKET: RefCell<Option<BrowserMarket>> = const { RefCell::new(None) };
}

/// The process-wide market. Every page script should go through this so
/// that only one engine and one interval exist.
#[wasm_bindgen(js_name = sharedMarket)]
pub fn shared_market() -> BrowserMarket {
    SHARED_MARKET.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| BrowserMarket::from_config(EngineConfig::default()))
            .clone()
    })
}

#[wasm_bindgen]
impl BrowserMarket {
    #[wasm_bindgen(constructor)]
    pub fn new() -> BrowserMarket {
        Self::from_config(EngineConfig::default())
    }

    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(raw: &str) -> Result<BrowserMarket, JsValue> {
        EngineConfig::from_json(raw)
            .map(Self::from_config)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Idempotent startup. Fires the page hooks on every call.
    #[wasm_bindgen(js_name = ensureInitialized)]
    pub fn ensure_initialized(&self) -> JsValue {
        let report = self.shared.engine.borrow_mut().ensure_initialized();
        if report.timer_started {
            self.start_interval();
            log(&format!("commodity market started ({:?})", report.outcome));
        }
        self.flush_hooks();
        serde_wasm_bindgen::to_value(&report).unwrap_or(JsValue::NULL)
    }

    /// Run one tick immediately.
    pub fn tick(&self) -> JsValue {
        let result = self.shared.engine.borrow_mut().tick();
        self.flush_hooks();
        serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
    }

    pub fn subscribe(&self, hook: UpdateHook) -> u32 {
        let id = self.shared.next_hook.get();
        self.shared.next_hook.set(id + 1);
        self.shared.hooks.borrow_mut().push((id, hook));
        id
    }

    pub fn unsubscribe(&self, id: u32) -> bool {
        let mut hooks = self.shared.hooks.borrow_mut();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    /// Current state as `{ corn: { price, history }, ... }`.
    pub fn market(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.shared.engine.borrow().state()).unwrap_or(JsValue::NULL)
    }

    pub fn price(&self, commodity: &str) -> Option<f64> {
        let commodity: Commodity = commodity.parse().ok()?;
        Some(self.shared.engine.borrow().state().get(commodity).price)
    }

    pub fn status(&self) -> String {
        format!("{:?}", self.shared.engine.borrow().status())
    }

    #[wasm_bindgen(js_name = intervalId)]
    pub fn interval_id(&self) -> Option<i32> {
        self.shared.interval_id.get()
    }
}

impl Default for BrowserMarket {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserMarket {
    fn from_config(config: EngineConfig) -> Self {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let seed = (math_random() * u64::MAX as f64) as u64 ^ SystemClock.now_millis();
        let mut engine =
            MarketEngine::new(config, LocalStorage, SystemClock, ChaCha8Rng::seed_from_u64(seed));

        let pending = Rc::new(Cell::new(0u32));
        let counter = pending.clone();
        engine.subscribe(move |_: &MarketState| -> Result<(), ListenerError> {
            counter.set(counter.get() + 1);
            Ok(())
        });

        Self {
            shared: Rc::new(Shared {
                engine: RefCell::new(engine),
                pending,
                hooks: RefCell::new(Vec::new()),
                next_hook: Cell::new(0),
                interval_id: Cell::new(None),
            }),
        }
    }

    fn start_interval(&self) {
        if self.shared.interval_id.get().is_some() {
            return;
        }
        let interval_ms = self.shared.engine.borrow().config().tick_interval_ms;
        let market = self.clone();
        let handler = Closure::wrap(Box::new(move || {
            market.tick();
        }) as Box<dyn FnMut()>);
        let id = set_interval(&handler, interval_ms.min(u32::MAX as u64) as u32);
        // The interval runs for the life of the page.
        handler.forget();
        self.shared.interval_id.set(Some(id));
    }

    /// Forward queued engine notifications to page hooks outside any engine
    /// borrow, so a hook may read the market back.
    fn flush_hooks(&self) {
        let pending = self.shared.pending.replace(0);
        if pending == 0 {
            return;
        }
        let hooks: Vec<UpdateHook> =
            self.shared.hooks.borrow().iter().map(|(_, hook)| hook.clone()).collect();
        for _ in 0..pending {
            for hook in &hooks {
                if let Err(e) = hook.invoke(&JsValue::UNDEFINED) {
                    log(&format!("market update hook failed: {}", describe(&e)));
                }
            }
        }
    }
}
