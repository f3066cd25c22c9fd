#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;

use commodity_market::{shared_market, BrowserMarket, UpdateHook};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn shared_market_starts_one_interval() {
    let market = shared_market();
    market.ensure_initialized();
    let interval = market.interval_id();
    assert!(interval.is_some());

    // A second page script going through the shared handle.
    shared_market().ensure_initialized();
    assert_eq!(shared_market().interval_id(), interval);
    assert_eq!(market.status(), "Running");
}

#[wasm_bindgen_test]
fn prices_are_readable_after_init() {
    let market = shared_market();
    market.ensure_initialized();
    let corn = market.price("corn").unwrap();
    assert!((0.05..=0.90).contains(&corn));
    assert!(market.price("wheat").is_none());

    market.tick();
    let flour = market.price("flour").unwrap();
    assert!((0.50..=8.0).contains(&flour));
}

// ========== Page Hooks ==========

/// A hook backed by a Rust closure. The closure must outlive the hook.
fn counting_hook() -> (Rc<Cell<u32>>, UpdateHook, Closure<dyn FnMut()>) {
    let hits = Rc::new(Cell::new(0));
    let seen = hits.clone();
    let closure = Closure::wrap(Box::new(move || seen.set(seen.get() + 1)) as Box<dyn FnMut()>);
    let hook = closure.as_ref().clone().unchecked_into::<UpdateHook>();
    (hits, hook, closure)
}

#[wasm_bindgen_test]
fn hooks_fire_on_every_initialization_and_tick() {
    let market = BrowserMarket::new();
    let (hits, hook, _closure) = counting_hook();
    market.subscribe(hook);

    market.ensure_initialized();
    assert_eq!(hits.get(), 1);
    market.ensure_initialized();
    assert_eq!(hits.get(), 2);

    market.tick();
    assert_eq!(hits.get(), 3);
    market.tick();
    assert_eq!(hits.get(), 4);
}

#[wasm_bindgen_test]
fn throwing_hook_does_not_stop_the_others() {
    let market = BrowserMarket::new();
    // Not callable, so invoking it raises a TypeError.
    let broken = JsValue::from_f64(1.0).unchecked_into::<UpdateHook>();
    market.subscribe(broken);
    let (hits, hook, _closure) = counting_hook();
    market.subscribe(hook);

    market.ensure_initialized();
    let before = market.price("corn").unwrap();
    assert!(before.is_finite());

    market.tick();
    assert_eq!(hits.get(), 2);
    assert_eq!(market.status(), "Running");
    assert!((0.05..=0.90).contains(&market.price("corn").unwrap()));
}

#[wasm_bindgen_test]
fn unsubscribed_hook_stops_receiving_updates() {
    let market = BrowserMarket::new();
    let (kept_hits, kept, _kept_closure) = counting_hook();
    let (dropped_hits, dropped, _dropped_closure) = counting_hook();
    market.subscribe(kept);
    let dropped_id = market.subscribe(dropped);

    market.ensure_initialized();
    assert_eq!(dropped_hits.get(), 1);

    assert!(market.unsubscribe(dropped_id));
    assert!(!market.unsubscribe(dropped_id));
    market.tick();
    market.tick();

    assert_eq!(dropped_hits.get(), 1);
    assert_eq!(kept_hits.get(), 3);
}
