// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Update Listeners

use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::error::ListenerError;
use crate::types::MarketState;

/// Receives the market state after every change.
pub trait MarketListener {
    fn on_update(&mut self, state: &MarketState) -> Result<(), ListenerError>;
}

impl<F> MarketListener for F
where
    F: FnMut(&MarketState) -> Result<(), ListenerError>,
{
    fn on_update(&mut self, state: &MarketState) -> Result<(), ListenerError> {
        self(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn MarketListener>)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn MarketListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke every listener in registration order. Errors and panics are
    /// logged and swallowed; the rest of the listeners still run.
    /// Returns the failures.
    pub fn notify(&mut self, state: &MarketState) -> Vec<(ListenerId, ListenerError)> {
        let mut failures = Vec::new();
        for (id, listener) in self.entries.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_update(state)));
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(payload) => ListenerError::Panicked(panic_message(payload.as_ref())),
            };
            warn!(listener = id.0, error = %error, "market listener failed");
            failures.push((*id, error));
        }
        failures
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.entries.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, Box<dyn MarketListener>) {
        let hits = Rc::new(Cell::new(0));
        let seen = hits.clone();
        let listener = move |_: &MarketState| -> Result<(), ListenerError> {
            seen.set(seen.get() + 1);
            Ok(())
        };
        (hits, Box::new(listener))
    }

    #[test]
    fn failing_listeners_do_not_stop_others() {
        let mut registry = ListenerRegistry::new();
        let failing = registry.subscribe(Box::new(|_: &MarketState| -> Result<(), ListenerError> {
            Err(ListenerError::Failed("render error".into()))
        }));
        let panicking = registry.subscribe(Box::new(|_: &MarketState| -> Result<(), ListenerError> {
            panic!("chart blew up")
        }));
        let (hits, listener) = counter();
        registry.subscribe(listener);

        let failures = registry.notify(&MarketState::default());
        assert_eq!(hits.get(), 1);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0], (failing, ListenerError::Failed("render error".into())));
        assert_eq!(failures[1], (panicking, ListenerError::Panicked("chart blew up".into())));
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let mut registry = ListenerRegistry::new();
        let (a_hits, a) = counter();
        let (b_hits, b) = counter();
        let a_id = registry.subscribe(a);
        registry.subscribe(b);

        assert!(registry.unsubscribe(a_id));
        assert!(!registry.unsubscribe(a_id));
        registry.notify(&MarketState::default());
        assert_eq!(a_hits.get(), 0);
        assert_eq!(b_hits.get(), 1);
        assert_eq!(registry.len(), 1);
    }
}
