// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Derived Commodities

use rand::Rng;

use crate::config::{DerivedSpec, DERIVED_SPECS};
use crate::types::{clamp_cents, MarketState};

/// Fresh draw of one derived price from the corn price. No dependence on the
/// commodity's previous value.
pub fn derived_price<R: Rng + ?Sized>(spec: &DerivedSpec, corn_price: f64, rng: &mut R) -> f64 {
    let (lo, hi) = spec.multiplier;
    let raw = corn_price * spec.corn_units * rng.gen_range(lo..hi);
    clamp_cents(raw, spec.band())
}

/// Recompute every derived commodity from the current corn price.
pub fn derive_all<R: Rng + ?Sized>(state: &mut MarketState, history_len: usize, rng: &mut R) {
    let corn_price = state.corn.price;
    for spec in &DERIVED_SPECS {
        let price = derived_price(spec, corn_price, rng);
        state.get_mut(spec.commodity).record(price, history_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{round_cents, Commodity, HISTORY_LEN};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn derived_prices_stay_in_band_across_corn_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for corn in [0.05, 0.18, 0.25, 0.32, 0.60, 0.90] {
            for spec in &DERIVED_SPECS {
                for _ in 0..200 {
                    let p = derived_price(spec, corn, &mut rng);
                    let (min, max) = spec.band();
                    assert!(p >= min && p <= max, "{} price {} outside band", spec.commodity, p);
                    assert!((round_cents(p) - p).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn flour_tracks_corn_when_unclamped() {
        // corn 0.25 * 4 units * [1.6, 2.4) = [1.60, 2.40]
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let spec = &DERIVED_SPECS[0];
        for _ in 0..200 {
            let p = derived_price(spec, 0.25, &mut rng);
            assert!((1.60..=2.40).contains(&p), "flour {}", p);
        }
    }

    #[test]
    fn derive_all_appends_to_each_history() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut state = MarketState::default();
        for _ in 0..65 {
            derive_all(&mut state, HISTORY_LEN, &mut rng);
        }
        for c in Commodity::DERIVED {
            let rec = state.get(c);
            assert_eq!(rec.history.len(), HISTORY_LEN);
            assert_eq!(rec.history.last().copied(), Some(rec.price));
        }
        assert!(state.corn.history.is_empty(), "corn is not touched by derivation");
    }

    #[test]
    fn low_corn_pins_derived_to_floor() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut state = MarketState::default();
        state.corn.price = 0.05;
        derive_all(&mut state, HISTORY_LEN, &mut rng);
        // 0.05 * 50 * 4.5 = 11.25 max for ingot, oil max = 1.5 -> floor 2.0
        assert_eq!(state.oil.price, 2.0);
        assert!(state.ingot.price >= 10.0 && state.ingot.price <= 11.25);
    }
}
