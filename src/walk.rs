// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Corn Random Walk

use rand::Rng;

use crate::config::DiurnalBand;
use crate::types::{clamp_cents, Commodity, CommodityRecord};

/// Advance the corn price by one biased random-walk step for `hour` (0-23)
/// and append the result to its history. Returns the new price.
///
/// A non-finite current price is replaced by `fallback` before stepping.
pub fn step_corn<R: Rng + ?Sized>(
    corn: &mut CommodityRecord,
    hour: u32,
    fallback: f64,
    history_len: usize,
    rng: &mut R,
) -> f64 {
    let current = if corn.price.is_finite() { corn.price } else { fallback };
    let (lo, hi) = DiurnalBand::from_hour(hour).delta_range();
    let delta = rng.gen_range(lo..hi);
    let next = clamp_cents(current + delta, Commodity::Corn.price_band());
    corn.record(next, history_len);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{round_cents, HISTORY_LEN};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn is_cents(v: f64) -> bool {
        (round_cents(v) - v).abs() < 1e-9
    }

    #[test]
    fn midday_step_stays_within_one_cent() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let mut corn = CommodityRecord::new(0.25);
            let p = step_corn(&mut corn, 14, 0.25, HISTORY_LEN, &mut rng);
            assert!((0.24..=0.26).contains(&p), "midday price {} out of range", p);
            assert!(is_cents(p));
        }
    }

    #[test]
    fn morning_never_drops_more_than_a_cent() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..500 {
            let mut corn = CommodityRecord::new(0.50);
            let p = step_corn(&mut corn, 8, 0.25, HISTORY_LEN, &mut rng);
            assert!((0.49..=0.53).contains(&p), "morning price {} out of range", p);
        }
    }

    #[test]
    fn walk_is_clamped_to_band() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut corn = CommodityRecord::new(0.06);
        for _ in 0..2_000 {
            let p = step_corn(&mut corn, 2, 0.25, HISTORY_LEN, &mut rng);
            assert!((0.05..=0.90).contains(&p));
            assert!(is_cents(p));
        }
        assert_eq!(corn.history.len(), HISTORY_LEN);
    }

    #[test]
    fn non_finite_price_falls_back_to_default() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut corn = CommodityRecord::new(f64::NAN);
        let p = step_corn(&mut corn, 13, 0.25, HISTORY_LEN, &mut rng);
        assert!((0.24..=0.26).contains(&p));
        assert_eq!(corn.history, vec![p]);
    }
}
