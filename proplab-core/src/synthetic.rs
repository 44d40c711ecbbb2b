//! Seeded synthetic bar generation for demos, benches, and determinism
//! tests.
//!
//! Everything here is driven by an explicit `StdRng::seed_from_u64` — no
//! ambient entropy. Prices walk in whole ticks of the symbol's contract so
//! generated bars look like real futures prints.

use crate::clock::BarSeries;
use crate::domain::{contract_for, Bar, Timeframe};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A plausible price level per known contract, used as the default walk
/// origin.
pub fn reference_price(symbol: &str) -> f64 {
    match symbol {
        "MES" => 5_000.0,
        "MNQ" => 18_000.0,
        "MGC" => 2_300.0,
        "MYM" => 39_000.0,
        _ => 100.0,
    }
}

/// Generate a random-walk bar series: `bars` bars spaced by the timeframe,
/// starting at `start`.
pub fn random_walk_series(
    symbol: &str,
    timeframe: Timeframe,
    start: DateTime<Utc>,
    bars: usize,
    start_price: f64,
    seed: u64,
) -> BarSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let tick = contract_for(symbol).map(|c| c.tick_size).unwrap_or(0.25);

    let mut out = Vec::with_capacity(bars);
    let mut price = start_price;
    let mut timestamp = start;

    for _ in 0..bars {
        let open = price;
        // Body and wicks in whole ticks.
        let body_ticks: i32 = rng.gen_range(-12..=12);
        let close = (open + f64::from(body_ticks) * tick).max(tick);
        let up_wick = f64::from(rng.gen_range(0i32..=6)) * tick;
        let down_wick = f64::from(rng.gen_range(0i32..=6)) * tick;
        let high = open.max(close) + up_wick;
        let low = (open.min(close) - down_wick).max(tick);
        let volume = f64::from(rng.gen_range(200i32..=5_000));

        out.push(Bar::new(
            symbol, timeframe, timestamp, open, high, low, close, volume,
        ));

        price = close;
        timestamp = timestamp + timeframe.duration();
    }

    BarSeries::new(symbol, timeframe, out)
}
