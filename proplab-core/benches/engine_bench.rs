use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use proplab_core::config::{EngineConfig, PropFirmConfig};
use proplab_core::domain::Timeframe;
use proplab_core::engine::driver::Backtest;
use proplab_core::strategies::{BracketBreakout, SmaCross};
use proplab_core::synthetic::random_walk_series;

fn bench_sma_run(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
    let mut group = c.benchmark_group("sma_cross_run");

    for bars in [1_000usize, 10_000] {
        let series = random_walk_series("MES", Timeframe::Min1, start, bars, 5_000.0, 42);
        group.bench_with_input(BenchmarkId::from_parameter(bars), &series, |b, series| {
            b.iter(|| {
                let config =
                    EngineConfig::new(PropFirmConfig::preset("topstep_50k").unwrap());
                let mut strategy = SmaCross::new("MES", 5, 20, 1);
                let backtest =
                    Backtest::new(vec![series.clone()], &mut strategy, config).unwrap();
                backtest.run()
            })
        });
    }
    group.finish();
}

fn bench_bracket_run(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
    let series = random_walk_series("MES", Timeframe::Min1, start, 10_000, 5_000.0, 42);

    c.bench_function("bracket_breakout_run_10k", |b| {
        b.iter(|| {
            let config = EngineConfig::new(PropFirmConfig::preset("topstep_50k").unwrap());
            let mut strategy = BracketBreakout::new("MES", 10, 1, 20, 10);
            let backtest = Backtest::new(vec![series.clone()], &mut strategy, config).unwrap();
            backtest.run()
        })
    });
}

criterion_group!(benches, bench_sma_run, bench_bracket_run);
criterion_main!(benches);
