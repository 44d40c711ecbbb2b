//! End-to-end engine scenarios: fills, brackets, risk rules, halts.

use chrono::{DateTime, TimeZone, Utc};
use proplab_core::clock::BarSeries;
use proplab_core::config::{EngineConfig, ExitPriority, PropFirmConfig};
use proplab_core::domain::{
    Bar, HaltReason, Order, OrderId, OrderSide, OrderStatus, Timeframe, TradeRecord,
};
use proplab_core::engine::driver::{Backtest, RunStatus};
use proplab_core::engine::order_book::{BracketSpec, EntryType, OrderSpec};
use proplab_core::strategy::{BarCtx, Strategy};

// ── Helpers ────────────────────────────────────────────────────────────

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

fn bar(ts: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new("MES", Timeframe::Min1, ts, open, high, low, close, 1_000.0)
}

/// Flat bar: all four prices equal.
fn flat_bar(ts: DateTime<Utc>, price: f64) -> Bar {
    bar(ts, price, price, price, price)
}

fn mes_series(bars: Vec<Bar>) -> BarSeries {
    BarSeries::new("MES", Timeframe::Min1, bars)
}

#[derive(Debug, Clone)]
enum Act {
    Buy(u32),
    Sell(u32),
    Bracket { size: u32, tp: u32, sl: u32 },
}

/// Replays a fixed script of order actions keyed by bar-group index and
/// records every notification it receives.
#[derive(Default)]
struct Scripted {
    group_idx: usize,
    script: Vec<(usize, Act)>,
    rejections: Vec<String>,
    filled: Vec<OrderId>,
    expired: Vec<OrderId>,
    cancelled: Vec<OrderId>,
    closed_trades: Vec<TradeRecord>,
}

impl Scripted {
    fn new(script: Vec<(usize, Act)>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }
}

impl Strategy for Scripted {
    fn on_bar(&mut self, ctx: &mut BarCtx<'_>) {
        let idx = self.group_idx;
        self.group_idx += 1;
        for (step, act) in self.script.clone() {
            if step != idx {
                continue;
            }
            match act {
                Act::Buy(size) => {
                    let _ = ctx.submit(OrderSpec::market("MES", OrderSide::Buy, size));
                }
                Act::Sell(size) => {
                    let _ = ctx.submit(OrderSpec::market("MES", OrderSide::Sell, size));
                }
                Act::Bracket { size, tp, sl } => {
                    let _ = ctx.submit_bracket(BracketSpec {
                        symbol: "MES".into(),
                        side: OrderSide::Buy,
                        size,
                        entry: EntryType::Market,
                        take_profit_ticks: tp,
                        stop_loss_ticks: sl,
                    });
                }
            }
        }
    }

    fn on_order_update(&mut self, order: &Order) {
        match &order.status {
            OrderStatus::Rejected { reason } => self.rejections.push(reason.clone()),
            OrderStatus::Filled => self.filled.push(order.id),
            OrderStatus::Expired => self.expired.push(order.id),
            OrderStatus::Cancelled { .. } => self.cancelled.push(order.id),
            _ => {}
        }
    }

    fn on_trade_closed(&mut self, trade: &TradeRecord) {
        self.closed_trades.push(trade.clone());
    }
}

fn config(preset: &str) -> EngineConfig {
    EngineConfig::new(PropFirmConfig::preset(preset).unwrap()).with_commission(0.0)
}

// ── Basic order flow ───────────────────────────────────────────────────

#[test]
fn market_order_fills_at_next_group_open() {
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        bar(at(4, 9, 31), 5_002.0, 5_003.0, 5_001.0, 5_002.5),
        flat_bar(at(4, 9, 32), 5_002.0),
    ];
    let mut strategy = Scripted::new(vec![(0, Act::Buy(1))]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    assert_eq!(strategy.filled.len(), 1);
    assert_eq!(result.open_positions.len(), 1);
    let pos = &result.open_positions[0];
    assert_eq!(pos.size, 1);
    // Filled at the 09:31 open, not the 09:30 bar it was requested on.
    assert_eq!(pos.avg_entry_price, 5_002.0);
}

#[test]
fn round_trip_realizes_tick_pnl_and_equity_identity() {
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
        flat_bar(at(4, 9, 32), 5_004.0),
        flat_bar(at(4, 9, 33), 5_010.0),
        flat_bar(at(4, 9, 34), 5_010.0),
    ];
    let mut strategy = Scripted::new(vec![(0, Act::Buy(2)), (2, Act::Sell(2))]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_price, 5_000.0);
    assert_eq!(trade.exit_price, 5_010.0);
    // 10 points = 40 ticks × $1.25 × 2 contracts
    assert!((trade.gross_pnl - 100.0).abs() < 1e-9);

    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.open_positions.is_empty());
    // Flat at the end: equity collapses to balance.
    assert!((result.final_equity - result.final_balance).abs() < 1e-9);
    assert!((result.final_balance - 50_100.0).abs() < 1e-9);
}

#[test]
fn equity_identity_holds_at_every_group() {
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
        flat_bar(at(4, 9, 32), 5_008.0),
        flat_bar(at(4, 9, 33), 4_992.0),
        flat_bar(at(4, 9, 34), 5_001.0),
    ];
    let mut strategy = Scripted::new(vec![(0, Act::Buy(1))]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    // One contract entered at 5000 on the 09:31 open; equity per group is
    // balance + (close − 5000) × $5/point.
    let expected = [50_000.0, 50_000.0, 50_040.0, 49_960.0, 50_005.0];
    assert_eq!(result.equity_curve.len(), expected.len());
    for (point, want) in result.equity_curve.iter().zip(expected) {
        assert!(
            (point.equity - want).abs() < 1e-9,
            "at {}: equity {} != {want}",
            point.timestamp,
            point.equity
        );
        assert_eq!(point.balance, 50_000.0);
    }
}

#[test]
fn unfilled_orders_expire_at_end_of_stream() {
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
    ];
    let mut strategy = Scripted::new(vec![(1, Act::Buy(1))]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    // Submitted on the last group: no bar left to fill it.
    assert_eq!(strategy.expired.len(), 1);
    assert!(result.trades.is_empty());
}

// ── Rejections ─────────────────────────────────────────────────────────

#[test]
fn invalid_request_rejected_and_notified() {
    struct BadRequest;
    impl Strategy for BadRequest {
        fn on_bar(&mut self, ctx: &mut BarCtx<'_>) {
            let err = ctx.submit(OrderSpec::market("MES", OrderSide::Buy, 0));
            assert!(err.is_err());
        }
    }
    let bars = vec![flat_bar(at(4, 9, 30), 5_000.0)];
    let mut strategy = BadRequest;
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();
    // The rejected record exists in the audit trail; the run continues.
    assert!(result
        .audit_trail
        .iter()
        .any(|e| matches!(e.to_status, OrderStatus::Rejected { .. })));
    assert_eq!(result.status, RunStatus::Completed);
}

#[test]
fn max_contracts_rejects_oversized_order_whole() {
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
    ];
    // topstep_50k caps at 5 contracts
    let mut strategy = Scripted::new(vec![(0, Act::Buy(6))]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    assert_eq!(strategy.rejections.len(), 1);
    assert!(strategy.rejections[0].contains("max contracts"));
    assert!(result.open_positions.is_empty());
}

#[test]
fn max_contracts_counts_working_order_exposure() {
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
        flat_bar(at(4, 9, 32), 5_000.0),
    ];
    // Two 3-lots in the same group: 3 + 3 > 5, second must be rejected
    // even though nothing has filled yet.
    let mut strategy = Scripted::new(vec![(0, Act::Buy(3)), (0, Act::Buy(3))]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    assert_eq!(strategy.rejections.len(), 1);
    assert_eq!(result.open_positions[0].size, 3);
}

// ── Bracket and OCO tie-break ──────────────────────────────────────────

#[test]
fn wide_bar_resolves_stop_loss_first_and_cancels_take_profit() {
    // Entry fills at 5000; TP = 5005 (20 ticks), SL = 4997.5 (10 ticks).
    // The 09:32 bar spans both levels.
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
        bar(at(4, 9, 32), 5_000.0, 5_006.0, 4_996.0, 5_001.0),
        flat_bar(at(4, 9, 33), 5_001.0),
    ];
    let mut strategy = Scripted::new(vec![(0, Act::Bracket {
        size: 1,
        tp: 20,
        sl: 10,
    })]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_price, 4_997.5);
    // Loss = 10 ticks × $1.25 × 1 contract
    assert!((trade.gross_pnl + 12.5).abs() < 1e-9);

    // Exactly one leg filled (entry + one leg = 2 fills total).
    assert_eq!(strategy.filled.len(), 2);
    // The take-profit sibling was cancelled in the same step.
    assert!(result.audit_trail.iter().any(|e| {
        matches!(&e.to_status, OrderStatus::Cancelled { reason } if reason == "OCO sibling filled")
    }));
    assert!(result.open_positions.is_empty());
}

#[test]
fn take_profit_first_policy_flips_the_tie_break() {
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
        bar(at(4, 9, 32), 5_000.0, 5_006.0, 4_996.0, 5_001.0),
        flat_bar(at(4, 9, 33), 5_001.0),
    ];
    let mut strategy = Scripted::new(vec![(0, Act::Bracket {
        size: 1,
        tp: 20,
        sl: 10,
    })]);
    let cfg = config("topstep_50k").with_exit_priority(ExitPriority::TakeProfitFirst);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, cfg)
        .unwrap()
        .run();

    let trade = &result.trades[0];
    assert_eq!(trade.exit_price, 5_005.0);
    // Win = 20 ticks × $1.25
    assert!((trade.gross_pnl - 25.0).abs() < 1e-9);
}

#[test]
fn bracket_legs_wait_one_group_under_next_bar_latency() {
    // The entry-fill bar itself spans the stop-loss level; under next-bar
    // latency the leg must not fill against it.
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        bar(at(4, 9, 31), 5_000.0, 5_001.0, 4_995.0, 5_000.0),
        flat_bar(at(4, 9, 32), 5_000.0),
    ];
    let mut strategy = Scripted::new(vec![(0, Act::Bracket {
        size: 1,
        tp: 20,
        sl: 10,
    })]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    // Entry filled at 09:31, but the stop-loss did not: only one fill.
    assert_eq!(strategy.filled.len(), 1);
    assert!(result.trades.is_empty());
    assert_eq!(result.open_positions.len(), 1);
}

// ── Risk rules ─────────────────────────────────────────────────────────

#[test]
fn daily_loss_breach_halts_and_rejects_later_orders() {
    // Buy 2 at 5000, sell 2 at 4900: −100 points × $5 × 2 = −1000 realized.
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
        flat_bar(at(4, 9, 32), 4_900.0),
        flat_bar(at(4, 9, 33), 4_900.0),
        flat_bar(at(4, 9, 34), 4_900.0),
        flat_bar(at(4, 9, 35), 4_900.0),
    ];
    let mut strategy = Scripted::new(vec![
        (0, Act::Buy(2)),
        (2, Act::Sell(2)),
        (4, Act::Buy(1)), // after the halt: must be rejected
    ]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    assert_eq!(
        result.status,
        RunStatus::HaltedByRiskRule(HaltReason::DailyLossBreach)
    );
    assert_eq!(strategy.rejections.len(), 1);
    assert!(strategy.rejections[0].contains("halted"));
    assert!(result.open_positions.is_empty());
}

#[test]
fn halt_cancels_all_working_orders() {
    // A resting bracket entry far from the market is still working when
    // the realized loss halts the account.
    struct HaltSetup {
        step: usize,
    }
    impl Strategy for HaltSetup {
        fn on_bar(&mut self, ctx: &mut BarCtx<'_>) {
            match self.step {
                0 => {
                    let _ = ctx.submit(OrderSpec::limit("MES", OrderSide::Buy, 1, 4_000.0));
                    let _ = ctx.submit(OrderSpec::market("MES", OrderSide::Buy, 2));
                }
                2 => {
                    let _ = ctx.submit(OrderSpec::market("MES", OrderSide::Sell, 2));
                }
                _ => {}
            }
            self.step += 1;
        }
    }
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
        flat_bar(at(4, 9, 32), 4_900.0),
        flat_bar(at(4, 9, 33), 4_900.0),
        flat_bar(at(4, 9, 34), 4_900.0),
    ];
    let mut strategy = HaltSetup { step: 0 };
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    assert!(matches!(result.status, RunStatus::HaltedByRiskRule(_)));
    // The resting limit was cancelled by the halt, not left working.
    assert!(result.audit_trail.iter().any(|e| {
        matches!(&e.to_status, OrderStatus::Cancelled { reason } if reason == "account halted")
    }));
}

#[test]
fn eod_trailing_breach_fires_on_second_day() {
    // Day 1 banks +1000 realized: closing equity 51000 becomes the
    // high-water-mark at rollover. Day 2 re-enters and the mark-to-market
    // drop breaches 51000 − 2000.
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
        flat_bar(at(4, 9, 32), 5_200.0),
        flat_bar(at(4, 9, 33), 5_200.0),
        // Day 2
        flat_bar(at(5, 9, 30), 5_200.0),
        flat_bar(at(5, 9, 31), 5_200.0),
        bar(at(5, 9, 32), 5_200.0, 5_200.0, 4_780.0, 4_795.0),
        flat_bar(at(5, 9, 33), 4_795.0),
    ];
    let mut strategy = Scripted::new(vec![
        (0, Act::Buy(1)),
        (2, Act::Sell(1)),
        (4, Act::Buy(1)),
    ]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    assert_eq!(
        result.status,
        RunStatus::HaltedByRiskRule(HaltReason::MaxLossBreach)
    );
    // Day-1 intraday equity of 51000 only became the reference at the
    // day boundary; the breach is against that mark.
    let breach_point = result
        .equity_curve
        .iter()
        .find(|p| p.equity <= 49_000.0)
        .expect("breach equity point exists");
    assert_eq!(breach_point.timestamp, at(5, 9, 32));
}

#[test]
fn intraday_trailing_tracks_unrealized_peak() {
    // lucid_50k: intraday trailing, max loss 2500. The peak equity of
    // 52600 (unrealized) arms the mark; the later drop breaches it even
    // though realized balance never moved.
    let bars = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 31), 5_000.0),
        flat_bar(at(4, 9, 32), 5_520.0),
        flat_bar(at(4, 9, 33), 5_010.0),
        flat_bar(at(4, 9, 34), 5_010.0),
    ];
    let mut strategy = Scripted::new(vec![(0, Act::Buy(1))]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("lucid_50k"))
        .unwrap()
        .run();

    // Peak equity: 50000 + 520 points × $5 = 52600. Drop to
    // 50000 + 50 = 50050 ≤ 52600 − 2500.
    assert_eq!(
        result.status,
        RunStatus::HaltedByRiskRule(HaltReason::MaxLossBreach)
    );
}

#[test]
fn close_time_flattens_without_halting() {
    let bars = vec![
        flat_bar(at(4, 15, 58), 5_000.0),
        flat_bar(at(4, 15, 59), 5_000.0),
        flat_bar(at(4, 16, 0), 5_004.0),
        flat_bar(at(4, 16, 1), 5_004.0),
    ];
    let mut strategy = Scripted::new(vec![
        (0, Act::Buy(1)),
        (2, Act::Buy(1)), // inside the close window: rejected
    ]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"))
        .unwrap()
        .run();

    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.open_positions.is_empty());
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].exit_time, at(4, 16, 1));
    assert_eq!(strategy.rejections.len(), 1);
    assert!(strategy.rejections[0].contains("closed"));
}

// ── Clock integration ──────────────────────────────────────────────────

#[test]
fn out_of_order_bars_abort_construction() {
    let bars = vec![flat_bar(at(4, 9, 31), 5_000.0), flat_bar(at(4, 9, 30), 5_000.0)];
    let mut strategy = Scripted::new(vec![]);
    let result = Backtest::new(vec![mes_series(bars)], &mut strategy, config("topstep_50k"));
    assert!(result.is_err());
}

#[test]
fn stale_symbol_skips_fill_until_next_bar() {
    // MES misses 09:31; its market order (queued at 09:30) must wait for
    // the 09:32 MES bar even though MNQ keeps printing.
    let mes = vec![
        flat_bar(at(4, 9, 30), 5_000.0),
        flat_bar(at(4, 9, 32), 5_010.0),
    ];
    let mnq: Vec<Bar> = [(9u32, 30u32), (9, 31), (9, 32)]
        .iter()
        .map(|&(h, m)| {
            Bar::new(
                "MNQ",
                Timeframe::Min1,
                at(4, h, m),
                18_000.0,
                18_000.0,
                18_000.0,
                18_000.0,
                500.0,
            )
        })
        .collect();

    let mut strategy = Scripted::new(vec![(0, Act::Buy(1))]);
    let result = Backtest::new(
        vec![mes_series(mes), BarSeries::new("MNQ", Timeframe::Min1, mnq)],
        &mut strategy,
        config("topstep_50k"),
    )
    .unwrap()
    .run();

    assert_eq!(result.bar_groups, 3);
    assert_eq!(result.open_positions.len(), 1);
    // Filled at the 09:32 MES open, not against the stale 09:30 bar.
    assert_eq!(result.open_positions[0].avg_entry_price, 5_010.0);
    assert_eq!(result.open_positions[0].opened_at, Some(at(4, 9, 32)));
}
