//! The simulation loop — one strictly ordered pass over the bar-groups.
//!
//! Control flow per bar-group:
//! 1. Resolve pending fills/triggers against the group's bars (symbols
//!    without a bar this group are stale and skipped)
//! 2. Apply fills to the ledger, mark to market, record the equity point
//! 3. Evaluate risk rules; on a breach, cancel everything and liquidate
//! 4. Deliver order/trade notifications to the strategy
//! 5. Invoke the strategy's `on_bar`, collecting queued order requests
//! 6. Accept or reject the queued requests (halt, close window, size caps)
//!
//! The whole run is single-threaded and deterministic: no two bar-groups
//! are ever evaluated concurrently, and nothing mutates account or
//! position state outside this sequence.

use crate::clock::{BarClock, BarGroup, BarSeries, ClockError};
use crate::config::{BracketLatency, EngineConfig};
use crate::domain::{
    Account, Bar, HaltReason, IdGen, OrderAuditEntry, OrderId, OrderRole, OrderSide, Position,
    TradeRecord,
};
use crate::engine::execution::{check_trigger, TriggerResult};
use crate::engine::ledger::Ledger;
use crate::engine::order_book::{priority_class, OrderBook, OrderSpec};
use crate::engine::risk::RiskEngine;
use crate::strategy::{BarCtx, QueuedAction, Strategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// The bar stream was exhausted with the account alive.
    Completed,
    /// A risk rule breached; the account stayed halted to the end.
    HaltedByRiskRule(HaltReason),
}

/// Equity sampled at the close of one bar-group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub balance: f64,
    pub equity: f64,
}

/// Everything a finished run produces.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub status: RunStatus,
    pub final_balance: f64,
    pub final_equity: f64,
    /// Positions still open when the bar stream ended.
    pub open_positions: Vec<Position>,
    pub audit_trail: Vec<OrderAuditEntry>,
    pub bar_groups: usize,
}

impl RunResult {
    /// Deterministic content hash of the trade sequence and equity curve.
    pub fn fingerprint(&self) -> String {
        crate::fingerprint::run_fingerprint(self)
    }
}

enum Notification {
    OrderUpdate(OrderId),
    TradeClosed(TradeRecord),
}

/// One simulation run. Owns every core component; parallel hosts must
/// build an independent `Backtest` per run.
pub struct Backtest<'a> {
    clock: BarClock,
    strategy: &'a mut dyn Strategy,
    config: EngineConfig,
    book: OrderBook,
    ledger: Ledger,
    risk: RiskEngine,
    id_gen: IdGen,
    latest_bars: HashMap<String, Bar>,
    last_close: HashMap<String, f64>,
    notifications: Vec<Notification>,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
    halt: Option<HaltReason>,
    bar_groups: usize,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<'a> Backtest<'a> {
    pub fn new(
        series: Vec<BarSeries>,
        strategy: &'a mut dyn Strategy,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let clock = BarClock::new(series)?;
        let ledger = Ledger::new(
            Account::new(config.firm.clone()),
            config.commission_per_contract,
        );
        Ok(Self {
            clock,
            strategy,
            config,
            book: OrderBook::new(),
            ledger,
            risk: RiskEngine::new(),
            id_gen: IdGen::default(),
            latest_bars: HashMap::new(),
            last_close: HashMap::new(),
            notifications: Vec::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            halt: None,
            bar_groups: 0,
            last_timestamp: None,
        })
    }

    /// Drive the clock to exhaustion and return the run outputs.
    pub fn run(mut self) -> RunResult {
        self.strategy.initialize();

        while let Some(group) = self.clock.next() {
            self.step(&group);
        }

        // Orders still working when the stream ends expire.
        if let Some(now) = self.last_timestamp {
            for id in self.book.expire_open(now) {
                self.notifications.push(Notification::OrderUpdate(id));
            }
            self.dispatch_notifications();
        }

        let status = match self.halt {
            Some(reason) => RunStatus::HaltedByRiskRule(reason),
            None => RunStatus::Completed,
        };
        RunResult {
            trades: self.trades,
            equity_curve: self.equity_curve,
            status,
            final_balance: self.ledger.account().balance,
            final_equity: self.ledger.account().equity,
            open_positions: self
                .ledger
                .open_positions()
                .into_iter()
                .cloned()
                .collect(),
            audit_trail: self.book.audit_trail().to_vec(),
            bar_groups: self.bar_groups,
        }
    }

    fn step(&mut self, group: &BarGroup) {
        let now = group.timestamp;
        self.bar_groups += 1;
        self.last_timestamp = Some(now);

        // 1. Fill resolution.
        self.resolve_fills(group);

        // 2. Mark to market.
        for bar in &group.bars {
            self.latest_bars.insert(bar.symbol.clone(), bar.clone());
            self.last_close.insert(bar.symbol.clone(), bar.close);
        }
        let equity = self.ledger.mark_to_market(&self.last_close, now);
        self.equity_curve.push(EquityPoint {
            timestamp: now,
            balance: self.ledger.account().balance,
            equity,
        });

        // 3. Risk evaluation. A flatten (halt or close time) cancels every
        //    working order before the liquidation goes in — exit legs left
        //    active on a flat book would re-open positions.
        let verdict = self.risk.evaluate(self.ledger.account_mut(), now);
        if let Some(reason) = verdict.halt {
            self.halt.get_or_insert(reason);
        }
        if verdict.flatten {
            let reason = if verdict.halt.is_some() {
                "account halted"
            } else {
                "position close time"
            };
            for id in self.book.cancel_all(None, now, reason) {
                self.notifications.push(Notification::OrderUpdate(id));
            }
            self.submit_liquidations(now);
        }

        // 4. Notifications from this group's transitions.
        self.dispatch_notifications();

        // 5. Strategy callback. Submissions land in the queue; they are
        //    never evaluated against this group's bars.
        let mut actions = Vec::new();
        let mut ctx = BarCtx::new(
            group,
            &self.latest_bars,
            self.ledger.positions(),
            self.ledger.account(),
            &mut self.id_gen,
            &mut actions,
        );
        self.strategy.on_bar(&mut ctx);

        // 6. Apply queued requests.
        self.apply_actions(actions, now);
        self.dispatch_notifications();
    }

    /// Evaluate every eligible order against this group's bars.
    fn resolve_fills(&mut self, group: &BarGroup) {
        let now = group.timestamp;
        for bar in &group.bars {
            let mut queue = self.book.fill_candidates(
                &bar.symbol,
                now,
                self.config.bracket_latency,
                self.config.exit_priority,
            );
            let mut idx = 0;
            while idx < queue.len() {
                let id = queue[idx];
                idx += 1;

                // An OCO sibling cancelled earlier in this pass is skipped.
                let Some(order) = self.book.get(id) else { continue };
                if !order.is_active() {
                    continue;
                }

                match check_trigger(order, bar) {
                    TriggerResult::NoTrigger => {}
                    TriggerResult::StopTriggeredLimitPending => self.book.latch_stop(id),
                    TriggerResult::Fill { price } => {
                        let Ok(outcome) = self.book.mark_filled(id, price, now) else {
                            continue;
                        };

                        if let Some(filled) = self.book.get(id).cloned() {
                            if let Some(trade) = self.ledger.apply_fill(&filled, price, now) {
                                self.trades.push(trade.clone());
                                self.notifications.push(Notification::TradeClosed(trade));
                            }
                        }
                        self.notifications.push(Notification::OrderUpdate(id));
                        for sibling in outcome.cancelled_siblings {
                            self.notifications.push(Notification::OrderUpdate(sibling));
                        }

                        if self.config.bracket_latency == BracketLatency::SameBar
                            && !outcome.activated_legs.is_empty()
                        {
                            // Fresh legs join this bar's queue, exit
                            // priority preserved between them.
                            let mut legs: Vec<OrderId> = outcome
                                .activated_legs
                                .into_iter()
                                .filter(|leg| {
                                    self.book
                                        .get(*leg)
                                        .map_or(false, |o| o.symbol == bar.symbol)
                                })
                                .collect();
                            legs.sort_by_key(|leg| {
                                let role = self
                                    .book
                                    .get(*leg)
                                    .map_or(OrderRole::Standalone, |o| o.role);
                                (priority_class(role, self.config.exit_priority), *leg)
                            });
                            queue.extend(legs);
                        }
                    }
                }
            }
        }
    }

    fn apply_actions(&mut self, actions: Vec<QueuedAction>, now: DateTime<Utc>) {
        for action in actions {
            match action {
                QueuedAction::Submit { id, spec } => self.apply_submit(id, spec, now),
                QueuedAction::SubmitBracket { ids, group, spec } => {
                    let reject = self
                        .gate_reason(&spec.symbol, i64::from(spec.size) * side_sign(spec.side));
                    if let Some(reason) = reject {
                        self.book.reject_bracket(ids, group, &spec, &reason, now);
                    } else {
                        let ref_price = self
                            .last_close
                            .get(&spec.symbol)
                            .copied()
                            .unwrap_or_default();
                        if let Err(err) =
                            self.book.submit_bracket(ids, group, &spec, ref_price, now)
                        {
                            self.book
                                .reject_bracket(ids, group, &spec, &err.to_string(), now);
                        }
                    }
                    for id in [ids.entry, ids.take_profit, ids.stop_loss] {
                        if self
                            .book
                            .get(id)
                            .map_or(false, |o| o.status.is_terminal())
                        {
                            self.notifications.push(Notification::OrderUpdate(id));
                        }
                    }
                }
                QueuedAction::Cancel { id } => {
                    // AlreadyTerminal is a reported no-op: no state change.
                    if let Ok(cancelled) = self.book.cancel(id, now, "user cancel") {
                        for id in cancelled {
                            self.notifications.push(Notification::OrderUpdate(id));
                        }
                    }
                }
                QueuedAction::CancelAll { symbol } => {
                    for id in self.book.cancel_all(symbol.as_deref(), now, "cancel all") {
                        self.notifications.push(Notification::OrderUpdate(id));
                    }
                }
            }
        }
    }

    fn apply_submit(&mut self, id: OrderId, spec: OrderSpec, now: DateTime<Utc>) {
        if let Some(reason) = self.gate_reason(&spec.symbol, spec.signed_size()) {
            self.book.insert_rejected(id, &spec, &reason, now);
            self.notifications.push(Notification::OrderUpdate(id));
            return;
        }
        if let Err(err) = self.book.submit(id, &spec, now) {
            self.book.insert_rejected(id, &spec, &err.to_string(), now);
            self.notifications.push(Notification::OrderUpdate(id));
        }
    }

    /// Why a new strategy request must be rejected, if at all.
    fn gate_reason(&self, symbol: &str, signed_size: i64) -> Option<String> {
        let account = self.ledger.account();
        if account.is_halted() {
            return Some("account halted".to_string());
        }
        if account.flattened_today {
            return Some("trading closed for the day".to_string());
        }
        if let Some(max) = account.firm.max_contracts {
            // Worst-case resulting net includes exposure reserved by
            // still-working entry orders, so accepted orders can never
            // stack past the cap.
            let net = self.ledger.net_position(symbol);
            let reserved: i64 = self
                .book
                .active_orders_for_symbol(symbol)
                .iter()
                .filter(|o| matches!(o.role, OrderRole::Standalone | OrderRole::Entry))
                .map(|o| o.signed_size())
                .sum();
            if (net + reserved + signed_size).abs() > i64::from(max) {
                return Some(format!("max contracts exceeded ({max})"));
            }
        }
        None
    }

    /// Market-order liquidation of every open position. Bypasses the
    /// strategy gates: these reduce positions and must go through even on
    /// a halted account.
    fn submit_liquidations(&mut self, now: DateTime<Utc>) {
        let open: Vec<(String, i64)> = self
            .ledger
            .open_positions()
            .iter()
            .map(|p| (p.symbol.clone(), p.size))
            .collect();
        for (symbol, size) in open {
            let side = if size > 0 {
                OrderSide::Sell
            } else {
                OrderSide::Buy
            };
            let spec = OrderSpec::market(symbol, side, size.unsigned_abs() as u32);
            let id = self.id_gen.next_order_id();
            self.book.submit(id, &spec, now).ok();
        }
    }

    fn dispatch_notifications(&mut self) {
        let pending = std::mem::take(&mut self.notifications);
        for notification in pending {
            match notification {
                Notification::OrderUpdate(id) => {
                    if let Some(order) = self.book.get(id).cloned() {
                        self.strategy.on_order_update(&order);
                    }
                }
                Notification::TradeClosed(trade) => {
                    self.strategy.on_trade_closed(&trade);
                }
            }
        }
    }
}

fn side_sign(side: OrderSide) -> i64 {
    match side {
        OrderSide::Buy => 1,
        OrderSide::Sell => -1,
    }
}
