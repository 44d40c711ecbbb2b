//! Position & account ledger — applies fills, realizes P&L, marks to
//! market.
//!
//! The ledger exclusively owns the `Account` and every `Position`. Fills
//! update the weighted-average entry and signed size; reducing fills
//! realize P&L for the closed portion through the contract's tick math,
//! deduct commission, and emit a `TradeRecord`. The equity accounting
//! identity must hold after every bar-group:
//! `equity == balance + Σ unrealized P&L`.

use crate::domain::{
    contract_for, Account, IdGen, Order, Position, TradeRecord, TradeSide,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub struct Ledger {
    account: Account,
    positions: HashMap<String, Position>,
    commission_per_contract: f64,
    id_gen: IdGen,
}

impl Ledger {
    pub fn new(account: Account, commission_per_contract: f64) -> Self {
        Self {
            account,
            positions: HashMap::new(),
            commission_per_contract,
            id_gen: IdGen::default(),
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut Account {
        &mut self.account
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    /// Signed net size for a symbol (0 when flat or unknown).
    pub fn net_position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).map_or(0, |p| p.size)
    }

    /// Positions with a non-zero net size.
    pub fn open_positions(&self) -> Vec<&Position> {
        self.positions.values().filter(|p| !p.is_flat()).collect()
    }

    /// Apply a filled order to the position and account state.
    ///
    /// Returns the completed trade when the fill reduced or closed an
    /// existing position. A reversing fill closes the whole old position
    /// (one trade) and opens the remainder at the fill price.
    pub fn apply_fill(
        &mut self,
        order: &Order,
        fill_price: f64,
        now: DateTime<Utc>,
    ) -> Option<TradeRecord> {
        let Some(contract) = contract_for(&order.symbol) else {
            // Unknown contracts are rejected at submission; nothing to do.
            return None;
        };

        // Commission per contract per side, paid on every fill.
        let commission = f64::from(order.size) * self.commission_per_contract;
        self.account.balance -= commission;

        let fill_size = order.signed_size();
        let position = self
            .positions
            .entry(order.symbol.clone())
            .or_insert_with(|| Position::new(order.symbol.clone()));

        if position.size == 0 {
            // Opening a fresh position.
            position.size = fill_size;
            position.avg_entry_price = fill_price;
            position.opened_at = Some(now);
            position.last_update = Some(now);
            return None;
        }

        if position.size.signum() == fill_size.signum() {
            // Adding: volume-weighted average entry.
            let old_qty = position.size.abs() as f64;
            let add_qty = fill_size.abs() as f64;
            position.avg_entry_price = (position.avg_entry_price * old_qty
                + fill_price * add_qty)
                / (old_qty + add_qty);
            position.size += fill_size;
            position.last_update = Some(now);
            return None;
        }

        // Reducing, closing, or reversing.
        let closed = position.size.abs().min(fill_size.abs());
        let side = if position.is_long() {
            TradeSide::Long
        } else {
            TradeSide::Short
        };
        let signed_closed = closed * position.size.signum();
        let gross = contract.pnl(position.avg_entry_price, fill_price, signed_closed);
        self.account.balance += gross;
        position.realized_pnl += gross;

        let round_trip_commission = 2.0 * self.commission_per_contract * closed as f64;
        let trade = TradeRecord {
            id: self.id_gen.next_trade_id(),
            symbol: order.symbol.clone(),
            side,
            size: closed as u32,
            entry_price: position.avg_entry_price,
            entry_time: position.opened_at.unwrap_or(now),
            exit_price: fill_price,
            exit_time: now,
            gross_pnl: gross,
            commission: round_trip_commission,
            net_pnl: gross - round_trip_commission,
        };

        let remaining = position.size + fill_size;
        if remaining == 0 {
            position.flatten(now);
        } else if remaining.signum() == position.size.signum() {
            // Partial close: average entry unchanged.
            position.size = remaining;
            position.last_update = Some(now);
        } else {
            // Reversal: the remainder opens a new position at the fill.
            position.size = remaining;
            position.avg_entry_price = fill_price;
            position.opened_at = Some(now);
            position.last_update = Some(now);
        }

        Some(trade)
    }

    /// Recompute unrealized P&L against the latest known close per symbol
    /// and refresh account equity. Symbols without a fresh close keep their
    /// previous mark. Returns the new equity.
    pub fn mark_to_market(
        &mut self,
        last_close: &HashMap<String, f64>,
        now: DateTime<Utc>,
    ) -> f64 {
        let mut unrealized_total = 0.0;
        for position in self.positions.values_mut() {
            if position.is_flat() {
                position.unrealized_pnl = 0.0;
                continue;
            }
            if let (Some(&close), Some(contract)) = (
                last_close.get(&position.symbol),
                contract_for(&position.symbol),
            ) {
                position.unrealized_pnl =
                    contract.pnl(position.avg_entry_price, close, position.size);
                position.last_update = Some(now);
            }
            unrealized_total += position.unrealized_pnl;
        }

        self.account.equity = self.account.balance + unrealized_total;

        #[cfg(debug_assertions)]
        {
            let check: f64 = self
                .positions
                .values()
                .map(|p| p.unrealized_pnl)
                .sum::<f64>()
                + self.account.balance;
            debug_assert!(
                (self.account.equity - check).abs() < 1e-6,
                "equity accounting violated: equity={} balance+unrealized={check}",
                self.account.equity
            );
        }

        self.account.equity
    }
}
