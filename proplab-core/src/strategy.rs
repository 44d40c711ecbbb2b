//! Strategy capability interface and the per-bar context.
//!
//! The engine holds `&mut dyn Strategy` — never a concrete type. Order
//! requests made during `on_bar` are queued on the context and applied
//! only after the current bar-group's fill/risk evaluation completes, so a
//! new order is first evaluated on the next bar-group, never retroactively
//! against the bar that produced it. Ids are reserved at request time, so
//! the strategy can correlate later notifications.

use crate::clock::BarGroup;
use crate::domain::{
    Account, Bar, IdGen, OcoGroupId, Order, OrderId, Position, TradeRecord,
};
use crate::engine::order_book::{
    validate_bracket_spec, validate_spec, BracketIds, BracketSpec, OrderBookError, OrderSpec,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// User strategy callbacks.
///
/// `initialize` runs once before the first bar-group. `on_bar` runs once
/// per bar-group with read access to the latest market/account state and
/// write access limited to order submission and cancellation.
/// `on_order_update` fires after an order reaches `Filled`, `Cancelled`,
/// `Rejected`, or `Expired`; `on_trade_closed` fires when a position
/// reduction emits a completed trade.
pub trait Strategy {
    fn initialize(&mut self) {}

    fn on_bar(&mut self, ctx: &mut BarCtx<'_>);

    fn on_order_update(&mut self, _order: &Order) {}

    fn on_trade_closed(&mut self, _trade: &TradeRecord) {}
}

/// An order action queued during `on_bar`.
#[derive(Debug, Clone)]
pub enum QueuedAction {
    Submit {
        id: OrderId,
        spec: OrderSpec,
    },
    SubmitBracket {
        ids: BracketIds,
        group: OcoGroupId,
        spec: BracketSpec,
    },
    Cancel {
        id: OrderId,
    },
    CancelAll {
        symbol: Option<String>,
    },
}

/// Read access to market/account state plus the order request queue.
pub struct BarCtx<'a> {
    group: &'a BarGroup,
    latest_bars: &'a HashMap<String, Bar>,
    positions: &'a HashMap<String, Position>,
    account: &'a Account,
    id_gen: &'a mut IdGen,
    actions: &'a mut Vec<QueuedAction>,
}

impl<'a> BarCtx<'a> {
    pub(crate) fn new(
        group: &'a BarGroup,
        latest_bars: &'a HashMap<String, Bar>,
        positions: &'a HashMap<String, Position>,
        account: &'a Account,
        id_gen: &'a mut IdGen,
        actions: &'a mut Vec<QueuedAction>,
    ) -> Self {
        Self {
            group,
            latest_bars,
            positions,
            account,
            id_gen,
            actions,
        }
    }

    // ── Market state ───────────────────────────────────────────────────

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.group.timestamp
    }

    /// Bar for the symbol in the current group, if it traded this instant.
    pub fn bar(&self, symbol: &str) -> Option<&Bar> {
        self.group.bar(symbol)
    }

    /// Most recent bar seen for the symbol, current group or earlier.
    pub fn latest_bar(&self, symbol: &str) -> Option<&Bar> {
        self.latest_bars.get(symbol)
    }

    /// Latest known close for the symbol.
    pub fn close(&self, symbol: &str) -> Option<f64> {
        self.latest_bars.get(symbol).map(|b| b.close)
    }

    // ── Account state ──────────────────────────────────────────────────

    pub fn account(&self) -> &Account {
        self.account
    }

    /// Signed net position size (0 when flat).
    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).map_or(0, |p| p.size)
    }

    pub fn position_record(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol).filter(|p| !p.is_flat())
    }

    // ── Order actions ──────────────────────────────────────────────────

    /// Queue a standalone order. The returned id is final; acceptance or
    /// rejection is reported through `on_order_update` after this group's
    /// evaluation completes. A malformed request errors immediately and is
    /// also recorded as a rejected order.
    pub fn submit(&mut self, spec: OrderSpec) -> Result<OrderId, OrderBookError> {
        let id = self.id_gen.next_order_id();
        let check = validate_spec(&spec);
        self.actions.push(QueuedAction::Submit { id, spec });
        check.map(|()| id)
    }

    /// Queue a bracket: entry plus OCO take-profit/stop-loss legs priced in
    /// ticks from the entry fill.
    pub fn submit_bracket(&mut self, spec: BracketSpec) -> Result<BracketIds, OrderBookError> {
        let ids = BracketIds {
            entry: self.id_gen.next_order_id(),
            take_profit: self.id_gen.next_order_id(),
            stop_loss: self.id_gen.next_order_id(),
        };
        let group = self.id_gen.next_oco_group_id();
        let check = validate_bracket_spec(&spec);
        self.actions.push(QueuedAction::SubmitBracket { ids, group, spec });
        check.map(|()| ids)
    }

    /// Queue a cancel. Cancelling an already-finished order is a no-op.
    pub fn cancel(&mut self, id: OrderId) {
        self.actions.push(QueuedAction::Cancel { id });
    }

    /// Queue a cancel of every working order, optionally for one symbol.
    pub fn cancel_all(&mut self, symbol: Option<&str>) {
        self.actions.push(QueuedAction::CancelAll {
            symbol: symbol.map(str::to_string),
        });
    }
}
