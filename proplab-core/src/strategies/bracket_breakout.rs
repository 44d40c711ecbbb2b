//! Breakout entry managed by an OCO bracket.
//!
//! Watches the rolling high of the last `lookback` bars; a close above it
//! submits a market entry wrapped in take-profit/stop-loss legs. One
//! bracket at a time — exercises the OCO path end to end.

use crate::domain::{Order, OrderId, OrderSide, OrderStatus, TradeRecord};
use crate::engine::order_book::{BracketSpec, EntryType};
use crate::strategy::{BarCtx, Strategy};

pub struct BracketBreakout {
    symbol: String,
    lookback: usize,
    size: u32,
    take_profit_ticks: u32,
    stop_loss_ticks: u32,
    highs: Vec<f64>,
    entry_id: Option<OrderId>,
}

impl BracketBreakout {
    pub fn new(
        symbol: impl Into<String>,
        lookback: usize,
        size: u32,
        take_profit_ticks: u32,
        stop_loss_ticks: u32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            lookback,
            size,
            take_profit_ticks,
            stop_loss_ticks,
            highs: Vec::new(),
            entry_id: None,
        }
    }

    fn in_flight(&self) -> bool {
        self.entry_id.is_some()
    }
}

impl Strategy for BracketBreakout {
    fn on_bar(&mut self, ctx: &mut BarCtx<'_>) {
        let Some(bar) = ctx.bar(&self.symbol) else {
            return;
        };
        let close = bar.close;
        let high = bar.high;

        let prior_high = if self.highs.len() >= self.lookback {
            self.highs[self.highs.len() - self.lookback..]
                .iter()
                .cloned()
                .fold(f64::MIN, f64::max)
        } else {
            f64::MAX
        };
        self.highs.push(high);

        if close > prior_high && !self.in_flight() && ctx.position(&self.symbol) == 0 {
            if let Ok(ids) = ctx.submit_bracket(BracketSpec {
                symbol: self.symbol.clone(),
                side: OrderSide::Buy,
                size: self.size,
                entry: EntryType::Market,
                take_profit_ticks: self.take_profit_ticks,
                stop_loss_ticks: self.stop_loss_ticks,
            }) {
                self.entry_id = Some(ids.entry);
            }
        }
    }

    fn on_order_update(&mut self, order: &Order) {
        // A dead entry frees the slot for the next breakout.
        if Some(order.id) == self.entry_id
            && matches!(
                order.status,
                OrderStatus::Cancelled { .. } | OrderStatus::Rejected { .. } | OrderStatus::Expired
            )
        {
            self.entry_id = None;
        }
    }

    fn on_trade_closed(&mut self, trade: &TradeRecord) {
        if trade.symbol == self.symbol {
            self.entry_id = None;
        }
    }
}
