//! Moving-average crossover on a single symbol.
//!
//! Buys when the fast SMA crosses above the slow SMA, exits the long when
//! it crosses back below. Long-only; exercises the plain market-order
//! path.

use crate::domain::OrderSide;
use crate::engine::order_book::OrderSpec;
use crate::strategy::{BarCtx, Strategy};

pub struct SmaCross {
    symbol: String,
    fast: usize,
    slow: usize,
    size: u32,
    closes: Vec<f64>,
}

impl SmaCross {
    pub fn new(symbol: impl Into<String>, fast: usize, slow: usize, size: u32) -> Self {
        Self {
            symbol: symbol.into(),
            fast,
            slow,
            size,
            closes: Vec::new(),
        }
    }

    fn sma(&self, window: usize, skip_last: usize) -> Option<f64> {
        let usable = self.closes.len().checked_sub(skip_last)?;
        if usable < window {
            return None;
        }
        let slice = &self.closes[usable - window..usable];
        Some(slice.iter().sum::<f64>() / window as f64)
    }
}

impl Strategy for SmaCross {
    fn on_bar(&mut self, ctx: &mut BarCtx<'_>) {
        let Some(bar) = ctx.bar(&self.symbol) else {
            return;
        };
        self.closes.push(bar.close);

        let (Some(fast_now), Some(slow_now), Some(fast_prev), Some(slow_prev)) = (
            self.sma(self.fast, 0),
            self.sma(self.slow, 0),
            self.sma(self.fast, 1),
            self.sma(self.slow, 1),
        ) else {
            return;
        };

        let net = ctx.position(&self.symbol);
        let crossed_up = fast_prev <= slow_prev && fast_now > slow_now;
        let crossed_down = fast_prev >= slow_prev && fast_now < slow_now;

        if crossed_up && net == 0 {
            let _ = ctx.submit(OrderSpec::market(&self.symbol, OrderSide::Buy, self.size));
        } else if crossed_down && net > 0 {
            let _ = ctx.submit(OrderSpec::market(
                &self.symbol,
                OrderSide::Sell,
                net as u32,
            ));
        }
    }
}
