//! Fill evaluation — does a bar fill a given order, and at what price?
//!
//! Only the bar's OHLC is known; no intrabar price path exists, so fills
//! use first-touch/worst-case heuristics:
//! - Market: fills at the open, the first price known after submission.
//! - Limit buy: fills if `low <= limit`; at the open on a favorable gap
//!   (`open <= limit`), else at the limit. Mirrored for sells.
//! - Stop buy: triggers if `high >= stop`; fills at `max(stop, open)`,
//!   which charges the gap as slippage. Mirrored for sells.
//! - Stop-limit: the stop condition latches, then the limit condition is
//!   evaluated against the remainder of the same bar's range.
//!
//! Every decision here is a pure function of one bar and the order's
//! current state, evaluated exactly once per bar.

use crate::domain::{Bar, Order, OrderSide, OrderType};

/// Result of evaluating an order against one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerResult {
    /// Order does not fill on this bar.
    NoTrigger,
    /// Order fills completely at this price.
    Fill { price: f64 },
    /// Stop-limit only: the stop condition was met but the limit price was
    /// not reachable within this bar. The order latches and rests as a
    /// limit order.
    StopTriggeredLimitPending,
}

/// Evaluate one active order against one bar.
pub fn check_trigger(order: &Order, bar: &Bar) -> TriggerResult {
    match order.order_type {
        OrderType::Market => TriggerResult::Fill { price: bar.open },
        OrderType::Limit { limit_price } => check_limit(order.side, limit_price, bar),
        OrderType::StopMarket { stop_price } => check_stop(order.side, stop_price, bar),
        OrderType::StopLimit {
            stop_price,
            limit_price,
        } => check_stop_limit(order, stop_price, limit_price, bar),
    }
}

/// Limit fill check.
///
/// Buy: reachable if `low <= limit`; fills at the open when the bar opens
/// at or through the limit (price improvement), else at the limit.
fn check_limit(side: OrderSide, limit: f64, bar: &Bar) -> TriggerResult {
    match side {
        OrderSide::Buy => {
            if bar.low <= limit {
                let price = if bar.open <= limit { bar.open } else { limit };
                TriggerResult::Fill { price }
            } else {
                TriggerResult::NoTrigger
            }
        }
        OrderSide::Sell => {
            if bar.high >= limit {
                let price = if bar.open >= limit { bar.open } else { limit };
                TriggerResult::Fill { price }
            } else {
                TriggerResult::NoTrigger
            }
        }
    }
}

/// Stop-market fill check.
///
/// Buy: triggers if `high >= stop`, fills at `max(stop, open)` — an
/// opening gap through the stop fills at the worse open.
fn check_stop(side: OrderSide, stop: f64, bar: &Bar) -> TriggerResult {
    match side {
        OrderSide::Buy => {
            if bar.high >= stop {
                TriggerResult::Fill {
                    price: stop.max(bar.open),
                }
            } else {
                TriggerResult::NoTrigger
            }
        }
        OrderSide::Sell => {
            if bar.low <= stop {
                TriggerResult::Fill {
                    price: stop.min(bar.open),
                }
            } else {
                TriggerResult::NoTrigger
            }
        }
    }
}

/// Stop-limit: two stages. Until the stop latches, the stop condition
/// gates everything; once latched (this bar or a previous one), only the
/// limit condition matters.
fn check_stop_limit(order: &Order, stop: f64, limit: f64, bar: &Bar) -> TriggerResult {
    if order.stop_triggered {
        return check_limit(order.side, limit, bar);
    }

    let stop_hit = match order.side {
        OrderSide::Buy => bar.high >= stop,
        OrderSide::Sell => bar.low <= stop,
    };
    if !stop_hit {
        return TriggerResult::NoTrigger;
    }

    match check_limit(order.side, limit, bar) {
        TriggerResult::Fill { price } => TriggerResult::Fill { price },
        _ => TriggerResult::StopTriggeredLimitPending,
    }
}
