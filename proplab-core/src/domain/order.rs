//! Order types, the order lifecycle state machine, and OCO groups.

use super::ids::{OcoGroupId, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which way the order trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> OrderSide {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

/// Order kind with its price parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    /// Fills at the next bar's open — the first price known after submission.
    Market,
    /// Fills at the limit price or better.
    Limit { limit_price: f64 },
    /// Triggers when price reaches the stop level, then fills as a market
    /// order with gap slippage.
    StopMarket { stop_price: f64 },
    /// Triggers at the stop level, then becomes a limit order evaluated
    /// against the remainder of the same bar's range.
    StopLimit { stop_price: f64, limit_price: f64 },
}

/// Order lifecycle states.
///
/// `Created → Submitted → {Pending | Active} → {Filled | Cancelled |
/// Rejected | Expired}`. `Pending` is reserved for OCO bracket legs waiting
/// on their entry's fill; everything else goes straight to `Active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Constructed, not yet accepted by the order book.
    Created,
    /// Accepted by the order book.
    Submitted,
    /// OCO bracket leg waiting for its entry order to fill.
    Pending,
    /// Eligible for fill evaluation.
    Active,
    /// Completely filled. Orders fill whole or not at all.
    Filled,
    /// Cancelled with a reason (OCO sibling filled, user cancel, halt, ...).
    Cancelled { reason: String },
    /// Rejected before ever becoming active (halt, size limits, bad request).
    Rejected { reason: String },
    /// Never filled by the time the bar stream ended.
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled { .. }
                | OrderStatus::Rejected { .. }
                | OrderStatus::Expired
        )
    }
}

/// Role an order plays in a bracket. Drives the same-bar exit tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRole {
    Standalone,
    Entry,
    TakeProfit,
    StopLoss,
}

/// A single order. Owned exclusively by the order book for its entire
/// lifetime; everything else holds only the `OrderId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    /// Contract count. Always positive; direction comes from `side`.
    pub size: u32,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub role: OrderRole,
    pub created_at: DateTime<Utc>,
    pub fill_price: Option<f64>,
    pub fill_time: Option<DateTime<Utc>>,
    pub oco_group_id: Option<OcoGroupId>,
    /// When an OCO leg left `Pending`. Legs activated within a bar-group are
    /// not eligible for fills in that same group unless zero-bar latency is
    /// configured.
    pub activated_at: Option<DateTime<Utc>>,
    /// Stop-limit latch: the stop condition has been met, only the limit
    /// condition remains.
    pub stop_triggered: bool,
}

impl Order {
    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Active
    }

    pub fn is_working(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Submitted | OrderStatus::Pending | OrderStatus::Active
        )
    }

    /// Net position delta this order produces when filled.
    pub fn signed_size(&self) -> i64 {
        match self.side {
            OrderSide::Buy => i64::from(self.size),
            OrderSide::Sell => -i64::from(self.size),
        }
    }
}

/// OCO bracket group state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcoState {
    /// Entry not yet filled; legs are dormant.
    PendingEntry,
    /// Entry filled; legs are live.
    Active,
    /// One leg filled (sibling cancelled), or the whole group cancelled.
    Resolved,
}

/// One-cancels-other group linking a bracket entry with its exit legs.
///
/// Invariant: at most one of take-profit/stop-loss ever reaches `Filled`;
/// the instant one fills the sibling is cancelled, before any other order
/// is processed.
///
/// Leg prices are expressed in ticks from the entry fill and fixed the
/// moment the entry fills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcoGroup {
    pub id: OcoGroupId,
    pub entry_id: OrderId,
    pub take_profit_id: OrderId,
    pub stop_loss_id: OrderId,
    pub state: OcoState,
    pub take_profit_ticks: u32,
    pub stop_loss_ticks: u32,
}

impl OcoGroup {
    /// The other exit leg, if `id` is one of them.
    pub fn sibling_of(&self, id: OrderId) -> Option<OrderId> {
        if id == self.take_profit_id {
            Some(self.stop_loss_id)
        } else if id == self.stop_loss_id {
            Some(self.take_profit_id)
        } else {
            None
        }
    }
}

/// Audit trail entry for an order state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAuditEntry {
    pub order_id: OrderId,
    pub timestamp: DateTime<Utc>,
    pub from_status: OrderStatus,
    pub to_status: OrderStatus,
    pub reason: String,
}
