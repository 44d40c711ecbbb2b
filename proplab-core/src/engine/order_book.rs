//! Order book state machine — order lifecycle, OCO groups, and brackets.
//!
//! The order book is the central registry for every order in a run. It
//! manages:
//! - Order storage and lookup (working + historical, one arena)
//! - State transitions (Created → Submitted → Pending/Active → terminal)
//! - OCO enforcement (one exit leg's fill cancels the sibling before any
//!   other order is processed)
//! - Bracket leg activation and repricing when the entry fills
//! - Audit trail for every state transition
//!
//! The order book does NOT decide whether a bar fills an order — that is
//! the execution module's job. It also performs no risk checks; the driver
//! rejects requests (halt, contract caps) before they reach `submit`.

use crate::config::{BracketLatency, ExitPriority};
use crate::domain::{
    contract_for, OcoGroup, OcoGroupId, OcoState, Order, OrderAuditEntry, OrderId, OrderRole,
    OrderSide, OrderStatus, OrderType,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// A standalone order request.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    pub symbol: String,
    pub side: OrderSide,
    pub size: u32,
    pub order_type: OrderType,
}

impl OrderSpec {
    pub fn market(symbol: impl Into<String>, side: OrderSide, size: u32) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            order_type: OrderType::Market,
        }
    }

    pub fn limit(symbol: impl Into<String>, side: OrderSide, size: u32, limit_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            order_type: OrderType::Limit { limit_price },
        }
    }

    pub fn stop(symbol: impl Into<String>, side: OrderSide, size: u32, stop_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            order_type: OrderType::StopMarket { stop_price },
        }
    }

    pub fn stop_limit(
        symbol: impl Into<String>,
        side: OrderSide,
        size: u32,
        stop_price: f64,
        limit_price: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            order_type: OrderType::StopLimit {
                stop_price,
                limit_price,
            },
        }
    }

    pub fn signed_size(&self) -> i64 {
        match self.side {
            OrderSide::Buy => i64::from(self.size),
            OrderSide::Sell => -i64::from(self.size),
        }
    }
}

/// Entry order kind for a bracket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryType {
    Market,
    Limit(f64),
    Stop(f64),
}

/// A bracket request: entry plus take-profit/stop-loss legs expressed in
/// ticks from the entry fill price.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketSpec {
    pub symbol: String,
    pub side: OrderSide,
    pub size: u32,
    pub entry: EntryType,
    pub take_profit_ticks: u32,
    pub stop_loss_ticks: u32,
}

/// The id triple a bracket submission produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketIds {
    pub entry: OrderId,
    pub take_profit: OrderId,
    pub stop_loss: OrderId,
}

/// Side effects of a fill: OCO siblings cancelled and bracket legs
/// activated in the same logical step.
#[derive(Debug, Default, Clone)]
pub struct FillOutcome {
    pub cancelled_siblings: Vec<OrderId>,
    pub activated_legs: Vec<OrderId>,
}

/// Errors from order book operations.
#[derive(Debug, Error)]
pub enum OrderBookError {
    #[error("invalid order request: {0}")]
    InvalidRequest(String),

    #[error("unknown contract symbol '{0}'")]
    UnknownContract(String),

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("order {0} is already terminal ({1})")]
    AlreadyTerminal(OrderId, String),
}

/// Validate an order request shape: positive size, required prices present
/// and positive, known contract.
pub fn validate_spec(spec: &OrderSpec) -> Result<(), OrderBookError> {
    if spec.size == 0 {
        return Err(OrderBookError::InvalidRequest(
            "size must be positive".into(),
        ));
    }
    if contract_for(&spec.symbol).is_none() {
        return Err(OrderBookError::UnknownContract(spec.symbol.clone()));
    }
    let price_ok = |p: f64| p.is_finite() && p > 0.0;
    match spec.order_type {
        OrderType::Market => {}
        OrderType::Limit { limit_price } => {
            if !price_ok(limit_price) {
                return Err(OrderBookError::InvalidRequest(
                    "limit order requires a positive limit price".into(),
                ));
            }
        }
        OrderType::StopMarket { stop_price } => {
            if !price_ok(stop_price) {
                return Err(OrderBookError::InvalidRequest(
                    "stop order requires a positive stop price".into(),
                ));
            }
        }
        OrderType::StopLimit {
            stop_price,
            limit_price,
        } => {
            if !price_ok(stop_price) || !price_ok(limit_price) {
                return Err(OrderBookError::InvalidRequest(
                    "stop-limit order requires positive stop and limit prices".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Validate a bracket request shape.
pub fn validate_bracket_spec(spec: &BracketSpec) -> Result<(), OrderBookError> {
    if spec.size == 0 {
        return Err(OrderBookError::InvalidRequest(
            "size must be positive".into(),
        ));
    }
    if contract_for(&spec.symbol).is_none() {
        return Err(OrderBookError::UnknownContract(spec.symbol.clone()));
    }
    if spec.take_profit_ticks == 0 || spec.stop_loss_ticks == 0 {
        return Err(OrderBookError::InvalidRequest(
            "bracket legs require positive tick distances".into(),
        ));
    }
    match spec.entry {
        EntryType::Market => {}
        EntryType::Limit(p) | EntryType::Stop(p) => {
            if !(p.is_finite() && p > 0.0) {
                return Err(OrderBookError::InvalidRequest(
                    "bracket entry requires a positive price".into(),
                ));
            }
        }
    }
    Ok(())
}

/// The order book: one arena of order records plus the OCO group table.
///
/// OCO siblings reference each other by id through the group table — no
/// direct references between order records.
pub struct OrderBook {
    orders: HashMap<OrderId, Order>,
    oco_groups: HashMap<OcoGroupId, OcoGroup>,
    audit_trail: Vec<OrderAuditEntry>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
            oco_groups: HashMap::new(),
            audit_trail: Vec::new(),
        }
    }

    // ── Lookup ─────────────────────────────────────────────────────────

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn oco_group(&self, id: OcoGroupId) -> Option<&OcoGroup> {
        self.oco_groups.get(&id)
    }

    /// Orders eligible for fill evaluation (status `Active`).
    pub fn active_orders(&self) -> Vec<&Order> {
        self.orders.values().filter(|o| o.is_active()).collect()
    }

    /// Orders not yet in a terminal state.
    pub fn working_orders(&self) -> Vec<&Order> {
        self.orders.values().filter(|o| o.is_working()).collect()
    }

    pub fn active_orders_for_symbol(&self, symbol: &str) -> Vec<&Order> {
        self.orders
            .values()
            .filter(|o| o.is_active() && o.symbol == symbol)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.orders.values().filter(|o| o.is_active()).count()
    }

    pub fn audit_trail(&self) -> &[OrderAuditEntry] {
        &self.audit_trail
    }

    // ── Submission ─────────────────────────────────────────────────────

    /// Accept a standalone order. The caller supplies the id from the
    /// engine's `IdGen` (ids are promised to the strategy at request time).
    pub fn submit(
        &mut self,
        id: OrderId,
        spec: &OrderSpec,
        now: DateTime<Utc>,
    ) -> Result<(), OrderBookError> {
        validate_spec(spec)?;
        let order = new_order(id, spec, OrderRole::Standalone, None, now);
        self.insert_through_submitted(order, OrderStatus::Active, "activated", now);
        Ok(())
    }

    /// Record a request that was turned away: the order exists only to carry
    /// its `Rejected` status into notifications and the audit trail.
    pub fn insert_rejected(
        &mut self,
        id: OrderId,
        spec: &OrderSpec,
        reason: &str,
        now: DateTime<Utc>,
    ) {
        let mut order = new_order(id, spec, OrderRole::Standalone, None, now);
        let to = OrderStatus::Rejected {
            reason: reason.to_string(),
        };
        order.status = to.clone();
        self.record_audit(id, OrderStatus::Created, to, now, reason);
        self.orders.insert(id, order);
    }

    /// Accept a bracket: entry goes `Active`, both exit legs go `Pending`
    /// until the entry fills. Leg prices are provisional (derived from
    /// `ref_price`) and fixed from the actual entry fill on activation.
    pub fn submit_bracket(
        &mut self,
        ids: BracketIds,
        group_id: OcoGroupId,
        spec: &BracketSpec,
        ref_price: f64,
        now: DateTime<Utc>,
    ) -> Result<(), OrderBookError> {
        validate_bracket_spec(spec)?;
        // validate_bracket_spec guarantees the contract exists
        let tick_size = contract_for(&spec.symbol)
            .map(|c| c.tick_size)
            .unwrap_or(0.0);

        let entry_type = match spec.entry {
            EntryType::Market => OrderType::Market,
            EntryType::Limit(limit_price) => OrderType::Limit { limit_price },
            EntryType::Stop(stop_price) => OrderType::StopMarket { stop_price },
        };
        let entry_spec = OrderSpec {
            symbol: spec.symbol.clone(),
            side: spec.side,
            size: spec.size,
            order_type: entry_type,
        };
        let entry = new_order(ids.entry, &entry_spec, OrderRole::Entry, Some(group_id), now);

        let anchor = match spec.entry {
            EntryType::Limit(p) | EntryType::Stop(p) => p,
            EntryType::Market => ref_price,
        };
        let (tp_type, sl_type) = leg_types(spec.side, anchor, spec, tick_size);

        let exit_side = spec.side.opposite();
        let tp_spec = OrderSpec {
            symbol: spec.symbol.clone(),
            side: exit_side,
            size: spec.size,
            order_type: tp_type,
        };
        let sl_spec = OrderSpec {
            symbol: spec.symbol.clone(),
            side: exit_side,
            size: spec.size,
            order_type: sl_type,
        };
        let take_profit = new_order(
            ids.take_profit,
            &tp_spec,
            OrderRole::TakeProfit,
            Some(group_id),
            now,
        );
        let stop_loss = new_order(
            ids.stop_loss,
            &sl_spec,
            OrderRole::StopLoss,
            Some(group_id),
            now,
        );

        self.oco_groups.insert(
            group_id,
            OcoGroup {
                id: group_id,
                entry_id: ids.entry,
                take_profit_id: ids.take_profit,
                stop_loss_id: ids.stop_loss,
                state: OcoState::PendingEntry,
                take_profit_ticks: spec.take_profit_ticks,
                stop_loss_ticks: spec.stop_loss_ticks,
            },
        );

        self.insert_through_submitted(entry, OrderStatus::Active, "activated", now);
        self.insert_through_submitted(
            take_profit,
            OrderStatus::Pending,
            "awaiting entry fill",
            now,
        );
        self.insert_through_submitted(stop_loss, OrderStatus::Pending, "awaiting entry fill", now);

        Ok(())
    }

    /// Record a bracket request that was turned away as a whole: all three
    /// promised ids become `Rejected` records and the group is resolved.
    pub fn reject_bracket(
        &mut self,
        ids: BracketIds,
        group_id: OcoGroupId,
        spec: &BracketSpec,
        reason: &str,
        now: DateTime<Utc>,
    ) {
        let tick_size = contract_for(&spec.symbol)
            .map(|c| c.tick_size)
            .unwrap_or(0.0);
        let anchor = match spec.entry {
            EntryType::Limit(p) | EntryType::Stop(p) => p,
            EntryType::Market => 0.0,
        };
        let entry_type = match spec.entry {
            EntryType::Market => OrderType::Market,
            EntryType::Limit(limit_price) => OrderType::Limit { limit_price },
            EntryType::Stop(stop_price) => OrderType::StopMarket { stop_price },
        };
        let (tp_type, sl_type) = leg_types(spec.side, anchor, spec, tick_size);
        let exit_side = spec.side.opposite();

        let records = [
            (ids.entry, spec.side, entry_type, OrderRole::Entry),
            (ids.take_profit, exit_side, tp_type, OrderRole::TakeProfit),
            (ids.stop_loss, exit_side, sl_type, OrderRole::StopLoss),
        ];
        for (id, side, order_type, role) in records {
            let record_spec = OrderSpec {
                symbol: spec.symbol.clone(),
                side,
                size: spec.size,
                order_type,
            };
            let mut order = new_order(id, &record_spec, role, Some(group_id), now);
            let to = OrderStatus::Rejected {
                reason: reason.to_string(),
            };
            order.status = to.clone();
            self.record_audit(id, OrderStatus::Created, to, now, reason);
            self.orders.insert(id, order);
        }

        self.oco_groups.insert(
            group_id,
            OcoGroup {
                id: group_id,
                entry_id: ids.entry,
                take_profit_id: ids.take_profit,
                stop_loss_id: ids.stop_loss,
                state: OcoState::Resolved,
                take_profit_ticks: spec.take_profit_ticks,
                stop_loss_ticks: spec.stop_loss_ticks,
            },
        );
    }

    // ── Transitions ────────────────────────────────────────────────────

    /// Record a complete fill. Orders fill whole or not at all.
    ///
    /// For a bracket entry this reprices and activates the exit legs; for
    /// an exit leg it cancels the sibling in the same logical step. The
    /// outcome reports both so the driver can notify the strategy.
    pub fn mark_filled(
        &mut self,
        id: OrderId,
        fill_price: f64,
        now: DateTime<Utc>,
    ) -> Result<FillOutcome, OrderBookError> {
        let order = self.orders.get(&id).ok_or(OrderBookError::NotFound(id))?;
        if !order.is_active() {
            return Err(OrderBookError::AlreadyTerminal(
                id,
                format!("{:?}", order.status),
            ));
        }

        let role = order.role;
        let group_id = order.oco_group_id;
        let from = order.status.clone();

        let order = self.orders.get_mut(&id).unwrap();
        order.status = OrderStatus::Filled;
        order.fill_price = Some(fill_price);
        order.fill_time = Some(now);
        self.record_audit(id, from, OrderStatus::Filled, now, "filled");

        let mut outcome = FillOutcome::default();
        if let Some(group_id) = group_id {
            match role {
                OrderRole::Entry => {
                    outcome.activated_legs = self.activate_legs(group_id, fill_price, now);
                }
                OrderRole::TakeProfit | OrderRole::StopLoss => {
                    outcome.cancelled_siblings = self.cancel_oco_sibling(group_id, id, now);
                }
                OrderRole::Standalone => {}
            }
        }
        Ok(outcome)
    }

    /// Latch a stop-limit whose stop condition was met but whose limit was
    /// not reachable on the triggering bar.
    pub fn latch_stop(&mut self, id: OrderId) {
        if let Some(order) = self.orders.get_mut(&id) {
            order.stop_triggered = true;
        }
    }

    /// Cancel an order. Cancelling an unfilled bracket entry also cancels
    /// its pending legs and resolves the group. Returns every order
    /// cancelled by the operation.
    pub fn cancel(
        &mut self,
        id: OrderId,
        now: DateTime<Utc>,
        reason: &str,
    ) -> Result<Vec<OrderId>, OrderBookError> {
        let order = self.orders.get(&id).ok_or(OrderBookError::NotFound(id))?;
        if order.status.is_terminal() {
            return Err(OrderBookError::AlreadyTerminal(
                id,
                format!("{:?}", order.status),
            ));
        }

        let role = order.role;
        let group_id = order.oco_group_id;

        let mut cancelled = vec![id];
        self.force_cancel(id, now, reason);

        if role == OrderRole::Entry {
            let legs = group_id
                .and_then(|gid| self.oco_groups.get_mut(&gid))
                .map(|group| {
                    group.state = OcoState::Resolved;
                    [group.take_profit_id, group.stop_loss_id]
                });
            if let Some(legs) = legs {
                for leg in legs {
                    if self
                        .orders
                        .get(&leg)
                        .is_some_and(|o| !o.status.is_terminal())
                    {
                        self.force_cancel(leg, now, "bracket entry cancelled");
                        cancelled.push(leg);
                    }
                }
            }
        }
        Ok(cancelled)
    }

    /// Cancel every non-terminal order, optionally restricted to one
    /// symbol. Returns the cancelled ids.
    pub fn cancel_all(
        &mut self,
        symbol: Option<&str>,
        now: DateTime<Utc>,
        reason: &str,
    ) -> Vec<OrderId> {
        let targets: Vec<OrderId> = self
            .orders
            .values()
            .filter(|o| !o.status.is_terminal())
            .filter(|o| symbol.map_or(true, |s| o.symbol == s))
            .map(|o| o.id)
            .collect();

        for &id in &targets {
            self.force_cancel(id, now, reason);
        }
        self.resolve_settled_groups();
        targets
    }

    /// Expire every non-terminal order at the end of the bar stream.
    pub fn expire_open(&mut self, now: DateTime<Utc>) -> Vec<OrderId> {
        let targets: Vec<OrderId> = self
            .orders
            .values()
            .filter(|o| !o.status.is_terminal())
            .map(|o| o.id)
            .collect();

        for &id in &targets {
            let from = self.orders[&id].status.clone();
            let order = self.orders.get_mut(&id).unwrap();
            order.status = OrderStatus::Expired;
            self.record_audit(id, from, OrderStatus::Expired, now, "bar stream exhausted");
        }
        self.resolve_settled_groups();
        targets
    }

    // ── Fill candidate selection ───────────────────────────────────────

    /// Active orders for a symbol, ordered for deterministic evaluation.
    ///
    /// Exit legs activated at `now` are excluded under next-bar latency.
    /// Ordering: the configured exit priority class first (stop-loss legs
    /// before take-profit legs by default), then submission id.
    pub fn fill_candidates(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
        latency: BracketLatency,
        priority: ExitPriority,
    ) -> Vec<OrderId> {
        let mut candidates: Vec<&Order> = self
            .orders
            .values()
            .filter(|o| o.is_active() && o.symbol == symbol)
            .filter(|o| {
                latency == BracketLatency::SameBar || o.activated_at != Some(now)
            })
            .collect();
        candidates.sort_by_key(|o| (priority_class(o.role, priority), o.id));
        candidates.iter().map(|o| o.id).collect()
    }

    // ── Internal helpers ───────────────────────────────────────────────

    fn insert_through_submitted(
        &mut self,
        mut order: Order,
        target: OrderStatus,
        reason: &str,
        now: DateTime<Utc>,
    ) {
        let id = order.id;
        self.record_audit(
            id,
            OrderStatus::Created,
            OrderStatus::Submitted,
            now,
            "submitted",
        );
        self.record_audit(id, OrderStatus::Submitted, target.clone(), now, reason);
        order.status = target;
        self.orders.insert(id, order);
    }

    /// Reprice both legs from the entry fill and move them Pending → Active.
    fn activate_legs(
        &mut self,
        group_id: OcoGroupId,
        entry_fill: f64,
        now: DateTime<Utc>,
    ) -> Vec<OrderId> {
        let Some(group) = self.oco_groups.get_mut(&group_id) else {
            return Vec::new();
        };
        group.state = OcoState::Active;
        let tp_id = group.take_profit_id;
        let sl_id = group.stop_loss_id;
        let tp_ticks = group.take_profit_ticks;
        let sl_ticks = group.stop_loss_ticks;

        let Some(entry) = self.orders.get(&group.entry_id) else {
            return Vec::new();
        };
        let entry_side = entry.side;
        let symbol = entry.symbol.clone();
        let tick_size = contract_for(&symbol).map(|c| c.tick_size).unwrap_or(0.0);

        let spec = BracketSpec {
            symbol,
            side: entry_side,
            size: 0,
            entry: EntryType::Market,
            take_profit_ticks: tp_ticks,
            stop_loss_ticks: sl_ticks,
        };
        let (tp_type, sl_type) = leg_types(entry_side, entry_fill, &spec, tick_size);

        let mut activated = Vec::new();
        for (leg_id, leg_type) in [(tp_id, tp_type), (sl_id, sl_type)] {
            if let Some(leg) = self.orders.get_mut(&leg_id) {
                if leg.status == OrderStatus::Pending {
                    leg.order_type = leg_type;
                    leg.status = OrderStatus::Active;
                    leg.activated_at = Some(now);
                    activated.push(leg_id);
                    self.record_audit(
                        leg_id,
                        OrderStatus::Pending,
                        OrderStatus::Active,
                        now,
                        "entry filled",
                    );
                }
            }
        }
        activated
    }

    /// Cancel the other exit leg the instant one fills.
    fn cancel_oco_sibling(
        &mut self,
        group_id: OcoGroupId,
        filled: OrderId,
        now: DateTime<Utc>,
    ) -> Vec<OrderId> {
        let Some(group) = self.oco_groups.get_mut(&group_id) else {
            return Vec::new();
        };
        group.state = OcoState::Resolved;
        let Some(sibling) = group.sibling_of(filled) else {
            return Vec::new();
        };

        if self
            .orders
            .get(&sibling)
            .is_some_and(|o| !o.status.is_terminal())
        {
            self.force_cancel(sibling, now, "OCO sibling filled");
            vec![sibling]
        } else {
            Vec::new()
        }
    }

    /// Unconditional cancel of a known non-terminal order.
    fn force_cancel(&mut self, id: OrderId, now: DateTime<Utc>, reason: &str) {
        let from = self.orders[&id].status.clone();
        let to = OrderStatus::Cancelled {
            reason: reason.to_string(),
        };
        let order = self.orders.get_mut(&id).unwrap();
        order.status = to.clone();
        self.record_audit(id, from, to, now, reason);
    }

    /// Mark groups whose three orders are all terminal as resolved.
    fn resolve_settled_groups(&mut self) {
        let orders = &self.orders;
        for group in self.oco_groups.values_mut() {
            if group.state == OcoState::Resolved {
                continue;
            }
            let settled = [group.entry_id, group.take_profit_id, group.stop_loss_id]
                .iter()
                .all(|id| orders.get(id).map_or(true, |o| o.status.is_terminal()));
            if settled {
                group.state = OcoState::Resolved;
            }
        }
    }

    fn record_audit(
        &mut self,
        order_id: OrderId,
        from_status: OrderStatus,
        to_status: OrderStatus,
        timestamp: DateTime<Utc>,
        reason: &str,
    ) {
        self.audit_trail.push(OrderAuditEntry {
            order_id,
            timestamp,
            from_status,
            to_status,
            reason: reason.to_string(),
        });
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

fn new_order(
    id: OrderId,
    spec: &OrderSpec,
    role: OrderRole,
    oco_group_id: Option<OcoGroupId>,
    now: DateTime<Utc>,
) -> Order {
    Order {
        id,
        symbol: spec.symbol.clone(),
        side: spec.side,
        size: spec.size,
        order_type: spec.order_type.clone(),
        status: OrderStatus::Created,
        role,
        created_at: now,
        fill_price: None,
        fill_time: None,
        oco_group_id,
        activated_at: None,
        stop_triggered: false,
    }
}

/// Exit leg order types for a bracket, anchored at `anchor` (entry price).
///
/// Long entry: take-profit sells above, stop-loss sells below. Mirrored
/// for shorts.
fn leg_types(
    entry_side: OrderSide,
    anchor: f64,
    spec: &BracketSpec,
    tick_size: f64,
) -> (OrderType, OrderType) {
    let tp_offset = f64::from(spec.take_profit_ticks) * tick_size;
    let sl_offset = f64::from(spec.stop_loss_ticks) * tick_size;
    match entry_side {
        OrderSide::Buy => (
            OrderType::Limit {
                limit_price: anchor + tp_offset,
            },
            OrderType::StopMarket {
                stop_price: anchor - sl_offset,
            },
        ),
        OrderSide::Sell => (
            OrderType::Limit {
                limit_price: anchor - tp_offset,
            },
            OrderType::StopMarket {
                stop_price: anchor + sl_offset,
            },
        ),
    }
}

pub(crate) fn priority_class(role: OrderRole, priority: ExitPriority) -> u8 {
    match priority {
        ExitPriority::StopLossFirst => match role {
            OrderRole::StopLoss => 0,
            OrderRole::TakeProfit => 2,
            _ => 1,
        },
        ExitPriority::TakeProfitFirst => match role {
            OrderRole::TakeProfit => 0,
            OrderRole::StopLoss => 2,
            _ => 1,
        },
    }
}
