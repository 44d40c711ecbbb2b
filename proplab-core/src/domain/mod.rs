//! Domain types for the simulation core.

pub mod account;
pub mod bar;
pub mod contract;
pub mod ids;
pub mod order;
pub mod position;
pub mod trade;

pub use account::{Account, HaltReason};
pub use bar::{Bar, Timeframe};
pub use contract::{contract_for, known_symbols, ContractSpec};
pub use ids::{IdGen, OcoGroupId, OrderId, TradeId};
pub use order::{
    OcoGroup, OcoState, Order, OrderAuditEntry, OrderRole, OrderSide, OrderStatus, OrderType,
};
pub use position::Position;
pub use trade::{TradeRecord, TradeSide};

/// Symbol type alias
pub type Symbol = String;
