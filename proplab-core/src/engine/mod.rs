//! Engine internals: order book, fill evaluation, ledger, risk rules, and
//! the per-bar-group driver.

pub mod driver;
pub mod execution;
pub mod ledger;
pub mod order_book;
pub mod risk;

pub use driver::{Backtest, EngineError, EquityPoint, RunResult, RunStatus};
pub use execution::{check_trigger, TriggerResult};
pub use ledger::Ledger;
pub use order_book::{
    BracketIds, BracketSpec, EntryType, OrderBook, OrderBookError, OrderSpec,
};
pub use risk::{RiskEngine, RiskVerdict};
