//! PropLab Core — a deterministic prop-firm futures backtesting engine.
//!
//! The crate simulates order execution against historical price bars while
//! enforcing prop-firm account rules:
//! - Bar clock: merges per-symbol/per-timeframe streams into one strictly
//!   ordered sequence of simultaneous-timestamp groups
//! - Order book: the order lifecycle state machine, OCO bracket linking,
//!   and deterministic fill tie-breaks
//! - Ledger: positions, realized/unrealized P&L, commission, the
//!   `equity == balance + unrealized` identity
//! - Risk engine: daily loss limits, EOD/intraday trailing drawdown,
//!   position caps, close-time flatten, sticky halts
//! - Strategy driver: fixed callback interface with queued, next-bar order
//!   submission
//!
//! A run is single-threaded and fully deterministic; `sweep` parallelizes
//! across independent runs only.

pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod strategies;
pub mod strategy;
pub mod sweep;
pub mod synthetic;
