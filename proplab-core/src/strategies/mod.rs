//! Reference strategies exercising the engine's order paths.

pub mod bracket_breakout;
pub mod sma_cross;

pub use bracket_breakout::BracketBreakout;
pub use sma_cross::SmaCross;
