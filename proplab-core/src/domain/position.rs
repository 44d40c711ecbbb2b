//! Per-symbol net position tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Net position in one symbol.
///
/// `size` is signed: positive long, negative short. A position is destroyed
/// (reset to zero) when its net size returns to zero; the closing fill's
/// P&L is flushed into the account as a completed trade at that moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub size: i64,
    pub avg_entry_price: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub opened_at: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            size: 0,
            avg_entry_price: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            opened_at: None,
            last_update: None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.size > 0
    }

    pub fn is_short(&self) -> bool {
        self.size < 0
    }

    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    /// Reset to flat. Cumulative realized P&L is kept.
    pub fn flatten(&mut self, now: DateTime<Utc>) {
        self.size = 0;
        self.avg_entry_price = 0.0;
        self.unrealized_pnl = 0.0;
        self.opened_at = None;
        self.last_update = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_position_is_flat() {
        let pos = Position::new("MES");
        assert!(pos.is_flat());
        assert!(!pos.is_long());
        assert!(!pos.is_short());
    }

    #[test]
    fn flatten_keeps_realized() {
        let mut pos = Position::new("MES");
        pos.size = 3;
        pos.avg_entry_price = 5000.0;
        pos.realized_pnl = 125.0;
        pos.unrealized_pnl = 50.0;
        pos.flatten(Utc.with_ymd_and_hms(2024, 3, 4, 16, 0, 0).unwrap());
        assert!(pos.is_flat());
        assert_eq!(pos.avg_entry_price, 0.0);
        assert_eq!(pos.unrealized_pnl, 0.0);
        assert_eq!(pos.realized_pnl, 125.0);
        assert!(pos.opened_at.is_none());
    }
}
