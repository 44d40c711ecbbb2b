//! TradeRecord — a completed round trip, emitted when a position closes.

use super::ids::TradeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of the round trip, from the entry side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Long,
    Short,
}

/// A completed trade: entry → exit for some number of contracts.
///
/// Emitted by the ledger, never stored by the core — journals and metric
/// computations are downstream consumers. `commission` is the round-trip
/// commission attributed to the closed contracts (both sides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: TradeId,
    pub symbol: String,
    pub side: TradeSide,
    pub size: u32,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_time: DateTime<Utc>,
    pub gross_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            id: TradeId(1),
            symbol: "MES".into(),
            side: TradeSide::Long,
            size: 2,
            entry_price: 5000.0,
            entry_time: Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap(),
            exit_price: 5010.0,
            exit_time: Utc.with_ymd_and_hms(2024, 3, 4, 15, 10, 0).unwrap(),
            gross_pnl: 100.0,
            commission: 10.0,
            net_pnl: 90.0,
        }
    }

    #[test]
    fn winner_check() {
        assert!(sample_trade().is_winner());
        let mut loser = sample_trade();
        loser.net_pnl = -20.0;
        assert!(!loser.is_winner());
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(trade.id, deser.id);
        assert_eq!(trade.net_pnl, deser.net_pnl);
    }
}
