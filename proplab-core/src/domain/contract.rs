//! Micro futures contract specifications and tick-value P&L math.

use serde::Serialize;

/// Futures contract specification. The table is static; specs are only
/// ever serialized outward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractSpec {
    pub symbol: &'static str,
    pub name: &'static str,
    pub tick_size: f64,
    /// Dollars per tick per contract.
    pub tick_value: f64,
    /// Dollars per full point per contract.
    pub point_value: f64,
}

impl ContractSpec {
    /// Dollar P&L for a price move, signed by position direction.
    ///
    /// `contracts` is the signed net size: positive for long, negative for
    /// short.
    pub fn pnl(&self, entry_price: f64, exit_price: f64, contracts: i64) -> f64 {
        let ticks = (exit_price - entry_price) / self.tick_size;
        ticks * self.tick_value * contracts as f64
    }

    /// Price distance of `n` ticks.
    pub fn ticks(&self, n: u32) -> f64 {
        f64::from(n) * self.tick_size
    }
}

/// Micro E-mini S&P 500.
pub static MES: ContractSpec = ContractSpec {
    symbol: "MES",
    name: "Micro E-mini S&P 500",
    tick_size: 0.25,
    tick_value: 1.25,
    point_value: 5.0,
};

/// Micro E-mini Nasdaq-100.
pub static MNQ: ContractSpec = ContractSpec {
    symbol: "MNQ",
    name: "Micro E-mini Nasdaq-100",
    tick_size: 0.25,
    tick_value: 0.50,
    point_value: 2.0,
};

/// Micro Gold.
pub static MGC: ContractSpec = ContractSpec {
    symbol: "MGC",
    name: "Micro Gold",
    tick_size: 0.10,
    tick_value: 1.00,
    point_value: 10.0,
};

/// Micro E-mini Dow.
pub static MYM: ContractSpec = ContractSpec {
    symbol: "MYM",
    name: "Micro E-mini Dow",
    tick_size: 1.00,
    tick_value: 0.50,
    point_value: 0.50,
};

/// Look up a contract specification by symbol.
pub fn contract_for(symbol: &str) -> Option<&'static ContractSpec> {
    match symbol {
        "MES" => Some(&MES),
        "MNQ" => Some(&MNQ),
        "MGC" => Some(&MGC),
        "MYM" => Some(&MYM),
        _ => None,
    }
}

/// Symbols with a known contract specification.
pub fn known_symbols() -> &'static [&'static str] {
    &["MES", "MNQ", "MGC", "MYM"]
}
