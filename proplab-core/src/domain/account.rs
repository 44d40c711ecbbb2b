//! Account state — balance, equity, day tracking, and the sticky halt flag.

use crate::config::PropFirmConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the account was halted. Prop-firm evaluations end on breach; there
/// is no recovery within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    DailyLossBreach,
    MaxLossBreach,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::DailyLossBreach => write!(f, "daily loss breach"),
            HaltReason::MaxLossBreach => write!(f, "max loss breach"),
        }
    }
}

/// Single trading account for one simulation run.
///
/// Mutated only by the ledger (balance/equity) and the risk engine (halt,
/// day markers, high-water-mark), never concurrently.
#[derive(Debug, Clone)]
pub struct Account {
    /// Realized cash.
    pub balance: f64,
    /// `balance + Σ unrealized P&L` across open positions, refreshed every
    /// bar-group.
    pub equity: f64,
    pub current_day: Option<NaiveDate>,
    pub daily_start_balance: f64,
    /// Trailing drawdown reference point. Update cadence depends on the
    /// firm's drawdown mode.
    pub high_water_mark: f64,
    /// Positions were force-closed at the firm's close time; no new entries
    /// until the next trading day.
    pub flattened_today: bool,
    pub halted: Option<HaltReason>,
    pub firm: PropFirmConfig,
}

impl Account {
    pub fn new(firm: PropFirmConfig) -> Self {
        let balance = firm.initial_balance;
        Self {
            balance,
            equity: balance,
            current_day: None,
            daily_start_balance: balance,
            high_water_mark: balance,
            flattened_today: false,
            halted: None,
            firm,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Record a halt. The first reason wins; a halted account stays halted.
    pub fn halt(&mut self, reason: HaltReason) {
        if self.halted.is_none() {
            self.halted = Some(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropFirmConfig;

    #[test]
    fn new_account_starts_at_initial_balance() {
        let firm = PropFirmConfig::preset("topstep_50k").unwrap();
        let account = Account::new(firm);
        assert_eq!(account.balance, 50_000.0);
        assert_eq!(account.equity, 50_000.0);
        assert_eq!(account.high_water_mark, 50_000.0);
        assert!(!account.is_halted());
    }

    #[test]
    fn halt_is_sticky_first_reason_wins() {
        let firm = PropFirmConfig::preset("topstep_50k").unwrap();
        let mut account = Account::new(firm);
        account.halt(HaltReason::DailyLossBreach);
        account.halt(HaltReason::MaxLossBreach);
        assert_eq!(account.halted, Some(HaltReason::DailyLossBreach));
    }
}
