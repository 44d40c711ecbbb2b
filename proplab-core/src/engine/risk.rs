//! Risk engine — prop-firm rule evaluation per bar-group.
//!
//! Runs after the ledger's equity update and before the strategy callback:
//! 1. Day rollover (EOD-trailing high-water-mark update, daily counters)
//! 2. Daily loss limit on realized balance
//! 3. Trailing drawdown against the high-water-mark
//! 4. Position-close-time forced flatten
//! 5. On any halt: liquidate everything, cancel all working orders, and
//!    stay halted for the rest of the run
//!
//! The risk engine only reads account state and writes the halt flag, day
//! markers, and high-water-mark; liquidation itself goes back through the
//! order book, driven by the verdict returned here.

use crate::config::DrawdownMode;
use crate::domain::{Account, HaltReason};
use chrono::{DateTime, Utc};

/// What the driver must do after an evaluation.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RiskVerdict {
    /// Newly raised halt, if any. The account flag is already set.
    pub halt: Option<HaltReason>,
    /// Force-close every open position (halt or close-time).
    pub flatten: bool,
}

pub struct RiskEngine {
    /// Equity at the end of the previous evaluation; the prior day's
    /// closing equity at rollover time.
    prev_group_equity: Option<f64>,
}

impl RiskEngine {
    pub fn new() -> Self {
        Self {
            prev_group_equity: None,
        }
    }

    pub fn evaluate(&mut self, account: &mut Account, now: DateTime<Utc>) -> RiskVerdict {
        let mut verdict = RiskVerdict::default();
        let day = now.date_naive();

        // 1. Day rollover.
        if account.current_day != Some(day) {
            if account.current_day.is_some()
                && account.firm.drawdown_mode == DrawdownMode::EodTrailing
            {
                if let Some(prev_close) = self.prev_group_equity {
                    if prev_close > account.high_water_mark {
                        account.high_water_mark = prev_close;
                    }
                }
            }
            account.current_day = Some(day);
            account.daily_start_balance = account.balance;
            account.flattened_today = false;
        }

        if account.is_halted() {
            // Breached accounts stay breached. Only the close-time flatten
            // still applies — it covers positions regardless of halt state.
            if now.time() >= account.firm.position_close_time && !account.flattened_today {
                account.flattened_today = true;
                verdict.flatten = true;
            }
            self.prev_group_equity = Some(account.equity);
            return verdict;
        }

        // 2. Daily loss limit (realized).
        if account.balance - account.daily_start_balance <= -account.firm.max_daily_loss {
            account.halt(HaltReason::DailyLossBreach);
            verdict.halt = Some(HaltReason::DailyLossBreach);
        }

        // 3. Trailing drawdown.
        if verdict.halt.is_none() {
            if account.firm.drawdown_mode == DrawdownMode::IntradayTrailing
                && account.equity > account.high_water_mark
            {
                account.high_water_mark = account.equity;
            }
            if account.firm.drawdown_mode != DrawdownMode::Disabled
                && account.equity <= account.high_water_mark - account.firm.max_loss
            {
                account.halt(HaltReason::MaxLossBreach);
                verdict.halt = Some(HaltReason::MaxLossBreach);
            }
        }

        // 4. Position close time. Applies regardless of halt state.
        if now.time() >= account.firm.position_close_time && !account.flattened_today {
            account.flattened_today = true;
            verdict.flatten = true;
        }

        // 5. A halt always flattens.
        if verdict.halt.is_some() {
            verdict.flatten = true;
        }

        self.prev_group_equity = Some(account.equity);
        verdict
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new()
    }
}
