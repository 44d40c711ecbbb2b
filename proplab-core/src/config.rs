//! Prop-firm account rules and engine configuration.
//!
//! A `PropFirmConfig` is an immutable value handed to the engine at
//! construction — there is no process-wide configuration state. Firms can
//! come from the built-in preset registry or from a user TOML file.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// How the trailing drawdown reference point moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawdownMode {
    /// High-water-mark raised only at day boundaries, to the prior day's
    /// closing equity.
    EodTrailing,
    /// High-water-mark raised continuously at every evaluation.
    IntradayTrailing,
    /// No trailing drawdown rule.
    Disabled,
}

/// Account rules for one prop firm program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropFirmConfig {
    pub name: String,
    pub initial_balance: f64,
    /// Maximum realized loss allowed within one trading day.
    pub max_daily_loss: f64,
    /// Maximum drawdown from the high-water-mark.
    pub max_loss: f64,
    pub drawdown_mode: DrawdownMode,
    /// Time of day at which all positions are force-closed.
    pub position_close_time: NaiveTime,
    /// Per-symbol net position cap. `None` means uncapped.
    pub max_contracts: Option<u32>,
    /// Evaluation profit target. Reported by consumers, not enforced here.
    pub profit_target: Option<f64>,
}

fn close_time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl PropFirmConfig {
    /// Look up a built-in preset by name (case-insensitive, spaces allowed).
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let key = name.trim().to_lowercase().replace(' ', "_");
        let firm = match key.as_str() {
            "topstep_50k" => Self {
                name: "Topstep 50K".into(),
                initial_balance: 50_000.0,
                max_daily_loss: 1_000.0,
                max_loss: 2_000.0,
                drawdown_mode: DrawdownMode::EodTrailing,
                position_close_time: close_time(16, 0),
                max_contracts: Some(5),
                profit_target: Some(3_000.0),
            },
            "topstep_100k" => Self {
                name: "Topstep 100K".into(),
                initial_balance: 100_000.0,
                max_daily_loss: 2_000.0,
                max_loss: 3_000.0,
                drawdown_mode: DrawdownMode::EodTrailing,
                position_close_time: close_time(16, 0),
                max_contracts: Some(10),
                profit_target: Some(6_000.0),
            },
            "topstep_150k" => Self {
                name: "Topstep 150K".into(),
                initial_balance: 150_000.0,
                max_daily_loss: 3_000.0,
                max_loss: 4_500.0,
                drawdown_mode: DrawdownMode::EodTrailing,
                position_close_time: close_time(16, 0),
                max_contracts: Some(15),
                profit_target: Some(9_000.0),
            },
            "lucid_50k" => Self {
                name: "Lucid 50K".into(),
                initial_balance: 50_000.0,
                max_daily_loss: 1_000.0,
                max_loss: 2_500.0,
                drawdown_mode: DrawdownMode::IntradayTrailing,
                position_close_time: close_time(17, 0),
                max_contracts: Some(5),
                profit_target: Some(2_500.0),
            },
            "lucid_100k" => Self {
                name: "Lucid 100K".into(),
                initial_balance: 100_000.0,
                max_daily_loss: 2_000.0,
                max_loss: 3_500.0,
                drawdown_mode: DrawdownMode::IntradayTrailing,
                position_close_time: close_time(17, 0),
                max_contracts: Some(10),
                profit_target: Some(5_000.0),
            },
            "take_profit_50k" => Self {
                name: "Take Profit Trader 50K".into(),
                initial_balance: 50_000.0,
                max_daily_loss: 1_250.0,
                max_loss: 2_500.0,
                drawdown_mode: DrawdownMode::IntradayTrailing,
                position_close_time: close_time(17, 0),
                max_contracts: Some(5),
                profit_target: Some(3_000.0),
            },
            "take_profit_100k" => Self {
                name: "Take Profit Trader 100K".into(),
                initial_balance: 100_000.0,
                max_daily_loss: 2_500.0,
                max_loss: 3_500.0,
                drawdown_mode: DrawdownMode::IntradayTrailing,
                position_close_time: close_time(17, 0),
                max_contracts: Some(10),
                profit_target: Some(6_000.0),
            },
            _ => return Err(ConfigError::UnknownPreset(name.to_string())),
        };
        Ok(firm)
    }

    /// Names accepted by [`PropFirmConfig::preset`].
    pub fn preset_names() -> &'static [&'static str] {
        &[
            "topstep_50k",
            "topstep_100k",
            "topstep_150k",
            "lucid_50k",
            "lucid_100k",
            "take_profit_50k",
            "take_profit_100k",
        ]
    }

    /// Parse a firm definition from TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a firm definition from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown prop firm preset '{0}'")]
    UnknownPreset(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tie-break when both exit legs of a bracket are satisfiable within the
/// same bar. OHLC granularity cannot order intrabar touches, so this is a
/// policy, not a fact; the conservative default resolves the stop-loss
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPriority {
    StopLossFirst,
    TakeProfitFirst,
}

/// When bracket legs activated by an entry fill become eligible for fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketLatency {
    /// Legs are first evaluated on the bar-group after the entry fill.
    NextBar,
    /// Legs are evaluated against the same bar that filled the entry.
    SameBar,
}

/// Full engine configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub firm: PropFirmConfig,
    /// Commission per contract per side, in dollars.
    pub commission_per_contract: f64,
    pub exit_priority: ExitPriority,
    pub bracket_latency: BracketLatency,
}

impl EngineConfig {
    pub fn new(firm: PropFirmConfig) -> Self {
        Self {
            firm,
            commission_per_contract: 2.50,
            exit_priority: ExitPriority::StopLossFirst,
            bracket_latency: BracketLatency::NextBar,
        }
    }

    pub fn with_commission(mut self, commission_per_contract: f64) -> Self {
        self.commission_per_contract = commission_per_contract;
        self
    }

    pub fn with_exit_priority(mut self, priority: ExitPriority) -> Self {
        self.exit_priority = priority;
        self
    }

    pub fn with_bracket_latency(mut self, latency: BracketLatency) -> Self {
        self.bracket_latency = latency;
        self
    }
}
