//! PropLab CLI — run demo strategies against prop-firm rule sets.
//!
//! Commands:
//! - `run` — one backtest: a named strategy on seeded synthetic bars under
//!   a firm preset or a TOML firm file
//! - `firms` — list the built-in prop-firm presets
//! - `sweep` — every preset in parallel on the same market, side by side

use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use proplab_core::config::{EngineConfig, PropFirmConfig};
use proplab_core::domain::Timeframe;
use proplab_core::engine::driver::{Backtest, RunResult, RunStatus};
use proplab_core::strategies::{BracketBreakout, SmaCross};
use proplab_core::strategy::Strategy;
use proplab_core::sweep::{run_sweep, SweepJob};
use proplab_core::synthetic::{random_walk_series, reference_price};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "proplab",
    about = "PropLab CLI — prop-firm futures backtesting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backtest on synthetic data.
    Run {
        /// Prop firm preset (see `proplab firms`).
        #[arg(long, default_value = "topstep_50k")]
        firm: String,

        /// Path to a TOML firm definition (overrides --firm).
        #[arg(long)]
        firm_config: Option<PathBuf>,

        /// Strategy: sma-cross or bracket-breakout.
        #[arg(long, default_value = "sma-cross")]
        strategy: String,

        /// Contract symbol: MES, MNQ, MGC, MYM.
        #[arg(long, default_value = "MES")]
        symbol: String,

        /// Number of one-minute bars to simulate.
        #[arg(long, default_value_t = 2_000)]
        bars: usize,

        /// RNG seed for the synthetic market.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Commission per contract per side.
        #[arg(long, default_value_t = 2.50)]
        commission: f64,
    },
    /// List the built-in prop-firm presets.
    Firms,
    /// Run every preset in parallel on the same synthetic market.
    Sweep {
        /// Strategy: sma-cross or bracket-breakout.
        #[arg(long, default_value = "sma-cross")]
        strategy: String,

        /// Contract symbol.
        #[arg(long, default_value = "MES")]
        symbol: String,

        /// Number of one-minute bars per run.
        #[arg(long, default_value_t = 2_000)]
        bars: usize,

        /// RNG seed shared by every run.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            firm,
            firm_config,
            strategy,
            symbol,
            bars,
            seed,
            commission,
        } => run_cmd(firm, firm_config, strategy, symbol, bars, seed, commission),
        Commands::Firms => firms_cmd(),
        Commands::Sweep {
            strategy,
            symbol,
            bars,
            seed,
        } => sweep_cmd(strategy, symbol, bars, seed),
    }
}

#[derive(Clone, Copy)]
enum StrategyKind {
    SmaCross,
    BracketBreakout,
}

impl StrategyKind {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "sma-cross" => Ok(StrategyKind::SmaCross),
            "bracket-breakout" => Ok(StrategyKind::BracketBreakout),
            _ => bail!("unknown strategy '{name}'. Valid: sma-cross, bracket-breakout"),
        }
    }

    fn build(self, symbol: &str) -> Box<dyn Strategy> {
        match self {
            StrategyKind::SmaCross => Box::new(SmaCross::new(symbol, 5, 20, 1)),
            StrategyKind::BracketBreakout => Box::new(BracketBreakout::new(symbol, 10, 1, 20, 10)),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_cmd(
    firm: String,
    firm_config: Option<PathBuf>,
    strategy_name: String,
    symbol: String,
    bars: usize,
    seed: u64,
    commission: f64,
) -> Result<()> {
    let firm = match firm_config {
        Some(path) => PropFirmConfig::from_file(&path)?,
        None => PropFirmConfig::preset(&firm)?,
    };
    let firm_name = firm.name.clone();
    let profit_target = firm.profit_target;
    let initial_balance = firm.initial_balance;
    let config = EngineConfig::new(firm).with_commission(commission);

    let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
    let series = random_walk_series(
        &symbol,
        Timeframe::Min1,
        start,
        bars,
        reference_price(&symbol),
        seed,
    );

    let mut strategy = StrategyKind::parse(&strategy_name)?.build(&symbol);
    let result = Backtest::new(vec![series], strategy.as_mut(), config)
        .map_err(|e| anyhow::anyhow!("{e}"))?
        .run();

    print_summary(
        &result,
        &firm_name,
        &strategy_name,
        &symbol,
        initial_balance,
        profit_target,
    );
    Ok(())
}

fn firms_cmd() -> Result<()> {
    println!(
        "{:<18} {:>10} {:>11} {:>9} {:<18} {:>6} {:>9}",
        "Preset", "Balance", "Daily Loss", "Max Loss", "Drawdown", "Close", "Max Cts"
    );
    println!("{}", "-".repeat(88));
    for name in PropFirmConfig::preset_names() {
        let firm = PropFirmConfig::preset(name)?;
        println!(
            "{:<18} {:>10.0} {:>11.0} {:>9.0} {:<18} {:>6} {:>9}",
            name,
            firm.initial_balance,
            firm.max_daily_loss,
            firm.max_loss,
            format!("{:?}", firm.drawdown_mode),
            firm.position_close_time.format("%H:%M").to_string(),
            firm.max_contracts
                .map_or("-".to_string(), |m| m.to_string()),
        );
    }
    Ok(())
}

fn sweep_cmd(strategy_name: String, symbol: String, bars: usize, seed: u64) -> Result<()> {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
    let jobs: Vec<SweepJob> = PropFirmConfig::preset_names()
        .iter()
        .map(|name| {
            Ok(SweepJob {
                label: name.to_string(),
                symbol: symbol.clone(),
                timeframe: Timeframe::Min1,
                start,
                bars,
                seed,
                config: EngineConfig::new(PropFirmConfig::preset(name)?),
            })
        })
        .collect::<Result<_>>()?;

    let kind = StrategyKind::parse(&strategy_name)?;
    let sym = symbol.clone();
    let outcomes =
        run_sweep(&jobs, move || kind.build(&sym)).map_err(|e| anyhow::anyhow!("{e}"))?;

    println!(
        "{:<18} {:>12} {:>8} {:<28} {:>18}",
        "Preset", "Final Eq", "Trades", "Status", "Fingerprint"
    );
    println!("{}", "-".repeat(90));
    for outcome in outcomes {
        let status = match outcome.status {
            RunStatus::Completed => "completed".to_string(),
            RunStatus::HaltedByRiskRule(reason) => format!("HALTED: {reason}"),
        };
        println!(
            "{:<18} {:>12.2} {:>8} {:<28} {:>18}",
            outcome.label,
            outcome.final_equity,
            outcome.trade_count,
            status,
            &outcome.fingerprint[..16],
        );
    }
    Ok(())
}

fn print_summary(
    result: &RunResult,
    firm: &str,
    strategy: &str,
    symbol: &str,
    initial_balance: f64,
    profit_target: Option<f64>,
) {
    let wins = result.trades.iter().filter(|t| t.is_winner()).count();
    let win_rate = if result.trades.is_empty() {
        0.0
    } else {
        wins as f64 / result.trades.len() as f64 * 100.0
    };
    let commission: f64 = result.trades.iter().map(|t| t.commission).sum();

    println!();
    println!("=== Backtest Result ===");
    println!("Firm:           {firm}");
    println!("Strategy:       {strategy} on {symbol}");
    println!("Bar groups:     {}", result.bar_groups);
    match result.status {
        RunStatus::Completed => println!("Status:         completed"),
        RunStatus::HaltedByRiskRule(reason) => println!("Status:         HALTED ({reason})"),
    }
    println!();
    println!("Trades:         {} ({win_rate:.1}% winners)", result.trades.len());
    println!("Commission:     {commission:.2}");
    println!("Final balance:  {:.2}", result.final_balance);
    println!("Final equity:   {:.2}", result.final_equity);
    println!("Net P&L:        {:+.2}", result.final_equity - initial_balance);
    if let Some(target) = profit_target {
        let reached = result.final_equity - initial_balance >= target;
        println!(
            "Profit target:  {target:.0} ({})",
            if reached { "reached" } else { "not reached" }
        );
    }
    println!("Fingerprint:    {}", &result.fingerprint()[..16]);
    println!();
}
