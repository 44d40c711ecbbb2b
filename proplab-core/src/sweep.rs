//! Parameter sweep — independent runs in parallel.
//!
//! Account-wide risk rules make a single run strictly sequential, but
//! separate runs share nothing. Each job gets its own engine, account,
//! order book, and strategy instance; rayon fans the jobs out across
//! threads.

use crate::config::EngineConfig;
use crate::domain::Timeframe;
use crate::engine::driver::{Backtest, EngineError, RunStatus};
use crate::strategy::Strategy;
use crate::synthetic::{random_walk_series, reference_price};
use chrono::{DateTime, Utc};
use rayon::prelude::*;

/// One sweep cell: a firm configuration against one synthetic market.
#[derive(Debug, Clone)]
pub struct SweepJob {
    pub label: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start: DateTime<Utc>,
    pub bars: usize,
    pub seed: u64,
    pub config: EngineConfig,
}

/// Condensed outcome of one sweep cell.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub label: String,
    pub status: RunStatus,
    pub final_equity: f64,
    pub trade_count: usize,
    pub fingerprint: String,
}

/// Run every job in parallel. `make_strategy` is called once per job on
/// the worker thread, so strategies never cross runs.
pub fn run_sweep<F>(jobs: &[SweepJob], make_strategy: F) -> Result<Vec<SweepOutcome>, EngineError>
where
    F: Fn() -> Box<dyn Strategy> + Sync,
{
    jobs.par_iter()
        .map(|job| {
            let series = random_walk_series(
                &job.symbol,
                job.timeframe,
                job.start,
                job.bars,
                reference_price(&job.symbol),
                job.seed,
            );
            let mut strategy = make_strategy();
            let backtest = Backtest::new(vec![series], strategy.as_mut(), job.config.clone())?;
            let result = backtest.run();
            Ok(SweepOutcome {
                label: job.label.clone(),
                status: result.status,
                final_equity: result.final_equity,
                trade_count: result.trades.len(),
                fingerprint: result.fingerprint(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropFirmConfig;
    use crate::strategies::SmaCross;
    use chrono::TimeZone;

    fn jobs() -> Vec<SweepJob> {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
        PropFirmConfig::preset_names()
            .iter()
            .map(|name| SweepJob {
                label: name.to_string(),
                symbol: "MES".into(),
                timeframe: Timeframe::Min1,
                start,
                bars: 300,
                seed: 11,
                config: EngineConfig::new(PropFirmConfig::preset(name).unwrap()),
            })
            .collect()
    }

    #[test]
    fn sweep_runs_every_job() {
        let outcomes = run_sweep(&jobs(), || Box::new(SmaCross::new("MES", 5, 20, 1))).unwrap();
        assert_eq!(outcomes.len(), PropFirmConfig::preset_names().len());
    }

    #[test]
    fn identical_jobs_produce_identical_fingerprints() {
        let mut jobs = jobs();
        jobs.truncate(1);
        let a = run_sweep(&jobs, || Box::new(SmaCross::new("MES", 5, 20, 1))).unwrap();
        let b = run_sweep(&jobs, || Box::new(SmaCross::new("MES", 5, 20, 1))).unwrap();
        assert_eq!(a[0].fingerprint, b[0].fingerprint);
    }
}
