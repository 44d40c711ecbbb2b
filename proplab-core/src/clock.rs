//! Bar clock — merges per-symbol/per-timeframe bar sequences into one
//! globally ordered stream of simultaneous-timestamp groups.
//!
//! All account-wide risk rules span every instrument at once, so a strict
//! total order over bar-groups is mandatory. The clock validates every
//! input stream up front (monotonic timestamps, sane OHLCV) and fails the
//! run at construction rather than ever emitting out of order. The merged
//! sequence is finite and restartable only by reconstruction.

use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// One independently-timestamped bar sequence: a single symbol × timeframe.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }
}

/// All bars sharing one timestamp, processed atomically.
///
/// A symbol without a bar here is stale: fill evaluation for it is skipped
/// until its next bar arrives.
#[derive(Debug, Clone)]
pub struct BarGroup {
    pub timestamp: DateTime<Utc>,
    /// Sorted by (symbol, timeframe) for deterministic iteration.
    pub bars: Vec<Bar>,
}

impl BarGroup {
    /// First bar for the symbol in this group, if present.
    pub fn bar(&self, symbol: &str) -> Option<&Bar> {
        self.bars.iter().find(|b| b.symbol == symbol)
    }

    pub fn has(&self, symbol: &str) -> bool {
        self.bar(symbol).is_some()
    }
}

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("bars for {symbol} {timeframe} out of order at {timestamp} (after {previous})")]
    OutOfOrder {
        symbol: String,
        timeframe: Timeframe,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("malformed bar for {symbol} {timeframe} at {timestamp}")]
    MalformedBar {
        symbol: String,
        timeframe: Timeframe,
        timestamp: DateTime<Utc>,
    },

    #[error("bar in series {expected_symbol} {expected_timeframe} tagged {found_symbol} {found_timeframe}")]
    StreamMismatch {
        expected_symbol: String,
        expected_timeframe: Timeframe,
        found_symbol: String,
        found_timeframe: Timeframe,
    },

    #[error("duplicate stream {symbol} {timeframe}")]
    DuplicateStream {
        symbol: String,
        timeframe: Timeframe,
    },
}

/// K-way merge over validated bar series.
#[derive(Debug)]
pub struct BarClock {
    series: Vec<BarSeries>,
    /// Next unconsumed index per series.
    cursors: Vec<usize>,
}

impl BarClock {
    /// Validate and build a clock. Every series must be strictly ascending
    /// in timestamp, contain only sane bars tagged with its own
    /// symbol/timeframe, and no (symbol, timeframe) pair may appear twice.
    pub fn new(series: Vec<BarSeries>) -> Result<Self, ClockError> {
        for (i, s) in series.iter().enumerate() {
            for other in &series[..i] {
                if other.symbol == s.symbol && other.timeframe == s.timeframe {
                    return Err(ClockError::DuplicateStream {
                        symbol: s.symbol.clone(),
                        timeframe: s.timeframe,
                    });
                }
            }

            let mut previous: Option<DateTime<Utc>> = None;
            for bar in &s.bars {
                if bar.symbol != s.symbol || bar.timeframe != s.timeframe {
                    return Err(ClockError::StreamMismatch {
                        expected_symbol: s.symbol.clone(),
                        expected_timeframe: s.timeframe,
                        found_symbol: bar.symbol.clone(),
                        found_timeframe: bar.timeframe,
                    });
                }
                if !bar.is_sane() {
                    return Err(ClockError::MalformedBar {
                        symbol: s.symbol.clone(),
                        timeframe: s.timeframe,
                        timestamp: bar.timestamp,
                    });
                }
                if let Some(prev) = previous {
                    if bar.timestamp <= prev {
                        return Err(ClockError::OutOfOrder {
                            symbol: s.symbol.clone(),
                            timeframe: s.timeframe,
                            timestamp: bar.timestamp,
                            previous: prev,
                        });
                    }
                }
                previous = Some(bar.timestamp);
            }
        }

        let cursors = vec![0; series.len()];
        Ok(Self { series, cursors })
    }

    /// Timestamp of the next group without consuming it.
    pub fn peek_timestamp(&self) -> Option<DateTime<Utc>> {
        self.series
            .iter()
            .zip(&self.cursors)
            .filter_map(|(s, &c)| s.bars.get(c).map(|b| b.timestamp))
            .min()
    }
}

impl Iterator for BarClock {
    type Item = BarGroup;

    fn next(&mut self) -> Option<BarGroup> {
        let timestamp = self.peek_timestamp()?;

        let mut bars = Vec::new();
        for (s, cursor) in self.series.iter().zip(self.cursors.iter_mut()) {
            if let Some(bar) = s.bars.get(*cursor) {
                if bar.timestamp == timestamp {
                    bars.push(bar.clone());
                    *cursor += 1;
                }
            }
        }

        bars.sort_by(|a, b| {
            a.symbol
                .cmp(&b.symbol)
                .then_with(|| a.timeframe.as_str().cmp(b.timeframe.as_str()))
        });

        Some(BarGroup { timestamp, bars })
    }
}
