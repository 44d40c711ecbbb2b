//! Run fingerprinting — a deterministic content hash over run outputs.
//!
//! Two runs from the same bars, strategy decisions, and configuration must
//! produce byte-identical trade sequences and equity curves. The
//! fingerprint makes that property checkable: hash the canonical JSON of
//! the outputs with BLAKE3 and compare hex digests.

use crate::engine::driver::RunResult;
use serde_json::json;

/// BLAKE3 hex digest of the run's trades, equity curve, and terminal
/// status.
pub fn run_fingerprint(result: &RunResult) -> String {
    let canonical = json!({
        "trades": result.trades,
        "equity_curve": result.equity_curve,
        "status": result.status,
    });
    blake3::hash(canonical.to_string().as_bytes())
        .to_hex()
        .to_string()
}
