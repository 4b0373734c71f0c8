//! Run diagnostics: timings, cache statistics, warnings, notices.

use std::time::Duration;

use serde::Serialize;

use crate::rows::ParseWarnings;

/// Wall-clock timings per engine phase.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhaseTimings {
    pub normalize: Duration,
    pub phase1_regular: Duration,
    pub phase15_foreign: Duration,
    pub phase2_many_to_one: Duration,
    pub phase2b_one_to_many: Duration,
    pub assemble: Duration,
    pub total: Duration,
}

/// Fuzzy-cache statistics for one run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Diagnostics attached to every reconciliation result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    /// Per-phase wall-clock timings
    pub timings: PhaseTimings,
    /// Fuzzy-score cache statistics
    pub cache: CacheStats,
    /// Non-blank cells that failed to parse, per table
    pub ledger_parse_warnings: usize,
    pub statement_parse_warnings: usize,
    /// Human-readable notices (threshold stops, skipped phases, size warnings)
    pub notices: Vec<String>,
}

impl Diagnostics {
    /// Record the parse warnings gathered while building the row arena.
    pub fn record_parse_warnings(&mut self, warnings: ParseWarnings) {
        self.ledger_parse_warnings = warnings.ledger;
        self.statement_parse_warnings = warnings.statement;
    }

    /// Append a notice.
    pub fn notice(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }
}
