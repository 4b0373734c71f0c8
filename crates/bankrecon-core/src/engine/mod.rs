//! The reconciliation engine: phase orchestration.
//!
//! `reconcile` runs normalization, the four matching phases, and result
//! assembly as one synchronous call. Later phases only consume the
//! remainder left by earlier phases; nothing is ever re-matched.

mod foreign;
mod phase1;
mod result;
mod split;
mod subset_sum;

pub use result::{MatchCounts, MatchKind, PairMatch, ReconReport, SplitKind, SplitMatch};

use std::time::Instant;

use tracing::{debug, info};

use crate::diagnostics::{CacheStats, Diagnostics};
use crate::error::ReconResult;
use crate::fuzzy::FuzzyCache;
use crate::index::LedgerIndexes;
use crate::progress::{NoProgress, Progress};
use crate::rows::build_arena;
use crate::settings::MatchSettings;
use crate::table::Table;
use crate::validation::validate_settings;

/// Reconcile a ledger table against a statement table.
///
/// Always returns: configuration problems come back as `Err`, everything
/// else (parse misses, empty inputs, threshold stops) degrades into the
/// report's diagnostics.
pub fn reconcile(
    ledger: &Table,
    statement: &Table,
    settings: &MatchSettings,
) -> ReconResult<ReconReport> {
    reconcile_with_progress(ledger, statement, settings, &mut NoProgress)
}

/// [`reconcile`] with a progress sink called at phase boundaries and
/// periodically inside the split phases.
pub fn reconcile_with_progress(
    ledger: &Table,
    statement: &Table,
    settings: &MatchSettings,
    progress: &mut dyn Progress,
) -> ReconResult<ReconReport> {
    let start = Instant::now();
    validate_settings(settings)?;

    let mut diagnostics = Diagnostics::default();
    let mut cache = FuzzyCache::new();

    progress.update(5, "Normalizing inputs");
    let phase_start = Instant::now();
    let arena = build_arena(ledger, statement, settings)?;
    diagnostics.record_parse_warnings(arena.warnings);
    diagnostics.timings.normalize = phase_start.elapsed();
    info!(
        ledger_rows = arena.ledger.len(),
        statement_rows = arena.statement.len(),
        "inputs normalized"
    );

    // Phase 1: regular matching through the indexes.
    progress.update(10, "Regular matching");
    let phase_start = Instant::now();
    let indexes = LedgerIndexes::build(&arena.ledger);
    debug!(
        dates = indexes.by_date.len(),
        amounts = indexes.by_amount.len(),
        references = indexes.by_reference.len(),
        "ledger indexes built"
    );
    let phase1_out = phase1::run(
        &arena.ledger,
        &arena.statement,
        &indexes,
        settings,
        &mut cache,
    );
    diagnostics.timings.phase1_regular = phase_start.elapsed();
    info!(matches = phase1_out.matches.len(), "regular matching complete");

    // Phase 1.5: foreign credits over the remainder.
    progress.update(40, "Matching foreign credits");
    let phase_start = Instant::now();
    let mut ledger_matched = phase1_out.ledger_matched;
    let foreign_out = foreign::run(
        &arena.ledger,
        &arena.statement,
        &phase1_out.unmatched_statement,
        &mut ledger_matched,
        settings,
    );
    diagnostics.timings.phase15_foreign = phase_start.elapsed();
    info!(
        matches = foreign_out.matches.len(),
        "foreign-credit matching complete"
    );

    let mut matches = phase1_out.matches;
    matches.extend(foreign_out.matches);

    // Remainders after the one-to-one phases, input order.
    let remaining_ledger: Vec<u32> = (0..arena.ledger.len() as u32)
        .filter(|&id| !ledger_matched[id as usize])
        .collect();
    let remaining_statement: Vec<u32> = phase1_out
        .unmatched_statement
        .iter()
        .copied()
        .filter(|id| !foreign_out.statement_matched.contains(id))
        .collect();

    let split_inputs = split::SplitInputs {
        ledger: &arena.ledger,
        statement: &arena.statement,
        settings,
        matched_ledger: arena.ledger.len() - remaining_ledger.len(),
        matched_statement: arena.statement.len() - remaining_statement.len(),
    };

    // Phase 2: many-to-one splits.
    progress.update(55, "Detecting many-to-one splits");
    let phase_start = Instant::now();
    let mut splits = split::many_to_one(
        &split_inputs,
        &remaining_ledger,
        &remaining_statement,
        &mut cache,
        &mut diagnostics,
        progress,
    );
    diagnostics.timings.phase2_many_to_one = phase_start.elapsed();

    // Phase 2B: one-to-many splits over what is still left.
    progress.update(75, "Detecting one-to-many splits");
    let phase_start = Instant::now();
    let (split_ledger, split_statement) = split_members(&splits);
    let remaining_ledger_2b: Vec<u32> = remaining_ledger
        .iter()
        .copied()
        .filter(|id| !split_ledger.contains(id))
        .collect();
    let remaining_statement_2b: Vec<u32> = remaining_statement
        .iter()
        .copied()
        .filter(|id| !split_statement.contains(id))
        .collect();
    splits.extend(split::one_to_many(
        &split_inputs,
        &remaining_ledger_2b,
        &remaining_statement_2b,
        &mut cache,
        &mut diagnostics,
        progress,
    ));
    diagnostics.timings.phase2b_one_to_many = phase_start.elapsed();

    // Assemble the report.
    progress.update(90, "Assembling results");
    let phase_start = Instant::now();
    diagnostics.cache = CacheStats {
        hits: cache.hits(),
        misses: cache.misses(),
        hit_rate: cache.hit_rate(),
    };
    let mut report = result::assemble_report(
        ledger,
        statement,
        &arena.ledger,
        &arena.statement,
        matches,
        splits,
        diagnostics,
    );
    report.diagnostics.timings.assemble = phase_start.elapsed();
    report.diagnostics.timings.total = start.elapsed();

    info!(
        perfect = report.counts.perfect,
        fuzzy = report.counts.fuzzy,
        foreign_credit = report.counts.foreign_credit,
        splits = report.counts.split,
        unmatched_ledger = report.counts.unmatched_ledger,
        unmatched_statement = report.counts.unmatched_statement,
        "reconciliation complete"
    );
    progress.update(100, "Complete");
    Ok(report)
}

/// Ids consumed by the split records so far, per side.
fn split_members(splits: &[SplitMatch]) -> (Vec<u32>, Vec<u32>) {
    let mut ledger = Vec::new();
    let mut statement = Vec::new();
    for split in splits {
        match split.kind {
            SplitKind::ManyToOne => {
                statement.push(split.target_id);
                ledger.extend_from_slice(&split.member_ids);
            }
            SplitKind::OneToMany => {
                ledger.push(split.target_id);
                statement.extend_from_slice(&split.member_ids);
            }
        }
    }
    (ledger, statement)
}
