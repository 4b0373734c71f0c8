//! Phases 2 and 2B: split-transaction detection.
//!
//! Many-to-one finds ledger subsets that sum to one statement row; 2B is the
//! mirror. Subsets must share one exact reference group, one date, and one
//! sign side, and must sum to the target exactly in cents.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::diagnostics::Diagnostics;
use crate::fuzzy::FuzzyCache;
use crate::index::SplitIndexes;
use crate::progress::Progress;
use crate::rows::{is_blank_reference, LedgerRow, Side, StatementRow};
use crate::settings::{AmountMode, MatchSettings};

use super::result::{SplitKind, SplitMatch};
use super::subset_sum::{find_subset, SubsetItem};

/// Log a notice once either unmatched set grows past these sizes.
const LARGE_STATEMENT_NOTICE: usize = 500;
const LARGE_LEDGER_NOTICE: usize = 1000;

/// How often the split loops report progress, in target rows.
const PROGRESS_EVERY: usize = 50;

/// Shared inputs for both split passes.
pub(crate) struct SplitInputs<'a> {
    pub ledger: &'a [LedgerRow],
    pub statement: &'a [StatementRow],
    pub settings: &'a MatchSettings,
    /// Rows matched by phases 1 and 1.5, both sides, for the rate heuristic
    pub matched_ledger: usize,
    pub matched_statement: usize,
}

/// Detect many-to-one splits over the unmatched remainder.
pub(crate) fn many_to_one(
    inputs: &SplitInputs<'_>,
    remaining_ledger: &[u32],
    remaining_statement: &[u32],
    cache: &mut FuzzyCache,
    diagnostics: &mut Diagnostics,
    progress: &mut dyn Progress,
) -> Vec<SplitMatch> {
    let settings = inputs.settings;
    let mut splits = Vec::new();

    if remaining_statement.is_empty() || remaining_ledger.len() < 2 {
        return splits;
    }

    if let Some(limit) = settings.split_skip_match_rate {
        let total = inputs.ledger.len() + inputs.statement.len();
        let matched = inputs.matched_ledger + inputs.matched_statement;
        let rate = if total > 0 {
            matched as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        if rate > limit {
            info!(rate, limit, "skipping many-to-one split detection, match rate already high");
            diagnostics.notice(format!(
                "Skipped many-to-one split detection: match rate {rate:.1}% exceeds {limit:.1}%"
            ));
            return splits;
        }
    }

    if remaining_statement.len() > LARGE_STATEMENT_NOTICE
        || remaining_ledger.len() > LARGE_LEDGER_NOTICE
    {
        warn!(
            ledger = remaining_ledger.len(),
            statement = remaining_statement.len(),
            "large unmatched sets entering split detection"
        );
        diagnostics.notice(format!(
            "Large split input: {} ledger / {} statement rows unmatched",
            remaining_ledger.len(),
            remaining_statement.len()
        ));
    }

    let indexes = SplitIndexes::build(inputs.ledger, remaining_ledger);
    let mut used_ledger: HashSet<u32> = HashSet::new();

    for (seen, &stmt_id) in remaining_statement.iter().enumerate() {
        if splits.len() >= settings.max_split_matches {
            diagnostics.notice(format!(
                "Stopped many-to-one split detection at {} matches",
                splits.len()
            ));
            break;
        }
        if seen % PROGRESS_EVERY == 0 {
            let pct = 55 + (seen * 20 / remaining_statement.len()) as u8;
            progress.update(pct, "Detecting many-to-one splits");
        }

        let stmt = &inputs.statement[stmt_id as usize];
        let target_cents = stmt.magnitude_cents();
        if target_cents == 0 {
            continue;
        }
        // Splits are only ever anchored by a reference group.
        if !settings.match_references
            || !settings.fuzzy_ref
            || is_blank_reference(&stmt.reference)
        {
            continue;
        }

        let mut candidates = match date_candidates(&indexes, stmt.date, remaining_ledger, settings)
        {
            Some(ids) => ids,
            None => continue,
        };

        candidates = narrow_by_reference(inputs.ledger, stmt, &indexes, settings, cache, candidates);
        candidates.retain(|id| !used_ledger.contains(id));
        if candidates.len() < 2 {
            continue;
        }

        let group = match best_reference_group(
            candidates
                .iter()
                .map(|&id| (id, inputs.ledger[id as usize].canonical_reference())),
            &stmt.reference,
            settings,
            cache,
        ) {
            Some(group) => group,
            None => continue,
        };

        let group = bound_group(
            group,
            target_cents,
            settings.max_split_group,
            |id| ledger_mode_cents(&inputs.ledger[id as usize], settings.amount_mode),
        );

        let found = try_sides(&group, inputs.ledger, settings, target_cents);
        let Some((subset, side)) = found else { continue };

        if !validate_ledger_subset(inputs.ledger, &subset, side, stmt.date, target_cents, settings)
        {
            continue;
        }

        let mut member_ids = subset;
        member_ids.sort_unstable();
        let members_total: Decimal = member_ids
            .iter()
            .map(|&id| side_amount(&inputs.ledger[id as usize], side))
            .sum();

        for &id in &member_ids {
            used_ledger.insert(id);
        }
        splits.push(SplitMatch {
            kind: SplitKind::ManyToOne,
            score: 100,
            target_id: stmt_id,
            member_ids,
            target_amount: stmt.amount.abs(),
            members_total,
        });
    }

    info!(count = splits.len(), "many-to-one split detection complete");
    splits
}

/// Detect one-to-many splits: one ledger row covered by statement rows.
pub(crate) fn one_to_many(
    inputs: &SplitInputs<'_>,
    remaining_ledger: &[u32],
    remaining_statement: &[u32],
    cache: &mut FuzzyCache,
    diagnostics: &mut Diagnostics,
    progress: &mut dyn Progress,
) -> Vec<SplitMatch> {
    let settings = inputs.settings;
    let mut splits = Vec::new();

    if remaining_ledger.is_empty() || remaining_statement.len() < 2 {
        return splits;
    }

    let mut used_statement: HashSet<u32> = HashSet::new();

    for (seen, &ledger_id) in remaining_ledger.iter().enumerate() {
        if splits.len() >= settings.max_split_matches {
            diagnostics.notice(format!(
                "Stopped one-to-many split detection at {} matches",
                splits.len()
            ));
            break;
        }
        if seen % PROGRESS_EVERY == 0 {
            let pct = 75 + (seen * 15 / remaining_ledger.len()) as u8;
            progress.update(pct, "Detecting one-to-many splits");
        }

        let row = &inputs.ledger[ledger_id as usize];
        let target_cents = ledger_mode_cents(row, settings.amount_mode);
        if target_cents == 0 {
            continue;
        }
        if !settings.match_references || !settings.fuzzy_ref || is_blank_reference(&row.reference)
        {
            continue;
        }

        let ledger_words = long_words(&row.canonical_reference());

        let mut candidates: Vec<u32> = Vec::new();
        for &stmt_id in remaining_statement {
            if used_statement.contains(&stmt_id) {
                continue;
            }
            let stmt = &inputs.statement[stmt_id as usize];
            if settings.match_dates {
                if let (Some(ld), Some(sd)) = (row.date, stmt.date) {
                    if ld != sd {
                        continue;
                    }
                }
            }
            if is_blank_reference(&stmt.reference) {
                continue;
            }
            if !ledger_words.is_empty() {
                let stmt_words = long_words(&stmt.canonical_reference());
                if ledger_words.intersection(&stmt_words).next().is_none() {
                    continue;
                }
                if cache.score(&row.reference, &stmt.reference) < settings.similarity_threshold {
                    continue;
                }
            }
            candidates.push(stmt_id);
        }

        if candidates.len() < 2 {
            continue;
        }

        let group = match best_reference_group(
            candidates
                .iter()
                .map(|&id| (id, inputs.statement[id as usize].canonical_reference())),
            &row.reference,
            settings,
            cache,
        ) {
            Some(group) => group,
            None => continue,
        };

        let group = bound_group(group, target_cents, settings.max_split_group, |id| {
            inputs.statement[id as usize].magnitude_cents()
        });

        // Sign discipline: a subset never mixes incoming and outgoing rows.
        let found = [true, false].into_iter().find_map(|positive| {
            let items: Vec<SubsetItem> = group
                .iter()
                .filter(|&&id| {
                    let cents = inputs.statement[id as usize].amount_cents;
                    cents != 0 && (cents > 0) == positive
                })
                .map(|&id| SubsetItem {
                    cents: inputs.statement[id as usize].magnitude_cents(),
                    id,
                })
                .collect();
            find_subset(&items, target_cents, target_cents, settings.max_split_items)
        });
        let Some(subset) = found else { continue };

        if !validate_statement_subset(inputs.statement, &subset, row.date, target_cents, settings) {
            continue;
        }

        let mut member_ids = subset;
        member_ids.sort_unstable();
        let members_total: Decimal = member_ids
            .iter()
            .map(|&id| inputs.statement[id as usize].amount.abs())
            .sum();

        for &id in &member_ids {
            used_statement.insert(id);
        }
        splits.push(SplitMatch {
            kind: SplitKind::OneToMany,
            score: 100,
            target_id: ledger_id,
            member_ids,
            target_amount: side_amount(row, mode_side(row, settings.amount_mode)),
            members_total,
        });
    }

    info!(count = splits.len(), "one-to-many split detection complete");
    splits
}

/// Same-date candidates for a statement target; `None` means skip this row.
fn date_candidates(
    indexes: &SplitIndexes,
    date: Option<NaiveDate>,
    remaining: &[u32],
    settings: &MatchSettings,
) -> Option<Vec<u32>> {
    if settings.match_dates {
        match date {
            // Split members must share the target's exact day; the one-day
            // tolerance never applies here.
            Some(d) => {
                let ids = indexes.ids_on(d);
                if ids.is_empty() {
                    None
                } else {
                    Some(ids.to_vec())
                }
            }
            None => Some(remaining.to_vec()),
        }
    } else {
        Some(remaining.to_vec())
    }
}

/// Word-token pre-filter followed by the fuzzy threshold.
fn narrow_by_reference(
    ledger: &[LedgerRow],
    stmt: &StatementRow,
    indexes: &SplitIndexes,
    settings: &MatchSettings,
    cache: &mut FuzzyCache,
    candidates: Vec<u32>,
) -> Vec<u32> {
    let word_hits = indexes.word_candidates(&stmt.reference);
    candidates
        .into_iter()
        .filter(|id| word_hits.contains(id))
        .filter(|&id| {
            cache.score(&stmt.reference, &ledger[id as usize].reference)
                >= settings.similarity_threshold
        })
        .collect()
}

/// Group candidates by exact canonical reference and pick the group scoring
/// highest against the target reference, at or above the threshold.
///
/// Groups need at least two members; candidate order decides tie-breaks, so
/// callers iterate ids ascending.
fn best_reference_group(
    candidates: impl Iterator<Item = (u32, String)>,
    target_reference: &str,
    settings: &MatchSettings,
    cache: &mut FuzzyCache,
) -> Option<Vec<u32>> {
    let mut groups: Vec<(String, Vec<u32>)> = Vec::new();
    for (id, reference) in candidates {
        if is_blank_reference(&reference) {
            continue;
        }
        match groups.iter_mut().find(|(key, _)| *key == reference) {
            Some((_, ids)) => ids.push(id),
            None => groups.push((reference, vec![id])),
        }
    }

    let mut best: Option<(u8, &Vec<u32>)> = None;
    for (reference, ids) in &groups {
        if ids.len() < 2 {
            continue;
        }
        let score = cache.score(target_reference, reference);
        if score >= settings.similarity_threshold && best.map(|(s, _)| score > s).unwrap_or(true) {
            best = Some((score, ids));
        }
    }
    best.map(|(_, ids)| ids.clone())
}

/// Keep the `max` candidates whose amount lies closest to the target.
fn bound_group(
    mut group: Vec<u32>,
    target_cents: i64,
    max: usize,
    amount_of: impl Fn(u32) -> i64,
) -> Vec<u32> {
    if group.len() > max {
        group.sort_by_key(|&id| (amount_of(id) - target_cents).abs());
        group.truncate(max);
    }
    group
}

/// Run the subset search on each permitted ledger side in turn.
fn try_sides(
    group: &[u32],
    ledger: &[LedgerRow],
    settings: &MatchSettings,
    target_cents: i64,
) -> Option<(Vec<u32>, Side)> {
    let sides: &[Side] = match settings.amount_mode {
        AmountMode::DebitsOnly => &[Side::Debit],
        AmountMode::CreditsOnly => &[Side::Credit],
        AmountMode::Both => &[Side::Debit, Side::Credit],
    };
    for &side in sides {
        let items: Vec<SubsetItem> = group
            .iter()
            .filter(|&&id| ledger[id as usize].cents(side) > 0)
            .map(|&id| SubsetItem {
                cents: ledger[id as usize].cents(side),
                id,
            })
            .collect();
        if let Some(subset) =
            find_subset(&items, target_cents, target_cents, settings.max_split_items)
        {
            return Some((subset, side));
        }
    }
    None
}

/// Final acceptance checks for a ledger subset (spec of a valid split:
/// one reference group, one date, one side, exact sum).
fn validate_ledger_subset(
    ledger: &[LedgerRow],
    subset: &[u32],
    side: Side,
    target_date: Option<NaiveDate>,
    target_cents: i64,
    settings: &MatchSettings,
) -> bool {
    let first = &ledger[subset[0] as usize];
    if settings.match_dates {
        if !subset
            .iter()
            .all(|&id| ledger[id as usize].date == first.date)
        {
            return false;
        }
        if let (Some(td), Some(fd)) = (target_date, first.date) {
            if td != fd {
                return false;
            }
        }
    }
    let sum: i64 = subset.iter().map(|&id| ledger[id as usize].cents(side)).sum();
    (sum - target_cents).abs() <= 1
}

/// Mirror of [`validate_ledger_subset`] for statement subsets.
fn validate_statement_subset(
    statement: &[StatementRow],
    subset: &[u32],
    target_date: Option<NaiveDate>,
    target_cents: i64,
    settings: &MatchSettings,
) -> bool {
    let first = &statement[subset[0] as usize];
    if settings.match_dates {
        if !subset
            .iter()
            .all(|&id| statement[id as usize].date == first.date)
        {
            return false;
        }
        if let (Some(td), Some(fd)) = (target_date, first.date) {
            if td != fd {
                return false;
            }
        }
    }
    let sum: i64 = subset
        .iter()
        .map(|&id| statement[id as usize].magnitude_cents())
        .sum();
    (sum - target_cents).abs() <= 1
}

/// Tokens of three or more characters, for the shared-word pre-filter.
fn long_words(reference: &str) -> HashSet<String> {
    reference
        .split_whitespace()
        .filter(|w| w.chars().count() >= 3)
        .map(str::to_string)
        .collect()
}

/// Ledger amount in cents under the configured mode: the configured side,
/// or whichever side is populated when both are allowed.
fn ledger_mode_cents(row: &LedgerRow, mode: AmountMode) -> i64 {
    match mode {
        AmountMode::DebitsOnly => row.debit_cents,
        AmountMode::CreditsOnly => row.credit_cents,
        AmountMode::Both => {
            if row.debit_cents != 0 {
                row.debit_cents
            } else {
                row.credit_cents
            }
        }
    }
}

fn mode_side(row: &LedgerRow, mode: AmountMode) -> Side {
    match mode {
        AmountMode::DebitsOnly => Side::Debit,
        AmountMode::CreditsOnly => Side::Credit,
        AmountMode::Both => {
            if row.debit_cents != 0 {
                Side::Debit
            } else {
                Side::Credit
            }
        }
    }
}

fn side_amount(row: &LedgerRow, side: Side) -> Decimal {
    match side {
        Side::Debit => row.debit,
        Side::Credit => row.credit,
    }
}
