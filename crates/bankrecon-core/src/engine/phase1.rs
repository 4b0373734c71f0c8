//! Phase 1: regular one-to-one matching through the ledger indexes.

use chrono::Days;

use crate::fuzzy::FuzzyCache;
use crate::index::LedgerIndexes;
use crate::rows::{is_blank_reference, LedgerRow, Side, StatementRow};
use crate::settings::{AmountMode, MatchSettings};

use super::result::{MatchKind, PairMatch};

/// Outcome of the regular matching pass.
pub(crate) struct Phase1Output {
    pub matches: Vec<PairMatch>,
    /// Ledger ids consumed by this phase
    pub ledger_matched: Vec<bool>,
    /// Statement ids left over, input order
    pub unmatched_statement: Vec<u32>,
}

/// Match each statement row against the indexed ledger.
pub(crate) fn run(
    ledger: &[LedgerRow],
    statement: &[StatementRow],
    indexes: &LedgerIndexes,
    settings: &MatchSettings,
    cache: &mut FuzzyCache,
) -> Phase1Output {
    let mut matches = Vec::new();
    let mut ledger_matched = vec![false; ledger.len()];
    let mut unmatched_statement = Vec::new();

    for stmt in statement {
        let candidates = candidate_ids(ledger, stmt, indexes, settings, &ledger_matched);

        let best = resolve_reference(ledger, stmt, indexes, settings, cache, &candidates);

        match best {
            Some((ledger_id, score)) => {
                let kind = if score == 100 {
                    MatchKind::Perfect
                } else {
                    MatchKind::Fuzzy
                };
                ledger_matched[ledger_id as usize] = true;
                matches.push(PairMatch {
                    kind,
                    score,
                    ledger_id,
                    statement_id: stmt.id,
                });
            }
            None => unmatched_statement.push(stmt.id),
        }
    }

    Phase1Output {
        matches,
        ledger_matched,
        unmatched_statement,
    }
}

/// Intersect the enabled criterion indexes into a sorted candidate id list.
fn candidate_ids(
    ledger: &[LedgerRow],
    stmt: &StatementRow,
    indexes: &LedgerIndexes,
    settings: &MatchSettings,
    ledger_matched: &[bool],
) -> Vec<u32> {
    // `None` means "no criterion has narrowed the set yet".
    let mut candidates: Option<Vec<u32>> = None;

    if settings.match_dates {
        if let Some(date) = stmt.date {
            let mut ids: Vec<u32> = indexes.ids_on(date).to_vec();
            if settings.date_tolerance {
                if let Some(prev) = date.checked_sub_days(Days::new(1)) {
                    ids.extend_from_slice(indexes.ids_on(prev));
                }
                if let Some(next) = date.checked_add_days(Days::new(1)) {
                    ids.extend_from_slice(indexes.ids_on(next));
                }
                ids.sort_unstable();
                ids.dedup();
            }
            candidates = Some(ids);
        }
        // A missing statement date leaves the date criterion unapplied.
    }

    if settings.match_amounts {
        let magnitude = stmt.magnitude_cents();
        let side_ids: Vec<u32> = indexes
            .by_amount
            .get(&magnitude)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, side)| side_compatible(*side, stmt, settings.amount_mode))
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default();
        candidates = Some(match candidates {
            Some(existing) => intersect_sorted(&existing, &side_ids),
            None => side_ids,
        });
    }

    let mut ids = candidates.unwrap_or_else(|| (0..ledger.len() as u32).collect());
    ids.sort_unstable();
    ids.retain(|&id| !ledger_matched[id as usize]);
    ids
}

fn side_compatible(side: Side, stmt: &StatementRow, mode: AmountMode) -> bool {
    match mode {
        AmountMode::DebitsOnly => side == Side::Debit,
        AmountMode::CreditsOnly => side == Side::Credit,
        AmountMode::Both => side == stmt.compare_side(mode),
    }
}

fn intersect_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut b_sorted = b.to_vec();
    b_sorted.sort_unstable();
    a.iter()
        .copied()
        .filter(|id| b_sorted.binary_search(id).is_ok())
        .collect()
}

/// Pick the best candidate under the reference rules.
///
/// Returns the winning ledger id and similarity score, or `None` when no
/// candidate clears the enabled criteria.
fn resolve_reference(
    ledger: &[LedgerRow],
    stmt: &StatementRow,
    indexes: &LedgerIndexes,
    settings: &MatchSettings,
    cache: &mut FuzzyCache,
    candidates: &[u32],
) -> Option<(u32, u8)> {
    let has_reference = settings.match_references && !is_blank_reference(&stmt.reference);

    if !has_reference {
        // Not matching on references: the lowest surviving candidate wins.
        return candidates.first().map(|&id| (id, 100));
    }

    // Exact lookup first; ties break to the lowest ledger id.
    if let Some(exact) = indexes.by_reference.get(&stmt.canonical_reference()) {
        if let Some(&id) = exact
            .iter()
            .find(|id| candidates.binary_search(id).is_ok())
        {
            return Some((id, 100));
        }
    }

    if settings.fuzzy_ref {
        let mut best: Option<(u32, u8)> = None;
        for &id in candidates {
            let score = cache.score(&stmt.reference, &ledger[id as usize].reference);
            if score >= settings.similarity_threshold
                && best.map(|(_, s)| score > s).unwrap_or(true)
            {
                best = Some((id, score));
            }
        }
        return best;
    }

    None
}
