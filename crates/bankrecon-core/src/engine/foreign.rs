//! Phase 1.5: foreign credits - high-value amount/date matching.
//!
//! Rows above the high-value threshold often carry bank narratives that have
//! nothing in common with the ledger reference, so references are not
//! consulted at all here.

use crate::rows::{LedgerRow, StatementRow};
use crate::settings::MatchSettings;

use super::result::{MatchKind, PairMatch};

/// Strictly-greater magnitude gate in cents (10 000.00).
pub(crate) const FOREIGN_THRESHOLD_CENTS: i64 = 1_000_000;

/// Outcome of the foreign-credits pass.
pub(crate) struct ForeignOutput {
    pub matches: Vec<PairMatch>,
    /// Statement ids consumed here
    pub statement_matched: Vec<u32>,
}

/// Match remaining high-value statement rows on amount (and date) alone.
///
/// `ledger_matched` is shared with phase 1 and updated in place.
pub(crate) fn run(
    ledger: &[LedgerRow],
    statement: &[StatementRow],
    unmatched_statement: &[u32],
    ledger_matched: &mut [bool],
    settings: &MatchSettings,
) -> ForeignOutput {
    let mut matches = Vec::new();
    let mut statement_matched = Vec::new();

    for &stmt_id in unmatched_statement {
        let stmt = &statement[stmt_id as usize];
        if stmt.magnitude_cents() <= FOREIGN_THRESHOLD_CENTS {
            continue;
        }

        let side = stmt.compare_side(settings.amount_mode);
        let magnitude = stmt.magnitude_cents();

        let hit = ledger
            .iter()
            .find(|row| {
                if ledger_matched[row.id as usize] {
                    return false;
                }
                if row.cents(side) != magnitude {
                    return false;
                }
                if settings.match_dates {
                    if let Some(date) = stmt.date {
                        // Exact-day only: the one-day tolerance never applies
                        // to foreign credits.
                        return row.date == Some(date);
                    }
                }
                true
            })
            .map(|row| row.id);

        if let Some(ledger_id) = hit {
            ledger_matched[ledger_id as usize] = true;
            statement_matched.push(stmt_id);
            matches.push(PairMatch {
                kind: MatchKind::ForeignCredit,
                score: 100,
                ledger_id,
                statement_id: stmt_id,
            });
        }
    }

    ForeignOutput {
        matches,
        statement_matched,
    }
}
