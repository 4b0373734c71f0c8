//! Result records and final assembly.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::rows::{LedgerRow, StatementRow};
use crate::table::Table;

/// Classification of a one-to-one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// All enabled criteria agreed exactly
    Perfect,
    /// Reference agreed only under the fuzzy threshold
    Fuzzy,
    /// High-value amount/date match ignoring references
    ForeignCredit,
}

impl MatchKind {
    /// Label used in the matched output table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Fuzzy => "Fuzzy",
            Self::ForeignCredit => "Foreign_Credit",
        }
    }
}

/// Direction of a split match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    /// Several ledger rows sum to one statement row
    ManyToOne,
    /// Several statement rows sum to one ledger row
    OneToMany,
}

/// A one-to-one match between a ledger row and a statement row.
#[derive(Debug, Clone, Serialize)]
pub struct PairMatch {
    pub kind: MatchKind,
    /// Similarity score 0-100; always 100 for Perfect and ForeignCredit
    pub score: u8,
    pub ledger_id: u32,
    pub statement_id: u32,
}

/// A group match: one target row covered by a subset on the other side.
#[derive(Debug, Clone, Serialize)]
pub struct SplitMatch {
    pub kind: SplitKind,
    /// Always 100: split subsets must sum exactly
    pub score: u8,
    /// Statement id for many-to-one, ledger id for one-to-many
    pub target_id: u32,
    /// Member ids on the opposite side, ascending
    pub member_ids: Vec<u32>,
    /// Target magnitude
    pub target_amount: Decimal,
    /// Sum of the member amounts on the matched side
    pub members_total: Decimal,
}

/// Aggregate counts over one reconciliation run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MatchCounts {
    pub perfect: usize,
    pub fuzzy: usize,
    pub foreign_credit: usize,
    pub split: usize,
    pub total_matched: usize,
    pub unmatched_ledger: usize,
    pub unmatched_statement: usize,
    /// Matched rows on both sides over all rows on both sides, percent
    pub match_rate: f64,
}

/// Full result of one reconcile call.
#[derive(Debug)]
pub struct ReconReport {
    /// One-to-one matches joined wide: match kind, similarity, then the
    /// ledger columns and statement columns under disambiguating prefixes
    pub matched: Table,
    /// Structured one-to-one match records, phase order
    pub matches: Vec<PairMatch>,
    /// Split records, many-to-one first
    pub splits: Vec<SplitMatch>,
    /// Ledger rows in no bucket, input order
    pub unmatched_ledger: Table,
    /// Statement rows in no bucket, input order
    pub unmatched_statement: Table,
    pub counts: MatchCounts,
    pub diagnostics: Diagnostics,
}

/// Assemble the report tables and counts from the phase outputs.
#[allow(clippy::too_many_arguments)]
pub(crate) fn assemble_report(
    ledger_table: &Table,
    statement_table: &Table,
    ledger: &[LedgerRow],
    statement: &[StatementRow],
    matches: Vec<PairMatch>,
    splits: Vec<SplitMatch>,
    diagnostics: Diagnostics,
) -> ReconReport {
    let mut ledger_used = vec![false; ledger.len()];
    let mut statement_used = vec![false; statement.len()];

    let mut counts = MatchCounts::default();
    for pair in &matches {
        ledger_used[pair.ledger_id as usize] = true;
        statement_used[pair.statement_id as usize] = true;
        match pair.kind {
            MatchKind::Perfect => counts.perfect += 1,
            MatchKind::Fuzzy => counts.fuzzy += 1,
            MatchKind::ForeignCredit => counts.foreign_credit += 1,
        }
    }
    for split in &splits {
        counts.split += 1;
        match split.kind {
            SplitKind::ManyToOne => {
                statement_used[split.target_id as usize] = true;
                for &id in &split.member_ids {
                    ledger_used[id as usize] = true;
                }
            }
            SplitKind::OneToMany => {
                ledger_used[split.target_id as usize] = true;
                for &id in &split.member_ids {
                    statement_used[id as usize] = true;
                }
            }
        }
    }

    let matched = build_matched_table(ledger_table, statement_table, &matches);

    let unmatched_ledger_ids: Vec<usize> = (0..ledger.len()).filter(|&i| !ledger_used[i]).collect();
    let unmatched_statement_ids: Vec<usize> =
        (0..statement.len()).filter(|&i| !statement_used[i]).collect();

    counts.total_matched = counts.perfect + counts.fuzzy + counts.foreign_credit + counts.split;
    counts.unmatched_ledger = unmatched_ledger_ids.len();
    counts.unmatched_statement = unmatched_statement_ids.len();

    let total_rows = ledger.len() + statement.len();
    let matched_rows = (ledger.len() - unmatched_ledger_ids.len())
        + (statement.len() - unmatched_statement_ids.len());
    counts.match_rate = if total_rows > 0 {
        matched_rows as f64 / total_rows as f64 * 100.0
    } else {
        0.0
    };

    ReconReport {
        matched,
        matches,
        splits,
        unmatched_ledger: ledger_table.select_rows(&unmatched_ledger_ids),
        unmatched_statement: statement_table.select_rows(&unmatched_statement_ids),
        counts,
        diagnostics,
    }
}

/// Join each one-to-one match wide, prefixing source columns to keep
/// duplicate names apart.
fn build_matched_table(ledger: &Table, statement: &Table, matches: &[PairMatch]) -> Table {
    let mut columns = vec!["Match_Type".to_string(), "Similarity".to_string()];
    columns.extend(ledger.columns().iter().map(|c| format!("Ledger_{c}")));
    columns.extend(statement.columns().iter().map(|c| format!("Statement_{c}")));

    let mut out = Table::new(columns);
    for pair in matches {
        let mut row = vec![pair.kind.as_str().to_string(), pair.score.to_string()];
        row.extend(ledger.row(pair.ledger_id as usize).iter().cloned());
        row.extend(statement.row(pair.statement_id as usize).iter().cloned());
        out.push_row(row);
    }
    out
}
