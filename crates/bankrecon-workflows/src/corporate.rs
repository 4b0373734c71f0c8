//! The Corporate five-batch settlement matcher.
//!
//! Corporate settlements arrive as one flat table where every row carries a
//! foreign-debit and a foreign-credit column, at most one of them non-zero.
//! Rows are drained into six batches in a fixed order; a row enters exactly
//! one batch. Batches 2-5 pair debits against credits inside same-reference
//! groups, distinguished only by the size of the amount difference.

use std::collections::BTreeMap;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bankrecon_core::{parse_amount, to_cents, ReconResult, Table};

/// One cent, the exact-match boundary.
const EXACT_CENTS: i64 = 1;
/// One currency unit, the commission boundary.
const COMMISSION_CENTS: i64 = 100;

/// Column bindings for the settlement table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorporateColumns {
    #[serde(default = "default_reference")]
    pub reference: String,
    #[serde(default = "default_journal")]
    pub journal: String,
    #[serde(default = "default_debit")]
    pub debit: String,
    #[serde(default = "default_credit")]
    pub credit: String,
}

fn default_reference() -> String {
    "Reference".to_string()
}
fn default_journal() -> String {
    "Journal".to_string()
}
fn default_debit() -> String {
    "Foreign Debit".to_string()
}
fn default_credit() -> String {
    "Foreign Credit".to_string()
}

impl Default for CorporateColumns {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            journal: default_journal(),
            debit: default_debit(),
            credit: default_credit(),
        }
    }
}

/// The six output batches, rows in pairing order.
#[derive(Debug)]
pub struct CorporateBatches {
    /// B1: correcting-journal pairs (matched row first, correcting second)
    pub correcting: Table,
    /// B2: exact debit/credit matches within a reference
    pub exact: Table,
    /// B3: debit exceeds credit by a commission (>= 1 unit)
    pub debit_commission: Table,
    /// B4: credit exceeds debit by a commission (>= 1 unit)
    pub credit_commission: Table,
    /// B5: sub-unit differences from rate conversion
    pub rate_difference: Table,
    /// B6: everything left
    pub unmatched: Table,
}

/// Data-integrity report over the batch output.
#[derive(Debug, Clone, Serialize)]
pub struct CorporateStats {
    pub total_rows: usize,
    pub correcting: usize,
    pub exact: usize,
    pub debit_commission: usize,
    pub credit_commission: usize,
    pub rate_difference: usize,
    pub unmatched: usize,
    pub input_debit_sum: Decimal,
    pub input_credit_sum: Decimal,
    pub output_debit_sum: Decimal,
    pub output_credit_sum: Decimal,
    /// Row count out differs from row count in
    pub has_duplicates: bool,
    /// Output sums drifted more than a cent from the input sums
    pub sum_mismatch: bool,
}

/// Result of one batch reconciliation.
#[derive(Debug)]
pub struct CorporateReport {
    pub batches: CorporateBatches,
    pub stats: CorporateStats,
}

/// Normalized view of one settlement row.
struct SettlementRow {
    idx: usize,
    reference: String,
    journal: String,
    debit: Decimal,
    credit: Decimal,
    debit_cents: i64,
    credit_cents: i64,
}

/// Run the five-batch settlement reconciliation.
pub fn reconcile_batches(table: &Table, columns: &CorporateColumns) -> ReconResult<CorporateReport> {
    let ref_col = table.require_column("settlement", &columns.reference)?;
    let journal_col = table.require_column("settlement", &columns.journal)?;
    let debit_col = table.require_column("settlement", &columns.debit)?;
    let credit_col = table.require_column("settlement", &columns.credit)?;

    let journal_digits = Regex::new(r"[Jj](\d+)").expect("journal-digits pattern");

    let rows: Vec<SettlementRow> = (0..table.len())
        .map(|idx| {
            let debit = parse_amount(table.cell(idx, debit_col)).abs();
            let credit = parse_amount(table.cell(idx, credit_col)).abs();
            let reference = normalize_reference(table.cell(idx, ref_col), idx);
            SettlementRow {
                idx,
                reference,
                journal: table.cell(idx, journal_col).trim().to_string(),
                debit,
                credit,
                debit_cents: to_cents(debit),
                credit_cents: to_cents(credit),
            }
        })
        .collect();

    let mut matched = vec![false; rows.len()];

    // B1: correcting journals pair with the row they correct, by journal
    // number. Output order is matched row first, correcting row second.
    let mut correcting_pairs: Vec<usize> = Vec::new();
    for row in &rows {
        if matched[row.idx] || !row.reference.contains("CORRECTING") {
            continue;
        }
        let Some(caps) = journal_digits.captures(&row.reference) else {
            continue;
        };
        let journal_num = &caps[1];
        let partner = rows
            .iter()
            .find(|r| r.journal == journal_num && !matched[r.idx] && r.idx != row.idx);
        if let Some(partner) = partner {
            correcting_pairs.push(partner.idx);
            correcting_pairs.push(row.idx);
            matched[partner.idx] = true;
            matched[row.idx] = true;
        }
    }

    // B2-B5 all pair one debit row against one credit row inside a
    // reference group; only the accepted difference changes.
    let exact_pairs = pair_by_difference(&rows, &mut matched, |d, c| (d - c).abs() < EXACT_CENTS);
    let debit_commission_pairs =
        pair_by_difference(&rows, &mut matched, |d, c| d - c >= COMMISSION_CENTS);
    let credit_commission_pairs =
        pair_by_difference(&rows, &mut matched, |d, c| c - d >= COMMISSION_CENTS);
    let rate_pairs = pair_by_difference(&rows, &mut matched, |d, c| {
        let diff = (d - c).abs();
        (EXACT_CENTS..COMMISSION_CENTS).contains(&diff)
    });

    let unmatched_rows: Vec<usize> = rows
        .iter()
        .filter(|r| !matched[r.idx])
        .map(|r| r.idx)
        .collect();

    let batches = CorporateBatches {
        correcting: table.select_rows(&correcting_pairs),
        exact: table.select_rows(&exact_pairs),
        debit_commission: table.select_rows(&debit_commission_pairs),
        credit_commission: table.select_rows(&credit_commission_pairs),
        rate_difference: table.select_rows(&rate_pairs),
        unmatched: table.select_rows(&unmatched_rows),
    };

    let stats = integrity_stats(&rows, &batches, &[
        &correcting_pairs,
        &exact_pairs,
        &debit_commission_pairs,
        &credit_commission_pairs,
        &rate_pairs,
        &unmatched_rows,
    ]);

    info!(
        total = stats.total_rows,
        correcting = stats.correcting,
        exact = stats.exact,
        unmatched = stats.unmatched,
        "corporate batch reconciliation complete"
    );
    Ok(CorporateReport { batches, stats })
}

/// Uppercase and trim a reference; blanks become per-row unique markers so
/// they can never pair with each other in the grouped batches.
fn normalize_reference(raw: &str, idx: usize) -> String {
    let canonical = raw.trim().to_uppercase();
    if matches!(canonical.as_str(), "" | "NAN" | "NONE" | "NULL" | "0") {
        format!("__BLANK_{idx}__")
    } else {
        canonical
    }
}

/// One pairing sweep: group unmatched rows by reference, then pair each
/// debit row with the first credit row whose cent difference is accepted.
///
/// Groups are visited in sorted reference order; rows inside a group keep
/// input order. Pairs land in the output as debit row then credit row.
fn pair_by_difference(
    rows: &[SettlementRow],
    matched: &mut [bool],
    accept: impl Fn(i64, i64) -> bool,
) -> Vec<usize> {
    let mut groups: BTreeMap<&str, Vec<&SettlementRow>> = BTreeMap::new();
    for row in rows.iter().filter(|r| !matched[r.idx]) {
        groups.entry(&row.reference).or_default().push(row);
    }

    let mut pairs = Vec::new();
    for (reference, group) in groups {
        if group.len() < 2 || reference.starts_with("__BLANK_") {
            continue;
        }
        let debits: Vec<&SettlementRow> = group.iter().copied().filter(|r| r.debit_cents > 0).collect();
        let credits: Vec<&SettlementRow> =
            group.iter().copied().filter(|r| r.credit_cents > 0).collect();
        if debits.is_empty() || credits.is_empty() {
            continue;
        }

        for debit in &debits {
            if matched[debit.idx] {
                continue;
            }
            let hit = credits
                .iter()
                .find(|c| !matched[c.idx] && accept(debit.debit_cents, c.credit_cents));
            if let Some(credit) = hit {
                pairs.push(debit.idx);
                pairs.push(credit.idx);
                matched[debit.idx] = true;
                matched[credit.idx] = true;
            }
        }
    }
    pairs
}

/// Verify that no row was duplicated or dropped and the money totals
/// survived the batching.
fn integrity_stats(
    rows: &[SettlementRow],
    batches: &CorporateBatches,
    outputs: &[&Vec<usize>],
) -> CorporateStats {
    let input_debit_sum: Decimal = rows.iter().map(|r| r.debit).sum();
    let input_credit_sum: Decimal = rows.iter().map(|r| r.credit).sum();

    let mut output_debit_sum = Decimal::ZERO;
    let mut output_credit_sum = Decimal::ZERO;
    let mut output_rows = 0usize;
    for indices in outputs {
        output_rows += indices.len();
        for &idx in indices.iter() {
            output_debit_sum += rows[idx].debit;
            output_credit_sum += rows[idx].credit;
        }
    }

    let tolerance = Decimal::new(1, 2);
    let has_duplicates = output_rows != rows.len();
    let sum_mismatch = (input_debit_sum - output_debit_sum).abs() > tolerance
        || (input_credit_sum - output_credit_sum).abs() > tolerance;
    if has_duplicates {
        warn!(
            input = rows.len(),
            output = output_rows,
            "corporate batch row count mismatch"
        );
    }
    if sum_mismatch {
        warn!(
            %input_debit_sum, %output_debit_sum,
            %input_credit_sum, %output_credit_sum,
            "corporate batch sum mismatch"
        );
    }

    CorporateStats {
        total_rows: rows.len(),
        correcting: batches.correcting.len(),
        exact: batches.exact.len(),
        debit_commission: batches.debit_commission.len(),
        credit_commission: batches.credit_commission.len(),
        rate_difference: batches.rate_difference.len(),
        unmatched: batches.unmatched.len(),
        input_debit_sum,
        input_credit_sum,
        output_debit_sum,
        output_credit_sum,
        has_duplicates,
        sum_mismatch,
    }
}
