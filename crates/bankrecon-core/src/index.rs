//! Hash indexes over the ledger for candidate lookup.
//!
//! Indexes are built once per phase and then only read. Id sequences keep
//! input order so candidate iteration stays deterministic.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::rows::{is_blank_reference, LedgerRow, Side};

/// Cents per amount-bucket in the coarse split index.
const AMOUNT_BUCKET_CENTS: i64 = 100_000;

/// Phase-1 lookup indexes over the full ledger.
#[derive(Debug, Default)]
pub struct LedgerIndexes {
    /// Calendar day -> ledger ids, input order
    pub by_date: HashMap<NaiveDate, Vec<u32>>,
    /// Amount magnitude in cents -> (ledger id, side), input order
    pub by_amount: HashMap<i64, Vec<(u32, Side)>>,
    /// Canonical uppercased reference -> ledger ids, input order
    pub by_reference: HashMap<String, Vec<u32>>,
}

impl LedgerIndexes {
    /// Build the phase-1 indexes. Zero amounts and blank references are not
    /// indexed.
    pub fn build(ledger: &[LedgerRow]) -> Self {
        let mut indexes = Self::default();
        for row in ledger {
            if let Some(date) = row.date {
                indexes.by_date.entry(date).or_default().push(row.id);
            }
            if row.debit_cents > 0 {
                indexes
                    .by_amount
                    .entry(row.debit_cents)
                    .or_default()
                    .push((row.id, Side::Debit));
            }
            if row.credit_cents > 0 {
                indexes
                    .by_amount
                    .entry(row.credit_cents)
                    .or_default()
                    .push((row.id, Side::Credit));
            }
            if !is_blank_reference(&row.reference) {
                indexes
                    .by_reference
                    .entry(row.canonical_reference())
                    .or_default()
                    .push(row.id);
            }
        }
        indexes
    }

    /// Ids on the given day, empty when the day is unindexed.
    pub fn ids_on(&self, date: NaiveDate) -> &[u32] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Split-phase indexes over the still-unmatched ledger subset.
#[derive(Debug, Default)]
pub struct SplitIndexes {
    /// Calendar day -> unmatched ledger ids, input order
    pub by_date: HashMap<NaiveDate, Vec<u32>>,
    /// Reference word (>= 3 chars, uppercased) -> unmatched ledger ids
    pub by_word: HashMap<String, BTreeSet<u32>>,
    /// Coarse thousand-unit amount bucket -> unmatched ledger ids
    pub by_amount_bucket: HashMap<i64, Vec<u32>>,
}

impl SplitIndexes {
    /// Build the split indexes over `remaining` (ids into `ledger`).
    pub fn build(ledger: &[LedgerRow], remaining: &[u32]) -> Self {
        let mut indexes = Self::default();
        for &id in remaining {
            let row = &ledger[id as usize];
            if let Some(date) = row.date {
                indexes.by_date.entry(date).or_default().push(id);
            }
            if !is_blank_reference(&row.reference) {
                for word in row.canonical_reference().split_whitespace() {
                    if word.chars().count() >= 3 {
                        indexes
                            .by_word
                            .entry(word.to_string())
                            .or_default()
                            .insert(id);
                    }
                }
            }
            for cents in [row.debit_cents, row.credit_cents] {
                if cents > 0 {
                    let bucket = cents / AMOUNT_BUCKET_CENTS * AMOUNT_BUCKET_CENTS;
                    indexes.by_amount_bucket.entry(bucket).or_default().push(id);
                }
            }
        }
        indexes
    }

    /// Ids on the given day, empty when the day is unindexed.
    pub fn ids_on(&self, date: NaiveDate) -> &[u32] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Union of the word-index entries for every long token of `reference`.
    pub fn word_candidates(&self, reference: &str) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        for word in reference.to_uppercase().split_whitespace() {
            if word.chars().count() >= 3 {
                if let Some(ids) = self.by_word.get(word) {
                    out.extend(ids.iter().copied());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::build_arena;
    use crate::settings::MatchSettings;
    use crate::table::Table;

    fn arena() -> Vec<LedgerRow> {
        let ledger = Table::from_rows(
            vec!["Date", "Reference", "Debit", "Credit"],
            vec![
                vec!["2024-05-10", "INVOICE 77", "300.00", "0"],
                vec!["2024-05-10", "INVOICE 77", "0", "200.00"],
                vec!["2024-05-11", "NAN", "500.00", "0"],
                vec!["2024-05-11", "ZERO ROW", "0", "0"],
            ],
        );
        let statement = Table::from_rows(vec!["Date", "Reference", "Amount"], vec![]);
        build_arena(&ledger, &statement, &MatchSettings::default())
            .unwrap()
            .ledger
    }

    #[test]
    fn amount_index_splits_sides_and_skips_zero() {
        let rows = arena();
        let indexes = LedgerIndexes::build(&rows);
        assert_eq!(indexes.by_amount[&30_000], vec![(0, Side::Debit)]);
        assert_eq!(indexes.by_amount[&20_000], vec![(1, Side::Credit)]);
        // The all-zero row is indexed nowhere by amount.
        assert!(indexes.by_amount.values().all(|v| !v.iter().any(|(id, _)| *id == 3)));
    }

    #[test]
    fn reference_index_omits_placeholders() {
        let rows = arena();
        let indexes = LedgerIndexes::build(&rows);
        assert_eq!(indexes.by_reference["INVOICE 77"], vec![0, 1]);
        assert!(!indexes.by_reference.contains_key("NAN"));
    }

    #[test]
    fn word_index_requires_three_chars() {
        let rows = arena();
        let indexes = SplitIndexes::build(&rows, &[0, 1, 2, 3]);
        assert!(indexes.by_word.contains_key("INVOICE"));
        // "77" is too short to index.
        assert!(!indexes.by_word.contains_key("77"));
        let candidates = indexes.word_candidates("invoice 88");
        assert_eq!(candidates.into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }
}
