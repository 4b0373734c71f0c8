//! Property tests over randomly generated ledgers and statements.

use proptest::prelude::*;

use bankrecon_core::{reconcile, MatchSettings, SplitKind, Table};

const DATES: &[&str] = &["2024-01-10", "2024-01-11", "2024-02-01", ""];
const REFERENCES: &[&str] = &["ALPHA", "BRAVO 42", "CHARLIE PAY", "ALPHA X", ""];
const AMOUNTS: &[&str] = &["100.00", "250.00", "350.00", "25000.00", "0"];

#[derive(Debug, Clone)]
struct RowSpec {
    date: usize,
    reference: usize,
    amount: usize,
    credit_side: bool,
}

fn row_spec() -> impl Strategy<Value = RowSpec> {
    (0..DATES.len(), 0..REFERENCES.len(), 0..AMOUNTS.len(), any::<bool>()).prop_map(
        |(date, reference, amount, credit_side)| RowSpec {
            date,
            reference,
            amount,
            credit_side,
        },
    )
}

fn build_ledger(specs: &[RowSpec]) -> Table {
    Table::from_rows(
        vec!["Date".to_string(), "Reference".into(), "Debit".into(), "Credit".into()],
        specs
            .iter()
            .map(|s| {
                let (debit, credit) = if s.credit_side {
                    ("0", AMOUNTS[s.amount])
                } else {
                    (AMOUNTS[s.amount], "0")
                };
                vec![
                    DATES[s.date].to_string(),
                    REFERENCES[s.reference].to_string(),
                    debit.to_string(),
                    credit.to_string(),
                ]
            })
            .collect(),
    )
}

fn build_statement(specs: &[RowSpec]) -> Table {
    Table::from_rows(
        vec!["Date".to_string(), "Reference".into(), "Amount".into()],
        specs
            .iter()
            .map(|s| {
                let amount = if s.credit_side {
                    format!("-{}", AMOUNTS[s.amount])
                } else {
                    AMOUNTS[s.amount].to_string()
                };
                vec![
                    DATES[s.date].to_string(),
                    REFERENCES[s.reference].to_string(),
                    amount,
                ]
            })
            .collect(),
    )
}

proptest! {
    /// Every row ends up in exactly one bucket, on both sides.
    #[test]
    fn partition_holds(
        ledger_specs in prop::collection::vec(row_spec(), 0..12),
        statement_specs in prop::collection::vec(row_spec(), 0..12),
    ) {
        let ledger = build_ledger(&ledger_specs);
        let statement = build_statement(&statement_specs);
        let report = reconcile(&ledger, &statement, &MatchSettings::default()).unwrap();

        let mut ledger_seen = vec![0usize; ledger.len()];
        let mut statement_seen = vec![0usize; statement.len()];
        for pair in &report.matches {
            ledger_seen[pair.ledger_id as usize] += 1;
            statement_seen[pair.statement_id as usize] += 1;
        }
        for split in &report.splits {
            match split.kind {
                SplitKind::ManyToOne => {
                    statement_seen[split.target_id as usize] += 1;
                    for &id in &split.member_ids {
                        ledger_seen[id as usize] += 1;
                    }
                }
                SplitKind::OneToMany => {
                    ledger_seen[split.target_id as usize] += 1;
                    for &id in &split.member_ids {
                        statement_seen[id as usize] += 1;
                    }
                }
            }
        }
        prop_assert!(ledger_seen.iter().all(|&n| n <= 1), "no ledger row in two buckets");
        prop_assert!(statement_seen.iter().all(|&n| n <= 1), "no statement row in two buckets");

        let matched_ledger = ledger_seen.iter().filter(|&&n| n == 1).count();
        let matched_statement = statement_seen.iter().filter(|&&n| n == 1).count();
        prop_assert_eq!(matched_ledger + report.unmatched_ledger.len(), ledger.len());
        prop_assert_eq!(matched_statement + report.unmatched_statement.len(), statement.len());
    }

    /// Same input, same settings, same result.
    #[test]
    fn reconcile_is_deterministic(
        ledger_specs in prop::collection::vec(row_spec(), 0..10),
        statement_specs in prop::collection::vec(row_spec(), 0..10),
    ) {
        let ledger = build_ledger(&ledger_specs);
        let statement = build_statement(&statement_specs);
        let settings = MatchSettings::default();

        let a = reconcile(&ledger, &statement, &settings).unwrap();
        let b = reconcile(&ledger, &statement, &settings).unwrap();
        prop_assert_eq!(format!("{:?}", a.matches), format!("{:?}", b.matches));
        prop_assert_eq!(format!("{:?}", a.splits), format!("{:?}", b.splits));
        prop_assert_eq!(format!("{:?}", a.counts), format!("{:?}", b.counts));
    }

    /// Re-running over the unmatched residuals finds nothing new.
    #[test]
    fn residuals_are_a_fixed_point(
        ledger_specs in prop::collection::vec(row_spec(), 0..10),
        statement_specs in prop::collection::vec(row_spec(), 0..10),
    ) {
        let ledger = build_ledger(&ledger_specs);
        let statement = build_statement(&statement_specs);
        let settings = MatchSettings::default();

        let first = reconcile(&ledger, &statement, &settings).unwrap();
        let second = reconcile(&first.unmatched_ledger, &first.unmatched_statement, &settings)
            .unwrap();
        prop_assert_eq!(second.counts.total_matched, 0);
    }

    /// Split subsets sum to their target exactly.
    #[test]
    fn split_sums_are_exact(
        ledger_specs in prop::collection::vec(row_spec(), 0..12),
        statement_specs in prop::collection::vec(row_spec(), 0..12),
    ) {
        let ledger = build_ledger(&ledger_specs);
        let statement = build_statement(&statement_specs);
        let report = reconcile(&ledger, &statement, &MatchSettings::default()).unwrap();
        for split in &report.splits {
            prop_assert_eq!(split.target_amount, split.members_total);
            prop_assert!(split.member_ids.len() >= 2);
        }
    }
}
