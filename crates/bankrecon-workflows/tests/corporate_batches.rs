//! Corporate five-batch settlement matcher tests.

use bankrecon_core::Table;
use bankrecon_workflows::{reconcile_batches, CorporateColumns};
use rust_decimal_macros::dec;

const COLUMNS: &[&str] = &["Date", "Reference", "Journal", "Foreign Debit", "Foreign Credit"];

fn settlement(rows: Vec<Vec<&str>>) -> Table {
    Table::from_rows(COLUMNS.to_vec(), rows)
}

fn run(table: &Table) -> bankrecon_workflows::CorporateReport {
    reconcile_batches(table, &CorporateColumns::default()).unwrap()
}

#[test]
fn correcting_journal_pairs_matched_row_first() {
    let table = settlement(vec![
        vec!["2024-01-10", "Correcting J62970", "", "100.00", "0"],
        vec!["2024-01-10", "some text", "62970", "0", "100.00"],
    ]);
    let report = run(&table);

    assert_eq!(report.stats.correcting, 2);
    assert_eq!(report.batches.correcting.cell(0, 1), "some text");
    assert_eq!(report.batches.correcting.cell(1, 1), "Correcting J62970");
    assert_eq!(report.stats.exact, 0);
    assert_eq!(report.stats.unmatched, 0);
}

#[test]
fn exact_match_pairs_within_reference_group() {
    let table = settlement(vec![
        vec!["2024-01-10", "RJ11111111111", "", "250.00", "0"],
        vec!["2024-01-10", "RJ11111111111", "", "0", "250.00"],
        vec!["2024-01-10", "RJ22222222222", "", "80.00", "0"],
    ]);
    let report = run(&table);

    assert_eq!(report.stats.exact, 2);
    assert_eq!(report.stats.unmatched, 1);
    assert_eq!(report.batches.unmatched.cell(0, 1), "RJ22222222222");
}

#[test]
fn commission_batches_split_by_direction() {
    let table = settlement(vec![
        // Debit higher by >= 1: batch 3.
        vec!["2024-01-10", "FD COMM", "", "105.00", "0"],
        vec!["2024-01-10", "FD COMM", "", "0", "100.00"],
        // Credit higher by >= 1: batch 4.
        vec!["2024-01-10", "FC COMM", "", "100.00", "0"],
        vec!["2024-01-10", "FC COMM", "", "0", "103.50"],
    ]);
    let report = run(&table);

    assert_eq!(report.stats.debit_commission, 2);
    assert_eq!(report.stats.credit_commission, 2);
    assert_eq!(report.stats.unmatched, 0);
}

#[test]
fn rate_differences_catch_sub_unit_gaps() {
    let table = settlement(vec![
        vec!["2024-01-10", "RATE DIFF", "", "200.40", "0"],
        vec!["2024-01-10", "RATE DIFF", "", "0", "200.00"],
    ]);
    let report = run(&table);

    assert_eq!(report.stats.rate_difference, 2);
    assert_eq!(report.stats.exact, 0);
    assert_eq!(report.stats.debit_commission, 0);
}

#[test]
fn exact_beats_rate_difference_ordering() {
    // Two credits compete for one debit: the exact one must win in B2.
    let table = settlement(vec![
        vec!["2024-01-10", "SHARED", "", "200.00", "0"],
        vec!["2024-01-10", "SHARED", "", "0", "200.30"],
        vec!["2024-01-10", "SHARED", "", "0", "200.00"],
    ]);
    let report = run(&table);

    assert_eq!(report.stats.exact, 2);
    assert_eq!(report.batches.exact.cell(1, 4), "200.00");
    assert_eq!(report.stats.unmatched, 1);
}

#[test]
fn blank_references_never_pair() {
    let table = settlement(vec![
        vec!["2024-01-10", "", "", "100.00", "0"],
        vec!["2024-01-10", "", "", "0", "100.00"],
        vec!["2024-01-10", "NAN", "", "50.00", "0"],
        vec!["2024-01-10", "nan", "", "0", "50.00"],
    ]);
    let report = run(&table);

    assert_eq!(report.stats.exact, 0, "blank groups must collide with nothing");
    assert_eq!(report.stats.unmatched, 4);
}

#[test]
fn row_counts_and_sums_are_conserved() {
    let table = settlement(vec![
        vec!["2024-01-10", "Correcting J10001", "", "40.00", "0"],
        vec!["2024-01-10", "paired row", "10001", "0", "40.00"],
        vec!["2024-01-10", "RJ33333333333", "", "120.00", "0"],
        vec!["2024-01-10", "RJ33333333333", "", "0", "120.00"],
        vec!["2024-01-10", "RJ44444444444", "", "77.77", "0"],
        vec!["2024-01-10", "", "", "0", "13.00"],
    ]);
    let report = run(&table);
    let stats = &report.stats;

    assert!(!stats.has_duplicates);
    assert!(!stats.sum_mismatch);
    assert_eq!(stats.total_rows, 6);
    assert_eq!(
        stats.correcting + stats.exact + stats.debit_commission + stats.credit_commission
            + stats.rate_difference + stats.unmatched,
        6
    );
    assert_eq!(stats.input_debit_sum, dec!(237.77));
    assert_eq!(stats.output_debit_sum, dec!(237.77));
    assert_eq!(stats.input_credit_sum, dec!(173.00));
    assert_eq!(stats.output_credit_sum, dec!(173.00));
}

#[test]
fn missing_column_is_a_configuration_error() {
    let table = Table::from_rows(
        vec!["Reference", "Journal", "Foreign Debit"],
        vec![vec!["X", "", "1.00"]],
    );
    assert!(reconcile_batches(&table, &CorporateColumns::default()).is_err());
}

#[test]
fn a_row_enters_at_most_one_batch() {
    // The debit could pair in several batches; sequential draining must
    // place it exactly once.
    let table = settlement(vec![
        vec!["2024-01-10", "MULTI", "", "100.00", "0"],
        vec!["2024-01-10", "MULTI", "", "0", "100.00"],
        vec!["2024-01-10", "MULTI", "", "0", "99.50"],
        vec!["2024-01-10", "MULTI", "", "0", "98.00"],
    ]);
    let report = run(&table);

    assert_eq!(report.stats.exact, 2);
    // Remaining credits have no debit partner left.
    assert_eq!(report.stats.rate_difference, 0);
    assert_eq!(report.stats.credit_commission, 0);
    assert_eq!(report.stats.unmatched, 2);
    assert!(!report.stats.has_duplicates);
}
