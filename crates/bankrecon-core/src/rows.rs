//! Canonical row arena built from the input tables.
//!
//! Rows are fixed structs addressed by `u32` ids (their input position);
//! phases hand sets of ids around and the original tables stay untouched for
//! passthrough into results.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{ReconError, ReconResult};
use crate::normalize::{parse_amount_column, parse_date_column, to_cents};
use crate::settings::{AmountMode, MatchSettings};
use crate::table::Table;

/// Which ledger amount column an amount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Debit,
    Credit,
}

/// One internal bookkeeping entry.
#[derive(Debug, Clone)]
pub struct LedgerRow {
    /// Input position, stable across the run
    pub id: u32,
    /// Calendar day, missing when unparseable
    pub date: Option<NaiveDate>,
    /// Trimmed reference text as it appeared
    pub reference: String,
    /// Non-negative debit amount
    pub debit: Decimal,
    /// Non-negative credit amount
    pub credit: Decimal,
    /// Debit magnitude in cents
    pub debit_cents: i64,
    /// Credit magnitude in cents
    pub credit_cents: i64,
}

impl LedgerRow {
    /// Uppercased reference for exact grouping.
    pub fn canonical_reference(&self) -> String {
        self.reference.to_uppercase()
    }

    /// Amount in cents on the given side.
    pub fn cents(&self, side: Side) -> i64 {
        match side {
            Side::Debit => self.debit_cents,
            Side::Credit => self.credit_cents,
        }
    }
}

/// One bank-statement transaction.
#[derive(Debug, Clone)]
pub struct StatementRow {
    /// Input position, stable across the run
    pub id: u32,
    /// Calendar day, missing when unparseable
    pub date: Option<NaiveDate>,
    /// Trimmed reference text as it appeared
    pub reference: String,
    /// Signed amount; positive is incoming
    pub amount: Decimal,
    /// Signed amount in cents
    pub amount_cents: i64,
}

impl StatementRow {
    /// Uppercased reference for exact grouping.
    pub fn canonical_reference(&self) -> String {
        self.reference.to_uppercase()
    }

    /// Magnitude in cents.
    pub fn magnitude_cents(&self) -> i64 {
        self.amount_cents.abs()
    }

    /// Ledger side this amount compares against under the given mode.
    pub fn compare_side(&self, mode: AmountMode) -> Side {
        match mode {
            AmountMode::DebitsOnly => Side::Debit,
            AmountMode::CreditsOnly => Side::Credit,
            AmountMode::Both => {
                if self.amount_cents >= 0 {
                    Side::Debit
                } else {
                    Side::Credit
                }
            }
        }
    }
}

/// Placeholder reference values that must never match each other.
const BLANK_REFERENCES: &[&str] = &["", "NAN", "NONE", "NULL", "0"];

/// Whether a reference is blank or a known placeholder.
pub fn is_blank_reference(reference: &str) -> bool {
    let canonical = reference.trim().to_uppercase();
    BLANK_REFERENCES.contains(&canonical.as_str())
}

/// Parse-warning counts accumulated while building the arena.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseWarnings {
    pub ledger: usize,
    pub statement: usize,
}

/// The normalized row arena for one reconcile call.
#[derive(Debug)]
pub struct RowArena {
    pub ledger: Vec<LedgerRow>,
    pub statement: Vec<StatementRow>,
    pub warnings: ParseWarnings,
}

/// Resolve a column binding against a table.
///
/// An existing column resolves to its index. A missing column is a
/// configuration error when the criterion that needs it is enabled, and
/// silently absent otherwise.
fn resolve_column(
    table: &Table,
    table_name: &str,
    column: &str,
    required: bool,
) -> ReconResult<Option<usize>> {
    if column.is_empty() {
        return if required {
            Err(ReconError::config(format!(
                "no {table_name} column configured"
            )))
        } else {
            Ok(None)
        };
    }
    match table.find_column(column) {
        Some(idx) => Ok(Some(idx)),
        None if required => Err(ReconError::missing_column(table_name, column)),
        None => Ok(None),
    }
}

/// Build the row arena from the two input tables.
pub fn build_arena(
    ledger: &Table,
    statement: &Table,
    settings: &MatchSettings,
) -> ReconResult<RowArena> {
    let cols = &settings.columns;
    let needs_debit = matches!(settings.amount_mode, AmountMode::DebitsOnly | AmountMode::Both);
    let needs_credit = matches!(settings.amount_mode, AmountMode::CreditsOnly | AmountMode::Both);

    let ledger_date = resolve_column(ledger, "ledger", &cols.ledger_date, settings.match_dates)?;
    let ledger_ref = resolve_column(
        ledger,
        "ledger",
        &cols.ledger_reference,
        settings.match_references,
    )?;
    let ledger_debit = resolve_column(
        ledger,
        "ledger",
        &cols.ledger_debit,
        settings.match_amounts && needs_debit,
    )?;
    let ledger_credit = resolve_column(
        ledger,
        "ledger",
        &cols.ledger_credit,
        settings.match_amounts && needs_credit,
    )?;
    let stmt_date = resolve_column(
        statement,
        "statement",
        &cols.statement_date,
        settings.match_dates,
    )?;
    let stmt_ref = resolve_column(
        statement,
        "statement",
        &cols.statement_reference,
        settings.match_references,
    )?;
    let stmt_amount = resolve_column(
        statement,
        "statement",
        &cols.statement_amount,
        settings.match_amounts,
    )?;

    let mut warnings = ParseWarnings::default();

    let (ledger_dates, w) = parse_optional_dates(ledger, ledger_date);
    warnings.ledger += w;
    let (debits, w) = parse_optional_amounts(ledger, ledger_debit);
    warnings.ledger += w;
    let (credits, w) = parse_optional_amounts(ledger, ledger_credit);
    warnings.ledger += w;

    let (stmt_dates, w) = parse_optional_dates(statement, stmt_date);
    warnings.statement += w;
    let (amounts, w) = parse_optional_amounts(statement, stmt_amount);
    warnings.statement += w;

    let ledger_rows = (0..ledger.len())
        .map(|i| {
            let debit = debits[i].abs();
            let credit = credits[i].abs();
            LedgerRow {
                id: i as u32,
                date: ledger_dates[i],
                reference: cell_or_empty(ledger, i, ledger_ref),
                debit,
                credit,
                debit_cents: to_cents(debit),
                credit_cents: to_cents(credit),
            }
        })
        .collect();

    let statement_rows = (0..statement.len())
        .map(|i| {
            let amount = amounts[i];
            StatementRow {
                id: i as u32,
                date: stmt_dates[i],
                reference: cell_or_empty(statement, i, stmt_ref),
                amount,
                amount_cents: to_cents(amount),
            }
        })
        .collect();

    Ok(RowArena {
        ledger: ledger_rows,
        statement: statement_rows,
        warnings,
    })
}

fn cell_or_empty(table: &Table, row: usize, col: Option<usize>) -> String {
    col.map(|c| table.cell(row, c).trim().to_string())
        .unwrap_or_default()
}

fn parse_optional_dates(
    table: &Table,
    col: Option<usize>,
) -> (Vec<Option<NaiveDate>>, usize) {
    match col {
        Some(c) => parse_date_column(&table.column_values(c)),
        None => (vec![None; table.len()], 0),
    }
}

fn parse_optional_amounts(table: &Table, col: Option<usize>) -> (Vec<Decimal>, usize) {
    match col {
        Some(c) => parse_amount_column(&table.column_values(c)),
        None => (vec![Decimal::ZERO; table.len()], 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger_table() -> Table {
        Table::from_rows(
            vec!["Date", "Reference", "Debit", "Credit"],
            vec![
                vec!["2024-01-15", "ABC123", "500.00", "0"],
                vec!["15/01/2024", "  abc123 ", "", "(250.00)"],
            ],
        )
    }

    fn statement_table() -> Table {
        Table::from_rows(
            vec!["Date", "Reference", "Amount"],
            vec![vec!["2024-01-15", "ABC123", "-500.00"]],
        )
    }

    #[test]
    fn arena_normalizes_amounts_and_dates() {
        let arena =
            build_arena(&ledger_table(), &statement_table(), &MatchSettings::default()).unwrap();
        assert_eq!(arena.ledger.len(), 2);
        assert_eq!(arena.ledger[0].debit_cents, 50_000);
        // Parenthesised negative is folded into a magnitude.
        assert_eq!(arena.ledger[1].credit, dec!(250.00));
        assert_eq!(arena.ledger[0].date, arena.ledger[1].date);
        assert_eq!(arena.statement[0].amount_cents, -50_000);
    }

    #[test]
    fn references_are_trimmed_not_case_folded() {
        let arena =
            build_arena(&ledger_table(), &statement_table(), &MatchSettings::default()).unwrap();
        assert_eq!(arena.ledger[1].reference, "abc123");
        assert_eq!(arena.ledger[1].canonical_reference(), "ABC123");
    }

    #[test]
    fn missing_required_column_is_a_config_error() {
        let mut settings = MatchSettings::default();
        settings.columns.statement_amount = "Value".to_string();
        let err = build_arena(&ledger_table(), &statement_table(), &settings).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { .. }));
    }

    #[test]
    fn blank_reference_placeholders_are_detected() {
        for blank in ["", "  ", "nan", "NONE", "null", "0"] {
            assert!(is_blank_reference(blank), "{blank:?} should be blank");
        }
        assert!(!is_blank_reference("ABC"));
    }

    #[test]
    fn statement_sign_selects_compare_side() {
        let arena =
            build_arena(&ledger_table(), &statement_table(), &MatchSettings::default()).unwrap();
        assert_eq!(arena.statement[0].compare_side(AmountMode::Both), Side::Credit);
        assert_eq!(
            arena.statement[0].compare_side(AmountMode::DebitsOnly),
            Side::Debit
        );
    }
}
