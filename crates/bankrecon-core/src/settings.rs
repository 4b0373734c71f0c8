//! Matcher configuration.

use serde::{Deserialize, Serialize};

/// Which ledger amount column participates in matching, and how the
/// statement sign is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmountMode {
    /// Compare the statement magnitude to the ledger debit; sign ignored.
    DebitsOnly,
    /// Compare the statement magnitude to the ledger credit; sign ignored.
    CreditsOnly,
    /// Statement amount >= 0 compares to the ledger debit, < 0 to the
    /// ledger credit (bank-side counterparty convention).
    #[default]
    Both,
}

/// Column-name bindings from the input tables to the canonical row fields.
///
/// Names resolve case-insensitively. An empty debit or credit name means the
/// ledger has no such column (the matching mode should reflect that).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMap {
    /// Ledger date column
    #[serde(default = "default_date_col")]
    pub ledger_date: String,
    /// Ledger reference column
    #[serde(default = "default_ref_col")]
    pub ledger_reference: String,
    /// Ledger debit column
    #[serde(default = "default_debit_col")]
    pub ledger_debit: String,
    /// Ledger credit column
    #[serde(default = "default_credit_col")]
    pub ledger_credit: String,
    /// Statement date column
    #[serde(default = "default_date_col")]
    pub statement_date: String,
    /// Statement reference column
    #[serde(default = "default_ref_col")]
    pub statement_reference: String,
    /// Statement signed amount column
    #[serde(default = "default_amount_col")]
    pub statement_amount: String,
}

fn default_date_col() -> String {
    "Date".to_string()
}
fn default_ref_col() -> String {
    "Reference".to_string()
}
fn default_debit_col() -> String {
    "Debit".to_string()
}
fn default_credit_col() -> String {
    "Credit".to_string()
}
fn default_amount_col() -> String {
    "Amount".to_string()
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            ledger_date: default_date_col(),
            ledger_reference: default_ref_col(),
            ledger_debit: default_debit_col(),
            ledger_credit: default_credit_col(),
            statement_date: default_date_col(),
            statement_reference: default_ref_col(),
            statement_amount: default_amount_col(),
        }
    }
}

/// Settings controlling matcher behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Rows must carry equal dates to match
    #[serde(default = "default_true")]
    pub match_dates: bool,
    /// Accept a one-calendar-day difference when matching dates
    #[serde(default)]
    pub date_tolerance: bool,
    /// References participate in matching (exact first, then fuzzy)
    #[serde(default = "default_true")]
    pub match_references: bool,
    /// Fall back to Levenshtein-ratio scoring when exact reference lookup fails
    #[serde(default = "default_true")]
    pub fuzzy_ref: bool,
    /// Minimum ratio (0-100) accepted as a reference match
    #[serde(default = "default_similarity")]
    pub similarity_threshold: u8,
    /// Amounts must match
    #[serde(default = "default_true")]
    pub match_amounts: bool,
    /// Which ledger amount column is compared
    #[serde(default)]
    pub amount_mode: AmountMode,
    /// Skip many-to-one split detection once the cumulative match rate
    /// exceeds this percentage; `None` disables the heuristic entirely
    #[serde(default = "default_skip_rate")]
    pub split_skip_match_rate: Option<f64>,
    /// Stop the many-to-one pass after this many split matches
    #[serde(default = "default_max_splits")]
    pub max_split_matches: usize,
    /// Bound a reference group to the N candidates closest in amount
    /// before running the subset-sum search
    #[serde(default = "default_max_group")]
    pub max_split_group: usize,
    /// Maximum number of rows in one split subset
    #[serde(default = "default_max_items")]
    pub max_split_items: usize,
    /// Column bindings
    #[serde(default)]
    pub columns: ColumnMap,
}

fn default_true() -> bool {
    true
}
fn default_similarity() -> u8 {
    85
}
fn default_skip_rate() -> Option<f64> {
    Some(95.0)
}
fn default_max_splits() -> usize {
    100
}
fn default_max_group() -> usize {
    20
}
fn default_max_items() -> usize {
    6
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            match_dates: true,
            date_tolerance: false,
            match_references: true,
            fuzzy_ref: true,
            similarity_threshold: default_similarity(),
            match_amounts: true,
            amount_mode: AmountMode::default(),
            split_skip_match_rate: default_skip_rate(),
            max_split_matches: default_max_splits(),
            max_split_group: default_max_group(),
            max_split_items: default_max_items(),
            columns: ColumnMap::default(),
        }
    }
}
