//! Free-form amount and date normalization.
//!
//! Input cells are strings as they arrived from spreadsheets and bank
//! exports: currency sigils, thousands separators, parenthesised negatives,
//! and half a dozen date layouts. Normalization never fails a run; a cell
//! that cannot be parsed becomes zero (amounts) or missing (dates) and is
//! counted as a parse warning.

use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Date formats tried in order. The order is fixed so an ambiguous value
/// such as `03/04/2024` resolves the same way in both tables.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d/%m/%y",
    "%m/%d/%y",
    "%d-%m-%y",
    "%m-%d-%y",
];

/// Parse a free-form amount cell.
///
/// Strips currency sigils (`$`, `EUR`/`GBP` signs, `R`), whitespace and
/// thousands commas; a value wrapped in parentheses is negative. Returns
/// `None` when nothing numeric remains.
pub fn try_parse_amount(raw: &str) -> Option<Decimal> {
    let mut cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | 'R' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let mut negative = false;
    if cleaned.starts_with('(') && cleaned.ends_with(')') {
        negative = true;
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }

    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?;
    Some(if negative { -value } else { value })
}

/// Lossy amount parse: blank or unparseable cells become zero.
pub fn parse_amount(raw: &str) -> Decimal {
    try_parse_amount(raw).unwrap_or(Decimal::ZERO)
}

/// Parse a date cell against the fixed format list.
///
/// A trailing time-of-day component (`2024-01-15 00:00:00`) is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidates = [trimmed, trimmed.split_whitespace().next().unwrap_or(trimmed)];
    for candidate in candidates {
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return Some(date);
            }
        }
    }
    None
}

/// Normalize a whole amount column.
///
/// Returns the parsed values and the number of non-blank cells that failed
/// to parse.
pub fn parse_amount_column(values: &[&str]) -> (Vec<Decimal>, usize) {
    let parsed: Vec<(Decimal, bool)> = values
        .par_iter()
        .map(|raw| match try_parse_amount(raw) {
            Some(value) => (value, false),
            None => (Decimal::ZERO, !raw.trim().is_empty()),
        })
        .collect();
    let warnings = parsed.iter().filter(|(_, missed)| *missed).count();
    (parsed.into_iter().map(|(v, _)| v).collect(), warnings)
}

/// Normalize a whole date column.
///
/// Returns the parsed values and the number of non-blank cells that failed
/// to parse.
pub fn parse_date_column(values: &[&str]) -> (Vec<Option<NaiveDate>>, usize) {
    let parsed: Vec<(Option<NaiveDate>, bool)> = values
        .par_iter()
        .map(|raw| match parse_date(raw) {
            Some(date) => (Some(date), false),
            None => (None, !raw.trim().is_empty()),
        })
        .collect();
    let warnings = parsed.iter().filter(|(_, missed)| *missed).count();
    (parsed.into_iter().map(|(v, _)| v).collect(), warnings)
}

/// Convert a decimal amount to integer cents, rounding half away from zero
/// at two decimal places. All matching comparisons and the subset-sum
/// search run on this representation.
pub fn to_cents(amount: Decimal) -> i64 {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}
