//! Settings validation.

use crate::error::{ReconError, ReconResult};
use crate::settings::{AmountMode, MatchSettings};

/// Validate matcher settings before a run.
pub fn validate_settings(settings: &MatchSettings) -> ReconResult<()> {
    if settings.similarity_threshold > 100 {
        return Err(ReconError::validation(format!(
            "similarity_threshold must be between 0 and 100, got {}",
            settings.similarity_threshold
        )));
    }
    if let Some(rate) = settings.split_skip_match_rate {
        if !(0.0..=100.0).contains(&rate) {
            return Err(ReconError::validation(format!(
                "split_skip_match_rate must be between 0.0 and 100.0, got {}",
                rate
            )));
        }
    }
    if settings.max_split_items < 2 {
        return Err(ReconError::validation(
            "max_split_items must be at least 2 (a split has two or more members)",
        ));
    }
    if settings.max_split_group < 2 {
        return Err(ReconError::validation(
            "max_split_group must be at least 2",
        ));
    }
    validate_columns(settings)?;
    Ok(())
}

/// Validate the column bindings required by the enabled criteria.
fn validate_columns(settings: &MatchSettings) -> ReconResult<()> {
    let cols = &settings.columns;
    if settings.match_dates && (cols.ledger_date.is_empty() || cols.statement_date.is_empty()) {
        return Err(ReconError::config(
            "match_dates requires ledger and statement date columns",
        ));
    }
    if settings.match_references
        && (cols.ledger_reference.is_empty() || cols.statement_reference.is_empty())
    {
        return Err(ReconError::config(
            "match_references requires ledger and statement reference columns",
        ));
    }
    if settings.match_amounts {
        if cols.statement_amount.is_empty() {
            return Err(ReconError::config(
                "match_amounts requires a statement amount column",
            ));
        }
        let needs_debit = matches!(settings.amount_mode, AmountMode::DebitsOnly | AmountMode::Both);
        let needs_credit =
            matches!(settings.amount_mode, AmountMode::CreditsOnly | AmountMode::Both);
        if needs_debit && cols.ledger_debit.is_empty() {
            return Err(ReconError::config(format!(
                "amount_mode {:?} requires a ledger debit column",
                settings.amount_mode
            )));
        }
        if needs_credit && cols.ledger_credit.is_empty() {
            return Err(ReconError::config(format!(
                "amount_mode {:?} requires a ledger credit column",
                settings.amount_mode
            )));
        }
    }
    Ok(())
}
