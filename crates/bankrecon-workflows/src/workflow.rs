//! Workflow variants: extraction wiring and engine selection.

use serde::{Deserialize, Serialize};
use tracing::info;

use bankrecon_core::{
    reconcile_with_progress, MatchSettings, Progress, ReconError, ReconReport, ReconResult, Table,
};
use bankrecon_extract::absa::AbsaStatementExtractor;
use bankrecon_extract::bidvest::BidvestLedgerExtractor;
use bankrecon_extract::corporate::CorporateLedgerExtractor;
use bankrecon_extract::fnb::{FnbStatementExtractor, LedgerCommentExtractor};
use bankrecon_extract::kazang::KazangLedgerExtractor;

/// Column-name aliases that can carry a ledger comment.
const COMMENT_ALIASES: &[&str] = &["comment", "comments", "description", "narration", "particulars"];

/// The supported bank workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Fnb,
    Absa,
    Bidvest,
    Kazang,
    Corporate,
}

/// Which engine a workflow runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Four-phase ledger/statement matcher
    Standard,
    /// Single-table five-batch settlement matcher
    CorporateBatch,
}

impl WorkflowKind {
    /// Engine selected by this workflow.
    pub fn engine(&self) -> EngineKind {
        match self {
            Self::Corporate => EngineKind::CorporateBatch,
            _ => EngineKind::Standard,
        }
    }
}

/// A configured workflow with its catalogues compiled.
pub struct Workflow {
    kind: WorkflowKind,
    fnb_statement: FnbStatementExtractor,
    absa_statement: AbsaStatementExtractor,
    ledger_comment: LedgerCommentExtractor,
    bidvest_ledger: BidvestLedgerExtractor,
    kazang_ledger: KazangLedgerExtractor,
    corporate_ledger: CorporateLedgerExtractor,
}

impl Workflow {
    /// Build a workflow, compiling every catalogue once.
    pub fn new(kind: WorkflowKind) -> Self {
        Self {
            kind,
            fnb_statement: FnbStatementExtractor::new(),
            absa_statement: AbsaStatementExtractor::new(),
            ledger_comment: LedgerCommentExtractor::new(),
            bidvest_ledger: BidvestLedgerExtractor::new(),
            kazang_ledger: KazangLedgerExtractor::new(),
            corporate_ledger: CorporateLedgerExtractor::new(),
        }
    }

    /// The workflow variant.
    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    /// Derive this bank's reference columns on the statement table.
    ///
    /// FNB and ABSA extract a `Reference` (ABSA also a `Fee`) from the
    /// `Description` column, inserted right next to it. Other workflows use
    /// statements as delivered. Extraction is skipped when the derived
    /// column already exists.
    pub fn prepare_statement(&self, statement: &mut Table) -> ReconResult<()> {
        match self.kind {
            WorkflowKind::Fnb => {
                if statement.find_column("Reference").is_some() {
                    return Ok(());
                }
                let desc = statement.require_column("statement", "Description")?;
                let references: Vec<String> = statement
                    .column_values(desc)
                    .iter()
                    .map(|d| self.fnb_statement.extract(d))
                    .collect();
                statement.insert_column_after(desc, "Reference", references);
                info!(rows = statement.len(), "FNB statement references extracted");
            }
            WorkflowKind::Absa => {
                let desc = statement.require_column("statement", "Description")?;
                let extracted: Vec<(String, String)> = statement
                    .column_values(desc)
                    .iter()
                    .map(|d| {
                        let (reference, fee) = self.absa_statement.extract(d);
                        (reference, fee.to_string())
                    })
                    .collect();
                let (references, fees): (Vec<String>, Vec<String>) =
                    extracted.into_iter().unzip();
                match statement.find_column("Reference") {
                    Some(col) => statement.set_column(col, references),
                    None => statement.insert_column_after(desc, "Reference", references),
                }
                let reference_col = statement
                    .find_column("Reference")
                    .expect("reference column just ensured");
                match statement.find_column("Fee") {
                    Some(col) => statement.set_column(col, fees),
                    None => statement.insert_column_after(reference_col, "Fee", fees),
                }
                info!(rows = statement.len(), "ABSA statement references and fees extracted");
            }
            WorkflowKind::Bidvest | WorkflowKind::Kazang | WorkflowKind::Corporate => {}
        }
        Ok(())
    }

    /// Derive this bank's reference columns on the ledger table.
    ///
    /// The source column is found by the usual comment aliases, falling
    /// back to the second column, which is where exported ledgers keep
    /// their narrative.
    pub fn prepare_ledger(&self, ledger: &mut Table) -> ReconResult<()> {
        match self.kind {
            WorkflowKind::Fnb | WorkflowKind::Absa => {
                if ledger.find_column("RJ-Number").is_some()
                    || ledger.find_column("Payment Ref").is_some()
                {
                    return Ok(());
                }
                let comment = comment_column(ledger)?;
                let extracted: Vec<(String, String)> = ledger
                    .column_values(comment)
                    .iter()
                    .map(|c| self.ledger_comment.extract(c))
                    .collect();
                let (rj_numbers, payment_refs): (Vec<String>, Vec<String>) =
                    extracted.into_iter().unzip();
                ledger.insert_column_after(comment, "RJ-Number", rj_numbers);
                ledger.insert_column_after(comment + 1, "Payment Ref", payment_refs);
            }
            WorkflowKind::Bidvest => {
                if ledger.find_column("Reference").is_some() {
                    return Ok(());
                }
                let comment = comment_column(ledger)?;
                let references: Vec<String> = ledger
                    .column_values(comment)
                    .iter()
                    .map(|c| self.bidvest_ledger.extract(c))
                    .collect();
                ledger.insert_column_after(comment, "Reference", references);
            }
            WorkflowKind::Kazang => {
                if ledger.find_column("Payment Ref").is_some() {
                    return Ok(());
                }
                let comment = comment_column(ledger)?;
                let extracted: Vec<(String, String)> = ledger
                    .column_values(comment)
                    .iter()
                    .map(|c| self.kazang_ledger.extract(c))
                    .collect();
                let (rj_numbers, payment_refs): (Vec<String>, Vec<String>) =
                    extracted.into_iter().unzip();
                ledger.insert_column_after(comment, "Payment Ref", payment_refs);
                if ledger.find_column("RJ-Number").is_none() {
                    ledger.insert_column_after(comment + 1, "RJ-Number", rj_numbers);
                }
            }
            WorkflowKind::Corporate => {
                if ledger.find_column("Reference").is_some() {
                    return Ok(());
                }
                let comment = comment_column(ledger)?;
                let references: Vec<String> = ledger
                    .column_values(comment)
                    .iter()
                    .map(|c| self.corporate_ledger.extract(c))
                    .collect();
                ledger.insert_column_after(comment, "Reference", references);
            }
        }
        info!(
            workflow = ?self.kind,
            rows = ledger.len(),
            "ledger reference columns derived"
        );
        Ok(())
    }

    /// Run the standard four-phase engine for this workflow.
    ///
    /// Corporate inputs are a single settlement table; route them through
    /// [`crate::corporate::reconcile_batches`] instead.
    pub fn reconcile(
        &self,
        ledger: &Table,
        statement: &Table,
        settings: &MatchSettings,
        progress: &mut dyn Progress,
    ) -> ReconResult<ReconReport> {
        if self.kind.engine() != EngineKind::Standard {
            return Err(ReconError::config(
                "the Corporate workflow reconciles a single settlement table; use reconcile_batches",
            ));
        }
        reconcile_with_progress(ledger, statement, settings, progress)
    }
}

/// Find the ledger comment column by alias, falling back to the second
/// column.
fn comment_column(ledger: &Table) -> ReconResult<usize> {
    if let Some(col) = ledger.find_column_any(COMMENT_ALIASES) {
        return Ok(col);
    }
    if ledger.columns().len() > 1 {
        return Ok(1);
    }
    Err(ReconError::config(
        "no comment column found in ledger (tried comment/description/narration aliases)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnb_statement_gains_reference_next_to_description() {
        let mut statement = Table::from_rows(
            vec!["Date", "Description", "Amount"],
            vec![vec!["2024-01-15", "FNB APP PAYMENT FROM JOHN SMITH", "500.00"]],
        );
        Workflow::new(WorkflowKind::Fnb)
            .prepare_statement(&mut statement)
            .unwrap();
        assert_eq!(
            statement.columns(),
            &["Date", "Description", "Reference", "Amount"]
        );
        assert_eq!(statement.cell(0, 2), "JOHN SMITH");
    }

    #[test]
    fn absa_statement_gains_reference_then_fee() {
        let mut statement = Table::from_rows(
            vec!["Date", "Description", "Amount"],
            vec![vec![
                "2024-01-15",
                "CARDLESS CASH DEP HILLBROW 1( 5,49 ) DEPOSIT NO : linda CONTACT : 0744811776",
                "200.00",
            ]],
        );
        Workflow::new(WorkflowKind::Absa)
            .prepare_statement(&mut statement)
            .unwrap();
        assert_eq!(
            statement.columns(),
            &["Date", "Description", "Reference", "Fee", "Amount"]
        );
        assert_eq!(statement.cell(0, 2), "linda");
        assert_eq!(statement.cell(0, 3), "5.49");
    }

    #[test]
    fn kazang_ledger_gains_payment_ref_then_rj_number() {
        let mut ledger = Table::from_rows(
            vec!["Date", "Comment", "Debit", "Credit"],
            vec![vec![
                "2024-01-15",
                "Ref #RJ58822828410. - Gugu 6408370691",
                "150.00",
                "0",
            ]],
        );
        Workflow::new(WorkflowKind::Kazang)
            .prepare_ledger(&mut ledger)
            .unwrap();
        assert_eq!(
            ledger.columns(),
            &["Date", "Comment", "Payment Ref", "RJ-Number", "Debit", "Credit"]
        );
        assert_eq!(ledger.cell(0, 2), "Gugu");
        assert_eq!(ledger.cell(0, 3), "RJ58822828410");
    }

    #[test]
    fn bidvest_ledger_gains_joined_rj_references() {
        let mut ledger = Table::from_rows(
            vec!["Date", "Narration", "Debit"],
            vec![vec![
                "2024-01-15",
                "Ref RJ48033113323  Payment ref 010348419,Ref RJ47777997623",
                "100.00",
            ]],
        );
        Workflow::new(WorkflowKind::Bidvest)
            .prepare_ledger(&mut ledger)
            .unwrap();
        assert_eq!(ledger.cell(0, 2), "RJ48033113323, RJ47777997623");
    }

    #[test]
    fn ledger_without_comment_alias_falls_back_to_second_column() {
        let mut ledger = Table::from_rows(
            vec!["A", "B"],
            vec![vec!["x", "Ref #RJ12345678901. - note"]],
        );
        Workflow::new(WorkflowKind::Fnb).prepare_ledger(&mut ledger).unwrap();
        assert_eq!(ledger.columns()[2], "RJ-Number");
        assert_eq!(ledger.cell(0, 2), "RJ12345678901");
    }

    #[test]
    fn corporate_workflow_rejects_standard_reconcile() {
        let table = Table::new(vec![]);
        let err = Workflow::new(WorkflowKind::Corporate)
            .reconcile(
                &table,
                &table.clone(),
                &MatchSettings::default(),
                &mut bankrecon_core::NoProgress,
            )
            .unwrap_err();
        assert!(matches!(err, ReconError::ConfigError(_)));
    }

    #[test]
    fn existing_reference_column_is_left_alone() {
        let mut statement = Table::from_rows(
            vec!["Description", "Reference"],
            vec![vec!["CAPITEC S MOYO", "KEEP ME"]],
        );
        Workflow::new(WorkflowKind::Fnb)
            .prepare_statement(&mut statement)
            .unwrap();
        assert_eq!(statement.cell(0, 1), "KEEP ME");
        assert_eq!(statement.columns().len(), 2);
    }
}
