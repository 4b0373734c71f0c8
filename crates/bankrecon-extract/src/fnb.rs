//! FNB reference catalogues.
//!
//! Statement descriptions carry payer names behind a handful of transaction
//! prefixes (app payments, ADT cash deposits, other banks' transfers).
//! Ledger comments carry RJ/TX identifiers and a free-text payment ref.

use regex::Regex;

use crate::rules::{case_insensitive, Rule, RuleSet, UNKNOWN_REFERENCE};

/// Branch and location prefixes stripped from ADT cash-deposit narratives.
const ADT_LOCATION_PREFIXES: &[&str] = &[
    "NEWTOWN", "WEST GAU", "RANDBRG", "FESTMALL", "DIEPSLOT", "PAN AFR", "MALLAFRI", "PRK CENT",
    "HORZNVIL", "THMBIAND", "KATLEHON", "ALEX", "Fourways", "00882112", "00795102", "COSMOMAL",
    "BAM SHOP", "02487002", "00635106", "00656006", "00656001", "ALEXMALL", "02137008", "T/ROUTE",
    "SSDNCR", "BENMORE",
];

/// Tokens that mark a business name worth keeping whole.
const BUSINESS_INDICATORS: &[&str] = &["LOGISTICS", "PACK", "SENZ", "PTY", "LTD"];

/// Extractor for FNB statement descriptions.
pub struct FnbStatementExtractor {
    rules: RuleSet,
    trailing_code: Regex,
    capitalised: Regex,
}

impl Default for FnbStatementExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FnbStatementExtractor {
    /// Compile the statement catalogue.
    pub fn new() -> Self {
        let rules = RuleSet::new(vec![
            Rule::first_group(r"FNB APP PAYMENT FROM\s+(.+)"),
            Rule::first_group(r"ADT CASH DEPO00882112\s+(.+)"),
            Rule::first_group(r"ADT CASH DEPOSIT\s+(.+)"),
            Rule::new(r"ADT CASH DEPO([A-Z]+)\s+(.+)", |caps| {
                caps.get(2).map(|m| m.as_str().trim().to_string())
            }),
            Rule::new(r"ADT CASH DEPO\w*\s+(.+)", |caps| {
                caps.get(1).map(|m| strip_adt_location(m.as_str()))
            }),
            Rule::first_group(r"CAPITEC\s+(.+)"),
            Rule::first_group(r"ABSA BANK\s+(.+)"),
            Rule::first_group(r"NEDBANK\s+(.+)"),
            Rule::first_group(r"STANDARD BANK\s+(.+)"),
            Rule::first_group(r"^([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*|[a-z]+)$"),
        ]);
        Self {
            rules,
            trailing_code: Regex::new(r"\s*\d{10,}$").expect("trailing-code pattern"),
            capitalised: Regex::new(r"^([A-Z][a-z]+|[A-Z]+)$").expect("capitalised pattern"),
        }
    }

    /// Extract the payer reference from one description.
    ///
    /// Falls back to the last two capitalised tokens of the description, and
    /// to `UNKNOWN` when nothing looks like a name.
    pub fn extract(&self, description: &str) -> String {
        let description = description.trim();

        if let Some(hit) = self.rules.apply(description) {
            let cleaned = self.trailing_code.replace(&hit, "").trim().to_string();
            if !cleaned.is_empty() {
                return cleaned;
            }
        }

        let names: Vec<&str> = description
            .split_whitespace()
            .filter(|word| self.capitalised.is_match(word))
            .collect();
        match names.len() {
            0 => UNKNOWN_REFERENCE.to_string(),
            1 => names[0].to_string(),
            n => names[n - 2..].join(" "),
        }
    }
}

/// Drop leading location codes from an ADT deposit narrative and keep
/// business names intact.
fn strip_adt_location(text: &str) -> String {
    let mut remaining = text.trim().to_string();
    for prefix in ADT_LOCATION_PREFIXES {
        let lowered = remaining.to_lowercase();
        let candidate = format!("{} ", prefix.to_lowercase());
        if lowered.starts_with(&candidate) {
            remaining = remaining[candidate.len()..].trim_start().to_string();
        }
    }

    let upper = remaining.to_uppercase();
    if BUSINESS_INDICATORS.iter().any(|word| upper.contains(word)) {
        return remaining;
    }
    if remaining.is_empty() {
        UNKNOWN_REFERENCE.to_string()
    } else {
        remaining
    }
}

/// Extractor for FNB (and ABSA) ledger comments: RJ/TX identifier plus a
/// payment reference.
pub struct LedgerCommentExtractor {
    identifier: Regex,
    payment_ref: Regex,
}

impl Default for LedgerCommentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerCommentExtractor {
    /// Compile the ledger catalogue.
    pub fn new() -> Self {
        Self {
            identifier: case_insensitive(r"(RJ|TX)-?(\d{6,})"),
            payment_ref: case_insensitive(r"Payment Ref[#:\s]*([\w\s\-.,&]+)"),
        }
    }

    /// Extract `(rj_number, payment_ref)` from one comment.
    ///
    /// The payment ref is whatever follows `Payment Ref#:`, else whatever
    /// follows the RJ/TX token up to the next separator, else the whole
    /// comment.
    pub fn extract(&self, comment: &str) -> (String, String) {
        let identifier = self.identifier.find(comment);
        let rj = identifier
            .map(|m| m.as_str().replace('-', ""))
            .unwrap_or_default();

        if let Some(caps) = self.payment_ref.captures(comment) {
            return (rj, caps[1].trim().to_string());
        }

        if let Some(m) = identifier {
            let tail = comment[m.end()..].trim_start_matches([' ', '.', ':', '-', '#']);
            let payref = tail
                .split(['.', ',', '\n', '\r'])
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            return (rj, payref);
        }

        (rj, comment.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_payment_yields_payer_name() {
        let extractor = FnbStatementExtractor::new();
        assert_eq!(
            extractor.extract("FNB APP PAYMENT FROM JOHN SMITH"),
            "JOHN SMITH"
        );
    }

    #[test]
    fn adt_deposit_strips_location_prefix() {
        let extractor = FnbStatementExtractor::new();
        assert_eq!(
            extractor.extract("ADT CASH DEPO NEWTOWN  T MOYO"),
            "T MOYO"
        );
    }

    #[test]
    fn adt_business_names_stay_whole() {
        let extractor = FnbStatementExtractor::new();
        assert_eq!(
            extractor.extract("ADT CASH DEPO BAM SHOP MAXI LOGISTICS PTY"),
            "MAXI LOGISTICS PTY"
        );
    }

    #[test]
    fn other_bank_transfers_yield_name() {
        let extractor = FnbStatementExtractor::new();
        assert_eq!(extractor.extract("CAPITEC S MOYO"), "S MOYO");
        assert_eq!(extractor.extract("NEDBANK P NCUBE"), "P NCUBE");
    }

    #[test]
    fn trailing_account_codes_are_dropped() {
        let extractor = FnbStatementExtractor::new();
        assert_eq!(
            extractor.extract("FNB APP PAYMENT FROM JANE DOE 0123456789012"),
            "JANE DOE"
        );
    }

    #[test]
    fn fallback_takes_last_two_capitalised_tokens() {
        let extractor = FnbStatementExtractor::new();
        assert_eq!(
            extractor.extract("POS purchase 123 at SUPER STORE"),
            "SUPER STORE"
        );
    }

    #[test]
    fn hopeless_descriptions_are_unknown() {
        let extractor = FnbStatementExtractor::new();
        assert_eq!(extractor.extract("1234 5678"), UNKNOWN_REFERENCE);
    }

    #[test]
    fn ledger_comment_with_payment_ref_marker() {
        let extractor = LedgerCommentExtractor::new();
        let (rj, payref) = extractor.extract("Ref #TX32749881276. Payment Ref #708164596");
        assert_eq!(rj, "TX32749881276");
        assert_eq!(payref, "708164596");
    }

    #[test]
    fn ledger_comment_tail_after_identifier() {
        let extractor = LedgerCommentExtractor::new();
        let (rj, payref) = extractor.extract("Ref #RJ49465028731. - 000089828, extra");
        assert_eq!(rj, "RJ49465028731");
        assert_eq!(payref, "000089828");
    }

    #[test]
    fn ledger_comment_without_identifier_is_the_payment_ref() {
        let extractor = LedgerCommentExtractor::new();
        let (rj, payref) = extractor.extract("  opening balance adjustment ");
        assert_eq!(rj, "");
        assert_eq!(payref, "opening balance adjustment");
    }

    #[test]
    fn dashed_identifier_is_normalized() {
        let extractor = LedgerCommentExtractor::new();
        let (rj, _) = extractor.extract("Ref RJ-34570058702 cash paid out");
        assert_eq!(rj, "RJ34570058702");
    }
}
