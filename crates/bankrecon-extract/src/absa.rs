//! ABSA statement catalogue.
//!
//! ABSA narratives interleave the payer name with branch fees quoted as
//! `( R,CC )` where the comma is the decimal separator. Stamped-statement
//! entries carry a fee but no payer reference.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::rules::{case_insensitive, Rule, RuleSet, UNKNOWN_REFERENCE};

/// Extractor for ABSA statement descriptions: reference plus fee.
pub struct AbsaStatementExtractor {
    fee: Regex,
    rules: RuleSet,
}

impl Default for AbsaStatementExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AbsaStatementExtractor {
    /// Compile the statement catalogue. Pattern order is load-bearing:
    /// later patterns overlap earlier ones and the first match wins.
    pub fn new() -> Self {
        let rules = RuleSet::new(vec![
            Rule::new(r"PayShap\s+Ext\s+Credit\s+([A-Z]\s+[A-Za-z]+)", upper_group),
            Rule::new(r"ACB\s+CREDIT\s+CAPITEC?\s+([A-Z]\s+[A-Za-z]+)", upper_group),
            Rule::first_group(
                r"DIGITAL\s+PAYMENT\s+CR\s+ABSA\s+BANK\s+([A-Z][a-zA-Z0-9]+(?:\s+[A-Z][a-zA-Z0-9]+)*)",
            ),
            Rule::first_group(
                r"DEPOSIT\s+NO\s*:\s*([a-zA-Z0-9]+(?:\s+[a-zA-Z0-9]+)*?)(?:\s+CONTACT\s*:|$)",
            ),
            Rule::first_group(r"ABSA\s+BANK\s+([A-Z][a-zA-Z0-9]+(?:\s+[A-Z][a-zA-Z0-9]+)*)"),
            Rule::first_group(r"CONTACT\s*:\s*(\d+)"),
        ]);
        Self {
            fee: case_insensitive(r"\(\s*(\d+),(\d+)\s*\)"),
            rules,
        }
    }

    /// Extract `(reference, fee)` from one description.
    ///
    /// Stamped-statement entries yield an empty reference; a description no
    /// pattern recognises yields `UNKNOWN`. A missing fee group is zero.
    pub fn extract(&self, description: &str) -> (String, Decimal) {
        let description = description.trim();

        let fee = self
            .fee
            .captures(description)
            .and_then(|caps| Decimal::from_str(&format!("{}.{}", &caps[1], &caps[2])).ok())
            .unwrap_or(Decimal::ZERO);

        if description.to_uppercase().contains("STAMPED STATEMENT") {
            return (String::new(), fee);
        }

        let reference = self
            .rules
            .apply(description)
            .unwrap_or_else(|| UNKNOWN_REFERENCE.to_string());
        (reference, fee)
    }
}

/// First capture group, trimmed and uppercased.
fn upper_group(caps: &regex::Captures<'_>) -> Option<String> {
    caps.get(1).map(|m| m.as_str().trim().to_uppercase())
}
