//! Kazang ledger catalogue.
//!
//! Kazang comments carry one transaction identifier (RJ, CSH, TX, ZVC, ECO
//! or INN prefixed) followed by either the depositor's name, their phone
//! number, or both. The payment ref is the name when one is present, else
//! the phone number.

use regex::Regex;

use crate::rules::case_insensitive;

/// Extractor for Kazang ledger comments.
pub struct KazangLedgerExtractor {
    identifier: Regex,
    name: Regex,
    phone: Regex,
}

impl Default for KazangLedgerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KazangLedgerExtractor {
    /// Compile the catalogue.
    pub fn new() -> Self {
        Self {
            identifier: case_insensitive(r"#?(RJ|CSH|TX|ZVC|ECO|INN)-?(\d{6,})"),
            name: Regex::new(r"^[A-Za-z]+(?:\s+[A-Za-z]+)*").expect("name pattern"),
            phone: Regex::new(r"\d{6,}").expect("phone pattern"),
        }
    }

    /// Extract `(rj_number, payment_ref)` from one comment.
    ///
    /// The identifier is normalized: `#` and `-` separators stripped,
    /// uppercased. The payment ref prefers a personal name after the
    /// identifier and falls back to the phone number; a comment without any
    /// identifier is its own payment ref.
    pub fn extract(&self, comment: &str) -> (String, String) {
        let Some(hit) = self.identifier.find(comment) else {
            return (String::new(), comment.trim().to_string());
        };

        let rj = hit
            .as_str()
            .replace(['#', '-'], "")
            .to_uppercase();

        let tail = comment[hit.end()..]
            .trim_start_matches([' ', '.', ':', '-', '#', '(']);

        if let Some(name) = self.name.find(tail) {
            return (rj, name.as_str().trim().to_string());
        }
        if let Some(phone) = self.phone.find(tail) {
            return (rj, phone.as_str().to_string());
        }
        (rj, tail.trim_end_matches(')').trim().to_string())
    }
}
