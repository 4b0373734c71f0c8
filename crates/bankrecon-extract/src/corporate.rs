//! Corporate settlement catalogue.
//!
//! Settlement comments carry RJ/TX system identifiers plus standalone
//! five-digit journal numbers. Manual correcting journals are passed
//! through verbatim so the batch matcher can pair them by journal number.

use regex::Regex;

/// Extractor for Corporate ledger comments.
pub struct CorporateLedgerExtractor {
    rj: Regex,
    tx: Regex,
    journal: Regex,
    worded_journal: Regex,
}

impl Default for CorporateLedgerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CorporateLedgerExtractor {
    /// Compile the catalogue.
    pub fn new() -> Self {
        Self {
            rj: Regex::new(r"RJ\d{11}").expect("rj pattern"),
            tx: Regex::new(r"TX\d{11}").expect("tx pattern"),
            journal: Regex::new(r"J\d{5}").expect("journal pattern"),
            worded_journal: Regex::new(r"\b[A-Za-z]+\s+J\d{5}\b").expect("worded-journal pattern"),
        }
    }

    /// Extract the reference string for one comment.
    ///
    /// Comments containing `Correcting`, or shaped `<word> J<5 digits>`,
    /// come back verbatim; otherwise every RJ/TX/J identifier is collected,
    /// deduplicated in order and joined with `", "`.
    pub fn extract(&self, comment: &str) -> String {
        if comment.contains("Correcting") {
            return comment.trim().to_string();
        }
        if self.worded_journal.is_match(comment) {
            return comment.trim().to_string();
        }

        let mut seen: Vec<String> = Vec::new();
        let mut push = |reference: &str| {
            if !seen.iter().any(|s| s == reference) {
                seen.push(reference.to_string());
            }
        };
        for hit in self.rj.find_iter(comment) {
            push(hit.as_str());
        }
        for hit in self.tx.find_iter(comment) {
            push(hit.as_str());
        }
        for hit in self.journal.find_iter(comment) {
            if self.is_standalone_journal(comment, hit.start()) {
                push(hit.as_str());
            }
        }
        seen.join(", ")
    }

    /// A `J<digits>` token counts only when the J is not the tail of an RJ
    /// or TX identifier.
    fn is_standalone_journal(&self, comment: &str, j_offset: usize) -> bool {
        !matches!(
            comment[..j_offset].chars().next_back(),
            Some('R') | Some('T')
        )
    }
}
