//! Bidvest ledger catalogue: RJ identifiers only.

use regex::Regex;

/// Extractor for Bidvest ledger comments.
pub struct BidvestLedgerExtractor {
    identifier: Regex,
}

impl Default for BidvestLedgerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl BidvestLedgerExtractor {
    /// Compile the catalogue.
    pub fn new() -> Self {
        Self {
            identifier: Regex::new(r"RJ\d{11}").expect("identifier pattern"),
        }
    }

    /// Extract every `RJ<11 digits>` occurrence, deduplicated in order of
    /// first appearance, joined with `", "`. No occurrence yields an empty
    /// string.
    pub fn extract(&self, comment: &str) -> String {
        let mut seen = Vec::new();
        for hit in self.identifier.find_iter(comment) {
            let reference = hit.as_str();
            if !seen.iter().any(|s| s == reference) {
                seen.push(reference.to_string());
            }
        }
        seen.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_reference() {
        let extractor = BidvestLedgerExtractor::new();
        assert_eq!(
            extractor.extract("Ref #RJ49465028731. - 000089828"),
            "RJ49465028731"
        );
    }

    #[test]
    fn multiple_references_join_in_order() {
        let extractor = BidvestLedgerExtractor::new();
        assert_eq!(
            extractor.extract("Ref RJ48033113323  Payment ref 010348419,Ref RJ47777997623"),
            "RJ48033113323, RJ47777997623"
        );
    }

    #[test]
    fn duplicates_collapse() {
        let extractor = BidvestLedgerExtractor::new();
        assert_eq!(
            extractor.extract("RJ42325355002 cancelled, re-issued as RJ42325355002"),
            "RJ42325355002"
        );
    }

    #[test]
    fn short_identifiers_do_not_count() {
        let extractor = BidvestLedgerExtractor::new();
        assert_eq!(extractor.extract("Ref RJ1234"), "");
    }
}
