//! The extraction rule engine.

use regex::{Captures, Regex, RegexBuilder};
use rust_decimal::Decimal;
use serde::Serialize;

/// Reference placeholder returned when no rule matches at all.
pub const UNKNOWN_REFERENCE: &str = "UNKNOWN";

/// Fields a workflow can derive from one description string.
///
/// Which fields are populated depends on the catalogue: statement
/// catalogues yield a reference (ABSA also a fee), ledger catalogues yield
/// an RJ-number and a payment reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedRecord {
    pub reference: Option<String>,
    pub fee: Option<Decimal>,
    pub rj_number: Option<String>,
    pub payment_ref: Option<String>,
}

impl ExtractedRecord {
    /// Record carrying only a reference.
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }
}

/// One (pattern, extractor) pair.
pub struct Rule {
    pattern: Regex,
    extract: Box<dyn Fn(&Captures<'_>) -> Option<String> + Send + Sync>,
}

impl Rule {
    /// Compile a case-insensitive rule. Panics on an invalid pattern, which
    /// only happens for a malformed catalogue constant.
    pub fn new(
        pattern: &str,
        extract: impl Fn(&Captures<'_>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            pattern: case_insensitive(pattern),
            extract: Box::new(extract),
        }
    }

    /// Rule that yields its first capture group, trimmed.
    pub fn first_group(pattern: &str) -> Self {
        Self::new(pattern, |caps| {
            caps.get(1).map(|m| m.as_str().trim().to_string())
        })
    }
}

/// An ordered rule catalogue; the first matching rule wins.
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build a catalogue preserving rule order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Apply the catalogue to one description.
    ///
    /// Returns the first rule's non-empty extraction, or `None` when no
    /// rule matched.
    pub fn apply(&self, description: &str) -> Option<String> {
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(description) {
                if let Some(value) = (rule.extract)(&caps) {
                    if !value.is_empty() {
                        return Some(value);
                    }
                }
            }
        }
        None
    }
}

/// Compile a case-insensitive regex from a catalogue constant.
pub(crate) fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid catalogue pattern {pattern:?}: {e}"))
}

/// Apply a per-row extractor across a whole description column.
pub fn extract_all<'a, I, F>(descriptions: I, extractor: F) -> Vec<ExtractedRecord>
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> ExtractedRecord,
{
    descriptions.into_iter().map(extractor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        let rules = RuleSet::new(vec![
            Rule::first_group(r"FROM\s+(.+)"),
            Rule::first_group(r"(.+)"),
        ]);
        assert_eq!(rules.apply("PAYMENT FROM ALICE").as_deref(), Some("ALICE"));
        assert_eq!(rules.apply("whatever text").as_deref(), Some("whatever text"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let rules = RuleSet::new(vec![Rule::first_group(r"CAPITEC\s+(.+)")]);
        assert_eq!(rules.apply("capitec J Doe").as_deref(), Some("J Doe"));
    }

    #[test]
    fn no_match_returns_none() {
        let rules = RuleSet::new(vec![Rule::first_group(r"NEDBANK\s+(.+)")]);
        assert_eq!(rules.apply("FNB something"), None);
    }

    #[test]
    fn extract_all_maps_a_whole_column() {
        let rules = RuleSet::new(vec![Rule::first_group(r"FROM\s+(.+)")]);
        let records = extract_all(["PAID FROM A", "PAID FROM B"], |description| {
            match rules.apply(description) {
                Some(reference) => ExtractedRecord::reference(reference),
                None => ExtractedRecord::reference(UNKNOWN_REFERENCE),
            }
        });
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reference.as_deref(), Some("A"));
        assert_eq!(records[1].reference.as_deref(), Some("B"));
        assert_eq!(records[0].fee, None);
    }
}
