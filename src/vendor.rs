// 🏪 Vendor Normalizer - Canonical names for bank vendors and ledger payees
//
// "ZELLE PAYMENT TO JOHN SMITH JPM..." → "JOHN"
// "AMERICAN EXPRESS ACH PMT"           → "AMEX"
// "ORIG CO NAME:GUSTO PAYROLL"         → "GUSTO"
//
// Synonym rules are data: an ordered list of (canonical, fragments), first
// match wins. The table is fixed once the engine is built.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vendor value that marks a peer-to-peer transfer
pub const PEER_PAYMENT_MARKER: &str = "ZELLE";

/// Literal prefixes removed before taking the first token, in this order
const STRIPPED_PREFIXES: [&str; 4] = [
    "ORIG CO NAME:",
    "PAYMENT TO",
    "ZELLE PAYMENT TO",
    "ZELLE PAYMENT FROM",
];

/// "PAYMENT TO <NAME>" / "PAYMENT FROM <NAME>", name ends at a routing token or end of text
static PEER_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"PAYMENT (?:TO|FROM)\s+(.+?)(?:\s+(?:JPM|BAC|WFCT|CONF#)|\s*$)")
        .expect("peer payment pattern is valid")
});

// ============================================================================
// SYNONYM RULES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymRule {
    /// Name returned when any fragment matches
    pub canonical: String,

    /// Text fragments searched for inside the uppercased vendor
    pub fragments: Vec<String>,
}

impl SynonymRule {
    pub fn new(canonical: &str, fragments: &[&str]) -> Self {
        SynonymRule {
            canonical: canonical.to_string(),
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Uppercase and trim everything; drop empty fragments (they would match anything)
    fn normalized(mut self) -> Self {
        self.canonical = self.canonical.trim().to_uppercase();
        self.fragments = self
            .fragments
            .iter()
            .map(|f| f.trim().to_uppercase())
            .filter(|f| !f.is_empty())
            .collect();
        self
    }

    fn matches(&self, vendor: &str) -> bool {
        self.fragments.iter().any(|f| vendor.contains(f.as_str()))
    }
}

/// How an external mapping treats a canonical key the built-in table already has
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynonymPolicy {
    /// Append external fragments to the built-in key, keeping its position
    #[default]
    Extend,

    /// Replace the built-in fragments with the external ones, keeping its position
    Override,
}

/// External synonym groups as they arrive from a file or a name-grouping service
///
/// Either an ordered list of rules or a plain object (keys taken in sorted order).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExternalSynonyms {
    Ordered(Vec<SynonymRule>),
    Mapping(BTreeMap<String, Vec<String>>),
}

impl ExternalSynonyms {
    pub fn into_rules(self) -> Vec<SynonymRule> {
        match self {
            ExternalSynonyms::Ordered(rules) => rules,
            ExternalSynonyms::Mapping(map) => map
                .into_iter()
                .map(|(canonical, fragments)| SynonymRule { canonical, fragments })
                .collect(),
        }
    }
}

// ============================================================================
// SYNONYM TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SynonymTable {
    rules: Vec<SynonymRule>,
}

impl SynonymTable {
    pub fn empty() -> Self {
        SynonymTable { rules: Vec::new() }
    }

    /// Built-in table of known institutions
    pub fn builtin() -> Self {
        let rules = vec![
            SynonymRule::new("AMEX", &["AMERICAN EXPRESS", "AMEX EPAYMENT", "AMEX"]),
            SynonymRule::new("CHASE", &["CHASE CREDIT CRD", "CHASE CARD", "JPMORGAN CHASE"]),
            SynonymRule::new("IRS", &["IRS USATAXPYMT", "US TREASURY", "INTERNAL REVENUE"]),
            SynonymRule::new("ADP", &["ADP PAYROLL", "ADP WAGE", "ADP TX/FINCL"]),
            SynonymRule::new("PAYPAL", &["PAYPAL"]),
            SynonymRule::new("INTUIT", &["INTUIT", "QUICKBOOKS", "QBOOKS"]),
            SynonymRule::new("STRIPE", &["STRIPE"]),
            SynonymRule::new("GUSTO", &["GUSTO"]),
            SynonymRule::new("COMCAST", &["COMCAST", "XFINITY"]),
        ];

        SynonymTable::from_rules(rules)
    }

    pub fn from_rules(rules: Vec<SynonymRule>) -> Self {
        SynonymTable {
            rules: rules.into_iter().map(SynonymRule::normalized).collect(),
        }
    }

    /// Built-in table merged with external groups under the given policy
    pub fn with_external(external: Vec<SynonymRule>, policy: SynonymPolicy) -> Self {
        let mut table = SynonymTable::builtin();
        table.merge(external, policy);
        table
    }

    /// Merge external rules; new keys go after existing ones in supplied order
    pub fn merge(&mut self, external: Vec<SynonymRule>, policy: SynonymPolicy) {
        for rule in external.into_iter().map(SynonymRule::normalized) {
            if rule.canonical.is_empty() {
                continue;
            }

            match self.rules.iter_mut().find(|r| r.canonical == rule.canonical) {
                Some(existing) => match policy {
                    SynonymPolicy::Extend => {
                        for fragment in rule.fragments {
                            if !existing.fragments.contains(&fragment) {
                                existing.fragments.push(fragment);
                            }
                        }
                    }
                    SynonymPolicy::Override => existing.fragments = rule.fragments,
                },
                None => self.rules.push(rule),
            }
        }
    }

    /// Canonical key of the first rule with a fragment inside `vendor`
    pub fn lookup(&self, vendor: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(vendor))
            .map(|rule| rule.canonical.as_str())
    }

    pub fn rules(&self) -> &[SynonymRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// VENDOR NORMALIZER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct VendorNormalizer {
    synonyms: SynonymTable,
}

impl VendorNormalizer {
    pub fn new(synonyms: SynonymTable) -> Self {
        VendorNormalizer { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Canonicalize a vendor (and optional bank description) to one comparable token
    ///
    /// Steps: peer-transfer name extraction, synonym lookup, prefix stripping,
    /// first token. Returns an empty string for an empty vendor.
    pub fn normalize(&self, vendor: &str, description: Option<&str>) -> String {
        let vendor = vendor.trim().to_uppercase();
        if vendor.is_empty() {
            return String::new();
        }

        if vendor == PEER_PAYMENT_MARKER {
            if let Some(name) = description.and_then(extract_peer_name) {
                return name;
            }
        }

        if let Some(canonical) = self.synonyms.lookup(&vendor) {
            return canonical.to_string();
        }

        let mut remaining = vendor.as_str();
        for prefix in STRIPPED_PREFIXES {
            if let Some(rest) = remaining.strip_prefix(prefix) {
                remaining = rest.trim();
            }
        }

        remaining
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// First word of the counterparty in a peer-transfer description
fn extract_peer_name(description: &str) -> Option<String> {
    let upper = description.to_uppercase();
    let captures = PEER_NAME_PATTERN.captures(&upper)?;
    let name = captures.get(1)?.as_str();

    name.split_whitespace().next().map(|word| word.to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> VendorNormalizer {
        VendorNormalizer::default()
    }

    #[test]
    fn test_empty_vendor() {
        assert_eq!(normalizer().normalize("", Some("PAYMENT TO JOHN")), "");
        assert_eq!(normalizer().normalize("   ", None), "");
    }

    #[test]
    fn test_zelle_payment_to() {
        let name = normalizer().normalize(
            "Zelle",
            Some("Zelle payment to JOHN SMITH JPM99ABC123"),
        );
        assert_eq!(name, "JOHN");
    }

    #[test]
    fn test_zelle_payment_from_end_of_text() {
        let name = normalizer().normalize("ZELLE", Some("ZELLE PAYMENT FROM MARIA LOPEZ"));
        assert_eq!(name, "MARIA");
    }

    #[test]
    fn test_zelle_without_pattern_falls_through() {
        assert_eq!(normalizer().normalize("ZELLE", Some("INSTANT TRANSFER")), "ZELLE");
        assert_eq!(normalizer().normalize("ZELLE", None), "ZELLE");
    }

    #[test]
    fn test_peer_exception_only_for_marker() {
        // description is ignored for ordinary vendors
        let name = normalizer().normalize("ACME SUPPLY", Some("PAYMENT TO JOHN SMITH"));
        assert_eq!(name, "ACME");
    }

    #[test]
    fn test_synonym_lookup() {
        let n = normalizer();
        assert_eq!(n.normalize("American Express ACH PMT", None), "AMEX");
        assert_eq!(n.normalize("xfinity mobile", None), "COMCAST");
        assert_eq!(n.normalize("QuickBooks Payments", None), "INTUIT");
    }

    #[test]
    fn test_prefix_stripping() {
        let n = normalizer();
        assert_eq!(n.normalize("ORIG CO NAME:ACME CORP", None), "ACME");
        assert_eq!(n.normalize("PAYMENT TO Bright Cleaning", None), "BRIGHT");
        assert_eq!(n.normalize("ZELLE PAYMENT FROM Dana", None), "DANA");
    }

    #[test]
    fn test_first_token() {
        assert_eq!(normalizer().normalize("  home depot #4411 ", None), "HOME");
    }

    #[test]
    fn test_normalize_idempotent_for_canonical_tokens() {
        let n = normalizer();
        for rule in n.synonyms().rules() {
            let once = n.normalize(&rule.canonical, None);
            let twice = n.normalize(&once, None);
            assert_eq!(once, twice, "canonical {}", rule.canonical);
        }

        for token in ["JOHN", "ACME", "ZELLE"] {
            assert_eq!(n.normalize(&n.normalize(token, None), None), token);
        }
    }

    #[test]
    fn test_first_rule_wins() {
        let table = SynonymTable::from_rules(vec![
            SynonymRule::new("FIRST", &["SHARED"]),
            SynonymRule::new("SECOND", &["SHARED"]),
        ]);
        assert_eq!(table.lookup("A SHARED VENDOR"), Some("FIRST"));
    }

    #[test]
    fn test_merge_extend_keeps_builtin_fragments() {
        let table = SynonymTable::with_external(
            vec![
                SynonymRule::new("amex", &["AMX CARD"]),
                SynonymRule::new("Bright", &["BRIGHT CLEANING SVC"]),
            ],
            SynonymPolicy::Extend,
        );

        assert_eq!(table.lookup("AMERICAN EXPRESS"), Some("AMEX"));
        assert_eq!(table.lookup("AMX CARD 0042"), Some("AMEX"));
        assert_eq!(table.lookup("BRIGHT CLEANING SVC LLC"), Some("BRIGHT"));
        assert_eq!(table.len(), SynonymTable::builtin().len() + 1);
        // new keys go last
        assert_eq!(table.rules().last().map(|r| r.canonical.as_str()), Some("BRIGHT"));
    }

    #[test]
    fn test_merge_override_replaces_fragments() {
        let table = SynonymTable::with_external(
            vec![SynonymRule::new("AMEX", &["AMX CARD"])],
            SynonymPolicy::Override,
        );

        assert_eq!(table.lookup("AMERICAN EXPRESS"), None);
        assert_eq!(table.lookup("AMX CARD 0042"), Some("AMEX"));
        // position kept
        assert_eq!(table.rules()[0].canonical, "AMEX");
    }

    #[test]
    fn test_empty_fragments_ignored() {
        let table = SynonymTable::from_rules(vec![SynonymRule::new("ANY", &["", "  "])]);
        assert_eq!(table.lookup("WHATEVER"), None);
    }

    #[test]
    fn test_external_synonyms_formats() {
        let ordered: ExternalSynonyms = serde_json::from_str(
            r#"[{"canonical": "ZED", "fragments": ["Z1"]}, {"canonical": "ALPHA", "fragments": ["A1"]}]"#,
        )
        .unwrap();
        let rules = ordered.into_rules();
        assert_eq!(rules[0].canonical, "ZED");
        assert_eq!(rules[1].canonical, "ALPHA");

        let mapping: ExternalSynonyms =
            serde_json::from_str(r#"{"ZED": ["Z1"], "ALPHA": ["A1", "A2"]}"#).unwrap();
        let rules = mapping.into_rules();
        assert_eq!(rules[0].canonical, "ALPHA");
        assert_eq!(rules[0].fragments, vec!["A1", "A2"]);
    }
}
