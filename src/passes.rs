// 🔁 Pass Executor - The six matching strategies
//
// Each pass walks the bank records in input order, skips the ones already
// matched, and commits at most one match per bank record:
//
//   1. Exact        same day, same amount, exactly one candidate
//   2. Near date    ±3 days, same amount, exactly one candidate
//   3. Wide date    ±7 days, same amount, exactly one candidate
//   4. Split        ±5 days, first 2/3 ledger records summing to the amount
//   5. Fuzzy        ±3 days, amount within 1.00, exactly one candidate
//   6. Vendor+Type  ±3 days, same amount, compatible type, first similar name
//
// Commits made earlier in a pass are visible to the rest of that pass.

use crate::candidates::{candidates, ledger_amount, AmountRule, CandidateRule};
use crate::config::EngineConfig;
use crate::records::{BankRecord, LedgerRecord, MatchKind, MatchResult};
use crate::similarity::similarity;
use crate::split::find_split;
use crate::state::MatchState;
use crate::vendor::VendorNormalizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ============================================================================
// PASS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pass {
    Exact,
    NearDate,
    WideDate,
    Split,
    FuzzyAmount,
    VendorType,
}

impl Pass {
    /// Fixed execution order
    pub const ORDER: [Pass; 6] = [
        Pass::Exact,
        Pass::NearDate,
        Pass::WideDate,
        Pass::Split,
        Pass::FuzzyAmount,
        Pass::VendorType,
    ];

    pub fn number(&self) -> usize {
        match self {
            Pass::Exact => 1,
            Pass::NearDate => 2,
            Pass::WideDate => 3,
            Pass::Split => 4,
            Pass::FuzzyAmount => 5,
            Pass::VendorType => 6,
        }
    }

    /// Pass that produces matches of this kind
    pub fn for_kind(kind: &MatchKind) -> Pass {
        match kind {
            MatchKind::Exact => Pass::Exact,
            MatchKind::NearDate { .. } => Pass::NearDate,
            MatchKind::WideDate { .. } => Pass::WideDate,
            MatchKind::Split { .. } => Pass::Split,
            MatchKind::FuzzyAmount => Pass::FuzzyAmount,
            MatchKind::VendorType { .. } => Pass::VendorType,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pass::Exact => "Exact",
            Pass::NearDate => "Near Date (±3)",
            Pass::WideDate => "Near Date (±7)",
            Pass::Split => "Split",
            Pass::FuzzyAmount => "Fuzzy Amount",
            Pass::VendorType => "Vendor+Type",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pass {}: {}", self.number(), self.name())
    }
}

// ============================================================================
// PASS CONTEXT
// ============================================================================

/// Read-only inputs shared by every pass of one run
pub struct PassContext<'a> {
    pub bank: &'a [BankRecord],
    pub ledger: &'a [LedgerRecord],
    pub config: &'a EngineConfig,
    pub vendors: &'a VendorNormalizer,
}

impl<'a> PassContext<'a> {
    /// Run one pass, returning the matches it committed
    pub fn run(&self, pass: Pass, state: &mut MatchState) -> Vec<MatchResult> {
        let cfg = self.config;

        match pass {
            Pass::Exact => self.run_unique(
                state,
                CandidateRule::new(0, AmountRule::Exact),
                MatchKind::Exact,
            ),
            Pass::NearDate => self.run_unique(
                state,
                CandidateRule::new(cfg.near_days, AmountRule::Exact),
                MatchKind::NearDate { days: cfg.near_days },
            ),
            Pass::WideDate => self.run_unique(
                state,
                CandidateRule::new(cfg.wide_days, AmountRule::Exact),
                MatchKind::WideDate { days: cfg.wide_days },
            ),
            Pass::Split => self.run_split(state),
            Pass::FuzzyAmount => self.run_unique(
                state,
                CandidateRule::new(cfg.fuzzy_days, AmountRule::Within(cfg.fuzzy_tolerance)),
                MatchKind::FuzzyAmount,
            ),
            Pass::VendorType => self.run_vendor_type(state),
        }
    }

    /// Passes 1, 2, 3, 5: match only when exactly one candidate qualifies
    fn run_unique(&self, state: &mut MatchState, rule: CandidateRule, kind: MatchKind) -> Vec<MatchResult> {
        let mut matches = Vec::new();

        for (i, bank) in self.bank.iter().enumerate() {
            if state.is_bank_matched(i) {
                continue;
            }

            let found = candidates(bank, self.ledger, state, &rule);
            if let [only] = found.as_slice() {
                self.commit(state, kind, i, &[*only], &mut matches);
            } else if found.len() > 1 {
                debug!(bank_index = i, candidates = found.len(), %kind, "Ambiguous, deferred");
            }
        }

        matches
    }

    /// Pass 4: first pair, then first triple, summing to the bank amount
    fn run_split(&self, state: &mut MatchState) -> Vec<MatchResult> {
        let rule = CandidateRule::new(self.config.split_days, AmountRule::Positive);
        let mut matches = Vec::new();

        for (i, bank) in self.bank.iter().enumerate() {
            if state.is_bank_matched(i) {
                continue;
            }

            let amounts: Vec<_> = candidates(bank, self.ledger, state, &rule)
                .into_iter()
                .map(|j| (j, ledger_amount(&self.ledger[j], bank.category)))
                .collect();

            if let Some(subset) = find_split(bank.abs_amount(), &amounts, self.config.split_tolerance) {
                let kind = MatchKind::Split { parts: subset.len() };
                self.commit(state, kind, i, &subset, &mut matches);
            }
        }

        matches
    }

    /// Pass 6: first compatible candidate whose normalized name is close enough
    fn run_vendor_type(&self, state: &mut MatchState) -> Vec<MatchResult> {
        let rule = CandidateRule::new(self.config.vendor_days, AmountRule::Exact).with_type_match();
        let mut matches = Vec::new();

        for (i, bank) in self.bank.iter().enumerate() {
            if state.is_bank_matched(i) {
                continue;
            }

            let description = Some(bank.description.as_str()).filter(|d| !d.trim().is_empty());
            let bank_name = self.vendors.normalize(&bank.vendor, description);

            let hit = candidates(bank, self.ledger, state, &rule)
                .into_iter()
                .find_map(|j| {
                    let ledger_name = self.vendors.normalize(&self.ledger[j].name, None);
                    self.name_score(&bank_name, &ledger_name).map(|score| (j, score))
                });

            if let Some((j, score)) = hit {
                let kind = MatchKind::VendorType {
                    similarity_pct: (score * 100.0).round().clamp(0.0, 100.0) as u8,
                };
                self.commit(state, kind, i, &[j], &mut matches);
            }
        }

        matches
    }

    /// Score when two normalized names are acceptable for pass 6
    fn name_score(&self, bank_name: &str, ledger_name: &str) -> Option<f64> {
        if !bank_name.is_empty() && bank_name == ledger_name {
            return Some(1.0);
        }

        let score = similarity(bank_name, ledger_name);
        (score > self.config.vendor_similarity_threshold).then_some(score)
    }

    fn commit(
        &self,
        state: &mut MatchState,
        kind: MatchKind,
        bank_index: usize,
        ledger_indices: &[usize],
        out: &mut Vec<MatchResult>,
    ) {
        if state.commit(bank_index, ledger_indices) {
            debug!(bank_index, ledger = ?ledger_indices, %kind, "Match committed");
            out.push(MatchResult::build(
                kind,
                bank_index,
                &self.bank[bank_index],
                ledger_indices,
                self.ledger,
            ));
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::BankCategory;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn withdrawal(day: u32, vendor: &str, amount: &str) -> BankRecord {
        BankRecord::new(date(day), BankCategory::Withdrawal, vendor, "", -d(amount))
    }

    fn deposit(day: u32, amount: &str) -> BankRecord {
        BankRecord::new(date(day), BankCategory::Deposit, "CUSTOMER", "", d(amount))
    }

    fn credit(day: u32, amount: &str) -> LedgerRecord {
        LedgerRecord::new(date(day), Decimal::ZERO, d(amount)).with_type("Check")
    }

    fn debit(day: u32, amount: &str) -> LedgerRecord {
        LedgerRecord::new(date(day), d(amount), Decimal::ZERO).with_type("Deposit")
    }

    fn run(pass: Pass, bank: &[BankRecord], ledger: &[LedgerRecord], state: &mut MatchState) -> Vec<MatchResult> {
        let config = EngineConfig::default();
        let vendors = VendorNormalizer::default();
        let ctx = PassContext {
            bank,
            ledger,
            config: &config,
            vendors: &vendors,
        };
        ctx.run(pass, state)
    }

    #[test]
    fn test_pass_order_and_names() {
        let numbers: Vec<usize> = Pass::ORDER.iter().map(|p| p.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(Pass::Split.to_string(), "Pass 4: Split");
        assert_eq!(Pass::WideDate.to_string(), "Pass 3: Near Date (±7)");
        assert_eq!(Pass::for_kind(&MatchKind::WideDate { days: 7 }), Pass::WideDate);
        assert_eq!(Pass::for_kind(&MatchKind::VendorType { similarity_pct: 80 }), Pass::VendorType);
    }

    #[test]
    fn test_exact_unique_candidate() {
        let bank = vec![deposit(15, "5000.00")];
        let ledger = vec![debit(15, "5000.00")];
        let mut state = MatchState::new(1, 1);

        let matches = run(Pass::Exact, &bank, &ledger, &mut state);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, MatchKind::Exact);
        assert_eq!(matches[0].amount, d("5000.00"));
        assert!(state.is_bank_matched(0));
        assert!(state.is_ledger_matched(0));
    }

    #[test]
    fn test_exact_ambiguous_is_deferred() {
        let bank = vec![deposit(15, "250.00")];
        let ledger = vec![debit(15, "250.00"), debit(15, "250.00")];
        let mut state = MatchState::new(1, 2);

        assert!(run(Pass::Exact, &bank, &ledger, &mut state).is_empty());
        assert_eq!(state.matched_bank_count(), 0);
    }

    #[test]
    fn test_commit_inside_pass_resolves_later_ambiguity() {
        let bank = vec![withdrawal(10, "A", "80.00"), withdrawal(14, "B", "80.00")];
        let ledger = vec![credit(9, "80.00"), credit(13, "80.00")];
        let mut state = MatchState::new(2, 2);

        let matches = run(Pass::NearDate, &bank, &ledger, &mut state);

        // bank 0 is ambiguous (both within 3 days) → deferred; bank 1 sees only ledger 1
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].bank_index, 1);
        assert_eq!(matches[0].ledger_indices, vec![1]);

        // a second run now finds bank 0 unique
        let matches = run(Pass::NearDate, &bank, &ledger, &mut state);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].bank_index, 0);
        assert_eq!(matches[0].ledger_indices, vec![0]);
    }

    #[test]
    fn test_split_pair() {
        let bank = vec![withdrawal(20, "PAYROLL", "10000.00")];
        let ledger = vec![credit(20, "6000.00"), credit(20, "4000.00")];
        let mut state = MatchState::new(1, 2);

        let matches = run(Pass::Split, &bank, &ledger, &mut state);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, MatchKind::Split { parts: 2 });
        assert_eq!(matches[0].ledger_indices, vec![0, 1]);
        assert_eq!(matches[0].ledger_type, "Multiple");
        assert_eq!(state.matched_ledger_count(), 2);
    }

    #[test]
    fn test_split_ignores_wrong_side_and_far_dates() {
        let bank = vec![withdrawal(20, "PAYROLL", "300.00")];
        let ledger = vec![
            credit(20, "100.00"),
            debit(20, "200.00"),  // debit side is zero for a withdrawal
            credit(26, "200.00"), // 6 days away
        ];
        let mut state = MatchState::new(1, 3);

        assert!(run(Pass::Split, &bank, &ledger, &mut state).is_empty());
    }

    #[test]
    fn test_split_window_edges_are_inclusive() {
        let bank = vec![withdrawal(20, "PAYROLL", "300.00")];
        let ledger = vec![credit(15, "100.00"), credit(25, "200.00")];
        let mut state = MatchState::new(1, 2);

        let matches = run(Pass::Split, &bank, &ledger, &mut state);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, MatchKind::Split { parts: 2 });
        assert_eq!(matches[0].ledger_indices, vec![0, 1]);
    }

    #[test]
    fn test_fuzzy_within_a_dollar() {
        let bank = vec![withdrawal(10, "UTILITY", "120.00")];
        let ledger = vec![credit(12, "119.25")];
        let mut state = MatchState::new(1, 1);

        let matches = run(Pass::FuzzyAmount, &bank, &ledger, &mut state);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, MatchKind::FuzzyAmount);
        assert_eq!(matches[0].amount, d("120.00"));
    }

    #[test]
    fn test_vendor_type_takes_first_similar_candidate() {
        let bank = vec![BankRecord::new(
            date(10),
            BankCategory::Withdrawal,
            "ZELLE",
            "ZELLE PAYMENT TO JOHN SMITH JPM99XYZ",
            d("-400.00"),
        )];
        let ledger = vec![
            credit(10, "400.00").with_name("Acme Rentals"),
            credit(11, "400.00").with_name("John Smith"),
            credit(11, "400.00").with_name("Johnny Smithers"),
        ];
        let mut state = MatchState::new(1, 3);

        let matches = run(Pass::VendorType, &bank, &ledger, &mut state);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].ledger_indices, vec![1]);
        assert_eq!(matches[0].kind, MatchKind::VendorType { similarity_pct: 100 });
    }

    #[test]
    fn test_vendor_type_prefers_earlier_over_closer_name() {
        let bank = vec![withdrawal(10, "JOHNSON", "50.00")];
        let ledger = vec![
            credit(10, "50.00").with_name("JOHNSTON"),
            credit(10, "50.00").with_name("JOHNSON"),
        ];
        let mut state = MatchState::new(1, 2);

        let matches = run(Pass::VendorType, &bank, &ledger, &mut state);

        // 7 of 8 characters agree
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].ledger_indices, vec![0]);
        assert_eq!(matches[0].kind, MatchKind::VendorType { similarity_pct: 88 });
        assert!(!state.is_ledger_matched(1));
    }

    #[test]
    fn test_vendor_type_requires_compatible_type() {
        let bank = vec![withdrawal(10, "ACME", "50.00")];
        let ledger = vec![credit(10, "50.00").with_type("Deposit").with_name("ACME")];
        let mut state = MatchState::new(1, 1);

        assert!(run(Pass::VendorType, &bank, &ledger, &mut state).is_empty());
    }

    #[test]
    fn test_vendor_type_threshold_is_strict() {
        // "ABCDE" vs "ABCXY": 2 edits of 5 → 0.6 exactly
        let bank = vec![withdrawal(10, "ABCDE", "50.00")];
        let ledger = vec![credit(10, "50.00").with_name("ABCXY")];
        let mut state = MatchState::new(1, 1);

        assert!(run(Pass::VendorType, &bank, &ledger, &mut state).is_empty());
    }

    #[test]
    fn test_already_matched_bank_skipped() {
        let bank = vec![deposit(15, "10.00")];
        let ledger = vec![debit(15, "10.00"), debit(15, "10.00")];
        let mut state = MatchState::new(1, 2);
        state.commit(0, &[1]);

        assert!(run(Pass::Exact, &bank, &ledger, &mut state).is_empty());
        assert!(!state.is_ledger_matched(0));
    }
}
