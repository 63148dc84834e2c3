// 🔎 Candidate Filter - Date, amount and type predicates per pass
//
// For one bank record, narrow the ledger side to the unmatched records a
// pass is allowed to look at. Candidates always come back in input order.

use crate::records::{BankCategory, BankRecord, LedgerRecord};
use crate::state::MatchState;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Ledger types that can stand for a bank deposit
pub const DEPOSIT_LEDGER_TYPES: [&str; 4] = ["Deposit", "Payment", "Sales Receipt", "Invoice Payment"];

/// Ledger types that can stand for a bank withdrawal
pub const WITHDRAWAL_LEDGER_TYPES: [&str; 5] =
    ["Check", "Bill Pmt -Check", "Transfer", "Expense", "Credit Card"];

// ============================================================================
// PREDICATES
// ============================================================================

pub fn same_day(d1: NaiveDate, d2: NaiveDate) -> bool {
    d1 == d2
}

/// Inclusive, symmetric calendar-day window
pub fn within_days(d1: NaiveDate, d2: NaiveDate, days: i64) -> bool {
    (d1 - d2).num_days().abs() <= days
}

/// Debit for deposits, credit for withdrawals
pub fn ledger_amount(record: &LedgerRecord, category: BankCategory) -> Decimal {
    match category {
        BankCategory::Deposit => record.debit,
        BankCategory::Withdrawal => record.credit,
    }
}

pub fn type_compatible(category: BankCategory, ledger_type: &str) -> bool {
    let ledger_type = ledger_type.trim();
    match category {
        BankCategory::Deposit => DEPOSIT_LEDGER_TYPES.contains(&ledger_type),
        BankCategory::Withdrawal => WITHDRAWAL_LEDGER_TYPES.contains(&ledger_type),
    }
}

// ============================================================================
// CANDIDATE RULE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountRule {
    /// Ledger amount equals the absolute bank amount
    Exact,

    /// Ledger amount within the tolerance of the absolute bank amount (inclusive)
    Within(Decimal),

    /// Any positive ledger amount
    Positive,
}

impl AmountRule {
    pub fn accepts(&self, ledger_amount: Decimal, bank_amount: Decimal) -> bool {
        match self {
            AmountRule::Exact => ledger_amount == bank_amount,
            AmountRule::Within(tolerance) => (ledger_amount - bank_amount).abs() <= *tolerance,
            AmountRule::Positive => ledger_amount > Decimal::ZERO,
        }
    }
}

/// What one pass requires of a ledger candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateRule {
    /// Date window in days; 0 means same day
    pub window_days: i64,
    pub amount: AmountRule,
    pub require_type_match: bool,
}

impl CandidateRule {
    pub fn new(window_days: i64, amount: AmountRule) -> Self {
        CandidateRule {
            window_days,
            amount,
            require_type_match: false,
        }
    }

    pub fn with_type_match(mut self) -> Self {
        self.require_type_match = true;
        self
    }

    pub fn accepts(&self, bank: &BankRecord, ledger: &LedgerRecord) -> bool {
        let date_ok = if self.window_days == 0 {
            same_day(bank.date, ledger.date)
        } else {
            within_days(bank.date, ledger.date, self.window_days)
        };

        date_ok
            && self
                .amount
                .accepts(ledger_amount(ledger, bank.category), bank.abs_amount())
            && (!self.require_type_match || type_compatible(bank.category, &ledger.ledger_type))
    }
}

/// Indices of unmatched ledger records the rule accepts for this bank record
pub fn candidates(
    bank: &BankRecord,
    ledger: &[LedgerRecord],
    state: &MatchState,
    rule: &CandidateRule,
) -> Vec<usize> {
    ledger
        .iter()
        .enumerate()
        .filter(|(i, record)| !state.is_ledger_matched(*i) && rule.accepts(bank, record))
        .map(|(i, _)| i)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
