// 📒 Records - Bank and ledger lines plus match results
//
// Bank records come from the bank statement, ledger records from the
// accounting general ledger. Both are created once by ingestion and only
// their `matched` flag changes afterwards.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// BANK CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankCategory {
    /// Money coming into the account
    Deposit,

    /// Money leaving the account
    Withdrawal,
}

impl BankCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankCategory::Deposit => "Deposit",
            BankCategory::Withdrawal => "Withdrawal",
        }
    }

    /// Parse a category label (case-insensitive, surrounding whitespace ignored)
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "deposit" | "credit" => Some(BankCategory::Deposit),
            "withdrawal" | "debit" => Some(BankCategory::Withdrawal),
            _ => None,
        }
    }

    /// Category implied by the sign of a bank amount
    pub fn from_amount(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            BankCategory::Withdrawal
        } else {
            BankCategory::Deposit
        }
    }
}

impl fmt::Display for BankCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// BANK RECORD
// ============================================================================

/// One bank-statement line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub date: NaiveDate,
    pub category: BankCategory,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub description: String,

    /// Signed amount, 2-place precision
    pub amount: Decimal,

    #[serde(default)]
    pub matched: bool,
}

impl BankRecord {
    pub fn new(
        date: NaiveDate,
        category: BankCategory,
        vendor: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        BankRecord {
            date,
            category,
            vendor: vendor.into(),
            description: description.into(),
            amount,
            matched: false,
        }
    }

    /// Absolute amount, the value every pass compares against
    pub fn abs_amount(&self) -> Decimal {
        self.amount.abs()
    }
}

// ============================================================================
// LEDGER RECORD
// ============================================================================

/// One accounting-ledger line
///
/// Exactly one of `debit`/`credit` is expected to be non-zero, but both are
/// always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub transaction_id: String,

    /// Ledger transaction type, e.g. "Check", "Deposit", "Bill Pmt -Check"
    #[serde(default)]
    pub ledger_type: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub split_label: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub amount: Decimal,

    #[serde(default)]
    pub matched: bool,
}

impl LedgerRecord {
    /// Minimal constructor; descriptive fields start empty
    pub fn new(date: NaiveDate, debit: Decimal, credit: Decimal) -> Self {
        LedgerRecord {
            date,
            transaction_id: String::new(),
            ledger_type: String::new(),
            account: String::new(),
            name: String::new(),
            memo: String::new(),
            split_label: String::new(),
            debit,
            credit,
            amount: debit - credit,
            matched: false,
        }
    }

    pub fn with_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = id.into();
        self
    }

    pub fn with_type(mut self, ledger_type: impl Into<String>) -> Self {
        self.ledger_type = ledger_type.into();
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_split_label(mut self, split: impl Into<String>) -> Self {
        self.split_label = split.into();
        self
    }
}

// ============================================================================
// MATCH KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    /// Same day, same amount, single candidate
    Exact,

    /// Same amount within a short date window (±3 by default)
    NearDate { days: i64 },

    /// Same amount within a wide date window (±7 by default)
    WideDate { days: i64 },

    /// One bank record covered by 2 or 3 ledger records
    Split { parts: usize },

    /// Amount within the fuzzy tolerance
    FuzzyAmount,

    /// Same amount, compatible type and similar vendor name
    VendorType { similarity_pct: u8 },
}

impl MatchKind {
    /// Short label used in exports and reports
    pub fn label(&self) -> String {
        match self {
            MatchKind::Exact => "Exact".to_string(),
            MatchKind::NearDate { days } | MatchKind::WideDate { days } => {
                format!("Near Date (±{})", days)
            }
            MatchKind::Split { parts } => format!("Split ({})", parts),
            MatchKind::FuzzyAmount => "Fuzzy Amount".to_string(),
            MatchKind::VendorType { similarity_pct } => {
                format!("Vendor+Type ({}%)", similarity_pct)
            }
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ============================================================================
// MATCH RESULT
// ============================================================================

/// Separator for multi-valued ledger fields
pub const JOIN_SEPARATOR: &str = ", ";

/// Ledger type shown when a match covers more than one ledger record
pub const MULTIPLE_LEDGER_TYPE: &str = "Multiple";

/// One committed match: a bank record and the ledger record(s) it consumed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub kind: MatchKind,
    pub bank_date: NaiveDate,

    /// Date of the first ledger record when several were consumed
    pub ledger_date: NaiveDate,

    /// Absolute bank amount
    pub amount: Decimal,
    pub bank_category: BankCategory,
    pub bank_vendor: String,
    pub bank_description: String,
    pub ledger_transaction_ids: String,
    pub ledger_type: String,
    pub ledger_names: String,
    pub ledger_memos: String,
    pub ledger_split_labels: String,

    /// Position of the bank record in the input sequence
    pub bank_index: usize,

    /// Positions of the consumed ledger records in the input sequence
    pub ledger_indices: Vec<usize>,
}

impl MatchResult {
    /// Build a match from one bank record and its non-empty ledger side
    pub(crate) fn build(
        kind: MatchKind,
        bank_index: usize,
        bank: &BankRecord,
        ledger_indices: &[usize],
        ledger: &[LedgerRecord],
    ) -> Self {
        let consumed: Vec<&LedgerRecord> = ledger_indices.iter().map(|&i| &ledger[i]).collect();
        let single = consumed.len() == 1;

        MatchResult {
            kind,
            bank_date: bank.date,
            ledger_date: consumed.first().map(|r| r.date).unwrap_or(bank.date),
            amount: bank.abs_amount(),
            bank_category: bank.category,
            bank_vendor: bank.vendor.clone(),
            bank_description: bank.description.clone(),
            ledger_transaction_ids: join_field(&consumed, |r| r.transaction_id.as_str()),
            ledger_type: if single {
                consumed[0].ledger_type.clone()
            } else {
                MULTIPLE_LEDGER_TYPE.to_string()
            },
            ledger_names: join_field(&consumed, |r| r.name.as_str()),
            ledger_memos: join_field(&consumed, |r| r.memo.as_str()),
            ledger_split_labels: join_field(&consumed, |r| r.split_label.as_str()),
            bank_index,
            ledger_indices: ledger_indices.to_vec(),
        }
    }

    pub fn is_split(&self) -> bool {
        self.ledger_indices.len() > 1
    }
}

fn join_field<'a>(records: &[&'a LedgerRecord], field: impl Fn(&'a LedgerRecord) -> &'a str) -> String {
    records
        .iter()
        .map(|r| field(r))
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR)
}

// ============================================================================
// TESTS
// ============================================================================
