// 📥 Ingest - Bank statement and general-ledger CSV exports
//
// Bank CSV:   Date,Category,Vendor,Description,Amount
// Ledger CSV: Date,Transaction ID,Type,Account,Name,Memo,Split,Debit,Credit,Amount
//
// Columns are found by header name (case-insensitive), so extra columns and
// a different order are fine. Only Date/Amount (bank) and Date/Debit/Credit
// (ledger) are required. Rows with a blank date are section headers or
// totals in most exports and are skipped.

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::records::{BankCategory, BankRecord, LedgerRecord};
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Accepted date layouts, tried in order
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

// ============================================================================
// FIELD PARSING
// ============================================================================

/// Parse `MM/DD/YYYY` or `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parse a money amount rounded to 2 places
///
/// Accepts "$1,234.50", "-855.94", "-$855.94" and "(120.00)". Blank → None.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (negative, inner) = match value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, value),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();

    let amount = Decimal::from_str(&cleaned)
        .ok()?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Some(if negative { -amount } else { amount })
}

/// True when `text` has a whitespace-delimited word equal to one of `tokens`
fn has_fee_token(text: &str, tokens: &[String]) -> bool {
    text.split_whitespace()
        .any(|word| tokens.iter().any(|t| t.eq_ignore_ascii_case(word)))
}

// ============================================================================
// HEADER LOOKUP
// ============================================================================

struct Header {
    names: Vec<String>,
}

impl Header {
    fn new(record: &StringRecord) -> Self {
        Header {
            names: record.iter().map(|h| h.trim().to_lowercase()).collect(),
        }
    }

    fn optional(&self, column: &str) -> Option<usize> {
        let column = column.to_lowercase();
        self.names.iter().position(|n| *n == column)
    }

    fn required(&self, column: &str) -> IngestResult<usize> {
        self.optional(column).ok_or_else(|| IngestError::MissingColumn {
            column: column.to_string(),
        })
    }
}

/// Trimmed field value; absent column or short row reads as ""
fn field(record: &StringRecord, index: Option<usize>) -> &str {
    index.and_then(|i| record.get(i)).unwrap_or("").trim()
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn csv_error(source: csv::Error) -> IngestError {
    let line = source.position().map(|p| p.line()).unwrap_or(0);
    IngestError::Csv { line, source }
}

fn open(path: &Path) -> IngestResult<File> {
    File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn required_date(record: &StringRecord, index: usize) -> IngestResult<NaiveDate> {
    let value = field(record, Some(index));
    parse_date(value).ok_or_else(|| IngestError::InvalidDate {
        line: line_of(record),
        value: value.to_string(),
    })
}

/// Amount column; blank reads as None, garbage is an error
fn optional_amount(record: &StringRecord, index: Option<usize>, column: &str) -> IngestResult<Option<Decimal>> {
    let value = field(record, index);
    if value.is_empty() {
        return Ok(None);
    }

    parse_amount(value)
        .map(Some)
        .ok_or_else(|| IngestError::InvalidAmount {
            line: line_of(record),
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Debit and credit columns hold magnitudes; a negative cell is malformed
fn column_amount(record: &StringRecord, index: usize, column: &str) -> IngestResult<Decimal> {
    match optional_amount(record, Some(index), column)? {
        Some(value) if value.is_sign_negative() && !value.is_zero() => Err(IngestError::InvalidAmount {
            line: line_of(record),
            column: column.to_string(),
            value: field(record, Some(index)).to_string(),
        }),
        Some(value) => Ok(value),
        None => Ok(Decimal::ZERO),
    }
}

fn in_year(date: NaiveDate, year: Option<i32>) -> bool {
    year.map_or(true, |y| date.year() == y)
}

// ============================================================================
// BANK CSV
// ============================================================================

pub fn load_bank_csv<P: AsRef<Path>>(path: P, config: &IngestConfig) -> IngestResult<Vec<BankRecord>> {
    let path = path.as_ref();
    let records = read_bank_csv(open(path)?, config)?;
    info!(path = %path.display(), count = records.len(), "Loaded bank records");
    Ok(records)
}

pub fn read_bank_csv<R: Read>(reader: R, config: &IngestConfig) -> IngestResult<Vec<BankRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = Header::new(reader.headers().map_err(csv_error)?);
    let date_col = header.required("Date")?;
    let amount_col = header.required("Amount")?;
    let category_col = header.optional("Category");
    let vendor_col = header.optional("Vendor");
    let description_col = header.optional("Description");

    let mut records = Vec::new();

    for result in reader.records() {
        let row = result.map_err(csv_error)?;

        if field(&row, Some(date_col)).is_empty() {
            warn!(line = line_of(&row), "Skipping bank row without a date");
            continue;
        }

        let date = required_date(&row, date_col)?;
        let amount = optional_amount(&row, Some(amount_col), "Amount")?.ok_or_else(|| {
            IngestError::InvalidAmount {
                line: line_of(&row),
                column: "Amount".to_string(),
                value: String::new(),
            }
        })?;

        let category_text = field(&row, category_col);
        let category = if category_text.is_empty() {
            BankCategory::from_amount(amount)
        } else {
            BankCategory::parse(category_text).ok_or_else(|| IngestError::InvalidCategory {
                line: line_of(&row),
                value: category_text.to_string(),
            })?
        };

        let vendor = field(&row, vendor_col);
        let description = field(&row, description_col);

        if !in_year(date, config.year) {
            continue;
        }

        if has_fee_token(vendor, &config.fee_tokens) || has_fee_token(description, &config.fee_tokens) {
            debug!(line = line_of(&row), vendor, "Dropping bank fee row");
            continue;
        }

        records.push(BankRecord::new(date, category, vendor, description, amount));
    }

    Ok(records)
}

// ============================================================================
// LEDGER CSV
// ============================================================================

pub fn load_ledger_csv<P: AsRef<Path>>(path: P, config: &IngestConfig) -> IngestResult<Vec<LedgerRecord>> {
    let path = path.as_ref();
    let records = read_ledger_csv(open(path)?, config)?;
    info!(path = %path.display(), count = records.len(), "Loaded ledger records");
    Ok(records)
}

pub fn read_ledger_csv<R: Read>(reader: R, config: &IngestConfig) -> IngestResult<Vec<LedgerRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = Header::new(reader.headers().map_err(csv_error)?);
    let date_col = header.required("Date")?;
    let debit_col = header.required("Debit")?;
    let credit_col = header.required("Credit")?;
    let amount_col = header.optional("Amount");
    let id_col = header.optional("Transaction ID");
    let type_col = header.optional("Type");
    let account_col = header.optional("Account");
    let name_col = header.optional("Name");
    let memo_col = header.optional("Memo");
    let split_col = header.optional("Split");

    let account_filter = config
        .ledger_account
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_lowercase);

    let mut records = Vec::new();

    for result in reader.records() {
        let row = result.map_err(csv_error)?;

        if field(&row, Some(date_col)).is_empty() {
            warn!(line = line_of(&row), "Skipping ledger row without a date");
            continue;
        }

        let date = required_date(&row, date_col)?;
        let debit = column_amount(&row, debit_col, "Debit")?;
        let credit = column_amount(&row, credit_col, "Credit")?;
        let amount = optional_amount(&row, amount_col, "Amount")?;

        let account = field(&row, account_col);

        if !in_year(date, config.year) {
            continue;
        }

        if let Some(wanted) = &account_filter {
            if !account.to_lowercase().contains(wanted.as_str()) {
                continue;
            }
        }

        let mut record = LedgerRecord::new(date, debit, credit)
            .with_transaction_id(field(&row, id_col))
            .with_type(field(&row, type_col))
            .with_account(account)
            .with_name(field(&row, name_col))
            .with_memo(field(&row, memo_col))
            .with_split_label(field(&row, split_col));

        if let Some(amount) = amount {
            record.amount = amount;
        }

        records.push(record);
    }

    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    const BANK_CSV: &str = "\
Date,Category,Vendor,Description,Amount
01/15/2025,Deposit,CLIENT CO,ACH CREDIT,\"5,000.00\"
2025-01-16,,LANDLORD,RENT,-1500.00
01/17/2025,Withdrawal,CHASE,MONTHLY SERVICE FEE,-15.00
12/31/2024,Withdrawal,AMEX,EPAYMENT,($250.00)
,,,Ending balance,9000.00
";

    const LEDGER_CSV: &str = "\
Date,Transaction ID,Type,Account,Name,Memo,Split,Debit,Credit,Amount
01/15/2025,101,Deposit,Operating Checking,Client Co,Invoice 7,Sales,5000.00,,
01/17/2025,102,Check,Operating Checking,Landlord LLC,Jan rent,Rent,,1500.00,-1500.00
01/18/2025,103,Expense,Savings,Bank,,Fees,,15.00,
";

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(parse_date("01/05/2025"), Some(expected));
        assert_eq!(parse_date("1/5/2025"), Some(expected));
        assert_eq!(parse_date(" 2025-01-05 "), Some(expected));
        assert_eq!(parse_date("Jan 5 2025"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_amount_variants() {
        assert_eq!(parse_amount("$1,234.50"), Some(d("1234.50")));
        assert_eq!(parse_amount("-$855.94"), Some(d("-855.94")));
        assert_eq!(parse_amount("(120.00)"), Some(d("-120.00")));
        assert_eq!(parse_amount("10.005"), Some(d("10.01")));
        assert_eq!(parse_amount("  "), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_fee_token_is_whole_word() {
        let tokens = vec!["FEE".to_string(), "FEES".to_string()];
        assert!(has_fee_token("MONTHLY SERVICE FEE", &tokens));
        assert!(has_fee_token("wire fees", &tokens));
        assert!(!has_fee_token("COFFEE SHOP", &tokens));
        assert!(!has_fee_token("FEEDBACK INC", &tokens));
    }

    #[test]
    fn test_read_bank_csv() {
        let records = read_bank_csv(BANK_CSV.as_bytes(), &IngestConfig::default()).unwrap();

        // fee row dropped, blank-date total row skipped
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].amount, d("5000.00"));
        assert_eq!(records[0].category, BankCategory::Deposit);
        assert_eq!(records[1].category, BankCategory::Withdrawal);
        assert_eq!(records[1].vendor, "LANDLORD");
        assert_eq!(records[2].amount, d("-250.00"));
        assert!(records.iter().all(|r| !r.matched));
    }

    #[test]
    fn test_bank_year_filter() {
        let config = IngestConfig {
            year: Some(2025),
            ..IngestConfig::default()
        };
        let records = read_bank_csv(BANK_CSV.as_bytes(), &config).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.date.year() == 2025));
    }

    #[test]
    fn test_bank_invalid_category_reports_line() {
        let csv = "Date,Category,Vendor,Description,Amount\n01/15/2025,Refund,X,Y,1.00\n";
        let err = read_bank_csv(csv.as_bytes(), &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidCategory { line: 2, .. }));
    }

    #[test]
    fn test_bank_invalid_date_reports_line() {
        let csv = "Date,Amount\n01/15/2025,1.00\n15.01.2025,2.00\n";
        let err = read_bank_csv(csv.as_bytes(), &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidDate { line: 3, .. }));
    }

    #[test]
    fn test_bank_missing_amount_column() {
        let csv = "Date,Vendor\n01/15/2025,X\n";
        let err = read_bank_csv(csv.as_bytes(), &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { ref column } if column == "Amount"));
    }

    #[test]
    fn test_read_ledger_csv() {
        let records = read_ledger_csv(LEDGER_CSV.as_bytes(), &IngestConfig::default()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].debit, d("5000.00"));
        assert_eq!(records[0].credit, Decimal::ZERO);
        assert_eq!(records[0].amount, d("5000.00"));
        assert_eq!(records[1].ledger_type, "Check");
        assert_eq!(records[1].amount, d("-1500.00"));
        assert_eq!(records[1].transaction_id, "102");
        assert_eq!(records[2].amount, d("-15.00"));
    }

    #[test]
    fn test_ledger_account_filter() {
        let config = IngestConfig {
            ledger_account: Some("operating".to_string()),
            ..IngestConfig::default()
        };
        let records = read_ledger_csv(LEDGER_CSV.as_bytes(), &config).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.account == "Operating Checking"));
    }

    #[test]
    fn test_ledger_invalid_debit() {
        let csv = "Date,Debit,Credit\n01/15/2025,12x,\n";
        let err = read_ledger_csv(csv.as_bytes(), &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidAmount { line: 2, ref column, .. } if column == "Debit"));
    }

    #[test]
    fn test_ledger_negative_credit_rejected() {
        let csv = "Date,Debit,Credit\n01/15/2025,,(50.00)\n";
        let err = read_ledger_csv(csv.as_bytes(), &IngestConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidAmount { line: 2, ref column, ref value } if column == "Credit" && value == "(50.00)"
        ));

        let csv = "Date,Debit,Credit\n01/15/2025,-12.00,\n";
        let err = read_ledger_csv(csv.as_bytes(), &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidAmount { ref column, .. } if column == "Debit"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_bank_csv("/no/such/bank.csv", &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
