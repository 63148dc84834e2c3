// 📤 Export - CSV listings and a plain-text report of one run
//
// out/
//   matches.csv
//   unmatched_bank.csv
//   unmatched_ledger.csv
//   reconciliation_report.txt

use crate::error::{ExportError, ExportResult};
use crate::passes::Pass;
use crate::reconciliation::ReconciliationOutcome;
use crate::records::{BankRecord, LedgerRecord, MatchResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MATCHES_FILE: &str = "matches.csv";
pub const UNMATCHED_BANK_FILE: &str = "unmatched_bank.csv";
pub const UNMATCHED_LEDGER_FILE: &str = "unmatched_ledger.csv";
pub const REPORT_FILE: &str = "reconciliation_report.txt";

fn fmt_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

fn fmt_money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

// ============================================================================
// CSV ROWS
// ============================================================================

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    #[serde(rename = "Match Type")]
    match_type: String,
    #[serde(rename = "Bank Date")]
    bank_date: String,
    #[serde(rename = "Ledger Date")]
    ledger_date: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Bank Category")]
    bank_category: &'a str,
    #[serde(rename = "Bank Vendor")]
    bank_vendor: &'a str,
    #[serde(rename = "Bank Description")]
    bank_description: &'a str,
    #[serde(rename = "Ledger Transaction IDs")]
    ledger_transaction_ids: &'a str,
    #[serde(rename = "Ledger Type")]
    ledger_type: &'a str,
    #[serde(rename = "Ledger Names")]
    ledger_names: &'a str,
    #[serde(rename = "Ledger Memos")]
    ledger_memos: &'a str,
    #[serde(rename = "Ledger Split")]
    ledger_split_labels: &'a str,
}

impl<'a> From<&'a MatchResult> for MatchRow<'a> {
    fn from(m: &'a MatchResult) -> Self {
        MatchRow {
            match_type: m.kind.label(),
            bank_date: fmt_date(m.bank_date),
            ledger_date: fmt_date(m.ledger_date),
            amount: fmt_money(m.amount),
            bank_category: m.bank_category.as_str(),
            bank_vendor: &m.bank_vendor,
            bank_description: &m.bank_description,
            ledger_transaction_ids: &m.ledger_transaction_ids,
            ledger_type: &m.ledger_type,
            ledger_names: &m.ledger_names,
            ledger_memos: &m.ledger_memos,
            ledger_split_labels: &m.ledger_split_labels,
        }
    }
}

#[derive(Debug, Serialize)]
struct BankRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Vendor")]
    vendor: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Amount")]
    amount: String,
}

impl<'a> From<&'a BankRecord> for BankRow<'a> {
    fn from(r: &'a BankRecord) -> Self {
        BankRow {
            date: fmt_date(r.date),
            category: r.category.as_str(),
            vendor: &r.vendor,
            description: &r.description,
            amount: fmt_money(r.amount),
        }
    }
}

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Transaction ID")]
    transaction_id: &'a str,
    #[serde(rename = "Type")]
    ledger_type: &'a str,
    #[serde(rename = "Account")]
    account: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Memo")]
    memo: &'a str,
    #[serde(rename = "Split")]
    split_label: &'a str,
    #[serde(rename = "Debit")]
    debit: String,
    #[serde(rename = "Credit")]
    credit: String,
    #[serde(rename = "Amount")]
    amount: String,
}

impl<'a> From<&'a LedgerRecord> for LedgerRow<'a> {
    fn from(r: &'a LedgerRecord) -> Self {
        LedgerRow {
            date: fmt_date(r.date),
            transaction_id: &r.transaction_id,
            ledger_type: &r.ledger_type,
            account: &r.account,
            name: &r.name,
            memo: &r.memo,
            split_label: &r.split_label,
            debit: fmt_money(r.debit),
            credit: fmt_money(r.credit),
            amount: fmt_money(r.amount),
        }
    }
}

// ============================================================================
// CSV WRITERS
// ============================================================================

fn write_rows<W, T, I>(writer: W, rows: I) -> Result<(), csv::Error>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_matches_csv<W: Write>(writer: W, matches: &[MatchResult]) -> Result<(), csv::Error> {
    write_rows(writer, matches.iter().map(MatchRow::from))
}

pub fn write_bank_csv<W: Write>(writer: W, records: &[BankRecord]) -> Result<(), csv::Error> {
    write_rows(writer, records.iter().map(BankRow::from))
}

pub fn write_ledger_csv<W: Write>(writer: W, records: &[LedgerRecord]) -> Result<(), csv::Error> {
    write_rows(writer, records.iter().map(LedgerRow::from))
}

// ============================================================================
// TEXT REPORT
// ============================================================================

/// Plain-text rendering of an outcome
pub struct ReportView<'a>(pub &'a ReconciliationOutcome);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.0;

        writeln!(f, "BANK RECONCILIATION REPORT")?;
        writeln!(f, "{}", "=".repeat(72))?;
        writeln!(f, "Run ID:        {}", o.run_id)?;
        writeln!(f, "Reconciled at: {}", o.reconciled_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f)?;

        writeln!(f, "SUMMARY")?;
        writeln!(f, "{}", "-".repeat(72))?;
        writeln!(f, "Bank records:      {}", o.total_bank)?;
        writeln!(f, "Ledger records:    {}", o.total_ledger)?;
        writeln!(f, "Matches:           {}", o.matches.len())?;
        writeln!(f, "Matched bank:      {}", o.matched_bank_count)?;
        writeln!(f, "Matched ledger:    {}", o.matched_ledger_count)?;
        writeln!(f, "Unmatched bank:    {}", o.unmatched_bank.len())?;
        writeln!(f, "Unmatched ledger:  {}", o.unmatched_ledger.len())?;
        writeln!(f, "Match rate:        {}", o.match_rate)?;
        writeln!(f)?;

        writeln!(f, "MATCHES BY PASS")?;
        writeln!(f, "{}", "-".repeat(72))?;
        for pass in Pass::ORDER {
            writeln!(f, "{:<26} {}", pass.to_string(), o.matches_for(pass))?;
        }
        writeln!(f)?;

        let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for m in &o.matches {
            *by_kind.entry(m.kind.label()).or_insert(0) += 1;
        }

        writeln!(f, "MATCHES BY KIND")?;
        writeln!(f, "{}", "-".repeat(72))?;
        for (label, count) in &by_kind {
            writeln!(f, "{:<26} {}", label, count)?;
        }
        writeln!(f)?;

        writeln!(f, "MATCHES ({})", o.matches.len())?;
        writeln!(f, "{}", "-".repeat(72))?;
        for m in &o.matches {
            writeln!(
                f,
                "{}  {}  {:>12}  {:<20}  {} → {}",
                fmt_date(m.bank_date),
                fmt_date(m.ledger_date),
                fmt_money(m.amount),
                m.kind.label(),
                m.bank_vendor,
                m.ledger_names
            )?;
        }
        writeln!(f)?;

        writeln!(f, "UNMATCHED BANK ({})", o.unmatched_bank.len())?;
        writeln!(f, "{}", "-".repeat(72))?;
        for r in &o.unmatched_bank {
            writeln!(
                f,
                "{}  {:<10}  {:>12}  {}  {}",
                fmt_date(r.date),
                r.category.as_str(),
                fmt_money(r.amount),
                r.vendor,
                r.description
            )?;
        }
        writeln!(f)?;

        writeln!(f, "UNMATCHED LEDGER ({})", o.unmatched_ledger.len())?;
        writeln!(f, "{}", "-".repeat(72))?;
        for r in &o.unmatched_ledger {
            writeln!(
                f,
                "{}  {:<16}  {:>12}  {:>12}  {}  {}",
                fmt_date(r.date),
                r.ledger_type,
                fmt_money(r.debit),
                fmt_money(r.credit),
                r.name,
                r.memo
            )?;
        }

        Ok(())
    }
}

pub fn render_report(outcome: &ReconciliationOutcome) -> String {
    ReportView(outcome).to_string()
}

// ============================================================================
// OUTPUT DIRECTORY
// ============================================================================

/// Paths of the files written by `write_all`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub matches: PathBuf,
    pub unmatched_bank: PathBuf,
    pub unmatched_ledger: PathBuf,
    pub report: PathBuf,
}

impl ExportPaths {
    pub fn in_dir(dir: &Path) -> Self {
        ExportPaths {
            matches: dir.join(MATCHES_FILE),
            unmatched_bank: dir.join(UNMATCHED_BANK_FILE),
            unmatched_ledger: dir.join(UNMATCHED_LEDGER_FILE),
            report: dir.join(REPORT_FILE),
        }
    }
}

fn create(path: &Path) -> ExportResult<fs::File> {
    fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_at(path: &Path) -> impl FnOnce(csv::Error) -> ExportError + '_ {
    move |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Write the three CSV listings and the report into `dir`, creating it if needed
pub fn write_all<P: AsRef<Path>>(outcome: &ReconciliationOutcome, dir: P) -> ExportResult<ExportPaths> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let paths = ExportPaths::in_dir(dir);

    write_matches_csv(create(&paths.matches)?, &outcome.matches).map_err(csv_at(&paths.matches))?;
    write_bank_csv(create(&paths.unmatched_bank)?, &outcome.unmatched_bank)
        .map_err(csv_at(&paths.unmatched_bank))?;
    write_ledger_csv(create(&paths.unmatched_ledger)?, &outcome.unmatched_ledger)
        .map_err(csv_at(&paths.unmatched_ledger))?;

    fs::write(&paths.report, render_report(outcome)).map_err(|source| ExportError::Io {
        path: paths.report.clone(),
        source,
    })?;

    info!(dir = %dir.display(), matches = outcome.matches.len(), "Results exported");

    Ok(paths)
}

// ============================================================================
// TESTS
// ============================================================================
