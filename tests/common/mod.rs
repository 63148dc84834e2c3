//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use ledger_reconcile::{BankCategory, BankRecord, LedgerRecord};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

pub fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn date(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, day).unwrap()
}

pub fn deposit(m: u32, day: u32, vendor: &str, amount: &str) -> BankRecord {
    BankRecord::new(date(m, day), BankCategory::Deposit, vendor, "", d(amount))
}

pub fn withdrawal(m: u32, day: u32, vendor: &str, amount: &str) -> BankRecord {
    BankRecord::new(date(m, day), BankCategory::Withdrawal, vendor, "", -d(amount))
}

pub fn ledger_debit(m: u32, day: u32, ledger_type: &str, name: &str, amount: &str) -> LedgerRecord {
    LedgerRecord::new(date(m, day), d(amount), Decimal::ZERO)
        .with_type(ledger_type)
        .with_name(name)
}

pub fn ledger_credit(m: u32, day: u32, ledger_type: &str, name: &str, amount: &str) -> LedgerRecord {
    LedgerRecord::new(date(m, day), Decimal::ZERO, d(amount))
        .with_type(ledger_type)
        .with_name(name)
}

/// Deterministic mixed dataset: exact pairs, shifted dates, splits,
/// near-miss amounts, duplicates and strays
pub fn mixed_dataset(size: usize) -> (Vec<BankRecord>, Vec<LedgerRecord>) {
    let mut seed: u64 = 0x5eed_1234;
    let mut next = move |bound: u64| {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (seed >> 33) % bound
    };

    let mut bank = Vec::new();
    let mut ledger = Vec::new();

    for i in 0..size {
        let day = 1 + next(27) as u32;
        let cents = 1_000 + next(500_000) as i64;
        let amount = Decimal::new(cents, 2);
        let vendor = format!("VENDOR{} PAYMENT", i % 7);

        match next(6) {
            0 => {
                bank.push(BankRecord::new(date(3, day), BankCategory::Deposit, vendor.clone(), "", amount));
                ledger.push(LedgerRecord::new(date(3, day), amount, Decimal::ZERO).with_type("Deposit"));
            }
            1 => {
                bank.push(BankRecord::new(date(3, day), BankCategory::Withdrawal, vendor.clone(), "", -amount));
                let shifted = date(3, day) + chrono::Duration::days(next(8) as i64);
                ledger.push(LedgerRecord::new(shifted, Decimal::ZERO, amount).with_type("Check"));
            }
            2 => {
                let part = Decimal::new(cents / 3, 2);
                bank.push(BankRecord::new(date(3, day), BankCategory::Withdrawal, vendor.clone(), "", -amount));
                ledger.push(LedgerRecord::new(date(3, day), Decimal::ZERO, part).with_type("Check"));
                ledger.push(LedgerRecord::new(date(3, day), Decimal::ZERO, amount - part).with_type("Check"));
            }
            3 => {
                bank.push(BankRecord::new(date(3, day), BankCategory::Deposit, vendor.clone(), "", amount));
                let off = Decimal::new(next(150) as i64, 2);
                ledger.push(LedgerRecord::new(date(3, day), amount + off, Decimal::ZERO).with_type("Payment"));
            }
            4 => {
                bank.push(BankRecord::new(date(3, day), BankCategory::Withdrawal, vendor.clone(), "", -amount));
                ledger.push(LedgerRecord::new(date(3, day), Decimal::ZERO, amount).with_type("Expense"));
                ledger.push(LedgerRecord::new(date(3, day), Decimal::ZERO, amount).with_type("Expense"));
            }
            _ => {
                bank.push(BankRecord::new(date(3, day), BankCategory::Deposit, vendor, "", amount));
            }
        }
    }

    (bank, ledger)
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
