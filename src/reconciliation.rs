// ⚖️ Reconciliation Engine - Match bank lines against ledger lines
//
// Runs the six passes in order over one pair of record lists:
//
//   bank records ─┐                       ┌─ matches
//                 ├─ pass 1 … pass 6 ──── ┼─ unmatched bank
//   ledger records┘   (shared MatchState) └─ unmatched ledger
//
// Every record ends up in exactly one of: some match, or its unmatched list.
// Ambiguity is never guessed at; ambiguous records stay unmatched.

use crate::config::EngineConfig;
use crate::passes::{Pass, PassContext};
use crate::records::{BankRecord, LedgerRecord, MatchResult};
use crate::state::MatchState;
use crate::vendor::{SynonymTable, VendorNormalizer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// MATCH RATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MatchRate {
    /// Matches as a percentage of bank records
    Percent(f64),

    /// No bank records, so no rate
    NoBasis,
}

impl MatchRate {
    pub fn compute(match_count: usize, total_bank: usize) -> Self {
        if total_bank == 0 {
            MatchRate::NoBasis
        } else {
            MatchRate::Percent(match_count as f64 / total_bank as f64 * 100.0)
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            MatchRate::Percent(p) => Some(*p),
            MatchRate::NoBasis => None,
        }
    }
}

impl fmt::Display for MatchRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRate::Percent(p) => write!(f, "{:.1}%", p),
            MatchRate::NoBasis => f.write_str("n/a"),
        }
    }
}

// ============================================================================
// PROGRESS
// ============================================================================

/// What one pass contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub pass: Pass,

    /// Matches committed by this pass
    pub matches_added: usize,

    /// Bank records matched so far, this pass included
    pub matched_bank: usize,

    /// Ledger records matched so far, this pass included
    pub matched_ledger: usize,
}

/// Notified after each pass, in pass order
///
/// Observers only watch; nothing they do changes the outcome.
pub trait ProgressObserver {
    fn pass_completed(&mut self, summary: &PassSummary);
}

impl<F: FnMut(&PassSummary)> ProgressObserver for F {
    fn pass_completed(&mut self, summary: &PassSummary) {
        self(summary)
    }
}

/// Default observer: one log line per pass
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn pass_completed(&mut self, summary: &PassSummary) {
        info!(
            pass = summary.pass.number(),
            name = summary.pass.name(),
            added = summary.matches_added,
            matched_bank = summary.matched_bank,
            matched_ledger = summary.matched_ledger,
            "Pass complete"
        );
    }
}

// ============================================================================
// RECONCILIATION OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    pub run_id: Uuid,
    pub reconciled_at: DateTime<Utc>,

    /// Matches in commit order
    pub matches: Vec<MatchResult>,

    /// Bank records no pass could place, in input order
    pub unmatched_bank: Vec<BankRecord>,

    /// Ledger records no pass could place, in input order
    pub unmatched_ledger: Vec<LedgerRecord>,

    pub match_rate: MatchRate,
    pub total_bank: usize,
    pub total_ledger: usize,
    pub matched_bank_count: usize,
    pub matched_ledger_count: usize,
    pub pass_summaries: Vec<PassSummary>,
}

impl ReconciliationOutcome {
    /// Matches produced by one pass
    pub fn matches_for(&self, pass: Pass) -> usize {
        self.pass_summaries
            .iter()
            .find(|s| s.pass == pass)
            .map(|s| s.matches_added)
            .unwrap_or(0)
    }

    pub fn is_fully_reconciled(&self) -> bool {
        self.unmatched_bank.is_empty() && self.unmatched_ledger.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciliation {}: {} matches, {}/{} bank and {}/{} ledger records matched, match rate {}",
            self.run_id,
            self.matches.len(),
            self.matched_bank_count,
            self.total_bank,
            self.matched_ledger_count,
            self.total_ledger,
            self.match_rate
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

/// Immutable after construction; one engine can serve any number of runs
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    config: EngineConfig,
    normalizer: VendorNormalizer,
}

impl ReconciliationEngine {
    /// Default thresholds and the built-in synonym table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        ReconciliationEngine {
            config,
            normalizer: VendorNormalizer::default(),
        }
    }

    pub fn with_synonyms(config: EngineConfig, synonyms: SynonymTable) -> Self {
        ReconciliationEngine {
            config,
            normalizer: VendorNormalizer::new(synonyms),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &VendorNormalizer {
        &self.normalizer
    }

    /// Reconcile, logging each pass through `tracing`
    pub fn reconcile(&self, bank: Vec<BankRecord>, ledger: Vec<LedgerRecord>) -> ReconciliationOutcome {
        self.reconcile_with_observer(bank, ledger, &mut TracingProgress)
    }

    /// Reconcile, reporting each pass to `observer`
    pub fn reconcile_with_observer(
        &self,
        mut bank: Vec<BankRecord>,
        mut ledger: Vec<LedgerRecord>,
        observer: &mut dyn ProgressObserver,
    ) -> ReconciliationOutcome {
        let run_id = Uuid::new_v4();
        let total_bank = bank.len();
        let total_ledger = ledger.len();

        info!(%run_id, total_bank, total_ledger, "Reconciliation started");

        let mut state = MatchState::new(total_bank, total_ledger);
        let mut matches = Vec::new();
        let mut pass_summaries = Vec::with_capacity(Pass::ORDER.len());

        {
            let ctx = PassContext {
                bank: &bank,
                ledger: &ledger,
                config: &self.config,
                vendors: &self.normalizer,
            };

            for pass in Pass::ORDER {
                let added = ctx.run(pass, &mut state);

                let summary = PassSummary {
                    pass,
                    matches_added: added.len(),
                    matched_bank: state.matched_bank_count(),
                    matched_ledger: state.matched_ledger_count(),
                };
                observer.pass_completed(&summary);

                matches.extend(added);
                pass_summaries.push(summary);
            }
        }

        for (i, record) in bank.iter_mut().enumerate() {
            record.matched = state.is_bank_matched(i);
        }
        for (i, record) in ledger.iter_mut().enumerate() {
            record.matched = state.is_ledger_matched(i);
        }

        let unmatched_bank: Vec<BankRecord> = bank.into_iter().filter(|r| !r.matched).collect();
        let unmatched_ledger: Vec<LedgerRecord> = ledger.into_iter().filter(|r| !r.matched).collect();

        let outcome = ReconciliationOutcome {
            run_id,
            reconciled_at: Utc::now(),
            match_rate: MatchRate::compute(matches.len(), total_bank),
            matches,
            unmatched_bank,
            unmatched_ledger,
            total_bank,
            total_ledger,
            matched_bank_count: state.matched_bank_count(),
            matched_ledger_count: state.matched_ledger_count(),
            pass_summaries,
        };

        info!(
            %run_id,
            matches = outcome.matches.len(),
            unmatched_bank = outcome.unmatched_bank.len(),
            unmatched_ledger = outcome.unmatched_ledger.len(),
            match_rate = %outcome.match_rate,
            "Reconciliation finished"
        );

        outcome
    }
}

// ============================================================================
// TESTS
// ============================================================================
