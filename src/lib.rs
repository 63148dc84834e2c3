// Ledger Reconcile - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod records;        // Bank/ledger records and match results
pub mod similarity;     // Levenshtein-based name similarity
pub mod vendor;         // Vendor normalizer + synonym table
pub mod candidates;     // Per-pass candidate predicates
pub mod state;          // Matched-state container
pub mod split;          // 2/3-way split search
pub mod passes;         // The six matching passes
pub mod reconciliation; // Orchestrator + outcome
pub mod config;         // JSON configuration
pub mod error;          // Typed errors for ingest/config/export
pub mod ingest;         // CSV loaders
pub mod export;         // CSV listings + text report

// Re-export commonly used types
pub use records::{
    BankCategory, BankRecord, LedgerRecord, MatchKind, MatchResult,
    JOIN_SEPARATOR, MULTIPLE_LEDGER_TYPE,
};
pub use similarity::{levenshtein_distance, similarity};
pub use vendor::{
    ExternalSynonyms, SynonymPolicy, SynonymRule, SynonymTable, VendorNormalizer,
    PEER_PAYMENT_MARKER,
};
pub use candidates::{
    candidates, ledger_amount, same_day, type_compatible, within_days,
    AmountRule, CandidateRule,
};
pub use state::MatchState;
pub use split::{find_split, MAX_SPLIT_PARTS};
pub use passes::{Pass, PassContext};
pub use reconciliation::{
    MatchRate, PassSummary, ProgressObserver, ReconciliationEngine,
    ReconciliationOutcome, TracingProgress,
};
pub use config::{load_synonyms, EngineConfig, IngestConfig, ReconConfig, SynonymConfig};
pub use error::{ConfigError, ExportError, IngestError};
pub use ingest::{
    load_bank_csv, load_ledger_csv, parse_amount, parse_date,
    read_bank_csv, read_ledger_csv,
};
pub use export::{
    render_report, write_all, write_bank_csv, write_ledger_csv, write_matches_csv,
    ExportPaths, ReportView,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
