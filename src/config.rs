// ⚙️ Configuration - Engine thresholds, ingest filters, synonym sources
//
// Everything has a default; a JSON file only needs the keys it changes:
//
// {
//   "engine": { "fuzzy_tolerance": "0.50" },
//   "ingest": { "year": 2025, "ledger_account": "Operating Checking" },
//   "synonyms": { "file": "synonyms.json", "policy": "override" }
// }

use crate::error::ConfigError;
use crate::vendor::{ExternalSynonyms, SynonymPolicy, SynonymRule, SynonymTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Windows, tolerances and thresholds of the six passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pass 2 date window (days)
    pub near_days: i64,

    /// Pass 3 date window (days)
    pub wide_days: i64,

    /// Pass 4 date window (days)
    pub split_days: i64,

    /// Pass 5 date window (days)
    pub fuzzy_days: i64,

    /// Pass 6 date window (days)
    pub vendor_days: i64,

    /// Split sums must land strictly closer than this to the bank amount
    pub split_tolerance: Decimal,

    /// Pass 5 accepts amounts within this difference (inclusive)
    pub fuzzy_tolerance: Decimal,

    /// Pass 6 needs a name similarity strictly above this
    pub vendor_similarity_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            near_days: 3,
            wide_days: 7,
            split_days: 5,
            fuzzy_days: 3,
            vendor_days: 3,
            split_tolerance: Decimal::new(1, 2),
            fuzzy_tolerance: Decimal::new(100, 2),
            vendor_similarity_threshold: 0.6,
        }
    }
}

// ============================================================================
// INGEST CONFIG
// ============================================================================

/// Filters applied while reading the CSV exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Keep only records dated in this calendar year
    pub year: Option<i32>,

    /// Bank rows with one of these words in vendor or description are fees and dropped
    pub fee_tokens: Vec<String>,

    /// Keep only ledger rows whose account contains this text (case-insensitive)
    pub ledger_account: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            year: None,
            fee_tokens: vec!["FEE".to_string(), "FEES".to_string()],
            ledger_account: None,
        }
    }
}

// ============================================================================
// SYNONYM CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymConfig {
    /// JSON file with extra synonym groups
    pub file: Option<PathBuf>,

    /// Inline synonym groups, merged after the file
    pub groups: Vec<SynonymRule>,

    pub policy: SynonymPolicy,
}

impl SynonymConfig {
    /// Built-in table plus every configured external group
    pub fn build_table(&self) -> Result<SynonymTable, ConfigError> {
        let mut external = match &self.file {
            Some(path) => load_synonyms(path)?,
            None => Vec::new(),
        };
        external.extend(self.groups.iter().cloned());

        Ok(SynonymTable::with_external(external, self.policy))
    }
}

/// Load synonym groups from a JSON file (ordered list or object form)
pub fn load_synonyms(path: &Path) -> Result<Vec<SynonymRule>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let external: ExternalSynonyms =
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(external.into_rules())
}

// ============================================================================
// RECON CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub engine: EngineConfig,
    pub ingest: IngestConfig,
    pub synonyms: SynonymConfig,
}

impl ReconConfig {
    /// Load configuration from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
