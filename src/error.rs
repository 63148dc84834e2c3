//! Error types for the collaborators around the matching core.
//!
//! The matching engine itself has no failure path; these cover reading
//! configuration, ingesting CSV exports and writing results.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("missing column '{column}' in header")]
    MissingColumn { column: String },

    #[error("invalid date '{value}' at line {line}")]
    InvalidDate { line: u64, value: String },

    #[error("invalid amount '{value}' in column {column} at line {line}")]
    InvalidAmount {
        line: u64,
        column: String,
        value: String,
    },

    #[error("invalid category '{value}' at line {line}")]
    InvalidCategory { line: u64, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type IngestResult<T> = Result<T, IngestError>;
pub type ExportResult<T> = Result<T, ExportError>;
