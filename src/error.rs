//! Error types for the scoring library.
//!
//! Library layers return these; the binary and the run orchestration wrap
//! them in `anyhow` with context.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon table {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line {line} in lexicon table '{table}': {reason}")]
    Malformed {
        table: String,
        line: usize,
        reason: String,
    },

    #[error("failed to compile matcher for '{bank}': {source}")]
    Matcher {
        bank: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
pub enum NerError {
    #[error("entity recognizer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("entity recognizer returned status {status}")]
    Status { status: u16 },

    #[error("entity recognizer is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workbook {path:?} could not be encoded or decoded: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read item dump {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode item dump {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} could not be computed for non-empty text")]
    Incomplete { field: &'static str },

    #[error("scores were already attached to item {id}")]
    AlreadyScored { id: String },
}
