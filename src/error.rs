//! Error taxonomy for the routing core.
//!
//! Validation failures and table I/O failures are surfaced to the caller via
//! [`CoreError`]. Malformed numeric fields and missing-endpoint edge skips are
//! *not* represented here — those degrade to a configured default and a
//! `tracing::warn!`, per the data-quality-vs-validation split documented in
//! `SPEC_FULL.md` section 7.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("failed to read table {path}: {source}")]
    MissingTable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse table {path}: {source}")]
    MalformedTable {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type CoreResult<T> = Result<T, CoreError>;
