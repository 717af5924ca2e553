//! Error type definitions.
//!
//! Classified errors for the resolver subsystem. Nothing here is allowed to
//! escape as a program-terminating failure: persistence errors degrade to
//! "retry on the next flush" and lookup failures are classified into the
//! [`crate::lookup::Outcome`] taxonomy instead of being raised.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for durable-state reads and writes.
///
/// A failed write leaves the in-memory state authoritative; the dirty flag is
/// re-armed so the next flush cycle retries.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Filesystem error while reading, writing, or renaming a state file.
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file exists but does not parse.
    #[error("State file corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Error returned by the administrative flush operation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlushError {
    /// The supplied token did not match the current session token.
    #[error("Flush rejected: invalid session token")]
    InvalidToken,
}
