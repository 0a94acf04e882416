//! Error types for the AD sync crates.

use thiserror::Error;

/// Top-level error type for all directory sync operations.
///
/// Every variant is fatal to a run; there is no retryable/permanent split.
#[derive(Debug, Error)]
pub enum AdSyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to connect to AD server: {0}")]
    Connection(String),

    #[error("unable to bind to ldap: {0}")]
    Authentication(String),

    #[error("ldap search error: {0}")]
    Query(String),

    #[error("no results returned from ldap search: {0}")]
    EmptyResult(String),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("group {name} matched {count} entries, expected exactly one")]
    AmbiguousGroup { name: String, count: usize },

    #[error("ldap modify error: {0}")]
    Modification(String),
}

/// A convenience Result alias that defaults to [`AdSyncError`].
pub type Result<T> = std::result::Result<T, AdSyncError>;
