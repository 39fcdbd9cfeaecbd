//! Error types for the matching engine core
//!
//! Comprehensive error taxonomy using thiserror. Absence of data (empty book
//! side, no mid-price samples, no deviation threshold) is never an error.

use thiserror::Error;

/// Failure of a persistence collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("Failed to load {what}: {reason}")]
    Load { what: String, reason: String },

    #[error("Failed to persist {what}: {reason}")]
    Write { what: String, reason: String },
}

/// Wallet-operations validation failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("Insufficient balance for asset {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: String,
        available: String,
    },

    #[error("Invalid wallet operation: {reason}")]
    InvalidOperation { reason: String },
}

/// Failure while committing an execution context
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommitError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// Mid prices were staged for a pair the request carries no metadata for
    #[error("Mid prices staged for asset pair {asset_pair_id} without asset pair metadata")]
    UnknownAssetPair { asset_pair_id: String },
}

/// Invalid configuration value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Malformed config: {0}")]
    Malformed(String),
}
