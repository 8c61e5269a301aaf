//! Error types for client-side operations.

use ct_common::{Address, ReadError};
use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Primitive(#[from] ct_common::Error),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("account {0} is not initialized")]
    AccountNotInitialized(Address),

    /// No confidential public key is registered for the address.
    #[error("no public key registered for {0}")]
    MissingPublicKey(Address),

    /// Recomputed commitment differs from the stored one: wrong key, wrong
    /// counterparty, or tampered payload.
    #[error("Commitment payload does not match")]
    CommitmentMismatch,

    #[error("Max pending transfers apply is {max} (got {count})")]
    MaxPendingTransfersApplyExceeded { count: usize, max: usize },

    #[error("{transfers} pending transfers selected but {keys} sender keys supplied")]
    SenderKeyCount { transfers: usize, keys: usize },

    #[error("No failed cross-chain transfers found at index {0}")]
    NoFailedTransfer(usize),

    #[error("proof engine failed: {0}")]
    Prover(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
