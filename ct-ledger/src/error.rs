//! Ledger rejections.
//!
//! Every rejection happens before any state is touched.

use ct_common::Address;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// How a caller should react to a rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Regenerate the proof with correct inputs.
    ProofRejected,
    /// Caller bug: fix the inputs.
    Shape,
    /// Stale local view: refresh state and retry.
    StatePrecondition,
    /// Attach the missing audit report and resubmit.
    Policy,
    /// Configuration or infrastructure problem.
    Internal,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ProofVerificationFailed: {0} proof rejected")]
    ProofVerificationFailed(&'static str),

    #[error("InvalidArrayLength: {field} has length {actual}, expected {expected}")]
    InvalidArrayLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("AccountNotInitialized: {0}")]
    AccountNotInitialized(Address),

    #[error("AccountAlreadyInitialized: {0}")]
    AccountAlreadyInitialized(Address),

    #[error("DuplicateIndex: {0}")]
    DuplicateIndex(usize),

    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("MaxPendingTransfersApplyExceeded: {count} > {max}")]
    MaxPendingTransfersApplyExceeded { count: usize, max: usize },

    #[error("MaxPendingTransfersReached: pending queue of {0} is full")]
    MaxPendingTransfersReached(Address),

    /// A required auditor has no report among the supplied ones.
    #[error("NotFound: required auditor {0} has no audit report")]
    RequiredAuditorNotFound(Address),

    #[error("NotFound: {0} is not a required auditor")]
    AuditorNotFound(Address),

    #[error("public balance of {account} is {available}, needs {needed}")]
    InsufficientPublicBalance {
        account: Address,
        needed: u128,
        available: u128,
    },

    #[error("confidential pool holds {available}, cannot release {needed}")]
    InsufficientLiquidity { needed: u128, available: u128 },

    #[error("confidential pool cannot hold more than u128::MAX")]
    PoolOverflow,

    #[error("public balance of {0} would exceed u128::MAX")]
    BalanceOverflow(Address),

    #[error("public key is not a point of the prime-order subgroup")]
    InvalidPublicKey,

    #[error(transparent)]
    Primitive(#[from] ct_common::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::ProofVerificationFailed(_) => ErrorKind::ProofRejected,
            LedgerError::InvalidArrayLength { .. }
            | LedgerError::MaxPendingTransfersApplyExceeded { .. }
            | LedgerError::InvalidPublicKey
            | LedgerError::Primitive(_) => ErrorKind::Shape,
            LedgerError::AccountNotInitialized(_)
            | LedgerError::AccountAlreadyInitialized(_)
            | LedgerError::DuplicateIndex(_)
            | LedgerError::IndexOutOfBounds { .. }
            | LedgerError::MaxPendingTransfersReached(_)
            | LedgerError::InsufficientPublicBalance { .. }
            | LedgerError::InsufficientLiquidity { .. }
            | LedgerError::PoolOverflow
            | LedgerError::BalanceOverflow(_) => ErrorKind::StatePrecondition,
            LedgerError::RequiredAuditorNotFound(_) | LedgerError::AuditorNotFound(_) => {
                ErrorKind::Policy
            }
            LedgerError::Config(_)
            | LedgerError::Unavailable(_)
            | LedgerError::Io(_)
            | LedgerError::Json(_) => ErrorKind::Internal,
        }
    }
}

/// Queue-index errors keep their own variants so callers can match on them.
pub(crate) fn from_index_error(err: ct_common::Error) -> LedgerError {
    match err {
        ct_common::Error::DuplicateIndex(index) => LedgerError::DuplicateIndex(index),
        ct_common::Error::IndexOutOfBounds { index, len } => {
            LedgerError::IndexOutOfBounds { index, len }
        }
        ct_common::Error::TooManyIndexes { count, max } => {
            LedgerError::MaxPendingTransfersApplyExceeded { count, max }
        }
        other => LedgerError::Primitive(other),
    }
}
