//! Read side of the ledger, as consumed by clients.

use thiserror::Error;

use crate::babyjub::Point;
use crate::types::{Account, Address, FailedTransfer, Target};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Account and key lookups against a confidential ledger.
pub trait LedgerReader {
    /// Chain and contract the ledger is deployed as.
    fn target(&self) -> Target;

    /// `None` for accounts that were never initialized.
    fn get_account(&self, address: &Address) -> Result<Option<Account>, ReadError>;

    /// Batched public-key lookup, positionally aligned with `addresses`.
    fn get_public_keys(&self, addresses: &[Address]) -> Result<Vec<Option<Point>>, ReadError>;

    /// Failed cross-chain transfers recorded under `address` as sender.
    fn get_failed_cross_chain_transfers(
        &self,
        address: &Address,
    ) -> Result<Vec<FailedTransfer>, ReadError>;
}
