//! Reference ledger for confidential transfers.
//!
//! [`ConfidentialLedger`] holds initialized accounts, their pending queues,
//! required auditors, failed cross-chain transfers and the public token
//! side. Proof checking goes through the [`ProofVerifier`] seam.

pub mod config;
pub mod error;
pub mod handle;
pub mod ledger;
pub mod verifier;

pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError, Result};
pub use handle::LedgerHandle;
pub use ledger::{BridgeMessage, ConfidentialLedger};
pub use verifier::ProofVerifier;
