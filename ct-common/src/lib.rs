//! Shared primitives for confidential transfers.
//!
//! Everything here is pure and deterministic: BN254 scalar-field helpers, the
//! Poseidon hash, Baby Jubjub arithmetic, the account/payload data model, the
//! public-signal layout of every circuit, and the pending-queue removal rule.
//! Both the client tooling (`ct-sdk`) and the reference ledger (`ct-ledger`)
//! build on this crate so they agree bit-for-bit on what a proof binds.
//!
//! # Encryption model
//!
//! ```text
//! otk        = Poseidon(key, nonce, chainId, contractAddress)
//! eAmount    = amount + Poseidon(otk, nonce)
//! commitment = Poseidon(amount, otk)
//! ```

pub mod babyjub;
pub mod circuit;
pub mod error;
pub mod field;
pub mod ledger_api;
pub mod params;
pub mod poseidon;
pub mod queue;
pub mod types;

pub use babyjub::{Point, BASE8, SUB_ORDER};
pub use circuit::{
    CircuitId, Operation, PublicInputs, StateAnchor, DEFAULT_MAX_PENDING_TRANSFERS,
    DEFAULT_MAX_PENDING_TRANSFERS_APPLY, PROOF_LEN,
};
pub use error::{Error, Result};
pub use field::{
    fr_from_bytes, fr_from_decimal, fr_to_bytes, fr_to_decimal, fr_to_u128, fr_to_u64,
    reduce_be_bytes_to_fr,
};
pub use halo2curves_axiom::bn256::Fr;
pub use ledger_api::{LedgerReader, ReadError};
pub use params::{
    ApplyAndTransferParams, ApplyParams, BridgeParams, ClaimParams, InitParams, ProofOutput,
    TransferParams, UpdateParams, ZkArtifacts,
};
pub use poseidon::{poseidon, poseidon_hash};
pub use queue::{select_ascending, swap_remove_descending, validate_indexes};
pub use types::{
    Account, Address, AuditReport, EncryptedState, FailedTransfer, LedgerEvent, Payload,
    PendingTransfer, Target,
};
