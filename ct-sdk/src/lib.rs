//! Client tooling for confidential transfers.
//!
//! - [`keys`]: account key pairs and ECDH
//! - [`cipher`]: one-time keys, the additive stream cipher, commitments
//! - [`audit`]: audit reports and their verification
//! - [`inputs`]: circuit inputs for the six operations
//! - [`sdk`]: [`ConfidentialSdk`], which ties the above to a ledger reader
//!   and a [`ProofEngine`]
//!
//! A typical flow reads the caller's account, builds circuit inputs (which
//! decrypts and verifies the current balance), proves them, attaches audit
//! reports for every required auditor, and submits the parameters.

pub mod audit;
pub mod cipher;
pub mod config;
pub mod error;
pub mod inputs;
pub mod keys;
pub mod mirror;
pub mod prover;
pub mod sdk;

pub use audit::{
    create_state_audit_report, create_transfer_audit_report, decrypt_audit_report, AuditorKey,
};
pub use cipher::{
    cipher, decipher, decrypt_amount, decrypt_state, decrypt_verified, encrypt_state,
    generate_commitment, generate_otk,
};
pub use config::{ArtifactPaths, SdkOptions};
pub use error::{Result, SdkError};
pub use inputs::{
    CircuitApplyAndTransferInputs, CircuitApplyInputs, CircuitClaimInputs, CircuitInitInputs,
    CircuitInputs, CircuitTransferInputs, CircuitUpdateInputs, OldState, PendingSelection,
    TargetInputs, TransferLeg,
};
pub use keys::{derive_keys, derive_keys_from_bytes, derive_shared_key, ConfidentialKeyPair};
pub use mirror::QueueMirror;
pub use ct_common::params::{
    ApplyAndTransferParams, ApplyParams, BridgeParams, ClaimParams, InitParams, ProofOutput,
    TransferParams, UpdateParams, ZkArtifacts,
};
pub use prover::ProofEngine;
pub use sdk::ConfidentialSdk;
