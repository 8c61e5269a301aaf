//! Audit reports: an OTK re-encrypted for a designated auditor.
//!
//! ```text
//! sharedKey = ECDH(creatorPrivate, auditorPublic)
//! eOTK      = cipher(sharedKey, nonce, otk)
//! ```
//!
//! The auditor reverses both layers with `ECDH(auditorPrivate, creatorPublic)`
//! and must see the payload commitment recomputed before trusting the amount.

use ct_common::{fr_to_u128, Address, AuditReport, Fr, Payload, Point, Target};

use crate::cipher::{cipher, decipher, generate_commitment, generate_otk};
use crate::error::{Result, SdkError};
use crate::keys::derive_shared_key;

/// Auditor address together with its registered public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuditorKey {
    pub address: Address,
    pub public_point: Point,
}

/// Reports for the caller's own state at `nonce`.
pub fn create_state_audit_report(
    private_scalar: &Fr,
    nonce: u64,
    target: &Target,
    auditors: &[AuditorKey],
) -> Result<Vec<AuditReport>> {
    let otk = generate_otk(private_scalar, nonce, target);
    create_audit_reports(private_scalar, &otk, nonce, auditors)
}

/// Reports for a transfer payload created at `nonce` for `recipient`.
pub fn create_transfer_audit_report(
    private_scalar: &Fr,
    nonce: u64,
    recipient: &Point,
    target: &Target,
    auditors: &[AuditorKey],
) -> Result<Vec<AuditReport>> {
    let shared = derive_shared_key(private_scalar, recipient)?;
    let otk = generate_otk(&shared, nonce, target);
    create_audit_reports(private_scalar, &otk, nonce, auditors)
}

fn create_audit_reports(
    private_scalar: &Fr,
    otk: &Fr,
    nonce: u64,
    auditors: &[AuditorKey],
) -> Result<Vec<AuditReport>> {
    auditors
        .iter()
        .map(|auditor| {
            let shared = derive_shared_key(private_scalar, &auditor.public_point)?;
            Ok(AuditReport {
                auditor: auditor.address,
                e_otk: cipher(&shared, nonce, otk),
            })
        })
        .collect()
}

/// Recover the amount of `payload` from an audit report created by
/// `counterparty`.
pub fn decrypt_audit_report(
    auditor_private: &Fr,
    counterparty: &Point,
    e_otk: &Fr,
    payload: &Payload,
) -> Result<u128> {
    let shared = derive_shared_key(auditor_private, counterparty)?;
    let otk = decipher(&shared, payload.nonce, e_otk);
    let amount = decipher(&otk, payload.nonce, &payload.e_amount);
    if generate_commitment(&amount, &otk) != payload.commitment {
        return Err(SdkError::CommitmentMismatch);
    }
    Ok(fr_to_u128(&amount)?)
}
