//! Circuit inputs (private and public witness) for each operation.
//!
//! Field elements serialize as base-10 strings under camelCase keys, so a
//! value of [`CircuitInputs`] can be written straight to an `input.json` for
//! an external witness generator.

use ct_common::field::{serde_decimal, serde_decimal_vec};
use ct_common::{
    validate_indexes, Account, CircuitId, EncryptedState, FailedTransfer, Fr, Operation,
    PendingTransfer, Point, Target,
};
use halo2curves_axiom::ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::cipher::{decrypt_verified, generate_otk};
use crate::error::{Result, SdkError};
use crate::keys::derive_shared_key;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInputs {
    #[serde(with = "serde_decimal")]
    pub chain_id: Fr,
    #[serde(with = "serde_decimal")]
    pub contract_address: Fr,
}

impl From<&Target> for TargetInputs {
    fn from(target: &Target) -> Self {
        Self {
            chain_id: target.chain_id_fr(),
            contract_address: target.contract_fr(),
        }
    }
}

/// The caller's current state, decrypted and checked against its commitment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OldState {
    #[serde(with = "serde_decimal")]
    pub old_amount: Fr,
    pub old_nonce: u64,
    #[serde(with = "serde_decimal")]
    pub old_commitment: Fr,
}

impl OldState {
    pub fn decrypt(private_scalar: &Fr, state: &EncryptedState, target: &Target) -> Result<Self> {
        Ok(Self {
            old_amount: decrypt_verified(private_scalar, state, target)?,
            old_nonce: state.nonce,
            old_commitment: state.commitment,
        })
    }
}

/// Selected pending transfers, in ascending queue-index order, zero-padded to
/// the per-call maximum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSelection {
    pub n: u64,
    #[serde(with = "serde_decimal_vec")]
    pub pending_transfers_amounts: Vec<Fr>,
    #[serde(rename = "pendingTransfersOTKs", with = "serde_decimal_vec")]
    pub pending_transfers_otks: Vec<Fr>,
    #[serde(with = "serde_decimal_vec")]
    pub pending_transfers_commitments: Vec<Fr>,
}

impl PendingSelection {
    /// Decrypt each selected transfer with `ECDH(private, senderPublic)`.
    /// `sender_points` is aligned with `selected`.
    pub fn assemble(
        private_scalar: &Fr,
        selected: &[&PendingTransfer],
        sender_points: &[Point],
        max_apply: usize,
        target: &Target,
    ) -> Result<Self> {
        if selected.len() > max_apply {
            return Err(SdkError::MaxPendingTransfersApplyExceeded {
                count: selected.len(),
                max: max_apply,
            });
        }
        if selected.len() != sender_points.len() {
            return Err(SdkError::SenderKeyCount {
                transfers: selected.len(),
                keys: sender_points.len(),
            });
        }
        let mut amounts = vec![Fr::zero(); max_apply];
        let mut otks = vec![Fr::zero(); max_apply];
        let mut commitments = vec![Fr::zero(); max_apply];

        for (i, (transfer, sender)) in selected.iter().zip(sender_points).enumerate() {
            let shared = derive_shared_key(private_scalar, sender)?;
            amounts[i] = decrypt_verified(&shared, &transfer.payload, target)?;
            otks[i] = generate_otk(&shared, transfer.payload.nonce, target);
            commitments[i] = transfer.payload.commitment;
        }

        Ok(Self {
            n: selected.len() as u64,
            pending_transfers_amounts: amounts,
            pending_transfers_otks: otks,
            pending_transfers_commitments: commitments,
        })
    }

    /// Commitments of the selected entries, without padding.
    pub fn selected_commitments(&self) -> &[Fr] {
        &self.pending_transfers_commitments[..self.n as usize]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLeg {
    #[serde(with = "serde_decimal")]
    pub transfer_amount: Fr,
    #[serde(with = "serde_decimal")]
    pub recipient_public_key_x: Fr,
    #[serde(with = "serde_decimal")]
    pub recipient_public_key_y: Fr,
}

impl TransferLeg {
    pub fn new(amount: u128, recipient: &Point) -> Self {
        Self {
            transfer_amount: Fr::from_u128(amount),
            recipient_public_key_x: recipient.x,
            recipient_public_key_y: recipient.y,
        }
    }

    pub fn recipient_point(&self) -> Point {
        Point {
            x: self.recipient_public_key_x,
            y: self.recipient_public_key_y,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInitInputs {
    #[serde(flatten)]
    pub target: TargetInputs,
    #[serde(with = "serde_decimal")]
    pub c_private_key: Fr,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitUpdateInputs {
    #[serde(flatten)]
    pub target: TargetInputs,
    #[serde(with = "serde_decimal")]
    pub c_private_key: Fr,
    #[serde(flatten)]
    pub old: OldState,
    /// 0 deposit, 1 withdraw.
    #[serde(with = "serde_decimal")]
    pub operation: Fr,
    #[serde(with = "serde_decimal")]
    pub amount: Fr,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitTransferInputs {
    #[serde(flatten)]
    pub target: TargetInputs,
    #[serde(with = "serde_decimal")]
    pub c_private_key: Fr,
    #[serde(flatten)]
    pub old: OldState,
    #[serde(flatten)]
    pub transfer: TransferLeg,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitApplyInputs {
    #[serde(flatten)]
    pub target: TargetInputs,
    #[serde(with = "serde_decimal")]
    pub c_private_key: Fr,
    #[serde(flatten)]
    pub old: OldState,
    #[serde(flatten)]
    pub selection: PendingSelection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitApplyAndTransferInputs {
    #[serde(flatten)]
    pub target: TargetInputs,
    #[serde(with = "serde_decimal")]
    pub c_private_key: Fr,
    #[serde(flatten)]
    pub old: OldState,
    #[serde(flatten)]
    pub selection: PendingSelection,
    #[serde(flatten)]
    pub transfer: TransferLeg,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitClaimInputs {
    #[serde(flatten)]
    pub target: TargetInputs,
    #[serde(with = "serde_decimal")]
    pub c_private_key: Fr,
    #[serde(flatten)]
    pub old: OldState,
    #[serde(with = "serde_decimal")]
    pub c_private_key_used_in_transfer: Fr,
    #[serde(with = "serde_decimal")]
    pub recipient_public_key_x: Fr,
    #[serde(with = "serde_decimal")]
    pub recipient_public_key_y: Fr,
    pub pending_transfer_nonce: u64,
    #[serde(with = "serde_decimal")]
    pub pending_transfer_amount: Fr,
    #[serde(with = "serde_decimal")]
    pub pending_transfer_commitment: Fr,
}

/// Inputs for any of the six circuits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CircuitInputs {
    Init(CircuitInitInputs),
    Update(CircuitUpdateInputs),
    Transfer(CircuitTransferInputs),
    Apply(CircuitApplyInputs),
    ApplyAndTransfer(CircuitApplyAndTransferInputs),
    Claim(CircuitClaimInputs),
}

impl CircuitInputs {
    pub fn circuit(&self) -> CircuitId {
        match self {
            CircuitInputs::Init(_) => CircuitId::Init,
            CircuitInputs::Update(_) => CircuitId::Update,
            CircuitInputs::Transfer(_) => CircuitId::Transfer,
            CircuitInputs::Apply(_) => CircuitId::Apply,
            CircuitInputs::ApplyAndTransfer(_) => CircuitId::ApplyAndTransfer,
            CircuitInputs::Claim(_) => CircuitId::Claim,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn init_inputs(private_scalar: &Fr, target: &Target) -> CircuitInitInputs {
    CircuitInitInputs {
        target: target.into(),
        c_private_key: *private_scalar,
    }
}

pub fn update_inputs(
    private_scalar: &Fr,
    account: &Account,
    operation: Operation,
    amount: u128,
    target: &Target,
) -> Result<CircuitUpdateInputs> {
    Ok(CircuitUpdateInputs {
        target: target.into(),
        c_private_key: *private_scalar,
        old: OldState::decrypt(private_scalar, &account.state, target)?,
        operation: operation.to_fr(),
        amount: Fr::from_u128(amount),
    })
}

pub fn transfer_inputs(
    private_scalar: &Fr,
    account: &Account,
    recipient: &Point,
    amount: u128,
    target: &Target,
) -> Result<CircuitTransferInputs> {
    Ok(CircuitTransferInputs {
        target: target.into(),
        c_private_key: *private_scalar,
        old: OldState::decrypt(private_scalar, &account.state, target)?,
        transfer: TransferLeg::new(amount, recipient),
    })
}

/// Check an Apply index set before any decryption or proving happens.
pub fn check_apply_indexes(indexes: &[usize], queue_len: usize, max_apply: usize) -> Result<()> {
    if indexes.len() > max_apply {
        return Err(SdkError::MaxPendingTransfersApplyExceeded {
            count: indexes.len(),
            max: max_apply,
        });
    }
    validate_indexes(indexes, queue_len, max_apply)?;
    Ok(())
}

pub fn apply_inputs(
    private_scalar: &Fr,
    account: &Account,
    selection: PendingSelection,
    target: &Target,
) -> Result<CircuitApplyInputs> {
    Ok(CircuitApplyInputs {
        target: target.into(),
        c_private_key: *private_scalar,
        old: OldState::decrypt(private_scalar, &account.state, target)?,
        selection,
    })
}

pub fn apply_and_transfer_inputs(
    private_scalar: &Fr,
    account: &Account,
    selection: PendingSelection,
    recipient: &Point,
    amount: u128,
    target: &Target,
) -> Result<CircuitApplyAndTransferInputs> {
    Ok(CircuitApplyAndTransferInputs {
        target: target.into(),
        c_private_key: *private_scalar,
        old: OldState::decrypt(private_scalar, &account.state, target)?,
        selection,
        transfer: TransferLeg::new(amount, recipient),
    })
}

/// `key_used_in_transfer` is the private scalar the sender held when the
/// failed transfer was created.
pub fn claim_inputs(
    private_scalar: &Fr,
    key_used_in_transfer: &Fr,
    account: &Account,
    failed: &FailedTransfer,
    target: &Target,
) -> Result<CircuitClaimInputs> {
    let shared = derive_shared_key(key_used_in_transfer, &failed.recipient_public_point)?;
    let payload = &failed.pending_transfer.payload;
    Ok(CircuitClaimInputs {
        target: target.into(),
        c_private_key: *private_scalar,
        old: OldState::decrypt(private_scalar, &account.state, target)?,
        c_private_key_used_in_transfer: *key_used_in_transfer,
        recipient_public_key_x: failed.recipient_public_point.x,
        recipient_public_key_y: failed.recipient_public_point.y,
        pending_transfer_nonce: payload.nonce,
        pending_transfer_amount: decrypt_verified(&shared, payload, target)?,
        pending_transfer_commitment: payload.commitment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::encrypt_state;
    use crate::keys::derive_keys;
    use ct_common::Address;

    fn target() -> Target {
        Target::new(31337, Address([0x22; 20]))
    }

    fn account_with_balance(private: &Fr, nonce: u64, amount: u64) -> Account {
        Account {
            public_point: ct_common::BASE8.mul_scalar(private).unwrap(),
            state: encrypt_state(private, nonce, &Fr::from(amount), &target()),
            pending_transfers: Vec::new(),
            audit_reports: Vec::new(),
            required_auditors: Vec::new(),
        }
    }

    #[test]
    fn update_inputs_carry_decrypted_old_state() {
        let keys = derive_keys(&Fr::from(10u64)).unwrap();
        let account = account_with_balance(&keys.private_scalar, 1, 100);
        let inputs =
            update_inputs(&keys.private_scalar, &account, Operation::Withdraw, 10, &target())
                .unwrap();
        assert_eq!(inputs.old.old_amount, Fr::from(100u64));
        assert_eq!(inputs.old.old_nonce, 1);
        assert_eq!(inputs.old.old_commitment, account.state.commitment);
        assert_eq!(inputs.operation, Fr::one());
    }

    #[test]
    fn wrong_key_is_caught_before_proving() {
        let keys = derive_keys(&Fr::from(10u64)).unwrap();
        let other = derive_keys(&Fr::from(11u64)).unwrap();
        let account = account_with_balance(&keys.private_scalar, 1, 100);
        assert!(matches!(
            update_inputs(&other.private_scalar, &account, Operation::Deposit, 1, &target()),
            Err(SdkError::CommitmentMismatch)
        ));
    }

    #[test]
    fn apply_index_checks() {
        assert!(matches!(
            check_apply_indexes(&[0; 11], 20, 10),
            Err(SdkError::MaxPendingTransfersApplyExceeded { count: 11, max: 10 })
        ));
        assert!(matches!(
            check_apply_indexes(&[0, 0], 2, 10),
            Err(SdkError::Primitive(ct_common::Error::DuplicateIndex(0)))
        ));
        assert!(matches!(
            check_apply_indexes(&[2], 2, 10),
            Err(SdkError::Primitive(ct_common::Error::IndexOutOfBounds { index: 2, len: 2 }))
        ));
        assert!(check_apply_indexes(&[1, 0], 2, 10).is_ok());
    }

    #[test]
    fn selection_is_padded_and_decrypted() {
        let sender = derive_keys(&Fr::from(1u64)).unwrap();
        let recipient = derive_keys(&Fr::from(2u64)).unwrap();
        let shared = derive_shared_key(&sender.private_scalar, &recipient.public_point).unwrap();
        let transfer = PendingTransfer {
            sender: Address([1; 20]),
            payload: encrypt_state(&shared, 1, &Fr::from(10u64), &target()),
            audit_reports: Vec::new(),
        };

        let selection = PendingSelection::assemble(
            &recipient.private_scalar,
            &[&transfer],
            &[sender.public_point],
            4,
            &target(),
        )
        .unwrap();
        assert_eq!(selection.n, 1);
        assert_eq!(selection.pending_transfers_amounts[0], Fr::from(10u64));
        assert_eq!(selection.pending_transfers_amounts[1..], [Fr::zero(); 3]);
        assert_eq!(selection.selected_commitments(), &[transfer.payload.commitment]);
        assert_eq!(
            selection.pending_transfers_otks[0],
            generate_otk(&shared, 1, &target())
        );
    }

    #[test]
    fn selection_requires_one_key_per_transfer() {
        let sender = derive_keys(&Fr::from(1u64)).unwrap();
        let recipient = derive_keys(&Fr::from(2u64)).unwrap();
        let shared = derive_shared_key(&sender.private_scalar, &recipient.public_point).unwrap();
        let transfer = PendingTransfer {
            sender: Address([1; 20]),
            payload: encrypt_state(&shared, 1, &Fr::from(10u64), &target()),
            audit_reports: Vec::new(),
        };

        let missing = PendingSelection::assemble(
            &recipient.private_scalar,
            &[&transfer, &transfer],
            &[sender.public_point],
            4,
            &target(),
        );
        assert!(matches!(
            missing,
            Err(SdkError::SenderKeyCount { transfers: 2, keys: 1 })
        ));

        let surplus = PendingSelection::assemble(
            &recipient.private_scalar,
            &[],
            &[sender.public_point],
            4,
            &target(),
        );
        assert!(matches!(
            surplus,
            Err(SdkError::SenderKeyCount { transfers: 0, keys: 1 })
        ));
    }

    #[test]
    fn witness_json_uses_decimal_camel_case() {
        let keys = derive_keys(&Fr::from(10u64)).unwrap();
        let inputs = CircuitInputs::Init(init_inputs(&keys.private_scalar, &target()));
        let json: serde_json::Value = serde_json::from_str(&inputs.to_json().unwrap()).unwrap();
        assert_eq!(json["chainId"], "31337");
        assert!(json["cPrivateKey"].as_str().unwrap().chars().all(|c| c.is_ascii_digit()));
        assert_eq!(inputs.circuit(), CircuitId::Init);
    }

    #[test]
    fn apply_witness_keeps_otk_spelling() {
        let keys = derive_keys(&Fr::from(10u64)).unwrap();
        let account = account_with_balance(&keys.private_scalar, 0, 0);
        let selection =
            PendingSelection::assemble(&keys.private_scalar, &[], &[], 10, &target()).unwrap();
        let inputs = apply_inputs(&keys.private_scalar, &account, selection, &target()).unwrap();
        let json = serde_json::to_value(&inputs).unwrap();
        assert_eq!(json["pendingTransfersOTKs"].as_array().unwrap().len(), 10);
        assert_eq!(json["n"], 0);
        assert_eq!(json["oldNonce"], 0);
    }
}
