//! Ledger parameter structures built from a proof.

use halo2curves_axiom::bn256::Fr;
use serde::{Deserialize, Serialize};

use crate::babyjub::Point;
use crate::circuit::{CircuitId, UPDATE_AMOUNT_SIGNAL};
use crate::error::{Error, Result};
use crate::field::{fr_to_u128, serde_decimal_vec, serde_hex_vec};
use crate::types::{Address, AuditReport};

/// Proof plus the full public-signal vector (`outputs ++ inputs`), as
/// returned by a proof engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOutput {
    #[serde(with = "serde_decimal_vec")]
    pub proof: Vec<Fr>,
    #[serde(rename = "pubSignals", with = "serde_decimal_vec")]
    pub public_signals: Vec<Fr>,
}

/// Proof and the leading `N` public outputs of `circuit`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkArtifacts {
    #[serde(with = "serde_hex_vec")]
    pub proof: Vec<Fr>,
    #[serde(with = "serde_hex_vec")]
    pub outputs: Vec<Fr>,
}

impl ZkArtifacts {
    pub fn from_output(circuit: CircuitId, output: &ProofOutput) -> Result<Self> {
        let arity = circuit.output_arity();
        if output.public_signals.len() < arity {
            return Err(Error::SignalCount {
                circuit: circuit.name(),
                expected: arity,
                actual: output.public_signals.len(),
            });
        }
        Ok(Self {
            proof: output.proof.clone(),
            outputs: output.public_signals[..arity].to_vec(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitParams {
    pub artifacts: ZkArtifacts,
    #[serde(default)]
    pub state_audit_reports: Vec<AuditReport>,
}

impl InitParams {
    pub fn from_proof(output: &ProofOutput, state_audit_reports: Vec<AuditReport>) -> Result<Self> {
        Ok(Self {
            artifacts: ZkArtifacts::from_output(CircuitId::Init, output)?,
            state_audit_reports,
        })
    }
}

/// Deposit or withdraw. `amount` is the public amount moved between the
/// public token balance and the confidential one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParams {
    pub amount: u128,
    pub artifacts: ZkArtifacts,
    #[serde(default)]
    pub state_audit_reports: Vec<AuditReport>,
}

impl UpdateParams {
    pub fn from_proof(output: &ProofOutput, state_audit_reports: Vec<AuditReport>) -> Result<Self> {
        let amount = output.public_signals.get(UPDATE_AMOUNT_SIGNAL).ok_or(
            Error::SignalCount {
                circuit: CircuitId::Update.name(),
                expected: UPDATE_AMOUNT_SIGNAL + 1,
                actual: output.public_signals.len(),
            },
        )?;
        Ok(Self {
            amount: fr_to_u128(amount)?,
            artifacts: ZkArtifacts::from_output(CircuitId::Update, output)?,
            state_audit_reports,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    pub recipient: Address,
    pub artifacts: ZkArtifacts,
    #[serde(default)]
    pub state_audit_reports: Vec<AuditReport>,
    #[serde(default)]
    pub transfer_audit_reports: Vec<AuditReport>,
    #[serde(default)]
    pub extra_data: Vec<u8>,
}

impl TransferParams {
    pub fn from_proof(
        recipient: Address,
        output: &ProofOutput,
        state_audit_reports: Vec<AuditReport>,
        transfer_audit_reports: Vec<AuditReport>,
        extra_data: Vec<u8>,
    ) -> Result<Self> {
        Ok(Self {
            recipient,
            artifacts: ZkArtifacts::from_output(CircuitId::Transfer, output)?,
            state_audit_reports,
            transfer_audit_reports,
            extra_data,
        })
    }
}

/// Outbound cross-chain transfer. The recipient key is stated by the sender
/// because the recipient account lives on the destination ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeParams {
    pub recipient_public_point: Point,
    #[serde(flatten)]
    pub transfer: TransferParams,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyParams {
    pub pending_transfers_indexes: Vec<usize>,
    pub artifacts: ZkArtifacts,
    #[serde(default)]
    pub state_audit_reports: Vec<AuditReport>,
}

impl ApplyParams {
    pub fn from_proof(
        pending_transfers_indexes: Vec<usize>,
        output: &ProofOutput,
        state_audit_reports: Vec<AuditReport>,
    ) -> Result<Self> {
        Ok(Self {
            pending_transfers_indexes,
            artifacts: ZkArtifacts::from_output(CircuitId::Apply, output)?,
            state_audit_reports,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyAndTransferParams {
    pub recipient: Address,
    pub pending_transfers_indexes: Vec<usize>,
    pub artifacts: ZkArtifacts,
    #[serde(default)]
    pub state_audit_reports: Vec<AuditReport>,
    #[serde(default)]
    pub transfer_audit_reports: Vec<AuditReport>,
    #[serde(default)]
    pub extra_data: Vec<u8>,
}

impl ApplyAndTransferParams {
    pub fn from_proof(
        recipient: Address,
        pending_transfers_indexes: Vec<usize>,
        output: &ProofOutput,
        state_audit_reports: Vec<AuditReport>,
        transfer_audit_reports: Vec<AuditReport>,
        extra_data: Vec<u8>,
    ) -> Result<Self> {
        Ok(Self {
            recipient,
            pending_transfers_indexes,
            artifacts: ZkArtifacts::from_output(CircuitId::ApplyAndTransfer, output)?,
            state_audit_reports,
            transfer_audit_reports,
            extra_data,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimParams {
    pub index_to_claim: usize,
    pub artifacts: ZkArtifacts,
    #[serde(default)]
    pub state_audit_reports: Vec<AuditReport>,
}

impl ClaimParams {
    pub fn from_proof(
        index_to_claim: usize,
        output: &ProofOutput,
        state_audit_reports: Vec<AuditReport>,
    ) -> Result<Self> {
        Ok(Self {
            index_to_claim,
            artifacts: ZkArtifacts::from_output(CircuitId::Claim, output)?,
            state_audit_reports,
        })
    }
}
