//! Circuit identifiers and public-signal layouts.
//!
//! Every circuit exposes `outputs ++ inputs` as its public signals. Outputs
//! are the values the ledger stores (new commitment, new eAmount, and for the
//! transfer circuits the recipient payload). Inputs are values the ledger
//! already knows, so it rebuilds them from its own state when verifying. A
//! proof built against a stale nonce or commitment therefore fails.

use halo2curves_axiom::bn256::Fr;
use halo2curves_axiom::ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::babyjub::Point;
use crate::error::{Error, Result};
use crate::types::{EncryptedState, Target};

/// Number of field elements in every proof.
pub const PROOF_LEN: usize = 24;
/// Default bound on a recipient's pending queue.
pub const DEFAULT_MAX_PENDING_TRANSFERS: usize = 4;
/// Default bound on how many pending transfers one Apply may fold.
pub const DEFAULT_MAX_PENDING_TRANSFERS_APPLY: usize = 10;
/// Position of the public `amount` in the update circuit's signals.
pub const UPDATE_AMOUNT_SIGNAL: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CircuitId {
    Init,
    Update,
    Transfer,
    Apply,
    ApplyAndTransfer,
    Claim,
}

impl CircuitId {
    pub const ALL: [CircuitId; 6] = [
        CircuitId::Init,
        CircuitId::Update,
        CircuitId::Transfer,
        CircuitId::Apply,
        CircuitId::ApplyAndTransfer,
        CircuitId::Claim,
    ];

    /// Artifact name, as used in `{name}_js/{name}.wasm`.
    pub fn name(self) -> &'static str {
        match self {
            CircuitId::Init => "init",
            CircuitId::Update => "update",
            CircuitId::Transfer => "transfer",
            CircuitId::Apply => "apply",
            CircuitId::ApplyAndTransfer => "applyAndTransfer",
            CircuitId::Claim => "claim",
        }
    }

    /// Number of public outputs.
    pub fn output_arity(self) -> usize {
        match self {
            CircuitId::Init | CircuitId::Transfer | CircuitId::ApplyAndTransfer => 4,
            CircuitId::Update | CircuitId::Apply | CircuitId::Claim => 2,
        }
    }

    /// Field tag distinguishing circuits inside proof transcripts.
    pub fn tag(self) -> Fr {
        Fr::from(self as u64 + 1)
    }
}

/// Direction of an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Deposit = 0,
    Withdraw = 1,
}

impl Operation {
    pub fn to_fr(self) -> Fr {
        Fr::from(self as u64)
    }
}

/// The `(commitment, nonce)` pair a proof is pinned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateAnchor {
    pub commitment: Fr,
    pub nonce: u64,
}

impl From<&EncryptedState> for StateAnchor {
    fn from(state: &EncryptedState) -> Self {
        Self {
            commitment: state.commitment,
            nonce: state.nonce,
        }
    }
}

/// Ledger-known public inputs of each circuit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicInputs {
    Init {
        target: Target,
    },
    Update {
        old: StateAnchor,
        operation: Operation,
        amount: u128,
        target: Target,
        public_point: Point,
    },
    Transfer {
        old: StateAnchor,
        target: Target,
        public_point: Point,
        recipient_point: Point,
    },
    /// `pending_commitments` are the selected entries in ascending index
    /// order; they are zero-padded to `max_apply`.
    Apply {
        old: StateAnchor,
        pending_commitments: Vec<Fr>,
        max_apply: usize,
        target: Target,
        public_point: Point,
    },
    ApplyAndTransfer {
        old: StateAnchor,
        pending_commitments: Vec<Fr>,
        max_apply: usize,
        target: Target,
        public_point: Point,
        recipient_point: Point,
    },
    Claim {
        old: StateAnchor,
        pending: EncryptedState,
        recipient_point: Point,
        target: Target,
        public_point: Point,
    },
}

impl PublicInputs {
    pub fn circuit(&self) -> CircuitId {
        match self {
            PublicInputs::Init { .. } => CircuitId::Init,
            PublicInputs::Update { .. } => CircuitId::Update,
            PublicInputs::Transfer { .. } => CircuitId::Transfer,
            PublicInputs::Apply { .. } => CircuitId::Apply,
            PublicInputs::ApplyAndTransfer { .. } => CircuitId::ApplyAndTransfer,
            PublicInputs::Claim { .. } => CircuitId::Claim,
        }
    }

    /// Full public-signal vector: `outputs ++ inputs`.
    pub fn signals(&self, outputs: &[Fr]) -> Result<Vec<Fr>> {
        let circuit = self.circuit();
        if outputs.len() != circuit.output_arity() {
            return Err(Error::OutputArity {
                circuit: circuit.name(),
                expected: circuit.output_arity(),
                actual: outputs.len(),
            });
        }
        let mut signals = outputs.to_vec();
        signals.extend(self.inputs()?);
        Ok(signals)
    }

    fn inputs(&self) -> Result<Vec<Fr>> {
        let mut out = Vec::new();
        match self {
            PublicInputs::Init { target } => {
                push_target(&mut out, target);
            }
            PublicInputs::Update {
                old,
                operation,
                amount,
                target,
                public_point,
            } => {
                push_anchor(&mut out, old);
                out.push(operation.to_fr());
                out.push(Fr::from_u128(*amount));
                push_target(&mut out, target);
                push_point(&mut out, public_point);
            }
            PublicInputs::Transfer {
                old,
                target,
                public_point,
                recipient_point,
            } => {
                push_anchor(&mut out, old);
                push_target(&mut out, target);
                push_point(&mut out, public_point);
                push_point(&mut out, recipient_point);
            }
            PublicInputs::Apply {
                old,
                pending_commitments,
                max_apply,
                target,
                public_point,
            } => {
                push_anchor(&mut out, old);
                push_selection(&mut out, pending_commitments, *max_apply)?;
                push_target(&mut out, target);
                push_point(&mut out, public_point);
            }
            PublicInputs::ApplyAndTransfer {
                old,
                pending_commitments,
                max_apply,
                target,
                public_point,
                recipient_point,
            } => {
                push_anchor(&mut out, old);
                push_selection(&mut out, pending_commitments, *max_apply)?;
                push_target(&mut out, target);
                push_point(&mut out, public_point);
                push_point(&mut out, recipient_point);
            }
            PublicInputs::Claim {
                old,
                pending,
                recipient_point,
                target,
                public_point,
            } => {
                push_anchor(&mut out, old);
                out.push(Fr::from(pending.nonce));
                out.push(pending.commitment);
                push_point(&mut out, recipient_point);
                push_target(&mut out, target);
                push_point(&mut out, public_point);
            }
        }
        Ok(out)
    }
}

fn push_anchor(out: &mut Vec<Fr>, anchor: &StateAnchor) {
    out.push(anchor.commitment);
    out.push(Fr::from(anchor.nonce));
}

fn push_target(out: &mut Vec<Fr>, target: &Target) {
    out.push(target.chain_id_fr());
    out.push(target.contract_fr());
}

fn push_point(out: &mut Vec<Fr>, point: &Point) {
    out.push(point.x);
    out.push(point.y);
}

fn push_selection(out: &mut Vec<Fr>, commitments: &[Fr], max: usize) -> Result<()> {
    if commitments.len() > max {
        return Err(Error::TooManyIndexes {
            count: commitments.len(),
            max,
        });
    }
    out.push(Fr::from(commitments.len() as u64));
    out.extend_from_slice(commitments);
    out.resize(out.len() + (max - commitments.len()), Fr::zero());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::babyjub::BASE8;
    use crate::types::Address;

    fn target() -> Target {
        Target::new(31337, Address([7u8; 20]))
    }

    #[test]
    fn update_amount_sits_at_fixed_signal() {
        let inputs = PublicInputs::Update {
            old: StateAnchor {
                commitment: Fr::from(1u64),
                nonce: 1,
            },
            operation: Operation::Withdraw,
            amount: 10,
            target: target(),
            public_point: *BASE8,
        };
        let signals = inputs.signals(&[Fr::from(2u64), Fr::from(3u64)]).unwrap();
        assert_eq!(signals.len(), 10);
        assert_eq!(signals[UPDATE_AMOUNT_SIGNAL], Fr::from(10u64));
        assert_eq!(signals[4], Fr::one());
    }

    #[test]
    fn apply_selection_is_counted_and_padded() {
        let inputs = PublicInputs::Apply {
            old: StateAnchor {
                commitment: Fr::from(1u64),
                nonce: 4,
            },
            pending_commitments: vec![Fr::from(8u64), Fr::from(9u64)],
            max_apply: 10,
            target: target(),
            public_point: *BASE8,
        };
        let signals = inputs.signals(&[Fr::zero(), Fr::zero()]).unwrap();
        // 2 outputs, anchor, n, 10 commitments, target, key
        assert_eq!(signals.len(), 2 + 2 + 1 + 10 + 2 + 2);
        assert_eq!(signals[4], Fr::from(2u64));
        assert_eq!(signals[5], Fr::from(8u64));
        assert_eq!(signals[7], Fr::zero());
    }

    #[test]
    fn rejects_wrong_output_arity() {
        let inputs = PublicInputs::Init { target: target() };
        let err = inputs.signals(&[Fr::zero(); 2]).unwrap_err();
        assert_eq!(
            err,
            Error::OutputArity {
                circuit: "init",
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn rejects_oversized_selection() {
        let inputs = PublicInputs::Apply {
            old: StateAnchor {
                commitment: Fr::zero(),
                nonce: 0,
            },
            pending_commitments: vec![Fr::one(); 3],
            max_apply: 2,
            target: target(),
            public_point: *BASE8,
        };
        assert!(matches!(
            inputs.signals(&[Fr::zero(); 2]),
            Err(Error::TooManyIndexes { count: 3, max: 2 })
        ));
    }

    #[test]
    fn circuit_names_match_artifact_layout() {
        let names: Vec<_> = CircuitId::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            ["init", "update", "transfer", "apply", "applyAndTransfer", "claim"]
        );
    }
}
