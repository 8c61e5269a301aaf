//! Native evaluation of the six circuit relations.
//!
//! [`SimulatedProver`] checks the same constraints a witness generator would
//! (old state opens its commitment, no underflow, selected pending transfers
//! open theirs) and computes the outputs the circuit would expose. Proofs
//! come from [`seal`], so [`SimulatedVerifier`](crate::SimulatedVerifier)
//! accepts them exactly when the ledger rebuilds the same signals.

use ct_common::field::fr_to_u128;
use ct_common::{
    CircuitId, EncryptedState, Fr, Operation, Point, ProofOutput, PublicInputs, StateAnchor,
    Target, BASE8, PROOF_LEN,
};
use ct_sdk::inputs::{OldState, PendingSelection, TargetInputs, TransferLeg};
use ct_sdk::{
    derive_shared_key, encrypt_state, generate_commitment, generate_otk, CircuitInputs,
    ProofEngine, SdkError,
};
use halo2curves_axiom::ff::PrimeField;
use tracing::debug;

use crate::verifier::seal;

type Result<T> = ct_sdk::Result<T>;

#[derive(Clone, Debug)]
pub struct SimulatedProver {
    target: Target,
    proof_len: usize,
}

impl SimulatedProver {
    /// Prover for the deployment at `target`. Witnesses naming another
    /// target are rejected.
    pub fn new(target: Target) -> Self {
        Self {
            target,
            proof_len: PROOF_LEN,
        }
    }

    pub fn with_proof_len(mut self, proof_len: usize) -> Self {
        self.proof_len = proof_len;
        self
    }

    fn check_target(&self, circuit: CircuitId, inputs: &TargetInputs) -> Result<()> {
        if *inputs != TargetInputs::from(&self.target) {
            return Err(unsatisfied(circuit, "target does not match deployment"));
        }
        Ok(())
    }

    fn evaluate(&self, inputs: &CircuitInputs) -> Result<(PublicInputs, Vec<Fr>)> {
        let circuit = inputs.circuit();
        let target = self.target;
        match inputs {
            CircuitInputs::Init(w) => {
                self.check_target(circuit, &w.target)?;
                let public_point = BASE8.mul_scalar(&w.c_private_key)?;
                let state = encrypt_state(&w.c_private_key, 0, &Fr::zero(), &target);
                Ok((
                    PublicInputs::Init { target },
                    vec![
                        state.commitment,
                        state.e_amount,
                        public_point.x,
                        public_point.y,
                    ],
                ))
            }
            CircuitInputs::Update(w) => {
                self.check_target(circuit, &w.target)?;
                let old = open_old(circuit, &w.c_private_key, &w.old, &target)?;
                let amount = to_amount(circuit, &w.amount)?;
                let (operation, new) = if w.operation == Fr::zero() {
                    (Operation::Deposit, old.checked_add(amount))
                } else if w.operation == Fr::one() {
                    (Operation::Withdraw, old.checked_sub(amount))
                } else {
                    return Err(unsatisfied(circuit, "operation is neither 0 nor 1"));
                };
                let new = new.ok_or_else(|| unsatisfied(circuit, "balance out of range"))?;
                let state = own_state(&w.c_private_key, &w.old, new, &target);
                Ok((
                    PublicInputs::Update {
                        old: anchor(&w.old),
                        operation,
                        amount,
                        target,
                        public_point: BASE8.mul_scalar(&w.c_private_key)?,
                    },
                    vec![state.commitment, state.e_amount],
                ))
            }
            CircuitInputs::Transfer(w) => {
                self.check_target(circuit, &w.target)?;
                let old = open_old(circuit, &w.c_private_key, &w.old, &target)?;
                let (recipient_point, sent) = open_leg(circuit, &w.transfer)?;
                let new = old
                    .checked_sub(sent)
                    .ok_or_else(|| unsatisfied(circuit, "transfer exceeds balance"))?;
                let state = own_state(&w.c_private_key, &w.old, new, &target);
                let payload =
                    transfer_payload(&w.c_private_key, &recipient_point, &state, sent, &target)?;
                Ok((
                    PublicInputs::Transfer {
                        old: anchor(&w.old),
                        target,
                        public_point: BASE8.mul_scalar(&w.c_private_key)?,
                        recipient_point,
                    },
                    vec![
                        state.commitment,
                        state.e_amount,
                        payload.commitment,
                        payload.e_amount,
                    ],
                ))
            }
            CircuitInputs::Apply(w) => {
                self.check_target(circuit, &w.target)?;
                let old = open_old(circuit, &w.c_private_key, &w.old, &target)?;
                let received = open_selection(circuit, &w.selection)?;
                let new = old
                    .checked_add(received)
                    .ok_or_else(|| unsatisfied(circuit, "balance out of range"))?;
                let state = own_state(&w.c_private_key, &w.old, new, &target);
                Ok((
                    PublicInputs::Apply {
                        old: anchor(&w.old),
                        pending_commitments: w.selection.selected_commitments().to_vec(),
                        max_apply: w.selection.pending_transfers_commitments.len(),
                        target,
                        public_point: BASE8.mul_scalar(&w.c_private_key)?,
                    },
                    vec![state.commitment, state.e_amount],
                ))
            }
            CircuitInputs::ApplyAndTransfer(w) => {
                self.check_target(circuit, &w.target)?;
                let old = open_old(circuit, &w.c_private_key, &w.old, &target)?;
                let received = open_selection(circuit, &w.selection)?;
                let (recipient_point, sent) = open_leg(circuit, &w.transfer)?;
                let new = old
                    .checked_add(received)
                    .and_then(|total| total.checked_sub(sent))
                    .ok_or_else(|| unsatisfied(circuit, "transfer exceeds balance"))?;
                let state = own_state(&w.c_private_key, &w.old, new, &target);
                let payload =
                    transfer_payload(&w.c_private_key, &recipient_point, &state, sent, &target)?;
                Ok((
                    PublicInputs::ApplyAndTransfer {
                        old: anchor(&w.old),
                        pending_commitments: w.selection.selected_commitments().to_vec(),
                        max_apply: w.selection.pending_transfers_commitments.len(),
                        target,
                        public_point: BASE8.mul_scalar(&w.c_private_key)?,
                        recipient_point,
                    },
                    vec![
                        state.commitment,
                        state.e_amount,
                        payload.commitment,
                        payload.e_amount,
                    ],
                ))
            }
            CircuitInputs::Claim(w) => {
                self.check_target(circuit, &w.target)?;
                let old = open_old(circuit, &w.c_private_key, &w.old, &target)?;
                let recipient_point = Point {
                    x: w.recipient_public_key_x,
                    y: w.recipient_public_key_y,
                };
                let shared =
                    derive_shared_key(&w.c_private_key_used_in_transfer, &recipient_point)?;
                let otk = generate_otk(&shared, w.pending_transfer_nonce, &target);
                if generate_commitment(&w.pending_transfer_amount, &otk)
                    != w.pending_transfer_commitment
                {
                    return Err(unsatisfied(circuit, "pending transfer does not open"));
                }
                let reclaimed = to_amount(circuit, &w.pending_transfer_amount)?;
                let new = old
                    .checked_add(reclaimed)
                    .ok_or_else(|| unsatisfied(circuit, "balance out of range"))?;
                let state = own_state(&w.c_private_key, &w.old, new, &target);
                Ok((
                    PublicInputs::Claim {
                        old: anchor(&w.old),
                        // Only nonce and commitment are public.
                        pending: EncryptedState::new(
                            w.pending_transfer_nonce,
                            w.pending_transfer_commitment,
                            Fr::zero(),
                        ),
                        recipient_point,
                        target,
                        public_point: BASE8.mul_scalar(&w.c_private_key)?,
                    },
                    vec![state.commitment, state.e_amount],
                ))
            }
        }
    }
}

impl ProofEngine for SimulatedProver {
    fn prove(&self, circuit: CircuitId, inputs: &CircuitInputs) -> Result<ProofOutput> {
        if inputs.circuit() != circuit {
            return Err(unsatisfied(circuit, "inputs belong to another circuit"));
        }
        let (public, outputs) = self.evaluate(inputs)?;
        let public_signals = public.signals(&outputs)?;
        debug!(circuit = circuit.name(), "simulated proof sealed");
        Ok(ProofOutput {
            proof: seal(circuit, &public_signals, self.proof_len),
            public_signals,
        })
    }
}

fn unsatisfied(circuit: CircuitId, reason: &str) -> SdkError {
    SdkError::Prover(format!("{} witness unsatisfied: {reason}", circuit.name()))
}

fn to_amount(circuit: CircuitId, value: &Fr) -> Result<u128> {
    fr_to_u128(value).map_err(|_| unsatisfied(circuit, "amount exceeds 128 bits"))
}

fn anchor(old: &OldState) -> StateAnchor {
    StateAnchor {
        commitment: old.old_commitment,
        nonce: old.old_nonce,
    }
}

fn open_old(circuit: CircuitId, private: &Fr, old: &OldState, target: &Target) -> Result<u128> {
    let otk = generate_otk(private, old.old_nonce, target);
    if generate_commitment(&old.old_amount, &otk) != old.old_commitment {
        return Err(unsatisfied(circuit, "old state does not open its commitment"));
    }
    to_amount(circuit, &old.old_amount)
}

fn own_state(private: &Fr, old: &OldState, amount: u128, target: &Target) -> EncryptedState {
    encrypt_state(private, old.old_nonce + 1, &Fr::from_u128(amount), target)
}

fn open_leg(circuit: CircuitId, leg: &TransferLeg) -> Result<(Point, u128)> {
    let recipient = leg.recipient_point();
    if !recipient.is_on_curve() {
        return Err(unsatisfied(circuit, "recipient key is not on the curve"));
    }
    Ok((recipient, to_amount(circuit, &leg.transfer_amount)?))
}

fn transfer_payload(
    private: &Fr,
    recipient: &Point,
    state: &EncryptedState,
    amount: u128,
    target: &Target,
) -> Result<EncryptedState> {
    let shared = derive_shared_key(private, recipient)?;
    Ok(encrypt_state(&shared, state.nonce, &Fr::from_u128(amount), target))
}

fn open_selection(circuit: CircuitId, selection: &PendingSelection) -> Result<u128> {
    let n = selection.n as usize;
    if n > selection.pending_transfers_commitments.len()
        || selection.pending_transfers_amounts.len() != selection.pending_transfers_commitments.len()
        || selection.pending_transfers_otks.len() != selection.pending_transfers_commitments.len()
    {
        return Err(unsatisfied(circuit, "malformed pending selection"));
    }
    let mut total = 0u128;
    for i in 0..n {
        let amount = &selection.pending_transfers_amounts[i];
        if generate_commitment(amount, &selection.pending_transfers_otks[i])
            != selection.pending_transfers_commitments[i]
        {
            return Err(unsatisfied(circuit, "pending transfer does not open"));
        }
        total = total
            .checked_add(to_amount(circuit, amount)?)
            .ok_or_else(|| unsatisfied(circuit, "balance out of range"))?;
    }
    Ok(total)
}
