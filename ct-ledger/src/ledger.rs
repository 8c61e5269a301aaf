//! Reference ledger.
//!
//! Each operation runs its checks in a fixed order (account existence,
//! artifact shape, required auditors, queue preconditions, proof
//! verification) and only then mutates state. Public signals are rebuilt
//! from the ledger's own view, so a proof made against a stale nonce or
//! commitment does not verify.

use std::collections::HashMap;

use ct_common::{
    select_ascending, swap_remove_descending, validate_indexes, Account, Address,
    ApplyAndTransferParams, ApplyParams, AuditReport, BridgeParams, CircuitId, ClaimParams,
    EncryptedState, FailedTransfer, Fr, InitParams, LedgerEvent, Operation, PendingTransfer, Point,
    PublicInputs, StateAnchor, Target, TransferParams, UpdateParams, ZkArtifacts,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::{from_index_error, LedgerError, Result};
use crate::verifier::ProofVerifier;

/// Cross-chain message produced by [`ConfidentialLedger::bridge`] and consumed
/// by [`ConfidentialLedger::receive_bridge`] on the destination ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeMessage {
    pub sender: Address,
    pub recipient: Address,
    /// Key the sender encrypted for; delivery requires the recipient's
    /// registered key to match.
    pub recipient_public_point: Point,
    pub pending_transfer: PendingTransfer,
    #[serde(default)]
    pub extra_data: Vec<u8>,
}

pub struct ConfidentialLedger<V> {
    config: LedgerConfig,
    verifier: V,
    accounts: HashMap<Address, Account>,
    failed_transfers: HashMap<Address, Vec<FailedTransfer>>,
    public_balances: HashMap<Address, u128>,
    pool: u128,
    events: Vec<LedgerEvent>,
}

impl<V: ProofVerifier> ConfidentialLedger<V> {
    pub fn new(config: LedgerConfig, verifier: V) -> Self {
        Self {
            config,
            verifier,
            accounts: HashMap::new(),
            failed_transfers: HashMap::new(),
            public_balances: HashMap::new(),
            pool: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn target(&self) -> Target {
        self.config.target
    }

    /// Credit public tokens. Fails without crediting anything when the
    /// balance would exceed `u128::MAX`.
    pub fn mint(&mut self, to: Address, amount: u128) -> Result<()> {
        let balance = self.public_balances.entry(to).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(to))?;
        Ok(())
    }

    pub fn balance_of(&self, address: &Address) -> u128 {
        self.public_balances.get(address).copied().unwrap_or_default()
    }

    /// Public tokens held on behalf of all confidential balances.
    pub fn pool_balance(&self) -> u128 {
        self.pool
    }

    pub fn get_account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn get_c_public_keys(&self, addresses: &[Address]) -> Vec<Option<Point>> {
        addresses
            .iter()
            .map(|a| self.accounts.get(a).map(|acc| acc.public_point))
            .collect()
    }

    pub fn get_failed_cross_chain_transfers(&self, address: &Address) -> &[FailedTransfer] {
        self.failed_transfers
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn c_init(&mut self, caller: &Address, params: &InitParams) -> Result<()> {
        let result = self.try_init(caller, params);
        logged("cInit", caller, result)
    }

    pub fn c_deposit(&mut self, caller: &Address, params: &UpdateParams) -> Result<()> {
        let result = self.try_update(caller, params, Operation::Deposit);
        logged("cDeposit", caller, result)
    }

    pub fn c_withdraw(&mut self, caller: &Address, params: &UpdateParams) -> Result<()> {
        let result = self.try_update(caller, params, Operation::Withdraw);
        logged("cWithdraw", caller, result)
    }

    pub fn c_transfer(&mut self, caller: &Address, params: &TransferParams) -> Result<()> {
        let result = self.try_transfer(caller, params);
        logged("cTransfer", caller, result)
    }

    pub fn c_apply(&mut self, caller: &Address, params: &ApplyParams) -> Result<()> {
        let result = self.try_apply(caller, params);
        logged("cApply", caller, result)
    }

    pub fn c_apply_and_transfer(
        &mut self,
        caller: &Address,
        params: &ApplyAndTransferParams,
    ) -> Result<()> {
        let result = self.try_apply_and_transfer(caller, params);
        logged("cApplyAndTransfer", caller, result)
    }

    pub fn c_claim(&mut self, caller: &Address, params: &ClaimParams) -> Result<()> {
        let result = self.try_claim(caller, params);
        logged("cClaim", caller, result)
    }

    /// Send a confidential transfer to another ledger.
    pub fn bridge(&mut self, caller: &Address, params: &BridgeParams) -> Result<BridgeMessage> {
        let result = self.try_bridge(caller, params);
        logged("bridge", caller, result)
    }

    pub fn add_required_auditor(&mut self, caller: &Address, auditor: &Address) -> Result<()> {
        let result = self.try_add_required_auditor(caller, auditor);
        logged("addRequiredAuditor", caller, result)
    }

    pub fn remove_required_auditor(&mut self, caller: &Address, auditor: &Address) -> Result<()> {
        let result = self.try_remove_required_auditor(caller, auditor);
        logged("removeRequiredAuditor", caller, result)
    }

    /// Deliver an inbound cross-chain transfer. Returns `false` when it was
    /// recorded as failed under the sender instead: the recipient is unknown,
    /// its key differs from the one the sender encrypted for, or its queue
    /// is full.
    pub fn receive_bridge(&mut self, message: &BridgeMessage) -> bool {
        let max = self.config.max_pending_transfers;
        let delivered = match self.accounts.get_mut(&message.recipient) {
            Some(account)
                if account.public_point == message.recipient_public_point
                    && account.pending_transfers.len() < max =>
            {
                account
                    .pending_transfers
                    .push(message.pending_transfer.clone());
                true
            }
            _ => {
                self.failed_transfers
                    .entry(message.pending_transfer.sender)
                    .or_default()
                    .push(FailedTransfer {
                        recipient_public_point: message.recipient_public_point,
                        pending_transfer: message.pending_transfer.clone(),
                    });
                false
            }
        };
        info!(
            recipient = %message.recipient,
            sender = %message.pending_transfer.sender,
            delivered,
            "bridge transfer received"
        );
        self.events.push(LedgerEvent::BridgeReceived {
            recipient: message.recipient,
            delivered,
            pending_transfer: message.pending_transfer.clone(),
        });
        delivered
    }

    fn try_init(&mut self, caller: &Address, params: &InitParams) -> Result<()> {
        if self.accounts.contains_key(caller) {
            return Err(LedgerError::AccountAlreadyInitialized(*caller));
        }
        self.check_artifacts(CircuitId::Init, &params.artifacts)?;
        self.verify(
            PublicInputs::Init {
                target: self.config.target,
            },
            &params.artifacts,
        )?;

        let outputs = &params.artifacts.outputs;
        let public_point =
            Point::new(outputs[2], outputs[3]).map_err(|_| LedgerError::InvalidPublicKey)?;
        if !public_point.in_subgroup() {
            return Err(LedgerError::InvalidPublicKey);
        }
        self.accounts.insert(
            *caller,
            Account {
                public_point,
                state: EncryptedState::new(0, outputs[0], outputs[1]),
                pending_transfers: Vec::new(),
                audit_reports: params.state_audit_reports.clone(),
                required_auditors: Vec::new(),
            },
        );
        self.events.push(LedgerEvent::Initialized {
            account: *caller,
            public_point,
        });
        Ok(())
    }

    fn try_update(
        &mut self,
        caller: &Address,
        params: &UpdateParams,
        operation: Operation,
    ) -> Result<()> {
        let account = self.initialized(caller)?;
        self.check_artifacts(CircuitId::Update, &params.artifacts)?;
        check_reports(&account.required_auditors, &params.state_audit_reports)?;

        let amount = params.amount;
        let available = self.balance_of(caller);
        let (public, pool) = match operation {
            Operation::Deposit => {
                if available < amount {
                    return Err(LedgerError::InsufficientPublicBalance {
                        account: *caller,
                        needed: amount,
                        available,
                    });
                }
                let pool = self
                    .pool
                    .checked_add(amount)
                    .ok_or(LedgerError::PoolOverflow)?;
                (available - amount, pool)
            }
            Operation::Withdraw => {
                if self.pool < amount {
                    return Err(LedgerError::InsufficientLiquidity {
                        needed: amount,
                        available: self.pool,
                    });
                }
                let public = available
                    .checked_add(amount)
                    .ok_or(LedgerError::BalanceOverflow(*caller))?;
                (public, self.pool - amount)
            }
        };

        self.verify(
            PublicInputs::Update {
                old: StateAnchor::from(&account.state),
                operation,
                amount,
                target: self.config.target,
                public_point: account.public_point,
            },
            &params.artifacts,
        )?;

        self.public_balances.insert(*caller, public);
        self.pool = pool;
        self.advance(caller, &params.artifacts, &params.state_audit_reports)?;
        self.events.push(match operation {
            Operation::Deposit => LedgerEvent::Deposited {
                account: *caller,
                amount,
            },
            Operation::Withdraw => LedgerEvent::Withdrawn {
                account: *caller,
                amount,
            },
        });
        Ok(())
    }

    fn try_transfer(&mut self, caller: &Address, params: &TransferParams) -> Result<()> {
        let sender = self.initialized(caller)?;
        let recipient = self.initialized(&params.recipient)?;
        self.check_artifacts(CircuitId::Transfer, &params.artifacts)?;
        check_reports(&sender.required_auditors, &params.state_audit_reports)?;
        check_reports(&sender.required_auditors, &params.transfer_audit_reports)?;
        check_reports(&recipient.required_auditors, &params.transfer_audit_reports)?;
        self.check_capacity(&params.recipient, 0)?;

        self.verify(
            PublicInputs::Transfer {
                old: StateAnchor::from(&sender.state),
                target: self.config.target,
                public_point: sender.public_point,
                recipient_point: recipient.public_point,
            },
            &params.artifacts,
        )?;

        let nonce = self.advance(caller, &params.artifacts, &params.state_audit_reports)?;
        self.deliver(
            caller,
            &params.recipient,
            nonce,
            &params.artifacts,
            &params.transfer_audit_reports,
            &params.extra_data,
        )
    }

    fn try_apply(&mut self, caller: &Address, params: &ApplyParams) -> Result<()> {
        let account = self.initialized(caller)?;
        self.check_artifacts(CircuitId::Apply, &params.artifacts)?;
        check_reports(&account.required_auditors, &params.state_audit_reports)?;
        let pending_commitments =
            self.selected_commitments(account, &params.pending_transfers_indexes)?;

        self.verify(
            PublicInputs::Apply {
                old: StateAnchor::from(&account.state),
                pending_commitments,
                max_apply: self.config.max_pending_transfers_apply,
                target: self.config.target,
                public_point: account.public_point,
            },
            &params.artifacts,
        )?;

        self.consume(caller, &params.pending_transfers_indexes)?;
        self.advance(caller, &params.artifacts, &params.state_audit_reports)?;
        Ok(())
    }

    fn try_apply_and_transfer(
        &mut self,
        caller: &Address,
        params: &ApplyAndTransferParams,
    ) -> Result<()> {
        let sender = self.initialized(caller)?;
        let recipient = self.initialized(&params.recipient)?;
        self.check_artifacts(CircuitId::ApplyAndTransfer, &params.artifacts)?;
        check_reports(&sender.required_auditors, &params.state_audit_reports)?;
        check_reports(&sender.required_auditors, &params.transfer_audit_reports)?;
        check_reports(&recipient.required_auditors, &params.transfer_audit_reports)?;
        let pending_commitments =
            self.selected_commitments(sender, &params.pending_transfers_indexes)?;
        let freed = if params.recipient == *caller {
            params.pending_transfers_indexes.len()
        } else {
            0
        };
        self.check_capacity(&params.recipient, freed)?;

        self.verify(
            PublicInputs::ApplyAndTransfer {
                old: StateAnchor::from(&sender.state),
                pending_commitments,
                max_apply: self.config.max_pending_transfers_apply,
                target: self.config.target,
                public_point: sender.public_point,
                recipient_point: recipient.public_point,
            },
            &params.artifacts,
        )?;

        self.consume(caller, &params.pending_transfers_indexes)?;
        let nonce = self.advance(caller, &params.artifacts, &params.state_audit_reports)?;
        self.deliver(
            caller,
            &params.recipient,
            nonce,
            &params.artifacts,
            &params.transfer_audit_reports,
            &params.extra_data,
        )
    }

    fn try_claim(&mut self, caller: &Address, params: &ClaimParams) -> Result<()> {
        let account = self.initialized(caller)?;
        self.check_artifacts(CircuitId::Claim, &params.artifacts)?;
        check_reports(&account.required_auditors, &params.state_audit_reports)?;

        let failed = self.get_failed_cross_chain_transfers(caller);
        let entry = failed
            .get(params.index_to_claim)
            .ok_or(LedgerError::IndexOutOfBounds {
                index: params.index_to_claim,
                len: failed.len(),
            })?;

        self.verify(
            PublicInputs::Claim {
                old: StateAnchor::from(&account.state),
                pending: entry.pending_transfer.payload,
                recipient_point: entry.recipient_public_point,
                target: self.config.target,
                public_point: account.public_point,
            },
            &params.artifacts,
        )?;

        if let Some(list) = self.failed_transfers.get_mut(caller) {
            list.swap_remove(params.index_to_claim);
        }
        self.advance(caller, &params.artifacts, &params.state_audit_reports)?;
        self.events.push(LedgerEvent::FailedTransferClaimed {
            account: *caller,
            index: params.index_to_claim,
        });
        Ok(())
    }

    fn try_bridge(&mut self, caller: &Address, params: &BridgeParams) -> Result<BridgeMessage> {
        let transfer = &params.transfer;
        let sender = self.initialized(caller)?;
        self.check_artifacts(CircuitId::Transfer, &transfer.artifacts)?;
        check_reports(&sender.required_auditors, &transfer.state_audit_reports)?;
        check_reports(&sender.required_auditors, &transfer.transfer_audit_reports)?;
        if !params.recipient_public_point.is_on_curve() {
            return Err(LedgerError::InvalidPublicKey);
        }

        self.verify(
            PublicInputs::Transfer {
                old: StateAnchor::from(&sender.state),
                target: self.config.target,
                public_point: sender.public_point,
                recipient_point: params.recipient_public_point,
            },
            &transfer.artifacts,
        )?;

        let nonce = self.advance(caller, &transfer.artifacts, &transfer.state_audit_reports)?;
        let outputs = &transfer.artifacts.outputs;
        let message = BridgeMessage {
            sender: *caller,
            recipient: transfer.recipient,
            recipient_public_point: params.recipient_public_point,
            pending_transfer: PendingTransfer {
                sender: *caller,
                payload: EncryptedState::new(nonce, outputs[2], outputs[3]),
                audit_reports: transfer.transfer_audit_reports.clone(),
            },
            extra_data: transfer.extra_data.clone(),
        };
        self.events.push(LedgerEvent::BridgeSent {
            sender: *caller,
            recipient: message.recipient,
            recipient_public_point: message.recipient_public_point,
            pending_transfer: message.pending_transfer.clone(),
            extra_data: message.extra_data.clone(),
        });
        Ok(message)
    }

    fn try_add_required_auditor(&mut self, caller: &Address, auditor: &Address) -> Result<()> {
        self.initialized(caller)?;
        self.initialized(auditor)?;
        let account = self.account_mut(caller)?;
        if account.required_auditors.contains(auditor) {
            debug!(account = %caller, auditor = %auditor, "auditor already required");
            return Ok(());
        }
        account.required_auditors.push(*auditor);
        self.events.push(LedgerEvent::RequiredAuditorAdded {
            account: *caller,
            auditor: *auditor,
        });
        Ok(())
    }

    fn try_remove_required_auditor(&mut self, caller: &Address, auditor: &Address) -> Result<()> {
        let account = self.account_mut(caller)?;
        let position = account
            .required_auditors
            .iter()
            .position(|a| a == auditor)
            .ok_or(LedgerError::AuditorNotFound(*auditor))?;
        account.required_auditors.remove(position);
        self.events.push(LedgerEvent::RequiredAuditorRemoved {
            account: *caller,
            auditor: *auditor,
        });
        Ok(())
    }

    fn initialized(&self, address: &Address) -> Result<&Account> {
        self.accounts
            .get(address)
            .ok_or(LedgerError::AccountNotInitialized(*address))
    }

    fn account_mut(&mut self, address: &Address) -> Result<&mut Account> {
        self.accounts
            .get_mut(address)
            .ok_or(LedgerError::AccountNotInitialized(*address))
    }

    fn check_artifacts(&self, circuit: CircuitId, artifacts: &ZkArtifacts) -> Result<()> {
        if artifacts.proof.len() != self.config.proof_len {
            return Err(LedgerError::InvalidArrayLength {
                field: "proof",
                expected: self.config.proof_len,
                actual: artifacts.proof.len(),
            });
        }
        if artifacts.outputs.len() != circuit.output_arity() {
            return Err(LedgerError::InvalidArrayLength {
                field: "outputs",
                expected: circuit.output_arity(),
                actual: artifacts.outputs.len(),
            });
        }
        Ok(())
    }

    fn check_capacity(&self, recipient: &Address, freed: usize) -> Result<()> {
        let queued = self.initialized(recipient)?.pending_transfers.len();
        if queued.saturating_sub(freed) >= self.config.max_pending_transfers {
            return Err(LedgerError::MaxPendingTransfersReached(*recipient));
        }
        Ok(())
    }

    fn selected_commitments(&self, account: &Account, indexes: &[usize]) -> Result<Vec<Fr>> {
        validate_indexes(
            indexes,
            account.pending_transfers.len(),
            self.config.max_pending_transfers_apply,
        )
        .map_err(from_index_error)?;
        Ok(select_ascending(&account.pending_transfers, indexes)
            .map_err(from_index_error)?
            .into_iter()
            .map(|t| t.payload.commitment)
            .collect())
    }

    fn verify(&self, inputs: PublicInputs, artifacts: &ZkArtifacts) -> Result<()> {
        let circuit = inputs.circuit();
        let signals = inputs.signals(&artifacts.outputs)?;
        if !self.verifier.verify(circuit, &artifacts.proof, &signals) {
            return Err(LedgerError::ProofVerificationFailed(circuit.name()));
        }
        Ok(())
    }

    /// Move `caller` to the state in the proof outputs; returns the new nonce.
    fn advance(
        &mut self,
        caller: &Address,
        artifacts: &ZkArtifacts,
        reports: &[AuditReport],
    ) -> Result<u64> {
        let account = self.account_mut(caller)?;
        let nonce = account.state.nonce + 1;
        account.state = EncryptedState::new(nonce, artifacts.outputs[0], artifacts.outputs[1]);
        account.audit_reports = reports.to_vec();
        debug!(account = %caller, nonce, "state advanced");
        Ok(nonce)
    }

    fn consume(&mut self, caller: &Address, indexes: &[usize]) -> Result<()> {
        let account = self.account_mut(caller)?;
        swap_remove_descending(&mut account.pending_transfers, indexes)
            .map_err(from_index_error)?;
        self.events.push(LedgerEvent::Applied {
            account: *caller,
            indexes: indexes.to_vec(),
        });
        Ok(())
    }

    fn deliver(
        &mut self,
        sender: &Address,
        recipient: &Address,
        nonce: u64,
        artifacts: &ZkArtifacts,
        reports: &[AuditReport],
        extra_data: &[u8],
    ) -> Result<()> {
        let pending_transfer = PendingTransfer {
            sender: *sender,
            payload: EncryptedState::new(nonce, artifacts.outputs[2], artifacts.outputs[3]),
            audit_reports: reports.to_vec(),
        };
        self.account_mut(recipient)?
            .pending_transfers
            .push(pending_transfer.clone());
        self.events.push(LedgerEvent::Transferred {
            sender: *sender,
            recipient: *recipient,
            pending_transfer,
            extra_data: extra_data.to_vec(),
        });
        Ok(())
    }
}

/// Every required auditor must have a report among `reports`.
fn check_reports(required: &[Address], reports: &[AuditReport]) -> Result<()> {
    match required
        .iter()
        .find(|auditor| !reports.iter().any(|r| r.auditor == **auditor))
    {
        Some(missing) => Err(LedgerError::RequiredAuditorNotFound(*missing)),
        None => Ok(()),
    }
}

fn logged<T>(op: &'static str, caller: &Address, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => info!(op, account = %caller, "accepted"),
        Err(err) => warn!(op, account = %caller, error = %err, kind = ?err.kind(), "rejected"),
    }
    result
}
