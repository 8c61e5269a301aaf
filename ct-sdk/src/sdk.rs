//! Ledger-aware client: reads current state, assembles circuit inputs, asks
//! the proof engine for a proof and packages the result as parameters.
//!
//! Required auditors are read from the ledger and always included in the
//! reports it generates, next to any extra auditors the caller names.

use ct_common::{
    select_ascending, Account, Address, ApplyAndTransferParams, ApplyParams, AuditReport,
    BridgeParams, ClaimParams, Fr, InitParams, LedgerReader, Operation, Payload, Point,
    ProofOutput, Target, TransferParams, UpdateParams,
};
use tracing::{debug, info};

use crate::audit::{self, AuditorKey};
use crate::cipher::decrypt_state;
use crate::config::SdkOptions;
use crate::error::{Result, SdkError};
use crate::inputs::{
    self, check_apply_indexes, CircuitApplyAndTransferInputs, CircuitApplyInputs,
    CircuitClaimInputs, CircuitInitInputs, CircuitInputs, CircuitTransferInputs,
    CircuitUpdateInputs, PendingSelection,
};
use crate::keys::ConfidentialKeyPair;
use crate::prover::ProofEngine;

pub struct ConfidentialSdk<R, P> {
    reader: R,
    prover: P,
    options: SdkOptions,
}

impl<R: LedgerReader, P: ProofEngine> ConfidentialSdk<R, P> {
    pub fn new(reader: R, prover: P, options: SdkOptions) -> Self {
        Self {
            reader,
            prover,
            options,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn options(&self) -> &SdkOptions {
        &self.options
    }

    pub fn target(&self) -> Target {
        self.reader.target()
    }

    pub fn account(&self, address: &Address) -> Result<Account> {
        self.reader
            .get_account(address)?
            .ok_or(SdkError::AccountNotInitialized(*address))
    }

    pub fn public_key(&self, address: &Address) -> Result<Point> {
        Ok(self.account(address)?.public_point)
    }

    pub fn auditor_keys(&self, addresses: &[Address]) -> Result<Vec<AuditorKey>> {
        let points = self.reader.get_public_keys(addresses)?;
        addresses
            .iter()
            .zip(points)
            .map(|(address, point)| {
                point
                    .map(|public_point| AuditorKey {
                        address: *address,
                        public_point,
                    })
                    .ok_or(SdkError::MissingPublicKey(*address))
            })
            .collect()
    }

    /// Decrypted confidential balance, checked against the stored commitment.
    pub fn c_balance_of(&self, address: &Address, private_scalar: &Fr) -> Result<u128> {
        let account = self.account(address)?;
        decrypt_state(private_scalar, &account.state, &self.target())
    }

    pub fn circuit_inputs_for_init(&self, private_scalar: &Fr) -> CircuitInitInputs {
        inputs::init_inputs(private_scalar, &self.target())
    }

    pub fn circuit_inputs_for_deposit(
        &self,
        address: &Address,
        private_scalar: &Fr,
        amount: u128,
    ) -> Result<CircuitUpdateInputs> {
        self.circuit_inputs_for_update(address, private_scalar, Operation::Deposit, amount)
    }

    pub fn circuit_inputs_for_withdraw(
        &self,
        address: &Address,
        private_scalar: &Fr,
        amount: u128,
    ) -> Result<CircuitUpdateInputs> {
        self.circuit_inputs_for_update(address, private_scalar, Operation::Withdraw, amount)
    }

    fn circuit_inputs_for_update(
        &self,
        address: &Address,
        private_scalar: &Fr,
        operation: Operation,
        amount: u128,
    ) -> Result<CircuitUpdateInputs> {
        let account = self.account(address)?;
        inputs::update_inputs(private_scalar, &account, operation, amount, &self.target())
    }

    pub fn circuit_inputs_for_transfer(
        &self,
        address: &Address,
        private_scalar: &Fr,
        to: &Address,
        amount: u128,
    ) -> Result<CircuitTransferInputs> {
        let account = self.account(address)?;
        let recipient = self.public_key(to)?;
        inputs::transfer_inputs(private_scalar, &account, &recipient, amount, &self.target())
    }

    pub fn circuit_inputs_for_apply(
        &self,
        address: &Address,
        private_scalar: &Fr,
        indexes: &[usize],
    ) -> Result<CircuitApplyInputs> {
        let account = self.account(address)?;
        self.apply_inputs_for(&account, private_scalar, indexes)
    }

    fn apply_inputs_for(
        &self,
        account: &Account,
        private_scalar: &Fr,
        indexes: &[usize],
    ) -> Result<CircuitApplyInputs> {
        let selection = self.pending_selection(account, private_scalar, indexes)?;
        inputs::apply_inputs(private_scalar, account, selection, &self.target())
    }

    pub fn circuit_inputs_for_apply_and_transfer(
        &self,
        address: &Address,
        private_scalar: &Fr,
        indexes: &[usize],
        to: &Address,
        amount: u128,
    ) -> Result<CircuitApplyAndTransferInputs> {
        let account = self.account(address)?;
        let recipient = self.public_key(to)?;
        self.apply_and_transfer_inputs_for(&account, private_scalar, indexes, &recipient, amount)
    }

    fn apply_and_transfer_inputs_for(
        &self,
        account: &Account,
        private_scalar: &Fr,
        indexes: &[usize],
        recipient: &Point,
        amount: u128,
    ) -> Result<CircuitApplyAndTransferInputs> {
        let selection = self.pending_selection(account, private_scalar, indexes)?;
        inputs::apply_and_transfer_inputs(
            private_scalar,
            account,
            selection,
            recipient,
            amount,
            &self.target(),
        )
    }

    /// `key_used_in_transfer` defaults to `private_scalar`.
    pub fn circuit_inputs_for_claim(
        &self,
        address: &Address,
        private_scalar: &Fr,
        index: usize,
        key_used_in_transfer: Option<&Fr>,
    ) -> Result<CircuitClaimInputs> {
        let account = self.account(address)?;
        self.claim_inputs_for(address, &account, private_scalar, index, key_used_in_transfer)
    }

    fn claim_inputs_for(
        &self,
        address: &Address,
        account: &Account,
        private_scalar: &Fr,
        index: usize,
        key_used_in_transfer: Option<&Fr>,
    ) -> Result<CircuitClaimInputs> {
        let failed = self.reader.get_failed_cross_chain_transfers(address)?;
        let entry = failed.get(index).ok_or(SdkError::NoFailedTransfer(index))?;
        inputs::claim_inputs(
            private_scalar,
            key_used_in_transfer.unwrap_or(private_scalar),
            account,
            entry,
            &self.target(),
        )
    }

    fn pending_selection(
        &self,
        account: &Account,
        private_scalar: &Fr,
        indexes: &[usize],
    ) -> Result<PendingSelection> {
        let max = self.options.max_pending_transfers_apply;
        check_apply_indexes(indexes, account.pending_transfers.len(), max)?;
        let selected = select_ascending(&account.pending_transfers, indexes)?;

        let senders: Vec<Address> = selected.iter().map(|t| t.sender).collect();
        let sender_points = self
            .reader
            .get_public_keys(&senders)?
            .into_iter()
            .zip(&senders)
            .map(|(point, sender)| point.ok_or(SdkError::MissingPublicKey(*sender)))
            .collect::<Result<Vec<_>>>()?;

        PendingSelection::assemble(private_scalar, &selected, &sender_points, max, &self.target())
    }

    pub fn create_state_audit_report(
        &self,
        private_scalar: &Fr,
        nonce: u64,
        auditors: &[Address],
    ) -> Result<Vec<AuditReport>> {
        audit::create_state_audit_report(
            private_scalar,
            nonce,
            &self.target(),
            &self.auditor_keys(auditors)?,
        )
    }

    pub fn create_transfer_audit_report(
        &self,
        private_scalar: &Fr,
        nonce: u64,
        recipient: &Address,
        auditors: &[Address],
    ) -> Result<Vec<AuditReport>> {
        let recipient_point = self.public_key(recipient)?;
        audit::create_transfer_audit_report(
            private_scalar,
            nonce,
            &recipient_point,
            &self.target(),
            &self.auditor_keys(auditors)?,
        )
    }

    /// Audit a payload whose report was created by `counterparty`.
    pub fn decrypt_audit_report(
        &self,
        auditor_private: &Fr,
        counterparty: &Address,
        e_otk: &Fr,
        payload: &Payload,
    ) -> Result<u128> {
        let counterparty_point = self.public_key(counterparty)?;
        audit::decrypt_audit_report(auditor_private, &counterparty_point, e_otk, payload)
    }

    pub fn prove(&self, inputs: &CircuitInputs) -> Result<ProofOutput> {
        let circuit = inputs.circuit();
        debug!(circuit = circuit.name(), "requesting proof");
        let output = self.prover.prove(circuit, inputs)?;
        info!(
            circuit = circuit.name(),
            signals = output.public_signals.len(),
            "proof generated"
        );
        Ok(output)
    }

    pub fn init(&self, keys: &ConfidentialKeyPair, auditors: &[Address]) -> Result<InitParams> {
        let inputs = CircuitInputs::Init(self.circuit_inputs_for_init(&keys.private_scalar));
        let output = self.prove(&inputs)?;
        let reports = self.create_state_audit_report(&keys.private_scalar, 0, auditors)?;
        Ok(InitParams::from_proof(&output, reports)?)
    }

    pub fn deposit(
        &self,
        address: &Address,
        keys: &ConfidentialKeyPair,
        amount: u128,
        auditors: &[Address],
    ) -> Result<UpdateParams> {
        self.update(address, keys, Operation::Deposit, amount, auditors)
    }

    pub fn withdraw(
        &self,
        address: &Address,
        keys: &ConfidentialKeyPair,
        amount: u128,
        auditors: &[Address],
    ) -> Result<UpdateParams> {
        self.update(address, keys, Operation::Withdraw, amount, auditors)
    }

    /// Inputs and reports come from one account snapshot so that both
    /// target the same nonce.
    fn update(
        &self,
        address: &Address,
        keys: &ConfidentialKeyPair,
        operation: Operation,
        amount: u128,
        auditors: &[Address],
    ) -> Result<UpdateParams> {
        let account = self.account(address)?;
        let inputs = CircuitInputs::Update(inputs::update_inputs(
            &keys.private_scalar,
            &account,
            operation,
            amount,
            &self.target(),
        )?);
        let output = self.prove(&inputs)?;
        let reports = self.state_reports(&account, keys, auditors)?;
        Ok(UpdateParams::from_proof(&output, reports)?)
    }

    pub fn transfer(
        &self,
        address: &Address,
        keys: &ConfidentialKeyPair,
        to: &Address,
        amount: u128,
        auditors: &[Address],
        extra_data: Vec<u8>,
    ) -> Result<TransferParams> {
        let account = self.account(address)?;
        let recipient = self.account(to)?;
        let inputs = CircuitInputs::Transfer(inputs::transfer_inputs(
            &keys.private_scalar,
            &account,
            &recipient.public_point,
            amount,
            &self.target(),
        )?);
        let output = self.prove(&inputs)?;
        let state_reports = self.state_reports(&account, keys, auditors)?;
        let transfer_reports = self.transfer_reports(
            &account,
            keys,
            &recipient.public_point,
            &recipient.required_auditors,
            auditors,
        )?;
        Ok(TransferParams::from_proof(
            *to,
            &output,
            state_reports,
            transfer_reports,
            extra_data,
        )?)
    }

    /// Transfer to an account on another ledger whose key is `recipient_point`.
    #[allow(clippy::too_many_arguments)]
    pub fn bridge(
        &self,
        address: &Address,
        keys: &ConfidentialKeyPair,
        to: &Address,
        recipient_point: &Point,
        amount: u128,
        auditors: &[Address],
        extra_data: Vec<u8>,
    ) -> Result<BridgeParams> {
        let account = self.account(address)?;
        let inputs = CircuitInputs::Transfer(inputs::transfer_inputs(
            &keys.private_scalar,
            &account,
            recipient_point,
            amount,
            &self.target(),
        )?);
        let output = self.prove(&inputs)?;
        let state_reports = self.state_reports(&account, keys, auditors)?;
        let transfer_reports =
            self.transfer_reports(&account, keys, recipient_point, &[], auditors)?;
        Ok(BridgeParams {
            recipient_public_point: *recipient_point,
            transfer: TransferParams::from_proof(
                *to,
                &output,
                state_reports,
                transfer_reports,
                extra_data,
            )?,
        })
    }

    pub fn apply(
        &self,
        address: &Address,
        keys: &ConfidentialKeyPair,
        indexes: &[usize],
        auditors: &[Address],
    ) -> Result<ApplyParams> {
        let account = self.account(address)?;
        let inputs =
            CircuitInputs::Apply(self.apply_inputs_for(&account, &keys.private_scalar, indexes)?);
        let output = self.prove(&inputs)?;
        let reports = self.state_reports(&account, keys, auditors)?;
        Ok(ApplyParams::from_proof(indexes.to_vec(), &output, reports)?)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn apply_and_transfer(
        &self,
        address: &Address,
        keys: &ConfidentialKeyPair,
        indexes: &[usize],
        to: &Address,
        amount: u128,
        auditors: &[Address],
        extra_data: Vec<u8>,
    ) -> Result<ApplyAndTransferParams> {
        let account = self.account(address)?;
        let recipient = self.account(to)?;
        let inputs = CircuitInputs::ApplyAndTransfer(self.apply_and_transfer_inputs_for(
            &account,
            &keys.private_scalar,
            indexes,
            &recipient.public_point,
            amount,
        )?);
        let output = self.prove(&inputs)?;
        let state_reports = self.state_reports(&account, keys, auditors)?;
        let transfer_reports = self.transfer_reports(
            &account,
            keys,
            &recipient.public_point,
            &recipient.required_auditors,
            auditors,
        )?;
        Ok(ApplyAndTransferParams::from_proof(
            *to,
            indexes.to_vec(),
            &output,
            state_reports,
            transfer_reports,
            extra_data,
        )?)
    }

    pub fn claim(
        &self,
        address: &Address,
        keys: &ConfidentialKeyPair,
        index: usize,
        key_used_in_transfer: Option<&Fr>,
        auditors: &[Address],
    ) -> Result<ClaimParams> {
        let account = self.account(address)?;
        let inputs = CircuitInputs::Claim(self.claim_inputs_for(
            address,
            &account,
            &keys.private_scalar,
            index,
            key_used_in_transfer,
        )?);
        let output = self.prove(&inputs)?;
        let reports = self.state_reports(&account, keys, auditors)?;
        Ok(ClaimParams::from_proof(index, &output, reports)?)
    }

    /// Reports for the state the operation will produce (`nonce + 1`).
    fn state_reports(
        &self,
        account: &Account,
        keys: &ConfidentialKeyPair,
        extra: &[Address],
    ) -> Result<Vec<AuditReport>> {
        let auditors = merge_auditors(&[account.required_auditors.as_slice(), extra]);
        self.create_state_audit_report(&keys.private_scalar, account.nonce() + 1, &auditors)
    }

    fn transfer_reports(
        &self,
        account: &Account,
        keys: &ConfidentialKeyPair,
        recipient_point: &Point,
        recipient_required: &[Address],
        extra: &[Address],
    ) -> Result<Vec<AuditReport>> {
        let auditors = merge_auditors(&[
            account.required_auditors.as_slice(),
            recipient_required,
            extra,
        ]);
        audit::create_transfer_audit_report(
            &keys.private_scalar,
            account.nonce() + 1,
            recipient_point,
            &self.target(),
            &self.auditor_keys(&auditors)?,
        )
    }
}

/// Concatenate auditor lists, dropping repeats and keeping first occurrence.
fn merge_auditors(lists: &[&[Address]]) -> Vec<Address> {
    let mut merged: Vec<Address> = Vec::new();
    for address in lists.iter().flat_map(|list| list.iter()) {
        if !merged.contains(address) {
            merged.push(*address);
        }
    }
    merged
}
