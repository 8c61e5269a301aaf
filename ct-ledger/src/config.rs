//! Ledger deployment settings.

use std::env;
use std::fs;
use std::path::Path;

use ct_common::{
    Address, Target, DEFAULT_MAX_PENDING_TRANSFERS, DEFAULT_MAX_PENDING_TRANSFERS_APPLY, PROOF_LEN,
};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

pub const CHAIN_ID_ENV: &str = "CT_CHAIN_ID";
pub const CONTRACT_ADDRESS_ENV: &str = "CT_CONTRACT_ADDRESS";
pub const MAX_PENDING_TRANSFERS_ENV: &str = "CT_MAX_PENDING_TRANSFERS";
pub const MAX_APPLY_BATCH_ENV: &str = "CT_MAX_APPLY_BATCH";
const DEFAULT_CHAIN_ID: u64 = 31337;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    pub target: Target,
    /// Bound on each account's pending queue.
    #[serde(default = "default_max_pending")]
    pub max_pending_transfers: usize,
    /// Bound on how many pending transfers one Apply may consume. Must match
    /// the apply circuits.
    #[serde(default = "default_max_apply")]
    pub max_pending_transfers_apply: usize,
    #[serde(default = "default_proof_len")]
    pub proof_len: usize,
}

fn default_max_pending() -> usize {
    DEFAULT_MAX_PENDING_TRANSFERS
}

fn default_max_apply() -> usize {
    DEFAULT_MAX_PENDING_TRANSFERS_APPLY
}

fn default_proof_len() -> usize {
    PROOF_LEN
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            target: Target::new(DEFAULT_CHAIN_ID, Address::ZERO),
            max_pending_transfers: DEFAULT_MAX_PENDING_TRANSFERS,
            max_pending_transfers_apply: DEFAULT_MAX_PENDING_TRANSFERS_APPLY,
            proof_len: PROOF_LEN,
        }
    }
}

impl LedgerConfig {
    pub fn with_target(target: Target) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let config: LedgerConfig = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with any `CT_*` overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = LedgerConfig::default();
        if let Some(chain_id) = parse_env::<u64>(CHAIN_ID_ENV)? {
            config.target.chain_id = chain_id;
        }
        if let Some(contract) = parse_env::<Address>(CONTRACT_ADDRESS_ENV)? {
            config.target.contract_address = contract;
        }
        if let Some(max) = parse_env::<usize>(MAX_PENDING_TRANSFERS_ENV)? {
            config.max_pending_transfers = max;
        }
        if let Some(max) = parse_env::<usize>(MAX_APPLY_BATCH_ENV)? {
            config.max_pending_transfers_apply = max;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pending_transfers == 0 {
            return Err(LedgerError::Config(
                "max_pending_transfers must be at least 1".into(),
            ));
        }
        if self.max_pending_transfers_apply == 0 {
            return Err(LedgerError::Config(
                "max_pending_transfers_apply must be at least 1".into(),
            ));
        }
        if self.proof_len == 0 {
            return Err(LedgerError::Config("proof_len must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_env<T>(var: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|err| LedgerError::Config(format!("{var}={value}: {err}"))),
        Err(_) => Ok(None),
    }
}
