//! Multi-account world: one ledger, one SDK and a fixed cast of users.

use anyhow::{anyhow, Context, Result};
use ct_common::{Address, Target};
use ct_ledger::{ConfidentialLedger, LedgerConfig, LedgerHandle};
use ct_sdk::{derive_keys_from_bytes, ConfidentialKeyPair, ConfidentialSdk, SdkOptions};
use once_cell::sync::Lazy;

use crate::prover::SimulatedProver;
use crate::verifier::SimulatedVerifier;

pub const CHAIN_ID: u64 = 31337;

pub static CONTRACT: Lazy<Address> = Lazy::new(|| derive_address("confidential-token"));

pub static CAST: Lazy<Cast> = Lazy::new(|| {
    let user = |name| User::named(name).expect("derive fixture user keys");
    Cast {
        alice: user("alice"),
        bob: user("bob"),
        charlie: user("charlie"),
        auditor: user("auditor"),
    }
});

pub type Ledger = LedgerHandle<SimulatedVerifier>;
pub type Sdk = ConfidentialSdk<Ledger, SimulatedProver>;

/// Test account with deterministic keys.
#[derive(Clone, Debug)]
pub struct User {
    pub name: &'static str,
    pub address: Address,
    pub keys: ConfidentialKeyPair,
}

impl User {
    pub fn named(name: &'static str) -> Result<Self> {
        let seed = blake3::hash(format!("ct-fixture-key:{name}").as_bytes());
        Ok(Self {
            name,
            address: derive_address(name),
            keys: derive_keys_from_bytes(seed.as_bytes())
                .with_context(|| format!("keys for {name}"))?,
        })
    }
}

pub struct Cast {
    pub alice: User,
    pub bob: User,
    pub charlie: User,
    pub auditor: User,
}

fn derive_address(label: &str) -> Address {
    let digest = blake3::hash(label.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest.as_bytes()[..20]);
    Address(bytes)
}

pub fn default_target() -> Target {
    Target::new(CHAIN_ID, *CONTRACT)
}

pub struct World {
    pub ledger: Ledger,
    pub sdk: Sdk,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::with_target(default_target()))
    }

    /// A world whose SDK batch bound follows `config`.
    pub fn with_config(config: LedgerConfig) -> Self {
        let options = SdkOptions {
            max_pending_transfers_apply: config.max_pending_transfers_apply,
            ..SdkOptions::default()
        };
        let prover = SimulatedProver::new(config.target).with_proof_len(config.proof_len);
        let ledger = LedgerHandle::new(ConfidentialLedger::new(config, SimulatedVerifier));
        let sdk = ConfidentialSdk::new(ledger.clone(), prover, options);
        Self { ledger, sdk }
    }

    pub fn init(&self, user: &User) -> Result<()> {
        let params = self
            .sdk
            .init(&user.keys, &[])
            .with_context(|| format!("init params for {}", user.name))?;
        self.ledger
            .submit(|ledger| ledger.c_init(&user.address, &params))
            .with_context(|| format!("cInit for {}", user.name))
    }

    pub fn init_all(&self, users: &[&User]) -> Result<()> {
        users.iter().try_for_each(|user| self.init(user))
    }

    /// Mint public tokens and move them into the confidential balance.
    pub fn fund(&self, user: &User, amount: u128) -> Result<()> {
        self.ledger
            .submit(|ledger| ledger.mint(user.address, amount))
            .with_context(|| format!("mint for {}", user.name))?;
        let params = self.sdk.deposit(&user.address, &user.keys, amount, &[])?;
        self.ledger
            .submit(|ledger| ledger.c_deposit(&user.address, &params))
            .with_context(|| format!("cDeposit for {}", user.name))
    }

    pub fn transfer(&self, from: &User, to: &User, amount: u128) -> Result<()> {
        let params = self
            .sdk
            .transfer(&from.address, &from.keys, &to.address, amount, &[], Vec::new())?;
        self.ledger
            .submit(|ledger| ledger.c_transfer(&from.address, &params))?;
        Ok(())
    }

    pub fn apply(&self, user: &User, indexes: &[usize]) -> Result<()> {
        let params = self.sdk.apply(&user.address, &user.keys, indexes, &[])?;
        self.ledger
            .submit(|ledger| ledger.c_apply(&user.address, &params))?;
        Ok(())
    }

    pub fn balance(&self, user: &User) -> Result<u128> {
        Ok(self
            .sdk
            .c_balance_of(&user.address, &user.keys.private_scalar)?)
    }

    pub fn pending_len(&self, user: &User) -> Result<usize> {
        let account = self
            .ledger
            .read(|ledger| ledger.get_account(&user.address).cloned())?
            .ok_or_else(|| anyhow!("{} is not initialized", user.name))?;
        Ok(account.pending_transfers.len())
    }

    pub fn nonce(&self, user: &User) -> Result<u64> {
        Ok(self.sdk.account(&user.address)?.nonce())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
