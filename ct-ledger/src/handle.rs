//! Shared ledger handle.
//!
//! Reads take the shared lock and writes take the exclusive one, so each
//! operation sees and produces a consistent account view. A poisoned lock
//! surfaces as [`ReadError::Unavailable`] or [`LedgerError::Unavailable`].

use std::sync::{Arc, RwLock};

use ct_common::{Account, Address, FailedTransfer, LedgerReader, Point, ReadError, Target};

use crate::error::{LedgerError, Result};
use crate::ledger::ConfidentialLedger;
use crate::verifier::ProofVerifier;

pub struct LedgerHandle<V> {
    target: Target,
    inner: Arc<RwLock<ConfidentialLedger<V>>>,
}

impl<V> Clone for LedgerHandle<V> {
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: ProofVerifier> LedgerHandle<V> {
    pub fn new(ledger: ConfidentialLedger<V>) -> Self {
        Self {
            target: ledger.target(),
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Run `f` with exclusive access, e.g. to submit an operation.
    pub fn submit<T>(
        &self,
        f: impl FnOnce(&mut ConfidentialLedger<V>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".into()))?;
        f(&mut guard)
    }

    pub fn read<T>(
        &self,
        f: impl FnOnce(&ConfidentialLedger<V>) -> T,
    ) -> std::result::Result<T, ReadError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| ReadError::Unavailable("ledger lock poisoned".into()))?;
        Ok(f(&guard))
    }
}

impl<V: ProofVerifier> LedgerReader for LedgerHandle<V> {
    fn target(&self) -> Target {
        self.target
    }

    fn get_account(&self, address: &Address) -> std::result::Result<Option<Account>, ReadError> {
        self.read(|ledger| ledger.get_account(address).cloned())
    }

    fn get_public_keys(
        &self,
        addresses: &[Address],
    ) -> std::result::Result<Vec<Option<Point>>, ReadError> {
        self.read(|ledger| ledger.get_c_public_keys(addresses))
    }

    fn get_failed_cross_chain_transfers(
        &self,
        address: &Address,
    ) -> std::result::Result<Vec<FailedTransfer>, ReadError> {
        self.read(|ledger| ledger.get_failed_cross_chain_transfers(address).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use ct_common::{CircuitId, Fr};
    use std::thread;

    struct AcceptAll;

    impl ProofVerifier for AcceptAll {
        fn verify(&self, _: CircuitId, _: &[Fr], _: &[Fr]) -> bool {
            true
        }
    }

    #[test]
    fn handle_is_shared_across_threads() {
        let handle = LedgerHandle::new(ConfidentialLedger::new(LedgerConfig::default(), AcceptAll));
        let workers: Vec<_> = (0..4u8)
            .map(|i| {
                let handle = handle.clone();
                thread::spawn(move || {
                    handle
                        .submit(|ledger| ledger.mint(Address([i; 20]), 10))
                        .unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        let total: u128 = (0..4u8)
            .map(|i| handle.read(|l| l.balance_of(&Address([i; 20]))).unwrap())
            .sum();
        assert_eq!(total, 40);
        assert_eq!(handle.target(), LedgerConfig::default().target);
        assert_eq!(handle.get_account(&Address([1; 20])).unwrap(), None);
    }
}
