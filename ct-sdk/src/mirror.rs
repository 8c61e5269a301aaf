//! Rebuild a pending queue from ledger events.

use ct_common::{swap_remove_descending, Address, LedgerEvent, PendingTransfer};

use crate::error::Result;

/// Local copy of one account's pending queue, kept in step with the ledger by
/// replaying its events with the same descending swap-remove rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueMirror {
    account: Address,
    queue: Vec<PendingTransfer>,
}

impl QueueMirror {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            queue: Vec::new(),
        }
    }

    pub fn replay<'a>(
        account: Address,
        events: impl IntoIterator<Item = &'a LedgerEvent>,
    ) -> Result<Self> {
        let mut mirror = Self::new(account);
        for event in events {
            mirror.apply_event(event)?;
        }
        Ok(mirror)
    }

    pub fn apply_event(&mut self, event: &LedgerEvent) -> Result<()> {
        match event {
            LedgerEvent::Transferred {
                recipient,
                pending_transfer,
                ..
            }
            | LedgerEvent::BridgeReceived {
                recipient,
                delivered: true,
                pending_transfer,
            } if *recipient == self.account => {
                self.queue.push(pending_transfer.clone());
            }
            LedgerEvent::Applied { account, indexes } if *account == self.account => {
                swap_remove_descending(&mut self.queue, indexes)?;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn pending(&self) -> &[PendingTransfer] {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_common::{EncryptedState, Fr};

    fn transfer(tag: u64) -> PendingTransfer {
        PendingTransfer {
            sender: Address([9; 20]),
            payload: EncryptedState::new(tag, Fr::from(tag), Fr::from(tag)),
            audit_reports: Vec::new(),
        }
    }

    fn sent(recipient: Address, tag: u64) -> LedgerEvent {
        LedgerEvent::Transferred {
            sender: Address([9; 20]),
            recipient,
            pending_transfer: transfer(tag),
            extra_data: Vec::new(),
        }
    }

    #[test]
    fn replay_matches_swap_remove_order() {
        let me = Address([1; 20]);
        let events = vec![
            sent(me, 0),
            sent(me, 1),
            sent(Address([2; 20]), 99),
            sent(me, 2),
            sent(me, 3),
            LedgerEvent::Applied {
                account: me,
                indexes: vec![0],
            },
        ];
        let mirror = QueueMirror::replay(me, &events).unwrap();
        let nonces: Vec<u64> = mirror.pending().iter().map(|t| t.payload.nonce).collect();
        assert_eq!(nonces, vec![3, 1, 2]);
    }

    #[test]
    fn undelivered_bridge_transfers_are_skipped() {
        let me = Address([1; 20]);
        let events = vec![LedgerEvent::BridgeReceived {
            recipient: me,
            delivered: false,
            pending_transfer: transfer(0),
        }];
        assert!(QueueMirror::replay(me, &events).unwrap().pending().is_empty());
    }
}
