//! Account, payload and event types shared by the ledger and its clients.

use std::fmt;
use std::str::FromStr;

use halo2curves_axiom::bn256::Fr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::babyjub::Point;
use crate::error::Error;
use crate::field::{reduce_be_bytes_to_fr, serde_hex};

/// 20-byte account identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Big-endian reduction into the scalar field, as mixed into OTKs.
    pub fn to_fr(&self) -> Fr {
        reduce_be_bytes_to_fr(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|err| Error::InvalidAddress(format!("{s}: {err}")))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Domain-separation tag mixed into every one-time key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub chain_id: u64,
    pub contract_address: Address,
}

impl Target {
    pub fn new(chain_id: u64, contract_address: Address) -> Self {
        Self {
            chain_id,
            contract_address,
        }
    }

    pub fn chain_id_fr(&self) -> Fr {
        Fr::from(self.chain_id)
    }

    pub fn contract_fr(&self) -> Fr {
        self.contract_address.to_fr()
    }
}

/// Encrypted balance at a given nonce.
///
/// Holds `commitment = H(amount, otk)` and `eAmount = amount + H(otk, nonce)`
/// for the OTK valid at `nonce`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedState {
    pub nonce: u64,
    #[serde(with = "serde_hex")]
    pub commitment: Fr,
    #[serde(with = "serde_hex")]
    pub e_amount: Fr,
}

/// Pending-transfer payloads share the encrypted-state shape; their OTK is
/// derived from the sender/recipient shared key.
pub type Payload = EncryptedState;

impl EncryptedState {
    pub fn new(nonce: u64, commitment: Fr, e_amount: Fr) -> Self {
        Self {
            nonce,
            commitment,
            e_amount,
        }
    }
}

/// An OTK re-encrypted for one auditor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub auditor: Address,
    #[serde(rename = "eOTK", with = "serde_hex")]
    pub e_otk: Fr,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransfer {
    pub sender: Address,
    pub payload: Payload,
    #[serde(default)]
    pub audit_reports: Vec<AuditReport>,
}

/// A cross-chain transfer that could not be delivered. Kept under the
/// sender's address until the sender claims it back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTransfer {
    pub recipient_public_point: Point,
    pub pending_transfer: PendingTransfer,
}

/// An initialized confidential account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub public_point: Point,
    pub state: EncryptedState,
    #[serde(default)]
    pub pending_transfers: Vec<PendingTransfer>,
    /// Reports attached to the current state.
    #[serde(default)]
    pub audit_reports: Vec<AuditReport>,
    /// Insertion-ordered, duplicate-free.
    #[serde(default)]
    pub required_auditors: Vec<Address>,
}

impl Account {
    pub fn nonce(&self) -> u64 {
        self.state.nonce
    }
}

/// Events emitted by accepted ledger operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LedgerEvent {
    Initialized {
        account: Address,
        public_point: Point,
    },
    Deposited {
        account: Address,
        amount: u128,
    },
    Withdrawn {
        account: Address,
        amount: u128,
    },
    /// A payload appended to `recipient`'s pending queue.
    Transferred {
        sender: Address,
        recipient: Address,
        pending_transfer: PendingTransfer,
        extra_data: Vec<u8>,
    },
    /// Indexes removed from `account`'s pending queue, as submitted.
    Applied {
        account: Address,
        indexes: Vec<usize>,
    },
    FailedTransferClaimed {
        account: Address,
        index: usize,
    },
    RequiredAuditorAdded {
        account: Address,
        auditor: Address,
    },
    RequiredAuditorRemoved {
        account: Address,
        auditor: Address,
    },
    /// Outbound cross-chain transfer.
    BridgeSent {
        sender: Address,
        recipient: Address,
        recipient_public_point: Point,
        pending_transfer: PendingTransfer,
        extra_data: Vec<u8>,
    },
    /// Inbound cross-chain transfer; `delivered` is false when it landed in
    /// the sender's failed-transfer list instead of the recipient's queue.
    BridgeReceived {
        recipient: Address,
        delivered: bool,
        pending_transfer: PendingTransfer,
    },
}
