//! Account key pairs and ECDH.

use ct_common::babyjub::reduce_to_sub_order;
use ct_common::{poseidon_hash, reduce_be_bytes_to_fr, Fr, Point, BASE8};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Confidential key pair. The private scalar is always reduced modulo the
/// subgroup order.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidentialKeyPair {
    #[serde(with = "ct_common::field::serde_hex")]
    pub private_scalar: Fr,
    pub public_point: Point,
}

impl std::fmt::Debug for ConfidentialKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfidentialKeyPair")
            .field("private_scalar", &"<redacted>")
            .field("public_point", &self.public_point)
            .finish()
    }
}

/// `private = H(entropy) mod l`, `public = private · Base8`.
pub fn derive_keys(entropy: &Fr) -> Result<ConfidentialKeyPair> {
    let private_scalar = reduce_to_sub_order(&poseidon_hash(&[*entropy]));
    Ok(ConfidentialKeyPair {
        private_scalar,
        public_point: BASE8.mul_scalar(&private_scalar)?,
    })
}

/// Derive keys from raw entropy such as a wallet signature. The bytes are read
/// as a big-endian integer reduced into the field.
pub fn derive_keys_from_bytes(entropy: &[u8]) -> Result<ConfidentialKeyPair> {
    derive_keys(&reduce_be_bytes_to_fr(entropy))
}

/// ECDH: x-coordinate of `private_scalar · other`. `other` must be a curve
/// point.
pub fn derive_shared_key(private_scalar: &Fr, other: &Point) -> Result<Fr> {
    Ok(other.mul_scalar(private_scalar)?.x)
}
