//! Proof-checking seam used by the ledger.
//!
//! The ledger hands over the proof and the public signals it rebuilt from
//! its own state, and accepts the operation only when this returns `true`.

use ct_common::{CircuitId, Fr};

/// Binary proof check against a full public-signal vector.
pub trait ProofVerifier {
    fn verify(&self, circuit: CircuitId, proof: &[Fr], public_signals: &[Fr]) -> bool;
}

impl<V: ProofVerifier + ?Sized> ProofVerifier for Box<V> {
    fn verify(&self, circuit: CircuitId, proof: &[Fr], public_signals: &[Fr]) -> bool {
        (**self).verify(circuit, proof, public_signals)
    }
}
