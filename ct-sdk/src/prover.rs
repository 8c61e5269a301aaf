//! Proof-engine seam.
//!
//! Proving is synchronous and may take seconds; callers that need to stay
//! responsive run it on a blocking worker. It is atomic from the protocol's
//! point of view: either a proof comes back or an error does.

use ct_common::{CircuitId, ProofOutput};

use crate::error::Result;
use crate::inputs::CircuitInputs;

/// Produces proofs for circuit inputs.
pub trait ProofEngine {
    fn prove(&self, circuit: CircuitId, inputs: &CircuitInputs) -> Result<ProofOutput>;
}

impl<P: ProofEngine + ?Sized> ProofEngine for &P {
    fn prove(&self, circuit: CircuitId, inputs: &CircuitInputs) -> Result<ProofOutput> {
        (**self).prove(circuit, inputs)
    }
}
