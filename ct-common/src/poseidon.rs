//! Poseidon over the BN254 scalar field (width 6, rate 5).

use halo2curves_axiom::bn256::Fr;
use halo2curves_axiom::ff::Field;
use poseidon_primitives::poseidon::primitives::{ConstantLength, Hash as PoseidonHash, Spec};

use crate::error::{Error, Result};

pub const POSEIDON_T: usize = 6;
pub const POSEIDON_RATE: usize = 5;
pub const POSEIDON_FULL_ROUNDS: usize = 8;
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// Fixed-arity Poseidon.
pub fn poseidon_hash<const L: usize>(values: &[Fr; L]) -> Fr {
    PoseidonHash::<Fr, CtPoseidonSpec, ConstantLength<L>, POSEIDON_T, POSEIDON_RATE>::init()
        .hash(*values)
}

/// Poseidon over a slice of 1 to 5 elements.
pub fn poseidon(inputs: &[Fr]) -> Result<Fr> {
    Ok(match *inputs {
        [a] => poseidon_hash(&[a]),
        [a, b] => poseidon_hash(&[a, b]),
        [a, b, c] => poseidon_hash(&[a, b, c]),
        [a, b, c, d] => poseidon_hash(&[a, b, c, d]),
        [a, b, c, d, e] => poseidon_hash(&[a, b, c, d, e]),
        _ => return Err(Error::UnsupportedArity(inputs.len())),
    })
}

#[derive(Debug)]
struct CtPoseidonSpec;

impl Spec<Fr, POSEIDON_T, POSEIDON_RATE> for CtPoseidonSpec {
    fn full_rounds() -> usize {
        POSEIDON_FULL_ROUNDS
    }

    fn partial_rounds() -> usize {
        POSEIDON_PARTIAL_ROUNDS
    }

    fn sbox(val: Fr) -> Fr {
        val.pow_vartime([5])
    }

    fn secure_mds() -> usize {
        0
    }
}
