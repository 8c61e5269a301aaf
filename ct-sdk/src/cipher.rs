//! One-time keys, the additive stream cipher and commitments.
//!
//! None of these fail: a wrong key or nonce yields a wrong amount, so any
//! decrypted amount is only trusted after its commitment is recomputed.

use ct_common::{fr_to_u128, poseidon_hash, EncryptedState, Fr, Target};

use crate::error::{Result, SdkError};

/// `H(key, nonce, chainId, contractAddress)`.
pub fn generate_otk(key: &Fr, nonce: u64, target: &Target) -> Fr {
    poseidon_hash(&[
        *key,
        Fr::from(nonce),
        target.chain_id_fr(),
        target.contract_fr(),
    ])
}

fn keystream(key: &Fr, nonce: u64) -> Fr {
    poseidon_hash(&[*key, Fr::from(nonce)])
}

pub fn cipher(key: &Fr, nonce: u64, plaintext: &Fr) -> Fr {
    *plaintext + keystream(key, nonce)
}

pub fn decipher(key: &Fr, nonce: u64, ciphertext: &Fr) -> Fr {
    *ciphertext - keystream(key, nonce)
}

pub fn generate_commitment(amount: &Fr, otk: &Fr) -> Fr {
    poseidon_hash(&[*amount, *otk])
}

pub fn decrypt_amount(key: &Fr, nonce: u64, e_amount: &Fr, target: &Target) -> Fr {
    decipher(&generate_otk(key, nonce, target), nonce, e_amount)
}

/// Encrypt `amount` under the OTK for `(key, nonce)`.
pub fn encrypt_state(key: &Fr, nonce: u64, amount: &Fr, target: &Target) -> EncryptedState {
    let otk = generate_otk(key, nonce, target);
    EncryptedState {
        nonce,
        commitment: generate_commitment(amount, &otk),
        e_amount: cipher(&otk, nonce, amount),
    }
}

/// Decrypt a state or payload and check it against its commitment.
pub fn decrypt_verified(key: &Fr, state: &EncryptedState, target: &Target) -> Result<Fr> {
    let otk = generate_otk(key, state.nonce, target);
    let amount = decipher(&otk, state.nonce, &state.e_amount);
    if generate_commitment(&amount, &otk) != state.commitment {
        return Err(SdkError::CommitmentMismatch);
    }
    Ok(amount)
}

/// [`decrypt_verified`] narrowed to a token amount.
pub fn decrypt_state(key: &Fr, state: &EncryptedState, target: &Target) -> Result<u128> {
    Ok(fr_to_u128(&decrypt_verified(key, state, target)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_common::Address;
    use halo2curves_axiom::ff::PrimeField;
    use proptest::prelude::*;

    fn target() -> Target {
        Target::new(31337, Address([0x11; 20]))
    }

    #[test]
    fn zero_balance_state_is_not_trivial() {
        let state = encrypt_state(&Fr::from(5u64), 0, &Fr::zero(), &target());
        assert_ne!(state.commitment, Fr::zero());
        assert_ne!(state.e_amount, Fr::zero());
        assert_eq!(decrypt_state(&Fr::from(5u64), &state, &target()).unwrap(), 0);
    }

    #[test]
    fn wrong_key_fails_commitment_check() {
        let state = encrypt_state(&Fr::from(5u64), 3, &Fr::from(100u64), &target());
        assert!(matches!(
            decrypt_state(&Fr::from(6u64), &state, &target()),
            Err(SdkError::CommitmentMismatch)
        ));
    }

    #[test]
    fn tampered_commitment_is_rejected() {
        let mut state = encrypt_state(&Fr::from(5u64), 3, &Fr::from(100u64), &target());
        state.commitment += Fr::one();
        assert!(decrypt_verified(&Fr::from(5u64), &state, &target()).is_err());
    }

    #[test]
    fn decrypt_amount_matches_encrypt_state() {
        let key = Fr::from(77u64);
        let state = encrypt_state(&key, 9, &Fr::from(1234u64), &target());
        assert_eq!(
            decrypt_amount(&key, 9, &state.e_amount, &target()),
            Fr::from(1234u64)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn cipher_round_trips(key in any::<u64>(), nonce in any::<u64>(), amount in any::<u128>()) {
            let key = Fr::from(key);
            let amount = Fr::from_u128(amount);
            prop_assert_eq!(decipher(&key, nonce, &cipher(&key, nonce, &amount)), amount);
        }

        #[test]
        fn otk_is_separated_by_target(key in any::<u64>(), nonce in any::<u64>(), chain in 1u64..u64::MAX) {
            let key = Fr::from(key);
            let a = Target::new(chain, Address([0x11; 20]));
            let b = Target::new(chain - 1, Address([0x11; 20]));
            let c = Target::new(chain, Address([0x12; 20]));
            prop_assert_eq!(generate_otk(&key, nonce, &a), generate_otk(&key, nonce, &a));
            prop_assert_ne!(generate_otk(&key, nonce, &a), generate_otk(&key, nonce, &b));
            prop_assert_ne!(generate_otk(&key, nonce, &a), generate_otk(&key, nonce, &c));
        }
    }
}
