//! BN254 scalar-field encodings.
//!
//! Two textual encodings are used: `0x`-prefixed hex of the 32-byte
//! little-endian repr for stored ledger data, and base-10 strings for witness
//! files handed to external witness generators.

use halo2curves_axiom::bn256::Fr;
use halo2curves_axiom::ff::PrimeField;
use num_bigint::BigUint;
use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// The scalar-field modulus `p`.
pub static MODULUS: Lazy<BigUint> = Lazy::new(|| fr_to_biguint(&-Fr::one()) + 1u32);

pub fn fr_from_bytes(bytes: &[u8; 32]) -> Result<Fr> {
    Fr::from_bytes(bytes)
        .into_option()
        .ok_or(Error::InvalidScalarEncoding)
}

pub fn fr_to_bytes(fr: &Fr) -> [u8; 32] {
    let repr = fr.to_repr();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(repr.as_ref());
    bytes
}

/// Interpret big-endian bytes as an integer and reduce it into the field.
pub fn reduce_be_bytes_to_fr(bytes: &[u8]) -> Fr {
    let mut acc = Fr::zero();
    let base = Fr::from(256);
    for byte in bytes.iter() {
        acc = acc * base + Fr::from(*byte as u64);
    }
    acc
}

pub fn fr_to_biguint(fr: &Fr) -> BigUint {
    BigUint::from_bytes_le(fr.to_repr().as_ref())
}

/// Reduce an arbitrary integer into the field.
pub fn fr_from_biguint(value: &BigUint) -> Fr {
    let reduced = value % &*MODULUS;
    reduce_be_bytes_to_fr(&reduced.to_bytes_be())
}

pub fn fr_to_u64(fr: &Fr) -> Result<u64> {
    let repr = fr.to_repr();
    let bytes = repr.as_ref();
    if bytes[8..].iter().any(|&b| b != 0) {
        return Err(Error::Overflow("u64"));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    Ok(u64::from_le_bytes(buf))
}

pub fn fr_to_u128(fr: &Fr) -> Result<u128> {
    let repr = fr.to_repr();
    let bytes = repr.as_ref();
    if bytes[16..].iter().any(|&b| b != 0) {
        return Err(Error::Overflow("u128"));
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&bytes[..16]);
    Ok(u128::from_le_bytes(buf))
}

pub fn fr_to_decimal(fr: &Fr) -> String {
    fr_to_biguint(fr).to_str_radix(10)
}

/// Parse a canonical base-10 field element. Values `>= p` are rejected.
pub fn fr_from_decimal(s: &str) -> Result<Fr> {
    let value = BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| Error::InvalidDecimal(s.to_string()))?;
    if value >= *MODULUS {
        return Err(Error::InvalidDecimal(format!("{s} is not below the field modulus")));
    }
    Ok(fr_from_biguint(&value))
}

/// Serde adapter: `0x`-prefixed hex of the little-endian repr.
pub mod serde_hex {
    use super::*;
    use serde::{de, Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(fr: &Fr, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(fr_to_bytes(fr))))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Fr, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FrVisitor;

        impl de::Visitor<'_> for FrVisitor {
            type Value = Fr;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a 32-byte hex string (with or without 0x prefix)")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                let hex_str = v.strip_prefix("0x").unwrap_or(v);
                if hex_str.len() != 64 {
                    return Err(E::custom(format!(
                        "expected 64 hex chars, got {}",
                        hex_str.len()
                    )));
                }
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(hex_str, &mut bytes).map_err(E::custom)?;
                fr_from_bytes(&bytes).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(FrVisitor)
    }
}

/// Serde adapter: base-10 string, the format witness generators consume.
pub mod serde_decimal {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(fr: &Fr, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&fr_to_decimal(fr))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Fr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        fr_from_decimal(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Vec<Fr>` as a list of base-10 strings.
pub mod serde_decimal_vec {
    use super::*;
    use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &[Fr], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&fr_to_decimal(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<Fr>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| fr_from_decimal(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Serde adapter for `Vec<Fr>` as a list of hex strings.
pub mod serde_hex_vec {
    use super::*;
    use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &[Fr], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&format!("0x{}", hex::encode(fr_to_bytes(value))))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<Fr>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| {
                let hex_str = s.strip_prefix("0x").unwrap_or(s);
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(hex_str, &mut bytes).map_err(serde::de::Error::custom)?;
                fr_from_bytes(&bytes).map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fr_bytes_round_trip() {
        let value = Fr::from(2024u64);
        let bytes = fr_to_bytes(&value);
        assert_eq!(fr_from_bytes(&bytes).unwrap(), value);
    }

    #[test]
    fn modulus_matches_bn254_scalar_field() {
        assert_eq!(
            MODULUS.to_str_radix(10),
            "21888242871839275222246405745257275088548364400416034343698204186575808495617"
        );
    }

    #[test]
    fn decimal_parsing_rejects_modulus_and_garbage() {
        let p = MODULUS.to_str_radix(10);
        assert!(fr_from_decimal(&p).is_err());
        assert!(fr_from_decimal("12a").is_err());
        assert_eq!(fr_from_decimal("0").unwrap(), Fr::zero());
    }

    #[test]
    fn decimal_encoding_of_negative_one() {
        let minus_one = -Fr::one();
        let s = fr_to_decimal(&minus_one);
        assert!(s.ends_with("495616"));
        assert_eq!(fr_from_decimal(&s).unwrap(), minus_one);
    }

    #[test]
    fn be_reduction_matches_integer_value() {
        assert_eq!(reduce_be_bytes_to_fr(&[0x01, 0x00]), Fr::from(256u64));
        assert_eq!(reduce_be_bytes_to_fr(&[]), Fr::zero());
    }

    #[test]
    fn u128_extraction_rejects_large_values() {
        assert_eq!(fr_to_u128(&Fr::from_u128(u128::MAX)).unwrap(), u128::MAX);
        assert!(fr_to_u128(&-Fr::one()).is_err());
        assert!(fr_to_u64(&Fr::from_u128(1u128 << 64)).is_err());
    }
}
