//! Baby Jubjub: the twisted Edwards curve `a·x² + y² = 1 + d·x²·y²` over the
//! BN254 scalar field, with `a = 168700` and `d = 168696`.
//!
//! Public keys are multiples of [`BASE8`], which generates the prime-order
//! subgroup of order [`SUB_ORDER`]. Scalar multiplication here is variable
//! time; it is used for key derivation and ECDH on the client and for checks
//! in the reference ledger.

use halo2curves_axiom::bn256::Fr;
use halo2curves_axiom::ff::{Field, PrimeField};
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::{fr_from_biguint, fr_to_biguint, serde_hex};

const A: u64 = 168700;
const D: u64 = 168696;

/// Generator of the prime-order subgroup.
pub static BASE8: Lazy<Point> = Lazy::new(|| Point {
    x: Fr::from_raw([
        0x2893f3f6bb957051,
        0x2ab8d8010534e0b6,
        0x4eacb2e09d6277c1,
        0x0bb77a6ad63e739b,
    ]),
    y: Fr::from_raw([
        0x4b3c257a872d7d8b,
        0xfce0051fb9e13377,
        0x25572e1cd16bf9ed,
        0x25797203f7a0b249,
    ]),
});

/// Order `l` of the subgroup generated by [`BASE8`].
pub static SUB_ORDER: Lazy<BigUint> = Lazy::new(|| {
    BigUint::from_slice(&[
        0x392126f1, 0x677297dc, 0x3920ee0a, 0xab3eedb8, 0xd0302b0b, 0x370a08b6, 0x5c263405,
        0x060c89ce,
    ])
});

/// Affine point on Baby Jubjub.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(with = "serde_hex")]
    pub x: Fr,
    #[serde(with = "serde_hex")]
    pub y: Fr,
}

impl Default for Point {
    fn default() -> Self {
        Self::identity()
    }
}

impl Point {
    pub fn new(x: Fr, y: Fr) -> Result<Self> {
        let point = Self { x, y };
        if !point.is_on_curve() {
            return Err(Error::NotOnCurve);
        }
        Ok(point)
    }

    /// The neutral element `(0, 1)`.
    pub fn identity() -> Self {
        Self {
            x: Fr::zero(),
            y: Fr::one(),
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn is_on_curve(&self) -> bool {
        let x2 = self.x.square();
        let y2 = self.y.square();
        Fr::from(A) * x2 + y2 == Fr::one() + Fr::from(D) * x2 * y2
    }

    /// Twisted Edwards addition of two curve points.
    pub fn add(&self, other: &Point) -> Result<Point> {
        if !self.is_on_curve() || !other.is_on_curve() {
            return Err(Error::NotOnCurve);
        }
        self.add_affine(other)
    }

    pub fn double(&self) -> Result<Point> {
        self.add(self)
    }

    /// Double-and-add over the little-endian bits of `scalar`. Fails for a
    /// point that is not on the curve.
    pub fn mul_scalar(&self, scalar: &Fr) -> Result<Point> {
        if !self.is_on_curve() {
            return Err(Error::NotOnCurve);
        }
        let repr = scalar.to_repr();
        let mut acc = Point::identity();
        for &byte in repr.as_ref().iter().rev() {
            for bit in (0..8).rev() {
                acc = acc.add_affine(&acc)?;
                if (byte >> bit) & 1 == 1 {
                    acc = acc.add_affine(self)?;
                }
            }
        }
        Ok(acc)
    }

    /// On the curve and annihilated by the subgroup order.
    pub fn in_subgroup(&self) -> bool {
        matches!(self.mul_scalar(&sub_order_fr()), Ok(p) if p.is_identity())
    }

    /// The law is complete (`d` is not a square), so for curve points the
    /// denominators `1 ± d·x1·x2·y1·y2` are never zero.
    fn add_affine(&self, other: &Point) -> Result<Point> {
        let x1y2 = self.x * other.y;
        let y1x2 = self.y * other.x;
        let x1x2 = self.x * other.x;
        let y1y2 = self.y * other.y;
        let dxxyy = Fr::from(D) * x1x2 * y1y2;

        let x_den: Option<Fr> = (Fr::one() + dxxyy).invert().into();
        let y_den: Option<Fr> = (Fr::one() - dxxyy).invert().into();
        let (x_den, y_den) = x_den.zip(y_den).ok_or(Error::DegenerateAddition)?;

        Ok(Point {
            x: (x1y2 + y1x2) * x_den,
            y: (y1y2 - Fr::from(A) * x1x2) * y_den,
        })
    }
}

/// The subgroup order as a field element (it is smaller than `p`).
pub fn sub_order_fr() -> Fr {
    fr_from_biguint(&SUB_ORDER)
}

/// Reduce a field element modulo the subgroup order.
pub fn reduce_to_sub_order(value: &Fr) -> Fr {
    fr_from_biguint(&(fr_to_biguint(value) % &*SUB_ORDER))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_mul(k: u64) -> Point {
        BASE8.mul_scalar(&Fr::from(k)).unwrap()
    }

    #[test]
    fn base8_is_on_curve_and_in_subgroup() {
        assert!(BASE8.is_on_curve());
        assert!(BASE8.in_subgroup());
        assert!(!BASE8.is_identity());
    }

    #[test]
    fn sub_order_constant() {
        assert_eq!(
            SUB_ORDER.to_str_radix(10),
            "2736030358979909402780800718157159386076813972158567259200215660948447373041"
        );
    }

    #[test]
    fn identity_is_neutral() {
        let p = base_mul(5);
        assert_eq!(p.add(&Point::identity()).unwrap(), p);
        assert_eq!(
            Point::identity().mul_scalar(&Fr::from(9u64)).unwrap(),
            Point::identity()
        );
        assert_eq!(p.mul_scalar(&Fr::zero()).unwrap(), Point::identity());
    }

    #[test]
    fn scalar_mul_is_repeated_addition() {
        let base = *BASE8;
        let three = base.double().unwrap().add(&base).unwrap();
        assert_eq!(base_mul(3), three);
        assert!(three.is_on_curve());
    }

    #[test]
    fn scalar_mul_distributes_over_scalars() {
        let a = Fr::from(123_456u64);
        let b = Fr::from(987_654_321u64);
        let lhs = BASE8.mul_scalar(&(a + b)).unwrap();
        let rhs = BASE8
            .mul_scalar(&a)
            .unwrap()
            .add(&BASE8.mul_scalar(&b).unwrap())
            .unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn reduction_wraps_at_sub_order() {
        let l = sub_order_fr();
        assert_eq!(reduce_to_sub_order(&l), Fr::zero());
        assert_eq!(reduce_to_sub_order(&(l + Fr::from(4u64))), Fr::from(4u64));
    }

    #[test]
    fn new_rejects_points_off_curve() {
        assert_eq!(Point::new(Fr::one(), Fr::one()), Err(Error::NotOnCurve));
        assert!(Point::new(BASE8.x, BASE8.y).is_ok());
    }

    #[test]
    fn arithmetic_rejects_points_off_curve() {
        let bogus = Point {
            x: Fr::from(1u64),
            y: Fr::from(2u64),
        };
        assert_eq!(bogus.mul_scalar(&Fr::from(3u64)), Err(Error::NotOnCurve));
        assert_eq!(BASE8.add(&bogus), Err(Error::NotOnCurve));
        assert!(!bogus.in_subgroup());
    }

    #[test]
    fn vanishing_denominator_is_reported() {
        // d·x1·x2·y1·y2 = -1 makes the x denominator zero.
        let d_inv: Option<Fr> = Fr::from(D).invert().into();
        let p = Point {
            x: -d_inv.unwrap(),
            y: Fr::one(),
        };
        let q = Point {
            x: Fr::one(),
            y: Fr::one(),
        };
        assert_eq!(p.add_affine(&q), Err(Error::DegenerateAddition));
    }

    #[test]
    fn low_order_point_is_outside_subgroup() {
        // (0, -1) has order 2.
        let two_torsion = Point::new(Fr::zero(), -Fr::one()).unwrap();
        assert!(!two_torsion.in_subgroup());
        assert_eq!(two_torsion.double().unwrap(), Point::identity());
    }
}
