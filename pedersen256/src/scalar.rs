//! Canonical scalar encoding.
//!
//! Arithmetic is carried out on [`k256::Scalar`]; this module provides the
//! 32-byte big-endian wire form with strict validity checking and the
//! reducing import used by transcript sampling and nonce generation.

use crate::error::Error;
use elliptic_curve::{
    bigint::U256,
    ops::Reduce,
    subtle::{Choice, ConstantTimeLess},
    Curve,
};
use k256::{Scalar, Secp256k1};
use zeroize::DefaultIsZeroes;

/// Canonical big-endian scalar encoding.
///
/// A *valid* encoding is strictly less than the secp256k1 group order
/// `n = FFFFFFFF FFFFFFFF FFFFFFFF FFFFFFFE BAAEDCE6 AF48A03B BFD25E8C D0364141`.
/// Out-of-range encodings are representable (they arise from transcript
/// digests) and are either rejected via [`test_valid`][Self::test_valid] or
/// imported reducing via [`reduce`][Self::reduce], whose overflow flag lets
/// callers redraw where a second derivation attempt is cheap.
///
/// The derived ordering is big-endian lexicographic, which coincides with
/// numeric ordering.
#[derive(Copy, Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct ScalarBytes(pub [u8; 32]);

impl ScalarBytes {
    /// Length of the encoding in bytes.
    pub const SIZE: usize = 32;

    /// Borrow the canonical bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether the encoded value is strictly below the group order.
    pub fn is_valid(&self) -> bool {
        bool::from(self.uint().ct_lt(&Secp256k1::ORDER))
    }

    /// Fail with [`Error::InvalidScalar`] unless the encoding is valid.
    pub fn test_valid(&self) -> Result<(), Error> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::InvalidScalar)
        }
    }

    /// Import the encoded value reduced modulo the group order.
    ///
    /// The returned [`Choice`] is set when the encoding was out of range.
    /// The reduction itself is constant-time; callers deriving secrets must
    /// not branch on the flag other than to redraw.
    pub fn reduce(&self) -> (Scalar, Choice) {
        let uint = self.uint();
        let overflow = !uint.ct_lt(&Secp256k1::ORDER);
        (<Scalar as Reduce<U256>>::reduce(uint), overflow)
    }

    fn uint(&self) -> U256 {
        U256::from_be_slice(&self.0)
    }
}

impl From<Scalar> for ScalarBytes {
    fn from(scalar: Scalar) -> Self {
        ScalarBytes(scalar.to_bytes().into())
    }
}

impl From<&Scalar> for ScalarBytes {
    fn from(scalar: &Scalar) -> Self {
        ScalarBytes(scalar.to_bytes().into())
    }
}

impl From<[u8; 32]> for ScalarBytes {
    fn from(bytes: [u8; 32]) -> Self {
        ScalarBytes(bytes)
    }
}

impl AsRef<[u8]> for ScalarBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl DefaultIsZeroes for ScalarBytes {}

#[cfg(test)]
mod tests {
    use super::ScalarBytes;
    use crate::error::Error;
    use hex_literal::hex;
    use k256::Scalar;
    use proptest::prelude::*;

    /// The group order `n`.
    const ORDER: [u8; 32] =
        hex!("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141");

    fn order_minus_one() -> [u8; 32] {
        let mut bytes = ORDER;
        bytes[31] -= 1;
        bytes
    }

    #[test]
    fn order_overflows() {
        let (reduced, overflow) = ScalarBytes(ORDER).reduce();
        assert!(bool::from(overflow));
        assert_eq!(reduced, Scalar::ZERO);
        assert_eq!(
            ScalarBytes(ORDER).test_valid(),
            Err(Error::InvalidScalar)
        );
    }

    #[test]
    fn order_minus_one_is_valid() {
        let encoded = ScalarBytes(order_minus_one());
        assert!(encoded.is_valid());
        assert_eq!(encoded.test_valid(), Ok(()));

        let (reduced, overflow) = encoded.reduce();
        assert!(!bool::from(overflow));
        assert_eq!(ScalarBytes::from(reduced), encoded);
        assert_eq!(reduced, -Scalar::ONE);
    }

    #[test]
    fn zero_round_trips() {
        let (reduced, overflow) = ScalarBytes::default().reduce();
        assert!(!bool::from(overflow));
        assert_eq!(reduced, Scalar::ZERO);
        assert_eq!(ScalarBytes::from(Scalar::ZERO), ScalarBytes::default());
    }

    #[test]
    fn negate_zero_is_zero() {
        assert_eq!(-Scalar::ZERO, Scalar::ZERO);
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(ScalarBytes::from(Scalar::ONE) < ScalarBytes::from(Scalar::from(2u32)));
        assert!(ScalarBytes::default() < ScalarBytes(ORDER));
    }

    proptest! {
        #[test]
        fn round_trip_iff_in_range(bytes in any::<[u8; 32]>()) {
            let encoded = ScalarBytes(bytes);
            let (reduced, overflow) = encoded.reduce();
            if encoded.is_valid() {
                prop_assert!(!bool::from(overflow));
                prop_assert_eq!(ScalarBytes::from(reduced), encoded);
            } else {
                prop_assert!(bool::from(overflow));
                prop_assert_ne!(ScalarBytes::from(reduced), encoded);
            }
        }
    }
}
