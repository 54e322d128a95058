//! Canonical compressed point encoding.

use crate::error::Error;
use elliptic_curve::{
    point::DecompressPoint,
    sec1::{Coordinates, ToEncodedPoint},
    subtle::Choice,
};
use k256::{AffinePoint, FieldBytes, ProjectivePoint};

/// Affine-compressed point encoding: big-endian x-coordinate plus the parity
/// of y.
///
/// The all-zero x with even parity encodes the group identity; every other
/// encoding must name an actual curve point (x strictly below the field
/// prime, and a square on-curve y must exist). Decompression of anything
/// else fails with [`Error::InvalidPoint`].
///
/// The derived ordering compares x big-endian lexicographically, then the
/// parity bit with `false < true`.
#[derive(Copy, Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct CompressedPoint {
    /// Big-endian x-coordinate.
    pub x: [u8; 32],

    /// Whether y is odd.
    pub y_parity: bool,
}

impl CompressedPoint {
    /// Length of the wire encoding in bytes.
    pub const SIZE: usize = 33;

    /// Whether this is the canonical identity encoding.
    pub fn is_identity(&self) -> bool {
        self.x == [0; 32] && !self.y_parity
    }

    /// Decode into the projective form, validating the encoding.
    pub fn decompress(&self) -> Result<ProjectivePoint, Error> {
        let x = FieldBytes::from(self.x);
        let affine = AffinePoint::decompress(&x, Choice::from(self.y_parity as u8));
        if let Some(affine) = Option::<AffinePoint>::from(affine) {
            return Ok(ProjectivePoint::from(affine));
        }

        if self.is_identity() {
            Ok(ProjectivePoint::IDENTITY)
        } else {
            Err(Error::InvalidPoint)
        }
    }

    /// Serialize as x followed by a `{0,1}` parity byte.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..32].copy_from_slice(&self.x);
        bytes[32] = self.y_parity as u8;
        bytes
    }

    /// Parse the 33-byte wire encoding. The parity byte must be 0 or 1.
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Result<Self, Error> {
        if bytes[32] > 1 {
            return Err(Error::InvalidPoint);
        }
        let mut x = [0; 32];
        x.copy_from_slice(&bytes[..32]);
        Ok(CompressedPoint {
            x,
            y_parity: bytes[32] == 1,
        })
    }
}

impl From<&ProjectivePoint> for CompressedPoint {
    fn from(point: &ProjectivePoint) -> Self {
        let encoded = point.to_affine().to_encoded_point(true);
        match encoded.coordinates() {
            Coordinates::Compressed { x, y_is_odd } => CompressedPoint {
                x: (*x).into(),
                y_parity: y_is_odd.into(),
            },
            // `to_encoded_point(true)` yields identity or compressed only.
            _ => CompressedPoint::default(),
        }
    }
}

impl From<ProjectivePoint> for CompressedPoint {
    fn from(point: ProjectivePoint) -> Self {
        CompressedPoint::from(&point)
    }
}

#[cfg(test)]
mod tests {
    use super::CompressedPoint;
    use crate::error::Error;
    use elliptic_curve::Group;
    use hex_literal::hex;
    use k256::ProjectivePoint;
    use rand_core::OsRng;

    #[test]
    fn generator_round_trips() {
        let g = ProjectivePoint::GENERATOR;
        let compressed = CompressedPoint::from(&g);
        assert!(!compressed.is_identity());
        assert_eq!(compressed.decompress(), Ok(g));

        let wire = compressed.to_bytes();
        assert_eq!(CompressedPoint::from_bytes(&wire), Ok(compressed));
    }

    #[test]
    fn random_points_round_trip() {
        for _ in 0..16 {
            let p = ProjectivePoint::random(&mut OsRng);
            assert_eq!(CompressedPoint::from(&p).decompress(), Ok(p));
        }
    }

    #[test]
    fn identity_round_trips() {
        let compressed = CompressedPoint::from(&ProjectivePoint::IDENTITY);
        assert_eq!(compressed, CompressedPoint::default());
        assert!(compressed.is_identity());
        assert_eq!(compressed.decompress(), Ok(ProjectivePoint::IDENTITY));
    }

    #[test]
    fn zero_x_with_odd_parity_is_invalid() {
        let encoded = CompressedPoint {
            x: [0; 32],
            y_parity: true,
        };
        assert_eq!(encoded.decompress(), Err(Error::InvalidPoint));
    }

    #[test]
    fn x_off_curve_is_invalid() {
        // No on-curve point has this x-coordinate.
        let encoded = CompressedPoint {
            x: hex!("EEFDEA4CDB677750A420FEE807EACF21EB9898AE79B9768766E4FAA04A2D4A34"),
            y_parity: false,
        };
        assert_eq!(encoded.decompress(), Err(Error::InvalidPoint));
    }

    #[test]
    fn x_at_field_prime_is_invalid() {
        // x equal to (or above) the field prime must be rejected.
        let encoded = CompressedPoint {
            x: hex!("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F"),
            y_parity: false,
        };
        assert_eq!(encoded.decompress(), Err(Error::InvalidPoint));
    }

    #[test]
    fn parity_byte_is_strict() {
        let mut wire = CompressedPoint::from(&ProjectivePoint::GENERATOR).to_bytes();
        wire[32] = 2;
        assert_eq!(CompressedPoint::from_bytes(&wire), Err(Error::InvalidPoint));
    }

    #[test]
    fn ordering_compares_x_then_parity() {
        let a = CompressedPoint {
            x: [0; 32],
            y_parity: false,
        };
        let b = CompressedPoint {
            x: [0; 32],
            y_parity: true,
        };
        let mut x = [0u8; 32];
        x[0] = 1;
        let c = CompressedPoint { x, y_parity: false };
        assert!(a < b);
        assert!(b < c);
    }
}
