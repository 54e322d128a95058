//! Precomputed fixed-base generator tables.
//!
//! A table covers the full 256-bit scalar range in 4-bit levels: level `L`
//! holds sixteen points stepping by `2^(4L)` times the base, each offset by
//! a per-level share of a transcript-derived "nothing-up-my-sleeve" point.
//! The offsets telescope to zero across levels, so selecting one entry per
//! nibble of a scalar and summing yields exactly `k * base` while no single
//! level's contents reveal a clean multiple of the base.
//!
//! [`Obscured`] additionally blinds the *scalar*: multiplications run on
//! `k - beta` against a precomputed `beta * base` correction, so the nibbles
//! driving table selection are never those of `k` itself.

use crate::{
    hash::Processor,
    mode::{self, Mode},
    point::CompressedPoint,
    scalar::ScalarBytes,
    SCALAR_BITS,
};
use elliptic_curve::{
    subtle::{ConditionallySelectable, ConstantTimeEq},
    Group,
};
use k256::{AffinePoint, ProjectivePoint, Scalar};
use zeroize::Zeroizing;

/// Scalar bits consumed per table level.
pub(crate) const BITS_PER_LEVEL: usize = 4;

/// Entries per table level.
pub(crate) const POINTS_PER_LEVEL: usize = 1 << BITS_PER_LEVEL;

/// Number of levels covering a full scalar.
pub(crate) const LEVELS: usize = SCALAR_BITS / BITS_PER_LEVEL;

const TABLE_SIZE: usize = LEVELS * POINTS_PER_LEVEL;

/// Draw a digest from the transcript and try to interpret it as the
/// x-coordinate of a non-identity curve point with even y.
pub(crate) fn create_point_nnz(hp: &mut Processor) -> Option<ProjectivePoint> {
    let candidate = CompressedPoint {
        x: hp.finalize(),
        y_parity: false,
    };
    match candidate.decompress() {
        Ok(point) if !bool::from(point.is_identity()) => Some(point),
        _ => None,
    }
}

/// Derive a non-identity point from a seed label, redrawing until the
/// digest decodes. Roughly half of all digests succeed.
pub(crate) fn create_point_nnz_from_seed(seed: &str, hp: &mut Processor) -> ProjectivePoint {
    hp.absorb(seed);
    loop {
        if let Some(point) = create_point_nnz(hp) {
            return point;
        }
    }
}

/// One construction attempt for the full windowed table over `gpos`.
///
/// Returns `false` (leaving the transcript advanced) if the drawn nums
/// point is unusable or any intermediate lands on the identity; the caller
/// retries with the mutated transcript.
pub(crate) fn create_pts(
    pts: &mut [AffinePoint; TABLE_SIZE],
    mut gpos: ProjectivePoint,
    hp: &mut Processor,
) -> bool {
    hp.absorb("nums");
    let mut nums = match create_point_nnz(hp) {
        Some(point) => point,
        None => return false,
    };
    nums += &gpos;

    let mut npos = nums;
    let mut idx = 0;

    for level in 1..=LEVELS {
        let mut pt = npos;
        for entry in 1..=POINTS_PER_LEVEL {
            if bool::from(pt.is_identity()) {
                return false;
            }
            pts[idx] = pt.to_affine();
            idx += 1;
            if entry < POINTS_PER_LEVEL {
                pt += &gpos;
            }
        }

        if level == LEVELS {
            break;
        }

        for _ in 0..BITS_PER_LEVEL {
            gpos = gpos.double();
        }

        npos = npos.double();
        if level + 1 == LEVELS {
            // Close the telescope: the last level carries the negated
            // running offset plus the original nums point.
            npos = -npos;
            npos += &nums;
        }
    }

    true
}

/// Accumulate `k` times the table's base into `res`, walking the scalar's
/// nibbles from least to most significant.
///
/// In `Fast` mode each level is indexed directly. In `Secure` mode every
/// level is read with a conditional move across all sixteen entries: any
/// use of secret values in array indexes has been demonstrated to produce
/// timing sidechannels even with uniform cache-line access patterns.
///
/// With `b_set` the first level overwrites `res`; later levels always
/// accumulate.
pub(crate) fn set_mul(
    res: &mut ProjectivePoint,
    mut b_set: bool,
    pts: &[AffinePoint; TABLE_SIZE],
    k: &Scalar,
) {
    let secure = mode::current() == Mode::Secure;
    let bytes = Zeroizing::new(<[u8; 32]>::from(k.to_bytes()));

    for (level, entries) in pts.chunks_exact(POINTS_PER_LEVEL).enumerate() {
        let byte = bytes[31 - level / 2];
        let sel = if level % 2 == 0 { byte & 0xf } else { byte >> 4 };

        let entry = if secure {
            let mut chosen = AffinePoint::IDENTITY;
            for (i, pt) in entries.iter().enumerate() {
                chosen.conditional_assign(pt, (i as u8).ct_eq(&sel));
            }
            chosen
        } else {
            entries[sel as usize]
        };

        if b_set {
            *res = entry.into();
            b_set = false;
        } else {
            *res += &entry;
        }
    }
}

/// Fixed-base table paired with a blinding scalar.
///
/// Holds the windowed table for the base point, a secret scalar `beta`
/// (stored negated) and the precomputed point `beta * base`. Secure-mode
/// multiplications compute `beta * base + (k - beta) * base`, so `k` never
/// drives a table lookup directly.
pub struct Obscured {
    pts: [AffinePoint; TABLE_SIZE],
    /// `-beta`.
    add_scalar: Scalar,
    /// `beta * base`.
    add_pt: AffinePoint,
}

impl Obscured {
    /// Build the table and blinding pair for `base`, consuming transcript
    /// output; retries internally until every derivation step succeeds.
    pub(crate) fn initialize(base: &ProjectivePoint, hp: &mut Processor) -> Self {
        let mut pts = [AffinePoint::IDENTITY; TABLE_SIZE];

        loop {
            if !create_pts(&mut pts, *base, hp) {
                continue;
            }

            hp.absorb("blind-scalar");
            let (blind, overflow) = ScalarBytes(hp.finalize()).reduce();
            if bool::from(overflow) {
                continue;
            }

            let mut blind_pt = ProjectivePoint::IDENTITY;
            set_mul(&mut blind_pt, true, &pts, &blind);

            return Obscured {
                pts,
                add_scalar: -blind,
                add_pt: blind_pt.to_affine(),
            };
        }
    }

    /// Set or accumulate `k` times the base into `res`.
    pub fn assign(&self, res: &mut ProjectivePoint, b_set: bool, k: &Scalar) {
        if mode::current() == Mode::Secure {
            if b_set {
                *res = self.add_pt.into();
            } else {
                *res += &self.add_pt;
            }

            let blinded = Zeroizing::new(k + &self.add_scalar);
            set_mul(res, false, &self.pts, &blinded);
        } else {
            set_mul(res, b_set, &self.pts, k);
        }
    }

    /// `k` times the base.
    pub fn mul(&self, k: &Scalar) -> ProjectivePoint {
        let mut res = ProjectivePoint::IDENTITY;
        self.assign(&mut res, true, k);
        res
    }
}

#[cfg(test)]
mod tests {
    use super::{create_pts, set_mul, Obscured, TABLE_SIZE};
    use crate::mode::{Mode, Scope};
    use crate::hash::Processor;
    use elliptic_curve::Field;
    use k256::{AffinePoint, ProjectivePoint, Scalar};
    use rand_core::OsRng;

    fn test_table() -> [AffinePoint; TABLE_SIZE] {
        let mut hp = Processor::new();
        hp.absorb("table-test");
        let mut pts = [AffinePoint::IDENTITY; TABLE_SIZE];
        while !create_pts(&mut pts, ProjectivePoint::GENERATOR, &mut hp) {}
        pts
    }

    #[test]
    fn set_mul_agrees_with_native_mul_in_both_modes() {
        let pts = test_table();
        for k in [Scalar::ZERO, Scalar::ONE, -Scalar::ONE, Scalar::random(&mut OsRng)] {
            let expected = ProjectivePoint::GENERATOR * k;

            let mut fast = ProjectivePoint::IDENTITY;
            {
                let _scope = Scope::new(Mode::Fast);
                set_mul(&mut fast, true, &pts, &k);
            }

            let mut secure = ProjectivePoint::IDENTITY;
            {
                let _scope = Scope::new(Mode::Secure);
                set_mul(&mut secure, true, &pts, &k);
            }

            assert_eq!(fast, expected);
            assert_eq!(secure, expected);
        }
    }

    #[test]
    fn set_mul_accumulates_without_b_set() {
        let pts = test_table();
        let k = Scalar::random(&mut OsRng);
        let offset = ProjectivePoint::GENERATOR * Scalar::from(5u32);

        let mut res = offset;
        set_mul(&mut res, false, &pts, &k);
        assert_eq!(res, offset + ProjectivePoint::GENERATOR * k);
    }

    #[test]
    fn obscured_matches_naked_mul_in_both_modes() {
        let mut hp = Processor::new();
        hp.absorb("obscured-test");
        let obscured = Obscured::initialize(&ProjectivePoint::GENERATOR, &mut hp);

        let k = Scalar::random(&mut OsRng);
        let expected = ProjectivePoint::GENERATOR * k;

        let fast = {
            let _scope = Scope::new(Mode::Fast);
            obscured.mul(&k)
        };
        let secure = {
            let _scope = Scope::new(Mode::Secure);
            obscured.mul(&k)
        };

        assert_eq!(fast, expected);
        assert_eq!(secure, expected);
    }
}
