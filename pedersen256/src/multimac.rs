//! Multi-scalar multiplication over prepared and casual terms.
//!
//! A [`MultiMac`] plan accumulates *casual* terms (variable base points) and
//! *prepared* terms (precomputed [`Prepared`] tables) and evaluates
//! `sum(k_i * P_i)` in one pass. Two engines share the plan:
//!
//! - **Fast**: a signed-window (wNAF-style) traversal. Each term is
//!   decomposed on the fly into odd multiples anchored at trigger bits;
//!   pending terms are threaded through per-bit bucket lists so the outer
//!   double-and-add loop touches only the terms due at the current bit.
//!   Casual odd-multiple caches are extended lazily.
//! - **Secure**: fixed 4-bit windows. Prepared scalars are blinded up
//!   front, every prepared table read is a conditional-move scan, and the
//!   accumulated blinding offsets are cancelled by precomputed compensation
//!   points after the main loop.
//!
//! Plan capacity is fixed by const generics; no heap allocation occurs.

use crate::{
    context::Context,
    generator::{create_point_nnz, create_point_nnz_from_seed},
    hash::Processor,
    mode::{self, Mode},
    scalar::ScalarBytes,
    SCALAR_BITS,
};
use elliptic_curve::{
    subtle::{ConditionallySelectable, ConstantTimeEq},
    Group,
};
use k256::{AffinePoint, ProjectivePoint, Scalar};
use zeroize::Zeroizing;

const PREPARED_FAST_MAX_ODD: u32 = (1 << 8) - 1;
const PREPARED_FAST_COUNT: usize = (PREPARED_FAST_MAX_ODD as usize >> 1) + 1;
const PREPARED_SECURE_BITS: usize = 4;
const PREPARED_SECURE_COUNT: usize = 1 << PREPARED_SECURE_BITS;

const CASUAL_FAST_MAX_ODD: u32 = (1 << 4) - 1;
pub(crate) const CASUAL_SECURE_BITS: usize = 4;
const CASUAL_SECURE_COUNT: usize = 1 << CASUAL_SECURE_BITS;

/// Table slots per casual term: enough for the secure window table, which
/// subsumes the fast odd-multiple cache.
const CASUAL_COUNT: usize = CASUAL_SECURE_COUNT;

/// Extract the aligned window containing `i_bit`.
fn window(bytes: &[u8; 32], i_bit: usize, bits: usize) -> u8 {
    let base = i_bit & !(bits - 1);
    (bytes[31 - base / 8] >> (base & 7)) & ((1 << bits) - 1) as u8
}

/// Scan `bytes` from bit `bits_remaining - 1` downward, accumulating an odd
/// multiplier no larger than `max_odd` together with the trigger bit at
/// which `odd * 2^bit` contributes. Returns `None` when no set bits remain.
fn get_odd_and_shift(bytes: &[u8; 32], bits_remaining: usize, max_odd: u32) -> Option<(u32, usize)> {
    debug_assert!(max_odd & 1 == 1);

    let mut bits = bits_remaining;
    let mut val = 0u32;
    let mut found = None;

    while bits > 0 {
        bits -= 1;
        val <<= 1;
        if val > max_odd {
            return found;
        }

        if (bytes[31 - bits / 8] >> (bits & 7)) & 1 == 1 {
            val |= 1;
            found = Some((val, bits));
        }
    }

    found
}

/// Pending-term state for the fast traversal.
#[derive(Copy, Clone, Default)]
struct FastAux {
    odd: u32,
    next_item: u32,
}

impl FastAux {
    const INIT: FastAux = FastAux {
        odd: 0,
        next_item: 0,
    };
}

/// Casual-term nums and compensation points shared by all secure-mode
/// casual tables; owned by the [`Context`].
pub struct CasualGenerators {
    /// Offset point seeding every casual window table.
    pub(crate) nums: AffinePoint,

    /// Pre-negated sum of the nums offsets over all windows.
    pub(crate) compensation: AffinePoint,
}

/// Precomputed fixed-base tables for one prepared term.
///
/// Carries a fast table of odd multiples `{P, 3P, ..., 255P}`, a secure
/// window table `{nums, nums + P, ..., nums + 15P}` over a per-table nums
/// point, the secret blinding scalar folded into secure-mode term scalars,
/// and the pre-negated compensation point cancelling both.
pub struct Prepared {
    pub(crate) fast: [AffinePoint; PREPARED_FAST_COUNT],
    secure: [AffinePoint; PREPARED_SECURE_COUNT],
    secure_scalar: Scalar,
    compensation: AffinePoint,
}

impl Prepared {
    /// Derive the base point from a seed label, then build the tables.
    pub(crate) fn from_seed(seed: &str, hp: &mut Processor) -> Self {
        let base = create_point_nnz_from_seed(seed, hp);
        Self::new(&base, hp)
    }

    /// Build the tables for `base`, consuming transcript output for the
    /// secure-side nums point and blinding scalar; retries internally.
    pub(crate) fn new(base: &ProjectivePoint, hp: &mut Processor) -> Self {
        debug_assert_eq!(mode::current(), Mode::Fast);

        let mut fast = [AffinePoint::IDENTITY; PREPARED_FAST_COUNT];
        let double = base.double();
        let mut npos = *base;
        for (i, entry) in fast.iter_mut().enumerate() {
            if i > 0 {
                npos += &double;
            }
            *entry = npos.to_affine();
        }

        loop {
            hp.absorb("nums");
            let _ = hp.finalize();
            let nums = match create_point_nnz(hp) {
                Some(point) => point,
                None => continue,
            };

            hp.absorb("blind-scalar");
            let (secure_scalar, overflow) = ScalarBytes(hp.finalize()).reduce();
            if bool::from(overflow) {
                continue;
            }

            let mut secure = [AffinePoint::IDENTITY; PREPARED_SECURE_COUNT];
            let mut ok = true;
            let mut npos = nums;
            for (i, entry) in secure.iter_mut().enumerate() {
                if bool::from(npos.is_identity()) {
                    ok = false;
                }
                *entry = npos.to_affine();
                if i + 1 < PREPARED_SECURE_COUNT {
                    npos += base;
                }
            }

            let mut this = Prepared {
                fast,
                secure,
                secure_scalar,
                compensation: AffinePoint::IDENTITY,
            };

            // What the secure engine accumulates beyond k * base: the
            // blinding share plus the nums offset picked up at every window.
            let mut npos = {
                let mut mm = MultiMac::<0, 1>::new();
                mm.push_prepared(&this, secure_scalar);
                mm.calculate_internal(None)
            };
            npos += &nums;
            let mut nums_acc = nums;
            for _ in 1..(SCALAR_BITS / PREPARED_SECURE_BITS) {
                for _ in 0..PREPARED_SECURE_BITS {
                    nums_acc = nums_acc.double();
                }
                npos += &nums_acc;
            }

            if bool::from(npos.is_identity()) {
                ok = false;
            }

            if ok {
                this.compensation = (-npos).to_affine();
                return this;
            }
        }
    }

    /// The base point the tables were built for.
    pub fn base(&self) -> ProjectivePoint {
        self.fast[0].into()
    }
}

/// One casual (variable-base) term of a plan.
#[derive(Copy, Clone)]
struct Casual {
    point: ProjectivePoint,
    k: Scalar,
    k_bytes: [u8; 32],
    /// Fast mode: lazily extended odd multiples, `pts[0]` doubling scratch.
    /// Secure mode: the full window table over the casual nums point.
    pts: [ProjectivePoint; CASUAL_COUNT],
    aux: FastAux,
    n_prepared: usize,
}

impl Casual {
    const INIT: Casual = Casual {
        point: ProjectivePoint::IDENTITY,
        k: Scalar::ZERO,
        k_bytes: [0; 32],
        pts: [ProjectivePoint::IDENTITY; CASUAL_COUNT],
        aux: FastAux::INIT,
        n_prepared: 0,
    };
}

/// Multi-scalar multiplication plan with capacity for `NC` casual and `NP`
/// prepared terms. Scratch lives inline; size the plan at the call site.
pub struct MultiMac<'a, const NC: usize, const NP: usize> {
    casual: [Casual; NC],
    n_casual: usize,
    prepared: [Option<&'a Prepared>; NP],
    k_prep: [Scalar; NP],
    aux_prep: [FastAux; NP],
    n_prepared: usize,
}

impl<'a, const NC: usize, const NP: usize> MultiMac<'a, NC, NP> {
    /// Create an empty plan.
    pub fn new() -> Self {
        MultiMac {
            casual: [Casual::INIT; NC],
            n_casual: 0,
            prepared: [None; NP],
            k_prep: [Scalar::ZERO; NP],
            aux_prep: [FastAux::INIT; NP],
            n_prepared: 0,
        }
    }

    /// Drop all terms, keeping the capacity.
    pub fn reset(&mut self) {
        self.n_casual = 0;
        self.n_prepared = 0;
    }

    /// Add the term `k * point`. Panics if the casual capacity is exhausted.
    pub fn push_casual(&mut self, point: ProjectivePoint, k: Scalar) {
        self.casual[self.n_casual] = Casual {
            point,
            k,
            ..Casual::INIT
        };
        self.n_casual += 1;
    }

    /// Add the term `k` times `prepared`'s base. Panics if the prepared
    /// capacity is exhausted.
    pub fn push_prepared(&mut self, prepared: &'a Prepared, k: Scalar) {
        self.prepared[self.n_prepared] = Some(prepared);
        self.k_prep[self.n_prepared] = k;
        self.n_prepared += 1;
    }

    /// Evaluate the plan in the calling thread's current mode.
    ///
    /// Secure mode consumes the term scalars (they are blinded in place);
    /// reset the plan before reuse.
    pub fn calculate(&mut self, ctx: &Context) -> ProjectivePoint {
        self.calculate_internal(Some(ctx.casual_generators()))
    }

    /// Evaluation entry point that does not require a [`Context`]; used
    /// during context construction, where only prepared terms exist.
    pub(crate) fn calculate_internal(
        &mut self,
        casual_gens: Option<&CasualGenerators>,
    ) -> ProjectivePoint {
        debug_assert!(self.n_casual == 0 || casual_gens.is_some());

        match mode::current() {
            Mode::Fast => self.calculate_fast(),
            Mode::Secure => self.calculate_secure(casual_gens),
        }
    }

    fn calculate_fast(&mut self) -> ProjectivePoint {
        let mut res = ProjectivePoint::IDENTITY;

        // Per-bit bucket lists of pending terms, entries linked 1-based.
        let mut tbl_casual = [0u32; SCALAR_BITS];
        let mut tbl_prepared = [0u32; SCALAR_BITS];

        for i in 0..self.n_casual {
            let casual = &mut self.casual[i];
            casual.k_bytes = casual.k.to_bytes().into();
            casual.pts[1] = casual.point;
            casual.n_prepared = 1;
            if let Some((odd, bit)) =
                get_odd_and_shift(&casual.k_bytes, SCALAR_BITS, CASUAL_FAST_MAX_ODD)
            {
                casual.aux.odd = odd;
                casual.aux.next_item = tbl_casual[bit];
                tbl_casual[bit] = (i + 1) as u32;
            }
        }

        let mut k_prep_bytes = [[0u8; 32]; NP];
        for i in 0..self.n_prepared {
            k_prep_bytes[i] = self.k_prep[i].to_bytes().into();
            if let Some((odd, bit)) =
                get_odd_and_shift(&k_prep_bytes[i], SCALAR_BITS, PREPARED_FAST_MAX_ODD)
            {
                self.aux_prep[i].odd = odd;
                self.aux_prep[i].next_item = tbl_prepared[bit];
                tbl_prepared[bit] = (i + 1) as u32;
            }
        }

        for i_bit in (0..SCALAR_BITS).rev() {
            if !bool::from(res.is_identity()) {
                res = res.double();
            }

            while tbl_casual[i_bit] != 0 {
                let entry = tbl_casual[i_bit] as usize;
                let casual = &mut self.casual[entry - 1];
                tbl_casual[i_bit] = casual.aux.next_item;

                debug_assert!(casual.aux.odd & 1 == 1);
                let n_elem = (casual.aux.odd as usize >> 1) + 1;

                while casual.n_prepared < n_elem {
                    if casual.n_prepared == 1 {
                        casual.pts[0] = casual.pts[1].double();
                    }
                    casual.pts[casual.n_prepared + 1] =
                        casual.pts[casual.n_prepared] + casual.pts[0];
                    casual.n_prepared += 1;
                }

                res += casual.pts[n_elem];

                if let Some((odd, bit)) =
                    get_odd_and_shift(&casual.k_bytes, i_bit, CASUAL_FAST_MAX_ODD)
                {
                    debug_assert!(bit < i_bit);
                    casual.aux.odd = odd;
                    casual.aux.next_item = tbl_casual[bit];
                    tbl_casual[bit] = entry as u32;
                }
            }

            while tbl_prepared[i_bit] != 0 {
                let entry = tbl_prepared[i_bit] as usize;
                let aux = self.aux_prep[entry - 1];
                tbl_prepared[i_bit] = aux.next_item;

                debug_assert!(aux.odd & 1 == 1);
                let n_elem = aux.odd as usize >> 1;

                if let Some(prepared) = self.prepared[entry - 1] {
                    res += &prepared.fast[n_elem];
                }

                if let Some((odd, bit)) =
                    get_odd_and_shift(&k_prep_bytes[entry - 1], i_bit, PREPARED_FAST_MAX_ODD)
                {
                    debug_assert!(bit < i_bit);
                    self.aux_prep[entry - 1].odd = odd;
                    self.aux_prep[entry - 1].next_item = tbl_prepared[bit];
                    tbl_prepared[bit] = entry as u32;
                }
            }
        }

        res
    }

    fn calculate_secure(&mut self, casual_gens: Option<&CasualGenerators>) -> ProjectivePoint {
        if let Some(gens) = casual_gens {
            for casual in self.casual[..self.n_casual].iter_mut() {
                casual.pts[0] = gens.nums.into();
                for i in 1..CASUAL_SECURE_COUNT {
                    casual.pts[i] = casual.pts[i - 1] + casual.point;
                }
                casual.k_bytes = casual.k.to_bytes().into();
            }
        }

        let mut k_prep_bytes = Zeroizing::new([[0u8; 32]; NP]);
        for i in 0..self.n_prepared {
            if let Some(prepared) = self.prepared[i] {
                self.k_prep[i] += prepared.secure_scalar;
                k_prep_bytes[i] = self.k_prep[i].to_bytes().into();
            }
        }

        let mut res = ProjectivePoint::IDENTITY;

        for i_bit in (0..SCALAR_BITS).rev() {
            if !bool::from(res.is_identity()) {
                res = res.double();
            }

            if i_bit & (CASUAL_SECURE_BITS - 1) == 0 {
                for casual in self.casual[..self.n_casual].iter() {
                    let sel = window(&casual.k_bytes, i_bit, CASUAL_SECURE_BITS);
                    // The window table is small and lives on the caller's
                    // stack; its addresses are not attacker-predictable the
                    // way the long-lived prepared tables are.
                    res += casual.pts[sel as usize];
                }
            }

            if i_bit & (PREPARED_SECURE_BITS - 1) == 0 {
                for (prepared, k_bytes) in self.prepared[..self.n_prepared]
                    .iter()
                    .flatten()
                    .zip(k_prep_bytes.iter())
                {
                    let sel = window(k_bytes, i_bit, PREPARED_SECURE_BITS);
                    let mut chosen = AffinePoint::IDENTITY;
                    for (i, pt) in prepared.secure.iter().enumerate() {
                        chosen.conditional_assign(pt, (i as u8).ct_eq(&sel));
                    }
                    res += &chosen;
                }
            }
        }

        for prepared in self.prepared[..self.n_prepared].iter().flatten() {
            res += &prepared.compensation;
        }

        if let Some(gens) = casual_gens {
            for _ in 0..self.n_casual {
                res += &gens.compensation;
            }
        }

        res
    }
}

impl<'a, const NC: usize, const NP: usize> Default for MultiMac<'a, NC, NP> {
    fn default() -> Self {
        Self::new()
    }
}

/// Variable-base multiplication `k * point` through a one-term plan,
/// honoring the calling thread's execution mode.
pub fn point_mul(ctx: &Context, point: &ProjectivePoint, k: &Scalar) -> ProjectivePoint {
    let mut mm = MultiMac::<1, 0>::new();
    mm.push_casual(*point, *k);
    mm.calculate(ctx)
}

#[cfg(test)]
mod tests {
    use super::get_odd_and_shift;
    use crate::ScalarBytes;
    use elliptic_curve::Field;
    use k256::Scalar;

    /// Rebuild a scalar by replaying the wNAF decomposition with scalar
    /// arithmetic alone: double at every bit, add the pending odd value at
    /// its trigger bit.
    fn recompose(bytes: &[u8; 32], max_odd: u32) -> Scalar {
        let mut res = Scalar::ZERO;
        let mut pending = get_odd_and_shift(bytes, 256, max_odd);
        for i_bit in (0..256).rev() {
            res = res.double();
            if let Some((odd, bit)) = pending {
                if bit == i_bit {
                    res += Scalar::from(odd);
                    pending = get_odd_and_shift(bytes, i_bit, max_odd);
                }
            }
        }
        res
    }

    #[test]
    fn odd_and_shift_of_zero_is_none() {
        assert_eq!(get_odd_and_shift(&[0; 32], 256, 0xff), None);
    }

    #[test]
    fn odd_and_shift_of_one() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        assert_eq!(get_odd_and_shift(&bytes, 256, 0xff), Some((1, 0)));
    }

    #[test]
    fn wnaf_decomposition_recomposes() {
        for (fill, max_odd) in [(0x5au8, 0xffu32), (0xa5, 0xf), (0xff, 0xf), (0x01, 0xff)] {
            // Keep the value below the group order so the import is exact.
            let mut bytes = [fill; 32];
            bytes[0] = 0;
            let (expected, overflow) = ScalarBytes(bytes).reduce();
            assert!(!bool::from(overflow));
            assert_eq!(recompose(&bytes, max_odd), expected);
        }
    }
}
