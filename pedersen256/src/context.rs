//! Process-wide generator context.
//!
//! All generators are derived deterministically from fixed string seeds
//! through a single hash transcript, in one pass and in a fixed order, so
//! that independent processes (and independent implementations following the
//! same derivation) agree on every table byte-for-byte. The final transcript
//! digest is kept as a checksum committing to the whole derivation.

use crate::{
    generator::{create_point_nnz_from_seed, Obscured},
    hash::{Processor, Value},
    mode::{self, Mode},
    multimac::{CasualGenerators, MultiMac, Prepared, CASUAL_SECURE_BITS},
    SCALAR_BITS,
};
use k256::{AffinePoint, ProjectivePoint, Scalar};
use std::sync::OnceLock;

/// Inner-product generator dimension: one generator pair per bit of a
/// confidential amount.
const DIM: usize = 64;

/// Generator tables for the inner-product argument of the range-proof
/// system, plus the auxiliary and dot generators shared with the rest of
/// the protocol.
pub struct InnerProductGenerators {
    /// `gen[i][j]` is the table for dimension `i`, side `j`.
    gen: Box<[[Prepared; 2]]>,

    /// Negated first table entries of side 1, kept compact for verifiers.
    get1_minus: [AffinePoint; DIM],

    /// Table over the negated sum of side-0 base points.
    aux2: Prepared,

    /// The "dot" generator; its base also serves as the casual-term nums
    /// point.
    gen_dot: Prepared,
}

impl InnerProductGenerators {
    /// Number of generator pairs.
    pub const DIM: usize = DIM;

    /// Table for dimension `i` (`< DIM`), side `j` (`< 2`).
    pub fn generator(&self, j: usize, i: usize) -> &Prepared {
        &self.gen[i][j]
    }

    /// Negated base point of side 1, dimension `i`.
    pub fn get1_minus(&self, i: usize) -> &AffinePoint {
        &self.get1_minus[i]
    }

    /// Auxiliary generator over the negated side-0 base-point sum.
    pub fn aux2(&self) -> &Prepared {
        &self.aux2
    }

    /// The dot generator.
    pub fn gen_dot(&self) -> &Prepared {
        &self.gen_dot
    }
}

/// Immutable, deterministically derived generator context.
///
/// Construct once per process via [`Context::get`] before any signing or
/// verification; all later access is read-only and safe to share across
/// threads.
pub struct Context {
    g: Obscured,
    h: Obscured,
    h_big: Obscured,
    ipp: InnerProductGenerators,
    casual: CasualGenerators,
    checksum: Value,
}

impl Context {
    /// The process-wide context, derived on first use.
    pub fn get() -> &'static Self {
        static CONTEXT: OnceLock<Context> = OnceLock::new();
        CONTEXT.get_or_init(Context::new)
    }

    /// Run the full generator derivation.
    ///
    /// Expensive (it builds every precomputed table); outside of
    /// cross-checking determinism there is no reason to call this instead
    /// of [`Context::get`]. The result depends on nothing but the
    /// derivation itself.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let _scope = mode::Scope::new(Mode::Fast);

        let mut hp = Processor::new();

        let g_raw = create_point_nnz_from_seed("G-gen", &mut hp);
        let h_raw = create_point_nnz_from_seed("H-gen", &mut hp);

        let g = Obscured::initialize(&g_raw, &mut hp);
        let h = Obscured::initialize(&h_raw, &mut hp);
        let h_big = Obscured::initialize(&h_raw, &mut hp);

        let mut aux2_accum = ProjectivePoint::IDENTITY;
        let mut get1_minus = [AffinePoint::IDENTITY; DIM];
        let mut gen = Vec::with_capacity(DIM);

        for i in 0..DIM {
            let gen0 = Prepared::from_seed(&format!("ip-{:02}0", i), &mut hp);
            aux2_accum += &gen0.fast[0];

            let gen1 = Prepared::from_seed(&format!("ip-{:02}1", i), &mut hp);
            get1_minus[i] = (-ProjectivePoint::from(gen1.fast[0])).to_affine();

            gen.push([gen0, gen1]);
        }

        let aux2_base = -aux2_accum;
        hp.absorb("aux2");
        let aux2 = Prepared::new(&aux2_base, &mut hp);

        let gen_dot = Prepared::from_seed("ip-dot", &mut hp);
        let nums = gen_dot.fast[0];

        // The scalar with a bit set at every secure-window boundary: the
        // multiplicity with which the casual nums point leaks into a
        // secure-mode accumulation.
        let mut k = Scalar::ZERO;
        for i in (0..SCALAR_BITS).rev() {
            k = k + k;
            if i % CASUAL_SECURE_BITS == 0 {
                k += Scalar::ONE;
            }
        }
        k = -k;

        let compensation = {
            let mut mm = MultiMac::<0, 1>::new();
            mm.push_prepared(&gen_dot, k);
            mm.calculate_internal(None).to_affine()
        };

        hp.absorb(&0u32); // bump when any derivation above changes
        let checksum = hp.finalize();

        Context {
            g,
            h,
            h_big,
            ipp: InnerProductGenerators {
                gen: gen.into_boxed_slice(),
                get1_minus,
                aux2,
                gen_dot,
            },
            casual: CasualGenerators { nums, compensation },
            checksum,
        }
    }

    /// The blinding-factor generator `G`.
    pub fn g(&self) -> &Obscured {
        &self.g
    }

    /// The value generator `H`.
    pub fn h(&self) -> &Obscured {
        &self.h
    }

    /// Wide-window variant of `H`.
    pub fn h_big(&self) -> &Obscured {
        &self.h_big
    }

    /// Inner-product generator tables.
    pub fn ipp(&self) -> &InnerProductGenerators {
        &self.ipp
    }

    /// Digest committing to the entire generator derivation.
    pub fn checksum(&self) -> &Value {
        &self.checksum
    }

    pub(crate) fn casual_generators(&self) -> &CasualGenerators {
        &self.casual
    }
}
