//! Pedersen commitments, Schnorr signatures and a dual-mode multi-scalar
//! multiplication engine over the secp256k1 elliptic curve.
//!
//! The curve arithmetic itself comes from the [`k256`] crate; this crate
//! implements the protocol layer above it for confidential transactions:
//!
//! - canonical [`ScalarBytes`] and [`CompressedPoint`] encodings with
//!   strict validation;
//! - a re-seedable [`hash::Processor`] transcript and the Fiat-Shamir
//!   [`Oracle`] drawing unbiased scalars from it;
//! - RFC 6979 deterministic [`nonce`]s and master-secret key derivation;
//! - precomputed fixed-base [`generator`] tables with a blinded variant;
//! - [`MultiMac`], multi-scalar multiplication over prepared and casual
//!   terms with a fast wNAF engine and a constant-time windowed engine;
//! - the deterministically derived, checksummed [`Context`] singleton;
//! - Pedersen [`commitment`]s, [`Signature`]s (single and cooperative
//!   signers) and the disclosed-amount [`range_proof`].
//!
//! Execution mode is a scoped thread-local ([`mode::Scope`]): operations on
//! secret scalars run in [`Mode::Secure`] (the default) with uniform table
//! access and blinded fixed bases; verification paths enter [`Mode::Fast`]
//! locally.
//!
//! # Usage
//!
//! ```
//! use pedersen256::{commitment, range_proof, Context, Oracle, ScalarBytes, Signature};
//! use sha2::{Digest, Sha256};
//!
//! let ctx = Context::get();
//!
//! // Pedersen commitment to an amount under a blinding factor.
//! let (sk, _) = ScalarBytes(Sha256::digest(b"blind").into()).reduce();
//! let value = 1000;
//! let commitment = commitment::commit(ctx, &sk, value);
//!
//! // Prove the disclosed amount, then verify against the commitment.
//! let mut oracle = Oracle::new();
//! let proof = range_proof::Public::create(ctx, &sk, value, &mut oracle);
//!
//! let mut oracle = Oracle::new();
//! assert!(proof.is_valid(ctx, &commitment, &mut oracle));
//!
//! // Plain Schnorr signature under the same key.
//! let msg: [u8; 32] = Sha256::digest(b"message").into();
//! let sig = Signature::sign(ctx, &msg, &sk);
//! assert!(sig.is_valid(ctx, &msg, &ctx.g().mul(&sk)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod commitment;
pub mod context;
pub mod error;
pub mod generator;
pub mod hash;
pub mod mode;
pub mod multimac;
pub mod nonce;
pub mod oracle;
pub mod point;
pub mod range_proof;
pub mod scalar;
pub mod signature;

pub use k256;
pub use k256::{AffinePoint, ProjectivePoint, Scalar};

pub use crate::{
    commitment::Commitment,
    context::Context,
    error::{Error, Result},
    generator::Obscured,
    mode::Mode,
    multimac::{point_mul, MultiMac, Prepared},
    oracle::Oracle,
    point::CompressedPoint,
    scalar::ScalarBytes,
    signature::{MultiSig, Signature},
};

use rand_core::{OsRng, RngCore};
use zeroize::Zeroize;

/// Unsigned 64-bit confidential amount.
pub type Amount = u64;

/// Scalar width in bits.
pub(crate) const SCALAR_BITS: usize = 256;

/// Fill `dest` from the OS entropy source.
///
/// The only operation in this crate that can fail for non-cryptographic
/// reasons; a missing or short-reading entropy source yields [`Error::Io`].
pub fn gen_random(dest: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(dest).map_err(|_| Error::Io)
}

/// Wipe secret bytes.
///
/// Delegates to [`zeroize`], whose volatile writes and compiler fences keep
/// the stores from being elided as dead.
pub fn secure_erase(bytes: &mut [u8]) {
    bytes.zeroize();
}
