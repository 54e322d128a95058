//! Schnorr signatures with `(challenge, response)` encoding.
//!
//! The signature stores the challenge scalar `e` rather than the public
//! nonce: verification reconstructs `R = k * G + e * P` and accepts iff the
//! transcript challenge of `R` reproduces `e`. The split [`MultiSig`] /
//! [`Signature::co_sign`] flow lets cooperating signers combine nonces
//! before producing partial responses over the shared public nonce.

use crate::{
    context::Context,
    error::Error,
    hash::Value,
    mode::{self, Mode},
    multimac::point_mul,
    nonce,
    oracle::Oracle,
    scalar::ScalarBytes,
};
use elliptic_curve::Group;
use k256::{ProjectivePoint, Scalar};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Schnorr signature `(e, k)`: challenge and response, canonically encoded.
///
/// The derived ordering is lexicographic on `(e, k)`.
#[derive(Copy, Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Signature {
    /// Challenge scalar.
    pub e: ScalarBytes,

    /// Response scalar.
    pub k: ScalarBytes,
}

/// Signing-session state: the secret nonce and the (possibly combined)
/// public nonce. The secret half is wiped on drop.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct MultiSig {
    /// Secret nonce.
    pub nonce: Scalar,

    /// Public nonce `R`; for cooperative signing, the sum of all parties'
    /// `r_i * G`.
    #[zeroize(skip)]
    pub nonce_pub: ProjectivePoint,
}

impl MultiSig {
    /// Derive this party's deterministic nonce for `(msg, sk)`.
    ///
    /// Does not touch [`nonce_pub`][Self::nonce_pub]; the caller sets it
    /// from `r * G` (and the other parties' shares, if any).
    pub fn generate_nonce(&mut self, msg: &Value, sk: &Scalar) {
        let sk_bytes = Zeroizing::new(ScalarBytes::from(sk));
        self.nonce = nonce::generate_scalar(sk_bytes.as_bytes(), msg, None, 0);
    }
}

impl Signature {
    /// Length of the wire encoding in bytes.
    pub const SIZE: usize = 64;

    /// Transcript challenge for a public nonce and message.
    pub fn get_challenge(nonce_pub: &ProjectivePoint, msg: &Value) -> Scalar {
        let mut oracle = Oracle::new();
        oracle.absorb(nonce_pub).absorb(msg);
        oracle.challenge()
    }

    /// Produce this party's partial response over the session's combined
    /// public nonce, recording the challenge in `self.e`.
    ///
    /// Returns `r - e * sk`; single signers store it via [`sign`][Self::sign],
    /// cooperating signers sum the parties' partial responses into `k`.
    pub fn co_sign(&mut self, msg: &Value, sk: &Scalar, msig: &MultiSig) -> Scalar {
        let e = Self::get_challenge(&msig.nonce_pub, msg);
        self.e = ScalarBytes::from(e);

        let mut k = e;
        k *= sk;
        k = -k;
        k += &msig.nonce;
        k
    }

    /// Sign `msg` with `sk` using a deterministic nonce.
    ///
    /// Runs the fixed-base multiplication for the public nonce in the
    /// calling thread's mode; signing belongs in `Secure` mode.
    pub fn sign(ctx: &Context, msg: &Value, sk: &Scalar) -> Self {
        let mut msig = MultiSig::default();
        msig.generate_nonce(msg, sk);
        msig.nonce_pub = ctx.g().mul(&msig.nonce);

        let mut sig = Signature::default();
        let k = sig.co_sign(msg, sk, &msig);
        sig.k = ScalarBytes::from(k);
        sig
    }

    /// Reconstruct the public nonce `k * G + e * pk` this signature commits
    /// to. Public data; runs in `Fast` mode.
    pub fn get_public_nonce(&self, ctx: &Context, pk: &ProjectivePoint) -> ProjectivePoint {
        let _scope = mode::Scope::new(Mode::Fast);

        let (k, _) = self.k.reduce();
        let (e, _) = self.e.reduce();

        let mut nonce_pub = ctx.g().mul(&k);
        nonce_pub += point_mul(ctx, pk, &e);
        nonce_pub
    }

    /// Verify against a message and public key.
    pub fn is_valid(&self, ctx: &Context, msg: &Value, pk: &ProjectivePoint) -> bool {
        let nonce_pub = self.get_public_nonce(ctx, pk);
        let e2 = Self::get_challenge(&nonce_pub, msg);
        ScalarBytes::from(e2) == self.e
    }

    /// Partial verification for cooperative signing: check that this
    /// signature's reconstructed nonce equals an externally agreed one.
    pub fn is_valid_partial(
        &self,
        ctx: &Context,
        nonce_pub: &ProjectivePoint,
        pk: &ProjectivePoint,
    ) -> bool {
        let reconstructed = self.get_public_nonce(ctx, pk);
        bool::from((reconstructed - nonce_pub).is_identity())
    }

    /// Serialize as `e` followed by `k`.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..32].copy_from_slice(self.e.as_bytes());
        bytes[32..].copy_from_slice(self.k.as_bytes());
        bytes
    }

    /// Parse the 64-byte wire encoding.
    ///
    /// Out-of-range components are representable and fail verification, so
    /// parsing itself is infallible.
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut e = [0; 32];
        let mut k = [0; 32];
        e.copy_from_slice(&bytes[..32]);
        k.copy_from_slice(&bytes[32..]);
        Signature {
            e: ScalarBytes(e),
            k: ScalarBytes(k),
        }
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: &[u8; Self::SIZE] = bytes.try_into().map_err(|_| Error::InvalidScalar)?;
        Ok(Self::from_bytes(bytes))
    }
}
