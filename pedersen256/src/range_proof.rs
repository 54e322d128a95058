//! Range proofs over committed amounts.
//!
//! Only the disclosed-amount ("public") variant lives here: the amount is
//! revealed and the proof demonstrates knowledge of the blinding factor of
//! `commitment - value * H`, which ties the commitment to exactly that
//! amount.

use crate::{
    context::Context,
    mode::{self, Mode},
    oracle::Oracle,
    signature::Signature,
    Amount,
};
use k256::{ProjectivePoint, Scalar};

/// `commitment - value * H`: the public key whose secret is the
/// commitment's blinding factor.
fn pt_minus_val(ctx: &Context, commitment: &ProjectivePoint, value: Amount) -> ProjectivePoint {
    let mut res = *commitment;
    let mut amount_pt = ctx.h().mul(&Scalar::from(value));
    amount_pt = -amount_pt;
    res += amount_pt;
    res
}

/// Disclosed-amount range proof: the amount in clear plus a signature by
/// the commitment's blinding factor.
///
/// The derived ordering is `(value, signature)`.
#[derive(Copy, Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Public {
    /// Disclosed amount.
    pub value: Amount,

    /// Signature over the oracle-drawn message by the blinding factor.
    pub signature: Signature,
}

impl Public {
    /// Smallest amount a proof may disclose.
    pub const MINIMUM_VALUE: Amount = 1;

    /// Length of the wire encoding in bytes.
    pub const SIZE: usize = 8 + Signature::SIZE;

    /// Prove `value` for a commitment with blinding factor `sk`.
    ///
    /// Draws the signed message from `oracle`, which the verifier must
    /// replay identically. `value` must be at least
    /// [`MINIMUM_VALUE`][Self::MINIMUM_VALUE].
    pub fn create(ctx: &Context, sk: &Scalar, value: Amount, oracle: &mut Oracle) -> Self {
        debug_assert!(value >= Self::MINIMUM_VALUE);

        let hv = oracle.absorb(&value).digest();
        Public {
            value,
            signature: Signature::sign(ctx, &hv, sk),
        }
    }

    /// Verify against the commitment this proof claims to open.
    ///
    /// Mutates `oracle` exactly as [`create`][Self::create] does on
    /// success; an undersized value rejects before the oracle is touched.
    pub fn is_valid(&self, ctx: &Context, commitment: &ProjectivePoint, oracle: &mut Oracle) -> bool {
        let _scope = mode::Scope::new(Mode::Fast);

        if self.value < Self::MINIMUM_VALUE {
            return false;
        }

        let pk = pt_minus_val(ctx, commitment, self.value);
        let hv = oracle.absorb(&self.value).digest();
        self.signature.is_valid(ctx, &hv, &pk)
    }

    /// Serialize as the big-endian amount followed by the signature.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..8].copy_from_slice(&self.value.to_be_bytes());
        bytes[8..].copy_from_slice(&self.signature.to_bytes());
        bytes
    }

    /// Parse the 72-byte wire encoding.
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut value = [0; 8];
        value.copy_from_slice(&bytes[..8]);
        let mut sig = [0; Signature::SIZE];
        sig.copy_from_slice(&bytes[8..]);
        Public {
            value: Amount::from_be_bytes(value),
            signature: Signature::from_bytes(&sig),
        }
    }
}
