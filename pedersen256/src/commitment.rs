//! Pedersen commitments.

use crate::{context::Context, Amount};
use k256::{ProjectivePoint, Scalar};

/// Pedersen commitment `k * G + value * H` to a 64-bit amount under a
/// secret blinding factor.
#[derive(Clone)]
pub struct Commitment {
    /// Blinding factor.
    pub k: Scalar,

    /// Committed amount.
    pub value: Amount,
}

impl Commitment {
    /// Set or accumulate the commitment point into `res`.
    ///
    /// Both fixed-base multiplications honor the calling thread's execution
    /// mode; commitment creation operates on the secret blinding factor and
    /// belongs in `Secure` mode.
    pub fn assign(&self, ctx: &Context, res: &mut ProjectivePoint, b_set: bool) {
        ctx.g().assign(res, b_set, &self.k);
        ctx.h().assign(res, false, &Scalar::from(self.value));
    }

    /// The commitment point.
    pub fn commit(&self, ctx: &Context) -> ProjectivePoint {
        let mut res = ProjectivePoint::IDENTITY;
        self.assign(ctx, &mut res, true);
        res
    }
}

/// Commit to `value` under the blinding factor `k`.
pub fn commit(ctx: &Context, k: &Scalar, value: Amount) -> ProjectivePoint {
    Commitment { k: *k, value }.commit(ctx)
}
