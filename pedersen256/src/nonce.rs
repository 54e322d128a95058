//! Deterministic nonce generation and key derivation.
//!
//! Nonces follow the RFC 6979 HMAC-DRBG construction: the generator is
//! seeded with the secret key and message (plus an optional second message),
//! and candidates are read off the output stream. An `attempt` counter
//! selects later candidates so that a caller who must discard a nonce (for
//! protocol reasons) can deterministically obtain the next one.

use crate::{
    hash::{Processor, Value},
    scalar::ScalarBytes,
};
use k256::Scalar;
use rfc6979::HmacDrbg;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

fn drbg(sk: &[u8; 32], msg: &[u8; 32], msg2: Option<&[u8; 32]>) -> HmacDrbg<Sha256> {
    match msg2 {
        Some(msg2) => HmacDrbg::new(sk, msg, msg2),
        None => HmacDrbg::new(sk, msg, &[]),
    }
}

/// Deterministic 32-byte nonce: the `attempt + 1`-st output of the DRBG
/// seeded with `(sk, msg, msg2)`.
///
/// `msg2` extends the seed for callers that bind a second message; any
/// convention around its use is the caller's to document, and both parties
/// must agree on it.
pub fn generate_bytes(
    sk: &[u8; 32],
    msg: &[u8; 32],
    msg2: Option<&[u8; 32]>,
    attempt: u32,
) -> [u8; 32] {
    let mut drbg = drbg(sk, msg, msg2);
    let mut out = [0; 32];
    for _ in 0..=attempt {
        drbg.fill_bytes(&mut out);
    }
    out
}

/// Deterministic nonce as a valid scalar.
///
/// Candidates whose canonical import overflows are skipped without
/// consuming the attempt counter, so the result is always a faithful
/// reduction-free import of some DRBG output.
pub fn generate_scalar(
    sk: &[u8; 32],
    msg: &[u8; 32],
    msg2: Option<&[u8; 32]>,
    attempt: u32,
) -> Scalar {
    let mut drbg = drbg(sk, msg, msg2);
    let mut out = Zeroizing::new([0u8; 32]);
    let mut remaining = attempt;
    loop {
        drbg.fill_bytes(&mut *out);
        let (scalar, overflow) = ScalarBytes(*out).reduce();
        if bool::from(overflow) {
            continue;
        }
        if remaining == 0 {
            return scalar;
        }
        remaining -= 1;
    }
}

/// Key derivation from a master secret.
///
/// Derived keys are a pure function of `(secret, index, flags, extra)`;
/// the parameter hash is public, the secret never leaves the DRBG seed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Kdf {
    secret: [u8; 32],
}

impl Kdf {
    /// Build a derivation context over `secret`.
    pub fn new(secret: [u8; 32]) -> Self {
        Kdf { secret }
    }

    /// Derive the child key for `(index, flags, extra)`.
    pub fn derive_key(&self, index: u64, flags: u32, extra: u32) -> Scalar {
        let mut hp = Processor::new();
        hp.absorb(&index).absorb(&flags).absorb(&extra);
        let hv: Value = hp.finalize();
        generate_scalar(&self.secret, &hv, None, 0)
    }
}
