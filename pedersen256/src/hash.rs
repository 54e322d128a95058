//! Re-seedable SHA-256 transcript and HMAC-SHA-256.

use crate::{point::CompressedPoint, scalar::ScalarBytes};
use hmac::{Hmac, Mac as _};
use k256::{ProjectivePoint, Scalar};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// 32-byte transcript digest.
pub type Value = [u8; 32];

/// Streaming SHA-256 transcript with typed absorption.
///
/// [`Processor::finalize`] both returns the digest and folds it back into a
/// fresh hash state, so the transcript survives being read: a sequence of
/// finalizations yields a chain of distinct, reproducible digests. This is
/// what makes the transcript usable as a Fiat-Shamir oracle (see
/// [`Oracle`][crate::Oracle]) and as the generator-derivation stream.
#[derive(Clone)]
pub struct Processor(Sha256);

impl Processor {
    /// Create a transcript in the initial (empty) state.
    pub fn new() -> Self {
        Processor(Sha256::new())
    }

    /// Restore the initial state.
    pub fn reset(&mut self) {
        self.0.reset();
    }

    /// Absorb raw bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    /// Absorb a typed value; chainable.
    pub fn absorb<T: Absorb + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.absorb_into(self);
        self
    }

    /// Produce the digest of everything absorbed so far and re-seed the
    /// state with it.
    pub fn finalize(&mut self) -> Value {
        let digest: Value = self.0.finalize_reset().into();
        self.0.update(digest);
        digest
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed transcript absorption.
///
/// Implementations define the canonical byte image of a value. Integers are
/// absorbed big-endian; strings are absorbed with their terminating NUL so
/// that distinct seed labels can never collide by concatenation.
pub trait Absorb {
    /// Feed this value's canonical bytes into `hp`.
    fn absorb_into(&self, hp: &mut Processor);
}

impl Absorb for [u8] {
    fn absorb_into(&self, hp: &mut Processor) {
        hp.write(self);
    }
}

impl Absorb for Value {
    fn absorb_into(&self, hp: &mut Processor) {
        hp.write(self);
    }
}

impl Absorb for str {
    fn absorb_into(&self, hp: &mut Processor) {
        hp.write(self.as_bytes());
        hp.write(&[0]);
    }
}

impl Absorb for bool {
    fn absorb_into(&self, hp: &mut Processor) {
        hp.write(&[*self as u8]);
    }
}

impl Absorb for u8 {
    fn absorb_into(&self, hp: &mut Processor) {
        hp.write(&[*self]);
    }
}

impl Absorb for u32 {
    fn absorb_into(&self, hp: &mut Processor) {
        hp.write(&self.to_be_bytes());
    }
}

impl Absorb for u64 {
    fn absorb_into(&self, hp: &mut Processor) {
        hp.write(&self.to_be_bytes());
    }
}

impl Absorb for ScalarBytes {
    fn absorb_into(&self, hp: &mut Processor) {
        hp.write(self.as_bytes());
    }
}

impl Absorb for Scalar {
    fn absorb_into(&self, hp: &mut Processor) {
        let bytes = Zeroizing::new(ScalarBytes::from(self));
        hp.write(bytes.as_bytes());
    }
}

impl Absorb for CompressedPoint {
    fn absorb_into(&self, hp: &mut Processor) {
        hp.write(&self.x);
        hp.absorb(&self.y_parity);
    }
}

impl Absorb for ProjectivePoint {
    fn absorb_into(&self, hp: &mut Processor) {
        CompressedPoint::from(self).absorb_into(hp);
    }
}

/// HMAC-SHA-256.
pub struct Mac(Hmac<Sha256>);

impl Mac {
    /// Key the MAC with `secret`.
    pub fn new(secret: &[u8]) -> Self {
        Mac(Hmac::new_from_slice(secret).expect("HMAC accepts any key length"))
    }

    /// Absorb message bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    /// Produce the authentication tag.
    pub fn finalize(self) -> Value {
        self.0.finalize().into_bytes().into()
    }
}

#[cfg(test)]
mod tests {
    use super::{Mac, Processor};
    use hex_literal::hex;
    use sha2::{Digest, Sha256};

    #[test]
    fn plain_digest_matches_sha256() {
        let mut hp = Processor::new();
        hp.write(b"abc");
        let expected: [u8; 32] = Sha256::digest(b"abc").into();
        assert_eq!(hp.finalize(), expected);
    }

    #[test]
    fn finalize_reseeds_with_digest() {
        let mut hp = Processor::new();
        hp.absorb("seed");
        let first = hp.finalize();
        let second = hp.finalize();
        assert_ne!(first, second);

        // After a read, the state equals a fresh transcript fed the digest.
        let mut replay = Processor::new();
        replay.write(&first);
        assert_eq!(replay.finalize(), second);
    }

    #[test]
    fn str_absorption_includes_terminator() {
        let mut a = Processor::new();
        a.absorb("ab").absorb("c");
        let mut b = Processor::new();
        b.absorb("abc");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn integers_are_big_endian() {
        let mut a = Processor::new();
        a.absorb(&0x0102_0304u32);
        let mut b = Processor::new();
        b.write(&[1, 2, 3, 4]);
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn hmac_rfc4231_style_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let mut mac = Mac::new(b"key");
        mac.write(b"The quick brown fox jumps over the lazy dog");
        assert_eq!(
            mac.finalize(),
            hex!("f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8")
        );
    }
}
