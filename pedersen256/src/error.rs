//! Error type.

use core::fmt::{self, Display};

/// Result type with the `pedersen256` crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Protocol errors.
///
/// Verification failures are deliberately *not* errors: operations such as
/// [`Signature::is_valid`][crate::Signature::is_valid] return `bool` and
/// leave no partial state behind. The variants below cover malformed
/// encodings and the one operation that can fail for non-cryptographic
/// reasons.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Canonical scalar encoding is not strictly below the group order.
    InvalidScalar,

    /// Compressed point encoding does not name a curve point (and is not the
    /// all-zero identity encoding).
    InvalidPoint,

    /// The OS entropy source is unavailable or returned a partial read.
    Io,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::InvalidScalar => "invalid scalar",
            Error::InvalidPoint => "invalid point",
            Error::Io => "entropy source unavailable",
        })
    }
}

impl std::error::Error for Error {}
