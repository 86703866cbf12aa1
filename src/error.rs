// vim: tw=80

use std::{error, fmt};

/// Errors returned by the public RaptorQ API.
///
/// Covers the four recoverable failure modes a caller can hit: an
/// undersized buffer, an out-of-range `K`, exceeding the configured ESI
/// capacity, and a rank-deficient constraint matrix. Contract violations --
/// out-of-range indices, dimension mismatches, invalid permutations -- are
/// programming bugs and are reported via `assert!`/`debug_assert!` rather
/// than through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A caller-provided buffer was smaller than required.
    Enomem,
    /// `K` was outside the supported range `[1, RQ_MAX_K]`.
    Edom,
    /// Adding more ESIs would exceed the configured capacity.  As many ESIs
    /// as would fit were still added.
    MaxIdsReached,
    /// The constraint matrix was rank-deficient; decoding is not possible
    /// with the symbols received so far.
    InsuffIds,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enomem => "buffer too small",
            Self::Edom => "K out of supported range",
            Self::MaxIdsReached => "maximum number of ESIs reached",
            Self::InsuffIds => "insufficient symbols to recover the block",
        })
    }
}

impl error::Error for Error {}

/// Log `msg` on the advisory diagnostic channel and return `err`.
///
/// Every public entry point that can fail routes its error through this
/// helper, so the "one human-readable line to stderr before returning an
/// error" contract lives in a single place.
pub(crate) fn fail<T>(err: Error, msg: &str) -> Result<T, Error> {
    log::error!("{}: {}", err, msg);
    Err(err)
}
