//! Error taxonomy shared by the whole workspace.

use crate::status::AlgorithmId;

/// Errors produced by leancrypto operations.
///
/// The taxonomy is deliberately small: callers match on the kind, not on
/// per-primitive error types. Partial results are never exposed alongside
/// an error; on failure the output buffer is unchanged or scrubbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Null-equivalent input, wrong length or a disallowed combination.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Operation called in the wrong instance state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// AEAD decrypt authenticity failure. Raised in constant time relative
    /// to tag and plaintext contents.
    #[error("authentication tag mismatch")]
    TagMismatch,

    /// The algorithm's power-on self-test is latched failed; the primitive
    /// is permanently non-functional for this process.
    #[error("power-on self-test failed: {0}")]
    SelftestFailed(AlgorithmId),

    /// The requested variant is not built in, or no backend satisfies the
    /// required CPU capabilities.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// The memory provider could not satisfy an allocation.
    #[error("out of memory")]
    OutOfMemory,
}

/// Result alias used across the workspace.
pub type Result<T> = core::result::Result<T, Error>;
