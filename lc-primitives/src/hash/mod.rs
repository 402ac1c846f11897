//! Hash and XOF capability layer.
//!
//! [`Digest`] is the streaming hash capability every variant implements;
//! [`Xof`] extends it for extendable-output functions. Concrete instances
//! live in the per-family modules and share the [`sponge`] engine.

pub mod keccak;
pub mod sponge;

pub mod sha3;

#[cfg(feature = "ascon")]
pub mod ascon;

#[cfg(feature = "sha2")]
pub mod sha2;

use lc_core::Result;

/// Largest block size of any built-in hash (SHA3-224's 144-byte rate).
pub const MAX_BLOCK_SIZE: usize = 144;

/// Largest fixed digest of any built-in hash (SHA-512, SHA3-512).
pub const MAX_DIGEST_SIZE: usize = 64;

/// Streaming hash capability.
///
/// `update` may be called any number of times before `finalize_into`.
/// After `finalize_into` the instance must be `reset` before reuse; a
/// further `update` fails with `invalid_state`.
pub trait Digest: Clone {
    /// Absorb `data`.
    ///
    /// # Errors
    ///
    /// `InvalidState` once the instance has been finalized.
    fn update(&mut self, data: &[u8]) -> Result<()>;

    /// Produce the digest into `out`.
    ///
    /// Fixed-digest variants require `out.len()` to equal
    /// [`digest_size`](Self::digest_size); XOFs fill whatever is asked.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on a length mismatch, `SelftestFailed` when the
    /// algorithm's power-on self-test is latched failed.
    fn finalize_into(&mut self, out: &mut [u8]) -> Result<()>;

    /// Digest size in bytes; for XOFs, the currently configured size.
    fn digest_size(&self) -> usize;

    /// Input block size in bytes (the sponge rate, or the SHA-2 block).
    fn block_size(&self) -> usize;

    /// Return the instance to its post-init state.
    fn reset(&mut self);
}

/// Extendable-output extension of [`Digest`].
pub trait Xof: Digest {
    /// Change the target digest size. Allowed any time before the first
    /// squeeze.
    ///
    /// # Errors
    ///
    /// `InvalidState` once squeezing has begun.
    fn set_digest_size(&mut self, size: usize) -> Result<()>;

    /// Squeeze the next `out.len()` bytes of output. The first call
    /// finalizes the absorb phase; later calls continue the same stream.
    ///
    /// # Errors
    ///
    /// `SelftestFailed` when the algorithm is latched failed.
    fn squeeze(&mut self, out: &mut [u8]) -> Result<()>;
}
