//! Symmetric cipher cores.

#[cfg(feature = "aes")]
pub mod aes;

#[cfg(feature = "chacha20")]
pub mod chacha20;

use lc_core::Result;

/// Block cipher capability.
pub trait BlockCipher: Clone {
    /// Block size in bytes.
    const BLOCK_SIZE: usize;

    /// Encrypt one block in place.
    fn encrypt_block(&self, block: &mut [u8; 16]);

    /// Decrypt one block in place.
    fn decrypt_block(&self, block: &mut [u8; 16]);

    /// Wipe the key schedule.
    fn zero(&mut self);

    /// Gate the cipher behind its power-on self-test.
    ///
    /// # Errors
    ///
    /// `SelftestFailed` when the latch is failed.
    fn ensure_selftest() -> Result<()>;
}
