//! Deterministic random bit generators.
//!
//! All three instantiations follow the same fast-key-erasure discipline:
//! every generate call first derives the *next* key from the current one
//! and stores it in place, and only then releases output bytes. The
//! stored secret is therefore always K(N+1), never the key that produced
//! the bytes just handed out.

pub mod kmac_drng;
pub mod xdrbg;

#[cfg(feature = "chacha20")]
pub mod chacha20_drng;

use lc_core::Result;

/// RNG capability: seed / generate / zero.
pub trait Drbg {
    /// Mix `seed` (and an optional personalization string) into the state.
    /// The first call instantiates, later calls reseed.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for degenerate input, `SelftestFailed` when the
    /// latch is failed.
    fn seed(&mut self, seed: &[u8], personalization: &[u8]) -> Result<()>;

    /// Fill `out` with the next output bytes, optionally stirred by
    /// `additional`. Infallible after a successful seed: on error no
    /// output is produced and the state is unchanged.
    ///
    /// # Errors
    ///
    /// `SelftestFailed` when the latch is failed.
    fn generate(&mut self, additional: &[u8], out: &mut [u8]) -> Result<()>;

    /// Wipe the state and drop the seeded flag.
    fn zero(&mut self);
}

/// Longest additional-input/personalization prefix the encode byte admits.
pub(crate) const ENCODE_ALPHA_MAX: usize = 84;

/// The XDRBG appendix-B encoding byte: `n * 85 + |alpha|` with alpha
/// clamped to 84 bytes. Shared verbatim by the KMAC-DRNG.
pub(crate) fn encode_byte(n: u8, alphalen: usize) -> u8 {
    debug_assert!(alphalen <= ENCODE_ALPHA_MAX);
    n * 85 + alphalen as u8
}

/// Clamp alpha to the encodable prefix.
pub(crate) fn clamp_alpha(alpha: &[u8]) -> &[u8] {
    &alpha[..alpha.len().min(ENCODE_ALPHA_MAX)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_byte_layout() {
        assert_eq!(encode_byte(0, 0), 0);
        assert_eq!(encode_byte(0, 84), 84);
        assert_eq!(encode_byte(1, 0), 85);
        assert_eq!(encode_byte(2, 0), 170);
        assert_eq!(encode_byte(2, 84), 254);
    }

    #[test]
    fn alpha_is_clamped_to_84() {
        let long = [0u8; 200];
        assert_eq!(clamp_alpha(&long).len(), 84);
        let short = [0u8; 12];
        assert_eq!(clamp_alpha(&short).len(), 12);
    }
}
