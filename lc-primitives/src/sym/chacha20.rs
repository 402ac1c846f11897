//! ChaCha20 core (RFC 7539).
//!
//! The 16-word state is `constants || key || counter || nonce`. The block
//! function post-increments the 32-bit counter word; the DRNG layered on
//! top treats the three nonce words as its deterministic epoch counter.

use zeroize::{Zeroize, ZeroizeOnDrop};

use lc_core::{Error, Result};

/// ChaCha20 block size in bytes.
pub const BLOCK_SIZE: usize = 64;
/// ChaCha20 key size in bytes.
pub const KEY_SIZE: usize = 32;
/// Words holding the key.
pub const KEY_SIZE_WORDS: usize = 8;
/// Words in one block.
pub const BLOCK_SIZE_WORDS: usize = 16;

/// The "expand 32-byte k" constants, little-endian.
pub const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// ChaCha20 state.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20 {
    state: [u32; 16],
}

impl ChaCha20 {
    /// Zero-keyed state: constants set, key/counter/nonce all zero.
    #[must_use]
    pub fn new() -> Self {
        let mut state = [0u32; 16];
        state[..4].copy_from_slice(&SIGMA);
        Self { state }
    }

    /// Keyed state for the RFC 7539 parameterization.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless the key is 32 and the nonce 12 bytes.
    pub fn with_key(key: &[u8], nonce: &[u8], counter: u32) -> Result<Self> {
        if key.len() != KEY_SIZE {
            return Err(Error::InvalidArgument("ChaCha20 key must be 32 bytes"));
        }
        if nonce.len() != 12 {
            return Err(Error::InvalidArgument("ChaCha20 nonce must be 12 bytes"));
        }
        lc_core::poison(key);
        let mut ctx = Self::new();
        for (i, chunk) in key.chunks_exact(4).enumerate() {
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            ctx.state[4 + i] = u32::from_le_bytes(word);
        }
        ctx.state[12] = counter;
        for (i, chunk) in nonce.chunks_exact(4).enumerate() {
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            ctx.state[13 + i] = u32::from_le_bytes(word);
        }
        Ok(ctx)
    }

    /// XOR one key byte. Used by the DRNG's seed injection.
    pub(crate) fn xor_key_byte(&mut self, index: usize, b: u8) {
        let word = 4 + index / 4;
        self.state[word] ^= u32::from(b) << ((index % 4) * 8);
    }

    /// XOR a word into the key half.
    pub(crate) fn xor_key_word(&mut self, index: usize, w: u32) {
        self.state[4 + index] ^= w;
    }

    /// Read or write the counter/nonce words 12..=15.
    pub(crate) fn counter_word(&self, index: usize) -> u32 {
        self.state[12 + index]
    }

    pub(crate) fn set_counter_word(&mut self, index: usize, w: u32) {
        self.state[12 + index] = w;
    }

    /// Produce one keystream block and post-increment the counter word.
    pub fn block(&mut self) -> [u32; 16] {
        let mut x = self.state;
        for _ in 0..10 {
            // column round
            quarter_round(&mut x, 0, 4, 8, 12);
            quarter_round(&mut x, 1, 5, 9, 13);
            quarter_round(&mut x, 2, 6, 10, 14);
            quarter_round(&mut x, 3, 7, 11, 15);
            // diagonal round
            quarter_round(&mut x, 0, 5, 10, 15);
            quarter_round(&mut x, 1, 6, 11, 12);
            quarter_round(&mut x, 2, 7, 8, 13);
            quarter_round(&mut x, 3, 4, 9, 14);
        }
        for (word, original) in x.iter_mut().zip(self.state.iter()) {
            *word = word.wrapping_add(*original);
        }
        self.state[12] = self.state[12].wrapping_add(1);
        x
    }

    /// Produce one keystream block as bytes.
    pub fn block_bytes(&mut self) -> [u8; BLOCK_SIZE] {
        let words = self.block();
        let mut out = [0u8; BLOCK_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Wipe key, counter and nonce; keep the constants.
    pub fn zero(&mut self) {
        self.state[4..].zeroize();
    }
}

impl Default for ChaCha20 {
    fn default() -> Self {
        Self::new()
    }
}

fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(16);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(12);
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(8);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(7);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_state_first_block() {
        // ChaCha20 keystream block 0 with zero key and nonce.
        let mut ctx = ChaCha20::new();
        let block = ctx.block_bytes();
        let expected_prefix = [
            0x76, 0xb8, 0xe0, 0xad, 0xa0, 0xf1, 0x3d, 0x90, 0x40, 0x5d, 0x6a, 0xe5, 0x53, 0x86,
            0xbd, 0x28, 0xbd, 0xd2, 0x19, 0xb8, 0xa0, 0x8d, 0xed, 0x1a, 0xa8, 0x36, 0xef, 0xcc,
            0x8b, 0x77, 0x0d, 0xc7,
        ];
        assert_eq!(block[..32], expected_prefix);
        assert_eq!(ctx.state[12], 1);
    }

    #[test]
    fn rfc7539_block_vector() {
        // RFC 7539 section 2.3.2.
        let key: Vec<u8> = (0..32u8).collect();
        let nonce =
            [0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x4a, 0x00, 0x00, 0x00, 0x00];
        let mut ctx = ChaCha20::with_key(&key, &nonce, 1).unwrap();
        let block = ctx.block_bytes();
        let expected_prefix = [
            0x10, 0xf1, 0xe7, 0xe4, 0xd1, 0x3b, 0x59, 0x15, 0x50, 0x0f, 0xdd, 0x1f, 0xa3, 0x20,
            0x71, 0xc4,
        ];
        assert_eq!(block[..16], expected_prefix);
    }

    #[test]
    fn counter_advances_per_block() {
        let mut ctx = ChaCha20::new();
        let b0 = ctx.block_bytes();
        let b1 = ctx.block_bytes();
        assert_ne!(b0, b1);
        assert_eq!(ctx.state[12], 2);
    }

    #[test]
    fn zero_keeps_constants() {
        let key: Vec<u8> = (0..32u8).collect();
        let mut ctx = ChaCha20::with_key(&key, &[0u8; 12], 0).unwrap();
        ctx.zero();
        assert_eq!(ctx.state[..4], SIGMA);
        assert_eq!(ctx.state[4..], [0u32; 12]);
    }

    #[test]
    fn bad_parameters_rejected() {
        assert!(ChaCha20::with_key(&[0u8; 31], &[0u8; 12], 0).is_err());
        assert!(ChaCha20::with_key(&[0u8; 32], &[0u8; 8], 0).is_err());
    }
}
