//! ChaCha20-based DRNG.
//!
//! Seeding absorbs `seed || personalization || encode(personalization)`
//! in one pass: the byte stream is XORed chunk-wise into the key half of
//! the state with a state update after every chunk, so dependencies
//! between seed blocks are broken (a CBC-MAC-like walk). The encode byte
//! is the same `n * 85 + |alpha|` tag the other fast-key-erasure DRBGs
//! carry. Additional input on generate walks the key the same way before
//! any output is produced; with no additional input the byte stream is
//! exactly the bare construction's. Generation emits raw keystream and
//! then folds one block back into the key for backtracking resistance.
//! The three nonce words increment deterministically after every
//! operation; the 32-bit block counter word is deliberately left alone,
//! its start value being outside RFC 7539's scope.

use zeroize::{Zeroize, ZeroizeOnDrop};

use lc_core::status::{self, AlgorithmId};
use lc_core::Result;

use super::{Drbg, clamp_alpha, encode_byte};
use crate::sym::chacha20::{BLOCK_SIZE, BLOCK_SIZE_WORDS, ChaCha20, KEY_SIZE, KEY_SIZE_WORDS};

/// ChaCha20 DRNG state.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20Drng {
    cc20: ChaCha20,
    initially_seeded: bool,
}

impl ChaCha20Drng {
    /// Fresh instance: constants set, everything else zero.
    #[must_use]
    pub fn new() -> Self {
        Self { cc20: ChaCha20::new(), initially_seeded: false }
    }

    /// Whether the instance has received its first seed.
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.initially_seeded
    }

    /// State update: XOR fresh (or left-over) keystream words into the key
    /// half, then step the nonce. `buf` holds the last generated block
    /// when fewer than eight of its words were handed out.
    fn update(&mut self, buf: Option<&[u32; BLOCK_SIZE_WORDS]>, used_words: usize) {
        match buf {
            Some(block) if used_words <= KEY_SIZE_WORDS => {
                for i in 0..KEY_SIZE_WORDS {
                    self.cc20.xor_key_word(i, block[i + used_words]);
                }
            }
            _ => {
                let mut block = self.cc20.block();
                for (i, word) in block.iter().take(KEY_SIZE_WORDS).enumerate() {
                    self.cc20.xor_key_word(i, *word);
                }
                block.zeroize();
            }
        }

        // Deterministic nonce increment per RFC 7539 chapter 4; the block
        // counter word keeps whatever value the block function left.
        let n0 = self.cc20.counter_word(1).wrapping_add(1);
        self.cc20.set_counter_word(1, n0);
        if n0 == 0 {
            let n1 = self.cc20.counter_word(2).wrapping_add(1);
            self.cc20.set_counter_word(2, n1);
            if n1 == 0 {
                let n2 = self.cc20.counter_word(3).wrapping_add(1);
                self.cc20.set_counter_word(3, n2);
            }
        }
    }

    /// CBC-MAC-like walk over a multi-part byte stream: XOR into the key
    /// in key-sized chunks, with a state update after every chunk so later
    /// bytes never land on an unmixed key.
    fn absorb(&mut self, parts: &[&[u8]]) {
        let mut offset = 0usize;
        let mut pending = false;
        for part in parts {
            for &b in *part {
                self.cc20.xor_key_byte(offset, b);
                offset += 1;
                pending = true;
                if offset == KEY_SIZE {
                    self.update(None, BLOCK_SIZE_WORDS);
                    offset = 0;
                    pending = false;
                }
            }
        }
        if pending {
            self.update(None, BLOCK_SIZE_WORDS);
        }
    }

    fn seed_nocheck(&mut self, seed: &[u8], personalization: &[u8]) {
        lc_core::poison(seed);
        let alpha = clamp_alpha(personalization);
        let encode = [encode_byte(u8::from(self.initially_seeded), alpha.len())];
        self.absorb(&[seed, alpha, &encode[..]]);
        self.initially_seeded = true;
    }

    fn generate_nocheck(&mut self, additional: &[u8], out: &mut [u8]) {
        // Additional input stirs the key through the seed walk before any
        // output byte is produced; an empty slice leaves the bare stream.
        if !additional.is_empty() {
            let alpha = clamp_alpha(additional);
            let encode = [encode_byte(2, alpha.len())];
            self.absorb(&[alpha, &encode[..]]);
        }

        let mut chunks = out.chunks_exact_mut(BLOCK_SIZE);
        for chunk in chunks.by_ref() {
            let block = self.cc20.block();
            for (bytes, word) in chunk.chunks_exact_mut(4).zip(block.iter()) {
                bytes.copy_from_slice(&word.to_le_bytes());
            }
        }

        let rest = chunks.into_remainder();
        let mut used_words = BLOCK_SIZE_WORDS;
        let mut last = [0u32; BLOCK_SIZE_WORDS];
        if !rest.is_empty() {
            last = self.cc20.block();
            let mut serialized = [0u8; BLOCK_SIZE];
            for (bytes, word) in serialized.chunks_exact_mut(4).zip(last.iter()) {
                bytes.copy_from_slice(&word.to_le_bytes());
            }
            rest.copy_from_slice(&serialized[..rest.len()]);
            serialized.zeroize();
            used_words = rest.len().div_ceil(4);
        }

        self.update(Some(&last), used_words);
        last.zeroize();
        lc_core::unpoison(out);
    }
}

impl Default for ChaCha20Drng {
    fn default() -> Self {
        Self::new()
    }
}

impl Drbg for ChaCha20Drng {
    fn seed(&mut self, seed: &[u8], personalization: &[u8]) -> Result<()> {
        status::run_once(AlgorithmId::ChaCha20Drng, kat_chacha20_drng)?;
        self.seed_nocheck(seed, personalization);
        Ok(())
    }

    fn generate(&mut self, additional: &[u8], out: &mut [u8]) -> Result<()> {
        status::run_once(AlgorithmId::ChaCha20Drng, kat_chacha20_drng)?;
        self.generate_nocheck(additional, out);
        Ok(())
    }

    fn zero(&mut self) {
        self.cc20.zero();
        self.initially_seeded = false;
    }
}

impl rand_core::RngCore for ChaCha20Drng {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let _ = self.generate(&[], dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
        self.generate(&[], dest).map_err(|_| {
            rand_core::Error::new(lc_core::Error::SelftestFailed(AlgorithmId::ChaCha20Drng))
        })
    }
}

impl rand_core::CryptoRng for ChaCha20Drng {}

fn kat_chacha20_drng() -> Result<()> {
    // Pulling one block from the all-zero state must give the raw
    // ChaCha20 keystream for zero key, zero nonce, counter zero.
    let mut expected: [u8; KEY_SIZE] = [
        0x76, 0xb8, 0xe0, 0xad, 0xa0, 0xf1, 0x3d, 0x90, 0x40, 0x5d, 0x6a, 0xe5, 0x53, 0x86, 0xbd,
        0x28, 0xbd, 0xd2, 0x19, 0xb8, 0xa0, 0x8d, 0xed, 0x1a, 0xa8, 0x36, 0xef, 0xcc, 0x8b, 0x77,
        0x0d, 0xc7,
    ];
    expected[0] = status::fips140_mod(expected[0]);

    let mut drng = ChaCha20Drng::new();
    let mut actual = [0u8; KEY_SIZE];
    drng.generate_nocheck(&[], &mut actual);
    let outcome = status::compare_selftest(AlgorithmId::ChaCha20Drng, &actual, &expected);
    drng.zero();
    outcome
}
