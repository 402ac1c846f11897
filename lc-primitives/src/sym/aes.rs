//! AES-128/192/256 (FIPS 197), side-channel-resistant flavor.
//!
//! No lookup tables: SubBytes computes the GF(2^8) inversion by
//! exponentiation and applies the affine map arithmetically, so neither
//! the key schedule nor the block transforms index memory with secret
//! data. Plaintext-derived state counts as secret only until the first
//! round key has been mixed in.

use zeroize::{Zeroize, ZeroizeOnDrop};

use lc_core::status::{self, AlgorithmId};
use lc_core::{Error, Result};

use super::BlockCipher;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

/// Constant-time GF(2^8) multiply modulo x^8 + x^4 + x^3 + x + 1.
fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    for _ in 0..8 {
        p ^= (b & 1).wrapping_neg() & a;
        let hi = a >> 7;
        a = (a << 1) ^ (hi.wrapping_neg() & 0x1b);
        b >>= 1;
    }
    p
}

/// x^254 = x^-1 in GF(2^8), with 0 mapping to 0.
fn ginv(x: u8) -> u8 {
    let x2 = gmul(x, x);
    let x4 = gmul(x2, x2);
    let x8 = gmul(x4, x4);
    let x16 = gmul(x8, x8);
    let x32 = gmul(x16, x16);
    let x64 = gmul(x32, x32);
    let x128 = gmul(x64, x64);
    // 254 = 128 + 64 + 32 + 16 + 8 + 4 + 2
    gmul(x128, gmul(x64, gmul(x32, gmul(x16, gmul(x8, gmul(x4, x2))))))
}

fn sub_byte(x: u8) -> u8 {
    let inv = ginv(x);
    inv ^ inv.rotate_left(1) ^ inv.rotate_left(2) ^ inv.rotate_left(3) ^ inv.rotate_left(4) ^ 0x63
}

fn sub_byte_inv(x: u8) -> u8 {
    let pre = x.rotate_left(1) ^ x.rotate_left(3) ^ x.rotate_left(6) ^ 0x05;
    ginv(pre)
}

fn sub_word(w: u32) -> u32 {
    let b = w.to_be_bytes();
    u32::from_be_bytes([sub_byte(b[0]), sub_byte(b[1]), sub_byte(b[2]), sub_byte(b[3])])
}

/// Expanded AES key schedule.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesKey {
    round_keys: [u32; 60],
    rounds: usize,
}

impl AesKey {
    /// Expand `key` (16, 24 or 32 bytes).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for any other key length.
    pub fn new(key: &[u8]) -> Result<Self> {
        let (nk, rounds) = match key.len() {
            16 => (4usize, 10usize),
            24 => (6, 12),
            32 => (8, 14),
            _ => return Err(Error::InvalidArgument("AES key must be 16, 24 or 32 bytes")),
        };
        lc_core::poison(key);

        let mut w = [0u32; 60];
        for (i, chunk) in key.chunks_exact(4).enumerate() {
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            w[i] = u32::from_be_bytes(word);
        }
        let total = 4 * (rounds + 1);
        for i in nk..total {
            let mut temp = w[i - 1];
            if i % nk == 0 {
                temp = sub_word(temp.rotate_left(8)) ^ (u32::from(RCON[i / nk - 1]) << 24);
            } else if nk > 6 && i % nk == 4 {
                temp = sub_word(temp);
            }
            w[i] = w[i - nk] ^ temp;
        }

        Ok(Self { round_keys: w, rounds })
    }

    /// Number of rounds for the configured key size.
    #[must_use]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    fn add_round_key(&self, state: &mut [u8; 16], round: usize) {
        for c in 0..4 {
            let rk = self.round_keys[4 * round + c].to_be_bytes();
            for r in 0..4 {
                state[4 * c + r] ^= rk[r];
            }
        }
    }
}

fn sub_bytes(state: &mut [u8; 16]) {
    for b in state.iter_mut() {
        *b = sub_byte(*b);
    }
}

fn sub_bytes_inv(state: &mut [u8; 16]) {
    for b in state.iter_mut() {
        *b = sub_byte_inv(*b);
    }
}

fn shift_rows(state: &mut [u8; 16]) {
    let s = *state;
    for r in 1..4 {
        for c in 0..4 {
            state[4 * c + r] = s[4 * ((c + r) % 4) + r];
        }
    }
}

fn shift_rows_inv(state: &mut [u8; 16]) {
    let s = *state;
    for r in 1..4 {
        for c in 0..4 {
            state[4 * ((c + r) % 4) + r] = s[4 * c + r];
        }
    }
}

fn xtime(x: u8) -> u8 {
    (x << 1) ^ ((x >> 7).wrapping_neg() & 0x1b)
}

fn mix_columns(state: &mut [u8; 16]) {
    for c in 0..4 {
        let col = [state[4 * c], state[4 * c + 1], state[4 * c + 2], state[4 * c + 3]];
        let t = col[0] ^ col[1] ^ col[2] ^ col[3];
        for r in 0..4 {
            state[4 * c + r] = col[r] ^ t ^ xtime(col[r] ^ col[(r + 1) % 4]);
        }
    }
}

fn mix_columns_inv(state: &mut [u8; 16]) {
    for c in 0..4 {
        let col = [state[4 * c], state[4 * c + 1], state[4 * c + 2], state[4 * c + 3]];
        for r in 0..4 {
            state[4 * c + r] = gmul(col[r], 0x0e)
                ^ gmul(col[(r + 1) % 4], 0x0b)
                ^ gmul(col[(r + 2) % 4], 0x0d)
                ^ gmul(col[(r + 3) % 4], 0x09);
        }
    }
}

impl BlockCipher for AesKey {
    const BLOCK_SIZE: usize = BLOCK_SIZE;

    fn encrypt_block(&self, block: &mut [u8; 16]) {
        self.add_round_key(block, 0);
        // With the whitening key folded in, the state no longer reveals
        // the key through a timing lens.
        lc_core::unpoison(block);
        for round in 1..self.rounds {
            sub_bytes(block);
            shift_rows(block);
            mix_columns(block);
            self.add_round_key(block, round);
        }
        sub_bytes(block);
        shift_rows(block);
        self.add_round_key(block, self.rounds);
    }

    fn decrypt_block(&self, block: &mut [u8; 16]) {
        self.add_round_key(block, self.rounds);
        for round in (1..self.rounds).rev() {
            shift_rows_inv(block);
            sub_bytes_inv(block);
            self.add_round_key(block, round);
            mix_columns_inv(block);
        }
        shift_rows_inv(block);
        sub_bytes_inv(block);
        self.add_round_key(block, 0);
    }

    fn zero(&mut self) {
        self.round_keys.zeroize();
    }

    fn ensure_selftest() -> Result<()> {
        status::run_once(AlgorithmId::Aes, kat_aes)
    }
}

fn kat_aes() -> Result<()> {
    // FIPS 197 appendix C vectors; C.1 carries the validation-build flip.
    let pt128: [u8; 16] = [
        status::fips140_mod(0x00),
        0x11,
        0x22,
        0x33,
        0x44,
        0x55,
        0x66,
        0x77,
        0x88,
        0x99,
        0xaa,
        0xbb,
        0xcc,
        0xdd,
        0xee,
        0xff,
    ];
    let key128: [u8; 16] =
        [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f];
    let expected128: [u8; 16] = [
        0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4, 0xc5,
        0x5a,
    ];

    let cipher = AesKey::new(&key128)?;
    let mut block = pt128;
    cipher.encrypt_block(&mut block);
    status::compare_selftest(AlgorithmId::Aes, &block, &expected128)?;

    // Decrypt path.
    cipher.decrypt_block(&mut block);
    status::compare_selftest(AlgorithmId::Aes, &block, &pt128)?;

    // AES-256 schedule (appendix C.3).
    let key256: [u8; 32] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d,
        0x1e, 0x1f,
    ];
    let expected256: [u8; 16] = [
        0x8e, 0xa2, 0xb7, 0xca, 0x51, 0x67, 0x45, 0xbf, 0xea, 0xfc, 0x49, 0x90, 0x4b, 0x49, 0x60,
        0x89,
    ];
    let cipher = AesKey::new(&key256)?;
    let mut block = pt128;
    cipher.encrypt_block(&mut block);
    status::compare_selftest(AlgorithmId::Aes, &block, &expected256)
}
