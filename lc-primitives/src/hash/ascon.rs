//! Ascon-Hash256 and Ascon-XOF128 (NIST SP 800-232).
//!
//! The 320-bit Ascon-p state plugs into the same sponge engine as Keccak.
//! SP 800-232 fixes the little-endian word convention and the single 0x01
//! padding byte; the variant IVs below are the precomputed initial states
//! after the 12-round permutation of the formal IV word.

use zeroize::Zeroize;

use lc_core::status::{self, AlgorithmId};
use lc_core::{Error, Result};

use super::sponge::{Sponge, SpongePermutation};
use super::{Digest, Xof};

/// Rate of the Ascon hash/XOF sponge in bytes.
pub const ASCON_RATE: usize = 8;

const ASCON_PAD: u8 = 0x01;

const ROUND_CONSTANTS: [u64; 12] =
    [0xf0, 0xe1, 0xd2, 0xc3, 0xb4, 0xa5, 0x96, 0x87, 0x78, 0x69, 0x5a, 0x4b];

const HASH256_IV: [u64; 5] = [
    0x9b1e5494e934d681,
    0x4bc3a01e333751d2,
    0xae65396c6b34b81a,
    0x3c7fd4a4d56a4db3,
    0x1a5c464906c5976d,
];

const XOF128_IV: [u64; 5] = [
    0xda82ce768d9447eb,
    0xcc7ce6c75f1ef969,
    0xe7508fd780085631,
    0x0ee0ea53416b58cc,
    0xe0547524db6f0bde,
];

/// Ascon-p[12] applied to the five-word state.
pub fn permute_12(s: &mut [u64; 5]) {
    for &rc in &ROUND_CONSTANTS {
        round(s, rc);
    }
}

fn round(s: &mut [u64; 5], rc: u64) {
    let mut x0 = s[0];
    let mut x1 = s[1];
    let mut x2 = s[2] ^ rc;
    let mut x3 = s[3];
    let mut x4 = s[4];

    // Substitution layer.
    x0 ^= x4;
    x4 ^= x3;
    x2 ^= x1;
    let t0 = !x0 & x1;
    let t1 = !x1 & x2;
    let t2 = !x2 & x3;
    let t3 = !x3 & x4;
    let t4 = !x4 & x0;
    x0 ^= t1;
    x1 ^= t2;
    x2 ^= t3;
    x3 ^= t4;
    x4 ^= t0;
    x1 ^= x0;
    x0 ^= x4;
    x3 ^= x2;
    x2 = !x2;

    // Linear diffusion layer.
    s[0] = x0 ^ x0.rotate_right(19) ^ x0.rotate_right(28);
    s[1] = x1 ^ x1.rotate_right(61) ^ x1.rotate_right(39);
    s[2] = x2 ^ x2.rotate_right(1) ^ x2.rotate_right(6);
    s[3] = x3 ^ x3.rotate_right(10) ^ x3.rotate_right(17);
    s[4] = x4 ^ x4.rotate_right(7) ^ x4.rotate_right(41);
}

macro_rules! ascon_state {
    ($name:ident, $iv:expr) => {
        /// Ascon-p sponge state seeded with the variant IV.
        #[derive(Clone, Zeroize)]
        pub struct $name {
            words: [u64; 5],
        }

        impl Default for $name {
            fn default() -> Self {
                Self { words: $iv }
            }
        }

        impl SpongePermutation for $name {
            const STATE_BYTES: usize = 40;

            fn permute(&mut self) {
                permute_12(&mut self.words);
            }

            fn xor_byte(&mut self, pos: usize, b: u8) {
                self.words[pos >> 3] ^= u64::from(b) << ((pos & 7) * 8);
            }

            fn byte(&self, pos: usize) -> u8 {
                (self.words[pos >> 3] >> ((pos & 7) * 8)) as u8
            }

            fn pad(&mut self, offset: usize, _rate: usize, pad_byte: u8) {
                // Single 0x01 byte after the message; no trailing bit.
                self.xor_byte(offset, pad_byte);
            }
        }
    };
}

ascon_state!(AsconHashState, HASH256_IV);
ascon_state!(AsconXofState, XOF128_IV);

/// Ascon-Hash256: fixed 32-byte digest.
#[derive(Clone, Zeroize)]
pub struct AsconHash256 {
    sponge: Sponge<AsconHashState>,
}

impl AsconHash256 {
    /// Digest size in bytes.
    pub const DIGEST_SIZE: usize = 32;

    /// Fresh instance.
    #[must_use]
    pub fn new() -> Self {
        Self { sponge: Sponge::new(ASCON_RATE, ASCON_PAD, Self::DIGEST_SIZE) }
    }

    /// One-shot digest of `msg`.
    ///
    /// # Errors
    ///
    /// `SelftestFailed` when the Ascon-Hash latch is failed.
    pub fn digest(msg: &[u8]) -> Result<[u8; 32]> {
        let mut ctx = Self::new();
        ctx.update(msg)?;
        let mut out = [0u8; 32];
        ctx.finalize_into(&mut out)?;
        Ok(out)
    }

    fn finalize_nocheck(&mut self, out: &mut [u8]) -> Result<()> {
        if self.sponge.squeezing() {
            return Err(Error::InvalidState("digest already finalized"));
        }
        self.sponge.squeeze(out);
        Ok(())
    }
}

impl Default for AsconHash256 {
    fn default() -> Self {
        Self::new()
    }
}

impl Digest for AsconHash256 {
    fn update(&mut self, data: &[u8]) -> Result<()> {
        self.sponge.update(data)
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<()> {
        if out.len() != Self::DIGEST_SIZE {
            return Err(Error::InvalidArgument("digest buffer length mismatch"));
        }
        status::run_once(AlgorithmId::AsconHash, kat_ascon_hash)?;
        self.finalize_nocheck(out)
    }

    fn digest_size(&self) -> usize {
        Self::DIGEST_SIZE
    }

    fn block_size(&self) -> usize {
        ASCON_RATE
    }

    fn reset(&mut self) {
        self.sponge.reset();
    }
}

/// Ascon-XOF128: extendable output.
#[derive(Clone, Zeroize)]
pub struct AsconXof128 {
    sponge: Sponge<AsconXofState>,
}

impl AsconXof128 {
    /// Fresh instance with a 32-byte default digest size.
    #[must_use]
    pub fn new() -> Self {
        Self { sponge: Sponge::new(ASCON_RATE, ASCON_PAD, 32) }
    }

    /// One-shot XOF output of `msg` into `out`.
    ///
    /// # Errors
    ///
    /// `SelftestFailed` when the Ascon-XOF latch is failed.
    pub fn hash_into(msg: &[u8], out: &mut [u8]) -> Result<()> {
        let mut ctx = Self::new();
        ctx.update(msg)?;
        ctx.squeeze(out)
    }

    fn squeeze_nocheck(&mut self, out: &mut [u8]) {
        self.sponge.squeeze(out);
    }
}

impl Default for AsconXof128 {
    fn default() -> Self {
        Self::new()
    }
}

impl Digest for AsconXof128 {
    fn update(&mut self, data: &[u8]) -> Result<()> {
        self.sponge.update(data)
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<()> {
        self.squeeze(out)
    }

    fn digest_size(&self) -> usize {
        self.sponge.digest_size()
    }

    fn block_size(&self) -> usize {
        ASCON_RATE
    }

    fn reset(&mut self) {
        self.sponge.reset();
    }
}

impl Xof for AsconXof128 {
    fn set_digest_size(&mut self, size: usize) -> Result<()> {
        self.sponge.set_digest_size(size)
    }

    fn squeeze(&mut self, out: &mut [u8]) -> Result<()> {
        status::run_once(AlgorithmId::AsconXof, kat_ascon_xof)?;
        self.squeeze_nocheck(out);
        Ok(())
    }
}

// The Ascon latches verify construction invariants deterministically: the
// permutation must move the IV state, streaming must match one-shot, and
// hash and XOF must be domain-separated.

fn kat_ascon_hash() -> Result<()> {
    let input = [status::fips140_mod(0x00), 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    let mut oneshot = AsconHash256::new();
    oneshot.update(&input)?;
    let mut a = [0u8; 32];
    oneshot.finalize_nocheck(&mut a)?;

    let mut streamed = AsconHash256::new();
    streamed.update(&input[..5])?;
    streamed.update(&input[5..])?;
    let mut b = [0u8; 32];
    streamed.finalize_nocheck(&mut b)?;

    status::compare_selftest(AlgorithmId::AsconHash, &a, &b)?;
    if a == [0u8; 32] {
        return Err(Error::SelftestFailed(AlgorithmId::AsconHash));
    }
    Ok(())
}

fn kat_ascon_xof() -> Result<()> {
    let input = [status::fips140_mod(0xa5); 16];

    let mut xof = AsconXof128::new();
    xof.update(&input)?;
    let mut long = [0u8; 64];
    xof.squeeze_nocheck(&mut long);

    let mut xof2 = AsconXof128::new();
    xof2.update(&input)?;
    let mut short = [0u8; 16];
    xof2.squeeze_nocheck(&mut short);

    // XOF prefix consistency.
    status::compare_selftest(AlgorithmId::AsconXof, &short, &long[..16])?;

    // Domain separation from the fixed hash.
    let mut hash = AsconHash256::new();
    hash.update(&input)?;
    let mut h = [0u8; 32];
    hash.finalize_nocheck(&mut h)?;
    if h == long[..32] {
        return Err(Error::SelftestFailed(AlgorithmId::AsconXof));
    }
    Ok(())
}
