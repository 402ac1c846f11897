//! SHA-3, SHAKE and cSHAKE instances over the Keccak sponge.
//!
//! Rates, padding bytes and digest policies per FIPS 202 and SP 800-185.
//! The cSHAKE customization prefix is absorbed through the regular sponge
//! entry points (`bytepad` block-aligns it), so an empty function name and
//! customization string degrade to exactly SHAKE.

use zeroize::Zeroize;

use lc_core::status::{self, AlgorithmId};
use lc_core::{Error, Result};

use super::keccak;
use super::sponge::{Sponge, SpongePermutation};
use super::{Digest, Xof};

/// SHA3-224 rate in bytes.
pub const SHA3_224_RATE: usize = 144;
/// SHA3-256 rate in bytes.
pub const SHA3_256_RATE: usize = 136;
/// SHA3-384 rate in bytes.
pub const SHA3_384_RATE: usize = 104;
/// SHA3-512 rate in bytes.
pub const SHA3_512_RATE: usize = 72;
/// SHAKE-128 / cSHAKE-128 rate in bytes.
pub const SHAKE128_RATE: usize = 168;
/// SHAKE-256 / cSHAKE-256 rate in bytes.
pub const SHAKE256_RATE: usize = 136;

const SHA3_PAD: u8 = 0x06;
pub(crate) const SHAKE_PAD: u8 = 0x1f;
pub(crate) const CSHAKE_PAD: u8 = 0x04;

/// Keccak-f[1600] state with the FIPS 202 little-endian byte mapping.
#[derive(Clone, Zeroize)]
pub struct KeccakState {
    lanes: [u64; keccak::LANES],
}

impl Default for KeccakState {
    fn default() -> Self {
        Self { lanes: [0u64; keccak::LANES] }
    }
}

impl SpongePermutation for KeccakState {
    const STATE_BYTES: usize = 200;

    fn permute(&mut self) {
        keccak::permute(&mut self.lanes);
    }

    fn xor_byte(&mut self, pos: usize, b: u8) {
        self.lanes[pos >> 3] ^= u64::from(b) << ((pos & 7) * 8);
    }

    fn byte(&self, pos: usize) -> u8 {
        (self.lanes[pos >> 3] >> ((pos & 7) * 8)) as u8
    }

    fn xor_block(&mut self, block: &[u8]) {
        let mut chunks = block.chunks_exact(8);
        for (lane, chunk) in self.lanes.iter_mut().zip(chunks.by_ref()) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *lane ^= u64::from_le_bytes(word);
        }
        let tail = chunks.remainder();
        let base = block.len() - tail.len();
        for (i, &b) in tail.iter().enumerate() {
            self.xor_byte(base + i, b);
        }
    }

    fn extract_block(&self, block: &mut [u8]) {
        let block_len = block.len();
        let mut chunks = block.chunks_exact_mut(8);
        for (chunk, lane) in chunks.by_ref().zip(self.lanes.iter()) {
            chunk.copy_from_slice(&lane.to_le_bytes());
        }
        let tail = chunks.into_remainder();
        let base = block_len - tail.len();
        for (i, b) in tail.iter_mut().enumerate() {
            *b = self.byte(base + i);
        }
    }

    fn pad(&mut self, offset: usize, rate: usize, pad_byte: u8) {
        // Multi-rate padding: domain byte at the message end, final bit at
        // the last rate position. Both may land on the same byte.
        self.xor_byte(offset, pad_byte);
        self.xor_byte(rate - 1, 0x80);
    }
}

// SP 800-185 integer encodings. Values above 2^64 - 1 never occur here.

pub(crate) fn left_encode(buf: &mut [u8; 9], val: u64) -> usize {
    let bytes = val.to_be_bytes();
    let n = core::cmp::max(1, 8 - (val.leading_zeros() as usize) / 8);
    buf[0] = n as u8;
    buf[1..=n].copy_from_slice(&bytes[8 - n..]);
    n + 1
}

pub(crate) fn right_encode(buf: &mut [u8; 9], val: u64) -> usize {
    let bytes = val.to_be_bytes();
    let n = core::cmp::max(1, 8 - (val.leading_zeros() as usize) / 8);
    buf[..n].copy_from_slice(&bytes[8 - n..]);
    buf[n] = n as u8;
    n + 1
}

/// Absorb `encode_string(s)` into the sponge.
fn absorb_encoded_string(sponge: &mut Sponge<KeccakState>, s: &[u8]) -> Result<()> {
    let mut enc = [0u8; 9];
    let n = left_encode(&mut enc, (s.len() as u64) * 8);
    sponge.update(&enc[..n])?;
    sponge.update(s)
}

/// Absorb `bytepad(encode_string(n) || encode_string(s), rate)`.
pub(crate) fn absorb_bytepad_strings(
    sponge: &mut Sponge<KeccakState>,
    n: &[u8],
    s: &[u8],
) -> Result<()> {
    let mut enc = [0u8; 9];
    let len = left_encode(&mut enc, sponge.rate() as u64);
    sponge.update(&enc[..len])?;
    absorb_encoded_string(sponge, n)?;
    absorb_encoded_string(sponge, s)?;
    pad_to_block(sponge)
}

/// Absorb zero bytes until the next block boundary.
pub(crate) fn pad_to_block(sponge: &mut Sponge<KeccakState>) -> Result<()> {
    const ZERO: [u8; 32] = [0u8; 32];
    let rate = sponge.rate();
    loop {
        let partial = sponge.absorbed() % rate as u64;
        if partial == 0 {
            return Ok(());
        }
        let fill = (rate as u64 - partial).min(ZERO.len() as u64) as usize;
        sponge.update(&ZERO[..fill])?;
    }
}

macro_rules! sha3_fixed {
    ($(#[$doc:meta])* $name:ident, $rate:expr, $digest:expr) => {
        $(#[$doc])*
        #[derive(Clone, Zeroize)]
        pub struct $name {
            sponge: Sponge<KeccakState>,
        }

        impl $name {
            /// Digest size in bytes.
            pub const DIGEST_SIZE: usize = $digest;

            /// Fresh instance.
            #[must_use]
            pub fn new() -> Self {
                Self { sponge: Sponge::new($rate, SHA3_PAD, $digest) }
            }

            /// One-shot digest of `msg`.
            ///
            /// # Errors
            ///
            /// `SelftestFailed` when the SHA-3 latch is failed.
            pub fn digest(msg: &[u8]) -> Result<[u8; $digest]> {
                let mut ctx = Self::new();
                ctx.update(msg)?;
                let mut out = [0u8; $digest];
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

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Digest for $name {
            fn update(&mut self, data: &[u8]) -> Result<()> {
                self.sponge.update(data)
            }

            fn finalize_into(&mut self, out: &mut [u8]) -> Result<()> {
                if out.len() != $digest {
                    return Err(Error::InvalidArgument("digest buffer length mismatch"));
                }
                status::run_once(AlgorithmId::Sha3, kat_sha3)?;
                self.finalize_nocheck(out)
            }

            fn digest_size(&self) -> usize {
                $digest
            }

            fn block_size(&self) -> usize {
                $rate
            }

            fn reset(&mut self) {
                self.sponge.reset();
            }
        }
    };
}

sha3_fixed!(
    /// SHA3-224 per FIPS 202.
    Sha3_224,
    SHA3_224_RATE,
    28
);
sha3_fixed!(
    /// SHA3-256 per FIPS 202.
    Sha3_256,
    SHA3_256_RATE,
    32
);
sha3_fixed!(
    /// SHA3-384 per FIPS 202.
    Sha3_384,
    SHA3_384_RATE,
    48
);
sha3_fixed!(
    /// SHA3-512 per FIPS 202.
    Sha3_512,
    SHA3_512_RATE,
    64
);

macro_rules! shake_xof {
    ($(#[$doc:meta])* $name:ident, $rate:expr, $default_digest:expr, $alg:expr, $kat:expr) => {
        $(#[$doc])*
        #[derive(Clone, Zeroize)]
        pub struct $name {
            sponge: Sponge<KeccakState>,
        }

        impl $name {
            /// Sponge rate in bytes.
            pub const RATE: usize = $rate;

            /// Fresh instance with the default digest size.
            #[must_use]
            pub fn new() -> Self {
                Self { sponge: Sponge::new($rate, SHAKE_PAD, $default_digest) }
            }

            /// One-shot XOF output of `msg` into `out`.
            ///
            /// # Errors
            ///
            /// `SelftestFailed` when the latch is failed.
            pub fn hash_into(msg: &[u8], out: &mut [u8]) -> Result<()> {
                let mut ctx = Self::new();
                ctx.update(msg)?;
                ctx.squeeze(out)
            }

            fn squeeze_nocheck(&mut self, out: &mut [u8]) {
                self.sponge.squeeze(out);
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Digest for $name {
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
                $rate
            }

            fn reset(&mut self) {
                self.sponge.reset();
            }
        }

        impl Xof for $name {
            fn set_digest_size(&mut self, size: usize) -> Result<()> {
                self.sponge.set_digest_size(size)
            }

            fn squeeze(&mut self, out: &mut [u8]) -> Result<()> {
                status::run_once($alg, $kat)?;
                self.squeeze_nocheck(out);
                Ok(())
            }
        }
    };
}

shake_xof!(
    /// SHAKE-128 per FIPS 202.
    Shake128,
    SHAKE128_RATE,
    32,
    AlgorithmId::Shake128,
    kat_shake128
);
shake_xof!(
    /// SHAKE-256 per FIPS 202.
    Shake256,
    SHAKE256_RATE,
    64,
    AlgorithmId::Shake256,
    kat_shake256
);

macro_rules! cshake_xof {
    ($(#[$doc:meta])* $name:ident, $rate:expr, $default_digest:expr) => {
        $(#[$doc])*
        #[derive(Clone, Zeroize)]
        pub struct $name {
            sponge: Sponge<KeccakState>,
            initial: Sponge<KeccakState>,
        }

        impl $name {
            /// Sponge rate in bytes.
            pub const RATE: usize = $rate;

            /// Instance customized by function name `n` and customization
            /// string `s`. Both empty reduces exactly to SHAKE.
            ///
            /// # Errors
            ///
            /// Propagates sponge errors; none occur for fresh state.
            pub fn new(n: &[u8], s: &[u8]) -> Result<Self> {
                let customized = !n.is_empty() || !s.is_empty();
                let padding = if customized { CSHAKE_PAD } else { SHAKE_PAD };
                let mut sponge = Sponge::new($rate, padding, $default_digest);
                if customized {
                    absorb_bytepad_strings(&mut sponge, n, s)?;
                }
                let initial = sponge.clone();
                Ok(Self { sponge, initial })
            }

            fn squeeze_nocheck(&mut self, out: &mut [u8]) {
                self.sponge.squeeze(out);
            }
        }

        impl Digest for $name {
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
                $rate
            }

            fn reset(&mut self) {
                self.sponge = self.initial.clone();
            }
        }

        impl Xof for $name {
            fn set_digest_size(&mut self, size: usize) -> Result<()> {
                self.sponge.set_digest_size(size)
            }

            fn squeeze(&mut self, out: &mut [u8]) -> Result<()> {
                status::run_once(AlgorithmId::CShake, kat_cshake)?;
                self.squeeze_nocheck(out);
                Ok(())
            }
        }
    };
}

cshake_xof!(
    /// cSHAKE-128 per SP 800-185.
    CShake128,
    SHAKE128_RATE,
    32
);
cshake_xof!(
    /// cSHAKE-256 per SP 800-185.
    CShake256,
    SHAKE256_RATE,
    64
);

// Known-answer tests. These run on the no-check paths so the self-test
// gate cannot recurse into itself.

fn kat_sha3() -> Result<()> {
    let input = [status::fips140_mod(0x61), 0x62, 0x63]; // "abc"
    let expected: [u8; 32] = [
        0x3a, 0x98, 0x5d, 0xa7, 0x4f, 0xe2, 0x25, 0xb2, 0x04, 0x5c, 0x17, 0x2d, 0x6b, 0xd3, 0x90,
        0xbd, 0x85, 0x5f, 0x08, 0x6e, 0x3e, 0x9d, 0x52, 0x5b, 0x46, 0xbf, 0xe2, 0x45, 0x11, 0x43,
        0x15, 0x32,
    ];
    let mut ctx = Sha3_256::new();
    ctx.update(&input)?;
    let mut actual = [0u8; 32];
    ctx.finalize_nocheck(&mut actual)?;
    status::compare_selftest(AlgorithmId::Sha3, &actual, &expected)
}

fn kat_shake128() -> Result<()> {
    let mut expected: [u8; 32] = [
        0x7f, 0x9c, 0x2b, 0xa4, 0xe8, 0x8f, 0x82, 0x7d, 0x61, 0x60, 0x45, 0x50, 0x76, 0x05, 0x85,
        0x3e, 0xd7, 0x3b, 0x80, 0x93, 0xf6, 0xef, 0xbc, 0x88, 0xeb, 0x1a, 0x6e, 0xac, 0xfa, 0x66,
        0xef, 0x26,
    ];
    expected[0] = status::fips140_mod(expected[0]);
    let mut ctx = Shake128::new();
    let mut actual = [0u8; 32];
    ctx.squeeze_nocheck(&mut actual);
    status::compare_selftest(AlgorithmId::Shake128, &actual, &expected)
}

pub(crate) fn shake256_empty_vector() -> [u8; 32] {
    [
        0x46, 0xb9, 0xdd, 0x2b, 0x0b, 0xa8, 0x8d, 0x13, 0x23, 0x3b, 0x3f, 0xeb, 0x74, 0x3e, 0xeb,
        0x24, 0x3f, 0xcd, 0x52, 0xea, 0x62, 0xb8, 0x1b, 0x82, 0xb5, 0x0c, 0x27, 0x64, 0x6e, 0xd5,
        0x76, 0x2f,
    ]
}

fn kat_shake256() -> Result<()> {
    let mut expected = shake256_empty_vector();
    expected[0] = status::fips140_mod(expected[0]);
    let mut ctx = Shake256::new();
    let mut actual = [0u8; 32];
    ctx.squeeze_nocheck(&mut actual);
    status::compare_selftest(AlgorithmId::Shake256, &actual, &expected)
}

/// cSHAKE with empty N and S must be exactly SHAKE.
fn kat_cshake() -> Result<()> {
    let mut expected = shake256_empty_vector();
    expected[0] = status::fips140_mod(expected[0]);
    let mut ctx = CShake256::new(b"", b"")?;
    let mut actual = [0u8; 32];
    ctx.squeeze_nocheck(&mut actual);
    status::compare_selftest(AlgorithmId::CShake, &actual, &expected)
}
