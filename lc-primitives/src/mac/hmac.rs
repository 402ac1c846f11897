//! HMAC (FIPS 198-1 / RFC 2104) over any [`Digest`].
//!
//! Keys longer than the hash block size are first compressed by the hash;
//! the derived block is kept XOR-masked as ipad/opad so a reset replays
//! the inner initialization without touching the raw key again.

use zeroize::{Zeroize, ZeroizeOnDrop};

use lc_core::status::{self, AlgorithmId};
use lc_core::{Error, Result};

use crate::hash::{Digest, MAX_BLOCK_SIZE, MAX_DIGEST_SIZE};

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// HMAC context over hash `H`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Hmac<H: Digest + Default + Zeroize> {
    inner: H,
    ipad: [u8; MAX_BLOCK_SIZE],
    opad: [u8; MAX_BLOCK_SIZE],
    block_size: usize,
    digest_size: usize,
}

impl<H: Digest + Default + Zeroize> Hmac<H> {
    /// Keyed context. An empty key is a disallowed combination.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty key.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("HMAC requires a key"));
        }
        lc_core::poison(key);

        let probe = H::default();
        let block_size = probe.block_size();
        let digest_size = probe.digest_size();
        debug_assert!(block_size <= MAX_BLOCK_SIZE && digest_size <= MAX_DIGEST_SIZE);

        let mut k0 = [0u8; MAX_BLOCK_SIZE];
        if key.len() > block_size {
            let mut h = H::default();
            h.update(key)?;
            h.finalize_into(&mut k0[..digest_size])?;
        } else {
            k0[..key.len()].copy_from_slice(key);
        }

        let mut ipad = [0u8; MAX_BLOCK_SIZE];
        let mut opad = [0u8; MAX_BLOCK_SIZE];
        for i in 0..block_size {
            ipad[i] = k0[i] ^ IPAD;
            opad[i] = k0[i] ^ OPAD;
        }
        k0.zeroize();

        let mut inner = H::default();
        inner.update(&ipad[..block_size])?;

        Ok(Self { inner, ipad, opad, block_size, digest_size })
    }

    /// MAC size in bytes (the hash digest size).
    #[must_use]
    pub fn mac_size(&self) -> usize {
        self.digest_size
    }

    /// Absorb message data.
    ///
    /// # Errors
    ///
    /// `InvalidState` after `finalize_into` without an intervening reset.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.inner.update(data)
    }

    /// Produce the MAC into `out` and leave the context finalized.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `out.len()` equals [`mac_size`](Self::mac_size),
    /// `SelftestFailed` when the HMAC latch is failed.
    pub fn finalize_into(&mut self, out: &mut [u8]) -> Result<()> {
        if out.len() != self.digest_size {
            return Err(Error::InvalidArgument("mac buffer length mismatch"));
        }
        status::run_once(AlgorithmId::Hmac, kat_hmac)?;
        self.finalize_nocheck(out)
    }

    fn finalize_nocheck(&mut self, out: &mut [u8]) -> Result<()> {
        let mut inner_digest = [0u8; MAX_DIGEST_SIZE];
        self.inner.finalize_into(&mut inner_digest[..self.digest_size])?;

        let mut outer = H::default();
        outer.update(&self.opad[..self.block_size])?;
        outer.update(&inner_digest[..self.digest_size])?;
        outer.finalize_into(out)?;

        inner_digest.zeroize();
        lc_core::unpoison(out);
        Ok(())
    }

    /// Rewind to the keyed state for a new message.
    pub fn reset(&mut self) -> Result<()> {
        self.inner = H::default();
        self.inner.update(&self.ipad[..self.block_size])
    }

    /// Wipe all key-derived material. The context is unusable afterwards.
    pub fn zero(&mut self) {
        self.ipad.zeroize();
        self.opad.zeroize();
        self.inner = H::default();
    }
}

fn kat_hmac() -> Result<()> {
    use crate::hash::sha3::Sha3_224;

    // HMAC-SHA3-224 vector, key shorter than the block.
    let key = [
        status::fips140_mod(0xbb),
        0x00,
        0x95,
        0xc4,
        0xa4,
        0xa6,
        0x67,
        0xd2,
        0xe7,
        0x43,
        0x30,
        0xe5,
        0xd6,
    ];
    let msg: [u8; 16] = [
        0x35, 0x8e, 0x06, 0xba, 0x03, 0x21, 0x83, 0xfc, 0x18, 0x20, 0x58, 0xbd, 0xb7, 0xbb, 0x13,
        0x40,
    ];
    let expected: [u8; 28] = [
        0x16, 0xf7, 0xb2, 0x7e, 0x25, 0x37, 0x6c, 0x38, 0xcf, 0xaa, 0x6f, 0xcc, 0xe2, 0x85, 0xc5,
        0x14, 0x28, 0xdb, 0x33, 0xa0, 0xfe, 0x7a, 0xf0, 0xaf, 0x53, 0x95, 0xde, 0xa2,
    ];

    let mut hmac = Hmac::<Sha3_224>::new(&key)?;
    hmac.update(&msg)?;
    let mut actual = [0u8; 28];
    hmac.finalize_nocheck(&mut actual)?;
    status::compare_selftest(AlgorithmId::Hmac, &actual, &expected)
}
