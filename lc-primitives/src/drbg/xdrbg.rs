//! XDRBG: the fast-key-erasure DRBG over an XOF.
//!
//! State is the single string V. Every operation computes
//! `V' = XOF(V || alpha || encode(n, |alpha|))` with `n = 0` on first
//! seed, `1` on reseed and `2` on generate, writes V' back, and only then
//! squeezes output from the same XOF stream. Three parameterizations:
//! XDRBG-128 over SHAKE-128 (|V| = 32), XDRBG-256 over SHAKE-256
//! (|V| = 64) and XDRBG-512 over SHAKE-256 with the largest |V| the
//! encode byte admits (84).

use zeroize::{Zeroize, ZeroizeOnDrop};

use lc_core::status::{self, AlgorithmId};
use lc_core::{Error, Result};

use super::{Drbg, clamp_alpha, encode_byte};
use crate::hash::sha3::{Shake128, Shake256};
use crate::hash::{Digest, Xof};

/// XDRBG over XOF `X` with a `KEY_SIZE`-byte V.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Xdrbg<X: Xof + Default + Zeroize, const KEY_SIZE: usize> {
    v: [u8; KEY_SIZE],
    initially_seeded: bool,
    #[zeroize(skip)]
    _xof: core::marker::PhantomData<X>,
}

/// XDRBG-128: SHAKE-128, 256-bit V.
pub type Xdrbg128 = Xdrbg<Shake128, 32>;
/// XDRBG-256: SHAKE-256, 512-bit V.
pub type Xdrbg256 = Xdrbg<Shake256, 64>;
/// XDRBG-512: SHAKE-256, 672-bit V.
pub type Xdrbg512 = Xdrbg<Shake256, 84>;

impl<X: Xof + Default + Zeroize, const KEY_SIZE: usize> Xdrbg<X, KEY_SIZE> {
    /// Fresh, unseeded instance.
    #[must_use]
    pub fn new() -> Self {
        Self { v: [0u8; KEY_SIZE], initially_seeded: false, _xof: core::marker::PhantomData }
    }

    /// Whether the instance has received its first seed.
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.initially_seeded
    }

    /// Output chunk per fast-key-erasure round: two rate blocks minus the
    /// V refresh, so every full round squeezes whole blocks.
    #[must_use]
    pub fn chunk_size() -> usize {
        2 * X::default().block_size() - KEY_SIZE
    }

    pub(crate) fn seed_nocheck(&mut self, seed: &[u8], alpha: &[u8]) -> Result<()> {
        lc_core::poison(seed);
        let was_seeded = self.initially_seeded;

        let mut xof = X::default();
        if was_seeded {
            xof.update(&self.v)?;
        }
        xof.update(seed)?;
        let alpha = clamp_alpha(alpha);
        xof.update(alpha)?;
        xof.update(&[encode_byte(u8::from(was_seeded), alpha.len())])?;

        xof.squeeze(&mut self.v)?;
        self.initially_seeded = true;
        Ok(())
    }

    pub(crate) fn generate_nocheck(&mut self, additional: &[u8], out: &mut [u8]) -> Result<()> {
        let alpha = clamp_alpha(additional);
        let chunk_size = Self::chunk_size();
        let mut rest = out;
        while !rest.is_empty() {
            let todo = rest.len().min(chunk_size);
            let (chunk, tail) = core::mem::take(&mut rest).split_at_mut(todo);

            let mut xof = X::default();
            xof.update(&self.v)?;
            xof.update(alpha)?;
            xof.update(&[encode_byte(2, alpha.len())])?;

            // V' replaces V before the output bytes leave the round.
            xof.squeeze(&mut self.v)?;
            xof.squeeze(chunk)?;
            lc_core::unpoison(chunk);

            rest = tail;
        }
        Ok(())
    }
}

impl<X: Xof + Default + Zeroize, const KEY_SIZE: usize> Default for Xdrbg<X, KEY_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: Xof + Default + Zeroize, const KEY_SIZE: usize> Drbg for Xdrbg<X, KEY_SIZE> {
    fn seed(&mut self, seed: &[u8], personalization: &[u8]) -> Result<()> {
        status::run_once(AlgorithmId::Xdrbg, kat_xdrbg)?;
        self.seed_nocheck(seed, personalization)
    }

    fn generate(&mut self, additional: &[u8], out: &mut [u8]) -> Result<()> {
        status::run_once(AlgorithmId::Xdrbg, kat_xdrbg)?;
        self.generate_nocheck(additional, out)
    }

    fn zero(&mut self) {
        self.v.zeroize();
        self.initially_seeded = false;
    }
}

impl<X: Xof + Default + Zeroize, const KEY_SIZE: usize> rand_core::RngCore
    for Xdrbg<X, KEY_SIZE>
{
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
        self.generate(&[], dest)
            .map_err(|_| rand_core::Error::new(Error::SelftestFailed(AlgorithmId::Xdrbg)))
    }
}

impl<X: Xof + Default + Zeroize, const KEY_SIZE: usize> rand_core::CryptoRng
    for Xdrbg<X, KEY_SIZE>
{
}

/// The XDRBG state transition is exactly one XOF evaluation, so the KAT
/// recomputes a seed/generate cycle directly through SHAKE-256 and
/// demands bit-identical behavior.
fn kat_xdrbg() -> Result<()> {
    let seed = [status::fips140_mod(0x10), 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17];

    let mut drbg = Xdrbg256::new();
    drbg.seed_nocheck(&seed, &[])?;
    let mut out = [0u8; 32];
    drbg.generate_nocheck(&[], &mut out)?;

    // Reference: V1 = SHAKE-256(seed || 0x00), then one generate round
    // V2 || out = SHAKE-256(V1 || 0xaa).
    let mut v1 = [0u8; 64];
    let mut xof = Shake256::new();
    xof.update(&seed)?;
    xof.update(&[encode_byte(0, 0)])?;
    xof.squeeze(&mut v1)?;

    let mut xof = Shake256::new();
    xof.update(&v1)?;
    xof.update(&[encode_byte(2, 0)])?;
    let mut v2 = [0u8; 64];
    xof.squeeze(&mut v2)?;
    let mut expected = [0u8; 32];
    xof.squeeze(&mut expected)?;

    status::compare_selftest(AlgorithmId::Xdrbg, &out, &expected)?;
    status::compare_selftest(AlgorithmId::Xdrbg, &drbg.v, &v2)
}
