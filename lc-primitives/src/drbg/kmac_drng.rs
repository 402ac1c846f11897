//! Fast-key-erasure KMAC-256 DRNG.
//!
//! The whole persistent state is one 512-bit key. Seeding runs
//! `K(N+1) = KMAC(K(N), seed || encode(pers), S="KMAC-DRNG seed")`; on the
//! very first seed K(N) is absent and the KMAC key is empty. Generation
//! instantiates a transient KMAC under `S="KMAC-DRNG generate"`, squeezes
//! the replacement key first and only then the caller's bytes, chunked so
//! one call never squeezes more than one hundred cSHAKE-256 rate blocks.

use zeroize::{Zeroize, ZeroizeOnDrop};

use lc_core::status::{self, AlgorithmId};
use lc_core::{Error, Result};

use super::{Drbg, clamp_alpha, encode_byte};
use crate::hash::sha3::SHAKE256_RATE;
use crate::mac::kmac::Kmac256;

const SEED_CUSTOMIZATION: &[u8] = b"KMAC-DRNG seed";
const GENERATE_CUSTOMIZATION: &[u8] = b"KMAC-DRNG generate";

/// DRNG key size in bytes (512 bits).
pub const KEY_SIZE: usize = 64;

/// Upper bound of one fast-key-erasure round: 100 rate blocks, so the
/// squeezed total (key plus output chunk) is a whole number of blocks.
pub const MAX_CHUNK: usize = SHAKE256_RATE * 100;

/// KMAC-256 based DRNG state.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KmacDrng {
    key: [u8; KEY_SIZE],
    initially_seeded: bool,
}

impl KmacDrng {
    /// Fresh, unseeded instance.
    #[must_use]
    pub fn new() -> Self {
        Self { key: [0u8; KEY_SIZE], initially_seeded: false }
    }

    /// Whether the instance has received its first seed.
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.initially_seeded
    }

    fn seed_nocheck(&mut self, seed: &[u8], personalization: &[u8]) -> Result<()> {
        lc_core::poison(seed);
        let was_seeded = self.initially_seeded;

        // Reseeding folds K(N) in as the KMAC key; the first seed has none.
        let key: &[u8] = if was_seeded { &self.key } else { &[] };
        let mut kmac = Kmac256::new(key, SEED_CUSTOMIZATION)?;

        kmac.update(seed)?;
        let alpha = clamp_alpha(personalization);
        kmac.update(alpha)?;
        kmac.update(&[encode_byte(u8::from(was_seeded), alpha.len())])?;

        kmac.final_xof_nocheck(&mut self.key)?;
        kmac.zero();
        self.initially_seeded = true;
        Ok(())
    }

    fn generate_nocheck(&mut self, additional: &[u8], out: &mut [u8]) -> Result<()> {
        let alpha = clamp_alpha(additional);
        let mut rest = out;
        while !rest.is_empty() {
            let todo = rest.len().min(MAX_CHUNK - KEY_SIZE);
            let (chunk, tail) = core::mem::take(&mut rest).split_at_mut(todo);

            // Transient KMAC keyed by K(N); K(N+1) replaces it before any
            // output byte leaves this round.
            let mut kmac = Kmac256::new(&self.key, GENERATE_CUSTOMIZATION)?;
            kmac.update(alpha)?;
            kmac.update(&[encode_byte(2, alpha.len())])?;
            kmac.final_xof_nocheck(&mut self.key)?;
            kmac.final_xof_nocheck(chunk)?;
            kmac.zero();

            rest = tail;
        }
        Ok(())
    }
}

impl Default for KmacDrng {
    fn default() -> Self {
        Self::new()
    }
}

impl Drbg for KmacDrng {
    fn seed(&mut self, seed: &[u8], personalization: &[u8]) -> Result<()> {
        status::run_once(AlgorithmId::KmacDrng, kat_kmac_drng)?;
        self.seed_nocheck(seed, personalization)
    }

    fn generate(&mut self, additional: &[u8], out: &mut [u8]) -> Result<()> {
        status::run_once(AlgorithmId::KmacDrng, kat_kmac_drng)?;
        self.generate_nocheck(additional, out)
    }

    fn zero(&mut self) {
        self.key.zeroize();
        self.initially_seeded = false;
    }
}

impl rand_core::RngCore for KmacDrng {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        // Generation is infallible once the latch passed; a latched
        // failure leaves dest untouched.
        let _ = self.generate(&[], dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
        self.generate(&[], dest)
            .map_err(|_| rand_core::Error::new(Error::SelftestFailed(AlgorithmId::KmacDrng)))
    }
}

impl rand_core::CryptoRng for KmacDrng {}

fn kat_kmac_drng() -> Result<()> {
    let seed = [
        status::fips140_mod(0x00),
        0x01,
        0x02,
        0x03,
        0x04,
        0x05,
        0x06,
        0x07,
        0x08,
    ];
    let expected: [u8; 64] = [
        0xbc, 0x70, 0xc5, 0xd6, 0xfe, 0xc4, 0x28, 0x23, 0xab, 0x57, 0x92, 0x5e, 0xb7, 0xd5, 0x95,
        0xce, 0x2d, 0x98, 0x3a, 0x47, 0x71, 0x2f, 0x6d, 0x4f, 0x82, 0x29, 0xe8, 0x5c, 0x11, 0x08,
        0x48, 0x32, 0xfb, 0xcc, 0x30, 0x6c, 0xa1, 0x76, 0x45, 0x18, 0x7c, 0x05, 0xc3, 0x73, 0x20,
        0x28, 0xf2, 0x88, 0x7e, 0xe8, 0x60, 0x3c, 0xf9, 0xe8, 0x84, 0xa6, 0x11, 0x1d, 0xa3, 0x92,
        0xe1, 0x8a, 0x98, 0xc1,
    ];

    let mut drng = KmacDrng::new();
    drng.seed_nocheck(&seed, &[])?;
    let mut actual = [0u8; 64];
    drng.generate_nocheck(&[], &mut actual)?;
    let outcome = status::compare_selftest(AlgorithmId::KmacDrng, &actual, &expected);
    drng.zero();
    outcome
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn known_answer_after_seed() {
        let seed: [u8; 9] = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut drng = KmacDrng::new();
        drng.seed(&seed, &[]).unwrap();
        let mut out = [0u8; 64];
        drng.generate(&[], &mut out).unwrap();
        assert_eq!(out[..8], [0xbc, 0x70, 0xc5, 0xd6, 0xfe, 0xc4, 0x28, 0x23]);
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let mut a = KmacDrng::new();
        let mut b = KmacDrng::new();
        a.seed(b"seed material", b"pers").unwrap();
        b.seed(b"seed material", b"pers").unwrap();

        let mut out_a = [0u8; 256];
        let mut out_b = [0u8; 256];
        a.generate(b"addtl", &mut out_a).unwrap();
        b.generate(b"addtl", &mut out_b).unwrap();
        assert_eq!(out_a, out_b);

        // Consecutive calls advance the key.
        a.generate(b"addtl", &mut out_a).unwrap();
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn key_changes_on_every_generate() {
        let mut drng = KmacDrng::new();
        drng.seed(b"seed", &[]).unwrap();
        let key_before = drng.key;
        let mut out = [0u8; 16];
        drng.generate(&[], &mut out).unwrap();
        assert_ne!(drng.key, key_before);
        assert_ne!(drng.key, [0u8; KEY_SIZE]);
    }

    #[test]
    fn reseed_differs_from_initial_seed() {
        let mut once = KmacDrng::new();
        once.seed(b"same", &[]).unwrap();

        let mut twice = KmacDrng::new();
        twice.seed(b"same", &[]).unwrap();
        twice.seed(b"same", &[]).unwrap();

        let mut out_once = [0u8; 32];
        let mut out_twice = [0u8; 32];
        once.generate(&[], &mut out_once).unwrap();
        twice.generate(&[], &mut out_twice).unwrap();
        assert_ne!(out_once, out_twice);
    }

    #[test]
    fn zero_wipes_state() {
        let mut drng = KmacDrng::new();
        drng.seed(b"seed", &[]).unwrap();
        drng.zero();
        assert_eq!(drng.key, [0u8; KEY_SIZE]);
        assert!(!drng.is_seeded());
    }

    #[test]
    fn large_request_spans_chunks() {
        let mut a = KmacDrng::new();
        a.seed(b"chunk test", &[]).unwrap();
        let mut big = vec![0u8; MAX_CHUNK + 1000];
        a.generate(&[], &mut big).unwrap();

        // The first chunk of a split request matches the big request.
        let mut b = KmacDrng::new();
        b.seed(b"chunk test", &[]).unwrap();
        let mut first = vec![0u8; MAX_CHUNK - KEY_SIZE];
        b.generate(&[], &mut first).unwrap();
        assert_eq!(big[..first.len()], first[..]);
    }

    #[test]
    fn rng_core_interop() {
        use rand_core::RngCore;
        let mut drng = KmacDrng::new();
        drng.seed(b"interop", &[]).unwrap();
        let a = drng.next_u64();
        let b = drng.next_u64();
        assert_ne!(a, b);
    }
}
