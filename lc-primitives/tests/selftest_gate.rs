//! Self-test gate behavior observed through the public API.

#![allow(clippy::unwrap_used)]

use lc_core::{AlgorithmId, SelftestStatus, status_of};
use lc_primitives::{Digest as _, Drbg as _};

#[test]
fn first_use_latches_passed() {
    assert_ne!(status_of(AlgorithmId::Sha3), SelftestStatus::Failed);
    lc_primitives::Sha3_256::digest(b"trigger").unwrap();
    assert_eq!(status_of(AlgorithmId::Sha3), SelftestStatus::Passed);

    // Second use observes the latch; it must not flip.
    lc_primitives::Sha3_256::digest(b"again").unwrap();
    assert_eq!(status_of(AlgorithmId::Sha3), SelftestStatus::Passed);
}

#[test]
fn every_family_passes_its_kat() {
    lc_primitives::Sha3_512::digest(b"x").unwrap();

    let mut out = [0u8; 32];
    lc_primitives::Shake128::hash_into(b"x", &mut out).unwrap();
    lc_primitives::Shake256::hash_into(b"x", &mut out).unwrap();

    let mut drng = lc_primitives::KmacDrng::new();
    drng.seed(b"seed", &[]).unwrap();

    let mut xdrbg = lc_primitives::Xdrbg256::new();
    xdrbg.seed(b"seed", &[]).unwrap();

    lc_primitives::x25519::x25519_base(&[0x40; 32]).unwrap();

    for id in [
        AlgorithmId::Sha3,
        AlgorithmId::Shake128,
        AlgorithmId::Shake256,
        AlgorithmId::KmacDrng,
        AlgorithmId::Xdrbg,
        AlgorithmId::X25519,
    ] {
        assert_eq!(status_of(id), SelftestStatus::Passed, "{id}");
    }
}

#[test]
fn concurrent_first_use_is_coherent() {
    // Many threads race the same latch; all must succeed and the latch
    // must end in Passed.
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                let mut ctx = lc_primitives::Sha3_384::new();
                ctx.update(b"concurrent").unwrap();
                let mut out = [0u8; 48];
                ctx.finalize_into(&mut out).unwrap();
            });
        }
    });
    assert_eq!(status_of(AlgorithmId::Sha3), SelftestStatus::Passed);
}

#[cfg(feature = "chacha20")]
#[test]
fn chacha20_drng_latch() {
    let mut drng = lc_primitives::ChaCha20Drng::new();
    let mut out = [0u8; 16];
    drng.generate(&[], &mut out).unwrap();
    assert_eq!(status_of(AlgorithmId::ChaCha20Drng), SelftestStatus::Passed);
}

#[cfg(feature = "aes")]
#[test]
fn aes_gcm_latch() {
    use lc_primitives::Aead as _;

    let mut gcm = lc_primitives::AesGcm::new();
    gcm.set_key(&[0u8; 16], &[0u8; 12]).unwrap();
    assert_eq!(status_of(AlgorithmId::Aes), SelftestStatus::Passed);
    assert_eq!(status_of(AlgorithmId::AesGcm), SelftestStatus::Passed);
}
