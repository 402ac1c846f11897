#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]

//! # leancrypto
//!
//! A self-contained cryptographic library built for environments where the
//! set of primitives is fixed at build time: userspace services, embedded
//! firmware and kernels alike.
//!
//! ## What's inside
//!
//! - **Hashes and XOFs**: SHA-3, SHAKE, cSHAKE, Ascon-Hash256/XOF128 and
//!   SHA-2, all over one sponge engine with runtime-dispatched,
//!   bit-exact permutation back-ends.
//! - **Keyed primitives**: HMAC over any hash, KMAC-256 over cSHAKE-256.
//! - **AEAD**: AES-GCM (SP 800-38D), a hash-based Encrypt-then-MAC AEAD
//!   and a KMAC AEAD, all behind one streaming state machine.
//! - **DRBGs**: KMAC-DRNG, XDRBG-128/256/512 and ChaCha20-DRNG, each with
//!   fast-key-erasure state handling and `rand_core` interop.
//! - **X25519** scalar multiplication.
//!
//! Every family runs a known-answer self-test on first use and latches
//! the result process-wide; a failed latch permanently disables that
//! primitive. [`init`] runs all tests eagerly for deployments that want
//! power-up semantics rather than first-use semantics.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use leancrypto::{self as lc, Aead};
//!
//! lc::init()?;
//!
//! let digest = lc::sha3_256(b"hello")?;
//!
//! let mut gcm = lc::AesGcm::new();
//! gcm.set_key(&key, &iv)?;
//! let mut ciphertext = vec![0u8; plaintext.len()];
//! let mut tag = [0u8; 16];
//! gcm.encrypt(&plaintext, &mut ciphertext, &aad, &mut tag)?;
//! ```

pub use lc_core::{
    AlgorithmId, CpuFeatures, Error, Result, SecretStrategy, SelftestStatus, alloc_aligned,
    alloc_aligned_secret, status_of,
};
pub use lc_primitives::{
    Aead, CShake128, CShake256, Digest, Drbg, Hmac, KmacAead, KmacDrng, Kmac256, HashAead,
    Sha3_224, Sha3_256, Sha3_384, Sha3_512, Shake128, Shake256, Xdrbg, Xdrbg128, Xdrbg256,
    Xdrbg512, Xof, x25519,
};

#[cfg(feature = "aes")]
pub use lc_primitives::{AesGcm, AesKey};

#[cfg(feature = "ascon")]
pub use lc_primitives::{AsconHash256, AsconXof128};

#[cfg(feature = "chacha20")]
pub use lc_primitives::{ChaCha20, ChaCha20Drng};

#[cfg(feature = "sha2")]
pub use lc_primitives::{Sha256, Sha512};

/// Run every built-in power-on self-test now instead of on first use.
///
/// Also forces permutation backend selection so the choice is made once,
/// up front. Idempotent; later calls observe the latches.
///
/// # Errors
///
/// The first `SelftestFailed` encountered; the corresponding primitive is
/// permanently disabled for this process.
pub fn init() -> Result<()> {
    let _ = lc_primitives::hash::keccak::selected_backend();

    sha3_256(b"")?;
    let mut xof = [0u8; 32];
    Shake128::hash_into(b"", &mut xof)?;
    Shake256::hash_into(b"", &mut xof)?;
    let mut cshake = CShake256::new(b"", b"init")?;
    cshake.squeeze(&mut xof)?;

    let mut kmac = Kmac256::new(b"init", b"")?;
    kmac.final_xof(&mut xof)?;

    let mut hmac = Hmac::<Sha3_256>::new(b"init")?;
    let mut mac = [0u8; 32];
    hmac.finalize_into(&mut mac)?;

    let mut drng = KmacDrng::new();
    drng.seed(b"init", &[])?;
    let mut xdrbg = Xdrbg256::new();
    xdrbg.seed(b"init", &[])?;

    x25519::x25519_base(&[0x08; 32])?;

    #[cfg(feature = "sha2")]
    {
        Sha256::digest(b"")?;
        Sha512::digest(b"")?;
    }

    #[cfg(feature = "ascon")]
    {
        AsconHash256::digest(b"")?;
        let mut out = [0u8; 32];
        AsconXof128::hash_into(b"", &mut out)?;
    }

    #[cfg(feature = "aes")]
    {
        use lc_primitives::sym::BlockCipher as _;
        AesKey::ensure_selftest()?;
        let mut gcm = AesGcm::new();
        gcm.set_key(&[0u8; 16], &[0u8; 12])?;
    }

    #[cfg(feature = "chacha20")]
    {
        let mut drng = ChaCha20Drng::new();
        let mut out = [0u8; 16];
        drng.generate(&[], &mut out)?;
    }

    let mut hash_aead = HashAead::<Sha3_512>::new();
    hash_aead.set_key(b"init", b"")?;
    let mut kmac_aead = KmacAead::new();
    kmac_aead.set_key(b"init", b"")?;

    Ok(())
}

/// One-shot SHA3-256.
///
/// # Errors
///
/// `SelftestFailed` when the SHA-3 latch is failed.
pub fn sha3_256(msg: &[u8]) -> Result<[u8; 32]> {
    Sha3_256::digest(msg)
}

/// One-shot SHA3-512.
///
/// # Errors
///
/// `SelftestFailed` when the SHA-3 latch is failed.
pub fn sha3_512(msg: &[u8]) -> Result<[u8; 64]> {
    Sha3_512::digest(msg)
}

/// One-shot SHAKE-256 of caller-chosen length.
///
/// # Errors
///
/// `SelftestFailed` when the SHAKE-256 latch is failed.
pub fn shake256(msg: &[u8], out: &mut [u8]) -> Result<()> {
    Shake256::hash_into(msg, out)
}

/// One-shot SHA-256.
///
/// # Errors
///
/// `SelftestFailed` when the SHA-256 latch is failed.
#[cfg(feature = "sha2")]
pub fn sha256(msg: &[u8]) -> Result<[u8; 32]> {
    Sha256::digest(msg)
}

/// One-shot HMAC-SHA3-256.
///
/// # Errors
///
/// `InvalidArgument` for an empty key, `SelftestFailed` on a failed latch.
pub fn hmac_sha3_256(key: &[u8], msg: &[u8]) -> Result<[u8; 32]> {
    let mut mac = Hmac::<Sha3_256>::new(key)?;
    mac.update(msg)?;
    let mut out = [0u8; 32];
    mac.finalize_into(&mut out)?;
    Ok(out)
}

/// One-shot KMAC-256 in XOF mode.
///
/// # Errors
///
/// `SelftestFailed` when the KMAC latch is failed.
pub fn kmac256_xof(key: &[u8], customization: &[u8], msg: &[u8], out: &mut [u8]) -> Result<()> {
    let mut kmac = Kmac256::new(key, customization)?;
    kmac.update(msg)?;
    kmac.final_xof(out)
}
