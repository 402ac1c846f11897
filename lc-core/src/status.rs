//! Algorithm-status registry and power-on self-test gate.
//!
//! Every primitive declares an [`AlgorithmId`]. Entry points that produce
//! output call [`run_once`] with the primitive's known-answer test; the
//! registry latches `passed` or `failed` exactly once per process. A
//! `failed` latch is permanent: each later call fails with
//! `Error::SelftestFailed` without re-running anything.

use core::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::warn;

use crate::error::{Error, Result};
use crate::sidechannel::ct_eq;

/// Identifier of a self-testable primitive family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum AlgorithmId {
    /// SHA-3 fixed-digest family.
    Sha3,
    /// SHAKE-128 XOF.
    Shake128,
    /// SHAKE-256 XOF.
    Shake256,
    /// cSHAKE-256 (and its 128-bit sibling).
    CShake,
    /// KMAC-256.
    Kmac,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
    /// Ascon-Hash256.
    AsconHash,
    /// Ascon-XOF128.
    AsconXof,
    /// HMAC over any hash.
    Hmac,
    /// AES block cipher.
    Aes,
    /// AES-GCM AEAD.
    AesGcm,
    /// Hash-based Encrypt-then-MAC AEAD.
    HashAead,
    /// KMAC-based AEAD.
    KmacAead,
    /// KMAC-DRNG.
    KmacDrng,
    /// XDRBG family.
    Xdrbg,
    /// ChaCha20-DRNG.
    ChaCha20Drng,
    /// X25519 scalar multiplication.
    X25519,
}

impl AlgorithmId {
    /// Number of registered ids.
    pub const COUNT: usize = 18;

    /// Human-readable algorithm name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmId::Sha3 => "SHA-3",
            AlgorithmId::Shake128 => "SHAKE-128",
            AlgorithmId::Shake256 => "SHAKE-256",
            AlgorithmId::CShake => "cSHAKE",
            AlgorithmId::Kmac => "KMAC-256",
            AlgorithmId::Sha256 => "SHA-256",
            AlgorithmId::Sha512 => "SHA-512",
            AlgorithmId::AsconHash => "Ascon-Hash256",
            AlgorithmId::AsconXof => "Ascon-XOF128",
            AlgorithmId::Hmac => "HMAC",
            AlgorithmId::Aes => "AES",
            AlgorithmId::AesGcm => "AES-GCM",
            AlgorithmId::HashAead => "hash AEAD",
            AlgorithmId::KmacAead => "KMAC AEAD",
            AlgorithmId::KmacDrng => "KMAC-DRNG",
            AlgorithmId::Xdrbg => "XDRBG",
            AlgorithmId::ChaCha20Drng => "ChaCha20-DRNG",
            AlgorithmId::X25519 => "X25519",
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Latch states of one registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SelftestStatus {
    /// The self-test has not run.
    Unset = 0,
    /// A thread is currently executing the self-test.
    Running = 1,
    /// The self-test passed; the latch is final.
    Passed = 2,
    /// The self-test failed; the primitive is disabled for the process.
    Failed = 3,
}

impl SelftestStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => SelftestStatus::Running,
            2 => SelftestStatus::Passed,
            3 => SelftestStatus::Failed,
            _ => SelftestStatus::Unset,
        }
    }
}

static REGISTRY: [AtomicU8; AlgorithmId::COUNT] =
    [const { AtomicU8::new(0) }; AlgorithmId::COUNT];

/// Current latch state of `id`.
#[must_use]
pub fn status_of(id: AlgorithmId) -> SelftestStatus {
    SelftestStatus::from_u8(REGISTRY[id as usize].load(Ordering::Acquire))
}

/// Gate an operation behind the one-time self-test for `id`.
///
/// The winning thread transitions `unset -> running`, executes `kat`, and
/// latches the outcome. A thread that observes `running` re-executes the
/// deterministic test itself and returns its own verdict without touching
/// the latch; both outcomes agree because the test is pure.
///
/// # Errors
///
/// `SelftestFailed` when the test fails now or has failed before.
pub fn run_once<F>(id: AlgorithmId, kat: F) -> Result<()>
where
    F: Fn() -> Result<()>,
{
    let cell = &REGISTRY[id as usize];
    loop {
        match SelftestStatus::from_u8(cell.load(Ordering::Acquire)) {
            SelftestStatus::Passed => return Ok(()),
            SelftestStatus::Failed => return Err(Error::SelftestFailed(id)),
            SelftestStatus::Running => {
                return kat().map_err(|_| Error::SelftestFailed(id));
            }
            SelftestStatus::Unset => {
                if cell
                    .compare_exchange(
                        SelftestStatus::Unset as u8,
                        SelftestStatus::Running as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_err()
                {
                    continue;
                }
                let outcome = kat();
                let latched = if outcome.is_ok() {
                    SelftestStatus::Passed
                } else {
                    warn!(algorithm = %id, "power-on self-test failed, latching");
                    SelftestStatus::Failed
                };
                cell.store(latched as u8, Ordering::Release);
                return outcome.map_err(|_| Error::SelftestFailed(id));
            }
        }
    }
}

/// Constant-time KAT comparator used by every self-test.
///
/// # Errors
///
/// `SelftestFailed` on mismatch; the failure is logged with the offending
/// primitive, never with the data.
pub fn compare_selftest(id: AlgorithmId, actual: &[u8], expected: &[u8]) -> Result<()> {
    if ct_eq(actual, expected) {
        Ok(())
    } else {
        warn!(algorithm = %id, "known-answer mismatch");
        Err(Error::SelftestFailed(id))
    }
}

/// Apply the validation-build mutation to a known-answer input byte.
///
/// With the `fips-mode` feature enabled the byte is flipped, forcing every
/// known-answer test to miscompare; a build that still reports passing
/// self-tests has a broken comparator.
#[inline]
#[must_use]
pub fn fips140_mod(b: u8) -> u8 {
    if cfg!(feature = "fips-mode") { b ^ 0x01 } else { b }
}

/// Reset one latch. Test support only: production code never un-latches.
#[doc(hidden)]
pub fn reset_for_tests(id: AlgorithmId) {
    REGISTRY[id as usize].store(SelftestStatus::Unset as u8, Ordering::Release);
}
