//! Lazy, latched CPU-feature detection.
//!
//! The first call to [`get`] probes the hardware and latches the result for
//! the process lifetime. [`force`] installs an override for tests that need
//! to steer backend selection (for example onto the portable path).

use core::fmt;
use core::ops::{BitOr, BitOrAssign};
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;

/// Set of CPU capabilities relevant to backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuFeatures(u32);

impl CpuFeatures {
    /// Empty set; satisfied by every CPU.
    pub const NONE: Self = Self(0);
    /// x86-64 AVX2.
    pub const AVX2: Self = Self(1 << 0);
    /// x86-64 AVX-512 foundation.
    pub const AVX512: Self = Self(1 << 1);
    /// x86-64 AES instructions.
    pub const AESNI: Self = Self(1 << 2);
    /// ARMv8 AES instructions.
    pub const ARM_AES: Self = Self(1 << 3);
    /// ARMv8 SHA-2 instructions.
    pub const ARM_SHA2: Self = Self(1 << 4);
    /// ARMv8 SHA-3 instructions.
    pub const ARM_SHA3: Self = Self(1 << 5);
    /// ARMv8 polynomial multiply.
    pub const ARM_PMULL: Self = Self(1 << 6);
    /// ARM NEON vector unit.
    pub const NEON: Self = Self(1 << 7);
    /// RISC-V vector extension.
    pub const RISCV_V: Self = Self(1 << 8);

    /// True when every capability in `other` is present in `self`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when no capability is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CpuFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CpuFeatures {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for CpuFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(CpuFeatures, &str); 9] = [
            (CpuFeatures::AVX2, "avx2"),
            (CpuFeatures::AVX512, "avx512"),
            (CpuFeatures::AESNI, "aesni"),
            (CpuFeatures::ARM_AES, "arm-aes"),
            (CpuFeatures::ARM_SHA2, "arm-sha2"),
            (CpuFeatures::ARM_SHA3, "arm-sha3"),
            (CpuFeatures::ARM_PMULL, "arm-pmull"),
            (CpuFeatures::NEON, "neon"),
            (CpuFeatures::RISCV_V, "riscv-v"),
        ];
        if self.is_empty() {
            return write!(f, "portable");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, "+")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

// Bit 31 marks "latched"; an empty detected set is then distinguishable
// from "not probed yet".
const LATCHED: u32 = 1 << 31;

static DETECTED: AtomicU32 = AtomicU32::new(0);
static OVERRIDE: AtomicU32 = AtomicU32::new(0);

/// Cached CPU capabilities, probing the hardware on first use.
#[must_use]
pub fn get() -> CpuFeatures {
    let forced = OVERRIDE.load(Ordering::Acquire);
    if forced & LATCHED != 0 {
        return CpuFeatures(forced & !LATCHED);
    }

    let cached = DETECTED.load(Ordering::Acquire);
    if cached & LATCHED != 0 {
        return CpuFeatures(cached & !LATCHED);
    }

    let probed = probe();
    // A concurrent prober computed the same pure result; either store wins.
    DETECTED.store(probed.0 | LATCHED, Ordering::Release);
    debug!(features = %probed, "cpu features latched");
    probed
}

/// Install or clear a test-only override.
///
/// `Some(features)` makes [`get`] report exactly that set; `None` restores
/// hardware detection. Backend caches populated before the override keep
/// their choice; tests combine this with `DispatchCell::reset`.
pub fn force(features: Option<CpuFeatures>) {
    match features {
        Some(f) => OVERRIDE.store(f.0 | LATCHED, Ordering::Release),
        None => OVERRIDE.store(0, Ordering::Release),
    }
}

fn probe() -> CpuFeatures {
    #[allow(unused_mut)]
    let mut features = CpuFeatures::NONE;

    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx2") {
            features |= CpuFeatures::AVX2;
        }
        if std::arch::is_x86_feature_detected!("avx512f") {
            features |= CpuFeatures::AVX512;
        }
        if std::arch::is_x86_feature_detected!("aes") {
            features |= CpuFeatures::AESNI;
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            features |= CpuFeatures::NEON;
        }
        if std::arch::is_aarch64_feature_detected!("aes") {
            // The crypto extension carries both AESE/AESD and PMULL.
            features |= CpuFeatures::ARM_AES | CpuFeatures::ARM_PMULL;
        }
        if std::arch::is_aarch64_feature_detected!("sha2") {
            features |= CpuFeatures::ARM_SHA2;
        }
        if std::arch::is_aarch64_feature_detected!("sha3") {
            features |= CpuFeatures::ARM_SHA3;
        }
    }

    // RISC-V vector probing has no stable OS query yet; the flag stays
    // clear unless a test forces it.

    features
}
