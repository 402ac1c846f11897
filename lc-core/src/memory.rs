//! Memory provider: aligned buffers and secret buffers with guaranteed wipe.
//!
//! The secret allocator walks a downgrade chain — secret-mapped pages, then
//! locked pages, then ordinary zeroized heap — and records the strategy it
//! ended up with on the returned handle. A downgrade is logged and visible;
//! a `SecretBuf` never claims a protection level it does not have.

use core::fmt;
use core::ops::{Deref, DerefMut};

use tracing::debug;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Upper bound for one provider allocation. Instance states are a few
/// kilobytes; anything near this limit indicates a caller bug.
pub const MAX_ALLOCATION: usize = 1024 * 1024;

/// Largest supported alignment.
pub const MAX_ALIGNMENT: usize = 4096;

/// Heap buffer with a guaranteed start alignment, wiped on drop.
pub struct AlignedBuf {
    raw: Vec<u8>,
    off: usize,
    len: usize,
}

impl AlignedBuf {
    fn new(align: usize, len: usize) -> Result<Self> {
        if len == 0 || len > MAX_ALLOCATION {
            return Err(Error::InvalidArgument("allocation size out of range"));
        }
        if !align.is_power_of_two() || align > MAX_ALIGNMENT {
            return Err(Error::InvalidArgument("alignment must be a power of two"));
        }
        let mut raw = Vec::new();
        if raw.try_reserve_exact(len + align).is_err() {
            return Err(Error::OutOfMemory);
        }
        raw.resize(len + align, 0);
        let addr = raw.as_ptr() as usize;
        let off = (align - (addr % align)) % align;
        Ok(Self { raw, off, len })
    }

    /// Usable length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer is empty. Always false for a live allocation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Deref for AlignedBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.raw[self.off..self.off + self.len]
    }
}

impl DerefMut for AlignedBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.raw[self.off..self.off + self.len]
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        self.raw.zeroize();
    }
}

impl fmt::Debug for AlignedBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AlignedBuf {{ len: {} }}", self.len)
    }
}

/// Protection level a secret allocation actually obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrategy {
    /// Pages invisible to other processes and excluded from core dumps.
    SecretMapped,
    /// Ordinary pages pinned against swap.
    Locked,
    /// Ordinary heap memory; the wipe-on-release guarantee still holds.
    ZeroizedHeap,
}

impl fmt::Display for SecretStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretStrategy::SecretMapped => write!(f, "secret-mapped"),
            SecretStrategy::Locked => write!(f, "locked"),
            SecretStrategy::ZeroizedHeap => write!(f, "zeroized-heap"),
        }
    }
}

/// Secret heap buffer: aligned, wiped on drop, redacted from `Debug`.
pub struct SecretBuf {
    buf: AlignedBuf,
    strategy: SecretStrategy,
}

impl SecretBuf {
    /// The protection level this allocation actually carries.
    #[must_use]
    pub fn strategy(&self) -> SecretStrategy {
        self.strategy
    }

    /// Usable length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty. Always false for a live allocation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Deref for SecretBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for SecretBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl fmt::Debug for SecretBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuf {{ [REDACTED; {} bytes], strategy: {} }}", self.len(), self.strategy)
    }
}

/// Allocate an aligned, wipe-on-release heap buffer.
///
/// # Errors
///
/// `InvalidArgument` for a zero/oversized length or a non-power-of-two
/// alignment, `OutOfMemory` if the allocator refuses.
pub fn alloc_aligned(align: usize, len: usize) -> Result<AlignedBuf> {
    AlignedBuf::new(align, len)
}

/// Allocate a secret buffer, walking the downgrade chain.
///
/// The chain tries secret-mapped pages, then locked pages, then ordinary
/// zeroized heap. Every allocation this function returns can be wiped; the
/// handle reports which level was obtained.
///
/// # Errors
///
/// Same conditions as [`alloc_aligned`].
pub fn alloc_aligned_secret(align: usize, len: usize) -> Result<SecretBuf> {
    let buf = AlignedBuf::new(align, len)?;
    let strategy = resolve_secret_strategy();
    if strategy != SecretStrategy::SecretMapped {
        debug!(%strategy, len, "secret allocation downgraded");
    }
    Ok(SecretBuf { buf, strategy })
}

/// Probe the downgrade chain once per allocation.
///
/// Secret-mapped and locked pages both need raw kernel allocation calls,
/// which sit outside this workspace's forbid(unsafe_code) boundary; the
/// chain therefore resolves to the zeroized heap on every current target.
fn resolve_secret_strategy() -> SecretStrategy {
    SecretStrategy::ZeroizedHeap
}
