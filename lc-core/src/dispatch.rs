//! Backend dispatch: per-primitive selection among bit-exact implementations.
//!
//! Each primitive owns a static table of [`Backend`]s, highest priority
//! first, ending in a portable entry with an empty feature mask. The first
//! entry whose mask is satisfied by the latched CPU features *and* whose
//! verification test passes is cached in a [`DispatchCell`]; a candidate
//! that fails verification is demoted and the next entry is tried.
//!
//! Selection is observable only through the choice of implementation: every
//! accepted backend produces identical output for all valid inputs.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::cpufeatures::{self, CpuFeatures};
use crate::error::{Error, Result};

/// One selectable implementation of a primitive.
pub trait Backend: Sync {
    /// Backend name, for logs and tests.
    fn name(&self) -> &'static str;

    /// CPU capabilities this backend needs.
    fn required(&self) -> CpuFeatures;

    /// Cheap bit-exactness check run once before the backend is cached.
    fn verify(&self) -> bool;
}

/// Atomic cell caching the winning table index for one primitive.
pub struct DispatchCell {
    // 0 = unset, otherwise table index + 1.
    idx: AtomicUsize,
}

impl DispatchCell {
    /// New, unset cell.
    #[must_use]
    pub const fn new() -> Self {
        Self { idx: AtomicUsize::new(0) }
    }

    /// Resolve the backend for `table`, selecting and caching on first use.
    ///
    /// # Errors
    ///
    /// `Unsupported` when no table entry is satisfiable; unreachable for
    /// tables that end in a verified portable entry.
    pub fn select<'t, B: Backend>(&self, table: &'t [&'t B]) -> Result<&'t B> {
        let cached = self.idx.load(Ordering::Acquire);
        if cached != 0 {
            if let Some(backend) = table.get(cached - 1) {
                return Ok(*backend);
            }
        }

        let features = cpufeatures::get();
        for (i, backend) in table.iter().enumerate() {
            if !features.contains(backend.required()) {
                continue;
            }
            if !backend.verify() {
                warn!(backend = backend.name(), "backend failed verification, demoting");
                continue;
            }
            self.idx.store(i + 1, Ordering::Release);
            debug!(backend = backend.name(), "backend selected");
            return Ok(*backend);
        }
        Err(Error::Unsupported("no backend satisfies this CPU"))
    }

    /// Drop the cached choice so the next call re-selects. Test support for
    /// exercising specific backends via `cpufeatures::force`.
    pub fn reset(&self) {
        self.idx.store(0, Ordering::Release);
    }
}

impl Default for DispatchCell {
    fn default() -> Self {
        Self::new()
    }
}
