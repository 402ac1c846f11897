#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]

//! # leancrypto core runtime
//!
//! Substrate shared by every primitive in the leancrypto workspace:
//!
//! - **Side-channel primitives**: constant-time wipe, conditional move and
//!   comparison, plus poison/unpoison markers for dynamic analysis.
//! - **Memory provider**: aligned heap buffers and "secret" buffers with a
//!   guaranteed wipe on release and an explicit downgrade chain.
//! - **CPU-feature cache**: lazy, latched detection of vector and crypto
//!   ISA extensions, overridable for tests.
//! - **Algorithm-status registry**: one power-on self-test latch per
//!   algorithm id; a failed latch makes the primitive permanently
//!   non-functional for the process.
//! - **Backend dispatch**: one atomic cell per primitive caching the
//!   highest-priority implementation whose CPU-feature mask is satisfied
//!   and whose verification test passes.
//!
//! The crate holds no algorithm code of its own; `lc-primitives` plugs its
//! sponge, cipher, DRBG and AEAD implementations into these services.

pub mod cpufeatures;
pub mod dispatch;
pub mod error;
pub mod memory;
pub mod sidechannel;
pub mod status;

pub use cpufeatures::CpuFeatures;
pub use dispatch::{Backend, DispatchCell};
pub use error::{Error, Result};
pub use memory::{AlignedBuf, SecretBuf, SecretStrategy, alloc_aligned, alloc_aligned_secret};
pub use sidechannel::{cmov, ct_eq, poison, unpoison, wipe};
pub use status::{AlgorithmId, SelftestStatus, compare_selftest, run_once, status_of};
