#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]

//! # leancrypto primitives
//!
//! Implementations of every primitive family the leancrypto core serves:
//!
//! - **hash**: the sponge engine with pluggable permutations
//!   (Keccak-f[1600], Ascon-p), SHA-3, SHAKE, cSHAKE, Ascon-Hash256,
//!   Ascon-XOF128 and SHA-2.
//! - **mac**: HMAC over any hash, KMAC-256 over cSHAKE-256.
//! - **sym**: the AES block cipher (side-channel-resistant, no lookup
//!   tables) and the ChaCha20 block function.
//! - **drbg**: the fast-key-erasure DRBG core instantiated as KMAC-DRNG,
//!   XDRBG and ChaCha20-DRNG.
//! - **aead**: AES-GCM, the hash-based Encrypt-then-MAC AEAD and the
//!   KMAC AEAD, all behind one streaming state machine.
//! - **ec**: X25519 scalar multiplication.
//!
//! Every family registers with the `lc-core` self-test gate: the first
//! output-producing call runs a known-answer test and latches the result
//! for the process. Accelerated back-ends go through the `lc-core`
//! dispatch cell and are bit-exact with the portable reference.
//!
//! Instances are plain values: stack allocation is ordinary construction,
//! heap allocation goes through the `lc-core` memory provider, and every
//! state type wipes itself on drop.

pub mod aead;
pub mod drbg;
pub mod ec;
pub mod hash;
pub mod mac;
pub mod sym;

pub use hash::{Digest, Xof};
pub use hash::sha3::{
    CShake128, CShake256, Sha3_224, Sha3_256, Sha3_384, Sha3_512, Shake128, Shake256,
};
#[cfg(feature = "ascon")]
pub use hash::ascon::{AsconHash256, AsconXof128};
#[cfg(feature = "sha2")]
pub use hash::sha2::{Sha256, Sha512};
pub use mac::hmac::Hmac;
pub use mac::kmac::Kmac256;
#[cfg(feature = "aes")]
pub use sym::aes::AesKey;
#[cfg(feature = "chacha20")]
pub use sym::chacha20::ChaCha20;
pub use drbg::Drbg;
pub use drbg::kmac_drng::KmacDrng;
pub use drbg::xdrbg::{Xdrbg, Xdrbg128, Xdrbg256, Xdrbg512};
#[cfg(feature = "chacha20")]
pub use drbg::chacha20_drng::ChaCha20Drng;
pub use aead::Aead;
#[cfg(feature = "aes")]
pub use aead::aes_gcm::AesGcm;
pub use aead::hash_crypt::HashAead;
pub use aead::kmac_crypt::KmacAead;
pub use ec::x25519;
