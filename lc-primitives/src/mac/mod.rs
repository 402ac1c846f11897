//! Keyed primitives: HMAC over any hash, KMAC-256 over cSHAKE-256.

pub mod hmac;
pub mod kmac;
