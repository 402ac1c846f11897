//! Differential tests against independent implementations.
//!
//! The RustCrypto crates serve as oracles: every hash, XOF and HMAC core
//! in this crate must agree with them byte for byte across message sizes
//! that cross every buffering boundary.

#![allow(clippy::unwrap_used)]

use lc_primitives::Digest as _;

fn test_messages() -> Vec<Vec<u8>> {
    let mut messages: Vec<Vec<u8>> = Vec::new();
    for len in [
        0usize, 1, 2, 7, 8, 9, 31, 32, 55, 56, 63, 64, 65, 71, 72, 73, 103, 104, 111, 112, 119,
        127, 128, 129, 135, 136, 137, 143, 144, 145, 167, 168, 169, 200, 256, 511, 512, 1000,
        2048, 4096,
    ] {
        let mut msg = vec![0u8; len];
        for (i, b) in msg.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(31).wrapping_add(len as u8);
        }
        messages.push(msg);
    }
    messages
}

#[test]
fn sha3_family_matches_rustcrypto() {
    use sha3::Digest;

    for msg in test_messages() {
        let ours = lc_primitives::Sha3_224::digest(&msg).unwrap();
        let theirs = sha3::Sha3_224::digest(&msg);
        assert_eq!(ours[..], theirs[..], "sha3-224 len {}", msg.len());

        let ours = lc_primitives::Sha3_256::digest(&msg).unwrap();
        let theirs = sha3::Sha3_256::digest(&msg);
        assert_eq!(ours[..], theirs[..], "sha3-256 len {}", msg.len());

        let ours = lc_primitives::Sha3_384::digest(&msg).unwrap();
        let theirs = sha3::Sha3_384::digest(&msg);
        assert_eq!(ours[..], theirs[..], "sha3-384 len {}", msg.len());

        let ours = lc_primitives::Sha3_512::digest(&msg).unwrap();
        let theirs = sha3::Sha3_512::digest(&msg);
        assert_eq!(ours[..], theirs[..], "sha3-512 len {}", msg.len());
    }
}

#[test]
fn shake_matches_rustcrypto() {
    use sha3::digest::{ExtendableOutput, Update, XofReader};

    for msg in test_messages() {
        let mut ours = [0u8; 200];
        lc_primitives::Shake128::hash_into(&msg, &mut ours).unwrap();
        let mut hasher = sha3::Shake128::default();
        hasher.update(&msg);
        let mut theirs = [0u8; 200];
        hasher.finalize_xof().read(&mut theirs);
        assert_eq!(ours[..], theirs[..], "shake128 len {}", msg.len());

        let mut ours = [0u8; 200];
        lc_primitives::Shake256::hash_into(&msg, &mut ours).unwrap();
        let mut hasher = sha3::Shake256::default();
        hasher.update(&msg);
        let mut theirs = [0u8; 200];
        hasher.finalize_xof().read(&mut theirs);
        assert_eq!(ours[..], theirs[..], "shake256 len {}", msg.len());
    }
}

#[cfg(feature = "sha2")]
#[test]
fn sha2_matches_rustcrypto() {
    use sha2_oracle::Digest;

    for msg in test_messages() {
        let ours = lc_primitives::Sha256::digest(&msg).unwrap();
        let theirs = sha2_oracle::Sha256::digest(&msg);
        assert_eq!(ours[..], theirs[..], "sha256 len {}", msg.len());

        let ours = lc_primitives::Sha512::digest(&msg).unwrap();
        let theirs = sha2_oracle::Sha512::digest(&msg);
        assert_eq!(ours[..], theirs[..], "sha512 len {}", msg.len());
    }
}

#[cfg(feature = "sha2")]
#[test]
fn hmac_sha256_matches_rustcrypto() {
    use hmac::{Hmac, Mac};

    type OracleHmac = Hmac<sha2_oracle::Sha256>;

    for (key_len, msg) in [(1usize, b"x".as_slice()), (32, b"message"), (64, b"m"), (100, b"")] {
        let key = vec![0x42u8; key_len];
        let mut ours_ctx = lc_primitives::Hmac::<lc_primitives::Sha256>::new(&key).unwrap();
        ours_ctx.update(msg).unwrap();
        let mut ours = [0u8; 32];
        ours_ctx.finalize_into(&mut ours).unwrap();

        let mut oracle = <OracleHmac as Mac>::new_from_slice(&key).unwrap();
        oracle.update(msg);
        let theirs = oracle.finalize().into_bytes();
        assert_eq!(ours[..], theirs[..], "hmac key {key_len}");
    }
}

#[test]
fn streaming_equals_one_shot_against_oracle() {
    use sha3::Digest;

    // Feed in awkward split sizes; the final digest must still match the
    // oracle's one-shot result.
    let msg: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
    let mut ctx = lc_primitives::Sha3_256::new();
    let mut fed = 0usize;
    for chunk in [1usize, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377] {
        let take = chunk.min(msg.len() - fed);
        ctx.update(&msg[fed..fed + take]).unwrap();
        fed += take;
    }
    ctx.update(&msg[fed..]).unwrap();
    let mut ours = [0u8; 32];
    ctx.finalize_into(&mut ours).unwrap();
    assert_eq!(ours[..], sha3::Sha3_256::digest(&msg)[..]);
}
