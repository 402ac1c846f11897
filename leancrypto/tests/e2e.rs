//! End-to-end scenarios across the whole stack.

#![allow(clippy::unwrap_used)]

use leancrypto::{self as lc, Aead, Digest as _, Drbg, Xof as _};

#[test]
fn power_up_then_use_everything_once() {
    lc::init().unwrap();

    // Hash, XOF, MAC.
    let digest = lc::sha3_256(b"end to end").unwrap();
    let mut xof = [0u8; 64];
    lc::shake256(b"end to end", &mut xof).unwrap();
    let mac = lc::hmac_sha3_256(b"key", b"end to end").unwrap();
    assert_ne!(digest[..], xof[..32]);
    assert_ne!(mac, digest);

    // AEAD round trip.
    let mut aead = lc::KmacAead::new();
    aead.set_key(b"session key", b"nonce").unwrap();
    let pt = b"payload".to_vec();
    let mut ct = vec![0u8; pt.len()];
    let mut tag = [0u8; 32];
    aead.encrypt(&pt, &mut ct, b"header", &mut tag).unwrap();
    aead.set_key(b"session key", b"nonce").unwrap();
    let mut out = vec![0u8; pt.len()];
    aead.decrypt(&ct, &mut out, b"header", &tag).unwrap();
    assert_eq!(out, pt);

    // DRBG feeding key material.
    let mut drbg = lc::Xdrbg256::new();
    drbg.seed(b"entropy from the host", b"e2e").unwrap();
    let mut key = [0u8; 32];
    drbg.generate(&[], &mut key).unwrap();
    assert_ne!(key, [0u8; 32]);

    // X25519 exchange.
    let alice_pk = lc::x25519::x25519_base(&key).unwrap();
    assert_ne!(alice_pk, [0u8; 32]);
}

#[cfg(feature = "aes")]
#[test]
fn spec_scenario_aes_gcm_256_single_block() {
    let key = [
        0x7f, 0x71, 0x68, 0xa4, 0x06, 0xe7, 0xc1, 0xef, 0x0f, 0xd4, 0x7a, 0xc9, 0x22, 0xc5, 0xec,
        0x5f, 0x65, 0x97, 0x65, 0xfb, 0x6a, 0xaa, 0x04, 0x8f, 0x70, 0x56, 0xf6, 0xc6, 0xb5, 0xd8,
        0x51, 0x3d,
    ];
    let iv = [0xb8, 0xb5, 0xe4, 0x07, 0xad, 0xc0, 0xe2, 0x93, 0xe3, 0xe7, 0xe9, 0x91];
    let aad = [
        0xff, 0x76, 0x28, 0xf6, 0x42, 0x7f, 0xbc, 0xef, 0x1f, 0x3b, 0x82, 0xb3, 0x74, 0x04, 0xe1,
        0x16,
    ];
    let pt = [
        0xb7, 0x06, 0x19, 0x4b, 0xb0, 0xb1, 0x0c, 0x47, 0x4e, 0x1b, 0x2d, 0x7b, 0x22, 0x78, 0x22,
        0x4c,
    ];
    let expected_ct = [
        0x8f, 0xad, 0xa0, 0xb8, 0xe7, 0x77, 0xa8, 0x29, 0xca, 0x96, 0x80, 0xd3, 0xbf, 0x4f, 0x35,
        0x74,
    ];
    let expected_tag = [
        0xda, 0xca, 0x35, 0x42, 0x77, 0xf6, 0x33, 0x5f, 0xc8, 0xbe, 0xc9, 0x08, 0x86, 0xda, 0x70,
    ];

    let mut gcm = lc::AesGcm::new();
    gcm.set_key(&key, &iv).unwrap();
    let mut ct = [0u8; 16];
    let mut tag = [0u8; 15];
    gcm.encrypt(&pt, &mut ct, &aad, &mut tag).unwrap();
    assert_eq!(ct, expected_ct);
    assert_eq!(tag, expected_tag);

    gcm.set_key(&key, &iv).unwrap();
    let mut decrypted = [0u8; 16];
    gcm.decrypt(&ct, &mut decrypted, &aad, &tag).unwrap();
    assert_eq!(decrypted, pt);

    let mut bad_tag = tag;
    bad_tag[0] ^= 0x01;
    gcm.set_key(&key, &iv).unwrap();
    assert_eq!(
        gcm.decrypt(&ct, &mut decrypted, &aad, &bad_tag),
        Err(lc::Error::TagMismatch)
    );
}

#[test]
fn spec_scenario_hmac_sha3_224() {
    let key = [0xbb, 0x00, 0x95, 0xc4, 0xa4, 0xa6, 0x67, 0xd2, 0xe7, 0x43, 0x30, 0xe5, 0xd6];
    let msg = [
        0x35, 0x8e, 0x06, 0xba, 0x03, 0x21, 0x83, 0xfc, 0x18, 0x20, 0x58, 0xbd, 0xb7, 0xbb, 0x13,
        0x40,
    ];
    let expected = [
        0x16, 0xf7, 0xb2, 0x7e, 0x25, 0x37, 0x6c, 0x38, 0xcf, 0xaa, 0x6f, 0xcc, 0xe2, 0x85, 0xc5,
        0x14, 0x28, 0xdb, 0x33, 0xa0, 0xfe, 0x7a, 0xf0, 0xaf, 0x53, 0x95, 0xde, 0xa2,
    ];

    let mut mac = lc::Hmac::<lc::Sha3_224>::new(&key).unwrap();
    mac.update(&msg).unwrap();
    let mut out = [0u8; 28];
    mac.finalize_into(&mut out).unwrap();
    assert_eq!(out, expected);
}

#[test]
fn spec_scenario_kmac_drng() {
    let seed = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
    let mut drng = lc::KmacDrng::new();
    drng.seed(&seed, &[]).unwrap();
    let mut out = vec![0u8; 320];
    drng.generate(&[], &mut out).unwrap();
    let expected_prefix = [
        0xbc, 0x70, 0xc5, 0xd6, 0xfe, 0xc4, 0x28, 0x23, 0xab, 0x57, 0x92, 0x5e, 0xb7, 0xd5, 0x95,
        0xce, 0x2d, 0x98, 0x3a, 0x47, 0x71, 0x2f, 0x6d, 0x4f, 0x82, 0x29, 0xe8, 0x5c, 0x11, 0x08,
        0x48, 0x32,
    ];
    assert_eq!(out[..32], expected_prefix);
}

#[cfg(feature = "chacha20")]
#[test]
fn spec_scenario_chacha20_drng_zero_state() {
    let mut drng = lc::ChaCha20Drng::new();
    let mut out = [0u8; 32];
    drng.generate(&[], &mut out).unwrap();
    let expected = [
        0x76, 0xb8, 0xe0, 0xad, 0xa0, 0xf1, 0x3d, 0x90, 0x40, 0x5d, 0x6a, 0xe5, 0x53, 0x86, 0xbd,
        0x28, 0xbd, 0xd2, 0x19, 0xb8, 0xa0, 0x8d, 0xed, 0x1a, 0xa8, 0x36, 0xef, 0xcc, 0x8b, 0x77,
        0x0d, 0xc7,
    ];
    assert_eq!(out, expected);
}

#[test]
fn spec_scenario_x25519_base_multiplication() {
    let sk = [
        0x80, 0x52, 0x03, 0x03, 0x76, 0xd4, 0x71, 0x12, 0xbe, 0x7f, 0x73, 0xed, 0x7a, 0x01, 0x92,
        0x93, 0xdd, 0x12, 0xad, 0x91, 0x0b, 0x65, 0x44, 0x55, 0x79, 0x8b, 0x46, 0x67, 0xd7, 0x3d,
        0xe1, 0x66,
    ];
    let expected = [
        0xf1, 0x81, 0x4f, 0x0e, 0x8f, 0xf1, 0x04, 0x3d, 0x8a, 0x44, 0xd2, 0x5b, 0xab, 0xff, 0x3c,
        0xed, 0xca, 0xe6, 0xc2, 0x2c, 0x3e, 0xda, 0xa4, 0x8f, 0x85, 0x7a, 0xe7, 0x0d, 0xe2, 0xba,
        0xae, 0x50,
    ];
    assert_eq!(lc::x25519::x25519_base(&sk).unwrap(), expected);
}

#[test]
fn xof_digest_size_is_sticky_until_first_squeeze() {
    let mut xof = lc::Shake256::new();
    xof.update(b"message").unwrap();
    xof.set_digest_size(96).unwrap();
    assert_eq!(xof.digest_size(), 96);

    let mut out = [0u8; 96];
    xof.squeeze(&mut out).unwrap();
    assert!(xof.set_digest_size(32).is_err());
}

#[test]
fn hash_aead_spec_boundaries() {
    // Empty AAD, empty plaintext, full tag: the tag is still well-defined
    // and tamper-evident.
    let mut aead = lc::HashAead::<lc::Sha3_512>::new();
    aead.set_key(b"key", b"iv").unwrap();
    let mut tag = [0u8; 64];
    aead.encrypt(&[], &mut [], &[], &mut tag).unwrap();

    aead.set_key(b"key", b"iv").unwrap();
    aead.decrypt(&[], &mut [], &[], &tag).unwrap();

    let mut bad = tag;
    bad[63] ^= 0x01;
    aead.set_key(b"key", b"iv").unwrap();
    assert_eq!(
        aead.decrypt(&[], &mut [], &[], &bad),
        Err(lc::Error::TagMismatch)
    );
}

#[test]
fn secret_memory_carries_instances() {
    // Heap-constructed instance on provider memory: build, use, drop.
    let mut buf = lc::alloc_aligned_secret(64, 512).unwrap();
    assert_eq!(buf.strategy(), lc::SecretStrategy::ZeroizedHeap);
    let mut drbg = lc::Xdrbg256::new();
    drbg.seed(b"seed", &[]).unwrap();
    drbg.generate(&[], &mut buf).unwrap();
    assert_ne!(&buf[..32], &[0u8; 32]);
}
